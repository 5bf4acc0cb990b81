pub mod decision;
pub mod domain;
pub mod gallery_loader;
pub mod metrics;
pub mod ports;
pub mod scheduler;
pub mod state;

pub use decision::{CycleRequest, DecisionPipeline};
pub use domain::{CycleResult, Gallery, IdentityMatcher, LabelTable};
pub use gallery_loader::{load_gallery, DescriptorSource, GalleryLoad, JsonDescriptorSource};
pub use metrics::{MetricsCollector, MetricsObserver, PerformanceMonitor, PerformanceStats};
pub use scheduler::{CycleScheduler, SchedulerPhase};
pub use state::{merge, SessionSnapshot, SessionState, SessionStore};
