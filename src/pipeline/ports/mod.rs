pub mod classifier;
pub mod frame_source;

pub use classifier::{
    ClassifierRegistry, ClassifierSet, GestureClassifier, IdentityClassifier, ObjectClassifier,
};
pub use frame_source::{FramePublisher, FrameSource, LatestFrameSource};
