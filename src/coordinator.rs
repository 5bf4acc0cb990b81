use crate::{
    config::Configuration,
    error::{AppError, SchedulerError},
    pipeline::{
        decision::DecisionPipeline,
        domain::{Gallery, IdentityMatcher, LabelTable},
        metrics::{MetricsCollector, MetricsObserver, PerformanceStats},
        ports::{ClassifierRegistry, FrameSource},
        scheduler::{CycleScheduler, SchedulerPhase},
        state::{SessionSnapshot, SessionStore},
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wires the frame source, classifiers, decision pipeline, scheduler and
/// session store into one running unit.
pub struct Coordinator {
    scheduler: CycleScheduler,
    store: Arc<SessionStore>,
    registry: Arc<ClassifierRegistry>,
    period: Duration,
}

impl Coordinator {
    pub fn builder(configuration: Configuration) -> CoordinatorBuilder {
        CoordinatorBuilder::new(configuration)
    }

    pub fn start(&self) -> Result<(), SchedulerError> {
        self.scheduler.start(self.period)
    }

    pub fn stop(&self) -> Result<(), SchedulerError> {
        self.scheduler.stop()
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    /// Classifiers are installed here once their models have loaded.
    pub fn registry(&self) -> &Arc<ClassifierRegistry> {
        &self.registry
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    pub fn stats(&self) -> PerformanceStats {
        self.scheduler.stats()
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    gallery: Gallery,
    frame_source: Option<Arc<dyn FrameSource>>,
    registry: Option<Arc<ClassifierRegistry>>,
    observers: Vec<Arc<dyn MetricsObserver>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            gallery: Gallery::new(),
            frame_source: None,
            registry: None,
            observers: Vec::new(),
        }
    }

    // Sets the cycle period, this will override the default configuration.
    pub fn period_ms(mut self, period_ms: u64) -> Self {
        self.configuration.period_ms = period_ms;
        self
    }

    // Sets the per-classifier deadline, this will override the default configuration.
    pub fn classifier_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.configuration.classifier_timeout_ms = Some(timeout_ms);
        self
    }

    // Sets the identity match threshold, this will override the default configuration.
    pub fn distance_threshold(mut self, threshold: f32) -> Self {
        self.configuration.distance_threshold = threshold;
        self
    }

    pub fn gallery(mut self, gallery: Gallery) -> Self {
        self.gallery = gallery;
        self
    }

    pub fn frame_source(mut self, frame_source: Arc<dyn FrameSource>) -> Self {
        self.frame_source = Some(frame_source);
        self
    }

    pub fn registry(mut self, registry: Arc<ClassifierRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn MetricsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let frame_source = self
            .frame_source
            .ok_or(AppError::Coordinator("Frame source not set".to_string()))?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ClassifierRegistry::new()));

        let mut label_table = LabelTable::classroom(&self.configuration.unrecognized_object_label);
        label_table.extend(&self.configuration.object_labels);

        let timeout = self.configuration.classifier_timeout();
        let pipeline = DecisionPipeline::new(
            Arc::clone(&registry),
            IdentityMatcher::new(self.gallery, self.configuration.distance_threshold),
            label_table,
            timeout,
        );

        let metrics = self
            .observers
            .into_iter()
            .fold(MetricsCollector::new(), MetricsCollector::add_observer);

        let store = Arc::new(SessionStore::new());
        let scheduler = CycleScheduler::new(
            pipeline,
            frame_source,
            Arc::clone(&store),
            metrics,
            timeout,
        );

        Ok(Coordinator {
            scheduler,
            store,
            registry,
            period: self.configuration.period(),
        })
    }
}
