use crate::common::{BoundingBox, Frame};
use crate::error::ClassifierError;
use crate::pipeline::domain::gesture::count_raised;
use crate::pipeline::domain::object::select_top;
use crate::pipeline::domain::{
    CycleResult, IdentityMatcher, LabelTable, ResolvedFace, ResolvedHand, ResolvedObject, Signal,
    SignalOutcome, SignalOutcomes,
};
use crate::pipeline::ports::ClassifierRegistry;
use futures::FutureExt;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;
use tracing::{debug, instrument, warn};

/// One frame to be turned into a [`CycleResult`].
#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub cycle_id: u64,
    pub frame: Frame,
}

/// Runs the three classifiers concurrently over one frame and interprets
/// their raw observations. Classifier errors, panics and timeouts stay
/// inside the cycle and only blank out that classifier's signal.
#[derive(Clone)]
pub struct DecisionPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    registry: Arc<ClassifierRegistry>,
    matcher: IdentityMatcher,
    label_table: LabelTable,
    classifier_timeout: Duration,
}

impl DecisionPipeline {
    pub fn new(
        registry: Arc<ClassifierRegistry>,
        matcher: IdentityMatcher,
        label_table: LabelTable,
        classifier_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                registry,
                matcher,
                label_table,
                classifier_timeout,
            }),
        }
    }

    #[instrument(skip(self, frame), fields(frame_id = %frame.frame_id()))]
    pub async fn run_cycle(&self, cycle_id: u64, frame: Frame) -> CycleResult {
        let inner = &self.inner;
        let ports = inner.registry.snapshot();
        let deadline = inner.classifier_timeout;

        let identity = async {
            match &ports.identity {
                Some(port) => {
                    guarded(Signal::Identity, deadline, port.classify_identity(&frame)).await
                }
                None => Err(ClassifierError::Unavailable),
            }
        };
        let gesture = async {
            match &ports.gesture {
                Some(port) => guarded(Signal::Gesture, deadline, port.classify_gesture(&frame)).await,
                None => Err(ClassifierError::Unavailable),
            }
        };
        let object = async {
            match &ports.object {
                Some(port) => guarded(Signal::Object, deadline, port.classify_object(&frame)).await,
                None => Err(ClassifierError::Unavailable),
            }
        };

        let (faces, hands, objects) = tokio::join!(identity, gesture, object);

        let mut result = CycleResult::empty(cycle_id, frame.frame_id(), frame.width(), frame.height());
        let mut outcomes = SignalOutcomes::default();

        match faces {
            Ok(faces) => {
                result.faces = faces
                    .into_iter()
                    .map(|face| ResolvedFace {
                        identity: inner.matcher.best_match(&face.descriptor),
                        bbox: face.bbox,
                    })
                    .collect();
                outcomes.identity = SignalOutcome::Resolved;
            }
            Err(e) => outcomes.identity = SignalOutcome::from(&e),
        }

        match hands {
            Ok(hands) => {
                result.hands = hands
                    .iter()
                    .map(|hand| ResolvedHand {
                        bbox: BoundingBox::enclosing(&hand.landmarks),
                        raised: hand.is_raised(),
                    })
                    .collect();
                result.raised_hand_count = count_raised(&hands);
                outcomes.gesture = SignalOutcome::Resolved;
            }
            Err(e) => outcomes.gesture = SignalOutcome::from(&e),
        }

        match objects {
            Ok(candidates) => {
                result.object = select_top(&candidates).map(|top| ResolvedObject {
                    class_label: top.class_label.clone(),
                    label: inner.label_table.translate(&top.class_label).to_string(),
                    probability: top.probability,
                    bbox: top.bbox,
                });
                outcomes.object = SignalOutcome::Resolved;
            }
            Err(e) => outcomes.object = SignalOutcome::from(&e),
        }

        result.outcomes = outcomes;
        debug!(
            faces = result.faces.len(),
            raised_hands = result.raised_hand_count,
            object = ?result.object_label(),
            "Cycle {} resolved",
            cycle_id
        );
        result
    }
}

/// Applies the per-classifier deadline and turns panics into failures.
async fn guarded<T, F>(signal: Signal, deadline: Duration, call: F) -> Result<T, ClassifierError>
where
    F: Future<Output = Result<T, ClassifierError>>,
{
    let result = match tokio::time::timeout(deadline, AssertUnwindSafe(call).catch_unwind()).await
    {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ClassifierError::Failure("classifier panicked".to_string())),
        Err(_) => Err(ClassifierError::TimedOut(deadline)),
    };

    match &result {
        Err(ClassifierError::Unavailable) => {
            debug!("{} classifier reported itself unavailable", signal);
        }
        Err(e) => warn!(signal = %signal, error = %e, "Classifier failed for this cycle"),
        Ok(_) => {}
    }
    result
}

impl Service<CycleRequest> for DecisionPipeline {
    type Response = CycleResult;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CycleRequest) -> Self::Future {
        let pipeline = self.clone();
        Box::pin(async move { Ok(pipeline.run_cycle(req.cycle_id, req.frame).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::frame::blank_frame;
    use crate::pipeline::domain::gesture::hand;
    use crate::pipeline::domain::{
        Descriptor, FaceObservation, Gallery, HandObservation, Identity, ObjectObservation,
    };
    use crate::pipeline::ports::{GestureClassifier, IdentityClassifier, ObjectClassifier};
    use async_trait::async_trait;
    use tower::ServiceExt;

    struct Faces(Vec<FaceObservation>);

    #[async_trait]
    impl IdentityClassifier for Faces {
        async fn classify_identity(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceObservation>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    struct Hands(Vec<HandObservation>);

    #[async_trait]
    impl GestureClassifier for Hands {
        async fn classify_gesture(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<HandObservation>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    struct Objects(Vec<ObjectObservation>);

    #[async_trait]
    impl ObjectClassifier for Objects {
        async fn classify_object(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<ObjectObservation>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl ObjectClassifier for Broken {
        async fn classify_object(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<ObjectObservation>, ClassifierError> {
            Err(ClassifierError::Failure("model crashed".to_string()))
        }
    }

    struct Warming;

    #[async_trait]
    impl IdentityClassifier for Warming {
        async fn classify_identity(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceObservation>, ClassifierError> {
            Err(ClassifierError::Unavailable)
        }
    }

    struct Panicking;

    #[async_trait]
    impl GestureClassifier for Panicking {
        async fn classify_gesture(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<HandObservation>, ClassifierError> {
            panic!("landmark model exploded");
        }
    }

    struct Hung;

    #[async_trait]
    impl IdentityClassifier for Hung {
        async fn classify_identity(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceObservation>, ClassifierError> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    fn face(values: &[f32]) -> FaceObservation {
        FaceObservation {
            bbox: BoundingBox::new(10.0, 10.0, 40.0, 40.0),
            descriptor: Descriptor::new(values.to_vec()),
        }
    }

    fn pipeline(registry: Arc<ClassifierRegistry>) -> DecisionPipeline {
        let gallery = Gallery::new()
            .with_person("Ana", vec![Descriptor::new(vec![0.0, 0.0])])
            .with_person("Ben", vec![Descriptor::new(vec![1.0, 1.0])]);
        DecisionPipeline::new(
            registry,
            IdentityMatcher::new(gallery, 0.5),
            LabelTable::classroom("Unrecognized object"),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn resolves_all_three_signals() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_identity(Arc::new(Faces(vec![face(&[0.0, 0.3]), face(&[5.0, 5.0])])));
        registry.install_gesture(Arc::new(Hands(vec![hand(200.0, 50.0), hand(200.0, 60.0)])));
        registry.install_object(Arc::new(Objects(vec![
            ObjectObservation::new("novel", 0.4),
            ObjectObservation::new("textbook", 0.6),
        ])));

        let result = pipeline(registry).run_cycle(1, blank_frame(64, 48)).await;

        let identities: Vec<_> = result.identities().map(|m| m.identity.clone()).collect();
        assert_eq!(
            identities,
            vec![Identity::Known("Ana".to_string()), Identity::Unknown]
        );
        assert_eq!(result.raised_hand_count, 2);
        assert_eq!(result.object_label(), Some("Textbook"));
        assert_eq!((result.frame_width, result.frame_height), (64, 48));
        assert_eq!(result.outcomes.failures().count(), 0);
    }

    #[tokio::test]
    async fn absent_classifiers_yield_empty_signals() {
        let result = pipeline(Arc::new(ClassifierRegistry::new()))
            .run_cycle(1, blank_frame(8, 8))
            .await;
        assert!(result.faces.is_empty());
        assert_eq!(result.raised_hand_count, 0);
        assert!(result.object.is_none());
        assert_eq!(result.outcomes, SignalOutcomes::default());
    }

    #[tokio::test]
    async fn failing_classifier_does_not_block_the_others() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_identity(Arc::new(Faces(vec![face(&[1.0, 1.1])])));
        registry.install_gesture(Arc::new(Panicking));
        registry.install_object(Arc::new(Broken));

        let result = pipeline(registry).run_cycle(7, blank_frame(8, 8)).await;

        assert_eq!(
            result.faces[0].identity.identity,
            Identity::Known("Ben".to_string())
        );
        assert_eq!(result.raised_hand_count, 0);
        assert!(result.object.is_none());
        assert!(matches!(result.outcomes.gesture, SignalOutcome::Failed(_)));
        assert_eq!(
            result.outcomes.object,
            SignalOutcome::Failed("model crashed".to_string())
        );
        assert_eq!(
            result.outcomes.failures().collect::<Vec<_>>(),
            vec![Signal::Gesture, Signal::Object]
        );
    }

    #[tokio::test]
    async fn self_reported_unavailability_is_not_a_failure() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_identity(Arc::new(Warming));
        registry.install_object(Arc::new(Objects(vec![ObjectObservation::new("laptop", 0.7)])));

        let result = pipeline(registry).run_cycle(2, blank_frame(8, 8)).await;

        assert!(result.faces.is_empty());
        assert_eq!(result.outcomes.identity, SignalOutcome::Unavailable);
        assert_eq!(result.outcomes.failures().count(), 0);
        assert_eq!(result.object_label(), Some("Laptop"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_classifier_times_out() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_identity(Arc::new(Hung));
        registry.install_gesture(Arc::new(Hands(vec![hand(200.0, 50.0)])));

        let result = pipeline(registry).run_cycle(3, blank_frame(8, 8)).await;

        assert_eq!(result.outcomes.identity, SignalOutcome::TimedOut);
        assert_eq!(result.raised_hand_count, 1);
    }

    #[tokio::test]
    async fn unmapped_object_uses_fallback_label() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_object(Arc::new(Objects(vec![ObjectObservation::new("kite", 0.9)])));

        let result = pipeline(registry).run_cycle(1, blank_frame(8, 8)).await;
        let object = result.object.expect("object");
        assert_eq!(object.class_label, "kite");
        assert_eq!(object.label, "Unrecognized object");
    }

    #[tokio::test]
    async fn serves_requests_as_a_tower_service() {
        let registry = Arc::new(ClassifierRegistry::new());
        registry.install_gesture(Arc::new(Hands(vec![hand(10.0, 90.0)])));

        let frame = blank_frame(8, 8);
        let frame_id = frame.frame_id();
        let result = pipeline(registry)
            .oneshot(CycleRequest { cycle_id: 42, frame })
            .await
            .expect("infallible");
        assert_eq!(result.cycle_id, 42);
        assert_eq!(result.frame_id, frame_id);
        assert_eq!(result.hands.len(), 1);
        assert!(!result.hands[0].raised);
    }
}
