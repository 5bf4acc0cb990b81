use crate::common::Frame;
use crate::error::ClassifierError;
use crate::pipeline::domain::{FaceObservation, HandObservation, ObjectObservation};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

#[async_trait]
pub trait IdentityClassifier: Send + Sync {
    async fn classify_identity(&self, frame: &Frame)
        -> Result<Vec<FaceObservation>, ClassifierError>;
}

#[async_trait]
pub trait GestureClassifier: Send + Sync {
    async fn classify_gesture(&self, frame: &Frame)
        -> Result<Vec<HandObservation>, ClassifierError>;
}

#[async_trait]
pub trait ObjectClassifier: Send + Sync {
    async fn classify_object(&self, frame: &Frame)
        -> Result<Vec<ObjectObservation>, ClassifierError>;
}

/// The classifiers present for one cycle.
#[derive(Clone, Default)]
pub struct ClassifierSet {
    pub identity: Option<Arc<dyn IdentityClassifier>>,
    pub gesture: Option<Arc<dyn GestureClassifier>>,
    pub object: Option<Arc<dyn ObjectClassifier>>,
}

/// Holds each classifier as a capability that may be installed once its
/// model has loaded, or removed again, while cycles are running.
#[derive(Default)]
pub struct ClassifierRegistry {
    identity: RwLock<Option<Arc<dyn IdentityClassifier>>>,
    gesture: RwLock<Option<Arc<dyn GestureClassifier>>>,
    object: RwLock<Option<Arc<dyn ObjectClassifier>>>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_identity(&self, classifier: Arc<dyn IdentityClassifier>) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(classifier);
        tracing::info!("Identity classifier installed");
    }

    pub fn install_gesture(&self, classifier: Arc<dyn GestureClassifier>) {
        *self.gesture.write().unwrap_or_else(PoisonError::into_inner) = Some(classifier);
        tracing::info!("Gesture classifier installed");
    }

    pub fn install_object(&self, classifier: Arc<dyn ObjectClassifier>) {
        *self.object.write().unwrap_or_else(PoisonError::into_inner) = Some(classifier);
        tracing::info!("Object classifier installed");
    }

    pub fn remove_identity(&self) {
        self.identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn remove_gesture(&self) {
        self.gesture
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn remove_object(&self) {
        self.object
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Point-in-time view of which classifiers are loaded.
    pub fn snapshot(&self) -> ClassifierSet {
        ClassifierSet {
            identity: self
                .identity
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            gesture: self
                .gesture
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            object: self
                .object
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoHands;

    #[async_trait]
    impl GestureClassifier for NoHands {
        async fn classify_gesture(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<HandObservation>, ClassifierError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn classifiers_start_absent() {
        let ports = ClassifierRegistry::new().snapshot();
        assert!(ports.identity.is_none());
        assert!(ports.gesture.is_none());
        assert!(ports.object.is_none());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_removal() {
        let registry = ClassifierRegistry::new();
        registry.install_gesture(Arc::new(NoHands));
        let before = registry.snapshot();
        registry.remove_gesture();
        assert!(before.gesture.is_some());
        assert!(registry.snapshot().gesture.is_none());
    }
}
