use crate::common::{BoundingBox, Point};
use crate::pipeline::domain::identity::Descriptor;
use serde::{Deserialize, Serialize};

/// A face found by the identity classifier in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    pub descriptor: Descriptor,
}

/// Hand landmarks in image coordinates, indexed by position in the
/// 21-point hand layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: Vec<Point>,
}

/// One candidate from the object classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectObservation {
    pub class_label: String,
    pub probability: f32,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

impl ObjectObservation {
    pub fn new(class_label: impl Into<String>, probability: f32) -> Self {
        Self {
            class_label: class_label.into(),
            probability,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}
