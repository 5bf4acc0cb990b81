use crate::common::BoundingBox;
use crate::error::ClassifierError;
use crate::pipeline::domain::identity::IdentityMatch;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Identity,
    Gesture,
    Object,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Identity => "identity",
            Signal::Gesture => "gesture",
            Signal::Object => "object",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a classifier contributed to one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Resolved,
    Unavailable,
    Failed(String),
    TimedOut,
}

impl SignalOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SignalOutcome::Failed(_) | SignalOutcome::TimedOut)
    }
}

impl From<&ClassifierError> for SignalOutcome {
    fn from(error: &ClassifierError) -> Self {
        match error {
            ClassifierError::Unavailable => SignalOutcome::Unavailable,
            ClassifierError::Failure(reason) => SignalOutcome::Failed(reason.clone()),
            ClassifierError::TimedOut(_) => SignalOutcome::TimedOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalOutcomes {
    pub identity: SignalOutcome,
    pub gesture: SignalOutcome,
    pub object: SignalOutcome,
}

impl SignalOutcomes {
    pub fn get(&self, signal: Signal) -> &SignalOutcome {
        match signal {
            Signal::Identity => &self.identity,
            Signal::Gesture => &self.gesture,
            Signal::Object => &self.object,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = Signal> + '_ {
        [Signal::Identity, Signal::Gesture, Signal::Object]
            .into_iter()
            .filter(|signal| self.get(*signal).is_failure())
    }
}

impl Default for SignalOutcomes {
    fn default() -> Self {
        Self {
            identity: SignalOutcome::Unavailable,
            gesture: SignalOutcome::Unavailable,
            object: SignalOutcome::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFace {
    pub bbox: BoundingBox,
    pub identity: IdentityMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHand {
    pub bbox: Option<BoundingBox>,
    pub raised: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    pub class_label: String,
    pub label: String,
    pub probability: f32,
    pub bbox: Option<BoundingBox>,
}

/// Everything one pass of the decision pipeline produced for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    pub cycle_id: u64,
    pub frame_id: Uuid,
    pub frame_width: u32,
    pub frame_height: u32,
    pub faces: Vec<ResolvedFace>,
    pub hands: Vec<ResolvedHand>,
    pub raised_hand_count: usize,
    pub object: Option<ResolvedObject>,
    pub outcomes: SignalOutcomes,
}

impl CycleResult {
    pub fn empty(cycle_id: u64, frame_id: Uuid, frame_width: u32, frame_height: u32) -> Self {
        Self {
            cycle_id,
            frame_id,
            frame_width,
            frame_height,
            faces: Vec::new(),
            hands: Vec::new(),
            raised_hand_count: 0,
            object: None,
            outcomes: SignalOutcomes::default(),
        }
    }

    pub fn identities(&self) -> impl Iterator<Item = &IdentityMatch> {
        self.faces.iter().map(|face| &face.identity)
    }

    pub fn object_label(&self) -> Option<&str> {
        self.object.as_ref().map(|object| object.label.as_str())
    }
}
