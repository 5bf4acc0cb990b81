pub mod cycle_result;
pub mod gesture;
pub mod identity;
pub mod object;
pub mod observation;

pub use cycle_result::{
    CycleResult, ResolvedFace, ResolvedHand, ResolvedObject, Signal, SignalOutcome,
    SignalOutcomes,
};
pub use identity::{Descriptor, Gallery, Identity, IdentityMatch, IdentityMatcher};
pub use object::LabelTable;
pub use observation::{FaceObservation, HandObservation, ObjectObservation};
