use crate::pipeline::domain::observation::HandObservation;

pub const WRIST: usize = 0;
pub const INDEX_FINGER_TIP: usize = 8;

impl HandObservation {
    /// A hand counts as raised when the index fingertip is above the wrist.
    /// Hands missing either landmark are never raised.
    pub fn is_raised(&self) -> bool {
        match (
            self.landmarks.get(INDEX_FINGER_TIP),
            self.landmarks.get(WRIST),
        ) {
            (Some(tip), Some(wrist)) => tip.is_above(wrist),
            _ => false,
        }
    }
}

pub fn count_raised(hands: &[HandObservation]) -> usize {
    hands.iter().filter(|hand| hand.is_raised()).count()
}

#[cfg(test)]
pub(crate) fn hand(wrist_y: f32, tip_y: f32) -> HandObservation {
    use crate::common::Point;
    let mut landmarks = vec![Point::new(50.0, wrist_y); 21];
    landmarks[INDEX_FINGER_TIP] = Point::new(52.0, tip_y);
    HandObservation { landmarks }
}
