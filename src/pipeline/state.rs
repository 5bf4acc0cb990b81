use crate::pipeline::domain::CycleResult;
use indexmap::IndexSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Session-level aggregate of every merged cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    attendance: IndexSet<String>,
    hand_raise_count: usize,
    last_detected_object: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// People recognised at least once this session, in order of first sighting.
    pub fn attendance(&self) -> &IndexSet<String> {
        &self.attendance
    }

    pub fn has_attended(&self, label: &str) -> bool {
        self.attendance.contains(label)
    }

    /// Hands raised in the latest cycle.
    pub fn hand_raise_count(&self) -> usize {
        self.hand_raise_count
    }

    pub fn last_detected_object(&self) -> Option<&str> {
        self.last_detected_object.as_deref()
    }
}

/// Folds one cycle into the session.
///
/// Attendance only grows and never admits unknown faces. The hand count is
/// replaced, not accumulated. The object is replaced only when the cycle
/// produced one. Applying the same result twice gives the same state.
pub fn merge(state: &SessionState, result: &CycleResult) -> SessionState {
    let mut attendance = state.attendance.clone();
    attendance.extend(
        result
            .identities()
            .filter_map(|m| m.identity.label())
            .map(str::to_string),
    );

    SessionState {
        attendance,
        hand_raise_count: result.raised_hand_count,
        last_detected_object: result
            .object_label()
            .map(str::to_string)
            .or_else(|| state.last_detected_object.clone()),
    }
}

/// What readers see: an immutable view of the session plus the result that
/// produced it, for overlay drawing.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub session: u64,
    pub cycles_merged: u64,
    pub state: Arc<SessionState>,
    pub latest_result: Option<Arc<CycleResult>>,
}

/// Owns the session state. Writes come only from the scheduler's
/// cycle-completion path; readers get cheap snapshots and never block it.
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Discards everything and starts `session` from an empty state.
    pub(crate) fn reset(&self, session: u64) {
        self.tx.send_replace(SessionSnapshot {
            session,
            ..SessionSnapshot::default()
        });
    }

    /// Merges a finished cycle and returns the labels it newly admitted.
    pub(crate) fn apply(&self, result: CycleResult) -> Vec<String> {
        let mut admitted = Vec::new();
        self.tx.send_modify(|snapshot| {
            let next = merge(&snapshot.state, &result);
            admitted = next
                .attendance
                .iter()
                .filter(|label| !snapshot.state.has_attended(label))
                .cloned()
                .collect();
            snapshot.state = Arc::new(next);
            snapshot.latest_result = Some(Arc::new(result));
            snapshot.cycles_merged += 1;
        });

        for label in &admitted {
            info!(label = %label, "Attendance recorded");
        }
        admitted
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
