use crate::pipeline::domain::{CycleResult, Signal};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Observer pattern for scheduler metrics
pub trait MetricsObserver: Send + Sync {
    fn on_tick_fired(&self, session: u64);
    fn on_tick_skipped(&self, cycle_in_flight: u64);
    fn on_frame_unavailable(&self, cycle_id: u64);
    fn on_cycle_completed(&self, result: &CycleResult, duration: Duration);
    fn on_cycle_discarded(&self, cycle_id: u64);
}

/// Fans notifications out to every registered observer
#[derive(Clone, Default)]
pub struct MetricsCollector {
    observers: Vec<Arc<dyn MetricsObserver>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(mut self, observer: Arc<dyn MetricsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn notify_tick_fired(&self, session: u64) {
        for observer in &self.observers {
            observer.on_tick_fired(session);
        }
    }

    pub fn notify_tick_skipped(&self, cycle_in_flight: u64) {
        for observer in &self.observers {
            observer.on_tick_skipped(cycle_in_flight);
        }
    }

    pub fn notify_frame_unavailable(&self, cycle_id: u64) {
        for observer in &self.observers {
            observer.on_frame_unavailable(cycle_id);
        }
    }

    pub fn notify_cycle_completed(&self, result: &CycleResult, duration: Duration) {
        for observer in &self.observers {
            observer.on_cycle_completed(result, duration);
        }
    }

    pub fn notify_cycle_discarded(&self, cycle_id: u64) {
        for observer in &self.observers {
            observer.on_cycle_discarded(cycle_id);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceStats {
    pub ticks_fired: u64,
    pub ticks_skipped: u64,
    pub cycles_completed: u64,
    pub cycles_discarded: u64,
    pub frames_unavailable: u64,
    pub identity_failures: u64,
    pub gesture_failures: u64,
    pub object_failures: u64,

    // EWMA and extremes of cycle wall time
    pub average_cycle_time_us: f32,
    pub last_cycle_time_us: u64,
    pub max_cycle_time_us: u64,
}

/// Performance monitoring observer
#[derive(Clone, Default)]
pub struct PerformanceMonitor {
    stats: Arc<Mutex<PerformanceStats>>,
}

impl PerformanceMonitor {
    const ALPHA: f32 = 0.1; // EWMA smoothing factor

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_stats(&self) -> PerformanceStats {
        self.stats().clone()
    }

    fn stats(&self) -> std::sync::MutexGuard<'_, PerformanceStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_ewma(current: f32, new_value: u64, alpha: f32) -> f32 {
        current * (1.0 - alpha) + new_value as f32 * alpha
    }
}

impl MetricsObserver for PerformanceMonitor {
    fn on_tick_fired(&self, _session: u64) {
        self.stats().ticks_fired += 1;
    }

    fn on_tick_skipped(&self, _cycle_in_flight: u64) {
        self.stats().ticks_skipped += 1;
    }

    fn on_frame_unavailable(&self, _cycle_id: u64) {
        self.stats().frames_unavailable += 1;
    }

    fn on_cycle_completed(&self, result: &CycleResult, duration: Duration) {
        let mut stats = self.stats();
        let duration_us = duration.as_micros() as u64;

        stats.cycles_completed += 1;
        stats.average_cycle_time_us = if stats.cycles_completed == 1 {
            duration_us as f32
        } else {
            Self::update_ewma(stats.average_cycle_time_us, duration_us, Self::ALPHA)
        };
        stats.last_cycle_time_us = duration_us;
        stats.max_cycle_time_us = stats.max_cycle_time_us.max(duration_us);

        for signal in result.outcomes.failures() {
            match signal {
                Signal::Identity => stats.identity_failures += 1,
                Signal::Gesture => stats.gesture_failures += 1,
                Signal::Object => stats.object_failures += 1,
            }
        }
    }

    fn on_cycle_discarded(&self, _cycle_id: u64) {
        self.stats().cycles_discarded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::domain::SignalOutcome;
    use uuid::Uuid;

    #[test]
    fn counts_failures_per_signal() {
        let monitor = PerformanceMonitor::new();
        let collector = MetricsCollector::new().add_observer(Arc::new(monitor.clone()));

        let mut result = CycleResult::empty(1, Uuid::new_v4(), 8, 8);
        result.outcomes.object = SignalOutcome::Failed("boom".to_string());
        result.outcomes.identity = SignalOutcome::TimedOut;
        collector.notify_cycle_completed(&result, Duration::from_micros(400));
        collector.notify_cycle_completed(&result, Duration::from_micros(200));
        collector.notify_tick_fired(1);
        collector.notify_tick_fired(1);
        collector.notify_tick_skipped(2);
        collector.notify_cycle_discarded(3);
        collector.notify_frame_unavailable(4);

        let stats = monitor.get_stats();
        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.identity_failures, 2);
        assert_eq!(stats.gesture_failures, 0);
        assert_eq!(stats.object_failures, 2);
        assert_eq!(stats.ticks_fired, 2);
        assert_eq!(stats.ticks_skipped, 1);
        assert_eq!(stats.cycles_discarded, 1);
        assert_eq!(stats.frames_unavailable, 1);
        assert_eq!(stats.max_cycle_time_us, 400);
        assert_eq!(stats.last_cycle_time_us, 200);
        assert!((stats.average_cycle_time_us - 380.0).abs() < 1e-3);
    }

    #[test]
    fn unavailable_classifiers_are_not_failures() {
        let monitor = PerformanceMonitor::new();
        let result = CycleResult::empty(1, Uuid::new_v4(), 8, 8);
        monitor.on_cycle_completed(&result, Duration::from_micros(10));
        let stats = monitor.get_stats();
        assert_eq!(
            stats.identity_failures + stats.gesture_failures + stats.object_failures,
            0
        );
    }
}
