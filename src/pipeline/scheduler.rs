use crate::common::Frame;
use crate::error::{FrameError, SchedulerError};
use crate::pipeline::decision::{CycleRequest, DecisionPipeline};
use crate::pipeline::domain::CycleResult;
use crate::pipeline::metrics::{MetricsCollector, PerformanceMonitor, PerformanceStats};
use crate::pipeline::ports::FrameSource;
use crate::pipeline::state::SessionStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Stopped,
    Idle,
    CycleInFlight,
}

// `in_flight` outlives the session that set it, so a restart cannot start a
// second cycle while the previous session's cycle is still running.
struct Control {
    running: bool,
    in_flight: bool,
    session: u64,
    next_cycle_id: u64,
    cancel: Option<CancellationToken>,
}

/// Fires the decision pipeline at a fixed period with at most one cycle in
/// flight. Ticks that land while a cycle is running are dropped. Results
/// are merged in start order, and a cycle that finishes after `stop` (or
/// after a restart) is thrown away.
pub struct CycleScheduler {
    inner: Arc<SchedulerInner>,
    monitor: PerformanceMonitor,
}

struct SchedulerInner {
    control: Mutex<Control>,
    pipeline: DecisionPipeline,
    frame_source: Arc<dyn FrameSource>,
    store: Arc<SessionStore>,
    metrics: MetricsCollector,
    frame_timeout: Duration,
}

impl CycleScheduler {
    pub fn new(
        pipeline: DecisionPipeline,
        frame_source: Arc<dyn FrameSource>,
        store: Arc<SessionStore>,
        metrics: MetricsCollector,
        frame_timeout: Duration,
    ) -> Self {
        let monitor = PerformanceMonitor::new();
        let metrics = metrics.add_observer(Arc::new(monitor.clone()));
        Self {
            inner: Arc::new(SchedulerInner {
                control: Mutex::new(Control {
                    running: false,
                    in_flight: false,
                    session: 0,
                    next_cycle_id: 0,
                    cancel: None,
                }),
                pipeline,
                frame_source,
                store,
                metrics,
                frame_timeout,
            }),
            monitor,
        }
    }

    /// Starts a new session ticking every `period`. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, period: Duration) -> Result<(), SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }

        let mut control = self.inner.control();
        if control.running {
            return Err(SchedulerError::AlreadyRunning);
        }

        control.session += 1;
        control.running = true;
        let session = control.session;
        let cancel = CancellationToken::new();
        control.cancel = Some(cancel.clone());
        self.inner.store.reset(session);
        drop(control);

        tokio::spawn(SchedulerInner::tick_loop(
            Arc::clone(&self.inner),
            session,
            period,
            cancel,
        ));
        info!(session, period_ms = period.as_millis() as u64, "Cycle scheduler started");
        Ok(())
    }

    /// Stops ticking. A cycle already in flight runs to completion but its
    /// result is discarded.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut control = self.inner.control();
        if !control.running {
            return Err(SchedulerError::NotRunning);
        }

        control.running = false;
        if let Some(cancel) = control.cancel.take() {
            cancel.cancel();
        }
        info!(session = control.session, "Cycle scheduler stopped");
        Ok(())
    }

    pub fn phase(&self) -> SchedulerPhase {
        let control = self.inner.control();
        match (control.running, control.in_flight) {
            (false, _) => SchedulerPhase::Stopped,
            (true, false) => SchedulerPhase::Idle,
            (true, true) => SchedulerPhase::CycleInFlight,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.control().running
    }

    pub fn stats(&self) -> PerformanceStats {
        self.monitor.get_stats()
    }
}

impl Drop for CycleScheduler {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl SchedulerInner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn tick_loop(
        inner: Arc<SchedulerInner>,
        session: u64,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => inner.on_tick(session),
            }
        }
        debug!(session, "Tick loop finished");
    }

    fn on_tick(self: &Arc<Self>, session: u64) {
        let cycle_id = {
            let mut control = self.control();
            if !control.running || control.session != session {
                return;
            }
            self.metrics.notify_tick_fired(session);
            if control.in_flight {
                let in_flight = control.next_cycle_id;
                drop(control);
                debug!("Cycle {} still in flight, skipping tick", in_flight);
                self.metrics.notify_tick_skipped(in_flight);
                return;
            }
            control.in_flight = true;
            control.next_cycle_id += 1;
            control.next_cycle_id
        };

        tokio::spawn(Arc::clone(self).run_cycle(session, cycle_id));
    }

    async fn run_cycle(self: Arc<Self>, session: u64, cycle_id: u64) {
        let guard = CycleGuard {
            inner: &self,
            session,
            cycle_id,
            started: Instant::now(),
            finished: false,
        };

        let result = match self.acquire_frame().await {
            Ok(frame) => {
                match self
                    .pipeline
                    .clone()
                    .oneshot(CycleRequest { cycle_id, frame })
                    .await
                {
                    Ok(result) => Some(result),
                    Err(never) => match never {},
                }
            }
            Err(e) => {
                debug!(error = %e, "Skipping cycle {}", cycle_id);
                self.metrics.notify_frame_unavailable(cycle_id);
                None
            }
        };

        guard.finish(result);
    }

    async fn acquire_frame(&self) -> Result<Frame, FrameError> {
        match tokio::time::timeout(self.frame_timeout, self.frame_source.current_frame()).await {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => Err(FrameError::Unavailable),
            Err(_) => {
                warn!("Frame source did not answer within {:?}", self.frame_timeout);
                Err(FrameError::Unavailable)
            }
        }
    }

    /// Frees the in-flight slot and merges the result, unless the session
    /// that started this cycle has ended.
    fn complete(&self, session: u64, cycle_id: u64, result: Option<CycleResult>, elapsed: Duration) {
        let mut control = self.control();
        control.in_flight = false;
        let current = control.running && control.session == session;

        match result {
            Some(result) if current => {
                self.metrics.notify_cycle_completed(&result, elapsed);
                self.store.apply(result);
            }
            Some(_) => {
                debug!("Discarding cycle {} from ended session {}", cycle_id, session);
                self.metrics.notify_cycle_discarded(cycle_id);
            }
            None => {}
        }
    }
}

// Frees the in-flight slot even if the cycle task unwinds.
struct CycleGuard<'a> {
    inner: &'a SchedulerInner,
    session: u64,
    cycle_id: u64,
    started: Instant,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(mut self, result: Option<CycleResult>) {
        self.finished = true;
        self.inner
            .complete(self.session, self.cycle_id, result, self.started.elapsed());
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            error!(cycle_id = self.cycle_id, "Cycle aborted before completion");
            self.inner
                .complete(self.session, self.cycle_id, None, self.started.elapsed());
        }
    }
}
