//! Runs the shutdown sequence against the upstream connection.

use super::sequence::{ShutdownPhase, ShutdownSequence, StageAction};
use crate::upstream::UpstreamHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of asking the orchestrator to start.
#[derive(Debug)]
pub enum ShutdownTrigger {
    /// The sequence was started; the handle resolves when it has finished
    Started(JoinHandle<ShutdownReport>),
    /// A sequence is already in progress and was left untouched
    AlreadyRunning(ShutdownPhase),
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub sends_attempted: usize,
    pub sends_failed: usize,
}

/// Drives the in-game shutdown state machine.
///
/// Only one run can be active at a time. Once started, a run always goes all
/// the way to the exit command: failed sends are logged and skipped, and
/// nothing cancels the remaining stages.
#[derive(Clone)]
pub struct ShutdownOrchestrator {
    upstream: Arc<dyn UpstreamHandle>,
    sequence: Arc<ShutdownSequence>,
    phase: Arc<Mutex<ShutdownPhase>>,
    running: Arc<AtomicBool>,
}

impl ShutdownOrchestrator {
    /// Creates an orchestrator running the standard sequence.
    pub fn new(upstream: Arc<dyn UpstreamHandle>) -> Self {
        Self::with_sequence(upstream, ShutdownSequence::standard())
    }

    pub fn with_sequence(upstream: Arc<dyn UpstreamHandle>, sequence: ShutdownSequence) -> Self {
        Self {
            upstream,
            sequence: Arc::new(sequence),
            phase: Arc::new(Mutex::new(ShutdownPhase::Idle)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the sequence on a new task unless one is already running.
    ///
    /// Returns immediately; the caller never waits for the stages.
    pub fn begin(&self) -> ShutdownTrigger {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let phase = self.phase();
            warn!("🛑 Shutdown already in progress (phase: {}), ignoring request", phase);
            return ShutdownTrigger::AlreadyRunning(phase);
        }

        info!(
            "🛑 Starting shutdown sequence, server exits in {:?}",
            self.sequence.total_delay()
        );

        let guard = RunGuard {
            phase: self.phase.clone(),
            running: self.running.clone(),
        };
        if let Some(first) = self.sequence.stages().first() {
            guard.enter(first.phase);
        }
        let upstream = self.upstream.clone();
        let sequence = self.sequence.clone();

        ShutdownTrigger::Started(tokio::spawn(async move {
            let report = run_sequence(upstream.as_ref(), &sequence, &guard).await;
            drop(guard);
            report
        }))
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> ShutdownPhase {
        *lock_phase(&self.phase)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ShutdownOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownOrchestrator")
            .field("phase", &self.phase())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn run_sequence(
    upstream: &dyn UpstreamHandle,
    sequence: &ShutdownSequence,
    guard: &RunGuard,
) -> ShutdownReport {
    let mut report = ShutdownReport::default();

    for stage in sequence.stages() {
        guard.enter(stage.phase);

        match stage.action {
            StageAction::Send(command) => {
                report.sends_attempted += 1;
                match upstream.send(command).await {
                    Ok(response) => {
                        info!("🛑 Shutdown stage {} sent", stage.phase);
                        debug!("Shutdown stage {} response: {}", stage.phase, response);
                    }
                    Err(e) => {
                        report.sends_failed += 1;
                        error!("❌ Shutdown stage {} failed: {}, continuing", stage.phase, e);
                    }
                }
            }
            StageAction::Wait(delay) => {
                info!("⏳ Shutdown stage {}: waiting {:?}", stage.phase, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    info!(
        "✅ Shutdown sequence finished ({} sends, {} failed)",
        report.sends_attempted, report.sends_failed
    );
    report
}

/// Returns the state machine to `Idle` when a run ends, however it ends.
struct RunGuard {
    phase: Arc<Mutex<ShutdownPhase>>,
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn enter(&self, phase: ShutdownPhase) {
        *lock_phase(&self.phase) = phase;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *lock_phase(&self.phase) = ShutdownPhase::Idle;
        self.running.store(false, Ordering::Release);
    }
}

fn lock_phase(phase: &Mutex<ShutdownPhase>) -> std::sync::MutexGuard<'_, ShutdownPhase> {
    phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::sequence::{FORCE_EXIT, SAVE_WORLD, WARN_FIVE_MINUTES, WARN_NOW, WARN_ONE_MINUTE};
    use crate::testing::MockUpstream;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_sequence_sends_at_expected_offsets() {
        let mock = MockUpstream::new();
        let orchestrator = ShutdownOrchestrator::new(mock.clone());
        let start = Instant::now();

        let ShutdownTrigger::Started(run) = orchestrator.begin() else {
            panic!("orchestrator should start from idle");
        };
        let report = run.await.unwrap();

        assert_eq!(
            mock.sent_commands(),
            vec![WARN_FIVE_MINUTES, WARN_ONE_MINUTE, WARN_NOW, SAVE_WORLD, FORCE_EXIT]
        );
        let offsets: Vec<u128> = mock
            .send_instants()
            .into_iter()
            .map(|at| at.duration_since(start).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 240_000, 300_000, 300_000, 310_000]);
        assert_eq!(report, ShutdownReport { sends_attempted: 5, sends_failed: 0 });
        assert_eq!(orchestrator.phase(), ShutdownPhase::Idle);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_is_ignored_while_running() {
        let mock = MockUpstream::new();
        let orchestrator = ShutdownOrchestrator::new(mock.clone());

        let ShutdownTrigger::Started(run) = orchestrator.begin() else {
            panic!("first request should start the sequence");
        };

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(orchestrator.phase(), ShutdownPhase::Wait4m);

        match orchestrator.begin() {
            ShutdownTrigger::AlreadyRunning(phase) => assert_eq!(phase, ShutdownPhase::Wait4m),
            ShutdownTrigger::Started(_) => panic!("second request must not start a new run"),
        }

        run.await.unwrap();
        assert_eq!(mock.sent_commands().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_is_set_before_run_task_starts() {
        let mock = MockUpstream::new();
        let orchestrator = ShutdownOrchestrator::new(mock.clone());

        let ShutdownTrigger::Started(run) = orchestrator.begin() else {
            panic!("orchestrator should start from idle");
        };
        assert_eq!(orchestrator.phase(), ShutdownPhase::Warn5);

        match orchestrator.begin() {
            ShutdownTrigger::AlreadyRunning(phase) => assert_eq!(phase, ShutdownPhase::Warn5),
            ShutdownTrigger::Started(_) => panic!("second request must not start a new run"),
        }
        assert!(mock.sent_commands().is_empty());

        run.await.unwrap();
        assert_eq!(mock.sent_commands().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sends_do_not_stop_sequence() {
        let mock = MockUpstream::failing();
        let orchestrator = ShutdownOrchestrator::new(mock.clone());

        let ShutdownTrigger::Started(run) = orchestrator.begin() else {
            panic!("orchestrator should start from idle");
        };
        let report = run.await.unwrap();

        assert_eq!(report, ShutdownReport { sends_attempted: 5, sends_failed: 5 });
        assert_eq!(mock.sent_commands().last().map(String::as_str), Some(FORCE_EXIT));
        assert!(mock.timeout_labels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_can_run_again_after_completion() {
        let mock = MockUpstream::new();
        let orchestrator = ShutdownOrchestrator::new(mock.clone());

        for _ in 0..2 {
            let ShutdownTrigger::Started(run) = orchestrator.begin() else {
                panic!("idle orchestrator should start");
            };
            run.await.unwrap();
        }

        assert_eq!(mock.sent_commands().len(), 10);
    }
}
