//! Sliding-window timeout counting with automatic reconnect.

use crate::upstream::{UpstreamError, UpstreamHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Timeout monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutMonitorConfig {
    /// Number of reports inside the window that triggers a reconnect
    pub threshold: u32,
    /// How far back reports are counted
    pub window: Duration,
}

impl Default for TimeoutMonitorConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            window: Duration::from_secs(60),
        }
    }
}

/// Counts possible-timeout reports inside a sliding time window.
#[derive(Debug)]
pub struct TimeoutMonitor {
    config: TimeoutMonitorConfig,
    reports: Mutex<VecDeque<Instant>>,
}

impl TimeoutMonitor {
    /// Creates a monitor with no recorded reports.
    pub fn new(config: TimeoutMonitorConfig) -> Self {
        Self {
            config,
            reports: Mutex::new(VecDeque::new()),
        }
    }

    /// Records one report.
    ///
    /// # Returns
    ///
    /// `true` when this report brings the window up to the threshold. The
    /// window is cleared at that point, so the next trip needs a full set of
    /// fresh reports.
    pub fn record_timeout(&self) -> bool {
        let now = Instant::now();
        let mut reports = self.lock_reports();
        Self::prune(&mut reports, now, self.config.window);
        reports.push_back(now);

        if reports.len() as u32 >= self.config.threshold {
            reports.clear();
            true
        } else {
            false
        }
    }

    /// Forgets all reports after a send went through.
    pub fn record_success(&self) {
        self.lock_reports().clear();
    }

    /// Number of reports currently inside the window.
    pub fn recent_reports(&self) -> usize {
        let mut reports = self.lock_reports();
        Self::prune(&mut reports, Instant::now(), self.config.window);
        reports.len()
    }

    pub fn config(&self) -> &TimeoutMonitorConfig {
        &self.config
    }

    fn prune(reports: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = reports.front() {
            if now.duration_since(*oldest) >= window {
                reports.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock_reports(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // The deque holds plain timestamps, a poisoned lock leaves it usable
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Upstream wrapper that forces a reconnect after repeated possible timeouts.
///
/// Every call is passed through to the wrapped handle. On top of that, each
/// possible-timeout report is counted and a successful send clears the count.
pub struct MonitoredUpstream {
    inner: Arc<dyn UpstreamHandle>,
    monitor: TimeoutMonitor,
}

impl MonitoredUpstream {
    pub fn new(inner: Arc<dyn UpstreamHandle>, config: TimeoutMonitorConfig) -> Self {
        Self {
            inner,
            monitor: TimeoutMonitor::new(config),
        }
    }

    pub fn monitor(&self) -> &TimeoutMonitor {
        &self.monitor
    }
}

impl std::fmt::Debug for MonitoredUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredUpstream")
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UpstreamHandle for MonitoredUpstream {
    async fn send(&self, command: &str) -> Result<String, UpstreamError> {
        let result = self.inner.send(command).await;
        if result.is_ok() {
            self.monitor.record_success();
        }
        result
    }

    fn force_reconnect(&self) {
        self.inner.force_reconnect();
    }

    fn report_possible_timeout(&self, error: &UpstreamError, label: &str) {
        self.inner.report_possible_timeout(error, label);

        if self.monitor.record_timeout() {
            warn!(
                "⏱️ {} possible upstream timeouts within {:?} (last: {}), forcing reconnect",
                self.monitor.config().threshold,
                self.monitor.config().window,
                label
            );
            self.inner.force_reconnect();
        } else {
            debug!(
                "⏱️ Possible upstream timeout recorded for {} ({} in window)",
                label,
                self.monitor.recent_reports()
            );
        }
    }

    fn connection_states(&self) -> broadcast::Receiver<bool> {
        self.inner.connection_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockUpstream;
    use tokio::time::advance;

    fn config(threshold: u32, window_secs: u64) -> TimeoutMonitorConfig {
        TimeoutMonitorConfig {
            threshold,
            window: Duration::from_secs(window_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_trips_once_and_resets() {
        let monitor = TimeoutMonitor::new(config(3, 60));

        assert!(!monitor.record_timeout());
        assert!(!monitor.record_timeout());
        assert!(monitor.record_timeout());
        assert_eq!(monitor.recent_reports(), 0);
        assert!(!monitor.record_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_outside_window_expire() {
        let monitor = TimeoutMonitor::new(config(2, 10));

        assert!(!monitor.record_timeout());
        advance(Duration::from_secs(11)).await;
        assert_eq!(monitor.recent_reports(), 0);
        assert!(!monitor.record_timeout());
        advance(Duration::from_secs(5)).await;
        assert!(monitor.record_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitored_upstream_reconnects_at_threshold() {
        let mock = MockUpstream::failing();
        let upstream = MonitoredUpstream::new(mock.clone(), config(2, 60));
        let error = UpstreamError::Timeout(Duration::from_secs(5));

        upstream.report_possible_timeout(&error, "ListPlayers");
        assert_eq!(mock.reconnect_count(), 0);
        upstream.report_possible_timeout(&error, "ListPlayers");
        assert_eq!(mock.reconnect_count(), 1);
        assert_eq!(mock.timeout_labels(), vec!["ListPlayers", "ListPlayers"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_send_clears_reports() {
        let mock = MockUpstream::new();
        let upstream = MonitoredUpstream::new(mock.clone(), config(2, 60));
        let error = UpstreamError::NotConnected;

        upstream.report_possible_timeout(&error, "SaveWorld");
        upstream.send("SaveWorld").await.unwrap();
        upstream.report_possible_timeout(&error, "SaveWorld");

        assert_eq!(mock.reconnect_count(), 0);
        assert_eq!(upstream.monitor().recent_reports(), 1);
    }
}
