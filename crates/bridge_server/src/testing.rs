//! Recording upstream used by the unit tests of this crate.

use crate::upstream::{UpstreamError, UpstreamHandle};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Upstream handle that records every interaction instead of talking RCON.
#[derive(Debug)]
pub(crate) struct MockUpstream {
    sends: Mutex<Vec<(Instant, String)>>,
    timeout_reports: Mutex<Vec<(UpstreamError, String)>>,
    reconnects: AtomicUsize,
    fail_sends: AtomicBool,
    hang_sends: AtomicBool,
    states: broadcast::Sender<bool>,
}

impl MockUpstream {
    pub(crate) fn new() -> Arc<Self> {
        let (states, _) = broadcast::channel(16);
        Arc::new(Self {
            sends: Mutex::new(Vec::new()),
            timeout_reports: Mutex::new(Vec::new()),
            reconnects: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
            hang_sends: AtomicBool::new(false),
            states,
        })
    }

    /// A mock whose sends all fail with a timeout.
    pub(crate) fn failing() -> Arc<Self> {
        let mock = Self::new();
        mock.set_failing(true);
        mock
    }

    /// A mock whose sends are recorded but never answered.
    pub(crate) fn hanging() -> Arc<Self> {
        let mock = Self::new();
        mock.hang_sends.store(true, Ordering::SeqCst);
        mock
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn sent_commands(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| command.clone())
            .collect()
    }

    pub(crate) fn send_instants(&self) -> Vec<Instant> {
        self.sends.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub(crate) fn timeout_labels(&self) -> Vec<String> {
        self.timeout_reports
            .lock()
            .unwrap()
            .iter()
            .map(|(_, label)| label.clone())
            .collect()
    }

    /// Publishes a connection state as the real transport would.
    pub(crate) fn publish_state(&self, connected: bool) {
        let _ = self.states.send(connected);
    }
}

#[async_trait]
impl UpstreamHandle for MockUpstream {
    async fn send(&self, command: &str) -> Result<String, UpstreamError> {
        self.sends
            .lock()
            .unwrap()
            .push((Instant::now(), command.to_string()));

        if self.hang_sends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.fail_sends.load(Ordering::SeqCst) {
            Err(UpstreamError::Timeout(std::time::Duration::from_secs(5)))
        } else {
            Ok(format!("ok: {command}"))
        }
    }

    fn force_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn report_possible_timeout(&self, error: &UpstreamError, label: &str) {
        self.timeout_reports
            .lock()
            .unwrap()
            .push((error.clone(), label.to_string()));
    }

    fn connection_states(&self) -> broadcast::Receiver<bool> {
        self.states.subscribe()
    }
}
