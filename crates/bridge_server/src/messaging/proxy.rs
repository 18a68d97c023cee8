//! The command proxy: single entry point for every inbound client message.
//!
//! Game commands from one client are sent strictly in arrival order on that
//! client's lane, a dedicated task fed by an unbounded queue. Lanes of
//! different clients run concurrently. A lane is created on the first game
//! command from a connection and released when the connection goes away.
//!
//! System commands only trigger work and never queue behind a lane, so a
//! reconnect still goes out while an earlier send is stuck upstream.

use super::router::{classify_message, timeout_label};
use super::types::{CommandEnvelope, CommandOutcome, SystemCommand};
use crate::shutdown::{ShutdownOrchestrator, ShutdownTrigger};
use crate::upstream::UpstreamHandle;
use bridge_event_system::{
    ClientDisconnectedEvent, ClientMessageEvent, ConnectionId, EventError, EventSystem,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// A game command waiting its turn on a client lane.
type LaneJob = (String, oneshot::Sender<CommandOutcome>);

/// Executes commands against the upstream and the orchestrator.
#[derive(Clone)]
struct CommandExecutor {
    upstream: Arc<dyn UpstreamHandle>,
    orchestrator: ShutdownOrchestrator,
}

impl CommandExecutor {
    fn trigger(&self, command: SystemCommand, origin: ConnectionId) -> CommandOutcome {
        match command {
            SystemCommand::Reconnect => {
                info!("🔄 Connection {} requested an upstream reconnect", origin);
                self.upstream.force_reconnect();
                CommandOutcome::Reconnected
            }
            SystemCommand::Shutdown => {
                info!("🛑 Connection {} requested a server shutdown", origin);
                match self.orchestrator.begin() {
                    // The run is detached; it finishes on its own
                    ShutdownTrigger::Started(_run) => CommandOutcome::ShutdownStarted,
                    ShutdownTrigger::AlreadyRunning(_) => CommandOutcome::ShutdownIgnored,
                }
            }
        }
    }

    async fn forward(&self, command: &str, origin: ConnectionId) -> CommandOutcome {
        let label = timeout_label(command);
        info!("🎮 Forwarding {} from connection {}", label, origin);
        debug!("Forwarded command text: {:?}", command);

        match self.upstream.send(command).await {
            Ok(response) => {
                debug!("🎮 {} answered: {}", label, response);
                CommandOutcome::Forwarded { response }
            }
            Err(e) => {
                warn!("⚠️ Upstream send of {} failed: {}", label, e);
                self.upstream.report_possible_timeout(&e, label);
                CommandOutcome::ForwardFailed {
                    label: label.to_string(),
                }
            }
        }
    }
}

/// Classifies client messages and dispatches them.
pub struct CommandProxy {
    executor: CommandExecutor,
    lanes: DashMap<ConnectionId, mpsc::UnboundedSender<LaneJob>>,
}

impl CommandProxy {
    /// Creates a proxy sending through `upstream` and delegating shutdown
    /// requests to `orchestrator`.
    pub fn new(upstream: Arc<dyn UpstreamHandle>, orchestrator: ShutdownOrchestrator) -> Self {
        Self {
            executor: CommandExecutor {
                upstream,
                orchestrator,
            },
            lanes: DashMap::new(),
        }
    }

    /// Subscribes the proxy to inbound messages and client disconnects.
    pub fn register(self: &Arc<Self>, events: &EventSystem) -> Result<(), EventError> {
        let proxy = Arc::clone(self);
        events.on(move |event: ClientMessageEvent| {
            // The bus never waits for command completion
            drop(proxy.handle_message(&event.payload, event.connection_id));
            Ok(())
        })?;

        let proxy = Arc::clone(self);
        events.on(move |event: ClientDisconnectedEvent| {
            proxy.release_client(event.connection_id);
            Ok(())
        })?;

        Ok(())
    }

    /// Handles one inbound message without waiting for it to be executed.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `payload` - Message text exactly as the client sent it
    /// * `origin` - Connection the message arrived on
    ///
    /// # Returns
    ///
    /// A receiver resolving to the [`CommandOutcome`] once the message has
    /// been handled. Dropping it does not affect execution.
    pub fn handle_message(
        &self,
        payload: &str,
        origin: ConnectionId,
    ) -> oneshot::Receiver<CommandOutcome> {
        let (done, outcome) = oneshot::channel();

        match classify_message(payload) {
            CommandEnvelope::GameCommand(command) => {
                self.enqueue(origin, (command, done));
            }
            CommandEnvelope::System(system) => {
                let _ = done.send(self.executor.trigger(system, origin));
            }
            CommandEnvelope::UnknownSystemCommand(command) => {
                warn!("⚠️ Unknown system command {:?} from connection {}", command, origin);
                let _ = done.send(CommandOutcome::UnknownSystemCommand);
            }
            CommandEnvelope::Unsupported => {
                warn!("⚠️ Unsupported message received from connection {}", origin);
                let _ = done.send(CommandOutcome::Unsupported);
            }
        }

        outcome
    }

    /// Drops the lane of a disconnected client.
    ///
    /// Game commands already queued on the lane still run.
    pub fn release_client(&self, origin: ConnectionId) {
        if self.lanes.remove(&origin).is_some() {
            debug!("Released command lane for connection {}", origin);
        }
    }

    /// Number of clients that currently own a lane.
    pub fn active_lanes(&self) -> usize {
        self.lanes.len()
    }

    fn enqueue(&self, origin: ConnectionId, job: LaneJob) {
        let mut lane = self
            .lanes
            .entry(origin)
            .or_insert_with(|| self.spawn_lane(origin));

        if let Err(mpsc::error::SendError(job)) = lane.send(job) {
            // Worker is gone, start a fresh lane for this client
            *lane = self.spawn_lane(origin);
            if lane.send(job).is_err() {
                error!("❌ Could not queue command for connection {}", origin);
            }
        }
    }

    fn spawn_lane(&self, origin: ConnectionId) -> mpsc::UnboundedSender<LaneJob> {
        let (sender, mut jobs) = mpsc::unbounded_channel::<LaneJob>();
        let executor = self.executor.clone();

        tokio::spawn(async move {
            while let Some((command, done)) = jobs.recv().await {
                let outcome = executor.forward(&command, origin).await;
                let _ = done.send(outcome);
            }
            debug!("Command lane for connection {} finished", origin);
        });

        sender
    }
}

impl std::fmt::Debug for CommandProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandProxy")
            .field("active_lanes", &self.active_lanes())
            .finish_non_exhaustive()
    }
}
