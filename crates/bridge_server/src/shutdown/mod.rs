//! Timed in-game shutdown of the managed server.
//!
//! Players get warned five minutes, one minute and immediately before the
//! world is saved and the process is told to exit. The stages live in
//! [`ShutdownSequence`] and are driven by [`ShutdownOrchestrator`].

pub mod orchestrator;
pub mod sequence;

pub use orchestrator::{ShutdownOrchestrator, ShutdownReport, ShutdownTrigger};
pub use sequence::{ShutdownPhase, ShutdownSequence, ShutdownStage, StageAction};
