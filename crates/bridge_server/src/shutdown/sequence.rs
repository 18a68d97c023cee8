//! The fixed stage list of the shutdown sequence.

use std::fmt;
use std::time::Duration;

/// First warning, sent when the sequence starts.
pub const WARN_FIVE_MINUTES: &str = "broadcast System will be <RichColor Color=\"1, 0, 0, 1\">shutting down</> in <RichColor Color=\"1, 1, 0, 1\">5 minutes</>, please get somewhere safe!";

/// Second warning, one minute before the save.
pub const WARN_ONE_MINUTE: &str = "broadcast System will be <RichColor Color=\"1, 0, 0, 1\">shutting down</> in <RichColor Color=\"1, 1, 0, 1\">1 minute</>, please get somewhere safe NOW!";

/// Final warning, sent right before the world is saved.
pub const WARN_NOW: &str = "broadcast System is <RichColor Color=\"1, 0, 0, 1\">SHUTTING DOWN NOW</>...";

pub const SAVE_WORLD: &str = "SaveWorld";

pub const FORCE_EXIT: &str = "DoExit";

/// Phases of the shutdown state machine.
///
/// `Idle` is both the start and the end state; every other phase corresponds
/// to exactly one stage of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownPhase {
    Idle,
    Warn5,
    Wait4m,
    Warn1,
    Wait1m,
    WarnNow,
    SaveWorld,
    Wait10s,
    ForceExit,
}

impl fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownPhase::Idle => "idle",
            ShutdownPhase::Warn5 => "warn-5min",
            ShutdownPhase::Wait4m => "wait-4min",
            ShutdownPhase::Warn1 => "warn-1min",
            ShutdownPhase::Wait1m => "wait-1min",
            ShutdownPhase::WarnNow => "warn-now",
            ShutdownPhase::SaveWorld => "save-world",
            ShutdownPhase::Wait10s => "wait-10s",
            ShutdownPhase::ForceExit => "force-exit",
        };
        f.write_str(name)
    }
}

/// What a stage does once it becomes current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Send one fixed command upstream
    Send(&'static str),
    /// Suspend the sequence for the given duration
    Wait(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownStage {
    pub phase: ShutdownPhase,
    pub action: StageAction,
}

/// Ordered list of shutdown stages.
#[derive(Debug, Clone)]
pub struct ShutdownSequence {
    stages: Vec<ShutdownStage>,
}

impl ShutdownSequence {
    /// The five-minute warn, save and exit sequence run on `sysCommand::shutdown`.
    pub fn standard() -> Self {
        let stage = |phase, action| ShutdownStage { phase, action };
        Self {
            stages: vec![
                stage(ShutdownPhase::Warn5, StageAction::Send(WARN_FIVE_MINUTES)),
                stage(ShutdownPhase::Wait4m, StageAction::Wait(Duration::from_secs(4 * 60))),
                stage(ShutdownPhase::Warn1, StageAction::Send(WARN_ONE_MINUTE)),
                stage(ShutdownPhase::Wait1m, StageAction::Wait(Duration::from_secs(60))),
                stage(ShutdownPhase::WarnNow, StageAction::Send(WARN_NOW)),
                stage(ShutdownPhase::SaveWorld, StageAction::Send(SAVE_WORLD)),
                stage(ShutdownPhase::Wait10s, StageAction::Wait(Duration::from_secs(10))),
                stage(ShutdownPhase::ForceExit, StageAction::Send(FORCE_EXIT)),
            ],
        }
    }

    pub fn stages(&self) -> &[ShutdownStage] {
        &self.stages
    }

    /// Sum of all wait stages.
    pub fn total_delay(&self) -> Duration {
        self.stages
            .iter()
            .filter_map(|stage| match stage.action {
                StageAction::Wait(delay) => Some(delay),
                StageAction::Send(_) => None,
            })
            .sum()
    }

    /// Commands in the order they are sent.
    pub fn commands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().filter_map(|stage| match stage.action {
            StageAction::Send(command) => Some(command),
            StageAction::Wait(_) => None,
        })
    }
}

impl Default for ShutdownSequence {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sequence_order() {
        let sequence = ShutdownSequence::standard();
        let phases: Vec<_> = sequence.stages().iter().map(|stage| stage.phase).collect();

        assert_eq!(
            phases,
            vec![
                ShutdownPhase::Warn5,
                ShutdownPhase::Wait4m,
                ShutdownPhase::Warn1,
                ShutdownPhase::Wait1m,
                ShutdownPhase::WarnNow,
                ShutdownPhase::SaveWorld,
                ShutdownPhase::Wait10s,
                ShutdownPhase::ForceExit,
            ]
        );
        assert_eq!(
            sequence.commands().collect::<Vec<_>>(),
            vec![WARN_FIVE_MINUTES, WARN_ONE_MINUTE, WARN_NOW, SAVE_WORLD, FORCE_EXIT]
        );
        assert_eq!(sequence.total_delay(), Duration::from_secs(310));
    }

    #[test]
    fn test_warnings_are_broadcasts() {
        for warning in [WARN_FIVE_MINUTES, WARN_ONE_MINUTE, WARN_NOW] {
            assert!(warning.starts_with("broadcast "));
        }
    }
}
