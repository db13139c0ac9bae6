//! Run-state of environments and VMs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    Suspended,
    Halted,
    Busy,
    Reset,
    #[serde(other)]
    Unknown,
}

impl RunState {
    /// States a resource can settle in.
    pub const SETTLED: [RunState; 4] = [
        RunState::Stopped,
        RunState::Running,
        RunState::Suspended,
        RunState::Halted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Halted => "halted",
            Self::Busy => "busy",
            Self::Reset => "reset",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resources that may report a run-state.
///
/// Resources without one (networks, projects) return `None` and never block
/// convergence on being busy.
pub trait HasRunState {
    fn run_state(&self) -> Option<RunState>;
}
