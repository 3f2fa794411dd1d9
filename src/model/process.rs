//! Per-process snapshot records.
//!
//! Source: `/proc/[pid]/{stat,statm,cmdline,exe,cwd,root}`.

use serde::{Deserialize, Serialize};

/// Process scheduling state, from the single-character code in
/// `/proc/[pid]/stat` field 3.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum RunState {
    /// `S` - interruptible sleep.
    Sleep,
    /// `R` - running or runnable.
    Run,
    /// `T` - stopped.
    Stop,
    /// `Z` - zombie.
    Zombie,
    /// `D` - uninterruptible disk wait.
    Idle,
    /// Any other code (`I`, `t`, `X`, ...), kept as read. `?` when the
    /// stat line had no state field.
    Unknown(char),
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Unknown('?')
    }
}

impl RunState {
    pub fn from_code(code: char) -> Self {
        match code {
            'S' => RunState::Sleep,
            'R' => RunState::Run,
            'T' => RunState::Stop,
            'Z' => RunState::Zombie,
            'D' => RunState::Idle,
            other => RunState::Unknown(other),
        }
    }

    /// Kernel state code as read from the stat line.
    pub fn code(self) -> char {
        match self {
            RunState::Sleep => 'S',
            RunState::Run => 'R',
            RunState::Stop => 'T',
            RunState::Zombie => 'Z',
            RunState::Idle => 'D',
            RunState::Unknown(code) => code,
        }
    }
}

/// Identifiers of the processes visible under the proc root.
///
/// Unordered; rebuilt from scratch on every enumeration.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcList {
    pub list: Vec<i32>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcState {
    /// Command name with the surrounding parentheses removed.
    pub name: String,
    pub state: RunState,
    pub ppid: i32,
    /// Controlling terminal device number.
    pub tty: i32,
    pub priority: i32,
    pub nice: i32,
    /// CPU the process last ran on.
    pub processor: i32,
}

/// Process memory usage. Sizes in bytes.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcMem {
    /// Virtual size.
    pub size: u64,
    pub resident: u64,
    pub share: u64,
    pub minor_faults: u64,
    pub major_faults: u64,
    /// `minor_faults + major_faults`.
    pub page_faults: u64,
}

/// Process CPU time. All values in milliseconds; `start_time` is
/// milliseconds since the Unix epoch.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcTime {
    pub start_time: u64,
    pub user: u64,
    pub sys: u64,
    pub total: u64,
}

/// Command-line arguments in invocation order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcArgs {
    pub list: Vec<String>,
}

/// Resolved executable, working directory and root of a process.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcExe {
    pub name: String,
    pub cwd: String,
    pub root: String,
}
