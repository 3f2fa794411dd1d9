//! Process collector for gathering per-process metrics from `/proc/[pid]/`.

use std::io;
use std::sync::Arc;

use tracing::trace;

use crate::collector::procfs::parser::{LinuxParser, ProcParser, ProcStat};
use crate::collector::traits::FileSystem;
use crate::config::ProcConfig;
use crate::model::{ProcArgs, ProcExe, ProcList, ProcMem, ProcState, ProcTime, RunState};

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// Process disappeared during collection.
    ProcessGone(i32),
    /// I/O error reading a system-wide source.
    Io(io::Error),
    /// Parse error in a source that is present but structurally unusable.
    Parse(String),
    /// Invalid caller-supplied settings.
    Config(String),
    /// A required part of a multi-part record could not be read.
    Incomplete {
        pid: i32,
        field: &'static str,
        source: io::Error,
    },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
            CollectError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            CollectError::Incomplete { pid, field, source } => {
                write!(f, "process {}: cannot read {}: {}", pid, field, source)
            }
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io(e) | CollectError::Incomplete { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CollectError {
    fn from(e: io::Error) -> Self {
        CollectError::Io(e)
    }
}

impl CollectError {
    /// True when the source was missing (file or process gone).
    pub fn is_not_found(&self) -> bool {
        match self {
            CollectError::ProcessGone(_) => true,
            CollectError::Io(e) | CollectError::Incomplete { source: e, .. } => {
                e.kind() == io::ErrorKind::NotFound
            }
            CollectError::Parse(_) | CollectError::Config(_) => false,
        }
    }
}

/// Maps a failed per-process read to [`CollectError`]: a missing file means
/// the process exited between enumeration and this read.
fn process_read_error(pid: i32, e: io::Error) -> CollectError {
    if e.kind() == io::ErrorKind::NotFound {
        CollectError::ProcessGone(pid)
    } else {
        CollectError::Io(e)
    }
}

/// Collects process information from `/proc/[pid]/` files.
pub struct ProcessCollector<F: FileSystem> {
    fs: F,
    config: Arc<ProcConfig>,
    parser: Arc<dyn ProcParser>,
}

impl<F: FileSystem> ProcessCollector<F> {
    /// Creates a new process collector using the Linux `/proc` layout.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `config` - Proc root, clock-tick rate, page size and boot time
    pub fn new(fs: F, config: Arc<ProcConfig>) -> Self {
        Self::with_parser(fs, config, Arc::new(LinuxParser))
    }

    pub fn with_parser(fs: F, config: Arc<ProcConfig>, parser: Arc<dyn ProcParser>) -> Self {
        Self { fs, config, parser }
    }

    pub fn config(&self) -> &ProcConfig {
        &self.config
    }

    /// Lists the pids visible under the proc root.
    ///
    /// Entries whose name is not a number (`self`, `cpuinfo`, ...) are
    /// skipped. Failing to read the root itself is an error.
    pub fn list_pids(&self, capacity: usize) -> Result<ProcList, CollectError> {
        let entries = self.fs.read_dir(self.config.proc_path())?;

        let mut list = Vec::with_capacity(capacity.max(entries.len()));
        for entry in entries {
            // Check if entry is a PID directory (numeric name)
            if let Some(name) = entry.file_name().and_then(|n| n.to_str())
                && name.starts_with(|c: char| c.is_ascii_digit())
            {
                match name.parse::<i32>() {
                    Ok(pid) => list.push(pid),
                    Err(_) => trace!("Skipping non-pid entry {:?}", name),
                }
            }
        }

        Ok(ProcList { list })
    }

    fn read_pid_file(&self, pid: i32, name: &str) -> Result<String, CollectError> {
        let path = self.config.pid_file(pid, name);
        self.fs
            .read_to_string(&path)
            .map_err(|e| process_read_error(pid, e))
    }

    fn read_stat(&self, pid: i32) -> Result<ProcStat, CollectError> {
        let content = self.read_pid_file(pid, "stat")?;
        self.parser
            .proc_stat(&content)
            .map_err(|e| CollectError::Parse(format!("process {}: {}", pid, e.message)))
    }

    /// Name, run state and scheduling info from `/proc/[pid]/stat`.
    pub fn proc_state(&self, pid: i32) -> Result<ProcState, CollectError> {
        let stat = self.read_stat(pid)?;

        Ok(ProcState {
            name: stat.comm,
            state: RunState::from_code(stat.state),
            ppid: stat.ppid,
            tty: stat.tty_nr,
            priority: stat.priority,
            nice: stat.nice,
            processor: stat.processor,
        })
    }

    /// Memory sizes from `/proc/[pid]/statm` and fault counters from
    /// `/proc/[pid]/stat`.
    pub fn proc_mem(&self, pid: i32) -> Result<ProcMem, CollectError> {
        let statm = self.parser.proc_statm(&self.read_pid_file(pid, "statm")?);
        let stat = self.read_stat(pid)?;

        Ok(ProcMem {
            size: self.config.pages_to_bytes(statm.size),
            resident: self.config.pages_to_bytes(statm.resident),
            share: self.config.pages_to_bytes(statm.share),
            minor_faults: stat.minflt,
            major_faults: stat.majflt,
            page_faults: stat.minflt.wrapping_add(stat.majflt),
        })
    }

    /// CPU times in milliseconds from `/proc/[pid]/stat`.
    pub fn proc_time(&self, pid: i32) -> Result<ProcTime, CollectError> {
        let stat = self.read_stat(pid)?;

        let user = self.config.ticks_to_millis(stat.utime);
        let sys = self.config.ticks_to_millis(stat.stime);

        Ok(ProcTime {
            start_time: self.config.start_time_millis(stat.starttime),
            user,
            sys,
            total: user.wrapping_add(sys),
        })
    }

    /// Command-line arguments from `/proc/[pid]/cmdline`.
    pub fn proc_args(&self, pid: i32) -> Result<ProcArgs, CollectError> {
        let path = self.config.pid_file(pid, "cmdline");
        let content = self
            .fs
            .read(&path)
            .map_err(|e| process_read_error(pid, e))?;

        Ok(ProcArgs {
            list: self.parser.cmdline(&content),
        })
    }

    /// Resolves the `exe`, `cwd` and `root` links of a process.
    ///
    /// All three are required: if any link cannot be read (exited process,
    /// kernel thread, missing permission) no record is returned.
    pub fn proc_exe(&self, pid: i32) -> Result<ProcExe, CollectError> {
        let name = self.resolve_link(pid, "exe")?;
        let cwd = self.resolve_link(pid, "cwd")?;
        let root = self.resolve_link(pid, "root")?;

        Ok(ProcExe { name, cwd, root })
    }

    fn resolve_link(&self, pid: i32, field: &'static str) -> Result<String, CollectError> {
        let path = self.config.pid_file(pid, field);
        match self.fs.read_link(&path) {
            Ok(target) => Ok(target.to_string_lossy().into_owned()),
            Err(source) => {
                if !self.is_alive(pid) {
                    return Err(CollectError::ProcessGone(pid));
                }
                Err(CollectError::Incomplete { pid, field, source })
            }
        }
    }

    /// Returns whether `/proc/[pid]` currently exists.
    pub fn is_alive(&self, pid: i32) -> bool {
        self.fs
            .exists(&self.config.proc_path().join(pid.to_string()))
    }
}
