//! Collector configuration.
//!
//! `ProcConfig` carries the few host constants every parser needs: where the
//! proc root and mount table live, the kernel clock-tick rate, the page size
//! and the boot time. Build it once at startup, call [`ProcConfig::discover`]
//! to read the boot time, then share it read-only.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::collector::procfs::parser::parse_boot_time;
use crate::collector::traits::FileSystem;

/// Clock ticks per second (USER_HZ). Standard value for Linux.
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

/// log2 of the page size: 4096-byte pages.
pub const DEFAULT_PAGE_SHIFT: u32 = 12;

pub const DEFAULT_PROC_PATH: &str = "/proc";
pub const DEFAULT_MTAB_PATH: &str = "/etc/mtab";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcConfig {
    proc_path: PathBuf,
    mtab_path: PathBuf,
    clock_ticks: u64,
    page_shift: u32,
    /// Boot time in seconds since the Unix epoch, 0 until discovered.
    boot_time: u64,
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_PATH)
    }
}

impl ProcConfig {
    /// Creates a configuration rooted at `proc_path` with Linux defaults.
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            mtab_path: PathBuf::from(DEFAULT_MTAB_PATH),
            clock_ticks: DEFAULT_CLOCK_TICKS,
            page_shift: DEFAULT_PAGE_SHIFT,
            boot_time: 0,
        }
    }

    pub fn with_mtab_path(mut self, mtab_path: impl Into<PathBuf>) -> Self {
        self.mtab_path = mtab_path.into();
        self
    }

    /// Overrides the clock-tick rate. Zero is ignored.
    pub fn with_clock_ticks(mut self, clock_ticks: u64) -> Self {
        if clock_ticks == 0 {
            warn!("Ignoring clock tick rate of 0, keeping {}", self.clock_ticks);
        } else {
            self.clock_ticks = clock_ticks;
        }
        self
    }

    pub fn with_page_shift(mut self, page_shift: u32) -> Self {
        self.page_shift = page_shift;
        self
    }

    pub fn with_boot_time(mut self, boot_time: u64) -> Self {
        self.boot_time = boot_time;
        self
    }

    /// Reads the boot time from `<proc>/stat` (`btime` line).
    ///
    /// A missing source or a missing `btime` line leaves the boot time at
    /// its current value; process start times are then relative to it.
    pub fn discover(mut self, fs: &impl FileSystem) -> Self {
        let path = self.proc_file("stat");
        match fs.read_to_string(&path) {
            Ok(content) => match parse_boot_time(&content) {
                Some(btime) => {
                    debug!("Discovered boot time {} from {}", btime, path.display());
                    self.boot_time = btime;
                }
                None => warn!("No btime line in {}", path.display()),
            },
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
        self
    }

    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }

    pub fn mtab_path(&self) -> &Path {
        &self.mtab_path
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn page_shift(&self) -> u32 {
        self.page_shift
    }

    pub fn boot_time(&self) -> u64 {
        self.boot_time
    }

    /// Path of a system-wide file under the proc root.
    pub fn proc_file(&self, name: &str) -> PathBuf {
        self.proc_path.join(name)
    }

    /// Path of a per-process file: `<proc>/<pid>/<name>`.
    pub fn pid_file(&self, pid: i32, name: &str) -> PathBuf {
        self.proc_path.join(pid.to_string()).join(name)
    }

    /// Converts clock ticks to milliseconds.
    ///
    /// Uses the integer factor `1000 / clock_ticks`, so rates that do not
    /// divide 1000 lose precision.
    pub fn ticks_to_millis(&self, ticks: u64) -> u64 {
        ticks.wrapping_mul(1000 / self.clock_ticks)
    }

    /// Converts a process start time (ticks since boot) to milliseconds
    /// since the Unix epoch.
    pub fn start_time_millis(&self, start_ticks: u64) -> u64 {
        (start_ticks / self.clock_ticks + self.boot_time).wrapping_mul(1000)
    }

    /// Converts a page count to bytes.
    pub fn pages_to_bytes(&self, pages: u64) -> u64 {
        pages.wrapping_shl(self.page_shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_defaults() {
        let config = ProcConfig::default();
        assert_eq!(config.proc_path(), Path::new("/proc"));
        assert_eq!(config.mtab_path(), Path::new("/etc/mtab"));
        assert_eq!(config.clock_ticks(), 100);
        assert_eq!(config.page_shift(), 12);
        assert_eq!(config.boot_time(), 0);
    }

    #[test]
    fn test_paths() {
        let config = ProcConfig::new("/host/proc");
        assert_eq!(config.proc_file("meminfo"), Path::new("/host/proc/meminfo"));
        assert_eq!(config.pid_file(42, "stat"), Path::new("/host/proc/42/stat"));
    }

    #[test]
    fn test_unit_conversions() {
        let config = ProcConfig::default().with_boot_time(1_700_000_000);

        assert_eq!(config.ticks_to_millis(150), 1500);
        assert_eq!(config.pages_to_bytes(3), 12288);
        // 12345 ticks = 123 whole seconds after boot
        assert_eq!(config.start_time_millis(12345), 1_700_000_123_000);
    }

    #[test]
    fn test_clock_ticks_override() {
        let config = ProcConfig::default().with_clock_ticks(250);
        assert_eq!(config.ticks_to_millis(10), 40);

        let unchanged = ProcConfig::default().with_clock_ticks(0);
        assert_eq!(unchanged.clock_ticks(), 100);
    }

    #[test]
    fn test_discover_reads_btime() {
        let fs = MockFs::typical_system();
        let config = ProcConfig::new("/proc").discover(&fs);
        assert_eq!(config.boot_time(), 1700000000);
    }

    #[test]
    fn test_discover_without_stat_keeps_boot_time() {
        let fs = MockFs::new();
        let config = ProcConfig::new("/proc").with_boot_time(7).discover(&fs);
        assert_eq!(config.boot_time(), 7);
    }
}
