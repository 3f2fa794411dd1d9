//! System collector for gathering global system metrics from `/proc/`.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::collector::procfs::parser::{LinuxParser, ProcParser};
use crate::collector::procfs::process::CollectError;
use crate::collector::traits::{FileSystem, SysInfoSource};
use crate::config::ProcConfig;
use crate::model::{
    Cpu, FileSystem as MountEntry, FileSystemUsage, LoadAverage, Mem, NetInterface, Swap, Uptime,
};

/// Collects system-wide metrics from `/proc/`.
pub struct SystemCollector<F: FileSystem> {
    fs: F,
    config: Arc<ProcConfig>,
    parser: Arc<dyn ProcParser>,
}

impl<F: FileSystem + Clone> Clone for SystemCollector<F> {
    fn clone(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            config: Arc::clone(&self.config),
            parser: Arc::clone(&self.parser),
        }
    }
}

impl<F: FileSystem> SystemCollector<F> {
    /// Creates a new system collector using the Linux `/proc` layout.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `config` - Proc root and mount table location
    pub fn new(fs: F, config: Arc<ProcConfig>) -> Self {
        Self::with_parser(fs, config, Arc::new(LinuxParser))
    }

    pub fn with_parser(fs: F, config: Arc<ProcConfig>, parser: Arc<dyn ProcParser>) -> Self {
        Self { fs, config, parser }
    }

    fn read_proc(&self, name: &str) -> Result<String, CollectError> {
        let path = self.config.proc_file(name);
        Ok(self.fs.read_to_string(&path)?)
    }

    /// Collects aggregate CPU counters from `/proc/stat`.
    pub fn collect_cpu(&self) -> Result<Cpu, CollectError> {
        let content = self.read_proc("stat")?;
        self.parser
            .cpu(&content)
            .ok_or_else(|| CollectError::Parse("no aggregate cpu line in stat".to_string()))
    }

    /// Collects per-core CPU counters from `/proc/stat`.
    pub fn collect_cpu_list(&self, capacity: usize) -> Result<Vec<Cpu>, CollectError> {
        let content = self.read_proc("stat")?;
        Ok(self.parser.cpu_list(&content, capacity))
    }

    /// Collects load average from `/proc/loadavg`.
    pub fn collect_loadavg(&self) -> Result<LoadAverage, CollectError> {
        let content = self.read_proc("loadavg")?;
        Ok(self.parser.loadavg(&content))
    }

    /// Collects memory information from `/proc/meminfo`.
    pub fn collect_meminfo(&self) -> Result<Mem, CollectError> {
        let content = self.read_proc("meminfo")?;
        Ok(self.parser.meminfo(&content).to_mem())
    }

    /// Collects mount-table entries.
    pub fn collect_file_systems(&self, capacity: usize) -> Result<Vec<MountEntry>, CollectError> {
        let content = self.fs.read_to_string(self.config.mtab_path())?;
        Ok(self.parser.mounts(&content, capacity))
    }

    /// Collects space and inode usage of the filesystem mounted at `path`.
    pub fn collect_file_system_usage(&self, path: &Path) -> Result<FileSystemUsage, CollectError> {
        let st = self.fs.statvfs(path)?;

        let total = st.blocks.wrapping_mul(st.fragment_size);
        let free = st.blocks_free.wrapping_mul(st.fragment_size);

        Ok(FileSystemUsage {
            total,
            used: total.wrapping_sub(free),
            free,
            avail: st.blocks_avail.wrapping_mul(st.fragment_size),
            files: st.files,
            free_files: st.files_free,
        })
    }

    /// Collects network interface statistics from `/proc/net/dev`.
    pub fn collect_net_dev(&self, capacity: usize) -> Result<Vec<NetInterface>, CollectError> {
        let content = self.read_proc("net/dev")?;
        Ok(self.parser.net_dev(&content, capacity))
    }

    /// Collects the counters of one interface from `/proc/net/dev`.
    pub fn collect_net_interface(&self, name: &str) -> Result<NetInterface, CollectError> {
        let content = self.read_proc("net/dev")?;
        self.parser.net_interface(&content, name).ok_or_else(|| {
            CollectError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("network interface {} not found", name),
            ))
        })
    }
}

impl<F: FileSystem + SysInfoSource> SystemCollector<F> {
    /// Collects uptime from `sysinfo(2)`.
    pub fn collect_uptime(&self) -> Result<Uptime, CollectError> {
        let info = self.fs.sysinfo()?;
        Ok(Uptime {
            length: info.uptime as f64,
        })
    }

    /// Collects swap usage from `sysinfo(2)`.
    pub fn collect_swap(&self) -> Result<Swap, CollectError> {
        let info = self.fs.sysinfo()?;

        let total = info.total_swap.wrapping_mul(info.mem_unit);
        let free = info.free_swap.wrapping_mul(info.mem_unit);

        Ok(Swap {
            total,
            used: total.wrapping_sub(free),
            free,
        })
    }
}
