//! Main collector that combines process and system collectors.
//!
//! The `Collector` struct provides a unified interface for reading every
//! snapshot record, plus the entry point for periodic CPU sampling.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::collector::procfs::{
    CollectError, LinuxParser, ProcParser, ProcessCollector, SystemCollector,
};
use crate::collector::traits::{FileSystem, SysInfoSource};
use crate::config::ProcConfig;
use crate::model::{
    Cpu, CpuList, FileSystemList, FileSystemUsage, LoadAverage, Mem, NetInterface,
    NetInterfaceList, ProcArgs, ProcExe, ProcList, ProcMem, ProcState, ProcTime, Swap, Uptime,
};
use crate::sampler::{CpuStream, Sampler, SamplerConfig, SamplerHandle};

/// Capacity hints for lists that have never been filled.
const DEFAULT_CPU_CAPACITY: usize = 4;
const DEFAULT_NET_CAPACITY: usize = 4;
const DEFAULT_FS_CAPACITY: usize = 10;

/// Main collector that gathers all snapshot records.
///
/// Holds no mutable state: every call reads its sources afresh. Build one
/// per proc root and share it.
pub struct Collector<F: FileSystem + SysInfoSource + Clone> {
    config: Arc<ProcConfig>,
    process_collector: ProcessCollector<F>,
    system_collector: SystemCollector<F>,
}

impl<F: FileSystem + SysInfoSource + Clone> Collector<F> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `config` - Proc root and host constants. Call
    ///   [`ProcConfig::discover`] first if process start times matter.
    pub fn new(fs: F, config: ProcConfig) -> Self {
        Self::with_parser(fs, config, Arc::new(LinuxParser))
    }

    /// Creates a collector for a non-default `/proc` text layout.
    pub fn with_parser(fs: F, config: ProcConfig, parser: Arc<dyn ProcParser>) -> Self {
        debug!(
            "Collector rooted at {} (mtab {}, {} ticks/s, boot time {})",
            config.proc_path().display(),
            config.mtab_path().display(),
            config.clock_ticks(),
            config.boot_time()
        );

        let config = Arc::new(config);
        Self {
            process_collector: ProcessCollector::with_parser(
                fs.clone(),
                Arc::clone(&config),
                Arc::clone(&parser),
            ),
            system_collector: SystemCollector::with_parser(fs, Arc::clone(&config), parser),
            config,
        }
    }

    pub fn config(&self) -> &ProcConfig {
        &self.config
    }

    pub fn cpu(&self) -> Result<Cpu, CollectError> {
        self.system_collector.collect_cpu()
    }

    pub fn cpu_list(&self) -> Result<CpuList, CollectError> {
        let mut list = CpuList::default();
        list.refresh(self)?;
        Ok(list)
    }

    pub fn load_average(&self) -> Result<LoadAverage, CollectError> {
        self.system_collector.collect_loadavg()
    }

    pub fn uptime(&self) -> Result<Uptime, CollectError> {
        self.system_collector.collect_uptime()
    }

    pub fn mem(&self) -> Result<Mem, CollectError> {
        self.system_collector.collect_meminfo()
    }

    pub fn swap(&self) -> Result<Swap, CollectError> {
        self.system_collector.collect_swap()
    }

    pub fn file_systems(&self) -> Result<FileSystemList, CollectError> {
        let mut list = FileSystemList::default();
        list.refresh(self)?;
        Ok(list)
    }

    pub fn file_system_usage(&self, path: impl AsRef<Path>) -> Result<FileSystemUsage, CollectError> {
        self.system_collector.collect_file_system_usage(path.as_ref())
    }

    pub fn net_interfaces(&self) -> Result<NetInterfaceList, CollectError> {
        let mut list = NetInterfaceList::default();
        list.refresh(self)?;
        Ok(list)
    }

    pub fn net_interface(&self, name: &str) -> Result<NetInterface, CollectError> {
        self.system_collector.collect_net_interface(name)
    }

    pub fn proc_list(&self) -> Result<ProcList, CollectError> {
        let mut list = ProcList::default();
        list.refresh(self)?;
        Ok(list)
    }

    pub fn proc_state(&self, pid: i32) -> Result<ProcState, CollectError> {
        self.process_collector.proc_state(pid)
    }

    pub fn proc_mem(&self, pid: i32) -> Result<ProcMem, CollectError> {
        self.process_collector.proc_mem(pid)
    }

    pub fn proc_time(&self, pid: i32) -> Result<ProcTime, CollectError> {
        self.process_collector.proc_time(pid)
    }

    pub fn proc_args(&self, pid: i32) -> Result<ProcArgs, CollectError> {
        self.process_collector.proc_args(pid)
    }

    pub fn proc_exe(&self, pid: i32) -> Result<ProcExe, CollectError> {
        self.process_collector.proc_exe(pid)
    }
}

impl<F: FileSystem + SysInfoSource + Clone + 'static> Collector<F> {
    /// Starts sampling aggregate CPU counters every `interval`.
    ///
    /// The stream yields the difference between consecutive readings. Each
    /// call starts an independent sampler with its own baseline.
    pub fn collect_cpu_stats(
        &self,
        interval: Duration,
    ) -> Result<(CpuStream, SamplerHandle), CollectError> {
        self.collect_cpu_stats_with(SamplerConfig::new(interval))
    }

    /// Like [`collect_cpu_stats`](Self::collect_cpu_stats) with an explicit
    /// backpressure policy.
    pub fn collect_cpu_stats_with(
        &self,
        config: SamplerConfig,
    ) -> Result<(CpuStream, SamplerHandle), CollectError> {
        Sampler::new(self.system_collector.clone(), config).start()
    }
}

impl CpuList {
    /// Re-reads per-core counters. The previous length is a capacity hint.
    pub fn refresh<F>(&mut self, collector: &Collector<F>) -> Result<(), CollectError>
    where
        F: FileSystem + SysInfoSource + Clone,
    {
        let capacity = self.list.len().max(DEFAULT_CPU_CAPACITY);
        self.list = collector.system_collector.collect_cpu_list(capacity)?;
        Ok(())
    }
}

impl FileSystemList {
    /// Re-reads the mount table. The previous length is a capacity hint.
    pub fn refresh<F>(&mut self, collector: &Collector<F>) -> Result<(), CollectError>
    where
        F: FileSystem + SysInfoSource + Clone,
    {
        let capacity = self.list.len().max(DEFAULT_FS_CAPACITY);
        self.list = collector.system_collector.collect_file_systems(capacity)?;
        Ok(())
    }
}

impl NetInterfaceList {
    /// Re-reads interface counters. The previous length is a capacity hint.
    pub fn refresh<F>(&mut self, collector: &Collector<F>) -> Result<(), CollectError>
    where
        F: FileSystem + SysInfoSource + Clone,
    {
        let capacity = self.list.len().max(DEFAULT_NET_CAPACITY);
        self.list = collector.system_collector.collect_net_dev(capacity)?;
        Ok(())
    }
}

impl ProcList {
    /// Re-enumerates processes. The previous length is a capacity hint.
    pub fn refresh<F>(&mut self, collector: &Collector<F>) -> Result<(), CollectError>
    where
        F: FileSystem + SysInfoSource + Clone,
    {
        *self = collector.process_collector.list_pids(self.list.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::rates::{Delta, cpu_busy_percent};

    fn collector(fs: MockFs) -> Collector<MockFs> {
        let config = ProcConfig::new("/proc").discover(&fs);
        Collector::new(fs, config)
    }

    #[test]
    fn test_collector_typical_system() {
        let collector = collector(MockFs::typical_system());

        assert_eq!(collector.config().boot_time(), 1_700_000_000);
        assert_eq!(collector.cpu().unwrap().total(), 94800);
        assert_eq!(collector.cpu_list().unwrap().list.len(), 4);
        assert!((collector.load_average().unwrap().one - 0.15).abs() < 0.01);
        assert_eq!(collector.uptime().unwrap().length, 12345.0);
        assert_eq!(collector.mem().unwrap().total, 16384000 * 1024);

        let swap = collector.swap().unwrap();
        assert_eq!(swap.total, 4_194_304_000);
        assert_eq!(swap.used, 0);
    }

    #[test]
    fn test_collector_file_systems() {
        let collector = collector(MockFs::typical_system());

        let list = collector.file_systems().unwrap();
        assert_eq!(list.list.len(), 3);

        let usage = collector.file_system_usage(&list.list[2].dir_name).unwrap();
        assert_eq!(usage.total, 50_000_000 * 4096);
        assert_eq!(usage.used, 10_000_000 * 4096);
        assert_eq!(usage.avail, 37_500_000 * 4096);

        // /proc has no counters in the mock
        assert!(collector.file_system_usage("/proc").is_err());
    }

    #[test]
    fn test_collector_processes() {
        let collector = collector(MockFs::typical_system());

        let mut pids = collector.proc_list().unwrap().list;
        pids.sort();
        assert_eq!(pids, vec![1, 1000, 1001]);

        assert_eq!(collector.proc_state(1000).unwrap().name, "bash");
        assert_eq!(collector.proc_mem(1000).unwrap().resident, 2000 * 4096);
        assert_eq!(collector.proc_args(1).unwrap().list, vec!["/sbin/init"]);
        assert_eq!(
            collector.proc_exe(1).unwrap().name,
            "/usr/lib/systemd/systemd"
        );

        // starttime 100000 ticks = 1000 s after the discovered boot time
        let time = collector.proc_time(1000).unwrap();
        assert_eq!(time.start_time, 1_700_001_000_000);
    }

    #[test]
    fn test_collector_vanished_process() {
        let collector = collector(MockFs::with_vanishing_process());

        assert!(collector.proc_list().unwrap().list.contains(&6000));
        assert!(matches!(
            collector.proc_state(6000),
            Err(CollectError::ProcessGone(6000))
        ));
        assert!(matches!(
            collector.proc_args(6000),
            Err(CollectError::ProcessGone(6000))
        ));
    }

    #[test]
    fn test_collector_net_interfaces_delta() {
        let mut fs = MockFs::typical_system();
        let before = collector(fs.clone()).net_interfaces().unwrap();

        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345778     9877    0    0    0     0          0         0 12345778     9877    0    0    0     0       0          0
  eth0: 987655321   654331    5   10    0     0          0       100 123457789   456799    2    5    0     0       0          0
",
        );
        let collector = collector(fs);
        let after = collector.net_interfaces().unwrap();

        let delta = after.delta(&before);
        assert_eq!(delta.list[0].name, "lo");
        assert_eq!(delta.list[0].rx_bytes, 100);
        assert_eq!(delta.list[1].rx_bytes, 1000);
        assert_eq!(delta.list[1].tx_packets, 10);
        assert_eq!(delta.list[1].rx_errs, 0);

        assert_eq!(collector.net_interface("eth0").unwrap().rx_packets, 654331);
    }

    #[test]
    fn test_refresh_reuses_list() {
        let collector = collector(MockFs::typical_system());

        let mut cpus = CpuList::default();
        cpus.refresh(&collector).unwrap();
        cpus.refresh(&collector).unwrap();
        assert_eq!(cpus.list.len(), 4);

        let mut pids = ProcList { list: vec![42; 16] };
        pids.refresh(&collector).unwrap();
        assert_eq!(pids.list.len(), 3);
        assert!(!pids.list.contains(&42));

        let mut mounts = FileSystemList::default();
        mounts.refresh(&collector).unwrap();
        assert_eq!(mounts.list.len(), 3);
    }

    #[test]
    fn test_refresh_failure_is_reported() {
        let collector = collector(MockFs::new());

        assert!(CpuList::default().refresh(&collector).is_err());
        assert!(NetInterfaceList::default().refresh(&collector).is_err());
        assert!(collector.proc_list().is_err());
        assert!(collector.swap().is_err());
    }

    #[test]
    fn test_collect_cpu_stats() {
        let collector = collector(MockFs::typical_system());

        let (stream, handle) = collector
            .collect_cpu_stats(Duration::from_millis(5))
            .unwrap();

        // The mock never changes, so every delta is empty
        let delta = stream.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delta, Cpu::default());
        assert_eq!(cpu_busy_percent(&delta), None);

        handle.stop();
    }

    #[test]
    fn test_collect_cpu_stats_zero_interval() {
        let collector = collector(MockFs::typical_system());

        let result = collector.collect_cpu_stats(Duration::ZERO);

        assert!(matches!(result, Err(CollectError::Config(_))));
    }

    #[test]
    fn test_cpu_delta_between_snapshots() {
        let before = collector(MockFs::typical_system()).cpu().unwrap();
        let after = collector(MockFs::high_cpu_load()).cpu().unwrap();

        let delta = after.delta(&before);
        assert_eq!(delta.user, 70000);
        assert_eq!(delta.total(), after.total().wrapping_sub(before.total()));
    }
}
