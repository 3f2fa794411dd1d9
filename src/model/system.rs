//! System-wide snapshot records.
//!
//! Every record is a plain value describing kernel state at the instant it
//! was read. Units are normalized at parse time: CPU counters stay in clock
//! ticks, memory and filesystem sizes are in bytes.

use serde::{Deserialize, Serialize};

/// Aggregate or per-core CPU time counters.
///
/// Source: `/proc/stat` (`cpu` / `cpuN` lines), columns 1-8.
///
/// All fields are cumulative clock ticks since boot.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Cpu {
    /// Time spent in user mode.
    pub user: u64,
    /// Time spent in user mode with low priority.
    pub nice: u64,
    /// Time spent in kernel mode.
    pub sys: u64,
    pub idle: u64,
    /// Time waiting for I/O to complete.
    pub wait: u64,
    pub irq: u64,
    pub soft_irq: u64,
    /// Time stolen by the hypervisor.
    pub stolen: u64,
}

impl Cpu {
    /// Sum of all counters.
    ///
    /// Wrapping, so the total of a wrapped delta stays consistent with the
    /// difference of the two totals.
    pub fn total(&self) -> u64 {
        [
            self.nice,
            self.sys,
            self.idle,
            self.wait,
            self.irq,
            self.soft_irq,
            self.stolen,
        ]
        .into_iter()
        .fold(self.user, u64::wrapping_add)
    }
}

/// Per-core CPU counters, in `/proc/stat` order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CpuList {
    pub list: Vec<Cpu>,
}

/// System load averages.
///
/// Source: `/proc/loadavg` fields 1-3.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Seconds since boot.
///
/// Source: `sysinfo(2)`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Uptime {
    pub length: f64,
}

/// Physical memory usage in bytes.
///
/// Source: `/proc/meminfo` (`MemTotal`, `MemFree`, `Buffers`, `Cached`).
///
/// `actual_free` and `actual_used` treat buffer and page cache memory as
/// reclaimable: it is added to free and removed from used.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Mem {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub actual_free: u64,
    pub actual_used: u64,
}

/// Swap usage in bytes.
///
/// Source: `sysinfo(2)` (`totalswap`, `freeswap`).
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Swap {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// One mount-table entry.
///
/// Source: mount table (`/etc/mtab`), fields 1-4.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct FileSystem {
    /// Mount point.
    pub dir_name: String,
    /// Mounted device or pseudo source (`/dev/sda1`, `tmpfs`, ...).
    pub dev_name: String,
    /// Generic type classification. Not derived on Linux, left empty.
    pub type_name: String,
    /// Kernel filesystem type (`ext4`, `proc`, ...).
    pub sys_type_name: String,
    /// Mount options as written in the table.
    pub options: String,
    pub flags: u32,
}

/// Mount-table entries, in table order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct FileSystemList {
    pub list: Vec<FileSystem>,
}

/// Space and inode usage of one mounted filesystem.
///
/// Source: `statvfs(3)`. Sizes are bytes.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct FileSystemUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Space available to unprivileged users.
    pub avail: u64,
    /// Total inodes.
    pub files: u64,
    pub free_files: u64,
}

/// Counters of one network interface.
///
/// Source: `/proc/net/dev`, 8 receive columns then 8 transmit columns.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct NetInterface {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub rx_fifo: u64,
    pub rx_frame: u64,
    pub rx_compressed: u64,
    pub rx_multicast: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
    pub tx_fifo: u64,
    pub tx_colls: u64,
    pub tx_carrier: u64,
    pub tx_compressed: u64,
}

/// Interfaces listed in `/proc/net/dev`, in file order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct NetInterfaceList {
    pub list: Vec<NetInterface>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_total() {
        let cpu = Cpu {
            user: 100,
            nice: 5,
            sys: 50,
            idle: 800,
            wait: 20,
            irq: 1,
            soft_irq: 2,
            stolen: 0,
        };
        assert_eq!(cpu.total(), 978);
        assert_eq!(Cpu::default().total(), 0);
    }
}
