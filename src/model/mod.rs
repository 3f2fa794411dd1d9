//! Typed snapshot records.
//!
//! - [`system`]: host-wide records (CPU, memory, swap, filesystems, network)
//! - [`process`]: per-process records from `/proc/[pid]/`
//!
//! Records are owned values. Nothing here touches the filesystem; the
//! [`Collector`](crate::collector::Collector) populates them.

mod process;
mod system;

pub use process::{ProcArgs, ProcExe, ProcList, ProcMem, ProcState, ProcTime, RunState};
pub use system::{
    Cpu, CpuList, FileSystem, FileSystemList, FileSystemUsage, LoadAverage, Mem, NetInterface,
    NetInterfaceList, Swap, Uptime,
};
