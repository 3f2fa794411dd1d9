//! Host metrics collector for Linux.
//!
//! This module provides infrastructure for reading system and process
//! records from the Linux `/proc` filesystem and the `statvfs`/`sysinfo`
//! calls. Every source sits behind the `FileSystem` and `SysInfoSource`
//! traits, so tests run against fixtures instead of the live host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Collector                           │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  ProcessCollector   │   │     SystemCollector         │  │
//! │  │  - /proc/[pid]/*    │   │  - /proc/stat, meminfo      │  │
//! │  │                     │   │  - /proc/loadavg, net/dev   │  │
//! │  └──────────┬──────────┘   │  - mtab, statvfs, sysinfo   │  │
//! │             │              └──────────────┬──────────────┘  │
//! │             └──────────┬──────────────────┘                 │
//! │                        │          ProcParser (text layout)  │
//! │        ┌───────────────▼──────────────┐                     │
//! │        │  FileSystem + SysInfoSource  │ (traits)            │
//! │        └───────────────┬──────────────┘                     │
//! └────────────────────────┼────────────────────────────────────┘
//!                          │
//!          ┌───────────────┼───────────────┐
//!          │               │               │
//!   ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!   │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!   │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!   └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use procsnap::collector::{Collector, RealFs};
//! use procsnap::config::ProcConfig;
//!
//! let fs = RealFs::new();
//! let config = ProcConfig::default().discover(&fs);
//! let collector = Collector::new(fs, config);
//! let mem = collector.mem().unwrap();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use procsnap::collector::{Collector, MockFs};
//! use procsnap::config::ProcConfig;
//!
//! let fs = MockFs::typical_system();
//! let config = ProcConfig::new("/proc").discover(&fs);
//! let collector = Collector::new(fs, config);
//! assert_eq!(collector.cpu_list().unwrap().list.len(), 4);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use collector::Collector;
pub use mock::MockFs;
pub use procfs::{CollectError, LinuxParser, ProcParser, ProcessCollector, SystemCollector};
pub use traits::{FileSystem, RealFs, StatVfs, SysInfo, SysInfoSource};
