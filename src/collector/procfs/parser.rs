//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.
//!
//! Individual malformed fields never fail a record: they read as zero and are
//! reported through [`FieldReader::finish`]. Only structurally unusable
//! content (a stat line without a `(comm)` field) is an error.

use crate::model::{Cpu, FileSystem, LoadAverage, Mem, NetInterface};
use crate::util::fields::{FieldReader, chop, fields, parse_u64, strip_parens};

pub use crate::util::fields::ParseError;

/// Kernel text layout of the system and process sources.
///
/// Every method has a default implementation for the Linux 2.6+ layout.
/// An implementation for a different layout overrides only what differs.
pub trait ProcParser: Send + Sync {
    /// Aggregate CPU counters from `/proc/stat` content.
    fn cpu(&self, stat: &str) -> Option<Cpu> {
        parse_cpu(stat)
    }

    /// Per-core CPU counters from `/proc/stat` content.
    fn cpu_list(&self, stat: &str, capacity: usize) -> Vec<Cpu> {
        parse_cpu_list(stat, capacity)
    }

    fn loadavg(&self, content: &str) -> LoadAverage {
        parse_loadavg(content)
    }

    fn meminfo(&self, content: &str) -> MemInfo {
        parse_meminfo(content)
    }

    fn mounts(&self, content: &str, capacity: usize) -> Vec<FileSystem> {
        parse_mounts(content, capacity)
    }

    fn net_dev(&self, content: &str, capacity: usize) -> Vec<NetInterface> {
        parse_net_dev(content, capacity)
    }

    fn net_interface(&self, content: &str, name: &str) -> Option<NetInterface> {
        find_net_interface(content, name)
    }

    fn proc_stat(&self, content: &str) -> Result<ProcStat, ParseError> {
        parse_proc_stat(content)
    }

    fn proc_statm(&self, content: &str) -> ProcStatm {
        parse_proc_statm(content)
    }

    fn cmdline(&self, content: &[u8]) -> Vec<String> {
        parse_cmdline(content)
    }
}

/// `/proc` layout of Linux 2.6 and later.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxParser;

impl ProcParser for LinuxParser {}

// ============ /proc/stat ============

/// Parses the counters of one `cpu`/`cpuN` line.
///
/// Columns 1-8 are user, nice, system, idle, iowait, irq, softirq, steal.
/// Guest columns are already included in user/nice and are ignored.
pub fn parse_cpu_line(line: &str) -> Cpu {
    let mut reader = FieldReader::from_line(line);
    let cpu = Cpu {
        user: reader.u64(1, "user"),
        nice: reader.u64(2, "nice"),
        sys: reader.u64(3, "sys"),
        idle: reader.u64(4, "idle"),
        wait: reader.u64(5, "wait"),
        irq: reader.u64(6, "irq"),
        soft_irq: reader.u64(7, "soft_irq"),
        stolen: reader.u64(8, "stolen"),
    };
    reader.finish("cpu");
    cpu
}

/// Returns the aggregate `cpu ` line of `/proc/stat`, if present.
pub fn parse_cpu(content: &str) -> Option<Cpu> {
    content
        .lines()
        .find(|line| line.starts_with("cpu "))
        .map(parse_cpu_line)
}

/// Returns all per-core `cpuN` lines of `/proc/stat`, in order.
pub fn parse_cpu_list(content: &str, capacity: usize) -> Vec<Cpu> {
    let mut list = Vec::with_capacity(capacity);
    for line in content.lines() {
        if is_per_core_line(line) {
            list.push(parse_cpu_line(line));
        }
    }
    list
}

fn is_per_core_line(line: &str) -> bool {
    line.strip_prefix("cpu")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}

/// Extracts the boot time (seconds since epoch) from the `btime` line.
pub fn parse_boot_time(content: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("btime"), Some(value)) => parse_u64(value)
                .map_err(|e| tracing::debug!("Ignoring btime line: {}", e))
                .ok(),
            _ => None,
        }
    })
}

// ============ /proc/loadavg ============

/// Parses `/proc/loadavg` content.
///
/// Format: `0.15 0.10 0.05 1/150 1234`. Only the three averages are kept.
pub fn parse_loadavg(content: &str) -> LoadAverage {
    let mut reader = FieldReader::from_line(content);
    let load = LoadAverage {
        one: reader.f64(0, "one"),
        five: reader.f64(1, "five"),
        fifteen: reader.f64(2, "fifteen"),
    };
    reader.finish("loadavg");
    load
}

// ============ /proc/meminfo ============

/// The `/proc/meminfo` values needed for [`Mem`], in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub buffers: u64,
    pub cached: u64,
}

impl MemInfo {
    /// Derives used and cache-adjusted figures.
    ///
    /// Subtractions wrap like the underlying unsigned counters would; with
    /// sane kernel values they never do.
    pub fn to_mem(self) -> Mem {
        let used = self.mem_total.wrapping_sub(self.mem_free);
        let kern = self.buffers.wrapping_add(self.cached);
        Mem {
            total: self.mem_total,
            used,
            free: self.mem_free,
            actual_free: self.mem_free.wrapping_add(kern),
            actual_used: used.wrapping_sub(kern),
        }
    }
}

/// Parses `/proc/meminfo` content.
///
/// Format: `Key:   value kB`, one pair per line. Values are converted from
/// kilobytes to bytes. Keys are matched exactly, so `SwapCached` does not
/// shadow `Cached`. A malformed value leaves its field at zero.
pub fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();
    let mut defaulted = Vec::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let slot = match key {
            "MemTotal" => &mut info.mem_total,
            "MemFree" => &mut info.mem_free,
            "Buffers" => &mut info.buffers,
            "Cached" => &mut info.cached,
            _ => continue,
        };
        let mut reader = FieldReader::from_line(value);
        *slot = reader.u64(0, "value").wrapping_mul(1024);
        if !reader.defaulted().is_empty() {
            defaulted.push(key);
        }
    }

    if !defaulted.is_empty() {
        tracing::debug!(
            record = "meminfo",
            fields = ?defaulted,
            "malformed fields defaulted to zero"
        );
    }

    info
}

// ============ Mount table ============

/// Parses a mount table (`/etc/mtab`, `/proc/mounts`).
///
/// Each line is `device dir type options dump pass`; only the first four
/// columns are used. Lines with fewer than four columns are skipped.
pub fn parse_mounts(content: &str, capacity: usize) -> Vec<FileSystem> {
    let mut list = Vec::with_capacity(capacity);

    for line in content.lines() {
        let parts = fields(line);
        if parts.len() < 4 {
            if !parts.is_empty() {
                tracing::debug!("Skipping short mount table line: {:?}", line);
            }
            continue;
        }

        list.push(FileSystem {
            dev_name: parts[0].to_string(),
            dir_name: parts[1].to_string(),
            sys_type_name: parts[2].to_string(),
            options: parts[3].to_string(),
            ..FileSystem::default()
        });
    }

    list
}

// ============ Network Device Stats Parser ============

/// Parses one `iface: <16 counters>` line of `/proc/net/dev`.
///
/// Returns `None` for lines without a colon (the two header lines).
pub fn parse_net_dev_line(line: &str) -> Option<NetInterface> {
    let (name, counters) = line.trim().split_once(':')?;

    let mut reader = FieldReader::from_line(counters);
    let iface = NetInterface {
        name: name.trim().to_string(),
        rx_bytes: reader.u64(0, "rx_bytes"),
        rx_packets: reader.u64(1, "rx_packets"),
        rx_errs: reader.u64(2, "rx_errs"),
        rx_drop: reader.u64(3, "rx_drop"),
        rx_fifo: reader.u64(4, "rx_fifo"),
        rx_frame: reader.u64(5, "rx_frame"),
        rx_compressed: reader.u64(6, "rx_compressed"),
        rx_multicast: reader.u64(7, "rx_multicast"),
        tx_bytes: reader.u64(8, "tx_bytes"),
        tx_packets: reader.u64(9, "tx_packets"),
        tx_errs: reader.u64(10, "tx_errs"),
        tx_drop: reader.u64(11, "tx_drop"),
        tx_fifo: reader.u64(12, "tx_fifo"),
        tx_colls: reader.u64(13, "tx_colls"),
        tx_carrier: reader.u64(14, "tx_carrier"),
        tx_compressed: reader.u64(15, "tx_compressed"),
    };
    reader.finish("net/dev");
    Some(iface)
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str, capacity: usize) -> Vec<NetInterface> {
    let mut list = Vec::with_capacity(capacity);
    list.extend(content.lines().filter_map(parse_net_dev_line));
    list
}

/// Finds the line of interface `name` in `/proc/net/dev` content.
pub fn find_net_interface(content: &str, name: &str) -> Option<NetInterface> {
    content
        .lines()
        .find(|line| {
            line.trim()
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .and_then(parse_net_dev_line)
}

// ============ /proc/[pid]/stat ============

/// Fields of `/proc/[pid]/stat` used by the process records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: i32,
    pub comm: String,
    pub state: char,
    pub ppid: i32,
    pub tty_nr: i32,
    pub minflt: u64,
    pub majflt: u64,
    pub utime: u64,
    pub stime: u64,
    pub priority: i32,
    pub nice: i32,
    pub starttime: u64,
    pub processor: i32,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
///
/// The comm is everything between the first `(` and the last `)`. Field
/// positions below are 1-based over the whole line with comm as field 2:
/// 3 state, 4 ppid, 7 tty, 11 minor faults, 13 major faults, 14 utime,
/// 15 stime, 18 priority, 19 nice, 22 starttime, 39 processor.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    // Find the comm field boundaries (enclosed in parentheses)
    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let comm = strip_parens(&content[open_paren..=close_paren]).to_string();

    // `rest[0]` is field 3, so field N lives at `rest[N - 3]`.
    let mut rest = FieldReader::from_line(&content[close_paren + 1..]);
    let state = rest
        .token(0)
        .and_then(|s| s.chars().next())
        .unwrap_or('?');

    let mut head = FieldReader::from_line(&content[..open_paren]);
    let pid = head.i32(0, "pid");

    let stat = ProcStat {
        pid,
        comm,
        state,
        ppid: rest.i32(1, "ppid"),
        tty_nr: rest.i32(4, "tty_nr"),
        minflt: rest.u64(8, "minflt"),
        majflt: rest.u64(10, "majflt"),
        utime: rest.u64(11, "utime"),
        stime: rest.u64(12, "stime"),
        priority: rest.i32(15, "priority"),
        nice: rest.i32(16, "nice"),
        starttime: rest.u64(19, "starttime"),
        processor: rest.i32(36, "processor"),
    };
    head.finish("stat");
    rest.finish("stat");

    Ok(stat)
}

// ============ /proc/[pid]/statm ============

/// Page counts from `/proc/[pid]/statm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStatm {
    pub size: u64,
    pub resident: u64,
    pub share: u64,
}

/// Parses `/proc/[pid]/statm` content.
///
/// Format: `size resident shared text lib data dt`, all in pages.
pub fn parse_proc_statm(content: &str) -> ProcStatm {
    let mut reader = FieldReader::from_line(content);
    let statm = ProcStatm {
        size: reader.u64(0, "size"),
        resident: reader.u64(1, "resident"),
        share: reader.u64(2, "share"),
    };
    reader.finish("statm");
    statm
}

// ============ /proc/[pid]/cmdline ============

/// Splits `/proc/[pid]/cmdline` content into arguments.
///
/// Arguments are NUL-terminated. Empty arguments are kept, order is
/// preserved. A trailing unterminated argument (a process that rewrote its
/// argv) is kept if non-empty.
pub fn parse_cmdline(content: &[u8]) -> Vec<String> {
    content
        .split_inclusive(|&b| b == 0)
        .filter(|arg| arg.ends_with(&[0]) || !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(chop(arg)).into_owned())
        .collect()
}
