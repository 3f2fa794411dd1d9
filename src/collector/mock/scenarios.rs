//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` filesystem states
//! for testing various system conditions.

use super::filesystem::MockFs;
use crate::collector::traits::{StatVfs, SysInfo};

impl MockFs {
    /// Creates a typical 4-core system with a few processes.
    ///
    /// Includes: init (PID 1), a bash shell (PID 1000) and a kernel
    /// thread (PID 1001) that has no command line and no `exe` link.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        // System-wide files
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        // Network device statistics
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
",
        );

        // Mount table and the counters behind it
        fs.add_file(
            "/etc/mtab",
            "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
",
        );
        fs.add_statvfs(
            "/",
            StatVfs {
                fragment_size: 4096,
                blocks: 25_000_000,
                blocks_free: 10_000_000,
                blocks_avail: 9_000_000,
                files: 6_000_000,
                files_free: 5_000_000,
            },
        );
        fs.add_statvfs(
            "/home",
            StatVfs {
                fragment_size: 4096,
                blocks: 50_000_000,
                blocks_free: 40_000_000,
                blocks_avail: 37_500_000,
                files: 12_000_000,
                files_free: 11_900_000,
            },
        );

        fs.set_sysinfo(SysInfo {
            uptime: 12345,
            total_swap: 4_194_304_000,
            free_swap: 4_194_304_000,
            mem_unit: 1,
        });

        // PID 1 - init/systemd
        fs.add_process(
            1,
            "1 (systemd) S 0 1 1 0 -1 4194560 50000 1000000 100 500 1000 500 2000 1000 20 0 1 0 1 170000000 3000 18446744073709551615 0 0 0 0 0 0 0 0 1073745152 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "42500 3000 2000 300 0 2500 0",
            "/sbin/init\0",
        );
        fs.add_process_links(1, "/usr/lib/systemd/systemd", "/", "/");

        // PID 1000 - bash shell
        fs.add_process(
            1000,
            "1000 (bash) S 1 1000 1000 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0",
            "6250 2000 500 200 0 800 0",
            "/bin/bash\0--login\0",
        );
        fs.add_process_links(1000, "/usr/bin/bash", "/home/user", "/");

        // PID 1001 - kernel worker thread
        fs.add_process(
            1001,
            "1001 (kworker/0:1) I 2 0 0 0 -1 69238880 0 0 0 0 0 12 0 0 20 0 1 0 150 0 0 18446744073709551615 0 0 0 0 0 0 0 2147483647 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "0 0 0 0 0 0 0",
            "",
        );

        fs
    }

    /// Creates a system under high CPU load.
    pub fn high_cpu_load() -> Self {
        let mut fs = Self::typical_system();

        // Modify /proc/stat to show high CPU usage
        fs.add_file(
            "/proc/stat",
            "\
cpu  80000 1000 15000 5000 500 1000 500 0 0 0
cpu0 20000 250 3750 1250 125 250 125 0 0 0
cpu1 20000 250 3750 1250 125 250 125 0 0 0
cpu2 20000 250 3750 1250 125 250 125 0 0 0
cpu3 20000 250 3750 1250 125 250 125 0 0 0
ctxt 2000000
btime 1700000000
procs_running 8
procs_blocked 2
",
        );

        fs.add_file("/proc/loadavg", "4.50 3.20 2.10 8/200 5000\n");

        // Add CPU-intensive process
        fs.add_process(
            2500,
            "2500 (stress) R 1 2500 2500 0 -1 4194304 1000 0 0 0 500000 10000 0 0 20 0 4 0 200000 100000000 10000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "24414 10000 300 10 0 12000 0",
            "/usr/bin/stress\0--cpu\x004\0",
        );
        fs.add_process_links(2500, "/usr/bin/stress", "/root", "/");

        fs
    }

    /// Creates a system with memory pressure (low free memory, swap in use).
    pub fn memory_pressure() -> Self {
        let mut fs = Self::typical_system();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:          256000 kB
MemAvailable:     512000 kB
Buffers:           64000 kB
Cached:           256000 kB
SwapCached:       128000 kB
SwapTotal:       4096000 kB
SwapFree:        1024000 kB
",
        );
        fs.set_sysinfo(SysInfo {
            uptime: 12345,
            total_swap: 4096000,
            free_swap: 1024000,
            mem_unit: 1024,
        });

        // Add memory-hungry process
        fs.add_process(
            3000,
            "3000 (memhog) S 1 3000 3000 0 -1 4194304 5000000 0 10000 0 1000 500 0 0 20 0 1 0 300000 14000000000 3500000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "3417968 3000000 1000 50 0 3375000 0",
            "/usr/local/bin/memhog\0--size\x0014G\0",
        );

        fs
    }

    /// Creates a system with a zombie process.
    pub fn with_zombie_process() -> Self {
        let mut fs = Self::typical_system();

        // Zombies keep their stat but lose memory and links
        fs.add_process(
            4000,
            "4000 (defunct) Z 1000 4000 1000 0 -1 4194308 0 0 0 0 0 0 0 0 20 0 1 0 400000 0 0 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 -1 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "0 0 0 0 0 0 0",
            "",
        );

        fs
    }

    /// Creates a system with processes that have special characters in names.
    pub fn with_special_names() -> Self {
        let mut fs = Self::typical_system();

        // Process with spaces in name (like Firefox's "Web Content")
        fs.add_process(
            5000,
            "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "488281 50000 10000 100 0 375000 0",
            "/usr/lib/firefox/firefox\0-contentproc\0",
        );

        // Process with parentheses in name
        fs.add_process(
            5001,
            "5001 (test(1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "2441 1000 500 10 0 500 0",
            "/usr/bin/test(1)\0",
        );

        // Doubly parenthesized name as shown by systemd's user manager
        fs.add_process(
            5002,
            "5002 ((sd-pam)) S 5003 5003 5003 0 -1 1077936448 50 0 0 0 0 0 0 0 20 0 1 0 500200 105000000 1100 18446744073709551615 0 0 0 0 0 0 0 4096 0 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "25634 1100 800 10 0 3000 0",
            "(sd-pam)\0",
        );

        fs
    }

    /// Creates a system whose pid 2000 stat line has a corrupt utime column.
    pub fn with_malformed_fields() -> Self {
        let mut fs = Self::typical_system();

        fs.add_process(
            2000,
            "2000 (broken) S 1 2000 2000 0 -1 4194304 10 0 0 0 12x4 70 0 0 20 0 1 0 200 1000000 100 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "244 100 50 10 0 100 0",
            "broken\0",
        );

        fs
    }

    /// Creates a system where a process exits between enumeration and
    /// reading: its directory is listed but every file is gone.
    pub fn with_vanishing_process() -> Self {
        let mut fs = Self::typical_system();
        fs.add_dir("/proc/6000");
        fs
    }
}

#[cfg(test)]
mod tests {
    use crate::collector::mock::MockFs;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_system_has_required_sources() {
        let fs = MockFs::typical_system();

        for path in [
            "/proc/stat",
            "/proc/loadavg",
            "/proc/meminfo",
            "/proc/net/dev",
            "/etc/mtab",
            "/proc/1000/stat",
            "/proc/1000/statm",
            "/proc/1000/cmdline",
        ] {
            assert!(fs.exists(Path::new(path)), "missing {}", path);
        }
        assert!(fs.read_link(Path::new("/proc/1000/exe")).is_ok());
        assert!(fs.read_link(Path::new("/proc/1001/exe")).is_err());
    }

    #[test]
    fn test_scenarios_extend_typical_system() {
        let fs = MockFs::with_special_names();
        assert!(fs.exists(Path::new("/proc/1000")));
        assert!(fs.exists(Path::new("/proc/5002/stat")));

        let fs = MockFs::with_vanishing_process();
        assert!(fs.exists(Path::new("/proc/6000")));
        assert!(!fs.exists(Path::new("/proc/6000/stat")));
    }
}
