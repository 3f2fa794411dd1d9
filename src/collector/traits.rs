//! Abstractions over filesystem and kernel access to enable testing and mocking.
//!
//! The `FileSystem` trait lets collectors read the real `/proc` filesystem on
//! Linux or an in-memory mock in tests. `SysInfoSource` covers the few
//! counters that come from system calls instead of text files.

use std::io;
use std::path::{Path, PathBuf};

/// Raw `statvfs(3)` counters for one mounted filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatVfs {
    /// Fragment size; the unit of the block counts.
    pub fragment_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    /// Free blocks available to unprivileged users.
    pub blocks_avail: u64,
    pub files: u64,
    pub files_free: u64,
}

/// Raw `sysinfo(2)` counters used by the collectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SysInfo {
    /// Seconds since boot.
    pub uptime: u64,
    pub total_swap: u64,
    pub free_swap: u64,
    /// Multiplier for the swap counters, in bytes.
    pub mem_unit: u64,
}

/// Abstraction for filesystem operations.
///
/// This trait allows collectors to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Reads the entire contents of a file as raw bytes.
    ///
    /// Used for NUL-separated sources such as `/proc/[pid]/cmdline`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Resolves a symbolic link one level.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Queries space and inode counters of the filesystem mounted at `path`.
    fn statvfs(&self, path: &Path) -> io::Result<StatVfs>;
}

/// Source of `sysinfo(2)` counters (uptime, swap).
pub trait SysInfoSource: Send + Sync {
    fn sysinfo(&self) -> io::Result<SysInfo>;
}

/// Real filesystem implementation that delegates to `std::fs` and libc.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    #[cfg(unix)]
    fn statvfs(&self, path: &Path) -> io::Result<StatVfs> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut buf = MaybeUninit::<libc::statvfs>::zeroed();

        // SAFETY: `c_path` is a valid NUL-terminated string and `buf` points to
        // writable memory large enough for a `statvfs` struct.
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), buf.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: statvfs returned 0, so the struct has been filled in.
        let st = unsafe { buf.assume_init() };

        Ok(StatVfs {
            fragment_size: st.f_frsize as u64,
            blocks: st.f_blocks as u64,
            blocks_free: st.f_bfree as u64,
            blocks_avail: st.f_bavail as u64,
            files: st.f_files as u64,
            files_free: st.f_ffree as u64,
        })
    }

    #[cfg(not(unix))]
    fn statvfs(&self, _path: &Path) -> io::Result<StatVfs> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "statvfs is only available on unix",
        ))
    }
}

impl SysInfoSource for RealFs {
    #[cfg(target_os = "linux")]
    fn sysinfo(&self) -> io::Result<SysInfo> {
        use std::mem::MaybeUninit;

        let mut buf = MaybeUninit::<libc::sysinfo>::zeroed();
        // SAFETY: `buf` points to writable memory large enough for a `sysinfo` struct.
        let rc = unsafe { libc::sysinfo(buf.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: sysinfo returned 0, so the struct has been filled in.
        let info = unsafe { buf.assume_init() };

        Ok(SysInfo {
            uptime: info.uptime.max(0) as u64,
            total_swap: info.totalswap as u64,
            free_swap: info.freeswap as u64,
            mem_unit: u64::from(info.mem_unit).max(1),
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn sysinfo(&self) -> io::Result<SysInfo> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sysinfo is only available on linux",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        // Read Cargo.toml which should exist in project root
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        let content = fs.read_to_string(&cargo_toml).unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn test_real_fs_exists() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        assert!(fs.exists(&cargo_toml));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        std::fs::create_dir(dir.path().join("1")).unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();

        assert_eq!(entries, vec![dir.path().join("1"), dir.path().join("a")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_read_link() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, "").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_link(&link).unwrap(), target);
        assert!(fs.read_link(&target).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_statvfs() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();

        let st = fs.statvfs(dir.path()).unwrap();

        assert!(st.fragment_size > 0);
        assert!(st.blocks >= st.blocks_free);
        assert!(fs.statvfs(Path::new("/nonexistent/path/12345")).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_real_fs_sysinfo() {
        let info = RealFs::new().sysinfo().unwrap();
        assert!(info.mem_unit >= 1);
        assert!(info.total_swap >= info.free_swap);
    }
}
