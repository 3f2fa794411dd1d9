//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! `MockFs` holds `/proc` text, symbolic links, `statvfs` counters and a
//! `sysinfo` answer in memory, so collector tests see fixed host data
//! regardless of the machine they run on.

use crate::collector::traits::{FileSystem, StatVfs, SysInfo, SysInfoSource};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files, directories and symbolic links in memory, plus canned
/// `statvfs` and `sysinfo` answers, so tests can simulate any `/proc` state.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, Vec<u8>>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Map from link path to link target.
    links: HashMap<PathBuf, PathBuf>,
    /// Map from mount point to filesystem counters.
    mounts: HashMap<PathBuf, StatVfs>,
    sysinfo: Option<SysInfo>,
}

fn not_found(kind: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found: {:?}", kind, path),
    )
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.add_bytes(path, content.into().into_bytes());
    }

    /// Adds a file with raw byte content.
    pub fn add_bytes(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.files.insert(path.to_path_buf(), content.into());
    }

    /// Removes a file, simulating a source that vanished.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.directories.insert(path.to_path_buf());
    }

    /// Removes a directory and everything below it.
    pub fn remove_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.files.retain(|p, _| !p.starts_with(path));
        self.links.retain(|p, _| !p.starts_with(path));
        self.directories.retain(|p| !p.starts_with(path));
    }

    /// Adds a symbolic link pointing at `target`.
    pub fn add_link(&mut self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.links.insert(path.to_path_buf(), target.into());
    }

    /// Registers `statvfs` counters for a mount point.
    pub fn add_statvfs(&mut self, path: impl Into<PathBuf>, stat: StatVfs) {
        self.mounts.insert(path.into(), stat);
    }

    pub fn set_sysinfo(&mut self, info: SysInfo) {
        self.sysinfo = Some(info);
    }

    /// Adds a process with its `/proc/[pid]/` files.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `statm` - Content of `/proc/[pid]/statm`
    /// * `cmdline` - Content of `/proc/[pid]/cmdline` (NUL-separated)
    pub fn add_process(&mut self, pid: i32, stat: &str, statm: &str, cmdline: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("statm"), statm);
        self.add_file(base.join("cmdline"), cmdline);
    }

    /// Adds the `exe`, `cwd` and `root` links of a process.
    pub fn add_process_links(&mut self, pid: i32, exe: &str, cwd: &str, root: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_link(base.join("exe"), exe);
        self.add_link(base.join("cwd"), cwd);
        self.add_link(base.join("root"), root);
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("file", path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.links.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(not_found("directory", path));
        }

        let mut entries = HashSet::new();

        // Find all files, links and directories that are direct children
        let children = self
            .files
            .keys()
            .chain(self.links.keys())
            .chain(self.directories.iter());
        for child in children {
            if child.parent().is_some_and(|parent| parent == path) && child != path {
                entries.insert(child.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        if let Some(target) = self.links.get(path) {
            return Ok(target.clone());
        }
        if self.files.contains_key(path) || self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symbolic link: {:?}", path),
            ));
        }
        Err(not_found("link", path))
    }

    fn statvfs(&self, path: &Path) -> io::Result<StatVfs> {
        self.mounts
            .get(path)
            .copied()
            .ok_or_else(|| not_found("mount", path))
    }
}

impl SysInfoSource for MockFs {
    fn sysinfo(&self) -> io::Result<SysInfo> {
        self.sysinfo.ok_or_else(|| {
            io::Error::new(io::ErrorKind::Unsupported, "sysinfo not configured")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[test]
    fn test_mock_fs_remove_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/statm", "1 2 3");
        fs.remove_file("/proc/1/statm");

        assert!(!fs.exists(Path::new("/proc/1/statm")));
        assert!(fs.exists(Path::new("/proc/1")));
        let err = fs.read(Path::new("/proc/1/statm")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/stat", "stat content");
        fs.add_file("/proc/1/statm", "statm content");
        fs.add_link("/proc/1/exe", "/sbin/init");
        fs.add_file("/proc/2/stat", "stat content 2");

        let proc_entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(proc_entries.len(), 2); // /proc/1 and /proc/2

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).unwrap();
        assert_eq!(proc1_entries.len(), 3); // stat, statm and exe

        assert!(fs.read_dir(Path::new("/sys")).is_err());
    }

    #[test]
    fn test_mock_fs_remove_dir() {
        let mut fs = MockFs::new();
        fs.add_process(7, "7 (x) S", "1 1 1", "x\0");
        fs.add_process_links(7, "/x", "/", "/");

        fs.remove_dir("/proc/7");

        assert!(!fs.exists(Path::new("/proc/7")));
        assert!(fs.read_link(Path::new("/proc/7/exe")).is_err());
        assert!(fs.exists(Path::new("/proc")));
    }

    #[test]
    fn test_mock_fs_binary_content() {
        let mut fs = MockFs::new();
        fs.add_bytes("/proc/1/cmdline", b"a\0\xff\0".to_vec());

        assert_eq!(fs.read(Path::new("/proc/1/cmdline")).unwrap(), b"a\0\xff\0");
        let err = fs.read_to_string(Path::new("/proc/1/cmdline")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_mock_fs_read_link() {
        let mut fs = MockFs::new();
        fs.add_process(1, "1 (init) S", "1 1 1", "/sbin/init\0");
        fs.add_process_links(1, "/sbin/init", "/", "/");

        assert_eq!(
            fs.read_link(Path::new("/proc/1/exe")).unwrap(),
            PathBuf::from("/sbin/init")
        );
        let err = fs.read_link(Path::new("/proc/1/stat")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = fs.read_link(Path::new("/proc/2/exe")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_fs_statvfs_and_sysinfo() {
        let mut fs = MockFs::new();
        assert!(fs.statvfs(Path::new("/")).is_err());
        assert_eq!(
            fs.sysinfo().unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );

        let stat = StatVfs {
            fragment_size: 4096,
            blocks: 10,
            ..StatVfs::default()
        };
        fs.add_statvfs("/", stat);
        fs.set_sysinfo(SysInfo {
            uptime: 5,
            mem_unit: 1,
            ..SysInfo::default()
        });

        assert_eq!(fs.statvfs(Path::new("/")).unwrap(), stat);
        assert_eq!(fs.sysinfo().unwrap().uptime, 5);
    }

    #[test]
    fn test_mock_fs_add_process() {
        let mut fs = MockFs::new();
        fs.add_process(1, "1 (init) S 0", "100 50 10", "/sbin/init\0");

        assert!(fs.exists(Path::new("/proc/1")));
        assert!(fs.exists(Path::new("/proc/1/stat")));
        assert!(fs.exists(Path::new("/proc/1/statm")));
        assert_eq!(
            fs.read(Path::new("/proc/1/cmdline")).unwrap(),
            b"/sbin/init\0"
        );
    }
}
