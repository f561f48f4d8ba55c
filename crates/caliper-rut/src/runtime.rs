use serde::{Deserialize, Serialize};

use crate::errno::Errno;
use crate::thread::WorkerHandle;

/// A file descriptor handed out by a runtime.
pub type Fd = u32;

/// The two clocks every runtime must expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    Monotonic,
    Realtime,
}

/// Seconds plus nanoseconds, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timespec {
    pub secs: u64,
    pub nanos: u32,
}

impl Timespec {
    pub fn from_nanos(total: u128) -> Self {
        Self {
            secs: (total / 1_000_000_000) as u64,
            nanos: (total % 1_000_000_000) as u32,
        }
    }

    /// Build from a host `timespec`, rejecting negative fields.
    pub fn from_parts(secs: i64, nanos: i64) -> Result<Self, Errno> {
        if secs < 0 || !(0..1_000_000_000).contains(&nanos) {
            return Err(Errno::Inval);
        }
        Ok(Self {
            secs: secs as u64,
            nanos: nanos as u32,
        })
    }

    pub fn as_nanos(&self) -> u128 {
        self.secs as u128 * 1_000_000_000 + self.nanos as u128
    }

    /// `secs * 1000 + nanos / 1_000_000`.
    pub fn as_millis(&self) -> u64 {
        self.secs
            .saturating_mul(1000)
            .saturating_add((self.nanos / 1_000_000) as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// Flags for `path_open`. Mirrors the subset of `O_*` the probes need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
}

impl OpenFlags {
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        create: false,
        truncate: false,
    };

    pub const CREATE_READ_WRITE: Self = Self {
        read: true,
        write: true,
        create: true,
        truncate: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    RegularFile,
    Directory,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub filetype: FileType,
    pub size: u64,
}

/// How a runtime answers a path that no preopened capability covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialPosture {
    /// Strict POSIX: the entry simply does not exist (`ENOENT`).
    NotFound,
    /// Capability sandbox: access was never granted (`ENOTCAPABLE`).
    NotCapable,
}

impl DenialPosture {
    pub fn errno(self) -> Errno {
        match self {
            Self::NotFound => Errno::Noent,
            Self::NotCapable => Errno::Notcapable,
        }
    }
}

/// Capabilities a runtime reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Error posture for paths outside every preopen.
    #[serde(default)]
    pub path_denial: Option<DenialPosture>,
    /// Largest `random_get` request served in one call.
    #[serde(default)]
    pub entropy_call_cap: Option<usize>,
    #[serde(default = "default_threads")]
    pub threads: bool,
}

fn default_threads() -> bool {
    true
}

/// The Runtime-Under-Test boundary.
///
/// Every operation returns `Errno` on failure and never panics on bad input.
/// Paths are resolved against the runtime's preopened directories.
pub trait Runtime: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &str;

    /// Self-reported capability metadata, if the runtime publishes any.
    fn metadata(&self) -> Option<RuntimeMetadata>;

    /// Mapped names of the preopened directories.
    fn preopens(&self) -> Vec<String>;

    fn clock_res_get(&self, clock: ClockKind) -> Result<Timespec, Errno>;
    fn clock_time_get(&self, clock: ClockKind) -> Result<Timespec, Errno>;

    fn path_open(&self, path: &str, flags: OpenFlags) -> Result<Fd, Errno>;
    fn path_create_directory(&self, path: &str) -> Result<(), Errno>;
    fn path_unlink_file(&self, path: &str) -> Result<(), Errno>;
    fn path_remove_directory(&self, path: &str) -> Result<(), Errno>;

    fn fd_filestat_get(&self, fd: Fd) -> Result<FileStat, Errno>;
    fn fd_filestat_set_size(&self, fd: Fd, size: u64) -> Result<(), Errno>;
    fn fd_seek(&self, fd: Fd, offset: i64, whence: Whence) -> Result<u64, Errno>;
    fn fd_read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, Errno>;
    fn fd_write(&self, fd: Fd, buf: &[u8]) -> Result<usize, Errno>;
    fn fd_close(&self, fd: Fd) -> Result<(), Errno>;

    /// Fill `buf` with random bytes in a single call.
    fn random_get(&self, buf: &mut [u8]) -> Result<(), Errno>;

    fn thread_spawn(&self, task: Box<dyn FnOnce() + Send + 'static>) -> Result<WorkerHandle, Errno>;

    fn args_get(&self) -> Vec<String>;
    /// `(count, buffer size)` where the buffer holds every entry NUL-terminated.
    fn args_sizes_get(&self) -> (usize, usize);
    fn environ_get(&self) -> Vec<String>;
    fn environ_sizes_get(&self) -> (usize, usize);
}

/// `(count, Σ(len + 1))` for a list of strings, as `*_sizes_get` reports it.
pub fn sizes_of(entries: &[String]) -> (usize, usize) {
    let buf = entries.iter().map(|e| e.len() + 1).sum();
    (entries.len(), buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_truncates_nanos() {
        let ts = Timespec {
            secs: 2,
            nanos: 999_999,
        };
        assert_eq!(ts.as_millis(), 2000);
        assert_eq!(Timespec::from_nanos(1_500_000_000).as_millis(), 1500);
    }

    #[test]
    fn test_negative_host_timespec_rejected() {
        assert_eq!(Timespec::from_parts(-1, 0), Err(Errno::Inval));
        assert_eq!(Timespec::from_parts(0, 1_000_000_000), Err(Errno::Inval));
        assert!(Timespec::from_parts(5, 10).is_ok());
    }

    #[test]
    fn test_sizes_count_nul_terminators() {
        let args = vec!["prog".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(sizes_of(&args), (3, 9));
        assert_eq!(sizes_of(&[]), (0, 0));
    }
}
