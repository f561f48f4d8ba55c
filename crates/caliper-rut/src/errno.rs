//! Errno classification at the RUT boundary.
//!
//! Codes follow the WASI preview1 numbering so that a report line reads the
//! same whether the runtime under test is a WASI host or a native one.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// POSIX-style error numbers the harness can observe from a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Errno {
    #[serde(rename = "EACCES")]
    Acces,
    #[serde(rename = "EAGAIN")]
    Again,
    #[serde(rename = "EBADF")]
    Badf,
    #[serde(rename = "EEXIST")]
    Exist,
    #[serde(rename = "EFBIG")]
    Fbig,
    #[serde(rename = "EINVAL")]
    Inval,
    #[serde(rename = "EIO")]
    Io,
    #[serde(rename = "EISDIR")]
    Isdir,
    #[serde(rename = "EMFILE")]
    Mfile,
    #[serde(rename = "ENAMETOOLONG")]
    Nametoolong,
    #[serde(rename = "ENFILE")]
    Nfile,
    #[serde(rename = "ENOENT")]
    Noent,
    #[serde(rename = "ENOMEM")]
    Nomem,
    #[serde(rename = "ENOSPC")]
    Nospc,
    #[serde(rename = "ENOSYS")]
    Nosys,
    #[serde(rename = "ENOTDIR")]
    Notdir,
    #[serde(rename = "ENOTEMPTY")]
    Notempty,
    #[serde(rename = "EPERM")]
    Perm,
    #[serde(rename = "ENOTCAPABLE")]
    Notcapable,
}

/// Coarse error taxonomy contracts reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    /// Permission denied or a capability the sandbox never granted.
    CapabilityDenied,
    InvalidArgument,
    ResourceExhausted,
    Unknown,
}

impl Errno {
    /// WASI preview1 numeric code.
    pub fn code(self) -> u16 {
        match self {
            Self::Acces => 2,
            Self::Again => 6,
            Self::Badf => 8,
            Self::Exist => 20,
            Self::Fbig => 22,
            Self::Inval => 28,
            Self::Io => 29,
            Self::Isdir => 31,
            Self::Mfile => 33,
            Self::Nametoolong => 37,
            Self::Nfile => 41,
            Self::Noent => 44,
            Self::Nomem => 48,
            Self::Nospc => 51,
            Self::Nosys => 52,
            Self::Notdir => 54,
            Self::Notempty => 55,
            Self::Perm => 63,
            Self::Notcapable => 76,
        }
    }

    /// Symbolic name, e.g. `ENOENT`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Acces => "EACCES",
            Self::Again => "EAGAIN",
            Self::Badf => "EBADF",
            Self::Exist => "EEXIST",
            Self::Fbig => "EFBIG",
            Self::Inval => "EINVAL",
            Self::Io => "EIO",
            Self::Isdir => "EISDIR",
            Self::Mfile => "EMFILE",
            Self::Nametoolong => "ENAMETOOLONG",
            Self::Nfile => "ENFILE",
            Self::Noent => "ENOENT",
            Self::Nomem => "ENOMEM",
            Self::Nospc => "ENOSPC",
            Self::Nosys => "ENOSYS",
            Self::Notdir => "ENOTDIR",
            Self::Notempty => "ENOTEMPTY",
            Self::Perm => "EPERM",
            Self::Notcapable => "ENOTCAPABLE",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Acces => "Permission denied.",
            Self::Again => "Resource unavailable, or operation would block.",
            Self::Badf => "Bad file descriptor.",
            Self::Exist => "File exists.",
            Self::Fbig => "File too large.",
            Self::Inval => "Invalid argument.",
            Self::Io => "I/O error.",
            Self::Isdir => "Is a directory.",
            Self::Mfile => "File descriptor value too large.",
            Self::Nametoolong => "Filename too long.",
            Self::Nfile => "Too many files open in system.",
            Self::Noent => "No such file or directory.",
            Self::Nomem => "Not enough space.",
            Self::Nospc => "No space left on device.",
            Self::Nosys => "Function not supported.",
            Self::Notdir => "Not a directory or a symbolic link to a directory.",
            Self::Notempty => "Directory not empty.",
            Self::Perm => "Operation not permitted.",
            Self::Notcapable => "Extension: Capabilities insufficient.",
        }
    }

    pub fn kind(self) -> ErrorKind {
        match self {
            Self::Noent => ErrorKind::NotFound,
            Self::Acces | Self::Perm | Self::Notcapable => ErrorKind::CapabilityDenied,
            Self::Badf
            | Self::Exist
            | Self::Inval
            | Self::Isdir
            | Self::Nametoolong
            | Self::Notdir
            | Self::Notempty => ErrorKind::InvalidArgument,
            Self::Again | Self::Fbig | Self::Mfile | Self::Nfile | Self::Nomem | Self::Nospc => {
                ErrorKind::ResourceExhausted
            }
            Self::Io | Self::Nosys => ErrorKind::Unknown,
        }
    }

    /// Classify a host I/O error, preferring the raw OS errno when present.
    pub fn from_io(err: &io::Error) -> Self {
        if let Some(raw) = err.raw_os_error() {
            return nix::errno::Errno::from_raw(raw).into();
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::Noent,
            io::ErrorKind::PermissionDenied => Self::Acces,
            io::ErrorKind::AlreadyExists => Self::Exist,
            io::ErrorKind::InvalidInput => Self::Inval,
            io::ErrorKind::OutOfMemory => Self::Nomem,
            io::ErrorKind::WouldBlock => Self::Again,
            io::ErrorKind::Unsupported => Self::Nosys,
            _ => Self::Io,
        }
    }
}

impl From<nix::errno::Errno> for Errno {
    fn from(err: nix::errno::Errno) -> Self {
        use nix::errno::Errno as Host;
        match err {
            Host::EACCES => Self::Acces,
            Host::EAGAIN => Self::Again,
            Host::EBADF => Self::Badf,
            Host::EEXIST => Self::Exist,
            Host::EFBIG => Self::Fbig,
            Host::EINVAL => Self::Inval,
            Host::EISDIR => Self::Isdir,
            Host::EMFILE => Self::Mfile,
            Host::ENAMETOOLONG => Self::Nametoolong,
            Host::ENFILE => Self::Nfile,
            Host::ENOENT => Self::Noent,
            Host::ENOMEM => Self::Nomem,
            Host::ENOSPC => Self::Nospc,
            Host::ENOSYS => Self::Nosys,
            Host::ENOTDIR => Self::Notdir,
            Host::ENOTEMPTY => Self::Notempty,
            Host::EPERM => Self::Perm,
            _ => Self::Io,
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.name(), self.code(), self.describe())
    }
}

impl std::error::Error for Errno {}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NotFound",
            Self::CapabilityDenied => "CapabilityDenied",
            Self::InvalidArgument => "InvalidArgument",
            Self::ResourceExhausted => "ResourceExhausted",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}
