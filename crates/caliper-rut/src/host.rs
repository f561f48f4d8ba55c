//! Runtime adapter over the real operating system.
//!
//! Guests see one preopened directory backed by a real host directory. Clock
//! queries go straight to `clock_getres`/`clock_gettime`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use nix::time::{clock_getres, clock_gettime, ClockId};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::HostConfig;
use crate::errno::Errno;
use crate::fd::FdTable;
use crate::path::{self, validate_preopen_name};
use crate::runtime::{
    sizes_of, ClockKind, DenialPosture, Fd, FileStat, FileType, OpenFlags, Runtime,
    RuntimeMetadata, Timespec, Whence,
};
use crate::thread::WorkerHandle;

pub struct HostRuntime {
    preopens: Vec<String>,
    roots: Vec<PathBuf>,
    denial: DenialPosture,
    entropy_call_cap: Option<usize>,
    fds: Mutex<FdTable<File>>,
    args: Vec<String>,
    environ: Vec<String>,
}

impl HostRuntime {
    /// Create a host runtime. argv and environ are captured once, here.
    pub fn new(config: &HostConfig) -> Result<Self, Errno> {
        validate_preopen_name(&config.preopen_name)?;
        let meta = fs::metadata(&config.preopen_root).map_err(|e| Errno::from_io(&e))?;
        if !meta.is_dir() {
            return Err(Errno::Notdir);
        }

        let args = std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let environ = std::env::vars_os()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect();

        log::debug!(
            "host runtime: preopen '{}' -> {}",
            config.preopen_name,
            config.preopen_root.display()
        );

        Ok(Self {
            preopens: vec![config.preopen_name.clone()],
            roots: vec![config.preopen_root.clone()],
            denial: config.path_denial,
            entropy_call_cap: config.entropy_call_cap,
            fds: Mutex::new(FdTable::new(config.max_open_files)),
            args,
            environ,
        })
    }

    /// Replace the captured argv/environ, for hosts that launch guests with
    /// a curated process view.
    pub fn with_process_view(mut self, args: Vec<String>, environ: Vec<String>) -> Self {
        self.args = args;
        self.environ = environ;
        self
    }

    fn table(&self) -> MutexGuard<'_, FdTable<File>> {
        self.fds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve(&self, guest_path: &str) -> Result<(PathBuf, bool), Errno> {
        let resolved = path::resolve(&self.preopens, guest_path, self.denial.errno(), |idx, comps| {
            fs::symlink_metadata(join(&self.roots[idx], comps))
                .ok()
                .map(|m| file_type_of(&m.file_type()))
        })?;
        let real = join(&self.roots[resolved.preopen], &resolved.components);
        Ok((real, resolved.is_preopen_root()))
    }
}

fn join(root: &Path, components: &[String]) -> PathBuf {
    let mut p = root.to_path_buf();
    for c in components {
        p.push(c);
    }
    p
}

fn file_type_of(ft: &fs::FileType) -> FileType {
    if ft.is_dir() {
        FileType::Directory
    } else if ft.is_file() {
        FileType::RegularFile
    } else {
        FileType::Other
    }
}

fn clock_id(clock: ClockKind) -> ClockId {
    match clock {
        ClockKind::Monotonic => ClockId::CLOCK_MONOTONIC,
        ClockKind::Realtime => ClockId::CLOCK_REALTIME,
    }
}

fn io_err(e: std::io::Error) -> Errno {
    Errno::from_io(&e)
}

impl Runtime for HostRuntime {
    fn name(&self) -> &str {
        "host"
    }

    fn metadata(&self) -> Option<RuntimeMetadata> {
        None
    }

    fn preopens(&self) -> Vec<String> {
        self.preopens.clone()
    }

    fn clock_res_get(&self, clock: ClockKind) -> Result<Timespec, Errno> {
        let ts = clock_getres(clock_id(clock))?;
        Timespec::from_parts(ts.tv_sec() as i64, ts.tv_nsec() as i64)
    }

    fn clock_time_get(&self, clock: ClockKind) -> Result<Timespec, Errno> {
        let ts = clock_gettime(clock_id(clock))?;
        Timespec::from_parts(ts.tv_sec() as i64, ts.tv_nsec() as i64)
    }

    fn path_open(&self, path: &str, flags: OpenFlags) -> Result<Fd, Errno> {
        let (real, _) = self.resolve(path)?;
        let file = OpenOptions::new()
            .read(flags.read)
            .write(flags.write)
            .create(flags.create)
            .truncate(flags.truncate)
            .open(&real)
            .map_err(io_err)?;
        let fd = self.table().insert(file)?;
        log::debug!("host path_open({path}) -> fd {fd}");
        Ok(fd)
    }

    fn path_create_directory(&self, path: &str) -> Result<(), Errno> {
        let (real, is_root) = self.resolve(path)?;
        if is_root {
            return Err(Errno::Exist);
        }
        fs::create_dir(real).map_err(io_err)
    }

    fn path_unlink_file(&self, path: &str) -> Result<(), Errno> {
        let (real, is_root) = self.resolve(path)?;
        if is_root {
            return Err(Errno::Isdir);
        }
        fs::remove_file(real).map_err(io_err)
    }

    fn path_remove_directory(&self, path: &str) -> Result<(), Errno> {
        let (real, is_root) = self.resolve(path)?;
        if is_root {
            return Err(Errno::Acces);
        }
        fs::remove_dir(real).map_err(io_err)
    }

    fn fd_filestat_get(&self, fd: Fd) -> Result<FileStat, Errno> {
        let table = self.table();
        let meta = table.get(fd)?.metadata().map_err(io_err)?;
        Ok(FileStat {
            filetype: file_type_of(&meta.file_type()),
            size: meta.len(),
        })
    }

    fn fd_filestat_set_size(&self, fd: Fd, size: u64) -> Result<(), Errno> {
        self.table().get(fd)?.set_len(size).map_err(io_err)
    }

    fn fd_seek(&self, fd: Fd, offset: i64, whence: Whence) -> Result<u64, Errno> {
        let pos = match whence {
            Whence::Set => SeekFrom::Start(u64::try_from(offset).map_err(|_| Errno::Inval)?),
            Whence::Cur => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.table().get_mut(fd)?.seek(pos).map_err(io_err)
    }

    fn fd_read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, Errno> {
        self.table().get_mut(fd)?.read(buf).map_err(io_err)
    }

    fn fd_write(&self, fd: Fd, buf: &[u8]) -> Result<usize, Errno> {
        self.table().get_mut(fd)?.write(buf).map_err(io_err)
    }

    fn fd_close(&self, fd: Fd) -> Result<(), Errno> {
        self.table().remove(fd).map(drop)
    }

    fn random_get(&self, buf: &mut [u8]) -> Result<(), Errno> {
        if let Some(cap) = self.entropy_call_cap {
            if buf.len() > cap {
                return Err(Errno::Io);
            }
        }
        OsRng.try_fill_bytes(buf).map_err(|e| {
            log::warn!("host entropy source failed: {e}");
            Errno::Io
        })
    }

    fn thread_spawn(&self, task: Box<dyn FnOnce() + Send + 'static>) -> Result<WorkerHandle, Errno> {
        WorkerHandle::spawn("caliper-host-worker", task)
    }

    fn args_get(&self) -> Vec<String> {
        self.args.clone()
    }

    fn args_sizes_get(&self) -> (usize, usize) {
        sizes_of(&self.args)
    }

    fn environ_get(&self) -> Vec<String> {
        self.environ.clone()
    }

    fn environ_sizes_get(&self) -> (usize, usize) {
        sizes_of(&self.environ)
    }
}
