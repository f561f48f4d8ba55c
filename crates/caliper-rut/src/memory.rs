//! In-memory runtime: a preopen-based filesystem, seeded entropy, and a
//! configurable process view. Its denial posture, entropy cap and thread
//! support are set from `MemoryConfig`, which makes it a stand-in for either
//! a strict POSIX host or a capability sandbox.
//!
//! Unlinking a file that still has open descriptors detaches its data under a
//! key no guest path can name; the data is dropped with the last descriptor.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::MemoryConfig;
use crate::errno::Errno;
use crate::fd::FdTable;
use crate::path::{self, validate_preopen_name, ResolvedPath};
use crate::runtime::{
    sizes_of, ClockKind, Fd, FileStat, FileType, OpenFlags, Runtime, RuntimeMetadata, Timespec,
    Whence,
};
use crate::thread::WorkerHandle;

/// `random_get` fills large requests in chunks of this size.
const RANDOM_STRIDE: usize = 65536;

/// Key prefix for unlinked files kept alive by open descriptors. Guest paths
/// never contain NUL, so these keys are unreachable by name.
const UNLINKED_PREFIX: &str = "\0unlinked/";

#[derive(Debug)]
enum Node {
    Dir,
    File(Vec<u8>),
}

impl Node {
    fn file_type(&self) -> FileType {
        match self {
            Node::Dir => FileType::Directory,
            Node::File(_) => FileType::RegularFile,
        }
    }
}

#[derive(Debug)]
struct OpenFile {
    key: String,
    filetype: FileType,
    pos: u64,
    read: bool,
    write: bool,
}

#[derive(Debug)]
struct State {
    nodes: BTreeMap<String, Node>,
    fds: FdTable<OpenFile>,
    unlinked: u64,
}

impl State {
    fn is_open(&self, key: &str) -> bool {
        self.fds.values().any(|open| open.key == key)
    }
}

pub struct MemoryRuntime {
    preopens: Vec<String>,
    config: MemoryConfig,
    state: Mutex<State>,
    rng: Mutex<ChaCha20Rng>,
    epoch: Instant,
}

impl MemoryRuntime {
    pub fn new(config: &MemoryConfig) -> Result<Self, Errno> {
        let mut nodes = BTreeMap::new();
        for name in &config.preopens {
            validate_preopen_name(name)?;
            if nodes.insert(name.clone(), Node::Dir).is_some() {
                return Err(Errno::Exist);
            }
        }

        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(OsRng).map_err(|_| Errno::Io)?,
        };

        Ok(Self {
            preopens: config.preopens.clone(),
            config: config.clone(),
            state: Mutex::new(State {
                nodes,
                fds: FdTable::new(config.max_open_files),
                unlinked: 0,
            }),
            rng: Mutex::new(rng),
            epoch: Instant::now(),
        })
    }

    /// Every filesystem entry, preopen roots included, in key order.
    pub fn entries(&self) -> Vec<String> {
        self.lock()
            .nodes
            .keys()
            .filter(|k| !k.starts_with(UNLINKED_PREFIX))
            .cloned()
            .collect()
    }

    /// Number of descriptors currently open.
    pub fn open_descriptors(&self) -> usize {
        self.lock().fds.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve(&self, state: &State, guest_path: &str) -> Result<ResolvedPath, Errno> {
        path::resolve(
            &self.preopens,
            guest_path,
            self.config.path_denial.errno(),
            |idx, comps| {
                let key = ResolvedPath {
                    preopen: idx,
                    components: comps.to_vec(),
                }
                .key(&self.preopens);
                state.nodes.get(&key).map(Node::file_type)
            },
        )
    }

    /// The parent of `resolved` must exist and be a directory.
    fn check_parent(&self, state: &State, resolved: &ResolvedPath) -> Result<(), Errno> {
        let parent = match resolved.parent() {
            Some(p) => p,
            None => return Ok(()),
        };
        match state.nodes.get(&parent.key(&self.preopens)) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(Errno::Notdir),
            None => Err(Errno::Noent),
        }
    }

    /// Byte length for a file of `size`, or EFBIG past the ceiling.
    fn file_len(&self, size: u64) -> Result<usize, Errno> {
        if size > self.config.max_file_size {
            return Err(Errno::Fbig);
        }
        usize::try_from(size).map_err(|_| Errno::Fbig)
    }

    fn quantize(&self, nanos: u128) -> Timespec {
        let res = self.config.clock_resolution_nanos.max(1) as u128;
        Timespec::from_nanos(nanos - nanos % res)
    }
}

impl Runtime for MemoryRuntime {
    fn name(&self) -> &str {
        "memory"
    }

    fn metadata(&self) -> Option<RuntimeMetadata> {
        if !self.config.report_metadata {
            return None;
        }
        Some(RuntimeMetadata {
            name: "memory".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            path_denial: Some(self.config.path_denial),
            entropy_call_cap: self.config.entropy_call_cap,
            threads: self.config.threads,
        })
    }

    fn preopens(&self) -> Vec<String> {
        self.preopens.clone()
    }

    fn clock_res_get(&self, _clock: ClockKind) -> Result<Timespec, Errno> {
        Ok(Timespec::from_nanos(
            self.config.clock_resolution_nanos.max(1) as u128,
        ))
    }

    fn clock_time_get(&self, clock: ClockKind) -> Result<Timespec, Errno> {
        let nanos = match clock {
            ClockKind::Monotonic => self.epoch.elapsed().as_nanos(),
            ClockKind::Realtime => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|_| Errno::Io)?
                .as_nanos(),
        };
        Ok(self.quantize(nanos))
    }

    fn path_open(&self, guest_path: &str, flags: OpenFlags) -> Result<Fd, Errno> {
        let mut state = self.lock();
        let resolved = self.resolve(&state, guest_path)?;
        let key = resolved.key(&self.preopens);

        let filetype = match state.nodes.get(&key).map(Node::file_type) {
            Some(FileType::Directory) => {
                if flags.write {
                    return Err(Errno::Isdir);
                }
                FileType::Directory
            }
            Some(filetype) => {
                if flags.truncate && flags.write {
                    if let Some(Node::File(data)) = state.nodes.get_mut(&key) {
                        data.clear();
                    }
                }
                filetype
            }
            None => {
                if !flags.create {
                    return Err(Errno::Noent);
                }
                self.check_parent(&state, &resolved)?;
                state.nodes.insert(key.clone(), Node::File(Vec::new()));
                FileType::RegularFile
            }
        };

        let fd = state.fds.insert(OpenFile {
            key,
            filetype,
            pos: 0,
            read: flags.read,
            write: flags.write,
        })?;
        log::debug!("memory path_open({guest_path}) -> fd {fd}");
        Ok(fd)
    }

    fn path_create_directory(&self, guest_path: &str) -> Result<(), Errno> {
        let mut state = self.lock();
        let resolved = self.resolve(&state, guest_path)?;
        let key = resolved.key(&self.preopens);
        if state.nodes.contains_key(&key) {
            return Err(Errno::Exist);
        }
        self.check_parent(&state, &resolved)?;
        state.nodes.insert(key, Node::Dir);
        Ok(())
    }

    fn path_unlink_file(&self, guest_path: &str) -> Result<(), Errno> {
        let mut state = self.lock();
        let resolved = self.resolve(&state, guest_path)?;
        let key = resolved.key(&self.preopens);
        match state.nodes.get(&key) {
            None => Err(Errno::Noent),
            Some(Node::Dir) => Err(Errno::Isdir),
            Some(Node::File(_)) => {
                if let Some(node) = state.nodes.remove(&key) {
                    if state.is_open(&key) {
                        let detached = format!("{UNLINKED_PREFIX}{}", state.unlinked);
                        state.unlinked += 1;
                        for open in state.fds.values_mut().filter(|o| o.key == key) {
                            open.key = detached.clone();
                        }
                        state.nodes.insert(detached, node);
                    }
                }
                Ok(())
            }
        }
    }

    fn path_remove_directory(&self, guest_path: &str) -> Result<(), Errno> {
        let mut state = self.lock();
        let resolved = self.resolve(&state, guest_path)?;
        if resolved.is_preopen_root() {
            return Err(Errno::Acces);
        }
        let key = resolved.key(&self.preopens);
        match state.nodes.get(&key) {
            None => return Err(Errno::Noent),
            Some(Node::File(_)) => return Err(Errno::Notdir),
            Some(Node::Dir) => {}
        }
        let prefix = format!("{key}/");
        if state.nodes.keys().any(|k| k.starts_with(&prefix)) {
            return Err(Errno::Notempty);
        }
        state.nodes.remove(&key);
        Ok(())
    }

    fn fd_filestat_get(&self, fd: Fd) -> Result<FileStat, Errno> {
        let state = self.lock();
        let open = state.fds.get(fd)?;
        match state.nodes.get(&open.key) {
            Some(Node::Dir) => Ok(FileStat {
                filetype: FileType::Directory,
                size: 0,
            }),
            Some(Node::File(data)) => Ok(FileStat {
                filetype: FileType::RegularFile,
                size: data.len() as u64,
            }),
            None => Err(Errno::Badf),
        }
    }

    fn fd_filestat_set_size(&self, fd: Fd, size: u64) -> Result<(), Errno> {
        let mut state = self.lock();
        let State { nodes, fds, .. } = &mut *state;
        let open = fds.get(fd)?;
        if !open.write {
            return Err(Errno::Badf);
        }
        let len = self.file_len(size)?;
        match nodes.get_mut(&open.key) {
            // Grows zero-filled, shrinks by discarding the tail; cursor untouched.
            Some(Node::File(data)) => {
                data.resize(len, 0);
                Ok(())
            }
            Some(Node::Dir) => Err(Errno::Isdir),
            None => Err(Errno::Badf),
        }
    }

    fn fd_seek(&self, fd: Fd, offset: i64, whence: Whence) -> Result<u64, Errno> {
        let mut state = self.lock();
        let State { nodes, fds, .. } = &mut *state;
        let open = fds.get_mut(fd)?;
        let size = match nodes.get(&open.key) {
            Some(Node::File(data)) => data.len() as i128,
            Some(Node::Dir) => 0,
            None => return Err(Errno::Badf),
        };
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => open.pos as i128,
            Whence::End => size,
        };
        let target = base + offset as i128;
        if target < 0 || target > u64::MAX as i128 {
            return Err(Errno::Inval);
        }
        open.pos = target as u64;
        Ok(open.pos)
    }

    fn fd_read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, Errno> {
        let mut state = self.lock();
        let State { nodes, fds, .. } = &mut *state;
        let open = fds.get_mut(fd)?;
        if open.filetype == FileType::Directory {
            return Err(Errno::Isdir);
        }
        if !open.read {
            return Err(Errno::Badf);
        }
        let data = match nodes.get(&open.key) {
            Some(Node::File(data)) => data,
            _ => return Err(Errno::Badf),
        };
        let start = (open.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        open.pos += n as u64;
        Ok(n)
    }

    fn fd_write(&self, fd: Fd, buf: &[u8]) -> Result<usize, Errno> {
        let mut state = self.lock();
        let State { nodes, fds, .. } = &mut *state;
        let open = fds.get_mut(fd)?;
        if !open.write {
            return Err(Errno::Badf);
        }
        let data = match nodes.get_mut(&open.key) {
            Some(Node::File(data)) => data,
            Some(Node::Dir) => return Err(Errno::Isdir),
            None => return Err(Errno::Badf),
        };
        let end = open
            .pos
            .checked_add(buf.len() as u64)
            .ok_or(Errno::Fbig)
            .and_then(|end| self.file_len(end))?;
        let start = end - buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        open.pos = end as u64;
        Ok(buf.len())
    }

    fn fd_close(&self, fd: Fd) -> Result<(), Errno> {
        let mut state = self.lock();
        let closed = state.fds.remove(fd)?;
        if closed.key.starts_with(UNLINKED_PREFIX) && !state.is_open(&closed.key) {
            state.nodes.remove(&closed.key);
        }
        Ok(())
    }

    fn random_get(&self, buf: &mut [u8]) -> Result<(), Errno> {
        if let Some(cap) = self.config.entropy_call_cap {
            if buf.len() > cap {
                return Err(Errno::Io);
            }
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for chunk in buf.chunks_mut(RANDOM_STRIDE) {
            rng.fill_bytes(chunk);
        }
        Ok(())
    }

    fn thread_spawn(&self, task: Box<dyn FnOnce() + Send + 'static>) -> Result<WorkerHandle, Errno> {
        if !self.config.threads {
            return Err(Errno::Nosys);
        }
        WorkerHandle::spawn("caliper-memory-worker", task)
    }

    fn args_get(&self) -> Vec<String> {
        self.config.args.clone()
    }

    fn args_sizes_get(&self) -> (usize, usize) {
        sizes_of(&self.config.args)
    }

    fn environ_get(&self) -> Vec<String> {
        self.config.environ.clone()
    }

    fn environ_sizes_get(&self) -> (usize, usize) {
        sizes_of(&self.config.environ)
    }
}
