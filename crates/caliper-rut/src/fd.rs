use std::collections::BTreeMap;

use crate::errno::Errno;
use crate::runtime::Fd;

/// Descriptors 0-2 are stdio and never handed out here.
const FIRST_FD: Fd = 3;

/// A descriptor table with a fixed capacity.
///
/// Freed descriptors are reused lowest-first, like POSIX `open`.
#[derive(Debug)]
pub struct FdTable<T> {
    entries: BTreeMap<Fd, T>,
    capacity: usize,
}

impl<T> FdTable<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    pub fn insert(&mut self, entry: T) -> Result<Fd, Errno> {
        if self.entries.len() >= self.capacity {
            return Err(Errno::Mfile);
        }
        let mut fd = FIRST_FD;
        while self.entries.contains_key(&fd) {
            fd += 1;
        }
        self.entries.insert(fd, entry);
        Ok(fd)
    }

    pub fn get(&self, fd: Fd) -> Result<&T, Errno> {
        self.entries.get(&fd).ok_or(Errno::Badf)
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut T, Errno> {
        self.entries.get_mut(&fd).ok_or(Errno::Badf)
    }

    pub fn remove(&mut self, fd: Fd) -> Result<T, Errno> {
        self.entries.remove(&fd).ok_or(Errno::Badf)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
