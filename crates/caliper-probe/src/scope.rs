//! RAII guards that keep probe filesystem state inside the contract scope
//! and remove it before the probe returns.

use caliper_rut::runtime::{Fd, OpenFlags};
use caliper_rut::{Errno, Runtime};

/// A scope directory created for one probe invocation.
///
/// Files registered through [`ScopeDir::file`] are unlinked on drop, then the
/// directory itself is removed if this guard created it.
pub struct ScopeDir<'a> {
    runtime: &'a dyn Runtime,
    path: String,
    created: bool,
    files: Vec<String>,
}

impl<'a> ScopeDir<'a> {
    pub fn create(runtime: &'a dyn Runtime, path: &str) -> Result<Self, Errno> {
        let created = match runtime.path_create_directory(path) {
            Ok(()) => true,
            Err(Errno::Exist) => false,
            Err(e) => return Err(e),
        };
        Ok(Self {
            runtime,
            path: path.to_string(),
            created,
            files: Vec::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of `name` inside the scope, registered for cleanup.
    pub fn file(&mut self, name: &str) -> String {
        let path = format!("{}/{}", self.path, name);
        self.files.push(path.clone());
        path
    }
}

impl Drop for ScopeDir<'_> {
    fn drop(&mut self) {
        for file in self.files.drain(..).rev() {
            match self.runtime.path_unlink_file(&file) {
                Ok(()) | Err(Errno::Noent) => {}
                Err(e) => log::warn!("cleanup: unlink {file} failed: {e}"),
            }
        }
        if self.created {
            if let Err(e) = self.runtime.path_remove_directory(&self.path) {
                log::warn!("cleanup: rmdir {} failed: {e}", self.path);
            }
        }
    }
}

/// An open descriptor, closed on drop.
pub struct OpenFile<'a> {
    runtime: &'a dyn Runtime,
    fd: Fd,
}

impl<'a> OpenFile<'a> {
    pub fn open(runtime: &'a dyn Runtime, path: &str, flags: OpenFlags) -> Result<Self, Errno> {
        let fd = runtime.path_open(path, flags)?;
        Ok(Self { runtime, fd })
    }

    pub fn fd(&self) -> Fd {
        self.fd
    }
}

impl Drop for OpenFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.runtime.fd_close(self.fd) {
            log::warn!("cleanup: close fd {} failed: {e}", self.fd);
        }
    }
}
