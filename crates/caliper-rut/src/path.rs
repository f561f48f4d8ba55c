//! Preopen-relative path resolution shared by every runtime adapter.
//!
//! A guest path is resolved the way a WASI host does it: the first component
//! must name a preopened directory, and no `..` may climb above that
//! directory. Anything outside every preopen fails with the runtime's denial
//! errno; a `..` that follows a missing component fails with `ENOENT`.

use crate::errno::Errno;
use crate::runtime::FileType;

/// Longest single path component accepted.
pub const NAME_MAX: usize = 255;

/// A path resolved against one preopen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Index into the runtime's preopen list.
    pub preopen: usize,
    /// Normalized components below the preopen root.
    pub components: Vec<String>,
}

impl ResolvedPath {
    pub fn is_preopen_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn parent(&self) -> Option<ResolvedPath> {
        if self.components.is_empty() {
            return None;
        }
        Some(ResolvedPath {
            preopen: self.preopen,
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Stable key: the preopen name followed by the components, `/`-joined.
    pub fn key(&self, preopens: &[String]) -> String {
        let mut key = preopens[self.preopen].clone();
        for c in &self.components {
            key.push('/');
            key.push_str(c);
        }
        key
    }
}

/// Check that a preopen name is a single, ordinary path component.
pub fn validate_preopen_name(name: &str) -> Result<(), Errno> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(Errno::Inval);
    }
    if name.len() > NAME_MAX {
        return Err(Errno::Nametoolong);
    }
    Ok(())
}

/// Resolve `path` against `preopens`.
///
/// `lookup(preopen, components)` reports the type of an existing entry, or
/// None when it does not exist. It is consulted only for components that are
/// immediately followed by `..`.
pub fn resolve<F>(
    preopens: &[String],
    path: &str,
    denial: Errno,
    lookup: F,
) -> Result<ResolvedPath, Errno>
where
    F: Fn(usize, &[String]) -> Option<FileType>,
{
    if path.is_empty() {
        return Err(Errno::Noent);
    }
    if path.contains('\0') {
        return Err(Errno::Inval);
    }

    let mut parts = path.split('/').filter(|c| !c.is_empty() && *c != ".");

    // The working directory itself is not a capability.
    let first = parts.next().ok_or(denial)?;
    let preopen = preopens
        .iter()
        .position(|p| p == first)
        .ok_or(denial)?;

    let mut components: Vec<String> = Vec::new();
    for part in parts {
        if part.len() > NAME_MAX {
            return Err(Errno::Nametoolong);
        }
        if part == ".." {
            if components.is_empty() {
                return Err(denial);
            }
            match lookup(preopen, &components) {
                Some(FileType::Directory) => {}
                Some(_) => return Err(Errno::Notdir),
                None => return Err(Errno::Noent),
            }
            components.pop();
        } else {
            components.push(part.to_string());
        }
    }

    Ok(ResolvedPath {
        preopen,
        components,
    })
}
