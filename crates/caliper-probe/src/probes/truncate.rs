//! Grow-then-shrink of a fresh file through `fd_filestat_set_size`.

use std::collections::BTreeMap;

use caliper_rut::runtime::{Fd, OpenFlags, Whence};
use caliper_rut::{Errno, Runtime};

use crate::outcome::Outcome;
use crate::probe::ProbeContext;
use crate::scope::{OpenFile, ScopeDir};

/// Observed keys: `size.{initial,grown,shrunk}`, `cursor.{initial,grown,shrunk}`,
/// `read.len`, `read.nonzero`.
pub fn grow_shrink(ctx: &ProbeContext<'_>) -> Outcome {
    let rt = ctx.runtime;
    let mut scope = match ScopeDir::create(rt, ctx.scope) {
        Ok(s) => s,
        Err(e) => return Outcome::failed("path_create_directory", e),
    };
    let path = scope.file("ftruncate.txt");
    let file = match OpenFile::open(rt, &path, OpenFlags::CREATE_READ_WRITE) {
        Ok(f) => f,
        Err(e) => return Outcome::failed("path_open", e),
    };

    let mut seen = BTreeMap::new();
    match run_sequence(rt, &file, ctx, &mut seen) {
        Ok(()) => Outcome::ok().with_observations(seen),
        Err((step, e)) => Outcome::failed(step, e).with_observations(seen),
    }
}

/// Record size and cursor position under `label`.
fn snapshot(
    rt: &dyn Runtime,
    fd: Fd,
    label: &str,
    seen: &mut BTreeMap<String, u64>,
) -> Result<(), (&'static str, Errno)> {
    let size = rt.fd_filestat_get(fd).map_err(|e| ("fd_filestat_get", e))?.size;
    let cursor = rt.fd_seek(fd, 0, Whence::Cur).map_err(|e| ("fd_seek", e))?;
    seen.insert(format!("size.{label}"), size);
    seen.insert(format!("cursor.{label}"), cursor);
    Ok(())
}

fn run_sequence(
    rt: &dyn Runtime,
    file: &OpenFile<'_>,
    ctx: &ProbeContext<'_>,
    seen: &mut BTreeMap<String, u64>,
) -> Result<(), (&'static str, Errno)> {
    let fd = file.fd();
    let settings = &ctx.settings.truncate;

    snapshot(rt, fd, "initial", seen)?;
    rt.fd_filestat_set_size(fd, settings.grow_to)
        .map_err(|e| ("fd_filestat_set_size", e))?;
    snapshot(rt, fd, "grown", seen)?;
    rt.fd_filestat_set_size(fd, settings.shrink_to)
        .map_err(|e| ("fd_filestat_set_size", e))?;
    snapshot(rt, fd, "shrunk", seen)?;

    // Read everything back from the (unmoved) cursor, bounded by the grown size.
    let limit = usize::try_from(settings.grow_to.max(settings.shrink_to))
        .map_err(|_| ("fd_read", Errno::Fbig))?
        .saturating_add(1);
    let mut data = Vec::new();
    let mut buf = [0u8; 128];
    while data.len() < limit {
        let n = rt.fd_read(fd, &mut buf).map_err(|e| ("fd_read", e))?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    seen.insert("read.len".to_string(), data.len() as u64);
    seen.insert(
        "read.nonzero".to_string(),
        data.iter().filter(|&&b| b != 0).count() as u64,
    );
    Ok(())
}
