//! Open attempts on paths that leave the preopened directory.
//!
//! Each probe makes exactly one read-only open. A handle that comes back is
//! closed immediately and reported as `success = true`.

use caliper_rut::runtime::OpenFlags;

use crate::outcome::{Outcome, Value};
use crate::probe::ProbeContext;
use crate::scope::{OpenFile, ScopeDir};

const ESCAPE_FILE: &str = "escape.txt";

/// `<stem>-parent-directory/..`: a segment that exists nowhere, then `..`.
pub fn missing_parent(ctx: &ProbeContext<'_>) -> Outcome {
    let stem = ctx.preopen.split('.').next().unwrap_or(ctx.preopen);
    attempt(ctx, &format!("{stem}-parent-directory/.."))
}

/// A bare `..`.
pub fn parent_token(ctx: &ProbeContext<'_>) -> Outcome {
    attempt(ctx, "..")
}

/// A real file reached by stepping out of the preopen and back in.
pub fn sibling_escape(ctx: &ProbeContext<'_>) -> Outcome {
    let rt = ctx.runtime;
    let mut scope = match ScopeDir::create(rt, ctx.scope) {
        Ok(s) => s,
        Err(e) => return Outcome::failed("setup:path_create_directory", e),
    };
    let inside = scope.file(ESCAPE_FILE);
    match OpenFile::open(rt, &inside, OpenFlags::CREATE_READ_WRITE) {
        Ok(file) => {
            if let Err(e) = rt.fd_write(file.fd(), b"caliper") {
                return Outcome::failed("setup:fd_write", e);
            }
        }
        Err(e) => return Outcome::failed("setup:path_open", e),
    }

    let escaped = format!("{}/../{}/{}", ctx.preopen, scope.path(), ESCAPE_FILE);
    attempt(ctx, &escaped)
}

fn attempt(ctx: &ProbeContext<'_>, path: &str) -> Outcome {
    match ctx.runtime.path_open(path, OpenFlags::READ_ONLY) {
        Ok(fd) => {
            log::warn!("open of {path} unexpectedly produced fd {fd}");
            if let Err(e) = ctx.runtime.fd_close(fd) {
                log::warn!("cleanup: close fd {fd} failed: {e}");
            }
            Outcome::ok().with_value(Value::UInt(u64::from(fd)))
        }
        Err(e) => Outcome::failed("path_open", e),
    }
}
