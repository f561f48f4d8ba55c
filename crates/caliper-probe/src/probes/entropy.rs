//! Entropy probes: one fixed-size request, and a strided fill.

use caliper_rut::{Errno, Runtime};

use crate::outcome::{Outcome, Value};
use crate::probe::ProbeContext;

/// Request `entropy.single_len` bytes in a single call.
pub fn single(ctx: &ProbeContext<'_>) -> Outcome {
    let mut buf = vec![0u8; ctx.settings.entropy.single_len];
    match ctx.runtime.random_get(&mut buf) {
        Ok(()) => {
            let nonzero = count_nonzero(&buf);
            Outcome::ok()
                .observe("len", buf.len() as u64)
                .observe("nonzero", nonzero)
                .with_value(Value::Bytes(buf))
        }
        Err(e) => Outcome::failed("random_get", e).observe("len", buf.len() as u64),
    }
}

/// Fill `entropy.strided_len` bytes in chunks of at most `entropy.stride`.
///
/// Observed keys: `len`, `filled`, `errno` (0 if every call succeeded),
/// `nonzero`.
pub fn strided(ctx: &ProbeContext<'_>) -> Outcome {
    let settings = &ctx.settings.entropy;
    let mut buf = vec![0u8; settings.strided_len];
    let (filled, error) = fill_strided(ctx.runtime, &mut buf, settings.stride);
    let base = match error {
        None => Outcome::ok(),
        Some(e) => Outcome::failed("random_get", e),
    };
    let errno = u64::from(base.errno_code());
    base.observe("len", buf.len() as u64)
        .observe("filled", filled as u64)
        .observe("errno", errno)
        .observe("nonzero", count_nonzero(&buf[..filled]))
}

/// Fill `buf` through repeated `random_get` calls of at most `stride` bytes,
/// stopping at the first error. Returns the bytes filled and that error.
pub fn fill_strided(runtime: &dyn Runtime, buf: &mut [u8], stride: usize) -> (usize, Option<Errno>) {
    let mut filled = 0;
    for chunk in buf.chunks_mut(stride.max(1)) {
        if let Err(e) = runtime.random_get(chunk) {
            return (filled, Some(e));
        }
        filled += chunk.len();
    }
    (filled, None)
}

fn count_nonzero(buf: &[u8]) -> u64 {
    buf.iter().filter(|&&b| b != 0).count() as u64
}
