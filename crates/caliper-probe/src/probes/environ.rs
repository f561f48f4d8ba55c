//! argv/environ mirrors: the lists as presented, plus the self-reported sizes.

use caliper_rut::runtime::sizes_of;

use crate::outcome::{Outcome, Value};
use crate::probe::ProbeContext;

/// Observed keys: `count`, `buf_size` (computed from the list),
/// `reported.count`, `reported.buf_size` (from `args_sizes_get`).
pub fn argv(ctx: &ProbeContext<'_>) -> Outcome {
    let args = ctx.runtime.args_get();
    let reported = ctx.runtime.args_sizes_get();
    mirror(args, reported)
}

/// Like [`argv`], plus `malformed`: entries without a `=`.
pub fn environ(ctx: &ProbeContext<'_>) -> Outcome {
    let vars = ctx.runtime.environ_get();
    let reported = ctx.runtime.environ_sizes_get();
    let malformed = vars.iter().filter(|v| !v.contains('=')).count();
    mirror(vars, reported).observe("malformed", malformed as u64)
}

fn mirror(entries: Vec<String>, reported: (usize, usize)) -> Outcome {
    let (count, buf_size) = sizes_of(&entries);
    Outcome::ok()
        .observe("count", count as u64)
        .observe("buf_size", buf_size as u64)
        .observe("reported.count", reported.0 as u64)
        .observe("reported.buf_size", reported.1 as u64)
        .with_value(Value::Strings(entries))
}
