//! Predicates for the built-in contracts.
//!
//! Each receives the outcomes of the contract's probes in declared order and
//! reports the expected and actual sides in report-ready form.

use caliper_probe::{Outcome, Value};
use caliper_rut::ErrorKind;

use crate::contract::{Check, CheckContext};

/// Longest list echoed verbatim in report detail.
const ECHO_LIMIT: usize = 8;

pub fn clock_resolution(outcomes: &[Outcome], _ctx: &CheckContext<'_>) -> Check {
    let passed = !outcomes.is_empty()
        && outcomes
            .iter()
            .all(|o| o.success && o.observed("res.nanos").is_some());
    let actual = each(outcomes, |o| match o.observed("res.nanos") {
        Some(n) if o.success => format!("{n}ns"),
        _ => o.summary(),
    });
    Check::new(passed, "resolution reported for both clocks", actual)
}

pub fn clock_time(outcomes: &[Outcome], _ctx: &CheckContext<'_>) -> Check {
    let non_decreasing = |o: &Outcome| {
        let ms = (o.observed("first.ms"), o.observed("second.ms"));
        let ns = (o.observed("first.nanos"), o.observed("second.nanos"));
        matches!(ms, (Some(a), Some(b)) if b >= a) && matches!(ns, (Some(a), Some(b)) if b >= a)
    };
    let passed = !outcomes.is_empty() && outcomes.iter().all(|o| o.success && non_decreasing(o));
    let actual = each(outcomes, |o| {
        if o.success {
            format!("{}ms -> {}ms", show(o.observed("first.ms")), show(o.observed("second.ms")))
        } else {
            o.summary()
        }
    });
    Check::new(
        passed,
        "two successful readings per clock, wall ms non-decreasing",
        actual,
    )
}

pub fn traversal_not_found(outcomes: &[Outcome], _ctx: &CheckContext<'_>) -> Check {
    traversal_denied(outcomes, ErrorKind::NotFound)
}

pub fn traversal_capability_denied(outcomes: &[Outcome], _ctx: &CheckContext<'_>) -> Check {
    traversal_denied(outcomes, ErrorKind::CapabilityDenied)
}

/// Every open must fail at the open itself with exactly `expected`.
fn traversal_denied(outcomes: &[Outcome], expected: ErrorKind) -> Check {
    let passed = !outcomes.is_empty()
        && outcomes.iter().all(|o| {
            !o.success
                && o.failed_step.as_deref() == Some("path_open")
                && o.error_kind == Some(expected)
        });
    let actual = each(outcomes, |o| {
        if o.success {
            return "opened".to_string();
        }
        match (o.failed_step.as_deref(), o.errno, o.error_kind) {
            (Some("path_open"), Some(errno), Some(kind)) => format!("{kind} ({})", errno.name()),
            _ => o.summary(),
        }
    });
    Check::new(
        passed,
        format!("every open fails with {expected}"),
        format!("[{actual}]"),
    )
}

pub fn truncate_grow_shrink(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    let n = ctx.settings.truncate.grow_to;
    let m = ctx.settings.truncate.shrink_to;
    let expected = format!("sizes 0/{n}/{m}, cursor 0 throughout, {m} zero bytes read back");

    let Some(out) = outcomes.first() else {
        return Check::new(false, expected, "no outcome");
    };
    if !out.success {
        return Check::new(false, expected, out.summary());
    }

    let get = |key: &str| out.observed(key);
    let cursors_zero = ["cursor.initial", "cursor.grown", "cursor.shrunk"]
        .iter()
        .all(|k| get(k) == Some(0));
    let passed = get("size.initial") == Some(0)
        && get("size.grown") == Some(n)
        && get("size.shrunk") == Some(m)
        && cursors_zero
        && get("read.len") == Some(m)
        && get("read.nonzero") == Some(0);
    let actual = format!(
        "sizes {}/{}/{}, cursors {}/{}/{}, read {} bytes ({} nonzero)",
        show(get("size.initial")),
        show(get("size.grown")),
        show(get("size.shrunk")),
        show(get("cursor.initial")),
        show(get("cursor.grown")),
        show(get("cursor.shrunk")),
        show(get("read.len")),
        show(get("read.nonzero")),
    );
    Check::new(passed, expected, actual)
}

pub fn entropy_single(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    let len = ctx.settings.entropy.single_len as u64;
    let expected = format!("{len} bytes in one call, not all zero");
    let Some(out) = outcomes.first() else {
        return Check::new(false, expected, "no outcome");
    };
    if !out.success {
        return Check::new(false, expected, out.summary());
    }
    let nonzero = out.observed("nonzero").unwrap_or(0);
    let passed = out.observed("len") == Some(len) && nonzero > 0;
    let actual = format!("{} bytes, {nonzero} nonzero", show(out.observed("len")));
    Check::new(passed, expected, actual)
}

pub fn entropy_strided(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    let settings = &ctx.settings.entropy;
    let len = settings.strided_len as u64;
    let expected = format!(
        "{len} bytes filled in strides of at most {}, error 0, not all zero",
        settings.stride
    );
    let Some(out) = outcomes.first() else {
        return Check::new(false, expected, "no outcome");
    };
    let nonzero = out.observed("nonzero").unwrap_or(0);
    let passed = out.success
        && out.observed("errno") == Some(0)
        && out.observed("filled") == Some(len)
        && nonzero > 0;
    let mut actual = format!(
        "filled {}/{len}, error {}, {nonzero} nonzero",
        show(out.observed("filled")),
        show(out.observed("errno")),
    );
    if let Some(errno) = out.errno {
        actual.push_str(&format!(" ({errno})"));
    }
    Check::new(passed, expected, actual)
}

pub fn thread_guarded_flag(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    let settings = &ctx.settings.thread;
    let expected = format!(
        "flag 0 right after spawn, 1 no earlier than {}ms and by {}ms",
        settings.sleep_ms,
        settings.sleep_ms + settings.slack_ms
    );
    let Some(out) = outcomes.first() else {
        return Check::new(false, expected, "no outcome");
    };

    let first_seen = out.observed("flag.first_seen_ms");
    let passed = out.success
        && out.observed("flag.initial") == Some(0)
        && out.observed("flag.final") == Some(1)
        && first_seen.is_some_and(|at| at >= settings.sleep_ms);
    let mut actual = format!(
        "initial {}, final {}, first seen at {}",
        show(out.observed("flag.initial")),
        show(out.observed("flag.final")),
        first_seen.map_or("never".to_string(), |at| format!("{at}ms")),
    );
    if !out.success {
        actual = format!("{actual}; {}", out.summary());
    }
    Check::new(passed, expected, actual)
}

pub fn argv_enumeration(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    mirror(outcomes, ctx.expectations.args.as_deref(), "argv", false)
}

pub fn environ_enumeration(outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
    mirror(outcomes, ctx.expectations.environ.as_deref(), "environ", true)
}

fn mirror(outcomes: &[Outcome], expected: Option<&[String]>, what: &str, key_value: bool) -> Check {
    let expected_text = match expected {
        Some(list) => format!("{what} {}, sizes matching *_sizes_get", echo(list)),
        None if key_value => format!("{what} complete as KEY=VALUE, sizes matching *_sizes_get"),
        None => format!("{what} complete, sizes matching *_sizes_get"),
    };
    let Some(out) = outcomes.first() else {
        return Check::new(false, expected_text, "no outcome");
    };
    let entries: &[String] = match &out.returned_value {
        Some(Value::Strings(list)) => list,
        _ => return Check::new(false, expected_text, out.summary()),
    };

    let sizes_match = out.observed("count") == out.observed("reported.count")
        && out.observed("buf_size") == out.observed("reported.buf_size");
    let well_formed = !key_value || out.observed("malformed") == Some(0);
    let matches = expected.map_or(true, |list| list == entries);

    let mut actual = format!(
        "{}, count {} (reported {}), buffer {} (reported {})",
        echo(entries),
        show(out.observed("count")),
        show(out.observed("reported.count")),
        show(out.observed("buf_size")),
        show(out.observed("reported.buf_size")),
    );
    if !well_formed {
        actual.push_str(&format!(", {} malformed", show(out.observed("malformed"))));
    }
    Check::new(out.success && sizes_match && well_formed && matches, expected_text, actual)
}

fn each(outcomes: &[Outcome], render: impl Fn(&Outcome) -> String) -> String {
    if outcomes.is_empty() {
        return "no outcomes".to_string();
    }
    outcomes.iter().map(render).collect::<Vec<_>>().join(", ")
}

fn show(value: Option<u64>) -> String {
    value.map_or("?".to_string(), |v| v.to_string())
}

fn echo(list: &[String]) -> String {
    if list.len() <= ECHO_LIMIT {
        format!("{list:?}")
    } else {
        format!("<{} entries>", list.len())
    }
}
