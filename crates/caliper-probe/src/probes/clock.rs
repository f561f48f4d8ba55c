//! Clock probes: resolution and two sequential readings per clock.

use std::time::{Duration, Instant};

use caliper_rut::runtime::{ClockKind, Timespec};

use crate::outcome::{clamp_u64, Outcome, Value};
use crate::probe::ProbeContext;

pub fn res_monotonic(ctx: &ProbeContext<'_>) -> Outcome {
    resolution(ctx, ClockKind::Monotonic)
}

pub fn res_realtime(ctx: &ProbeContext<'_>) -> Outcome {
    resolution(ctx, ClockKind::Realtime)
}

pub fn time_monotonic(ctx: &ProbeContext<'_>) -> Outcome {
    let wait = Duration::from_millis(ctx.settings.clock.progress_wait_ms);
    two_readings(ctx, ClockKind::Monotonic, wait)
}

pub fn time_realtime(ctx: &ProbeContext<'_>) -> Outcome {
    two_readings(ctx, ClockKind::Realtime, Duration::ZERO)
}

fn resolution(ctx: &ProbeContext<'_>, clock: ClockKind) -> Outcome {
    match ctx.runtime.clock_res_get(clock) {
        Ok(res) => {
            let nanos = clamp_u64(res.as_nanos());
            Outcome::ok()
                .with_value(Value::UInt(nanos))
                .observe("res.nanos", nanos)
        }
        Err(e) => Outcome::failed("clock_res_get", e),
    }
}

/// Take a reading, then a second one. With a non-zero `wait`, keep re-reading
/// (up to `wait`) until the second value moves past the first.
fn two_readings(ctx: &ProbeContext<'_>, clock: ClockKind, wait: Duration) -> Outcome {
    let first = match ctx.runtime.clock_time_get(clock) {
        Ok(t) => t,
        Err(e) => return Outcome::failed("clock_time_get", e),
    };

    let started = Instant::now();
    let second = loop {
        let t = match ctx.runtime.clock_time_get(clock) {
            Ok(t) => t,
            Err(e) => return observe(Outcome::failed("clock_time_get", e), "first", first),
        };
        if t > first || started.elapsed() >= wait {
            break t;
        }
        std::thread::sleep(Duration::from_millis(1));
    };

    let out = observe(Outcome::ok(), "first", first);
    observe(out, "second", second).observe("advanced", u64::from(second > first))
}

fn observe(out: Outcome, prefix: &str, t: Timespec) -> Outcome {
    out.observe(&format!("{prefix}.ms"), t.as_millis())
        .observe(&format!("{prefix}.nanos"), clamp_u64(t.as_nanos()))
}
