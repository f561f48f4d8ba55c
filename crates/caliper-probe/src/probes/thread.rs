//! A worker sets a mutex-guarded flag after a delay; the probe watches it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use caliper_rut::thread::WaitStatus;

use crate::outcome::Outcome;
use crate::probe::ProbeContext;

/// An integer flag shared between the probe and its worker. Every read and
/// write goes through the mutex.
#[derive(Debug, Clone, Default)]
pub struct SharedFlag(Arc<Mutex<i32>>);

impl SharedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i32 {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, value: i32) {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

/// Observed keys: `flag.initial`, `flag.final`, `flag.first_seen_ms` (when the
/// flag was ever seen set), `sleep_ms`, `deadline_ms`.
pub fn guarded_flag(ctx: &ProbeContext<'_>) -> Outcome {
    let settings = &ctx.settings.thread;
    let sleep = Duration::from_millis(settings.sleep_ms);
    let deadline = sleep + Duration::from_millis(settings.slack_ms);
    let poll = Duration::from_millis(settings.poll_ms.max(1));

    let flag = SharedFlag::new();
    let writer = flag.clone();
    let started = Instant::now();
    let handle = match ctx.runtime.thread_spawn(Box::new(move || {
        std::thread::sleep(sleep);
        writer.set(1);
    })) {
        Ok(h) => h,
        Err(e) => return Outcome::failed("thread_spawn", e),
    };

    let initial = flag.get();
    let mut first_seen = None;
    loop {
        let elapsed = started.elapsed();
        if first_seen.is_none() && flag.get() == 1 {
            first_seen = Some(elapsed);
        }
        if elapsed >= deadline {
            break;
        }
        std::thread::sleep(poll.min(deadline - elapsed));
    }
    let last = flag.get();

    let mut out = Outcome::ok()
        .observe("flag.initial", initial as u64)
        .observe("flag.final", last as u64)
        .observe("sleep_ms", settings.sleep_ms)
        .observe("deadline_ms", deadline.as_millis() as u64);
    if let Some(at) = first_seen {
        out.record("flag.first_seen_ms", at.as_millis() as u64);
    }

    let status = handle.wait_timeout(Duration::from_millis(settings.slack_ms.max(settings.poll_ms)));
    match status {
        WaitStatus::Finished => match handle.join() {
            Ok(()) => out,
            Err(e) => Outcome::failed("join", e).with_observations(out.observed_state),
        },
        WaitStatus::Aborted => {
            Outcome::incomplete("worker aborted").with_observations(out.observed_state)
        }
        WaitStatus::TimedOut => {
            log::warn!("thread worker still running after bounded wait; detaching");
            Outcome::incomplete("join timed out").with_observations(out.observed_state)
        }
    }
}
