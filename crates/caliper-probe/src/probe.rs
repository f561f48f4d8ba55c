use std::fmt;

use caliper_rut::Runtime;
use serde::Serialize;

use crate::outcome::Outcome;
use crate::settings::ProbeSettings;

/// The RUT surface a probe exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Clock,
    FileOpen,
    Truncate,
    Entropy,
    Thread,
    EnvironMirror,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clock => "Clock",
            Self::FileOpen => "FileOpen",
            Self::Truncate => "Truncate",
            Self::Entropy => "Entropy",
            Self::Thread => "Thread",
            Self::EnvironMirror => "EnvironMirror",
        };
        f.write_str(s)
    }
}

/// Everything a probe may touch during one invocation.
pub struct ProbeContext<'a> {
    pub runtime: &'a dyn Runtime,
    /// Name of the preopened directory probes work under.
    pub preopen: &'a str,
    /// Private scope path for the running contract, `<preopen>/<contract-id>`.
    pub scope: &'a str,
    pub settings: &'a ProbeSettings,
}

pub type ProbeFn = fn(&ProbeContext<'_>) -> Outcome;

/// A named, registered operation (or short fixed sequence) against the RUT.
///
/// `invoke` turns every RUT failure into the returned `Outcome`; it never
/// propagates errors.
#[derive(Clone, Copy)]
pub struct Probe {
    pub name: &'static str,
    pub capability: Capability,
    pub invoke: ProbeFn,
}

impl Probe {
    pub fn run(&self, ctx: &ProbeContext<'_>) -> Outcome {
        log::debug!("probe {} ({}) in {}", self.name, self.capability, ctx.scope);
        let outcome = (self.invoke)(ctx);
        log::debug!("probe {} -> {}", self.name, outcome.summary());
        outcome
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}
