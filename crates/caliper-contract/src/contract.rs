use std::fmt;

use caliper_probe::{Outcome, ProbeSettings};
use serde::{Deserialize, Serialize};

use crate::profile::{Applicability, Profile};

/// Operator-supplied argv/environ the mirrors must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectations {
    pub args: Option<Vec<String>>,
    pub environ: Option<Vec<String>>,
}

/// What a predicate may consult besides the outcomes.
pub struct CheckContext<'a> {
    pub profile: Profile,
    pub settings: &'a ProbeSettings,
    pub expectations: &'a Expectations,
}

/// A predicate's verdict, with both sides spelled out for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl Check {
    pub fn new(passed: bool, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            passed,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Receives one outcome per probe, in the contract's declared order.
pub type Predicate = fn(&[Outcome], &CheckContext<'_>) -> Check;

/// A named, declarative assertion over probe outcomes.
#[derive(Clone, Copy)]
pub struct Contract {
    pub id: &'static str,
    pub title: &'static str,
    pub applicable: Applicability,
    /// Contracts covering the same scenario with profile-specific
    /// expectations share a group; exactly one is active per run.
    pub variant_group: Option<&'static str>,
    pub probes: &'static [&'static str],
    pub predicate: Predicate,
    /// Rendered on failure; `{expected}` and `{actual}` are substituted.
    pub failure_message: &'static str,
}

impl Contract {
    pub fn evaluate(&self, outcomes: &[Outcome], ctx: &CheckContext<'_>) -> Check {
        (self.predicate)(outcomes, ctx)
    }

    pub fn render_failure(&self, check: &Check) -> String {
        self.failure_message
            .replace("{expected}", &check.expected)
            .replace("{actual}", &check.actual)
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("id", &self.id)
            .field("applicable", &self.applicable)
            .field("variant_group", &self.variant_group)
            .field("probes", &self.probes)
            .finish_non_exhaustive()
    }
}
