use std::collections::BTreeMap;

use caliper_rut::{Errno, ErrorKind};
use serde::Serialize;

/// Value a probe hands back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    UInt(u64),
    Bytes(Vec<u8>),
    Strings(Vec<String>),
}

/// The captured result of one probe invocation.
///
/// Built fresh by each invocation and never changed once returned.
/// `observed_state` holds named numeric observations (sizes, cursors,
/// timestamps, counts) in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub returned_value: Option<Value>,
    pub error_kind: Option<ErrorKind>,
    pub errno: Option<Errno>,
    /// Name of the step that failed, for multi-step probes.
    pub failed_step: Option<String>,
    pub observed_state: BTreeMap<String, u64>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            returned_value: None,
            error_kind: None,
            errno: None,
            failed_step: None,
            observed_state: BTreeMap::new(),
        }
    }

    /// A RUT call at `step` returned `errno`.
    pub fn failed(step: &str, errno: Errno) -> Self {
        Self {
            success: false,
            returned_value: None,
            error_kind: Some(errno.kind()),
            errno: Some(errno),
            failed_step: Some(step.to_string()),
            observed_state: BTreeMap::new(),
        }
    }

    /// The probe could not finish `step`, but no errno was involved
    /// (a worker that never signalled, for instance).
    pub fn incomplete(step: &str) -> Self {
        Self {
            success: false,
            returned_value: None,
            error_kind: None,
            errno: None,
            failed_step: Some(step.to_string()),
            observed_state: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.returned_value = Some(value);
        self
    }

    pub fn observe(mut self, key: &str, value: u64) -> Self {
        self.record(key, value);
        self
    }

    /// Carry observations made before a failure into the failed outcome.
    pub fn with_observations(mut self, observed: BTreeMap<String, u64>) -> Self {
        self.observed_state.extend(observed);
        self
    }

    pub fn record(&mut self, key: &str, value: u64) {
        self.observed_state.insert(key.to_string(), value);
    }

    pub fn observed(&self, key: &str) -> Option<u64> {
        self.observed_state.get(key).copied()
    }

    /// The errno's numeric code, 0 when the outcome carries none.
    pub fn errno_code(&self) -> u16 {
        self.errno.map_or(0, Errno::code)
    }

    /// One-line rendering used in failure detail, e.g.
    /// `failed at path_open: ENOENT (44) No such file or directory.`
    pub fn summary(&self) -> String {
        match (self.success, &self.failed_step, self.errno) {
            (true, _, _) => "succeeded".to_string(),
            (false, Some(step), Some(errno)) => format!("failed at {step}: {errno}"),
            (false, Some(step), None) => format!("failed at {step}"),
            (false, None, Some(errno)) => format!("failed: {errno}"),
            (false, None, None) => "failed".to_string(),
        }
    }
}

/// Saturating `u128 -> u64` for nanosecond counts.
pub(crate) fn clamp_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
