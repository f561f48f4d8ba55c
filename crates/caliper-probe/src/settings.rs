//! Tunables for the probes. Defaults match the fixture programs the
//! catalogue was derived from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub clock: ClockSettings,
    pub truncate: TruncateSettings,
    pub entropy: EntropySettings,
    pub thread: ThreadSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Upper bound on waiting for a second monotonic reading to advance.
    pub progress_wait_ms: u64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            progress_wait_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncateSettings {
    pub grow_to: u64,
    pub shrink_to: u64,
}

impl Default for TruncateSettings {
    fn default() -> Self {
        Self {
            grow_to: 500,
            shrink_to: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropySettings {
    /// Size of the one-shot request (getentropy's maximum).
    pub single_len: usize,
    /// Largest chunk requested per call by the strided fill.
    pub stride: usize,
    pub strided_len: usize,
}

impl Default for EntropySettings {
    fn default() -> Self {
        Self {
            single_len: 256,
            stride: 256,
            strided_len: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadSettings {
    /// How long the worker sleeps before setting the flag.
    pub sleep_ms: u64,
    /// Extra time the reader keeps polling past `sleep_ms`.
    pub slack_ms: u64,
    pub poll_ms: u64,
}

impl Default for ThreadSettings {
    fn default() -> Self {
        Self {
            sleep_ms: 1000,
            slack_ms: 500,
            poll_ms: 100,
        }
    }
}
