/// Runtime adapter configuration: preopens, denial posture, entropy caps.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::runtime::DenialPosture;

/// Configuration for the host-backed runtime.
///
/// The host runtime never touches paths outside `preopen_root`; everything the
/// probes create lives below it under the mapped name `preopen_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name guests use for the preopened directory.
    pub preopen_name: String,
    /// Real directory backing the preopen.
    pub preopen_root: PathBuf,
    /// Error returned for paths outside the preopen.
    pub path_denial: DenialPosture,
    /// Per-call cap on `random_get`. None = uncapped.
    pub entropy_call_cap: Option<usize>,
    /// Maximum simultaneously open descriptors.
    pub max_open_files: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            preopen_name: "caliper.dir".to_string(),
            preopen_root: std::env::temp_dir(),
            path_denial: DenialPosture::NotFound,
            entropy_call_cap: None,
            max_open_files: 64,
        }
    }
}

/// Configuration for the in-memory runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Preopened directory names (each starts empty).
    pub preopens: Vec<String>,
    pub path_denial: DenialPosture,
    /// Per-call cap on `random_get` (getentropy allows 256).
    pub entropy_call_cap: Option<usize>,
    /// Seed for the entropy source. None = seeded from the OS.
    pub seed: Option<u64>,
    /// Whether `thread_spawn` is supported.
    pub threads: bool,
    /// Resolution reported for both clocks, in nanoseconds.
    pub clock_resolution_nanos: u64,
    pub args: Vec<String>,
    /// Environment as `KEY=VALUE` entries, in presentation order.
    pub environ: Vec<String>,
    /// Whether `metadata()` publishes the runtime's capabilities.
    pub report_metadata: bool,
    pub max_open_files: usize,
    /// Largest size a file may reach; growth past it fails with EFBIG.
    pub max_file_size: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            preopens: vec!["caliper.dir".to_string()],
            path_denial: DenialPosture::NotFound,
            entropy_call_cap: Some(256),
            seed: None,
            threads: true,
            clock_resolution_nanos: 1_000,
            args: vec!["caliper".to_string()],
            environ: Vec::new(),
            report_metadata: true,
            max_open_files: 64,
            max_file_size: 16 << 20, // 16 MiB
        }
    }
}
