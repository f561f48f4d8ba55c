//! Harness configuration.
//!
//! Every section has defaults, so an empty JSON object is a valid config.
//! The CLI layers its flags on top of whatever the file provides.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use caliper_contract::{Expectations, Profile};
use caliper_probe::ProbeSettings;
use caliper_rut::config::MemoryConfig;
use caliper_rut::path::validate_preopen_name;
use caliper_rut::runtime::{DenialPosture, RuntimeMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Which runtime adapter the harness drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    #[default]
    Host,
    Memory,
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Self::Host),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid(format!(
                "unknown runtime '{other}' (expected 'host' or 'memory')"
            ))),
        }
    }
}

/// Settings for the host runtime. The preopen root itself is always a fresh
/// temporary directory; only its parent is configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Where the per-run scratch root is created. None = system temp dir.
    pub scratch_parent: Option<PathBuf>,
    pub path_denial: DenialPosture,
    pub entropy_call_cap: Option<usize>,
    pub max_open_files: usize,
    /// argv presented to probes instead of the harness process's own.
    pub args: Option<Vec<String>>,
    /// environ presented to probes instead of the harness process's own.
    pub environ: Option<Vec<String>>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            scratch_parent: None,
            path_denial: DenialPosture::NotFound,
            entropy_call_cap: None,
            max_open_files: 64,
            args: None,
            environ: None,
        }
    }
}

/// Largest file the truncate contract may grow.
pub const MAX_TRUNCATE_SIZE: u64 = 64 << 20;

/// Largest buffer an entropy contract may request.
pub const MAX_ENTROPY_LEN: usize = 1 << 20;

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub runtime: RuntimeKind,
    /// Operator's profile flag. Runtime metadata, when present, must agree.
    pub profile: Option<Profile>,
    /// Name of the preopened directory probes work under.
    pub preopen: String,
    pub probes: ProbeSettings,
    pub expect: Expectations,
    pub host: HostSection,
    pub memory: MemoryConfig,
    /// Out-of-band runtime metadata; replaces whatever the runtime reports.
    pub metadata: Option<RuntimeMetadata>,
    /// Contract id prefixes to run. Empty = all active contracts.
    pub only: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::Host,
            profile: None,
            preopen: "caliper.dir".to_string(),
            probes: ProbeSettings::default(),
            expect: Expectations::default(),
            host: HostSection::default(),
            memory: MemoryConfig::default(),
            metadata: None,
            only: Vec::new(),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject settings no run could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_preopen_name(&self.preopen).map_err(|e| {
            ConfigError::Invalid(format!("preopen name '{}': {e}", self.preopen))
        })?;

        let p = &self.probes;
        if p.truncate.shrink_to > p.truncate.grow_to {
            return Err(ConfigError::Invalid(format!(
                "truncate.shrink_to ({}) exceeds truncate.grow_to ({})",
                p.truncate.shrink_to, p.truncate.grow_to
            )));
        }
        if p.truncate.grow_to > MAX_TRUNCATE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "truncate.grow_to ({}) exceeds {MAX_TRUNCATE_SIZE}",
                p.truncate.grow_to
            )));
        }
        if p.entropy.stride == 0 || p.entropy.single_len == 0 || p.entropy.strided_len == 0 {
            return Err(ConfigError::Invalid(
                "entropy sizes and stride must be non-zero".to_string(),
            ));
        }
        if p.entropy.single_len.max(p.entropy.strided_len) > MAX_ENTROPY_LEN {
            return Err(ConfigError::Invalid(format!(
                "entropy lengths must not exceed {MAX_ENTROPY_LEN}"
            )));
        }
        if p.thread.poll_ms == 0 {
            return Err(ConfigError::Invalid("thread.poll_ms must be non-zero".to_string()));
        }
        // The last poll lands at the deadline; slack keeps it clear of the write.
        if p.thread.slack_ms < p.thread.poll_ms {
            return Err(ConfigError::Invalid(format!(
                "thread.slack_ms ({}) is below thread.poll_ms ({})",
                p.thread.slack_ms, p.thread.poll_ms
            )));
        }
        if self.host.max_open_files == 0 || self.memory.max_open_files == 0 {
            return Err(ConfigError::Invalid("max_open_files must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Whether `id` passes the `only` filter.
    pub fn selects(&self, id: &str) -> bool {
        self.only.is_empty() || self.only.iter().any(|prefix| id.starts_with(prefix.as_str()))
    }
}
