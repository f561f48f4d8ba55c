//! Capability profiles and the resolver that picks one per run.
//!
//! The resolver never probes the runtime. It reads the runtime's
//! self-reported path-denial posture and the operator's flag, and refuses to
//! guess when the two disagree.

use std::fmt;
use std::str::FromStr;

use caliper_rut::runtime::{DenialPosture, RuntimeMetadata};
use caliper_rut::ErrorKind;
use serde::{Deserialize, Serialize};

/// Which family of directory-open behavior the runtime promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Paths outside the preopen do not exist (`ENOENT`).
    Posix,
    /// Paths outside the preopen were never granted (`ENOTCAPABLE`).
    CapabilitySandboxed,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Posix, Profile::CapabilitySandboxed];

    pub fn from_posture(posture: DenialPosture) -> Self {
        match posture {
            DenialPosture::NotFound => Self::Posix,
            DenialPosture::NotCapable => Self::CapabilitySandboxed,
        }
    }

    /// Error kind every escaping open must produce under this profile.
    pub fn expected_denial(self) -> ErrorKind {
        match self {
            Self::Posix => ErrorKind::NotFound,
            Self::CapabilitySandboxed => ErrorKind::CapabilityDenied,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::CapabilitySandboxed => "capability-sandboxed",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown profile '{0}' (expected 'posix' or 'capability-sandboxed')")]
pub struct ParseProfileError(String);

impl FromStr for Profile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "posix" => Ok(Self::Posix),
            "capability-sandboxed" | "capability" | "sandboxed" => Ok(Self::CapabilitySandboxed),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

/// Which profiles a contract applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Applicability {
    Posix,
    CapabilitySandboxed,
    Any,
}

impl Applicability {
    pub fn applies_to(self, profile: Profile) -> bool {
        match self {
            Self::Any => true,
            Self::Posix => profile == Profile::Posix,
            Self::CapabilitySandboxed => profile == Profile::CapabilitySandboxed,
        }
    }
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Posix => "posix",
            Self::CapabilitySandboxed => "capability-sandboxed",
            Self::Any => "any",
        };
        f.write_str(s)
    }
}

/// Where the resolved profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Metadata,
    Operator,
    Default,
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Metadata => "runtime metadata",
            Self::Operator => "operator flag",
            Self::Default => "default",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedProfile {
    pub profile: Profile,
    pub source: ProfileSource,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Profile conflict: runtime metadata reports {metadata}, operator requested {operator}")]
    Conflict { metadata: Profile, operator: Profile },
}

/// Metadata wins; metadata and flag that disagree are a misconfiguration;
/// with neither, `Posix`.
pub fn resolve_profile(
    metadata: Option<&RuntimeMetadata>,
    operator: Option<Profile>,
) -> Result<ResolvedProfile, ResolveError> {
    let reported = metadata
        .and_then(|m| m.path_denial)
        .map(Profile::from_posture);

    let resolved = match (reported, operator) {
        (Some(metadata), Some(operator)) if metadata != operator => {
            return Err(ResolveError::Conflict { metadata, operator });
        }
        (Some(profile), _) => ResolvedProfile {
            profile,
            source: ProfileSource::Metadata,
        },
        (None, Some(profile)) => ResolvedProfile {
            profile,
            source: ProfileSource::Operator,
        },
        (None, None) => ResolvedProfile {
            profile: Profile::Posix,
            source: ProfileSource::Default,
        },
    };
    log::info!("profile: {} (from {})", resolved.profile, resolved.source);
    Ok(resolved)
}
