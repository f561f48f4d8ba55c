use std::collections::{BTreeMap, HashSet};

use caliper_probe::ProbeRegistry;

use crate::contract::Contract;
use crate::predicates;
use crate::profile::{Applicability, Profile};

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("Duplicate contract id: {0}")]
    DuplicateId(String),

    #[error("Contract {0} uses no probes")]
    NoProbes(String),

    #[error("Contract {contract} uses unknown probe {probe}")]
    UnknownProbe { contract: String, probe: String },

    #[error("Variant group {group} has no contract for profile {profile}")]
    VariantGap { group: String, profile: Profile },

    #[error("Variant group {group} has {count} contracts for profile {profile}")]
    VariantOverlap {
        group: String,
        profile: Profile,
        count: usize,
    },
}

const CLOCK_RES: &[&str] = &["clock.res.monotonic", "clock.res.realtime"];
const CLOCK_TIME: &[&str] = &["clock.time.monotonic", "clock.time.realtime"];
const FILE_OPEN: &[&str] = &[
    "fileopen.missing-parent",
    "fileopen.parent-token",
    "fileopen.sibling-escape",
];

/// The ordered set of contracts, fixed at startup.
#[derive(Debug, Clone)]
pub struct Catalogue {
    contracts: Vec<Contract>,
}

impl Catalogue {
    pub fn new(contracts: Vec<Contract>) -> Self {
        Self { contracts }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Contract {
                id: "clock.resolution",
                title: "Clock resolution is reported for both clocks",
                applicable: Applicability::Any,
                variant_group: None,
                probes: CLOCK_RES,
                predicate: predicates::clock_resolution,
                failure_message: "clock resolution: expected {expected}, got {actual}",
            },
            Contract {
                id: "clock.time",
                title: "Clock readings succeed and never go backwards",
                applicable: Applicability::Any,
                variant_group: None,
                probes: CLOCK_TIME,
                predicate: predicates::clock_time,
                failure_message: "clock time: expected {expected}, got {actual}",
            },
            Contract {
                id: "fileopen.traversal.posix",
                title: "Opens outside the preopen fail as missing",
                applicable: Applicability::Posix,
                variant_group: Some("fileopen.traversal"),
                probes: FILE_OPEN,
                predicate: predicates::traversal_not_found,
                failure_message: "traversal: expected {expected}, got {actual}",
            },
            Contract {
                id: "fileopen.traversal.capability",
                title: "Opens outside the preopen fail as not capable",
                applicable: Applicability::CapabilitySandboxed,
                variant_group: Some("fileopen.traversal"),
                probes: FILE_OPEN,
                predicate: predicates::traversal_capability_denied,
                failure_message: "traversal: expected {expected}, got {actual}",
            },
            Contract {
                id: "truncate.grow-shrink",
                title: "Resizing grows zero-filled, shrinks, and keeps the cursor",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["truncate.grow-shrink"],
                predicate: predicates::truncate_grow_shrink,
                failure_message: "truncate: expected {expected}, got {actual}",
            },
            Contract {
                id: "entropy.single",
                title: "A 256-byte entropy request succeeds",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["entropy.single"],
                predicate: predicates::entropy_single,
                failure_message: "entropy: expected {expected}, got {actual}",
            },
            Contract {
                id: "entropy.strided",
                title: "A strided entropy fill covers the whole buffer",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["entropy.strided"],
                predicate: predicates::entropy_strided,
                failure_message: "strided entropy: expected {expected}, got {actual}",
            },
            Contract {
                id: "thread.guarded-flag",
                title: "A worker's guarded write becomes visible after its sleep",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["thread.guarded-flag"],
                predicate: predicates::thread_guarded_flag,
                failure_message: "thread flag: expected {expected}, got {actual}",
            },
            Contract {
                id: "argv.enumeration",
                title: "argv is presented completely and in order",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["argv.enumeration"],
                predicate: predicates::argv_enumeration,
                failure_message: "argv: expected {expected}, got {actual}",
            },
            Contract {
                id: "environ.enumeration",
                title: "environ is presented completely, as KEY=VALUE, in order",
                applicable: Applicability::Any,
                variant_group: None,
                probes: &["environ.enumeration"],
                predicate: predicates::environ_enumeration,
                failure_message: "environ: expected {expected}, got {actual}",
            },
        ])
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn get(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Check ids, probe references, and that every variant group has exactly
    /// one contract per profile.
    pub fn validate(&self, registry: &ProbeRegistry) -> Result<(), CatalogueError> {
        let mut seen = HashSet::new();
        let mut groups: BTreeMap<&str, Vec<&Contract>> = BTreeMap::new();

        for contract in &self.contracts {
            if !seen.insert(contract.id) {
                return Err(CatalogueError::DuplicateId(contract.id.to_string()));
            }
            if contract.probes.is_empty() {
                return Err(CatalogueError::NoProbes(contract.id.to_string()));
            }
            if let Some(probe) = contract.probes.iter().find(|p| !registry.contains(p)) {
                return Err(CatalogueError::UnknownProbe {
                    contract: contract.id.to_string(),
                    probe: probe.to_string(),
                });
            }
            if let Some(group) = contract.variant_group {
                groups.entry(group).or_default().push(contract);
            }
        }

        for (group, members) in groups {
            for profile in Profile::ALL {
                let count = members
                    .iter()
                    .filter(|c| c.applicable.applies_to(profile))
                    .count();
                match count {
                    1 => {}
                    0 => {
                        return Err(CatalogueError::VariantGap {
                            group: group.to_string(),
                            profile,
                        })
                    }
                    _ => {
                        return Err(CatalogueError::VariantOverlap {
                            group: group.to_string(),
                            profile,
                            count,
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Contracts that apply to `profile`, in catalogue order.
    pub fn active(&self, profile: Profile) -> Vec<&Contract> {
        self.contracts
            .iter()
            .filter(|c| c.applicable.applies_to(profile))
            .collect()
    }
}
