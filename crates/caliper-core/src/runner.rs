//! Sequential contract execution with per-probe panic isolation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use caliper_contract::{CheckContext, Contract, Expectations, Profile};
use caliper_probe::{ProbeContext, ProbeRegistry, ProbeSettings};
use caliper_rut::Runtime;
use serde::Serialize;

/// The verdict for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub contract_id: String,
    pub title: String,
    pub passed: bool,
    /// Expected-vs-actual text for failures, panic payload for crashes.
    pub detail: Option<String>,
    pub duration_ms: u64,
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub struct Runner<'a> {
    runtime: &'a dyn Runtime,
    registry: &'a ProbeRegistry,
    preopen: &'a str,
    settings: &'a ProbeSettings,
    expectations: &'a Expectations,
}

impl<'a> Runner<'a> {
    pub fn new(
        runtime: &'a dyn Runtime,
        registry: &'a ProbeRegistry,
        preopen: &'a str,
        settings: &'a ProbeSettings,
        expectations: &'a Expectations,
    ) -> Self {
        Self {
            runtime,
            registry,
            preopen,
            settings,
            expectations,
        }
    }

    /// Run `contracts` left to right. One result per contract, always.
    pub fn run_all(&self, contracts: &[&Contract], profile: Profile) -> Vec<RunResult> {
        contracts
            .iter()
            .map(|contract| self.run_contract(contract, profile))
            .collect()
    }

    pub fn run_contract(&self, contract: &Contract, profile: Profile) -> RunResult {
        let started = Instant::now();
        let verdict = self.evaluate(contract, profile);
        let passed = verdict.is_ok();
        if passed {
            log::info!("PASS {}", contract.id);
        } else {
            log::info!("FAIL {}", contract.id);
        }
        RunResult {
            contract_id: contract.id.to_string(),
            title: contract.title.to_string(),
            passed,
            detail: verdict.err(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Ok on pass, Err(detail) on failure.
    fn evaluate(&self, contract: &Contract, profile: Profile) -> Result<(), String> {
        let scope = format!("{}/{}", self.preopen, contract.id);
        let probe_ctx = ProbeContext {
            runtime: self.runtime,
            preopen: self.preopen,
            scope: &scope,
            settings: self.settings,
        };

        let mut outcomes = Vec::with_capacity(contract.probes.len());
        for name in contract.probes {
            let probe = self
                .registry
                .get(name)
                .ok_or_else(|| format!("unknown probe {name}"))?;
            let outcome = catch_unwind(AssertUnwindSafe(|| probe.run(&probe_ctx))).map_err(|payload| {
                format!("probe {name} panicked: {}", panic_payload_to_string(payload.as_ref()))
            })?;
            outcomes.push(outcome);
        }

        let check_ctx = CheckContext {
            profile,
            settings: self.settings,
            expectations: self.expectations,
        };
        let check = catch_unwind(AssertUnwindSafe(|| contract.evaluate(&outcomes, &check_ctx)))
            .map_err(|payload| {
                format!("predicate panicked: {}", panic_payload_to_string(payload.as_ref()))
            })?;

        if check.passed {
            Ok(())
        } else {
            Err(contract.render_failure(&check))
        }
    }
}
