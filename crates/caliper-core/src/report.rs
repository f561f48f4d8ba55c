//! Run report: ordered results, summary counts, text and JSON rendering.

use caliper_contract::{Catalogue, ResolvedProfile};
use serde::Serialize;

use crate::runner::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub runtime: String,
    pub profile: ResolvedProfile,
    pub results: Vec<RunResult>,
    pub summary: Summary,
}

impl Report {
    pub fn new(runtime: &str, profile: ResolvedProfile, results: Vec<RunResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let summary = Summary {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        };
        Self {
            runtime: runtime.to_string(),
            profile,
            results,
            summary,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// 0 iff every contract passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One dotted PASS/FAIL line per contract, failure detail indented below,
    /// then the summary.
    pub fn render_text(&self) -> String {
        let width = self
            .results
            .iter()
            .map(|r| r.contract_id.len())
            .max()
            .unwrap_or(0)
            + 4;

        let mut out = format!(
            "caliper: runtime={} profile={} (from {})\n",
            self.runtime, self.profile.profile, self.profile.source
        );
        for result in &self.results {
            let status = if result.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "{} {status} ({}ms)\n",
                dotted(&result.contract_id, width),
                result.duration_ms
            ));
            if let Some(detail) = &result.detail {
                out.push_str(&format!("    {detail}\n"));
            }
        }
        out.push_str(&format!(
            "Summary: {} total, {} passed, {} failed\n",
            self.summary.total, self.summary.passed, self.summary.failed
        ));
        out
    }
}

/// `--list` output: id, applicability, variant group and probes per contract.
pub fn render_listing(catalogue: &Catalogue) -> String {
    let width = catalogue
        .contracts()
        .iter()
        .map(|c| c.id.len())
        .max()
        .unwrap_or(0)
        + 4;
    let mut out = String::new();
    for contract in catalogue.contracts() {
        let group = contract
            .variant_group
            .map(|g| format!(" [variant:{g}]"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{} {}{group}\n    {}\n    probes: {}\n",
            dotted(contract.id, width),
            contract.applicable,
            contract.title,
            contract.probes.join(", ")
        ));
    }
    out
}

fn dotted(label: &str, width: usize) -> String {
    if label.len() >= width {
        label.to_string()
    } else {
        format!("{label} {}", ".".repeat(width - label.len()))
    }
}
