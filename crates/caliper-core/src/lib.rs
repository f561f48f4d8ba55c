//! Harness entry points: build the runtime a config asks for, resolve the
//! profile, run the active catalogue, and hand back a report.

pub mod config;
pub mod report;
pub mod runner;

use caliper_contract::{resolve_profile, Catalogue, CatalogueError, Contract, ResolveError};
use caliper_probe::{ProbeRegistry, ProbeSettings};
use caliper_rut::config::HostConfig;
use caliper_rut::host::HostRuntime;
use caliper_rut::memory::MemoryRuntime;
use caliper_rut::runtime::RuntimeMetadata;
use caliper_rut::{Errno, Runtime};

use crate::config::{ConfigError, HarnessConfig, RuntimeKind};
use crate::report::Report;
use crate::runner::Runner;

pub use crate::report::Summary;
pub use crate::runner::RunResult;

/// Conditions that stop a run before any contract executes.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Catalogue validation failed: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("Cannot allocate scratch root: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Runtime setup failed: {0}")]
    Runtime(Errno),
}

/// Run the harness against the runtime `config` selects.
///
/// Host runs get a fresh temporary preopen root that is removed when the
/// run finishes.
pub fn run(config: &HarnessConfig) -> Result<Report, HarnessError> {
    config.validate()?;
    match config.runtime {
        RuntimeKind::Host => {
            let mut builder = tempfile::Builder::new();
            builder.prefix("caliper-");
            let scratch = match &config.host.scratch_parent {
                Some(parent) => builder.tempdir_in(parent),
                None => builder.tempdir(),
            }
            .map_err(HarnessError::Scratch)?;
            log::debug!("scratch root: {}", scratch.path().display());

            let host = HostConfig {
                preopen_name: config.preopen.clone(),
                preopen_root: scratch.path().to_path_buf(),
                path_denial: config.host.path_denial,
                entropy_call_cap: config.host.entropy_call_cap,
                max_open_files: config.host.max_open_files,
            };
            let mut runtime = HostRuntime::new(&host).map_err(HarnessError::Runtime)?;
            if config.host.args.is_some() || config.host.environ.is_some() {
                let args = config.host.args.clone().unwrap_or_else(|| runtime.args_get());
                let environ = config
                    .host
                    .environ
                    .clone()
                    .unwrap_or_else(|| runtime.environ_get());
                runtime = runtime.with_process_view(args, environ);
            }
            run_with_runtime(&runtime, config)
        }
        RuntimeKind::Memory => {
            let mut memory = config.memory.clone();
            if !memory.preopens.contains(&config.preopen) {
                memory.preopens.push(config.preopen.clone());
            }
            let runtime = MemoryRuntime::new(&memory).map_err(HarnessError::Runtime)?;
            run_with_runtime(&runtime, config)
        }
    }
}

/// Run the active catalogue against an already-built runtime.
pub fn run_with_runtime(runtime: &dyn Runtime, config: &HarnessConfig) -> Result<Report, HarnessError> {
    let registry = ProbeRegistry::builtin();
    let catalogue = Catalogue::builtin();
    catalogue.validate(&registry)?;

    let metadata = config.metadata.clone().or_else(|| runtime.metadata());
    let resolved = resolve_profile(metadata.as_ref(), config.profile)?;
    if let Some(meta) = &metadata {
        for warning in capability_warnings(meta, &config.probes) {
            log::warn!("{warning}");
        }
    }

    let active: Vec<&Contract> = catalogue
        .active(resolved.profile)
        .into_iter()
        .filter(|c| config.selects(c.id))
        .collect();
    if active.is_empty() {
        log::warn!("no active contract matches {:?}", config.only);
    }
    log::info!(
        "running {} contracts against {} ({})",
        active.len(),
        runtime.name(),
        resolved.profile
    );

    let runner = Runner::new(runtime, &registry, &config.preopen, &config.probes, &config.expect);
    let results = runner.run_all(&active, resolved.profile);
    Ok(Report::new(runtime.name(), resolved, results))
}

/// Contracts the runtime's self-reported capabilities already rule out under
/// `settings`. The contracts still run; these only explain the failures ahead.
pub fn capability_warnings(metadata: &RuntimeMetadata, settings: &ProbeSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(cap) = metadata.entropy_call_cap {
        let entropy = &settings.entropy;
        if entropy.single_len > cap {
            warnings.push(format!(
                "{} caps random_get at {cap} bytes; entropy.single requests {}",
                metadata.name, entropy.single_len
            ));
        }
        if entropy.stride > cap {
            warnings.push(format!(
                "{} caps random_get at {cap} bytes; entropy.strided uses stride {}",
                metadata.name, entropy.stride
            ));
        }
    }
    if !metadata.threads {
        warnings.push(format!(
            "{} reports no thread support; thread.guarded-flag cannot pass",
            metadata.name
        ));
    }
    warnings
}
