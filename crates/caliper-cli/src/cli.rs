use std::path::PathBuf;

use anyhow::{Context, Result};
use caliper_contract::{Catalogue, Profile};
use caliper_core::config::{HarnessConfig, RuntimeKind};
use caliper_core::report::render_listing;
use caliper_rut::runtime::RuntimeMetadata;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Run the conformance catalogue against a runtime and report per contract.
#[derive(Parser)]
#[command(name = "caliper", author, version, about, long_about = None)]
struct Cli {
    /// Harness config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Runtime adapter: host or memory
    #[arg(long)]
    runtime: Option<RuntimeKind>,
    /// Operator profile: posix or capability-sandboxed
    #[arg(long)]
    profile: Option<Profile>,
    /// Runtime metadata file (JSON), for runtimes that report out of band
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// Only run contracts whose id starts with this prefix (repeatable)
    #[arg(long)]
    only: Vec<String>,
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// List the catalogue and exit
    #[arg(long)]
    list: bool,
    /// Expected argv entry, in order (repeatable)
    #[arg(long = "expect-arg")]
    expect_arg: Vec<String>,
    /// Expected environ entry as KEY=VALUE, in order (repeatable)
    #[arg(long = "expect-env")]
    expect_env: Vec<String>,
    /// Seed for the memory runtime's entropy source
    #[arg(long)]
    seed: Option<u64>,
}

/// Returns the process exit code: 0 all passed, 1 a contract failed.
/// Fatal errors come back as `Err` and exit 2.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.list {
        print!("{}", render_listing(&Catalogue::builtin()));
        return Ok(0);
    }

    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    apply_overrides(&mut config, &cli)?;

    let report = caliper_core::run(&config)?;
    match cli.format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(report.exit_code())
}

fn apply_overrides(config: &mut HarnessConfig, cli: &Cli) -> Result<()> {
    if let Some(runtime) = cli.runtime {
        config.runtime = runtime;
    }
    if let Some(profile) = cli.profile {
        config.profile = Some(profile);
    }
    if !cli.only.is_empty() {
        config.only = cli.only.clone();
    }
    if !cli.expect_arg.is_empty() {
        config.expect.args = Some(cli.expect_arg.clone());
    }
    if !cli.expect_env.is_empty() {
        config.expect.environ = Some(cli.expect_env.clone());
    }
    if let Some(seed) = cli.seed {
        config.memory.seed = Some(seed);
    }
    if let Some(path) = &cli.metadata {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading metadata {}", path.display()))?;
        let metadata: RuntimeMetadata = serde_json::from_str(&text)
            .with_context(|| format!("parsing metadata {}", path.display()))?;
        log::debug!("runtime metadata from {}: {:?}", path.display(), metadata);
        config.metadata = Some(metadata);
    }
    Ok(())
}
