use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use var_core::{
    validate_output_dir, CsvTableSource, FsArtifactSink, LayoutConfig, LayoutService,
    ValidateOptions,
};

#[derive(Debug, Parser)]
#[command(name = "var_cli", version, about = "PLC variable table → Modbus handler layout")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process a variable table into processed CSV, per-variable JSON and handler summary
    Process(ProcessArgs),
    /// Check one output directory for consistency
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct ProcessArgs {
    /// Input variable table (tab / ';' / ',' separated)
    #[arg(short, long)]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,
    /// Do not write processed_variables.csv
    #[arg(long = "no-save-processed", action = clap::ArgAction::SetFalse)]
    save_processed: bool,
    /// Layout config JSON (defaults are used when absent)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Output directory produced by `process`
    #[arg(short, long)]
    outdir: PathBuf,
    /// Maximum allowed mbHandler value
    #[arg(long)]
    max_handler_id: Option<u32>,
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process(args) => process(args),
        Command::Validate(args) => validate(args),
    }
}

fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::load_from_file(path),
        None => Ok(LayoutConfig::default()),
    }
}

fn process(args: ProcessArgs) -> Result<()> {
    if !args.input.exists() {
        bail!("input not found: {}", args.input.display());
    }
    let config = load_config(args.config.as_deref())?;

    let service = LayoutService::new(CsvTableSource::new(&args.input), config.clone());
    let mut sink = FsArtifactSink::new(&args.outdir, &config, args.save_processed);
    let summary = service
        .run(&mut sink)
        .with_context(|| format!("failed to process {}", args.input.display()))?;

    info!(
        "{} variables ({} used) in {} handlers",
        summary.variables, summary.used_variables, summary.handlers
    );
    println!(
        "Processed {} variables. Configs written to: {}",
        summary.variables,
        sink.configs_dir().display()
    );
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = ValidateOptions {
        max_handler_id: args.max_handler_id,
    };

    let issues = validate_output_dir(&args.outdir, &config, &options)?;
    if issues.is_empty() {
        println!("[ok] {}", args.outdir.display());
        return Ok(());
    }

    for issue in &issues {
        println!("[fail] {issue}");
    }
    bail!("{} validation issue(s) in {}", issues.len(), args.outdir.display());
}
