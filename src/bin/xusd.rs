//! XUSD CLI
//!
//! Command-line tools for the XUSD vault: write a sample scenario, run
//! scenarios against a fresh vault and inspect the effective configuration.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::{style, Term};

use xusd::cli::{render_report, run_scenario, sample_scenario, to_json, OutputFormat, Scenario};
use xusd::core::VaultState;

/// XUSD CLI - rebasing stablecoin vault simulator
#[derive(Parser)]
#[command(name = "xusd")]
#[command(author = "XUSD Team")]
#[command(version = xusd::VERSION)]
#[command(about = "Command-line interface for the XUSD vault", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format (text, json)
    #[arg(short, long, env = "XUSD_OUTPUT", default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample scenario and configuration
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Run a scenario against a fresh vault
    Simulate {
        /// Scenario file (JSON)
        path: PathBuf,

        /// Vault parameters file, replaces the scenario's own
        #[arg(short, long, env = "XUSD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show effective vault parameters
    Config {
        /// Vault parameters file
        #[arg(short, long, env = "XUSD_CONFIG")]
        file: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let term = Term::stdout();

    if let Err(e) = run_command(&cli, &term) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(cli: &Cli, term: &Term) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init { dir, force } => cmd_init(dir, *force, term),
        Commands::Simulate { path, config } => cmd_simulate(cli, path, config.as_ref(), term),
        Commands::Config { file } => cmd_config(cli, file.as_ref(), term),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_init(dir: &PathBuf, force: bool, term: &Term) -> anyhow::Result<()> {
    term.write_line(&format!(
        "{} Writing sample files to {}",
        style("→").cyan(),
        dir.display()
    ))?;

    let scenario_path = dir.join("scenario.json");
    let config_path = dir.join("vault.json");
    for path in [&scenario_path, &config_path] {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let scenario = sample_scenario()?;
    std::fs::write(&scenario_path, scenario.to_json()?)
        .with_context(|| format!("writing {}", scenario_path.display()))?;
    VaultState::default().save(&config_path)?;

    term.write_line(&format!(
        "{} Created {}",
        style("✓").green(),
        scenario_path.display()
    ))?;
    term.write_line(&format!(
        "{} Created {}",
        style("✓").green(),
        config_path.display()
    ))?;
    term.write_line(&format!(
        "\nRun it with: {}",
        style(format!("xusd simulate {}", scenario_path.display())).bold()
    ))?;
    Ok(())
}

fn cmd_simulate(
    cli: &Cli,
    path: &PathBuf,
    config: Option<&PathBuf>,
    term: &Term,
) -> anyhow::Result<()> {
    let mut scenario =
        Scenario::load(path).with_context(|| format!("loading {}", path.display()))?;

    let state = match config {
        Some(file) => VaultState::load(file)?,
        None => scenario.state.clone().unwrap_or_default(),
    };
    scenario.state = Some(state.apply_env()?);

    let report = run_scenario(&scenario)?;
    term.write_line(&render_report(&report, cli.format))?;
    if cli.format == OutputFormat::Text {
        term.write_line(&format!(
            "{} {} steps completed",
            style("✓").green(),
            report.steps.len()
        ))?;
    }
    Ok(())
}

fn cmd_config(cli: &Cli, file: Option<&PathBuf>, term: &Term) -> anyhow::Result<()> {
    let state = match file {
        Some(file) => VaultState::load(file)?,
        None => VaultState::default(),
    }
    .apply_env()?;

    match cli.format {
        OutputFormat::Json => term.write_line(&to_json(&state))?,
        OutputFormat::Text => {
            term.write_line(&format!("{}", style("Vault parameters").bold()))?;
            let buffer = xusd::utils::FixedPoint::from_raw(state.vault_buffer);
            let lines = [
                ("vault buffer", buffer.to_percent_string()),
                (
                    "auto-allocate threshold",
                    xusd::utils::format_units(state.auto_allocate_threshold, 18),
                ),
                (
                    "rebase threshold",
                    xusd::utils::format_units(state.rebase_threshold, 18),
                ),
                ("redeem fee (bps)", state.redeem_fee_bps.to_string()),
                ("trustee fee (bps)", state.trustee_fee_bps.to_string()),
                (
                    "trustee",
                    state
                        .trustee_address
                        .map_or_else(|| "-".to_string(), |t| t.to_hex()),
                ),
                (
                    "max supply diff",
                    xusd::utils::FixedPoint::from_raw(state.max_supply_diff).to_percent_string(),
                ),
                ("capital paused", state.capital_paused.to_string()),
                ("rebase paused", state.rebase_paused.to_string()),
            ];
            for (key, value) in lines {
                term.write_line(&format!("  {:<24} {}", key, value))?;
            }
        }
    }
    Ok(())
}
