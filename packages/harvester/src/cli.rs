//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{builtin_catalog, RegistryId};
use crate::config::{Settings, DEFAULT_SETTINGS_FILE};
use crate::error::{HarvesterError, Result};
use crate::harvester::{Harvester, RunOptions};
use crate::http::HttpTransport;
use crate::types::{Outcome, RegistryReport};

/// IANA Harvester - Generate C enum constants from IANA protocol registries.
#[derive(Parser)]
#[command(name = "iana-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch registries and regenerate their managed regions.
    Generate {
        /// Registry identifiers (see `list`)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        registries: Vec<String>,

        /// Process every registry in the catalog
        #[arg(long)]
        all: bool,

        /// Ignore the cache TTL and revalidate every document
        #[arg(long)]
        force_refresh: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Drop definitions that are no longer in the registry
        #[arg(long)]
        prune: bool,

        /// Settings file (default: iana-sources.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cache directory (overrides the settings file)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Output directory for generated headers (overrides the settings file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List the supported registries.
    List,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            registries,
            all,
            force_refresh,
            dry_run,
            prune,
            config,
            cache_dir,
            output_dir,
        } => {
            let mut settings =
                Settings::load(config.as_deref().unwrap_or(Path::new(DEFAULT_SETTINGS_FILE)))?
                    .with_env_overrides();
            if cache_dir.is_some() {
                settings.cache.dir = cache_dir;
            }
            if output_dir.is_some() {
                settings.output.dir = output_dir;
            }
            let options = RunOptions {
                dry_run,
                prune,
                force_refresh,
            };
            generate_command(&settings, &registries, all, options)
        }
        Commands::List => {
            list_command();
            Ok(())
        }
    }
}

/// Execute the list command.
fn list_command() {
    for spec in builtin_catalog() {
        println!(
            "{:<24} {:<40} {}",
            style(spec.id.as_str()).cyan(),
            spec.title,
            spec.destination.display()
        );
    }
}

/// Execute the generate command.
fn generate_command(
    settings: &Settings,
    registries: &[String],
    all: bool,
    options: RunOptions,
) -> Result<()> {
    // Resolve everything before touching the network
    let ids = if all {
        RegistryId::all().collect::<Vec<_>>()
    } else {
        registries
            .iter()
            .map(|id| RegistryId::parse(id))
            .collect::<Result<Vec<_>>>()?
    };
    let specs = settings.resolve(&ids)?;

    println!(
        "{} {} {} into {}",
        style(if options.dry_run { "Checking" } else { "Generating" }).bold(),
        style(specs.len()).cyan(),
        if specs.len() == 1 { "registry" } else { "registries" },
        style(settings.output_dir().display()).green()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Fetching registries...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let harvester = match HttpTransport::new() {
        Ok(transport) => Harvester::new(settings, Box::new(transport), options),
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    let reports = harvester.run_all(&specs);

    pb.finish_and_clear();

    for report in &reports {
        print_report(report);
    }

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        return Err(HarvesterError::RunFailed(failed));
    }
    Ok(())
}

fn print_report(report: &RegistryReport) {
    let status = match &report.outcome {
        Outcome::Written => style("written").green().bold(),
        Outcome::Unchanged => style("unchanged").dim(),
        Outcome::DryRun {
            would_write: true, ..
        } => style("would change").yellow().bold(),
        Outcome::DryRun { .. } => style("up to date").dim(),
        Outcome::Failed(_) => style("failed").red().bold(),
    };

    println!(
        "{:<24} {:<14} {} generated, {} preserved, {} retained, {} pruned, {} warnings",
        style(&report.registry).cyan(),
        status,
        report.generated,
        report.preserved,
        report.retained,
        report.pruned,
        if report.warnings.is_empty() {
            style(report.warnings.len())
        } else {
            style(report.warnings.len()).yellow().bold()
        }
    );

    if let Outcome::Failed(e) = &report.outcome {
        println!("    {} {e}", style("error:").red());
    }
    if let Outcome::DryRun { changes, .. } = &report.outcome {
        for change in changes {
            println!("    {change}");
        }
    }
    for warning in &report.warnings {
        println!("    {} {warning}", style("warning:").yellow());
    }
}
