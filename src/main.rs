//! sdksplit - split a monolithic generated SDK into per-module packages

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use sdksplit::{BuildConfig, BuildReport, BuildSession};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sdksplit", version)]
#[command(about = "Split a monolithic generated SDK into per-module packages")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ./sdksplit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the monolithic SDK source tree
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output root for the split packages
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Remove the output root before building
    #[arg(long, global = true)]
    clean: bool,

    /// Keep API-version namespaces inside the module's types
    #[arg(long, global = true)]
    no_split_versions: bool,

    /// Worker threads (0 = all cores)
    #[arg(long, global = true)]
    jobs: Option<usize>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write types, core and module packages
    Build,
    /// Write only the per-module types
    CreateTypes,
    /// Print the output package names, core first
    ListModules,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sdksplit=debug" } else { "sdksplit=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<BuildConfig, sdksplit::ConfigError> {
    let mut config = BuildConfig::load(cli.config.as_deref())?;
    config.apply_env();
    config.apply_output_override(cli.output.clone());
    if let Some(source) = &cli.source {
        config.source_root = source.clone();
    }
    if cli.clean {
        config.clean = true;
    }
    if cli.no_split_versions {
        config.split_versions = false;
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    config.validate()?;
    Ok(config)
}

fn print_failures(report: &BuildReport) {
    for failure in &report.failures {
        error!("{}: {}", failure.module, failure.error);
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    let session = match BuildSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::ListModules => match session.list_packages() {
            Ok(packages) => {
                for package in packages {
                    println!("{}", package.name());
                }
                return;
            }
            Err(e) => Err(e),
        },
        Command::CreateTypes => session.create_types(),
        Command::Build => session.build(),
    };

    match result {
        Ok(report) if report.is_success() => {
            info!(
                "{} packages, {} types directories written to {}",
                report.packages.len(),
                report.types_written,
                session.config().output_root.display()
            );
        }
        Ok(report) => {
            print_failures(&report);
            error!(
                "{} unit(s) failed: {}",
                report.failures.len(),
                report.failed_modules().join(", ")
            );
            process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
