use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ecoforge_core::error::{EcoforgeError, ResolutionError};
use ecoforge_schemas::activity::Scope;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod config;
mod workflow;

/// ecoforge - computes and exports the environmental impacts of an activity catalog
#[derive(Parser, Debug)]
#[command(name = "ecoforge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ecoforge.yaml", env = "EB_CONFIG")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), or any `RUST_LOG` directive
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export computed data
    #[command(subcommand)]
    Export(ExportCommands),
}

#[derive(Subcommand, Debug)]
enum ExportCommands {
    /// Compute impacts and write every artifact
    Processes(ProcessesArgs),
    /// Write ingredients, materials and generic processes only
    Metadata(ScopeArgs),
}

#[derive(Args, Debug)]
struct ScopeArgs {
    /// Restrict the run to these scopes (all when omitted)
    #[arg(long = "scope", value_parser = parse_scope, num_args = 1..)]
    scopes: Vec<Scope>,
}

#[derive(Args, Debug)]
struct ProcessesArgs {
    #[command(flatten)]
    scope: ScopeArgs,

    /// Number of workers (defaults to the number of cores minus one)
    #[arg(long)]
    cpu_count: Option<usize>,

    /// Replace only the entries of the selected scopes in the existing files
    #[arg(long)]
    merge: bool,

    /// Query the SimaPro oracle first, falling back to local computation
    #[arg(long)]
    simapro: bool,
}

fn parse_scope(value: &str) -> Result<Scope, String> {
    Scope::ALL
        .into_iter()
        .find(|scope| scope.as_str() == value)
        .ok_or_else(|| {
            let known: Vec<&str> = Scope::ALL.iter().map(|s| s.as_str()).collect();
            format!("unknown scope '{value}', expected one of {}", known.join(", "))
        })
}

/// 1 for an invalid catalog, 2 for an activity bound to an unknown database, 3 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EcoforgeError>() {
        Some(EcoforgeError::Catalog(_)) => 1,
        Some(EcoforgeError::Resolution(ResolutionError::UnknownDatabase(_))) => 2,
        _ => 3,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    match cli.command {
        Commands::Export(ExportCommands::Processes(args)) => {
            let options = workflow::ExportOptions {
                scopes: args.scope.scopes,
                cpu_count: args.cpu_count,
                merge: args.merge,
                simapro: args.simapro,
            };
            workflow::export_processes(&config, &options)
        }
        Commands::Export(ExportCommands::Metadata(args)) => {
            workflow::export_metadata(&config, &args.scopes)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:?}");
            ExitCode::from(exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoforge_core::error::{CatalogError, CatalogIssue};

    #[test]
    fn parses_export_processes() {
        let cli = Cli::try_parse_from([
            "ecoforge", "export", "processes", "--scope", "food", "textile", "--cpu-count", "2",
            "--merge",
        ])
        .unwrap();
        let Commands::Export(ExportCommands::Processes(args)) = cli.command else {
            panic!("expected export processes");
        };
        assert_eq!(args.scope.scopes, vec![Scope::Food, Scope::Textile]);
        assert_eq!(args.cpu_count, Some(2));
        assert!(args.merge);
        assert!(!args.simapro);
    }

    #[test]
    fn rejects_unknown_scope() {
        assert!(Cli::try_parse_from(["ecoforge", "export", "metadata", "--scope", "cars"]).is_err());
    }

    #[test]
    fn maps_errors_to_exit_codes() {
        let catalog = anyhow::Error::from(EcoforgeError::from(CatalogError {
            issues: vec![CatalogIssue::DuplicateId("x".to_string())],
        }))
        .context("Failed to load inputs");
        assert_eq!(exit_code(&catalog), 1);

        let unresolved = anyhow::Error::from(EcoforgeError::from(ResolutionError::UnknownDatabase(
            "Ecoinvent 2".to_string(),
        )));
        assert_eq!(exit_code(&unresolved), 2);

        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), 3);
    }
}
