//! Command-line front end for the dominance-heritability batch pipeline.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use domh2_core::compiler;
use domh2_core::config::ConfigManager;
use domh2_core::models::Catalog;
use domh2_core::orchestrator::{BatchRunner, TraitSelection};

#[derive(Parser)]
#[command(name = "domh2", version, about = "Dominance heritability batch pipeline")]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, global = true, default_value = "domh2.toml")]
    config: PathBuf,

    /// Enable debug-level diagnostics.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, merge, and estimate the selected traits.
    Run(RunArgs),
    /// Compile estimator result files into the summary CSV.
    Compile,
}

#[derive(Args)]
struct RunArgs {
    /// Process only the trait at this registry index (array-task mode).
    #[arg(long, conflicts_with = "trait_code")]
    task_index: Option<usize>,

    /// Process only the named phenotype code(s).
    #[arg(long = "trait", value_name = "CODE")]
    trait_code: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the selected subcommand. Returns whether the run was fully clean,
/// so partial batches surface through the exit code.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let mut manager = ConfigManager::new(&cli.config);
    manager
        .load_or_create()
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    let settings = manager.settings().clone();

    match &cli.command {
        Command::Run(args) => {
            let runner = BatchRunner::new(settings).context("setting up the batch run")?;

            let selection = if let Some(index) = args.task_index {
                TraitSelection::Index(index)
            } else if !args.trait_code.is_empty() {
                TraitSelection::Codes(args.trait_code.clone())
            } else {
                TraitSelection::All
            };

            let summary = runner.run(&selection);
            Ok(summary.all_succeeded())
        }
        Command::Compile => {
            // Descriptions come from the additive catalog; both catalogs
            // carry the same code set.
            let catalog = Catalog::load(&settings.paths.additive_catalog)
                .context("loading the additive catalog")?;
            let descriptions = catalog.descriptions();

            let report = compiler::compile(&settings.paths.results_dir, &descriptions)
                .context("compiling estimator results")?;
            compiler::write_summary(&report.results, &settings.paths.summary_csv)
                .context("writing the summary CSV")?;

            Ok(report.rejected.is_empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_task_index() {
        let cli = Cli::parse_from(["domh2", "run", "--task-index", "3"]);
        match cli.command {
            Command::Run(args) => assert_eq!(args.task_index, Some(3)),
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn task_index_conflicts_with_trait() {
        let result =
            Cli::try_parse_from(["domh2", "run", "--task-index", "1", "--trait", "50_irnt"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["domh2", "compile", "--config", "alt.toml"]);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
    }
}
