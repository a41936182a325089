use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use probe_engine::{Cancellation, CheckerRegistry, HttpTransport, ProbeRunner};
use tracing::{debug, error, info, warn};

mod config;
mod definitions;
mod report;

use config::Config;
use report::ReportFormat;

/// Everything ran and every probe succeeded
const EXIT_SUCCESS: u8 = 0;
/// At least one probe failed or aborted
const EXIT_PROBE_FAILURE: u8 = 1;
/// Bad configuration or definitions; nothing was sent
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/probe-engine/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs every probe of a definitions file once and reports the results.
    Run {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Validates a definitions file without sending any request.
    Check { file: PathBuf },
    /// Lists the registered checker identifiers.
    Checkers,
    /// Prints the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::from_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    // validated by Config::from_config
    logger::init_tracing(
        config.log_level().unwrap_or(logger::LevelFilter::INFO),
        config.log_format().ok(),
    );

    let runner = match build_runner(&config) {
        Ok(runner) => runner,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let code = match cli.command {
        Commands::Run { file, format } => run_probes(&runner, &config, &file, format).await,
        Commands::Check { file } => check_definitions(&runner, &file),
        Commands::Checkers => {
            for identifier in runner.registry().identifiers() {
                println!("{identifier}");
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Config => {
            print!("{config}");
            Ok(EXIT_SUCCESS)
        }
    };

    match code {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn build_runner(config: &Config) -> anyhow::Result<ProbeRunner> {
    let transport = HttpTransport::with_user_agent(config.timeout(), &config.runner.user_agent)
        .context("Failed to create HTTP transport")?;

    Ok(ProbeRunner::new(
        Arc::new(transport),
        Arc::new(CheckerRegistry::with_builtin()),
        config.runner_config(),
    ))
}

async fn run_probes(
    runner: &ProbeRunner,
    config: &Config,
    file: &Path,
    format: ReportFormat,
) -> anyhow::Result<u8> {
    let probes = definitions::load_definitions(file)?;
    info!(count = probes.len(), file = %file.display(), "Loaded probe definitions");

    // Configuration errors are reported before anything is sent
    for definition in &probes {
        runner
            .prepare(definition)
            .with_context(|| format!("Invalid probe '{}'", definition.label()))?;
    }

    let cancellation = Cancellation::new();
    let on_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending probes");
            on_signal.cancel();
        }
    });

    let results = stream::iter(&probes)
        .map(|definition| runner.run_with_cancellation(definition, &cancellation))
        .buffered(config.runner.max_concurrency)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let rendered = report::render(&results, format).context("Failed to render report")?;
    print!("{rendered}");
    if format == ReportFormat::Json {
        println!();
    }

    let failed = results.iter().filter(|result| !result.success()).count();
    debug!(total = results.len(), failed, "Probe runs finished");

    Ok(if failed == 0 { EXIT_SUCCESS } else { EXIT_PROBE_FAILURE })
}

fn check_definitions(runner: &ProbeRunner, file: &Path) -> anyhow::Result<u8> {
    let probes = definitions::load_definitions(file)?;

    let mut invalid = 0;
    for definition in &probes {
        let problems = definitions::lint(runner, definition);
        if problems.is_empty() {
            println!("{}: ok", definition.label());
            continue;
        }

        invalid += 1;
        println!("{}:", definition.label());
        for problem in problems {
            println!("  {problem}");
        }
    }

    Ok(if invalid == 0 { EXIT_SUCCESS } else { EXIT_CONFIG_ERROR })
}
