//! Toolbox E2E - Main Entry Point
//!
//! With no arguments, generates the fixture workbook, runs every case in a
//! headless browser against `index.html`, and appends the summary sheets.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use toolbox_e2e::config::RunnerConfig;
use toolbox_e2e::executor::execute_workbook;
use toolbox_e2e::fixtures::{generate_workbook, load_fixtures, reference_cases};
use toolbox_e2e::playwright::Browser;
use toolbox_e2e::summary::{append_summary, render_table, write_json_report};
use toolbox_e2e::Workbook;

/// Spreadsheet-driven E2E tests for the multi-tool web app
#[derive(Parser, Debug)]
#[command(name = "toolbox-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, env = "TOOLBOX_E2E_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Workbook path
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Page under test (URL or file path)
    #[arg(long, env = "TOOLBOX_E2E_TARGET", global = true)]
    target: Option<String>,

    /// Browser to use
    #[arg(long, value_enum, global = true)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// YAML fixtures replacing the built-in test cases
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Also write results as JSON to this path
    #[arg(long, global = true)]
    json_report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Write the fixture workbook
    Generate,
    /// Run the cases in the workbook and record results
    Execute,
    /// Append summary sheets to the workbook
    Summarize,
    /// All three phases in order (default)
    Run,
}

impl Cli {
    fn runner_config(&self) -> anyhow::Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(workbook) = &self.workbook {
            config.workbook = workbook.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(browser) = self.browser {
            config.browser = browser;
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(fixtures) = &self.fixtures {
            config.fixtures = Some(fixtures.clone());
        }
        if let Some(report) = &self.json_report {
            config.json_report = Some(report.clone());
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Failures are logged, not mapped to an exit status
    if let Err(e) = run(&cli).await {
        error!("Error executing test suite: {:#}", e);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.runner_config()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Generate => generate(&config)?,
        Commands::Execute => {
            execute_workbook(&config).await?;
        }
        Commands::Summarize => summarize(&config)?,
        Commands::Run => {
            generate(&config)?;
            execute_workbook(&config).await?;
            summarize(&config)?;
            info!("Test suite execution completed successfully");
        }
    }

    Ok(())
}

fn generate(config: &RunnerConfig) -> anyhow::Result<()> {
    let cases = match &config.fixtures {
        Some(path) => load_fixtures(path)?,
        None => reference_cases(),
    };
    generate_workbook(&config.workbook, &cases)?;
    Ok(())
}

fn summarize(config: &RunnerConfig) -> anyhow::Result<()> {
    let summary = append_summary(&config.workbook)?;
    println!("{}", render_table(&summary));

    if let Some(report) = &config.json_report {
        let cases = Workbook::open(&config.workbook)?.cases(&config.workbook)?;
        write_json_report(report, &summary, &cases)?;
    }

    Ok(())
}
