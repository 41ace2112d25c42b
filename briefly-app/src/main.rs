use anyhow::{Context, Result};
use briefly_common::observability::{LogConfig, LogFormat, init_logging};
use briefly_config::{BrieflyConfig, BrieflyConfigLoader, default_config_path};
use briefly_export::write_all;
use briefly_llm::LengthPreference;
use briefly_pipeline::{Orchestrator, RunOutcome, RunReport};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Search the web, summarize what it finds, and save the report as PDF and DOCX.
#[derive(Debug, Parser)]
#[command(name = "briefly", version, about)]
struct Cli {
    /// What to research.
    query: String,

    /// Report length: short, medium or detailed.
    #[arg(short, long, default_value = "short")]
    length: LengthPreference,

    /// Config file (YAML). The per-user config file is read first when present.
    #[arg(short, long, env = "BRIEFLY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for research_report.pdf and research_report.docx.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Also print the report to stdout.
    #[arg(long)]
    print: bool,
}

fn load_config(cli: &Cli) -> Result<BrieflyConfig> {
    let mut loader = BrieflyConfigLoader::new();
    if let Some(path) = default_config_path() {
        loader = loader.with_optional_file(path);
    }
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    loader.load().context("failed to load configuration")
}

fn log_config(config: &BrieflyConfig) -> Result<LogConfig> {
    let format: LogFormat = config
        .logging
        .format
        .parse()
        .map_err(|e| anyhow::anyhow!("logging.format: {e}"))?;
    Ok(LogConfig {
        app_name: "briefly",
        log_dir: config.logging.dir.clone(),
        emit_stderr: config.logging.stderr,
        format,
        default_filter: config.logging.filter.clone(),
    })
}

fn render(cli: &Cli, run: &RunReport) -> Result<ExitCode> {
    match &run.outcome {
        RunOutcome::Completed { report, documents } => {
            let paths = write_all(documents, &cli.out_dir)?;
            if cli.print {
                println!("{report}");
            }
            eprintln!("Report ready ({}).", run.sources_line());
            for path in paths {
                eprintln!("  {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed { failure, .. } => {
            eprintln!("{}", failure.message);
            if let Some(cause) = &failure.cause {
                eprintln!("{cause}");
            }
            if let Some(remedy) = &failure.remedy {
                eprintln!("{remedy}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let log_path = init_logging(log_config(&config)?)?;

    // Missing credentials stop here, before anything is fetched.
    let (llm, credentials) = config.validate().context("invalid configuration")?;
    tracing::info!(
        provider = llm.provider_name(),
        model = llm.model(),
        length = %cli.length,
        log = %log_path.display(),
        "briefly.start"
    );

    let orchestrator = Orchestrator::from_config(&config, &llm)?;
    let run = orchestrator.run(&cli.query, cli.length, &credentials).await;
    render(&cli, &run)
}
