mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use loadsum_core::ingest::{summarize_upload, summarize_upload_as};
use loadsum_core::settings::Settings;
use loadsum_core::summary::assessment::assess;
use loadsum_core::summary::export::{export_csv, export_json};
use loadsum_core::{io, LoadsumError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands, OutputArg};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::new(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => return report_error(&e),
    };
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    init_logging(&settings.log_level);

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

async fn run(command: Commands, settings: &Settings) -> Result<(), LoadsumError> {
    let policy = settings.upload_policy();
    let options = settings.k6_options();

    match command {
        Commands::Summarize {
            file,
            format,
            content_type,
            output,
            out,
        } => {
            let mut upload = io::read_upload(&file).await?;
            if content_type.is_some() {
                upload.content_type = content_type;
            }

            let report = match format.forced() {
                Some(forced) => {
                    policy.validate(&upload)?;
                    summarize_upload_as(&upload, forced, &options)?
                }
                None => summarize_upload(&upload, &policy, &options)?,
            };

            let rendered = match output {
                OutputArg::Json => export_json(&report)?,
                OutputArg::Csv => export_csv(&report.summary, &report.metadata.flags)?,
            };
            emit(&rendered, out.as_deref()).await
        }
        Commands::Detect { file } => {
            let upload = io::read_upload(&file).await?;
            println!("{}", upload.detect_format());
            Ok(())
        }
        Commands::Assess { file } => {
            let upload = io::read_upload(&file).await?;
            let report = summarize_upload(&upload, &policy, &options)?;
            let assessment = assess(&report.summary);
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(())
        }
    }
}

async fn emit(rendered: &str, out: Option<&Path>) -> Result<(), LoadsumError> {
    match out {
        Some(path) => {
            io::write_output(path, rendered).await?;
            tracing::info!(path = %path.display(), "wrote summary");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Print the problem document to stderr; 4xx problems exit with 2, the rest with 1.
fn report_error(err: &LoadsumError) -> ExitCode {
    let problem = err.problem();
    match serde_json::to_string_pretty(&problem) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{err}"),
    }
    if err.is_client_error() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn init_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
