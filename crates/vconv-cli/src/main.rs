//! Command-line front end for the video conversion service.

mod input;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vconv_client::{ClientConfig, ConversionFlow, FailureNotice, FlowOutcome, JobsClient};
use vconv_models::{
    next_action, validate, JobId, Navigation, PollAction, ServerErrorCode, SUPPORTED_FORMATS,
};

use crate::input::{selection_from_path, upload_bytes};
use crate::terminal::TerminalSurface;

/// Convert videos with a vconv server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server origin, overrides VCONV_BASE_URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video, wait for the conversion and report the result
    Convert {
        /// Video file to convert
        file: PathBuf,

        /// Target format, e.g. ".avi"
        #[arg(long = "to", value_name = "FORMAT")]
        target_format: String,

        /// Quality preset passed to the converter
        #[arg(long)]
        preset: Option<String>,

        /// Save the converted file into this directory
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,

        /// Show failed jobs and unreachable servers as errors
        #[arg(long)]
        notify_failures: bool,
    },
    /// Check a file against the upload rules without uploading it
    Validate {
        file: PathBuf,

        #[arg(long = "to", value_name = "FORMAT")]
        target_format: String,
    },
    /// Fetch the current status of a job once
    Status {
        job_id: String,
    },
    /// List supported container formats
    Formats,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vconv=info,vconv_client=info,vconv_cli=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }

    match args.command {
        Command::Convert {
            file,
            target_format,
            preset,
            download_dir,
            notify_failures,
        } => {
            if notify_failures {
                config = config.with_failure_notice(FailureNotice::Panel);
            }
            convert(config, file, target_format, preset, download_dir).await
        }
        Command::Validate {
            file,
            target_format,
        } => {
            let selection = selection_from_path(&file, &target_format, None)?;
            match validate(&selection) {
                Ok(()) => {
                    println!("{} can be converted to {}", file.display(), target_format);
                    Ok(ExitCode::SUCCESS)
                }
                Err(reason) => {
                    println!("error: {}", reason);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Status { job_id } => status(config, JobId::from_string(job_id)).await,
        Command::Formats => {
            for format in SUPPORTED_FORMATS {
                println!("{}", format);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn convert(
    config: ClientConfig,
    file: PathBuf,
    target_format: String,
    preset: Option<String>,
    download_dir: Option<PathBuf>,
) -> Result<ExitCode> {
    let selection = selection_from_path(&file, &target_format, preset.as_deref())?;
    let bytes = upload_bytes(&file, &selection).await?;

    let base_url = config.base_url.clone();
    let poll = config.poll.clone();
    let notice = config.failure_notice;
    let client = JobsClient::new(config).context("Failed to create HTTP client")?;
    let flow = ConversionFlow::new(client, poll, notice);

    let stop = flow.stop_handle();
    tokio::spawn(async move {
        let mut interrupted = false;
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupted {
                warn!("Received second interrupt, exiting");
                std::process::exit(130);
            }
            info!("Received interrupt, stopping status polling");
            interrupted = true;
            stop.stop();
        }
    });

    let mut ui = TerminalSurface::stderr(base_url);
    let outcome = flow.submit(&selection, bytes, &mut ui).await?;
    if let Some(target) = ui.last_navigation() {
        info!(destination = %target, "Conversion flow navigated");
    }

    match outcome {
        FlowOutcome::Finished(Navigation::Download { filename }) => {
            if let Some(dir) = download_dir {
                let saved = flow.api().download(&filename, &dir).await?;
                println!("{}", saved.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        FlowOutcome::Cancelled(job_id) => {
            println!("Stopped waiting for job {}", job_id);
            Ok(ExitCode::FAILURE)
        }
        FlowOutcome::Exhausted { job_id, attempts } => {
            println!("Job {} still running after {} status checks", job_id, attempts);
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

/// Target for a status request that names no job, like opening `/jobs`
/// without having submitted anything.
fn direct_access_target(job_id: &str) -> Option<Navigation> {
    Navigation::for_direct_access(&format!("jobs/{}", job_id.trim()))
}

async fn status(config: ClientConfig, job_id: JobId) -> Result<ExitCode> {
    let base_url = config.base_url.clone();
    if let Some(target) = direct_access_target(job_id.as_str()) {
        let reason = target
            .error_code()
            .and_then(ServerErrorCode::from_code)
            .map(|code| code.message())
            .unwrap_or("No job to look up");
        println!("error: {} ({})", reason, target.url(&base_url));
        return Ok(ExitCode::FAILURE);
    }

    let client = JobsClient::new(config).context("Failed to create HTTP client")?;
    let envelope = client.job_status(&job_id).await?;

    match next_action(&job_id, &envelope)? {
        PollAction::Navigate(target) => {
            println!("finished: {}", target.url(&base_url));
        }
        PollAction::Stop => {
            println!("failed");
        }
        PollAction::Repoll { status, .. } => {
            println!("{}", status);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_job_id_is_direct_access() {
        assert_eq!(direct_access_target(""), Some(Navigation::UnauthorizedAccess));
        assert_eq!(direct_access_target("  "), Some(Navigation::UnauthorizedAccess));
    }

    #[test]
    fn test_real_job_id_is_looked_up() {
        assert_eq!(direct_access_target("5c1d"), None);
    }

    #[test]
    fn test_cli_parses_convert() {
        let args = Args::parse_from(["vconv", "convert", "clip.mp4", "--to", ".avi", "--notify-failures"]);
        assert!(matches!(
            args.command,
            Command::Convert { ref target_format, notify_failures: true, .. } if target_format == ".avi"
        ));
    }
}
