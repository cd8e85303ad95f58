//! Minbar CLI — submit a masjid's prayer timetable for review.
//!
//! Set MINBAR_API_URL, MINBAR_OWNER_ID, and optionally MINBAR_API_KEY.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use minbar_cli::{content_type_for, init_tracing};
use minbar_client::SubmissionSession;
use minbar_core::{Config, Period, SourceFile, ValidationState};

#[derive(Parser)]
#[command(name = "minbar", about = "Prayer timetable submission CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, tag, upload, and register a set of timetable files
    Submit {
        /// File with its period, as `path=day|week|month` (repeatable)
        #[arg(long = "file", required = true)]
        files: Vec<String>,
        /// Contact email included with the submission
        #[arg(long)]
        email: Option<String>,
    },
    /// Validate files without uploading, printing each verdict
    Check {
        /// Paths to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn read_source(path: &PathBuf) -> anyhow::Result<SourceFile> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid filename: {}", path.display()))?;
    Ok(SourceFile::new(
        name,
        content_type_for(path),
        bytes::Bytes::from(data),
    ))
}

fn parse_file_spec(spec: &str) -> anyhow::Result<(PathBuf, Period)> {
    let (path, period) = spec
        .rsplit_once('=')
        .with_context(|| format!("Expected `path=period`, got `{}`", spec))?;
    let period = period
        .parse::<Period>()
        .map_err(|e| anyhow::anyhow!("{}: {}", spec, e))?;
    Ok((PathBuf::from(path), period))
}

fn report_failed_artifacts(session: &SubmissionSession) {
    for artifact in session.flow().artifacts() {
        match &artifact.validation {
            ValidationState::Checked(v) if !v.is_valid => {
                eprintln!("  {}: {}", artifact.file_name, v.message);
            }
            ValidationState::Errored(msg) => {
                eprintln!("  {}: {}", artifact.file_name, msg);
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context(
        "Failed to load configuration. Set MINBAR_API_URL and MINBAR_OWNER_ID",
    )?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit { files, email } => {
            let mut session = SubmissionSession::from_config(&config)?;

            for spec in &files {
                let (path, period) = parse_file_spec(spec)?;
                let source = read_source(&path)?;
                let advanced = session
                    .add_file(source)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.client_message()))?;
                if !advanced {
                    report_failed_artifacts(&session);
                    bail!("{} was not accepted as a prayer timetable", path.display());
                }
                session
                    .tag_period(period)
                    .map_err(|e| anyhow::anyhow!(e.client_message()))?;
            }

            session.set_contact_email(email);
            let response = session
                .submit()
                .await
                .map_err(|e| anyhow::anyhow!(e.client_message()))?;

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "queueId": response.queue_id,
                    "artifacts": session.flow().artifacts().len(),
                }))?
            );
        }
        Commands::Check { paths } => {
            let mut session = SubmissionSession::from_config(&config)?;

            for path in &paths {
                let source = read_source(path)?;
                match session.add_file(source).await {
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("{}: {}", path.display(), e.client_message());
                        continue;
                    }
                }
            }

            for artifact in session.flow().artifacts() {
                let verdict = match &artifact.validation {
                    ValidationState::Checked(v) => json!({
                        "isValid": v.is_valid,
                        "message": v.message,
                        "detectedPrayers": v.detected_prayers,
                        "detectedTimes": v.detected_times,
                    }),
                    ValidationState::Errored(msg) => json!({ "error": msg }),
                    _ => json!({ "pending": true }),
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "file": artifact.file_name,
                        "kind": artifact.kind,
                        "verdict": verdict,
                    }))?
                );
            }
        }
    }

    Ok(())
}
