//! HR forms - command line front end for the record editor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hr_forms::config::EditorConfig;
use hr_forms::editor::RecordEditor;
use hr_forms::record::RecordKind;
use hr_forms::schema::{Locale, RecordId};
use hr_forms::service::{FileRecordService, RecordService};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hr-forms", version, about = "Schema-driven HR record forms")]
struct Cli {
    /// Record kind (candidate or vacancy)
    #[arg(short, long, global = true)]
    kind: Option<RecordKind>,

    /// Locale for titles (az, en or ru)
    #[arg(short, long, global = true)]
    locale: Option<Locale>,

    /// Record store root, overriding the configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the active steps of the form
    Steps,
    /// Check a stored record against every step's required fields
    Validate { record_id: RecordId },
    /// Print the update payload a stored record would submit
    Export { record_id: RecordId },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hr_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EditorConfig::load().context("failed to read configuration")?;
    let kind = cli.kind.unwrap_or_else(|| config.default_kind());
    let locale = cli.locale.unwrap_or_else(|| config.locale());
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir());
    let service = Arc::new(FileRecordService::new(data_dir));
    tracing::debug!("Using record store at {}", service.root().display());

    match cli.command {
        Command::Steps => {
            let steps = service.list_steps(kind).await?;
            for step in steps.iter().filter(|step| step.is_active) {
                println!("{}\t{}", step.id, step.titles.resolve(locale));
            }
        }
        Command::Validate { record_id } => {
            let mut editor = open(service, kind, record_id).await?;
            if editor.validate_all_steps() {
                println!("{kind} {record_id} is complete");
            } else {
                let keys: Vec<String> = editor
                    .form()
                    .errors()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!("Missing required fields: {}", keys.join(", "));
                std::process::exit(1);
            }
        }
        Command::Export { record_id } => {
            let editor = open(service, kind, record_id).await?;
            println!("{}", serde_json::to_string_pretty(&editor.payload())?);
        }
    }

    Ok(())
}

async fn open(
    service: Arc<FileRecordService>,
    kind: RecordKind,
    record_id: RecordId,
) -> Result<RecordEditor<FileRecordService>> {
    let mut editor = RecordEditor::new(service, kind);
    editor
        .open_for_edit(record_id)
        .await
        .with_context(|| format!("failed to open {kind} {record_id}"))?;
    Ok(editor)
}
