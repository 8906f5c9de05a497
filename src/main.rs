use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use mutt2task::config::Settings;
use mutt2task::message::CommandRenderer;
use mutt2task::notes::NotesStore;
use mutt2task::pipeline::{MailToTask, Outcome};
use mutt2task::tracker::TaskwarriorCli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Diagnostics go to stderr; stdout carries the INFO:/ERR: lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Finished");
        }
        Err(e) => {
            println!("ERR: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<Outcome> {
    let settings = Settings::from_env()?;
    let notes_folder = settings.notes_folder()?;

    let mut raw = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut raw)
        .await
        .context("Failed to read email from stdin")?;

    let pipeline = MailToTask::new(
        Arc::new(TaskwarriorCli::new(settings.task_bin.clone())),
        Arc::new(CommandRenderer::new(&settings.html_renderer)?),
        NotesStore::new(notes_folder),
    );

    Ok(pipeline.run(&raw).await?)
}
