use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use conformd::application::engine::Engine;
use conformd::config::Settings;
use conformd::infrastructure::loopback::LoopbackTransport;
use conformd::interfaces::descriptor::DescriptorParser;
use miette::{IntoDiagnostic, Result};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory polled for Req-<id>.xml and Req-<id>.kill files
    #[arg(long)]
    request_dir: PathBuf,

    /// Directory for status events and artifact uploads
    #[arg(long)]
    status_dir: PathBuf,

    /// Directory processed request files are moved into
    #[arg(long)]
    archive_dir: PathBuf,

    /// Directory holding resource bundles referenced by transmissions
    #[arg(long)]
    payload_dir: PathBuf,

    /// Identifier of this installation in request descriptors
    #[arg(long)]
    participant_id: String,

    /// Move consumed payload bundles into the archive after each test
    #[arg(long)]
    delete_payload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::new(
        cli.request_dir,
        cli.status_dir,
        cli.archive_dir,
        cli.payload_dir,
        cli.participant_id,
    );
    settings.delete_payload = cli.delete_payload;
    settings.ensure_directories().into_diagnostic()?;
    info!(participant = %settings.participant_id, "starting conformance handler");

    let engine = Engine::new(
        Arc::new(settings),
        Arc::new(DescriptorParser::new()),
        Arc::new(LoopbackTransport::new()),
    );

    let (stop, stopped) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop.send(true);
        }
    });

    engine.run(stopped).await;
    Ok(())
}
