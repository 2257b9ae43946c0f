//! Tracing subscriber setup.
//!
//! stdout carries wire messages, so logs go to a file when a directory is
//! configured and to stderr otherwise.
use std::path::Path;

use anyhow::Result;
use spell_core::ActorId;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn setup_logging(log_dir: Option<&Path>, peer_id: Option<ActorId>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        tracing::info!("Logging initialized: stderr");
        return Ok(());
    };

    std::fs::create_dir_all(log_dir)?;

    let file_name = match peer_id {
        Some(peer) => format!("spellcast-{}.log", peer.0),
        None => "spellcast.log".to_owned(),
    };
    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false),
        )
        .init();

    // Keep the file writer alive for the rest of the process.
    std::mem::forget(guard);

    tracing::info!("Log file: {}", log_dir.join(&file_name).display());
    Ok(())
}
