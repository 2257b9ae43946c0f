//! `spellcast` session node binary.
//!
//! ```bash
//! # Two peers wired back to back through a pair of FIFOs
//! SPELL_PEER_ID=1 spellcast < alice.in > alice.out
//! ```

use anyhow::{Context, Result};
use spell_client::{NodeConfig, SessionNode, logging, node, stubs};
use spell_content::SpellbookLoader;
use spell_core::ServiceLocator;
use spell_runtime::CastSession;
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = NodeConfig::from_env();
    logging::setup_logging(config.log_dir.as_deref(), config.runtime.peer_id)?;

    tracing::info!("Starting spellcast node");
    tracing::info!("Peer: {}", node::peer_label(config.runtime.peer_id));

    let catalog = match &config.spellbook {
        Some(path) => SpellbookLoader::load(path)
            .with_context(|| format!("Failed to load spellbook {}", path.display()))?,
        None => SpellbookLoader::load_embedded()?,
    };

    let locator = ServiceLocator::shared();
    stubs::install(&locator, config.physics_delay);

    let session = CastSession::builder()
        .config(config.runtime.clone())
        .catalog(catalog)
        .locator(locator)
        .build()?;
    node::spawn_event_log(session.events());

    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    let session = SessionNode::new(session, config.tick())
        .run(reader, &mut writer)
        .await?;

    tracing::info!(
        "Shutdown complete: {} deferred operations pending, {} discarded",
        session.services().pending(),
        session.services().dropped()
    );
    Ok(())
}
