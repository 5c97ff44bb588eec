use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layerprobe::{
    Config,
    db::PortalDatabase,
    mapserver::{MapServerRest, WmsClient},
    portal::PortalSession,
};

/// Preflight probe for a deployment the e2e suite is about to run against.
/// Checks all three collaborators: portal login, map server catalogs, and
/// the database when one is configured. `--wait` blocks through the startup
/// grace period first.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "layerprobe=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let wait_mode = args.iter().any(|arg| arg == "--wait" || arg == "-w");

    let config = Config::load()?;

    let session = Arc::new(PortalSession::new(
        config.portal.clone(),
        config.timeouts.clone(),
    )?);

    if wait_mode {
        tracing::info!("waiting for the portal to come up");
        session.await_ready().await?;
    }

    session.login().await?;
    tracing::info!("portal login OK at {}", session.base_url());

    let wms = WmsClient::new(config.mapserver.clone())?;
    let caps = wms.capabilities(None).await?;
    tracing::info!("map server advertises {} layers", caps.layers.len());

    let rest = MapServerRest::new(config.mapserver.clone())?;
    if let Some(first) = caps.layers.first() {
        let local = first.name.rsplit(':').next().unwrap_or(&first.name);
        match rest.get_layer(local).await? {
            Some(info) => tracing::info!("REST catalog OK ({})", info.name),
            None => tracing::warn!("layer {} in capabilities but not in REST", first.name),
        }
    }

    if let Some(db_config) = &config.database {
        let db = PortalDatabase::connect(db_config).await?;
        let pending = db.pending_uploads().await?;
        tracing::info!("database OK, {} incomplete upload records", pending);
    } else {
        tracing::info!("no database configured, skipping record checks");
    }

    tracing::info!("preflight complete");
    Ok(())
}
