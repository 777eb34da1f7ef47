//! Marketplace entry-point: loads configuration, applies migrations and runs
//! the REST, WebSocket and OpenAPI surfaces.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace::inbound::http::health::{HealthState, ReadinessCheck};
use marketplace::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::secrets::Secrets;
use server::settings::MarketplaceSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = MarketplaceSettings::load().map_err(std::io::Error::other)?;
    let secrets = Secrets::from_env(&DefaultEnv::new()).map_err(std::io::Error::other)?;
    let database_url = settings.database_url().map_err(std::io::Error::other)?;

    run_pending_migrations(database_url)
        .await
        .map_err(std::io::Error::other)?;
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(std::io::Error::other)?;

    let database_check: Arc<dyn ReadinessCheck> = Arc::new(pool.clone());
    let health_state = web::Data::new(HealthState::new(vec![database_check]));
    let config = ServerConfig::new(&settings, secrets, pool).map_err(std::io::Error::other)?;
    info!(bind_addr = %config.bind_addr(), "starting marketplace server");

    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
