//! Backend entry-point: loads settings, prepares the database, and serves the
//! emoji API.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use emoji_backend::inbound::http::health::HealthState;
use emoji_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use emoji_backend::inbound::http::state::SiteConfig;
use emoji_backend::outbound::persistence::{DbPool, run_migrations};
use emoji_backend::settings::AppSettings;
use server::{AdapterConfig, ServerConfig, create_server};

fn startup_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

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

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| startup_error("failed to load settings", e))?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .map_err(|e| startup_error("invalid session configuration", e))?;
    info!(fingerprint = %session.fingerprint(), "session key loaded");

    let site = SiteConfig::new(
        settings.site_url().map_err(|e| startup_error("invalid settings", e))?,
        settings.development,
    );
    let bind_addr = settings
        .bind_addr()
        .map_err(|e| startup_error("invalid settings", e))?;
    let adapters = AdapterConfig::default()
        .with_identity(
            settings
                .identity_config()
                .map_err(|e| startup_error("invalid settings", e))?,
        )
        .with_storage(
            settings
                .storage_config()
                .map_err(|e| startup_error("invalid settings", e))?,
        )
        .with_generator(
            settings
                .generator_config()
                .map_err(|e| startup_error("invalid settings", e))?,
        )
        .with_download_timeout(settings.http_timeout());

    let mut config = ServerConfig::new(session, site, bind_addr).with_adapters(adapters);
    match settings.pool_config() {
        Some(pool_config) => {
            if settings.run_migrations {
                let applied = run_migrations(pool_config.database_url())
                    .await
                    .map_err(|e| startup_error("database migrations failed", e))?;
                info!(applied, "database migrations applied");
            }
            let pool = DbPool::new(pool_config)
                .await
                .map_err(|e| startup_error("database pool setup failed", e))?;
            config = config.with_db_pool(pool);
        }
        None => warn!("EMOJI_DATABASE_URL not set; serving fixture emoji data"),
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(server::build_metrics());
    }

    info!(addr = %config.bind_addr(), "starting emoji backend");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
