//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{AdapterConfig, ServerConfig};

#[cfg(feature = "metrics")]
pub(crate) use metrics::build_metrics;
#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use emoji_backend::Trace;
#[cfg(debug_assertions)]
use emoji_backend::doc::ApiDoc;
use emoji_backend::domain::PublicPaths;
use emoji_backend::inbound::http::error::extractor_config;
use emoji_backend::inbound::http::health::{HealthState, live, ready};
use emoji_backend::inbound::http::session_config::SessionSettings;
use emoji_backend::inbound::http::state::HttpState;
use emoji_backend::inbound::http::{auth, emojis};
use emoji_backend::middleware::AuthGateway;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
    } = deps;
    let gateway = AuthGateway::new(http_state.identity.clone(), PublicPaths::default());

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .configure(extractor_config)
        .wrap(gateway)
        .wrap(session.middleware())
        .wrap(Trace)
        .service(
            web::scope("/api")
                .configure(emojis::configure)
                .configure(auth::configure_api),
        )
        .service(web::scope("/auth").configure(auth::configure))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] with session, site, adapter, and metrics settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when an adapter cannot be built or binding
/// the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config)?;
    let session = config.session.clone();
    let bind_addr = config.bind_addr();

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(config.prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
