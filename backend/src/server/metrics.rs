//! Prometheus request metrics, compiled in with the `metrics` feature.
//!
//! [`build_metrics`] registers the `emoji_http_*` collectors and the
//! `/metrics` endpoint; [`MetricsLayer`] lets the server wrap the app the same
//! way whether or not the collectors were created.

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use std::sync::Arc;
use tracing::warn;

const METRICS_NAMESPACE: &str = "emoji";
const METRICS_PATH: &str = "/metrics";

/// Build the Prometheus middleware; registration failures disable metrics.
pub(crate) fn build_metrics() -> Option<PrometheusMetrics> {
    match PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
        .endpoint(METRICS_PATH)
        .build()
    {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "metrics registration failed; continuing without metrics");
            None
        }
    }
}

/// Middleware that is either the Prometheus collector or a pass-through.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

type BoxedResponse = ServiceResponse<BoxBody>;

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = BoxedResponse;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, BoxedResponse, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self {
            Self::Enabled(metrics) => {
                let pending = Compat::new(PrometheusMetrics::clone(metrics)).new_transform(service);
                Box::pin(async move { Ok(boxed::service(pending.await?)) })
            }
            Self::Disabled => {
                let passthrough = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Box::pin(async move { Ok(boxed::service(passthrough)) })
            }
        }
    }
}
