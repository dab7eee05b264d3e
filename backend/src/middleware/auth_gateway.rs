//! Session gate in front of every route.
//!
//! The gateway reads the provider tokens from the session cookie, resolves
//! the caller, writes any refreshed or cleared tokens back, and attaches the
//! [`AuthenticatedUser`] to the request. Anonymous requests to non-public
//! paths stop here: `/api/` paths get a `401` envelope and pages are
//! redirected to `/login`.
//!
//! The session middleware must wrap the gateway so cookie changes made here
//! reach the response.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::LOCATION;
use actix_web::{Error, HttpMessage, HttpResponse, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};

use crate::domain::ports::IdentityProvider;
use crate::domain::{Error as ApiError, LOGIN_PATH, PublicPaths, resolve_session};
use crate::inbound::http::session::{AUTHENTICATION_REQUIRED, SessionContext};

const API_PREFIX: &str = "/api/";

/// Middleware factory resolving the caller from the session cookie.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use actix_web::App;
/// use emoji_backend::domain::PublicPaths;
/// use emoji_backend::domain::ports::FixtureIdentityProvider;
/// use emoji_backend::middleware::AuthGateway;
///
/// let gateway = AuthGateway::new(Arc::new(FixtureIdentityProvider), PublicPaths::default());
/// let _app = App::new().wrap(gateway);
/// ```
#[derive(Clone)]
pub struct AuthGateway {
    identity: Arc<dyn IdentityProvider>,
    public: Arc<PublicPaths>,
}

impl AuthGateway {
    /// Gate requests using `identity` and let `public` paths through.
    pub fn new(identity: Arc<dyn IdentityProvider>, public: PublicPaths) -> Self {
        Self {
            identity,
            public: Arc::new(public),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGateway
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGatewayMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGatewayMiddleware {
            service: Rc::new(service),
            identity: Arc::clone(&self.identity),
            public: Arc::clone(&self.public),
        }))
    }
}

/// Service wrapper produced by [`AuthGateway`].
pub struct AuthGatewayMiddleware<S> {
    service: Rc<S>,
    identity: Arc<dyn IdentityProvider>,
    public: Arc<PublicPaths>,
}

impl<S, B> Service<ServiceRequest> for AuthGatewayMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let identity = Arc::clone(&self.identity);
        let public = Arc::clone(&self.public);

        Box::pin(async move {
            let session = SessionContext::new(req.get_session());
            let tokens = session.tokens();
            let resolution = resolve_session(identity.as_ref(), tokens.as_ref()).await;
            if let Err(error) = session.apply(&resolution.update) {
                warn!(%error, "failed to update session cookie");
            }

            match resolution.user {
                Some(user) => {
                    req.extensions_mut().insert(user);
                }
                None if !public.is_public(req.path()) => {
                    debug!(path = req.path(), "rejecting anonymous request");
                    return Ok(reject(req));
                }
                None => {}
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn reject<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    let response = if req.path().starts_with(API_PREFIX) {
        ApiError::unauthorized(AUTHENTICATION_REQUIRED).error_response()
    } else {
        HttpResponse::Found()
            .insert_header((LOCATION, LOGIN_PATH))
            .finish()
    };
    req.into_response(response).map_into_right_body()
}
