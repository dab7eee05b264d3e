//! Shared wiring for HTTP integration tests.
//!
//! Builds the full middleware stack (trace, cookie session, auth gateway)
//! over in-memory adapters so tests exercise the same path as the server.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use serde_json::json;
use url::Url;

use emoji_backend::Trace;
use emoji_backend::domain::ports::{
    EmojiRepository as _, FIXTURE_EMAIL, FIXTURE_PASSWORD, FIXTURE_USER_ID, FixtureIdentityProvider,
    FixtureImageFetcher, FixtureImageGenerator,
};
use emoji_backend::domain::{
    Emoji, EmojiGalleryService, EmojiGenerationService, EmojiId, GenerationPorts, PublicPaths,
    StoragePath, UserId, Visibility,
};
use emoji_backend::inbound::http::error::extractor_config;
use emoji_backend::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use emoji_backend::inbound::http::state::{HttpState, HttpStatePorts, SiteConfig};
use emoji_backend::inbound::http::{auth, emojis};
use emoji_backend::middleware::AuthGateway;
use emoji_backend::test_support::{InMemoryEmojiStore, InMemoryObjectStorage};

/// In-memory adapters behind one app instance.
pub struct Harness {
    pub store: Arc<InMemoryEmojiStore>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub state: web::Data<HttpState>,
    session: SessionSettings,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryEmojiStore::default());
        let storage = Arc::new(InMemoryObjectStorage::default());
        let gallery = Arc::new(EmojiGalleryService::new(store.clone(), storage.clone()));
        let generation = EmojiGenerationService::new(
            GenerationPorts {
                generator: Arc::new(FixtureImageGenerator),
                fetcher: Arc::new(FixtureImageFetcher),
                storage: storage.clone(),
                repository: store.clone(),
            },
            Arc::new(DefaultClock),
        );
        let state = web::Data::new(HttpState::new(
            HttpStatePorts {
                generation: Arc::new(generation),
                gallery: gallery.clone(),
                likes: gallery,
                identity: Arc::new(FixtureIdentityProvider),
            },
            SiteConfig::new(
                Url::parse("http://localhost:3000").expect("site url"),
                false,
            ),
        ));
        Self {
            store,
            storage,
            state,
            session: SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
        }
    }

    /// The app as the server assembles it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(extractor_config)
            .wrap(AuthGateway::new(
                self.state.identity.clone(),
                PublicPaths::default(),
            ))
            .wrap(self.session.middleware())
            .wrap(Trace)
            .service(
                web::scope("/api")
                    .configure(emojis::configure)
                    .configure(auth::configure_api),
            )
            .service(web::scope("/auth").configure(auth::configure))
    }

    /// Seed an emoji owned by `owner`, `age_minutes` old.
    pub async fn seed(&self, owner: &UserId, visibility: Visibility, age_minutes: i64) -> EmojiId {
        let id = EmojiId::random();
        let storage_path = StoragePath::for_emoji(owner, &id);
        self.storage
            .put(&storage_path, b"\x89PNG\r\n\x1a\nseed".to_vec(), "image/png");
        let emoji = Emoji {
            id,
            owner: owner.clone(),
            prompt: format!("seeded {age_minutes}"),
            storage_path,
            visibility,
            created_at: Utc::now() - Duration::minutes(age_minutes),
            likes_count: 0,
        };
        self.store.insert(&emoji).await.expect("seed emoji");
        id
    }
}

/// The account the fixture identity provider signs in.
pub fn fixture_user() -> UserId {
    UserId::new(FIXTURE_USER_ID).expect("fixture user id")
}

/// Sign in as the fixture account and return the session cookie.
pub async fn sign_in<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": FIXTURE_EMAIL, "password": FIXTURE_PASSWORD }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "fixture login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie")
}
