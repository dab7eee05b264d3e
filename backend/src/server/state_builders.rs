//! Builders selecting real adapters or fixtures for the HTTP state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use emoji_backend::domain::ports::{
    EmojiGalleryQuery, EmojiGeneration, EmojiLikesCommand, EmojiRepository,
    FixtureEmojiGalleryQuery, FixtureEmojiGeneration, FixtureEmojiLikesCommand,
    FixtureIdentityProvider, IdentityProvider, ImageGenerator, ObjectStorage,
};
use emoji_backend::domain::{EmojiGalleryService, EmojiGenerationService, GenerationPorts};
use emoji_backend::inbound::http::session_config::BuildMode;
use emoji_backend::inbound::http::state::{HttpState, HttpStatePorts};
use emoji_backend::outbound::generation::{HttpImageFetcher, ReplicateImageGenerator};
use emoji_backend::outbound::identity::HttpIdentityProvider;
use emoji_backend::outbound::persistence::DieselEmojiRepository;
use emoji_backend::outbound::storage::HttpObjectStorage;

use super::ServerConfig;
use super::config::AdapterConfig;

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Ports backing the emoji routes.
pub(crate) struct EmojiPorts {
    pub(crate) generation: Arc<dyn EmojiGeneration>,
    pub(crate) gallery: Arc<dyn EmojiGalleryQuery>,
    pub(crate) likes: Arc<dyn EmojiLikesCommand>,
}

impl EmojiPorts {
    fn fixtures() -> Self {
        Self {
            generation: Arc::new(FixtureEmojiGeneration),
            gallery: Arc::new(FixtureEmojiGalleryQuery),
            likes: Arc::new(FixtureEmojiLikesCommand),
        }
    }
}

/// Driven adapters available to the emoji services.
pub(crate) struct DrivenAdapters {
    pub(crate) repository: Option<Arc<dyn EmojiRepository>>,
    pub(crate) storage: Option<Arc<dyn ObjectStorage>>,
    pub(crate) generator: Option<Arc<dyn ImageGenerator>>,
    pub(crate) download_timeout: Duration,
}

/// Wire the emoji services over whichever driven adapters exist.
///
/// The gallery needs the repository and the bucket; generation additionally
/// needs the model. Missing adapters fall back to fixtures.
pub(crate) fn build_emoji_ports(adapters: DrivenAdapters) -> std::io::Result<EmojiPorts> {
    let DrivenAdapters {
        repository,
        storage,
        generator,
        download_timeout,
    } = adapters;
    let (Some(repository), Some(storage)) = (repository, storage) else {
        warn!("emoji repository or storage not configured; serving fixture gallery");
        return Ok(EmojiPorts::fixtures());
    };

    let gallery = Arc::new(EmojiGalleryService::new(
        repository.clone(),
        storage.clone(),
    ));
    let generation: Arc<dyn EmojiGeneration> = match generator {
        Some(generator) => {
            let fetcher = HttpImageFetcher::new(download_timeout).map_err(|e| {
                std::io::Error::other(format!("image fetcher setup failed: {e}"))
            })?;
            Arc::new(EmojiGenerationService::new(
                GenerationPorts {
                    generator,
                    fetcher: Arc::new(fetcher),
                    storage,
                    repository,
                },
                Arc::new(DefaultClock),
            ))
        }
        None => {
            warn!("image model not configured; generation returns fixtures");
            Arc::new(FixtureEmojiGeneration)
        }
    };

    Ok(EmojiPorts {
        generation,
        gallery: gallery.clone(),
        likes: gallery,
    })
}

fn build_identity(
    adapters: &AdapterConfig,
    build_mode: BuildMode,
) -> std::io::Result<Arc<dyn IdentityProvider>> {
    match (adapters.identity.clone(), build_mode) {
        (Some(config), _) => {
            let provider = HttpIdentityProvider::new(config).map_err(|e| {
                std::io::Error::other(format!("identity provider setup failed: {e}"))
            })?;
            info!("using hosted identity provider");
            Ok(Arc::new(provider))
        }
        (None, BuildMode::Debug) => {
            warn!("identity provider not configured; accepting the fixture account only");
            Ok(Arc::new(FixtureIdentityProvider))
        }
        (None, BuildMode::Release) => Err(std::io::Error::other(
            "identity provider not configured; set EMOJI_IDENTITY_URL and EMOJI_IDENTITY_ANON_KEY",
        )),
    }
}

fn driven_adapters(config: &ServerConfig) -> std::io::Result<DrivenAdapters> {
    let repository = config
        .db_pool
        .clone()
        .map(|pool| Arc::new(DieselEmojiRepository::new(pool)) as Arc<dyn EmojiRepository>);
    let storage = match config.adapters.storage.clone() {
        Some(storage) => Some(Arc::new(HttpObjectStorage::new(storage).map_err(|e| {
            std::io::Error::other(format!("object storage setup failed: {e}"))
        })?) as Arc<dyn ObjectStorage>),
        None => None,
    };
    let generator = match config.adapters.generator.clone() {
        Some(model) => Some(
            Arc::new(ReplicateImageGenerator::new(model).map_err(|e| {
                std::io::Error::other(format!("image model setup failed: {e}"))
            })?) as Arc<dyn ImageGenerator>,
        ),
        None => None,
    };
    Ok(DrivenAdapters {
        repository,
        storage,
        generator,
        download_timeout: config
            .adapters
            .download_timeout
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT),
    })
}

/// Build the shared HTTP state from server configuration.
///
/// # Errors
/// Returns [`std::io::Error`] when an adapter's HTTP client cannot be built,
/// or when a release build has no identity provider configured.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let EmojiPorts {
        generation,
        gallery,
        likes,
    } = build_emoji_ports(driven_adapters(config)?)?;
    let identity = build_identity(&config.adapters, config.build_mode)?;
    Ok(web::Data::new(HttpState::new(
        HttpStatePorts {
            generation,
            gallery,
            likes,
            identity,
        },
        config.site.clone(),
    )))
}

#[cfg(test)]
mod tests {
    //! Tests for adapter selection.

    use super::*;
    use emoji_backend::domain::ports::{
        FIXTURE_EMAIL, FIXTURE_PASSWORD, FixtureEmojiRepository, FixtureImageGenerator,
        FixtureObjectStorage,
    };
    use chrono::Utc;
    use emoji_backend::domain::{
        Credentials, Emoji, EmojiId, Prompt, StoragePath, UserId, Visibility,
    };
    use emoji_backend::inbound::http::session_config::SessionSettings;
    use emoji_backend::inbound::http::state::SiteConfig;
    use emoji_backend::test_support::{InMemoryEmojiStore, InMemoryObjectStorage};
    use actix_web::cookie::{Key, SameSite};
    use pagination::PageRequest;
    use rstest::rstest;
    use url::Url;

    fn adapters(
        repository: Option<Arc<dyn EmojiRepository>>,
        storage: Option<Arc<dyn ObjectStorage>>,
        generator: Option<Arc<dyn ImageGenerator>>,
    ) -> DrivenAdapters {
        DrivenAdapters {
            repository,
            storage,
            generator,
            download_timeout: Duration::from_secs(1),
        }
    }

    fn server_config() -> ServerConfig {
        ServerConfig::new(
            SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            SiteConfig::new(Url::parse("http://localhost:3000").expect("site url"), true),
            "127.0.0.1:0".parse().expect("socket addr"),
        )
        .with_build_mode(BuildMode::Debug)
    }

    fn viewer() -> UserId {
        UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("user id")
    }

    #[rstest]
    #[case::nothing(false, false)]
    #[case::repository_only(true, false)]
    #[case::storage_only(false, true)]
    #[tokio::test]
    async fn incomplete_gallery_adapters_fall_back_to_fixtures(
        #[case] with_repository: bool,
        #[case] with_storage: bool,
    ) {
        let repository = with_repository
            .then(|| Arc::new(InMemoryEmojiStore::default()) as Arc<dyn EmojiRepository>);
        let storage = with_storage
            .then(|| Arc::new(InMemoryObjectStorage::default()) as Arc<dyn ObjectStorage>);

        let ports = build_emoji_ports(adapters(repository, storage, None)).expect("ports");
        let page = ports
            .gallery
            .list_emojis(&viewer(), PageRequest::first(8).expect("request"))
            .await
            .expect("fixture listing");

        assert_eq!(page.total(), 0);
    }

    #[tokio::test]
    async fn repository_and_storage_back_the_gallery() {
        let store = Arc::new(InMemoryEmojiStore::default());
        let owner = viewer();
        let emoji = Emoji {
            id: EmojiId::random(),
            owner: owner.clone(),
            prompt: "a happy cat".to_owned(),
            storage_path: StoragePath::from_stored("seed.png"),
            visibility: Visibility::Private,
            created_at: Utc::now(),
            likes_count: 0,
        };
        store.insert(&emoji).await.expect("seed emoji");

        let ports = build_emoji_ports(adapters(
            Some(store.clone()),
            Some(Arc::new(InMemoryObjectStorage::default())),
            Some(Arc::new(FixtureImageGenerator)),
        ))
        .expect("ports");

        let page = ports
            .gallery
            .list_emojis(&owner, PageRequest::first(8).expect("request"))
            .await
            .expect("listing");
        assert_eq!(page.total(), 1);
        let toggle = ports
            .likes
            .toggle_like(&owner, &emoji.id)
            .await
            .expect("toggle");
        assert!(toggle.liked);
        assert_eq!(store.like_rows(&emoji.id), 1);
    }

    #[tokio::test]
    async fn repository_without_model_keeps_fixture_generation() {
        let ports = build_emoji_ports(adapters(
            Some(Arc::new(FixtureEmojiRepository)),
            Some(Arc::new(FixtureObjectStorage)),
            None,
        ))
        .expect("ports");
        let owner = viewer();

        let generated = ports
            .generation
            .generate(
                &owner,
                Prompt::new("a happy cat").expect("prompt"),
                Visibility::Private,
            )
            .await
            .expect("fixture generation");
        assert!(
            generated
                .storage_path
                .as_str()
                .starts_with(&owner.to_string())
        );
    }

    #[tokio::test]
    async fn unconfigured_identity_uses_the_fixture_account() {
        let state = build_http_state(&server_config()).expect("state");

        let session = state
            .identity
            .sign_in_with_password(
                &Credentials::for_sign_in(FIXTURE_EMAIL, FIXTURE_PASSWORD)
                    .expect("credentials"),
            )
            .await
            .expect("fixture sign in");

        assert_eq!(session.user.email.as_deref(), Some(FIXTURE_EMAIL));
        assert_eq!(state.site.origin(), "http://localhost:3000");
    }

    #[rstest]
    fn release_builds_refuse_to_start_without_an_identity_provider() {
        let config = server_config().with_build_mode(BuildMode::Release);

        let Err(err) = build_http_state(&config) else {
            panic!("release build started without an identity provider");
        };

        assert!(err.to_string().contains("identity provider not configured"));
    }

    #[rstest]
    #[case::debug(BuildMode::Debug, true)]
    #[case::release(BuildMode::Release, false)]
    fn fixture_identity_is_a_debug_only_fallback(
        #[case] build_mode: BuildMode,
        #[case] accepted: bool,
    ) {
        let outcome = build_identity(&AdapterConfig::default(), build_mode);

        assert_eq!(outcome.is_ok(), accepted);
    }
}
