//! Image generation adapters: the hosted model and the output downloader.

mod dto;
mod http_image_fetcher;
mod replicate;

pub use http_image_fetcher::{HttpImageFetcher, MAX_IMAGE_BYTES};
pub use replicate::{
    DEFAULT_EMOJI_MODEL, DEFAULT_REPLICATE_ENDPOINT, ReplicateConfig, ReplicateImageGenerator,
    ReplicateSetupError,
};
