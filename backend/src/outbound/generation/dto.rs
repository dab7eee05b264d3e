//! Wire types for the Replicate predictions API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(super) struct PredictionRequestDto<'a> {
    pub(super) version: &'a str,
    pub(super) input: PredictionInputDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct PredictionInputDto<'a> {
    pub(super) prompt: &'a str,
    pub(super) apply_watermark: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct PredictionDto {
    #[serde(default)]
    pub(super) id: String,
    pub(super) status: PredictionStatus,
    #[serde(default)]
    pub(super) output: Value,
    #[serde(default)]
    pub(super) error: Option<Value>,
    #[serde(default)]
    pub(super) urls: Option<PredictionUrlsDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PredictionUrlsDto {
    pub(super) get: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub(super) fn is_pending(self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }
}
