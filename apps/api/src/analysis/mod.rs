//! Vision analysis: asks the external model to describe a room photo and pick catalog items.
//!
//! The prompt embeds the whole catalog on every call; there is no pre-filtering.
//! `AppState` holds an `Arc<dyn RoomAnalyzer>`: `VisionAnalyzer` in production, a fixed
//! analyzer in tests.

use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::prompts::{
    FURNITURE_IDS_KEY, RECOMMENDATIONS_KEY, ROOM_ANALYSIS_PROMPT_TEMPLATE,
};
use crate::catalog::catalog_prompt_text;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient};
use crate::models::analysis::AnalysisResult;
use crate::models::furniture::FurnitureRecord;
use crate::models::upload::UploadedImage;

pub mod prompts;

const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Which furniture key the model is asked to fill in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationMode {
    /// `furniture_ids: [id, ...]`
    Simple,
    /// `recommendations: [{furniture_id, reason}, ...]`
    #[default]
    Ranked,
}

#[derive(Debug, Error)]
#[error("unknown recommendation mode '{0}'")]
pub struct UnknownModeError(String);

impl FromStr for RecommendationMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(RecommendationMode::Simple),
            "ranked" => Ok(RecommendationMode::Ranked),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

/// The analyzer trait. Implement this to swap the model backend without touching the
/// upload handler.
#[async_trait]
pub trait RoomAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &UploadedImage,
        catalog: &[FurnitureRecord],
        mode: RecommendationMode,
    ) -> Result<AnalysisResult, AppError>;
}

/// Production analyzer backed by the vision model.
pub struct VisionAnalyzer {
    llm: LlmClient,
}

impl VisionAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RoomAnalyzer for VisionAnalyzer {
    async fn analyze(
        &self,
        image: &UploadedImage,
        catalog: &[FurnitureRecord],
        mode: RecommendationMode,
    ) -> Result<AnalysisResult, AppError> {
        let prompt = build_analysis_prompt(catalog, mode);
        let data_url = image_data_url(&image.bytes, image.content_type.as_deref());
        debug!(
            "Requesting room analysis: catalog_items={}, prompt_chars={}, image_bytes={}, mode={:?}",
            catalog.len(),
            prompt.len(),
            image.bytes.len(),
            mode
        );

        let response = self
            .llm
            .call_with_image(&prompt, JSON_ONLY_SYSTEM, &data_url)
            .await?;

        Ok(parse_analysis(response.text()))
    }
}

/// Builds the analysis instruction with the catalog inlined.
pub fn build_analysis_prompt(catalog: &[FurnitureRecord], mode: RecommendationMode) -> String {
    let furniture_key = match mode {
        RecommendationMode::Simple => FURNITURE_IDS_KEY,
        RecommendationMode::Ranked => RECOMMENDATIONS_KEY,
    };
    ROOM_ANALYSIS_PROMPT_TEMPLATE
        .replace("{furniture_key}", furniture_key)
        .replace("{catalog}", &catalog_prompt_text(catalog))
}

/// Encodes the image as a base64 `data:` URL.
///
/// The MIME type is sniffed from the bytes, then taken from the declared content type,
/// then assumed to be JPEG.
pub fn image_data_url(bytes: &[u8], declared_type: Option<&str>) -> String {
    let mime = infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.mime_type())
        .or_else(|| declared_type.filter(|t| t.starts_with("image/")))
        .unwrap_or(FALLBACK_IMAGE_MIME);
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Parses the model's text into an `AnalysisResult`.
///
/// Anything that is not a JSON object (no text, invalid JSON, an array) is treated as `{}`.
pub fn parse_analysis(text: Option<&str>) -> AnalysisResult {
    let Some(text) = text else {
        warn!("Vision model returned no content; using empty analysis");
        return AnalysisResult::default();
    };

    match serde_json::from_str::<Value>(strip_json_fences(text)) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Vision model JSON did not match the analysis schema: {e}");
            AnalysisResult::default()
        }),
        Ok(_) => {
            warn!("Vision model returned JSON that is not an object; using empty analysis");
            AnalysisResult::default()
        }
        Err(e) => {
            warn!("Vision model returned invalid JSON ({e}); using empty analysis");
            AnalysisResult::default()
        }
    }
}
