use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::ingest::truncate_chars;
use crate::traits::{GeneratedImage, ImageGenerator};

const IMAGEN_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/imagen-4.0-generate-001:predict";

pub struct ImagenClient {
    api_key: Option<String>,
    http: reqwest::Client,
    endpoint: String,
}

impl ImagenClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
            endpoint: IMAGEN_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

/// House style applied to every generated image.
pub fn refine_prompt(keyword: &str) -> String {
    format!(
        "Photorealistic, cinematic, high contrast, editorial photojournalism style: {keyword}. 8k resolution, highly detailed."
    )
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("GEMINI_API_KEY not set, skipping AI image tier");
            return Ok(None);
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&json!({
                "instances": [{ "prompt": refine_prompt(prompt) }],
                "parameters": { "sampleCount": 1, "aspectRatio": "16:9" }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Imagen API error ({}): {}",
                status,
                truncate_chars(&error_text, 200)
            ));
        }

        let data: PredictResponse = response.json().await?;
        let Some(prediction) = data.predictions.into_iter().next() else {
            return Ok(None);
        };
        let Some(encoded) = prediction.bytes_base64_encoded else {
            return Ok(None);
        };

        Ok(Some(GeneratedImage {
            bytes: STANDARD.decode(encoded)?,
            content_type: prediction
                .mime_type
                .unwrap_or_else(|| "image/png".to_string()),
        }))
    }
}
