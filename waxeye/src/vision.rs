//! Image recognition
//!
//! Posts the captured photograph to the web-detection annotate endpoint and
//! returns the best-guess label ("parachutes coldplay", hopefully). The API
//! key is read lazily from the environment on every call, so the service
//! starts fine without one and only the pipeline's recognize stage fails.

use serde::{Deserialize, Serialize};
use tracing::debug;
use waxeye_common::{Error, Result};

/// Environment variable holding the recognition-service API key
pub const API_KEY_ENV: &str = "WAXEYE_VISION_API_KEY";

/// Real annotate endpoint; tests substitute a fake
pub const DEFAULT_ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Serialize)]
struct BatchAnnotateRequest {
    requests: Vec<AnnotateRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(rename = "webDetection", default)]
    web_detection: WebDetection,
}

#[derive(Debug, Default, Deserialize)]
struct WebDetection {
    #[serde(rename = "bestGuessLabels", default)]
    best_guess_labels: Vec<BestGuessLabel>,
}

#[derive(Debug, Deserialize)]
struct BestGuessLabel {
    label: String,
}

pub struct Recognizer {
    http: reqwest::Client,
    annotate_url: String,
}

impl Recognizer {
    pub fn new(http: reqwest::Client, annotate_url: String) -> Self {
        Self { http, annotate_url }
    }

    /// Identify the subject of a base64-encoded image
    pub async fn recognize(&self, image_b64: &str) -> Result<String> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::Recognition(format!("{} is not set", API_KEY_ENV)))?;

        let request = BatchAnnotateRequest {
            requests: vec![AnnotateRequest {
                image: ImageContent {
                    content: image_b64.to_string(),
                },
                features: vec![Feature {
                    kind: "WEB_DETECTION",
                    max_results: 1,
                }],
            }],
        };

        let response = self
            .http
            .post(&self.annotate_url)
            .query(&[("key", api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: BatchAnnotateResponse = serde_json::from_str(&body)?;
        let label = parsed
            .responses
            .first()
            .and_then(|r| r.web_detection.best_guess_labels.first())
            .map(|l| l.label.clone())
            .ok_or_else(|| Error::Recognition("no best-guess label in response".to_string()))?;

        debug!("recognized image as {:?}", label);
        Ok(label)
    }
}
