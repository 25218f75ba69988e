use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::application::ports::{GenerativeModel, GroundedText, ModelError};
use crate::config::GeminiSettings;
use crate::domain::posts::FeaturedImage;
use crate::infra::error::InfraError;

use super::dto::{
    GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// REST client for the Gemini text and Imagen image models.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, InfraError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| InfraError::configuration("gemini.api_key is not configured"))?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, ModelError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(target = "trendpress::infra::gemini", url = %url, "sending model request");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                error!(target = "trendpress::infra::gemini", error = %err, "model request failed");
                classify_transport(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                target = "trendpress::infra::gemini",
                status = status.as_u16(),
                body = %body,
                "model returned an error status"
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(classify_transport)?;
        serde_json::from_str(&text).map_err(|err| ModelError::Malformed(err.to_string()))
    }
}

fn classify_transport(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Http(err.to_string())
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn grounded(&self, prompt: &str) -> Result<GroundedText, ModelError> {
        let request = GenerateContentRequest::prompt(prompt).with_search();
        let response: GenerateContentResponse = self
            .post(self.endpoint(&self.text_model, "generateContent"), &request)
            .await?;
        Ok(GroundedText {
            text: response.text(),
            citations: response.citations(),
        })
    }

    async fn structured(&self, prompt: &str, schema: Value) -> Result<Value, ModelError> {
        let request = GenerateContentRequest::prompt(prompt).with_json_schema(schema);
        let response: GenerateContentResponse = self
            .post(self.endpoint(&self.text_model, "generateContent"), &request)
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        serde_json::from_str(&text).map_err(|err| ModelError::Malformed(err.to_string()))
    }

    async fn image(&self, prompt: &str) -> Result<Option<FeaturedImage>, ModelError> {
        let request = PredictRequest::single_wide_image(prompt);
        let response: PredictResponse = self
            .post(self.endpoint(&self.image_model, "predict"), &request)
            .await?;

        let Some(prediction) = response
            .predictions
            .into_iter()
            .find(|prediction| prediction.bytes_base64_encoded.is_some())
        else {
            return Ok(None);
        };
        let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|err| ModelError::Malformed(format!("image payload: {err}")))?;
        let mime_type = prediction
            .mime_type
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        Ok(Some(FeaturedImage::new(mime_type, bytes)))
    }
}
