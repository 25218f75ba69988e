//! WordPress REST adapter for [`WordPressGateway`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::application::ports::{CreatedDraft, WordPressError, WordPressGateway};
use crate::domain::wordpress::WordPressSettings;
use crate::infra::error::InfraError;

#[derive(Debug, Serialize)]
struct DraftBody<'a> {
    title: &'a str,
    content: &'a str,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: i64,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: Client,
}

impl WordPressClient {
    pub fn new(timeout: Duration) -> Result<Self, InfraError> {
        let http = Client::builder().timeout(timeout).build().map_err(|err| {
            InfraError::configuration(format!("failed to build HTTP client: {err}"))
        })?;
        Ok(Self { http })
    }

    fn authorized(&self, builder: RequestBuilder, settings: &WordPressSettings) -> RequestBuilder {
        builder.basic_auth(&settings.username, Some(&settings.app_password))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, WordPressError> {
        let response = request.send().await.map_err(|err| {
            error!(target = "trendpress::infra::wordpress", error = %err, "request failed");
            if err.is_timeout() {
                WordPressError::Timeout
            } else {
                WordPressError::Unreachable(err.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            target = "trendpress::infra::wordpress",
            status = status.as_u16(),
            body = %body,
            "WordPress returned an error status"
        );
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            Err(WordPressError::Unauthorized {
                status: status.as_u16(),
            })
        } else {
            Err(WordPressError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl WordPressGateway for WordPressClient {
    async fn current_user(&self, settings: &WordPressSettings) -> Result<(), WordPressError> {
        let url = settings
            .users_me_endpoint()
            .map_err(|err| WordPressError::InvalidSiteUrl(err.to_string()))?;
        debug!(target = "trendpress::infra::wordpress", url = %url, "probing credentials");

        let request = self.authorized(self.http.get(url), settings);
        self.send(request).await.map(|_| ())
    }

    async fn create_draft(
        &self,
        settings: &WordPressSettings,
        title: &str,
        content: &str,
    ) -> Result<CreatedDraft, WordPressError> {
        let url = settings
            .posts_endpoint()
            .map_err(|err| WordPressError::InvalidSiteUrl(err.to_string()))?;
        debug!(target = "trendpress::infra::wordpress", url = %url, "creating draft");

        let body = DraftBody {
            title,
            content,
            status: "draft",
        };
        let request = self.authorized(self.http.post(url), settings).json(&body);
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|err| WordPressError::Malformed(err.to_string()))?;
        let draft: DraftResponse =
            serde_json::from_str(&text).map_err(|err| WordPressError::Malformed(err.to_string()))?;

        Ok(CreatedDraft {
            id: draft.id,
            link: draft.link,
        })
    }
}
