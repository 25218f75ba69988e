use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::publishing::ConnectionCheck;
use crate::application::workflow::SessionView;
use crate::domain::entities::PostSummary;
use crate::domain::wordpress::WordPressSettings;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SessionOpenRequest {
    #[serde(default, alias = "postId")]
    pub post_id: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ResearchRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ContentRequest {
    pub content: String,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: WordPressSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionCheck>,
}
