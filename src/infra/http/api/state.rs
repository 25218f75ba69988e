use std::sync::Arc;

use crate::application::access::AccessTokens;
use crate::application::library::PostLibrary;
use crate::application::sessions::SessionRegistry;
use crate::application::settings::SettingsService;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionRegistry,
    pub library: PostLibrary,
    pub settings: SettingsService,
    pub tokens: Arc<AccessTokens>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}
