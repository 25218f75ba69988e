#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use trendpress::application::imaging::ImageService;
use trendpress::application::ports::{
    Citation, CreatedDraft, GenerativeModel, GroundedText, ModelError, WordPressError,
    WordPressGateway,
};
use trendpress::application::publishing::PublishingService;
use trendpress::application::repos::{
    CreatePostParams, PostPatch, PostsRepo, RepoError, SettingsRepo,
};
use trendpress::application::research::ResearchService;
use trendpress::application::settings::SettingsService;
use trendpress::application::workflow::WorkflowServices;
use trendpress::application::writing::WritingService;
use trendpress::domain::entities::{PostRecord, PostSummary};
use trendpress::domain::posts::FeaturedImage;
use trendpress::domain::wordpress::WordPressSettings;
use trendpress::infra::memory::InMemoryPostsRepo;

pub const IMAGE_TIMEOUT: Duration = Duration::from_millis(200);
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

/// Generative model answering from canned responses.
///
/// `structured` tells the analysis call from the writing call by the schema it receives.
pub struct ScriptedModel {
    pub grounded: Mutex<Result<GroundedText, ModelError>>,
    pub grounded_delay: Mutex<Option<Duration>>,
    pub analysis: Mutex<Result<Value, ModelError>>,
    pub article: Mutex<Result<Value, ModelError>>,
    pub image: Mutex<Result<Option<FeaturedImage>, ModelError>>,
    pub image_delay: Mutex<Option<Duration>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedModel {
    pub fn remote_work() -> Self {
        Self {
            grounded: Mutex::new(Ok(GroundedText {
                text: "- Oct 1: Async standups become the norm\n- Oct 3: Hybrid offices shrink"
                    .to_string(),
                citations: vec![
                    citation("Remote Weekly", "https://remote.example/1"),
                    citation("Work Trends", "https://trends.example/2"),
                    Citation {
                        title: None,
                        uri: Some("https://news.example/3".to_string()),
                    },
                ],
            })),
            grounded_delay: Mutex::new(None),
            analysis: Mutex::new(Ok(remote_work_analysis())),
            article: Mutex::new(Ok(json!({
                "title": "5 Tools for Remote Teams in 2025",
                "content": "<h2>Async first</h2><p>Start here.</p>"
            }))),
            image: Mutex::new(Ok(Some(FeaturedImage::new("image/png", vec![1, 2, 3])))),
            image_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

pub fn citation(title: &str, uri: &str) -> Citation {
    Citation {
        title: Some(title.to_string()),
        uri: Some(uri.to_string()),
    }
}

pub fn remote_work_analysis() -> Value {
    json!({
        "sentiment": "positive",
        "key_events": ["Async standups", "Office downsizing"],
        "sources_news": ["Remote Weekly"],
        "sources_social": ["#remotework"],
        "suggested_topics": [
            {
                "title": "5 Tools for Remote Teams in 2025",
                "rationale": "Tool fatigue is trending"
            },
            { "title": "The End of the Open Office", "rationale": "Downsizing news" },
            { "title": "Async Standups Done Right", "rationale": "Practical angle" },
            { "title": "Remote Hiring Beyond Borders", "rationale": "Global talent" }
        ]
    })
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn grounded(&self, _prompt: &str) -> Result<GroundedText, ModelError> {
        self.calls.lock().await.push("grounded");
        let delay = *self.grounded_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.grounded.lock().await.clone()
    }

    async fn structured(&self, _prompt: &str, schema: Value) -> Result<Value, ModelError> {
        if schema["properties"].get("suggested_topics").is_some() {
            self.calls.lock().await.push("analysis");
            self.analysis.lock().await.clone()
        } else {
            self.calls.lock().await.push("article");
            self.article.lock().await.clone()
        }
    }

    async fn image(&self, _prompt: &str) -> Result<Option<FeaturedImage>, ModelError> {
        self.calls.lock().await.push("image");
        let delay = *self.image_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.image.lock().await.clone()
    }
}

/// WordPress gateway with scripted probe and draft outcomes.
pub struct ScriptedWordPress {
    pub probe: Mutex<Result<(), WordPressError>>,
    pub draft: Mutex<Result<CreatedDraft, WordPressError>>,
    pub drafts: Mutex<Vec<(String, String)>>,
}

impl ScriptedWordPress {
    pub fn accepting() -> Self {
        Self {
            probe: Mutex::new(Ok(())),
            draft: Mutex::new(Ok(CreatedDraft {
                id: 42,
                link: Some("https://blog.example/?p=42".to_string()),
            })),
            drafts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WordPressGateway for ScriptedWordPress {
    async fn current_user(&self, _settings: &WordPressSettings) -> Result<(), WordPressError> {
        self.probe.lock().await.clone()
    }

    async fn create_draft(
        &self,
        _settings: &WordPressSettings,
        title: &str,
        content: &str,
    ) -> Result<CreatedDraft, WordPressError> {
        self.drafts
            .lock()
            .await
            .push((title.to_string(), content.to_string()));
        self.draft.lock().await.clone()
    }
}

#[derive(Default)]
pub struct MemorySettingsRepo {
    pub stored: Mutex<Option<WordPressSettings>>,
}

#[async_trait]
impl SettingsRepo for MemorySettingsRepo {
    async fn read_settings(&self) -> Result<Option<WordPressSettings>, RepoError> {
        Ok(self.stored.lock().await.clone())
    }

    async fn write_settings(&self, settings: &WordPressSettings) -> Result<(), RepoError> {
        *self.stored.lock().await = Some(settings.clone());
        Ok(())
    }
}

/// Posts repository whose inserts take `delay` to land.
pub struct SlowCreatePosts {
    pub inner: InMemoryPostsRepo,
    pub delay: Duration,
}

#[async_trait]
impl PostsRepo for SlowCreatePosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_post(params).await
    }

    async fn find_post(&self, owner: &str, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.inner.find_post(owner, id).await
    }

    async fn list_posts(&self, owner: &str) -> Result<Vec<PostSummary>, RepoError> {
        self.inner.list_posts(owner).await
    }

    async fn patch_post(
        &self,
        owner: &str,
        id: i64,
        patch: PostPatch,
    ) -> Result<PostRecord, RepoError> {
        self.inner.patch_post(owner, id, patch).await
    }

    async fn delete_post(&self, owner: &str, id: i64) -> Result<(), RepoError> {
        self.inner.delete_post(owner, id).await
    }
}

pub struct Harness {
    pub model: Arc<ScriptedModel>,
    pub wordpress: Arc<ScriptedWordPress>,
    pub settings_repo: Arc<MemorySettingsRepo>,
    pub posts: InMemoryPostsRepo,
    pub services: WorkflowServices,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(
            ScriptedModel::remote_work(),
            ScriptedWordPress::accepting(),
            None,
        )
        .await
    }

    /// Harness whose WordPress settings start out connected.
    pub async fn connected() -> Self {
        let settings = WordPressSettings::new("https://blog.example", "editor", "app-pass")
            .with_connected(true);
        Self::with(
            ScriptedModel::remote_work(),
            ScriptedWordPress::accepting(),
            Some(settings),
        )
        .await
    }

    pub async fn with(
        model: ScriptedModel,
        wordpress: ScriptedWordPress,
        stored: Option<WordPressSettings>,
    ) -> Self {
        let model = Arc::new(model);
        let wordpress = Arc::new(wordpress);
        let settings_repo = Arc::new(MemorySettingsRepo {
            stored: Mutex::new(stored),
        });
        let posts = InMemoryPostsRepo::new();

        let publishing = PublishingService::new(wordpress.clone());
        let settings = SettingsService::load(settings_repo.clone(), publishing.clone()).await;
        let services = WorkflowServices {
            research: ResearchService::new(model.clone()),
            imaging: ImageService::new(model.clone(), IMAGE_TIMEOUT),
            writing: WritingService::new(model.clone()),
            publishing,
            settings,
            posts: Arc::new(posts.clone()),
        };

        Self {
            model,
            wordpress,
            settings_repo,
            posts,
            services,
        }
    }
}
