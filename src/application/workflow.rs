//! Workflow controller: drives one session through research, writing, and publishing.
//!
//! The session lock is never held across an upstream call. Every operation that
//! awaits captures the session generation first and drops its result if the
//! session was reset in the meantime.
//!
//! Creating the post record is the one await made under the lock, so a session
//! that already reached a later stage always sees the id of the record it saved.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::application::imaging::ImageService;
use crate::application::publishing::PublishingService;
use crate::application::repos::{CreatePostParams, PostPatch, PostsRepo, RepoError};
use crate::application::research::ResearchService;
use crate::application::settings::SettingsService;
use crate::application::writing::WritingService;
use crate::domain::error::DomainError;
use crate::domain::posts::{GeneratedPost, PublishResult, sanitize_html};
use crate::domain::research::{ResearchResult, SuggestedTopic, Topic};
use crate::domain::types::PostStatus;
use crate::domain::workflow::{
    Event, ProcessSteps, Session, Stage, TransitionError, research_record_title,
};

const METRIC_TRANSITIONS: &str = "trendpress_workflow_transitions_total";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("WordPress is not connected")]
    NotConnected,
    #[error("post not found")]
    NotFound,
    #[error("no suggested topic at index {0}")]
    NoSuchTopic(usize),
    #[error("failed to load post: {0}")]
    Persistence(#[source] RepoError),
}

/// Services a controller needs. Cheap to clone.
#[derive(Clone)]
pub struct WorkflowServices {
    pub research: ResearchService,
    pub imaging: ImageService,
    pub writing: WritingService,
    pub publishing: PublishingService,
    pub settings: SettingsService,
    pub posts: Arc<dyn PostsRepo>,
}

/// How the user picked an article angle.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopicChoice {
    Index { index: usize },
    Suggested(SuggestedTopic),
}

/// Everything a presentation layer needs to render the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub stage: Stage,
    pub breadcrumb: &'static str,
    pub steps: ProcessSteps,
    pub topic: Option<String>,
    pub selected_topic: Option<SuggestedTopic>,
    pub research: Option<ResearchResult>,
    pub post: Option<GeneratedPost>,
    pub editor_content: Option<String>,
    pub publish_result: Option<PublishResult>,
    pub last_error: Option<String>,
    pub persistence_warning: Option<String>,
    pub post_id: Option<i64>,
    pub can_publish: bool,
}

#[derive(Debug, Default)]
struct Inner {
    session: Session,
    generation: u64,
    post_id: Option<i64>,
    persistence_warning: Option<String>,
}

impl Inner {
    fn apply(&mut self, event: Event) -> Result<Stage, TransitionError> {
        let name = event.name();
        let stage = self.session.apply(event)?;
        counter!(METRIC_TRANSITIONS, "stage" => stage.as_str()).increment(1);
        debug!(
            target = "trendpress::application::workflow",
            event = name,
            stage = stage.as_str(),
            "session transitioned"
        );
        Ok(stage)
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.post_id = None;
        self.persistence_warning = None;
    }
}

pub struct WorkflowController {
    owner: String,
    services: WorkflowServices,
    inner: Mutex<Inner>,
}

impl WorkflowController {
    pub fn new(owner: impl Into<String>, services: WorkflowServices) -> Self {
        Self {
            owner: owner.into(),
            services,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Start from a saved post instead of `Idle`, replaying what it stores.
    pub async fn restore(
        owner: impl Into<String>,
        services: WorkflowServices,
        post_id: i64,
    ) -> Result<Self, WorkflowError> {
        let owner = owner.into();
        let record = services
            .posts
            .find_post(&owner, post_id)
            .await
            .map_err(WorkflowError::Persistence)?
            .ok_or(WorkflowError::NotFound)?;
        let session = Session::restored(&record);
        info!(
            target = "trendpress::application::workflow",
            owner = %owner,
            post_id,
            stage = session.stage().as_str(),
            "session restored"
        );
        Ok(Self {
            owner,
            services,
            inner: Mutex::new(Inner {
                session,
                post_id: Some(post_id),
                ..Inner::default()
            }),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    async fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().await
    }

    pub async fn view(&self) -> SessionView {
        let settings = self.services.settings.current().await;
        let inner = self.lock().await;
        build_view(&inner, settings.is_connected)
    }

    pub async fn submit_topic(&self, raw: &str) -> Result<SessionView, WorkflowError> {
        let topic = Topic::parse(raw)?;
        let generation = {
            let mut inner = self.lock().await;
            inner.apply(Event::SubmitTopic(topic.clone()))?;
            inner.reset();
            inner.generation
        };

        let outcome = self.services.research.research(&topic).await;

        {
            let mut inner = self.lock().await;
            if inner.generation != generation {
                return Ok(self.stale_view(inner).await);
            }
            match outcome {
                Ok(research) => {
                    inner.apply(Event::ResearchSucceeded(research.clone()))?;
                    let params = CreatePostParams {
                        owner: self.owner.clone(),
                        title: research_record_title(topic.as_str()),
                        content: String::new(),
                        status: PostStatus::Researching,
                        research_summary: Some(research.summary),
                        trend_analysis: Some(research.trend_analysis),
                        sources: research.sources,
                        featured_image_url: None,
                    };
                    self.create_record(&mut inner, params, "research").await;
                }
                Err(err) => {
                    warn!(
                        target = "trendpress::application::workflow",
                        topic = topic.as_str(),
                        error = %err,
                        "research failed"
                    );
                    inner.apply(Event::ResearchFailed(err.to_string()))?;
                }
            }
        }

        Ok(self.view().await)
    }

    /// Pick an angle, then generate the image and the article concurrently.
    ///
    /// The image result is applied before the article so it becomes visible first.
    pub async fn select_topic(&self, choice: TopicChoice) -> Result<SessionView, WorkflowError> {
        let (generation, selected, summary) = {
            let mut inner = self.lock().await;
            let selected = match choice {
                TopicChoice::Index { index } => inner
                    .session
                    .state()
                    .research()
                    .and_then(|research| research.suggested_topics().get(index))
                    .cloned()
                    .ok_or(WorkflowError::NoSuchTopic(index))?,
                TopicChoice::Suggested(topic) => topic,
            };
            inner.apply(Event::SelectTopic(selected.clone()))?;
            let summary = inner
                .session
                .state()
                .research()
                .map(|research| research.summary.clone())
                .unwrap_or_default();
            (inner.generation, selected, summary)
        };

        let writing = self.services.writing.clone();
        let title = selected.title.clone();
        let article = tokio::spawn(async move { writing.write(&title, &summary).await });
        let image = self.services.imaging.generate(&selected.title).await;

        {
            let mut inner = self.lock().await;
            if inner.generation != generation {
                article.abort();
                return Ok(self.stale_view(inner).await);
            }
            inner.apply(Event::ImageResolved(image))?;
        }

        let article = match article.await {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(err) => Err(format!("failed to generate content: {err}")),
        };

        let patch = {
            let mut inner = self.lock().await;
            if inner.generation != generation {
                return Ok(self.stale_view(inner).await);
            }
            match article {
                Ok(draft) => {
                    inner.apply(Event::WritingSucceeded(draft))?;
                    let saved = inner
                        .session
                        .state()
                        .draft()
                        .map(|draft| (draft.post.clone(), draft.research.clone()));
                    match (inner.post_id, saved) {
                        (Some(post_id), Some((post, _))) => Some((
                            post_id,
                            PostPatch {
                                title: Some(post.title),
                                content: Some(post.content),
                                status: Some(PostStatus::Draft),
                                featured_image_url: post.featured_image,
                                ..PostPatch::default()
                            },
                        )),
                        (None, Some((post, research))) => {
                            let params = CreatePostParams {
                                owner: self.owner.clone(),
                                title: post.title,
                                content: post.content,
                                status: PostStatus::Draft,
                                research_summary: Some(post.research_summary),
                                trend_analysis: research.map(|research| research.trend_analysis),
                                sources: post.sources,
                                featured_image_url: post.featured_image,
                            };
                            self.create_record(&mut inner, params, "draft").await;
                            None
                        }
                        (_, None) => None,
                    }
                }
                Err(message) => {
                    warn!(
                        target = "trendpress::application::workflow",
                        title = %selected.title,
                        error = %message,
                        "content generation failed"
                    );
                    inner.apply(Event::GenerationFailed(message))?;
                    None
                }
            }
        };

        if let Some((post_id, patch)) = patch {
            self.persist_patch(generation, post_id, patch, "draft").await;
        }

        Ok(self.view().await)
    }

    pub async fn refine(&self) -> Result<SessionView, WorkflowError> {
        {
            let mut inner = self.lock().await;
            inner.apply(Event::Refine)?;
            inner.reset();
        }
        Ok(self.view().await)
    }

    pub async fn start_over(&self) -> Result<SessionView, WorkflowError> {
        {
            let mut inner = self.lock().await;
            inner.apply(Event::StartOver)?;
            inner.reset();
        }
        Ok(self.view().await)
    }

    pub async fn try_again(&self) -> Result<SessionView, WorkflowError> {
        {
            let mut inner = self.lock().await;
            inner.apply(Event::TryAgain)?;
            inner.reset();
        }
        Ok(self.view().await)
    }

    /// Replace the editor content; optionally save it to the post record.
    pub async fn update_content(
        &self,
        content: &str,
        persist: bool,
    ) -> Result<SessionView, WorkflowError> {
        let content = sanitize_html(content);
        let (generation, post_id) = {
            let mut inner = self.lock().await;
            inner.apply(Event::EditContent(content.clone()))?;
            (inner.generation, inner.post_id)
        };

        if persist {
            match post_id {
                Some(post_id) => {
                    let patch = PostPatch {
                        content: Some(content),
                        ..PostPatch::default()
                    };
                    self.persist_patch(generation, post_id, patch, "content").await;
                }
                None => {
                    let mut inner = self.lock().await;
                    inner.persistence_warning =
                        Some("content was not saved: session has no stored post".to_string());
                }
            }
        }

        Ok(self.view().await)
    }

    /// Create a WordPress draft from the current editor content.
    ///
    /// Refused while WordPress is not connected. A failed call returns the session
    /// to `Completed` with the error recorded, so publishing can be retried alone.
    pub async fn publish(&self) -> Result<SessionView, WorkflowError> {
        let settings = self.services.settings.current().await;
        if !settings.is_connected {
            return Err(WorkflowError::NotConnected);
        }

        let (generation, title, content) = {
            let mut inner = self.lock().await;
            inner.apply(Event::PublishRequested)?;
            let (title, content) = inner
                .session
                .state()
                .draft()
                .map(|draft| (draft.post.title.clone(), draft.editor_content.clone()))
                .unwrap_or_default();
            (inner.generation, title, content)
        };

        let outcome = self
            .services
            .publishing
            .draft_post(&settings, &title, &content)
            .await;

        let published = {
            let mut inner = self.lock().await;
            if inner.generation != generation {
                return Ok(self.stale_view(inner).await);
            }
            match outcome {
                Ok(result) => {
                    inner.apply(Event::PublishSucceeded(result.clone()))?;
                    inner.post_id.map(|post_id| (post_id, result))
                }
                Err(err) => {
                    inner.apply(Event::PublishFailed(format!("publishing failed: {err}")))?;
                    None
                }
            }
        };

        if let Some((post_id, result)) = published {
            let patch = PostPatch {
                status: Some(PostStatus::Published),
                wordpress_id: Some(result.id),
                wordpress_link: Some(result.link),
                ..PostPatch::default()
            };
            self.persist_patch(generation, post_id, patch, "publish result").await;
        }

        Ok(self.view().await)
    }

    async fn stale_view(&self, inner: MutexGuard<'_, Inner>) -> SessionView {
        debug!(
            target = "trendpress::application::workflow",
            owner = %self.owner,
            "discarding result for a reset session"
        );
        drop(inner);
        self.view().await
    }

    /// Save a new record for the session. Called with the session lock held.
    async fn create_record(
        &self,
        inner: &mut Inner,
        params: CreatePostParams,
        what: &'static str,
    ) {
        match self.services.posts.create_post(params).await {
            Ok(record) => {
                inner.post_id = Some(record.id);
                inner.persistence_warning = None;
                info!(
                    target = "trendpress::application::workflow",
                    owner = %self.owner,
                    post_id = record.id,
                    what,
                    "post saved"
                );
            }
            Err(err) => record_persistence_failure(inner, &self.owner, what, &err),
        }
    }

    async fn persist_patch(
        &self,
        generation: u64,
        post_id: i64,
        patch: PostPatch,
        what: &'static str,
    ) {
        let result = self
            .services
            .posts
            .patch_post(&self.owner, post_id, patch)
            .await;
        let mut inner = self.lock().await;
        if inner.generation != generation {
            return;
        }
        match result {
            Ok(_) => inner.persistence_warning = None,
            Err(err) => record_persistence_failure(&mut inner, &self.owner, what, &err),
        }
    }
}

fn record_persistence_failure(inner: &mut Inner, owner: &str, what: &str, err: &RepoError) {
    warn!(
        target = "trendpress::application::workflow",
        owner,
        what,
        error = %err,
        "post could not be saved; session content kept in memory"
    );
    inner.persistence_warning = Some(format!("{what} was not saved: {err}"));
}

fn build_view(inner: &Inner, connected: bool) -> SessionView {
    let session = &inner.session;
    let state = session.state();
    let draft = state.draft();
    SessionView {
        stage: session.stage(),
        breadcrumb: session.breadcrumb(),
        steps: session.steps(),
        topic: state.topic().map(str::to_string),
        selected_topic: state.selected().cloned(),
        research: state.research().cloned(),
        post: draft.map(|draft| draft.post.clone()),
        editor_content: draft.map(|draft| draft.editor_content.clone()),
        publish_result: draft.and_then(|draft| draft.publish.clone()),
        last_error: state.last_error().map(str::to_string),
        persistence_warning: inner.persistence_warning.clone(),
        post_id: inner.post_id,
        can_publish: connected && session.stage() == Stage::Completed,
    }
}
