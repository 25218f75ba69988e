//! Workflow session state machine.
//!
//! A session moves `Idle → Researching → TopicSelection → GeneratingImage → Writing →
//! Completed`, with `ConnectingWp` as a sub-state of `Completed` while a publish call is
//! in flight and `Failed` as the side branch for fatal research or generation errors.
//! Each state carries only the data valid for it, so impossible combinations (a post
//! without research, a publish result while idle) cannot be represented.
//!
//! Only `StartOver`, `Refine`, and `TryAgain` move a session backwards.

use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::PostRecord;
use crate::domain::posts::{ArticleDraft, FeaturedImage, GeneratedPost, PublishResult};
use crate::domain::research::{ResearchResult, SuggestedTopic, Topic};

const RESEARCH_TITLE_PREFIX: &str = "Research: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Researching,
    TopicSelection,
    GeneratingImage,
    Writing,
    Completed,
    ConnectingWp,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Researching => "researching",
            Stage::TopicSelection => "topic_selection",
            Stage::GeneratingImage => "generating_image",
            Stage::Writing => "writing",
            Stage::Completed => "completed",
            Stage::ConnectingWp => "connecting_wp",
            Stage::Failed => "failed",
        }
    }

    /// Position on the forward path. `Failed` sits off the path and has none.
    pub fn depth(self) -> Option<u8> {
        match self {
            Stage::Idle => Some(0),
            Stage::Researching => Some(1),
            Stage::TopicSelection => Some(2),
            Stage::GeneratingImage => Some(3),
            Stage::Writing => Some(4),
            Stage::Completed | Stage::ConnectingWp => Some(5),
            Stage::Failed => None,
        }
    }

    /// Whether an external call is in flight for this stage.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Stage::Researching | Stage::GeneratingImage | Stage::Writing | Stage::ConnectingWp
        )
    }
}

/// Everything known once a post has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSession {
    pub topic: String,
    pub research: Option<ResearchResult>,
    pub selected: Option<SuggestedTopic>,
    pub post: GeneratedPost,
    /// Diverges from `post.content` once the user edits.
    pub editor_content: String,
    pub publish: Option<PublishResult>,
    pub publish_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Researching {
        topic: String,
    },
    TopicSelection {
        topic: String,
        research: ResearchResult,
    },
    GeneratingImage {
        topic: String,
        research: ResearchResult,
        selected: SuggestedTopic,
    },
    Writing {
        topic: String,
        research: ResearchResult,
        selected: SuggestedTopic,
        image: Option<FeaturedImage>,
    },
    Completed(Box<DraftSession>),
    ConnectingWp(Box<DraftSession>),
    Failed {
        error: String,
    },
}

impl SessionState {
    pub fn stage(&self) -> Stage {
        match self {
            SessionState::Idle => Stage::Idle,
            SessionState::Researching { .. } => Stage::Researching,
            SessionState::TopicSelection { .. } => Stage::TopicSelection,
            SessionState::GeneratingImage { .. } => Stage::GeneratingImage,
            SessionState::Writing { .. } => Stage::Writing,
            SessionState::Completed(_) => Stage::Completed,
            SessionState::ConnectingWp(_) => Stage::ConnectingWp,
            SessionState::Failed { .. } => Stage::Failed,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            SessionState::Researching { topic }
            | SessionState::TopicSelection { topic, .. }
            | SessionState::GeneratingImage { topic, .. }
            | SessionState::Writing { topic, .. } => Some(topic),
            SessionState::Completed(draft) | SessionState::ConnectingWp(draft) => {
                Some(&draft.topic)
            }
            SessionState::Idle | SessionState::Failed { .. } => None,
        }
    }

    pub fn research(&self) -> Option<&ResearchResult> {
        match self {
            SessionState::TopicSelection { research, .. }
            | SessionState::GeneratingImage { research, .. }
            | SessionState::Writing { research, .. } => Some(research),
            SessionState::Completed(draft) | SessionState::ConnectingWp(draft) => {
                draft.research.as_ref()
            }
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&SuggestedTopic> {
        match self {
            SessionState::GeneratingImage { selected, .. }
            | SessionState::Writing { selected, .. } => Some(selected),
            SessionState::Completed(draft) | SessionState::ConnectingWp(draft) => {
                draft.selected.as_ref()
            }
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&DraftSession> {
        match self {
            SessionState::Completed(draft) | SessionState::ConnectingWp(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            SessionState::Failed { error } => Some(error),
            SessionState::Completed(draft) => draft.publish_error.as_deref(),
            _ => None,
        }
    }

    /// Rebuild the state a persisted record represents, without re-running any call.
    ///
    /// Records with content land in `Completed`; records with only research land in
    /// `TopicSelection`; anything else has nothing to replay.
    pub fn restore(record: &PostRecord) -> Option<Self> {
        let research = record.research();
        if record.has_content() {
            let topic = research_topic(&record.title);
            let post = GeneratedPost {
                title: record.title.clone(),
                content: record.content.clone(),
                research_summary: record.research_summary.clone().unwrap_or_default(),
                sources: record.sources.clone(),
                featured_image: record.featured_image_url.clone(),
                wordpress_link: record.wordpress_link.clone(),
            };
            let publish = record
                .wordpress_link
                .as_ref()
                .map(|link| PublishResult {
                    id: record.wordpress_id.unwrap_or_default(),
                    link: link.clone(),
                });
            return Some(SessionState::Completed(Box::new(DraftSession {
                topic,
                research,
                selected: None,
                editor_content: post.content.clone(),
                post,
                publish,
                publish_error: None,
            })));
        }

        research.map(|research| SessionState::TopicSelection {
            topic: research_topic(&record.title),
            research,
        })
    }
}

fn research_topic(title: &str) -> String {
    title
        .strip_prefix(RESEARCH_TITLE_PREFIX)
        .unwrap_or(title)
        .to_string()
}

/// Title given to a record saved right after research.
pub fn research_record_title(topic: &str) -> String {
    format!("{RESEARCH_TITLE_PREFIX}{topic}")
}

#[derive(Debug, Clone)]
pub enum Event {
    SubmitTopic(Topic),
    ResearchSucceeded(ResearchResult),
    ResearchFailed(String),
    SelectTopic(SuggestedTopic),
    Refine,
    ImageResolved(Option<FeaturedImage>),
    WritingSucceeded(ArticleDraft),
    GenerationFailed(String),
    EditContent(String),
    PublishRequested,
    PublishSucceeded(PublishResult),
    PublishFailed(String),
    StartOver,
    TryAgain,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SubmitTopic(_) => "submit_topic",
            Event::ResearchSucceeded(_) => "research_succeeded",
            Event::ResearchFailed(_) => "research_failed",
            Event::SelectTopic(_) => "select_topic",
            Event::Refine => "refine",
            Event::ImageResolved(_) => "image_resolved",
            Event::WritingSucceeded(_) => "writing_succeeded",
            Event::GenerationFailed(_) => "generation_failed",
            Event::EditContent(_) => "edit_content",
            Event::PublishRequested => "publish_requested",
            Event::PublishSucceeded(_) => "publish_succeeded",
            Event::PublishFailed(_) => "publish_failed",
            Event::StartOver => "start_over",
            Event::TryAgain => "try_again",
        }
    }

    /// Events allowed to move the session backwards.
    pub fn is_reset(&self) -> bool {
        matches!(self, Event::StartOver | Event::Refine | Event::TryAgain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("`{event}` is not allowed while {stage}")]
    NotAllowed { stage: &'static str, event: &'static str },
    #[error("topic `{0}` is not one of the suggested topics")]
    UnknownTopic(String),
}

/// Per-step progress shown next to the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Waiting,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ProcessSteps {
    pub research: StepStatus,
    pub strategy: StepStatus,
    pub production: StepStatus,
}

impl ProcessSteps {
    fn for_restored(stage: Stage) -> Self {
        match stage {
            Stage::Completed => Self {
                research: StepStatus::Completed,
                strategy: StepStatus::Completed,
                production: StepStatus::Completed,
            },
            Stage::TopicSelection => Self {
                research: StepStatus::Completed,
                strategy: StepStatus::Processing,
                production: StepStatus::Waiting,
            },
            _ => Self::default(),
        }
    }

    fn record(&mut self, event: &Event) {
        match event {
            Event::SubmitTopic(_) => self.research = StepStatus::Processing,
            Event::ResearchSucceeded(_) => {
                self.research = StepStatus::Completed;
                self.strategy = StepStatus::Processing;
            }
            Event::ResearchFailed(_) => self.research = StepStatus::Error,
            Event::SelectTopic(_) => {
                self.strategy = StepStatus::Completed;
                self.production = StepStatus::Processing;
            }
            Event::WritingSucceeded(_) => self.production = StepStatus::Completed,
            Event::GenerationFailed(_) => self.production = StepStatus::Error,
            Event::StartOver | Event::TryAgain | Event::Refine => *self = Self::default(),
            _ => {}
        }
    }
}

/// A workflow session: the current state plus progress bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    state: SessionState,
    steps: ProcessSteps,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restored(record: &PostRecord) -> Self {
        let state = SessionState::restore(record).unwrap_or_default();
        let steps = ProcessSteps::for_restored(state.stage());
        Self { state, steps }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn steps(&self) -> ProcessSteps {
        self.steps
    }

    /// Breadcrumb label for the current position in the workflow.
    pub fn breadcrumb(&self) -> &'static str {
        match self.stage() {
            Stage::Idle => "New Project",
            Stage::Researching => "Trend Research",
            Stage::TopicSelection => "Topic Strategy",
            Stage::GeneratingImage | Stage::Writing => "Content Production",
            _ if self.state.draft().is_some() => "Editor",
            _ => "Writer",
        }
    }

    /// Apply an event. On rejection the session is left untouched.
    pub fn apply(&mut self, event: Event) -> Result<Stage, TransitionError> {
        let current = std::mem::take(&mut self.state);
        match transition(current, &event) {
            Ok(next) => {
                self.steps.record(&event);
                self.state = next;
                Ok(self.state.stage())
            }
            Err((previous, err)) => {
                self.state = previous;
                Err(err)
            }
        }
    }
}

type TransitionResult = Result<SessionState, (SessionState, TransitionError)>;

fn transition(state: SessionState, event: &Event) -> TransitionResult {
    use SessionState as S;

    match (state, event) {
        (_, Event::StartOver) => Ok(S::Idle),
        (S::Failed { .. }, Event::TryAgain) => Ok(S::Idle),

        (S::Idle, Event::SubmitTopic(topic)) => Ok(S::Researching {
            topic: topic.as_str().to_string(),
        }),
        (S::Researching { topic }, Event::ResearchSucceeded(research)) => {
            Ok(S::TopicSelection {
                topic,
                research: research.clone(),
            })
        }
        (S::Researching { .. }, Event::ResearchFailed(error)) => Ok(S::Failed {
            error: error.clone(),
        }),

        (S::TopicSelection { .. }, Event::Refine) => Ok(S::Idle),
        (S::TopicSelection { topic, research }, Event::SelectTopic(selected)) => {
            if research.find_topic(&selected.title).is_none() {
                let err = TransitionError::UnknownTopic(selected.title.clone());
                return Err((S::TopicSelection { topic, research }, err));
            }
            Ok(S::GeneratingImage {
                topic,
                research,
                selected: selected.clone(),
            })
        }

        (
            S::GeneratingImage {
                topic,
                research,
                selected,
            },
            Event::ImageResolved(image),
        ) => Ok(S::Writing {
            topic,
            research,
            selected,
            image: image.clone(),
        }),
        (
            S::Writing {
                topic,
                research,
                selected,
                image,
            },
            Event::WritingSucceeded(article),
        ) => {
            let post = GeneratedPost::assemble(
                article.clone(),
                research.summary.clone(),
                research.sources.clone(),
                image.as_ref(),
            );
            Ok(S::Completed(Box::new(DraftSession {
                topic,
                research: Some(research),
                selected: Some(selected),
                editor_content: post.content.clone(),
                post,
                publish: None,
                publish_error: None,
            })))
        }
        (S::GeneratingImage { .. } | S::Writing { .. }, Event::GenerationFailed(error)) => {
            Ok(S::Failed {
                error: error.clone(),
            })
        }

        (S::Completed(mut draft), Event::EditContent(content)) => {
            draft.editor_content = content.clone();
            Ok(S::Completed(draft))
        }
        (S::Completed(mut draft), Event::PublishRequested) => {
            draft.publish_error = None;
            Ok(S::ConnectingWp(draft))
        }
        (S::ConnectingWp(mut draft), Event::PublishSucceeded(result)) => {
            draft.post.wordpress_link = Some(result.link.clone());
            draft.publish = Some(result.clone());
            Ok(S::Completed(draft))
        }
        (S::ConnectingWp(mut draft), Event::PublishFailed(error)) => {
            draft.publish_error = Some(error.clone());
            Ok(S::Completed(draft))
        }

        (state, event) => {
            let err = TransitionError::NotAllowed {
                stage: state.stage().as_str(),
                event: event.name(),
            };
            Err((state, err))
        }
    }
}
