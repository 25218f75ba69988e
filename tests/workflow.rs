mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{Harness, SESSION_TTL, ScriptedModel, ScriptedWordPress, SlowCreatePosts};
use trendpress::application::ports::{ModelError, WordPressError};
use trendpress::application::repos::PostsRepo;
use trendpress::application::sessions::SessionRegistry;
use trendpress::application::workflow::{TopicChoice, WorkflowController, WorkflowError};
use trendpress::domain::types::{PostStatus, Sentiment};
use trendpress::domain::workflow::{Stage, StepStatus};

#[tokio::test]
async fn research_lands_in_topic_selection_and_saves_a_record() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());

    let view = controller.submit_topic("  Remote Work  ").await.unwrap();

    assert_eq!(view.stage, Stage::TopicSelection);
    assert_eq!(view.topic.as_deref(), Some("Remote Work"));
    let research = view.research.expect("research result");
    assert_eq!(research.sources.len(), 3);
    assert_eq!(research.sources[2].title, "Web Source");
    assert_eq!(research.sources[2].uri, "https://news.example/3");
    assert_eq!(research.trend_analysis.sentiment, Sentiment::Positive);
    assert_eq!(research.trend_analysis.suggested_topics.len(), 4);
    assert_eq!(view.steps.research, StepStatus::Completed);
    assert_eq!(view.steps.strategy, StepStatus::Processing);
    assert!(!view.can_publish);

    let post_id = view.post_id.expect("record saved");
    let record = harness
        .posts
        .find_post("ana", post_id)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.title, "Research: Remote Work");
    assert_eq!(record.status, PostStatus::Researching);
    assert!(record.content.is_empty());
    assert_eq!(harness.model.calls().await, vec!["grounded", "analysis"]);
}

#[tokio::test]
async fn blank_topic_is_rejected_without_calling_the_model() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());

    let err = controller.submit_topic("   ").await.unwrap_err();

    assert!(matches!(err, WorkflowError::Invalid(_)));
    assert_eq!(controller.view().await.stage, Stage::Idle);
    assert!(harness.model.calls().await.is_empty());
}

#[tokio::test]
async fn failed_analysis_still_offers_topic_selection() {
    let model = ScriptedModel::remote_work();
    *model.analysis.lock().await = Err(ModelError::Status {
        status: 500,
        body: "boom".to_string(),
    });
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = WorkflowController::new("ana", harness.services.clone());

    let view = controller.submit_topic("Remote Work").await.unwrap();

    assert_eq!(view.stage, Stage::TopicSelection);
    let research = view.research.expect("research result");
    assert!(research.trend_analysis.is_empty());
    assert_eq!(research.trend_analysis.sentiment, Sentiment::Neutral);
    assert_eq!(research.sources.len(), 3);
}

#[tokio::test]
async fn failed_grounding_fails_the_session() {
    let model = ScriptedModel::remote_work();
    *model.grounded.lock().await = Err(ModelError::Timeout);
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = WorkflowController::new("ana", harness.services.clone());

    let view = controller.submit_topic("Remote Work").await.unwrap();

    assert_eq!(view.stage, Stage::Failed);
    assert!(view.last_error.is_some());
    assert_eq!(view.steps.research, StepStatus::Error);
    assert!(harness.posts.is_empty().await);

    let view = controller.try_again().await.unwrap();
    assert_eq!(view.stage, Stage::Idle);
    assert!(view.last_error.is_none());
}

#[tokio::test]
async fn selecting_a_topic_produces_a_draft_with_image() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();

    assert_eq!(view.stage, Stage::Completed);
    assert_eq!(
        view.selected_topic.map(|topic| topic.title).as_deref(),
        Some("5 Tools for Remote Teams in 2025")
    );
    let post = view.post.expect("generated post");
    assert_eq!(post.title, "5 Tools for Remote Teams in 2025");
    assert_eq!(post.sources.len(), 3);
    assert_eq!(
        post.featured_image.as_deref(),
        Some("data:image/png;base64,AQID")
    );
    assert_eq!(view.editor_content.as_deref(), Some(post.content.as_str()));
    assert_eq!(view.steps.production, StepStatus::Completed);

    let record = harness
        .posts
        .find_post("ana", view.post_id.expect("post id"))
        .await
        .unwrap()
        .expect("record");
    assert_eq!(record.status, PostStatus::Draft);
    assert_eq!(record.title, "5 Tools for Remote Teams in 2025");
    assert_eq!(harness.posts.len().await, 1);
}

#[tokio::test]
async fn out_of_range_topic_index_is_rejected() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let err = controller
        .select_topic(TopicChoice::Index { index: 9 })
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::NoSuchTopic(9)));
    assert_eq!(controller.view().await.stage, Stage::TopicSelection);
}

#[tokio::test]
async fn slow_image_is_dropped_and_the_article_still_completes() {
    let model = ScriptedModel::remote_work();
    *model.image_delay.lock().await = Some(Duration::from_secs(2));
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();

    assert_eq!(view.stage, Stage::Completed);
    let post = view.post.expect("generated post");
    assert_eq!(post.title, "5 Tools for Remote Teams in 2025");
    assert!(post.featured_image.is_none());
}

#[tokio::test]
async fn image_error_is_not_fatal() {
    let model = ScriptedModel::remote_work();
    *model.image.lock().await = Err(ModelError::EmptyResponse);
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let view = controller
        .select_topic(TopicChoice::Index { index: 1 })
        .await
        .unwrap();

    assert_eq!(view.stage, Stage::Completed);
    assert!(view.post.expect("post").featured_image.is_none());
}

#[tokio::test]
async fn article_failure_fails_the_session() {
    let model = ScriptedModel::remote_work();
    *model.article.lock().await = Err(ModelError::Malformed("not json".to_string()));
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();

    assert_eq!(view.stage, Stage::Failed);
    assert_eq!(view.steps.production, StepStatus::Error);
    assert!(view.post.is_none());
}

#[tokio::test]
async fn publishing_requires_a_connected_site() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();
    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    assert!(!view.can_publish);

    let err = controller.publish().await.unwrap_err();

    assert!(matches!(err, WorkflowError::NotConnected));
    assert_eq!(controller.view().await.stage, Stage::Completed);
    assert!(harness.wordpress.drafts.lock().await.is_empty());
}

#[tokio::test]
async fn publishing_sends_edited_content_and_marks_the_record() {
    let harness = Harness::connected().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();
    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    assert!(view.can_publish);

    controller
        .update_content("<p>Edited by hand</p>", false)
        .await
        .unwrap();
    let view = controller.publish().await.unwrap();

    assert_eq!(view.stage, Stage::Completed);
    let result = view.publish_result.expect("publish result");
    assert_eq!(result.id, 42);
    assert_eq!(result.link, "https://blog.example/?p=42");

    let drafts = harness.wordpress.drafts.lock().await.clone();
    assert_eq!(
        drafts,
        vec![(
            "5 Tools for Remote Teams in 2025".to_string(),
            "<p>Edited by hand</p>".to_string()
        )]
    );

    let record = harness
        .posts
        .find_post("ana", view.post_id.expect("post id"))
        .await
        .unwrap()
        .expect("record");
    assert_eq!(record.status, PostStatus::Published);
    assert_eq!(record.wordpress_id, Some(42));
    assert_eq!(
        record.wordpress_link.as_deref(),
        Some("https://blog.example/?p=42")
    );
}

#[tokio::test]
async fn rejected_draft_keeps_the_article_for_a_retry() {
    let wordpress = ScriptedWordPress::accepting();
    *wordpress.draft.lock().await = Err(WordPressError::Unauthorized { status: 401 });
    let settings = trendpress::domain::wordpress::WordPressSettings::new(
        "https://blog.example",
        "editor",
        "app-pass",
    )
    .with_connected(true);
    let harness = Harness::with(ScriptedModel::remote_work(), wordpress, Some(settings)).await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();
    controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();

    let view = controller.publish().await.unwrap();

    assert_eq!(view.stage, Stage::Completed);
    assert!(view.last_error.expect("publish error").contains("401"));
    assert!(view.publish_result.is_none());
    assert_eq!(
        view.post.expect("post").content,
        "<h2>Async first</h2><p>Start here.</p>"
    );

    *harness.wordpress.draft.lock().await = Ok(trendpress::application::ports::CreatedDraft {
        id: 7,
        link: None,
    });
    let view = controller.publish().await.unwrap();
    let result = view.publish_result.expect("publish result");
    assert_eq!(result.id, 7);
    assert!(view.last_error.is_none());
}

#[tokio::test]
async fn saving_content_without_a_record_warns() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();
    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    let post_id = view.post_id.expect("post id");

    let view = controller
        .update_content("<p>Saved</p>", true)
        .await
        .unwrap();
    assert!(view.persistence_warning.is_none());
    let record = harness
        .posts
        .find_post("ana", post_id)
        .await
        .unwrap()
        .expect("record");
    assert_eq!(record.content, "<p>Saved</p>");

    harness.posts.delete_post("ana", post_id).await.unwrap();
    let view = controller
        .update_content("<p>Lost</p>", true)
        .await
        .unwrap();
    assert!(view.persistence_warning.is_some());
    assert_eq!(view.editor_content.as_deref(), Some("<p>Lost</p>"));
}

#[tokio::test]
async fn start_over_and_refine_reset_the_session() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();

    let view = controller.refine().await.unwrap();
    assert_eq!(view.stage, Stage::Idle);
    assert!(view.research.is_none());
    assert!(view.post_id.is_none());

    controller.submit_topic("Remote Work").await.unwrap();
    controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    let view = controller.start_over().await.unwrap();
    assert_eq!(view.stage, Stage::Idle);
    assert!(view.post.is_none());
    assert_eq!(view.steps.research, StepStatus::Waiting);
    assert_eq!(view.steps.production, StepStatus::Waiting);
}

#[tokio::test]
async fn restoring_a_saved_post_replays_without_model_calls() {
    let harness = Harness::connected().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    controller.submit_topic("Remote Work").await.unwrap();
    let research_id = controller.view().await.post_id.expect("research record");
    controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    let calls_before = harness.model.calls().await.len();

    let restored = WorkflowController::restore("ana", harness.services.clone(), research_id)
        .await
        .unwrap();
    let view = restored.view().await;

    assert_eq!(view.stage, Stage::Completed);
    assert_eq!(view.post_id, Some(research_id));
    assert_eq!(
        view.post.expect("post").title,
        "5 Tools for Remote Teams in 2025"
    );
    assert!(view.can_publish);
    assert_eq!(harness.model.calls().await.len(), calls_before);

    let err = WorkflowController::restore("bo", harness.services.clone(), research_id)
        .await
        .err()
        .expect("foreign post");
    assert!(matches!(err, WorkflowError::NotFound));
}

#[tokio::test]
async fn restoring_a_research_only_post_offers_the_topics() {
    let harness = Harness::new().await;
    let controller = WorkflowController::new("ana", harness.services.clone());
    let post_id = controller
        .submit_topic("Remote Work")
        .await
        .unwrap()
        .post_id
        .expect("post id");

    let restored = WorkflowController::restore("ana", harness.services.clone(), post_id)
        .await
        .unwrap();
    let view = restored.view().await;

    assert_eq!(view.stage, Stage::TopicSelection);
    assert_eq!(view.topic.as_deref(), Some("Remote Work"));
    assert_eq!(
        view.research.expect("research").suggested_topics().len(),
        4
    );
}

#[tokio::test]
async fn registry_scopes_sessions_to_their_owner() {
    let harness = Harness::new().await;
    let registry = SessionRegistry::new(harness.services.clone(), SESSION_TTL);

    let (id, controller) = registry.open("ana", None).await.unwrap();
    controller.submit_topic("Remote Work").await.unwrap();

    assert!(registry.get("ana", id).is_some());
    assert!(registry.get("bo", id).is_none());
    assert!(!registry.close("bo", id));
    assert_eq!(registry.len(), 1);

    assert!(harness.posts.list_posts("bo").await.unwrap().is_empty());
    assert_eq!(harness.posts.list_posts("ana").await.unwrap().len(), 1);

    assert!(registry.close("ana", id));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn topic_picked_while_research_is_saving_reuses_its_record() {
    let harness = Harness::new().await;
    let mut services = harness.services.clone();
    services.posts = Arc::new(SlowCreatePosts {
        inner: harness.posts.clone(),
        delay: Duration::from_millis(300),
    });
    let controller = Arc::new(WorkflowController::new("ana", services));

    let research = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit_topic("Remote Work").await }
    });
    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.view().await.stage != Stage::TopicSelection {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("research reaches topic selection");

    let view = controller
        .select_topic(TopicChoice::Index { index: 0 })
        .await
        .unwrap();
    let research_view = research.await.unwrap().unwrap();

    assert_eq!(view.stage, Stage::Completed);
    let records = harness.posts.list_posts("ana").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, PostStatus::Draft);
    assert_eq!(view.post_id, Some(records[0].id));
    assert_eq!(research_view.post_id, Some(records[0].id));
}

#[tokio::test]
async fn start_over_during_research_discards_the_late_result() {
    let model = ScriptedModel::remote_work();
    *model.grounded_delay.lock().await = Some(Duration::from_millis(150));
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = Arc::new(WorkflowController::new("ana", harness.services.clone()));

    let research = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit_topic("Remote Work").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let reset = controller.start_over().await.unwrap();
    assert_eq!(reset.stage, Stage::Idle);

    let late = research.await.unwrap().unwrap();

    assert_eq!(late.stage, Stage::Idle);
    assert!(late.research.is_none());
    let view = controller.view().await;
    assert_eq!(view.stage, Stage::Idle);
    assert!(view.research.is_none());
    assert!(view.post_id.is_none());
    assert!(harness.posts.list_posts("ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn start_over_during_generation_discards_the_late_draft() {
    let model = ScriptedModel::remote_work();
    *model.image_delay.lock().await = Some(Duration::from_millis(150));
    let harness = Harness::with(model, ScriptedWordPress::accepting(), None).await;
    let controller = Arc::new(WorkflowController::new("ana", harness.services.clone()));
    controller.submit_topic("Remote Work").await.unwrap();

    let selection = tokio::spawn({
        let controller = controller.clone();
        async move {
            controller
                .select_topic(TopicChoice::Index { index: 0 })
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let reset = controller.start_over().await.unwrap();
    assert_eq!(reset.stage, Stage::Idle);

    let late = selection.await.unwrap().unwrap();

    assert_eq!(late.stage, Stage::Idle);
    assert!(late.post.is_none());
    let view = controller.view().await;
    assert_eq!(view.stage, Stage::Idle);
    assert!(view.post.is_none());
    assert!(view.post_id.is_none());
    let records = harness.posts.list_posts("ana").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, PostStatus::Researching);
}

#[tokio::test]
async fn idle_sessions_expire_from_the_registry() {
    let harness = Harness::new().await;
    let registry = SessionRegistry::new(harness.services.clone(), Duration::from_millis(200));
    let (idle, _) = registry.open("ana", None).await.unwrap();
    let (active, _) = registry.open("ana", None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(registry.get("ana", active).is_some());
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(registry.get("ana", idle).is_none());
    assert!(registry.get("ana", active).is_some());
    assert_eq!(registry.len(), 1);
}
