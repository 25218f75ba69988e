//! In-memory registry of live workflow sessions, keyed by id and scoped to the owner.
//!
//! Sessions nobody has looked at for `idle_ttl` are swept on the next `open` or `get`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::gauge;
use tracing::debug;
use uuid::Uuid;

use crate::application::workflow::{WorkflowController, WorkflowError, WorkflowServices};

const METRIC_ACTIVE_SESSIONS: &str = "trendpress_active_sessions";

struct LiveSession {
    controller: Arc<WorkflowController>,
    touched_at: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    services: WorkflowServices,
    idle_ttl: Duration,
    sessions: Arc<DashMap<Uuid, LiveSession>>,
}

impl SessionRegistry {
    pub fn new(services: WorkflowServices, idle_ttl: Duration) -> Self {
        Self {
            services,
            idle_ttl,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Open a new session, optionally restored from a saved post.
    pub async fn open(
        &self,
        owner: &str,
        restore_from: Option<i64>,
    ) -> Result<(Uuid, Arc<WorkflowController>), WorkflowError> {
        self.sweep_idle();
        let controller = match restore_from {
            Some(post_id) => {
                WorkflowController::restore(owner, self.services.clone(), post_id).await?
            }
            None => WorkflowController::new(owner, self.services.clone()),
        };
        let id = Uuid::new_v4();
        let controller = Arc::new(controller);
        self.sessions.insert(
            id,
            LiveSession {
                controller: controller.clone(),
                touched_at: Instant::now(),
            },
        );
        self.record_gauge();
        Ok((id, controller))
    }

    /// Sessions owned by someone else are indistinguishable from missing ones.
    pub fn get(&self, owner: &str, id: Uuid) -> Option<Arc<WorkflowController>> {
        self.sweep_idle();
        let mut entry = self.sessions.get_mut(&id)?;
        if entry.controller.owner() != owner {
            return None;
        }
        entry.touched_at = Instant::now();
        Some(entry.controller.clone())
    }

    pub fn close(&self, owner: &str, id: Uuid) -> bool {
        let removed = self
            .sessions
            .remove_if(&id, |_, live| live.controller.owner() == owner)
            .is_some();
        if removed {
            self.record_gauge();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sweep_idle(&self) {
        let before = self.sessions.len();
        let now = Instant::now();
        self.sessions
            .retain(|_, live| now.duration_since(live.touched_at) < self.idle_ttl);
        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            debug!(
                target = "trendpress::application::sessions",
                swept,
                "idle sessions dropped"
            );
            self.record_gauge();
        }
    }

    fn record_gauge(&self) {
        gauge!(METRIC_ACTIVE_SESSIONS).set(self.sessions.len() as f64);
    }
}
