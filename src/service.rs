//! Service layer API for request workflow operations
use super::config::TrackerConfig;
use super::context::RequestContext;
use super::error::TransitionError;
use super::request::{Request, RequestDraft, Role, Status, TimeStamp};
use super::transition::{Actor, AdminAction};
use std::sync::Arc;
use tracing::{info, warn};

pub struct RequestService {
    instance: Arc<sled::Db>,
}

impl RequestService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Opens (or creates) the store at `config.db_path`.
    pub fn open(config: &TrackerConfig) -> anyhow::Result<Self> {
        let db = sled::open(&config.db_path)?;
        info!(path = %config.db_path.display(), "opened request store");
        Ok(Self::new(Arc::new(db)))
    }

    /// Load request context from database
    pub fn load_request_context(&self, request_id: &str) -> anyhow::Result<RequestContext> {
        match self.instance.get(request_id.as_bytes())? {
            Some(bytes) => RequestContext::decode(&bytes),
            None => Err(TransitionError::NotFound(request_id.to_string()).into()),
        }
    }

    pub fn get_request(&self, request_id: &str) -> anyhow::Result<Request> {
        Ok(self.load_request_context(request_id)?.request)
    }

    /// Every stored request, in key order.
    pub fn list_requests(&self) -> anyhow::Result<Vec<Request>> {
        self.instance
            .iter()
            .values()
            .map(|bytes| Ok(RequestContext::decode(&bytes?)?.request))
            .collect()
    }

    pub fn requests_for(&self, requester_id: &str) -> anyhow::Result<Vec<Request>> {
        Ok(self
            .list_requests()?
            .into_iter()
            .filter(|r| r.requester_id() == requester_id)
            .collect())
    }

    /// Submit a new request. Only requesters may submit.
    pub fn submit_request(
        &self,
        draft: RequestDraft,
        actor: &Actor,
    ) -> anyhow::Result<RequestContext> {
        if actor.role != Role::Requester {
            return Err(TransitionError::Forbidden {
                actor: actor.id.clone(),
                operation: "submit requests".into(),
            }
            .into());
        }

        let request = draft.finalise(&actor.id, TimeStamp::new())?;
        let request_context = RequestContext::new(request);

        let inserted = self.instance.compare_and_swap(
            request_context.id().as_bytes(),
            None as Option<&[u8]>,
            Some(request_context.encode()?),
        )?;
        if inserted.is_err() {
            return Err(TransitionError::ConcurrentModification(request_context.id().to_string()).into());
        }

        info!(
            request_id = request_context.id(),
            requester = %actor.id,
            category = %request_context.request.category(),
            priority = %request_context.request.priority(),
            "request submitted"
        );
        Ok(request_context)
    }

    /// Requester self-service cancel.
    pub fn cancel_request(&self, request_id: &str, actor: &Actor) -> anyhow::Result<RequestContext> {
        self.transition_request(request_id, actor, Status::Cancelled, None)
    }

    /// Apply one of the admin review actions.
    pub fn review_request(
        &self,
        request_id: &str,
        actor: &Actor,
        action: AdminAction,
        notes: Option<String>,
    ) -> anyhow::Result<RequestContext> {
        if actor.role != Role::Admin {
            return Err(TransitionError::Forbidden {
                actor: actor.id.clone(),
                operation: format!("{} requests", action.as_str()),
            }
            .into());
        }
        self.transition_request(request_id, actor, action.target_status(), notes)
    }

    /// Validate a status change and persist it in a single write.
    ///
    /// The stored context is swapped only if it is still the one that was
    /// validated; a rejected or raced transition writes nothing.
    pub fn transition_request(
        &self,
        request_id: &str,
        actor: &Actor,
        target: Status,
        notes: Option<String>,
    ) -> anyhow::Result<RequestContext> {
        let current = self
            .instance
            .get(request_id.as_bytes())?
            .ok_or_else(|| TransitionError::NotFound(request_id.to_string()))?;
        let mut request_context = RequestContext::decode(&current)?;
        let from = request_context.current_state();

        if let Err(err) = request_context.apply_transition(actor, target, TimeStamp::new(), notes) {
            warn!(
                request_id,
                from = %from,
                to = %target,
                role = %actor.role,
                actor = %actor.id,
                error = %err,
                "transition rejected"
            );
            return Err(err);
        }

        let swapped = self.instance.compare_and_swap(
            request_id.as_bytes(),
            Some(current),
            Some(request_context.encode()?),
        )?;
        if swapped.is_err() {
            warn!(request_id, "request changed while the transition was validated");
            return Err(TransitionError::ConcurrentModification(request_id.to_string()).into());
        }

        info!(
            request_id,
            from = %from,
            to = %target,
            role = %actor.role,
            actor = %actor.id,
            "transition applied"
        );
        Ok(request_context)
    }
}
