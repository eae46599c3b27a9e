use super::error::{HistoryError, TransitionError};
use super::request::{Request, Role, Status, TimeStamp};
use super::transition::{Actor, is_transition_allowed};
use chrono::Utc;

/// A request together with every transition applied to it.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct RequestContext {
    #[n(0)]
    pub request: Request,
    #[n(1)]
    pub history: Vec<TransitionRecord>,
}

/// One applied status change. Records are chained by digest.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct TransitionRecord {
    #[n(0)]
    pub request_id: String,
    #[n(1)]
    pub actor_id: String,
    #[n(2)]
    pub role: Role,
    #[n(3)]
    pub from: Status,
    #[n(4)]
    pub to: Status,
    #[n(5)]
    pub at: TimeStamp<Utc>,
    #[n(6)]
    pub notes: Option<String>,
    #[n(7)]
    pub prev_digest: Option<String>, // digest of the previous record, None for the first
}

impl TransitionRecord {
    /// sha256 over the CBOR encoding of the record
    pub fn digest(&self) -> anyhow::Result<String> {
        let cbor = minicbor::to_vec(self)?;
        Ok(sha256::digest(&cbor))
    }
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            history: vec![],
        }
    }

    pub fn id(&self) -> &str {
        self.request.id()
    }

    pub fn current_state(&self) -> Status {
        self.request.status()
    }

    /// Validates and applies a status change in memory.
    ///
    /// Nothing is modified when the transition is rejected. Admin transitions
    /// stamp `reviewed_at`/`reviewed_by` (and the notes, when given);
    /// requesters may only act on their own requests.
    pub fn apply_transition(
        &mut self,
        actor: &Actor,
        target: Status,
        at: TimeStamp<Utc>,
        notes: Option<String>,
    ) -> anyhow::Result<&TransitionRecord> {
        let from = self.current_state();

        if actor.role == Role::Requester && actor.id != self.request.requester_id() {
            return Err(TransitionError::Forbidden {
                actor: actor.id.clone(),
                operation: format!("change request {}", self.id()),
            }
            .into());
        }
        if !is_transition_allowed(from, target, actor.role) {
            return Err(TransitionError::NotAllowed {
                from,
                to: target,
                role: actor.role,
            }
            .into());
        }

        let prev_digest = match self.history.last() {
            Some(last) => Some(last.digest()?),
            None => None,
        };
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let record = TransitionRecord {
            request_id: self.id().to_string(),
            actor_id: actor.id.clone(),
            role: actor.role,
            from,
            to: target,
            at: at.clone(),
            notes: notes.clone(),
            prev_digest,
        };

        self.request.set_status(target);
        if actor.role == Role::Admin {
            self.request.mark_reviewed(&actor.id, at, notes);
        }
        self.history.push(record);

        Ok(&self.history[self.history.len() - 1])
    }

    /// Replays the history from `Pending` and checks each step against the
    /// transition table, the digest chain and the stored status.
    pub fn verify_history(&self) -> anyhow::Result<()> {
        let mut status = Status::Pending;
        let mut prev_digest: Option<String> = None;

        for (index, record) in self.history.iter().enumerate() {
            if record.request_id != self.id() {
                return Err(HistoryError::ForeignEntry { index }.into());
            }
            if record.from != status {
                return Err(HistoryError::Discontinuous {
                    index,
                    expected: status,
                }
                .into());
            }
            if !is_transition_allowed(record.from, record.to, record.role) {
                return Err(HistoryError::IllegalStep { index }.into());
            }
            if record.prev_digest != prev_digest {
                return Err(HistoryError::BrokenChain { index }.into());
            }
            status = record.to;
            prev_digest = Some(record.digest()?);
        }

        if status != self.current_state() {
            return Err(HistoryError::StatusMismatch {
                replayed: status,
                stored: self.current_state(),
            }
            .into());
        }
        Ok(())
    }

    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(minicbor::decode(bytes)?)
    }
}
