//! Role-gated request status transitions
//!
//! [`allowed_targets`] is the only place the transition table lives. Every
//! status change in the crate is checked against it before anything is
//! written.
use super::error::ValidationError;
use super::request::{Role, Status};
use std::str::FromStr;

/// Who performs an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
    pub fn requester(id: impl Into<String>) -> Self {
        Self::new(id, Role::Requester)
    }
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }
}

/// Statuses `role` may move a request to from `current`.
pub fn allowed_targets(current: Status, role: Role) -> &'static [Status] {
    use Status::*;

    match (role, current) {
        (Role::Requester, Pending | Approved | InProgress) => &[Cancelled],
        (Role::Admin, Pending) => &[Approved, Denied, InProgress],
        (Role::Admin, Approved) => &[InProgress],
        (Role::Admin, InProgress) => &[Completed, Denied],
        (_, Denied | Completed | Cancelled) => &[],
    }
}

pub fn is_transition_allowed(current: Status, target: Status, role: Role) -> bool {
    allowed_targets(current, role).contains(&target)
}

/// Text form of [`is_transition_allowed`]. Unknown statuses or roles are never allowed.
pub fn is_transition_allowed_str(current: &str, target: &str, role: &str) -> bool {
    match (
        current.parse::<Status>(),
        target.parse::<Status>(),
        role.parse::<Role>(),
    ) {
        (Ok(current), Ok(target), Ok(role)) => is_transition_allowed(current, target, role),
        _ => false,
    }
}

/// The review actions offered to admins.
///
/// Approve moves a pending request straight to `InProgress`; nothing here
/// targets the legacy `Approved` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    Approve,
    Deny,
    Complete,
}

impl AdminAction {
    pub const ALL: [AdminAction; 3] = [AdminAction::Approve, AdminAction::Deny, AdminAction::Complete];

    pub fn target_status(&self) -> Status {
        match self {
            AdminAction::Approve => Status::InProgress,
            AdminAction::Deny => Status::Denied,
            AdminAction::Complete => Status::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::Approve => "approve",
            AdminAction::Deny => "deny",
            AdminAction::Complete => "complete",
        }
    }

    /// Whether this action is valid for a request currently in `current`.
    pub fn applies_to(&self, current: Status) -> bool {
        is_transition_allowed(current, self.target_status(), Role::Admin)
    }
}

impl FromStr for AdminAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidAction(s.to_string()))
    }
}
