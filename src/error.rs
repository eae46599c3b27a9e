use crate::request::{Role, Status};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request type is missing")]
    MissingRequestType,
    #[error("Requester id is missing")]
    MissingRequester,
    #[error("Category is not set")]
    MissingCategory,
    #[error("Unknown category: {0}")]
    InvalidCategory(String),
    #[error("Unknown priority: {0}")]
    InvalidPriority(String),
    #[error("Unknown status: {0}")]
    InvalidStatus(String),
    #[error("Unknown role: {0}")]
    InvalidRole(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// Failures of a status-changing operation. `NotAllowed` is the conflict case.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid status transition: {role} may not move a request from {from} to {to}")]
    NotAllowed { from: Status, to: Status, role: Role },
    #[error("Actor {actor} is not permitted to {operation}")]
    Forbidden { actor: String, operation: String },
    #[error("Request not found: {0}")]
    NotFound(String),
    #[error("Request {0} was modified concurrently")]
    ConcurrentModification(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HistoryError {
    #[error("History entry {index} does not continue from status {expected}")]
    Discontinuous { index: usize, expected: Status },
    #[error("History entry {index} records a transition the table does not allow")]
    IllegalStep { index: usize },
    #[error("History ends in {replayed} but the record says {stored}")]
    StatusMismatch { replayed: Status, stored: Status },
    #[error("History entry {index} belongs to another request")]
    ForeignEntry { index: usize },
    #[error("History entry {index} does not reference the digest of the entry before it")]
    BrokenChain { index: usize },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}
