pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod request;
pub mod service;
pub mod sla;
pub mod transition;
pub mod utils;
