//! # pp-services
//!
//! Orchestration between the callable surface and the core ports:
//! the feedback gateway, account operations, abuse blocking, and the
//! notification pipeline with its outbox worker.

pub mod abuse;
pub mod accounts;
pub mod context;
pub mod gateway;
pub mod notify;
pub mod worker;

pub use abuse::{AbuseBlocker, ReportInput};
pub use accounts::AccountService;
pub use context::CallContext;
pub use gateway::FeedbackGateway;
pub use notify::NotificationPipeline;
pub use worker::OutboxWorker;
