//! Finfolio Connect - broker synchronization orchestration.
//!
//! This crate ties the broker protocol clients to the domain store:
//! the [`service`] module reconciles fetched snapshots into holdings,
//! cash balances, positions and transactions; the [`orchestrator`] module
//! runs the whole flow per user, on demand or as a scheduled batch, and
//! records every attempt in the sync history.

pub mod clients;
pub mod models;
pub mod orchestrator;
pub mod service;
pub mod traits;

pub use models::{SyncMode, SyncSummary, UserSyncOutcome};
pub use orchestrator::{SyncConfig, SyncOrchestrator};
pub use service::HoldingsSyncService;
