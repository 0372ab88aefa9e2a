mod sync_run_model;

pub use sync_run_model::{SyncRun, SyncRunRepositoryTrait, SyncRunStatus, SyncTotals};
