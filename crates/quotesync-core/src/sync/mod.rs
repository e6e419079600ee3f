//! Remote synchronization
//!
//! - `remote`: the HTTP/JSON client for the authoritative collection
//! - `merge`: pure remote-wins reconciliation keyed by quote text
//! - `orchestrator`: the single-flight periodic/manual sync cycle

pub mod merge;
pub mod orchestrator;
pub mod remote;

pub use merge::{merge, reconcile, MergeSummary, Reconciliation};
pub use orchestrator::{
    SyncFailure, SyncHandle, SyncOrchestrator, SyncOutcome, SyncPhase, SyncTrigger,
};
pub use remote::{CategorySource, FieldMapping, HttpRemote, NetworkError, RemoteSource};
