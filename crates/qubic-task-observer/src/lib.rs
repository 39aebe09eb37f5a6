/*
[INPUT]:  Public API exports for qubic-task-observer crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod approval;
pub mod audit;
pub mod config;
pub mod lifecycle;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod view;

// Re-export main types for convenience
pub use approval::{ApprovalGate, DecisionReceipt};
pub use audit::AuditCorrelator;
pub use config::ObserverConfig;
pub use lifecycle::{Interpretation, LifecycleTracker, Observation};
pub use poller::{PollerExit, StatusPoller};
pub use reconcile::{Reconciler, RefreshOutcome};
pub use session::{CreatedTask, ObservationHandle, TaskObserver};
pub use view::ObservationView;
