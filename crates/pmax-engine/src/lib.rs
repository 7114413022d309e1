//! Weekly review engine: aggregation, classification, budget advice, alert
//! detection, image gap analysis and upload verification.
//!
//! Every function here is pure and synchronous. Collaborator I/O (storage,
//! notification, copy generation) lives in the calling crate.

pub mod aggregate;
pub mod alerts;
pub mod budget;
pub mod classify;
pub mod error;
pub mod gap;
pub mod review;
pub mod verify;

pub use aggregate::{aggregate, Aggregation, ReportWindow, DEFAULT_WINDOW_DAYS};
pub use alerts::{detect_alerts, upstream_failure, Alert, AlertKind, Severity};
pub use budget::{advise, market_ceiling};
pub use classify::{classify, diagnose, FlagFollowUp, FlaggedAsset};
pub use error::{EngineError, ValidationIssue};
pub use gap::{analyze_gaps, CategoryGap, GapAnalysis, GapStatus, UploadCandidate};
pub use review::{run_review, GenerationResult, ReviewInput, ReviewOutput, RunSummary};
pub use verify::{
    compare, reconcile_registry, LiveAsset, PriorFlag, ReplacementStatus, VerificationOutcome,
    VerificationReport, VerificationStatus,
};
