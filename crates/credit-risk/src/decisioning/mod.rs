//! Applicant intake, feature derivation, and the approval policy.

pub mod domain;
pub mod evaluation;
pub mod features;
pub mod intake;
pub mod service;

pub use domain::{
    Applicant, ApplicantId, ApplicantRecord, Decision, EmploymentStatus, RecordError,
};
pub use evaluation::{PolicyRule, PolicyThresholds, RuleEngine, RuleOutcome};
pub use features::DerivedFeatures;
pub use intake::{ApplicantImporter, ImportReport, IntakeError, RejectedRow};
pub use service::{ApplicantDecision, DecisionPipeline, RiskFlag};
