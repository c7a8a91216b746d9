//! Loan application decisioning: a fixed approval policy, a model-assisted
//! second opinion with local explanations, and per-applicant reports.

pub mod config;
pub mod decisioning;
pub mod error;
pub mod reports;
pub mod scoring;
pub mod telemetry;
