//! Per-applicant report artifacts and batch comparison metrics.

pub mod formatter;
pub mod summary;
pub mod writer;

pub use formatter::{render_report, report_fields, REPORT_TITLE};
pub use summary::{ComparisonSummary, ComparisonVerdict};
pub use writer::{BatchReportOutcome, ReportError, ReportWriter};
