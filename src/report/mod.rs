//! End-of-session score aggregation and narrative report generation

mod aggregate;
mod generator;

pub use aggregate::{
    aggregate, apply_analysis, communication_score, overall_score, ScoreOverrides,
};
pub use generator::{
    fallback_report, generate_or_fallback, parse_report, LlmReportGenerator, ReportGenerator,
    ReportRequest, ANALYSIS_WINDOW, TRANSCRIPT_WINDOW,
};
