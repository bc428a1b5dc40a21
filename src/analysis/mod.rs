//! Code quality analysis: the analyzer client and the edit debouncer that feeds it

mod analyzer;
mod debouncer;

pub use analyzer::{parse_analysis, AnalysisContext, CodeAnalysis, CodeAnalyzer, LlmCodeAnalyzer};
pub use debouncer::{CodeEdit, Debouncer};
