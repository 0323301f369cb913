//! Output formatters for analysis results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::config::OutputFormat;
use crate::diagnostic::Diagnostic;
use crate::engine::AnalysisResult;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire analysis result
    fn format(&self, result: &AnalysisResult) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}

/// Formatter for a configured output format
pub fn formatter_for(format: OutputFormat, colored: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Text if colored => Box::new(TextFormatter::new()),
        OutputFormat::Text => Box::new(TextFormatter::new().without_color()),
    }
}
