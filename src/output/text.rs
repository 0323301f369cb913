//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::AnalysisResult;
use colored::*;
use std::path::Path;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show help text
    pub show_help: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_help: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        match severity {
            Severity::Error => self.paint(&s, |s| s.red().bold()),
            Severity::Warning => self.paint(&s, |s| s.yellow().bold()),
            Severity::Info => self.paint(&s, |s| s.blue()),
        }
    }

    fn format_location(&self, diag: &Diagnostic) -> String {
        format!(
            "{}:{}:{}",
            diag.location.file.display(),
            diag.location.line,
            diag.location.column
        )
    }

    fn count(&self, n: usize, singular: &str, plural: &str, style: fn(&str) -> ColoredString) -> String {
        let s = format!("{} {}", n, if n == 1 { singular } else { plural });
        self.paint(&s, style)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &AnalysisResult) -> String {
        let mut output = String::new();

        // Group by file, keeping the order files first appear in
        let mut by_file: Vec<(&Path, Vec<&Diagnostic>)> = Vec::new();
        for diag in &result.diagnostics {
            let file = diag.location.file.as_path();
            match by_file.iter_mut().find(|(f, _)| *f == file) {
                Some((_, diags)) => diags.push(diag),
                None => by_file.push((file, vec![diag])),
            }
        }

        for (file, diagnostics) in &by_file {
            let name = file.display().to_string();
            output.push_str(&self.paint(&name, |s| s.underline()));
            output.push('\n');

            for diag in diagnostics {
                output.push_str(&self.format_diagnostic(diag));
            }
            output.push('\n');
        }

        if self.show_stats {
            output.push_str(&format!(
                "{} {} processed",
                result.units_processed,
                if result.units_processed == 1 {
                    "unit"
                } else {
                    "units"
                }
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                counts.push(self.count(result.error_count, "error", "errors", |s| s.red()));
            }
            if result.warning_count > 0 {
                counts.push(self.count(result.warning_count, "warning", "warnings", |s| {
                    s.yellow()
                }));
            }
            if result.info_count > 0 {
                counts.push(self.count(result.info_count, "info", "infos", |s| s.blue()));
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = format!(
            "{}: {}[{}]: {}\n",
            self.format_location(diag),
            self.severity_str(diag.severity),
            self.paint(&diag.rule_id, |s| s.cyan()),
            diag.message
        );

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("   {} {}\n", self.paint("= help:", |s| s.green()), help));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use std::path::PathBuf;

    fn diag(file: &str, rule: &str, severity: Severity) -> Diagnostic {
        Diagnostic::new(
            rule,
            severity,
            "Dynamic call to static method Factory::create().",
            Location::new(PathBuf::from(file), 4, 9),
        )
    }

    #[test]
    fn test_format_diagnostic_plain() {
        let formatter = TextFormatter::new().without_color();
        let output = formatter.format_diagnostic(
            &diag("a.php", "dynamic-call-on-static-method", Severity::Error)
                .with_help("Static method is called through an instance"),
        );

        assert_eq!(
            output,
            "a.php:4:9: error[dynamic-call-on-static-method]: \
             Dynamic call to static method Factory::create().\n   \
             = help: Static method is called through an instance\n"
        );
    }

    #[test]
    fn test_format_groups_by_file_in_order() {
        let formatter = TextFormatter::new().without_color();
        let result = AnalysisResult {
            diagnostics: vec![
                diag("b.php", "r1", Severity::Error),
                diag("a.php", "r2", Severity::Warning),
                diag("b.php", "r3", Severity::Error),
            ],
            units_processed: 2,
            error_count: 2,
            warning_count: 1,
            ..Default::default()
        };

        let output = formatter.format(&result);
        let b = output.find("b.php\n").unwrap();
        let a = output.find("a.php\n").unwrap();
        assert!(b < a);
        assert!(output.find("[r3]").unwrap() < a);
        assert!(output.contains("2 units processed: 2 errors, 1 warning"));
    }

    #[test]
    fn test_format_clean_result() {
        let formatter = TextFormatter::new().without_color();
        let result = AnalysisResult {
            units_processed: 1,
            ..Default::default()
        };
        let output = formatter.format(&result);
        assert!(output.starts_with("1 unit processed\n"));
        assert!(output.contains("Finished in"));
    }
}
