//! Multi-unit analysis engine

use crate::config::Config;
use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::dispatcher::Dispatcher;
use crate::registry::RuleRegistry;
use crate::resolver::TypeResolver;
use crate::unit::AnalysisUnit;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Rule id of the diagnostic recorded for a unit that cannot be loaded
pub const UNIT_LOAD_ERROR: &str = "unit-load-error";

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    pub rule_id: String,
    /// Total time spent in the rule
    pub total_time: Duration,
    /// Number of nodes the rule was evaluated on
    pub evaluation_count: usize,
    /// Number of errors the rule returned
    pub match_count: usize,
}

impl RuleTiming {
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }
}

/// Result of analysing one or more units
#[derive(Debug, Default)]
pub struct AnalysisResult {
    /// All diagnostics, grouped by unit in input order
    pub diagnostics: Vec<Diagnostic>,

    pub units_processed: usize,
    pub units_with_errors: usize,
    pub units_with_warnings: usize,

    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,

    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl AnalysisResult {
    /// Result for a single unit holding `diagnostics`
    fn for_unit(diagnostics: Vec<Diagnostic>) -> Self {
        let mut result = Self {
            units_processed: 1,
            ..Self::default()
        };

        for diag in &diagnostics {
            match diag.severity {
                Severity::Error => result.error_count += 1,
                Severity::Warning => result.warning_count += 1,
                Severity::Info => result.info_count += 1,
            }
        }
        if result.error_count > 0 {
            result.units_with_errors = 1;
        }
        if result.warning_count > 0 {
            result.units_with_warnings = 1;
        }

        result.diagnostics = diagnostics;
        result
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// No errors or warnings
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Get exit code (0 = clean, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: AnalysisResult) {
        self.diagnostics.extend(other.diagnostics);
        self.units_processed += other.units_processed;
        self.units_with_errors += other.units_with_errors;
        self.units_with_warnings += other.units_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;

        for (rule_id, timing) in other.rule_timings {
            let entry = self
                .rule_timings
                .entry(rule_id)
                .or_insert_with(|| RuleTiming::new(&timing.rule_id));
            entry.total_time += timing.total_time;
            entry.evaluation_count += timing.evaluation_count;
            entry.match_count += timing.match_count;
        }
    }

    /// Rule timings sorted by total time (descending), then by id
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| {
            b.total_time
                .cmp(&a.total_time)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        timings
    }

    /// Format timing statistics as a table
    pub fn format_timings(&self) -> String {
        let timings = self.sorted_timings();
        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<40} {:>12} {:>12} {:>10} {:>12}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(90));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;

            output.push_str(&format!(
                "{:<40} {:>10.2}ms {:>10.2}µs {:>10} {:>12}\n",
                timing.rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }

        output
    }
}

/// Runs the configured rules over analysis units
pub struct Engine {
    config: Config,
    registry: RuleRegistry,
}

impl Engine {
    /// Build the registry of built-in rules enabled by `config`
    pub fn new(config: Config) -> Self {
        let resolver = TypeResolver::new(config.analysis.resolver_options());
        let registry = RuleRegistry::builtin(resolver)
            .filtered(|rule| config.is_rule_enabled(rule.id()));
        log::debug!("engine ready with rules {:?}", registry);

        Self { config, registry }
    }

    /// Engine over a caller-supplied registry; rule filters in `config`
    /// still apply
    pub fn with_registry(config: Config, registry: RuleRegistry) -> Self {
        let registry = registry.filtered(|rule| config.is_rule_enabled(rule.id()));
        Self { config, registry }
    }

    /// Rules this engine runs
    pub fn rules(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyse one in-memory unit
    pub fn analyze_unit(&self, unit: &AnalysisUnit) -> AnalysisResult {
        let start = Instant::now();
        let scope = unit.scope();

        let ignored: Vec<&str> = self
            .registry
            .iter()
            .map(|r| r.id())
            .filter(|id| self.config.should_ignore_rule_for_file(id, &unit.path))
            .collect();
        let per_file;
        let registry = if ignored.is_empty() {
            &self.registry
        } else {
            log::debug!("{}: ignoring {:?}", unit.path.display(), ignored);
            per_file = self
                .registry
                .filtered(|r| !ignored.iter().any(|id| *id == r.id()));
            &per_file
        };

        let mut timings: HashMap<String, RuleTiming> = HashMap::new();
        let mut diagnostics = Dispatcher::new(registry)
            .with_file(&unit.path)
            .run_with_observer(&unit.tree, &scope, |eval| {
                let timing = timings
                    .entry(eval.rule_id.to_string())
                    .or_insert_with(|| RuleTiming::new(eval.rule_id));
                timing.total_time += eval.elapsed;
                timing.evaluation_count += 1;
                timing.match_count += eval.matches;
            });

        for diag in &mut diagnostics {
            if let Some(severity) = self.config.get_severity_override(&diag.rule_id) {
                diag.severity = severity;
            }
        }

        let mut result = AnalysisResult::for_unit(diagnostics);
        result.rule_timings = timings;
        result.duration = start.elapsed();
        result
    }

    /// Load and analyse one unit file
    pub fn analyze_file(&self, path: &Path) -> AnalysisResult {
        match AnalysisUnit::load(path) {
            Ok(unit) => self.analyze_unit(&unit),
            Err(e) => {
                log::warn!("failed to load {}: {}", path.display(), e);
                AnalysisResult::for_unit(vec![Diagnostic::new(
                    UNIT_LOAD_ERROR,
                    Severity::Error,
                    &format!("Failed to load analysis unit: {}", e),
                    Location::new(path.to_path_buf(), 0, 0),
                )])
            }
        }
    }

    /// Analyse unit files; results are merged in input order
    pub fn analyze_files(&self, files: &[PathBuf]) -> AnalysisResult {
        let start = Instant::now();

        let results: Vec<AnalysisResult> = match self.thread_pool() {
            Some(pool) => pool.install(|| files.par_iter().map(|f| self.analyze_file(f)).collect()),
            None => files.iter().map(|f| self.analyze_file(f)).collect(),
        };

        let mut combined = AnalysisResult::default();
        for result in results {
            combined.merge(result);
        }

        combined.duration = start.elapsed();
        combined
    }

    fn thread_pool(&self) -> Option<rayon::ThreadPool> {
        if !self.config.engine.parallel {
            return None;
        }

        let threads = if self.config.engine.jobs > 0 {
            self.config.engine.jobs
        } else {
            num_cpus::get()
        };

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("falling back to sequential analysis: {}", e);
                None
            }
        }
    }
}
