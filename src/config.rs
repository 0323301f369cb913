//! Configuration system for the analysis engine
//!
//! Reads configuration from:
//! - `.strictcheck.yaml` / `.strictcheck.yml` / `.strictcheck.json` (project-level)
//! - the same names in the home directory (user-level)

use crate::diagnostic::Severity;
use crate::resolver::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Analyze units in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,

    /// Verbose output
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            verbose: false,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Type resolution strictness; unset fields fall back to `ResolverOptions::default()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub check_union_types: Option<bool>,
    pub check_nullables: Option<bool>,
}

impl AnalysisConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        let defaults = ResolverOptions::default();
        ResolverOptions {
            check_union_types: self
                .check_union_types
                .unwrap_or(defaults.check_union_types),
            check_nullables: self.check_nullables.unwrap_or(defaults.check_nullables),
        }
    }
}

/// Rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule IDs, or "all")
    pub per_file: HashMap<String, Vec<String>>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extend from other configuration files or presets
    pub extends: Vec<String>,

    /// Engine settings
    pub engine: EngineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Type resolution settings
    pub analysis: AnalysisConfig,

    /// Rule configuration
    pub rules: RulesConfig,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::preset_strict()),
            "lenient" => Some(Self::preset_lenient()),
            _ => None,
        }
    }

    /// Strict preset - unions and nullables checked whole
    fn preset_strict() -> Self {
        Self {
            analysis: AnalysisConfig {
                check_union_types: Some(true),
                check_nullables: Some(true),
            },
            ..Self::default()
        }
    }

    /// Lenient preset - unions narrowed, nulls ignored
    fn preset_lenient() -> Self {
        Self {
            analysis: AnalysisConfig {
                check_union_types: Some(false),
                check_nullables: Some(false),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    /// Load with recursion depth limit (to prevent infinite loops)
    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        if !config.extends.is_empty() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            let mut base_config = Self::default();

            for extend in &config.extends.clone() {
                let extended = if let Some(preset) = Self::preset(extend) {
                    preset
                } else {
                    let extend_path = if Path::new(extend).is_absolute() {
                        PathBuf::from(extend)
                    } else {
                        base_dir.join(extend)
                    };
                    Self::load_with_depth(&extend_path, depth + 1)?
                };
                base_config.merge(extended);
            }

            // Current file wins over everything it extends
            base_config.merge(config);
            config = base_config;
        }

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }
        if other.output.verbose {
            self.output.verbose = true;
        }
        if other.output.color != ColorMode::Auto {
            self.output.color = other.output.color;
        }

        if other.analysis.check_union_types.is_some() {
            self.analysis.check_union_types = other.analysis.check_union_types;
        }
        if other.analysis.check_nullables.is_some() {
            self.analysis.check_nullables = other.analysis.check_nullables;
        }

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [".strictcheck.yaml", ".strictcheck.yml", ".strictcheck.json"];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        verbose: Option<bool>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(v) = verbose {
            self.output.verbose = v;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.rules.disabled.iter().any(|r| r == rule_id) {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|r| r == rule_id);
        }

        true
    }

    /// Get severity override for a rule
    pub fn get_severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.severity.get(rule_id).copied()
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        let file_str = file_path.to_string_lossy();

        for (pattern, rules) in &self.rules.per_file {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(file_str.as_ref())
                    && rules.iter().any(|r| r == "all" || r == rule_id)
                {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.engine.parallel);
        assert_eq!(config.engine.jobs, 0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(
            config.analysis.resolver_options(),
            ResolverOptions::default()
        );
        assert!(!config.analysis.resolver_options().check_union_types);
    }

    #[test]
    fn test_presets() {
        let strict = Config::preset("strict").unwrap().analysis.resolver_options();
        assert!(strict.check_union_types);
        assert!(strict.check_nullables);

        let lenient = Config::preset("lenient").unwrap().analysis.resolver_options();
        assert!(!lenient.check_union_types);
        assert!(!lenient.check_nullables);

        assert!(Config::preset("paranoid").is_none());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_config_merge_cli() {
        let mut config = Config::new();
        config.merge_cli(
            Some(OutputFormat::Json),
            Some(true),
            Some(4),
            Some(vec!["rule1".to_string()]),
            None,
        );

        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.verbose);
        assert_eq!(config.engine.jobs, 4);
        assert!(config.rules.disabled.contains(&"rule1".to_string()));
    }

    #[test]
    fn test_rule_enabled() {
        let mut config = Config::new();
        assert!(config.is_rule_enabled("any-rule"));

        config.rules.disabled.push("disabled-rule".to_string());
        assert!(!config.is_rule_enabled("disabled-rule"));
        assert!(config.is_rule_enabled("other-rule"));

        config.rules.enabled = vec!["only-this".to_string()];
        assert!(!config.is_rule_enabled("other-rule"));
        assert!(config.is_rule_enabled("only-this"));
    }

    #[test]
    fn test_severity_override() {
        let mut config = Config::new();
        config
            .rules
            .severity
            .insert("rule1".to_string(), Severity::Warning);

        assert_eq!(
            config.get_severity_override("rule1"),
            Some(Severity::Warning)
        );
        assert_eq!(config.get_severity_override("rule2"), None);
    }

    #[test]
    fn test_per_file_ignore() {
        let mut config = Config::new();
        config
            .rules
            .per_file
            .insert("tests/**".to_string(), vec!["rule1".to_string()]);
        config
            .rules
            .per_file
            .insert("legacy/*.php".to_string(), vec!["all".to_string()]);

        assert!(config.should_ignore_rule_for_file("rule1", Path::new("tests/a/b.php")));
        assert!(!config.should_ignore_rule_for_file("rule2", Path::new("tests/a/b.php")));
        assert!(config.should_ignore_rule_for_file("rule2", Path::new("legacy/old.php")));
        assert!(!config.should_ignore_rule_for_file("rule1", Path::new("src/a.php")));
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
engine:
  parallel: false
  jobs: 4
output:
  format: json
analysis:
  check_union_types: true
rules:
  disabled:
    - dynamic-call-on-static-method
  severity:
    for-loop-init-overwrites-variable: warning
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.jobs, 4);
        assert_eq!(config.output.format, OutputFormat::Json);
        let options = config.analysis.resolver_options();
        assert!(options.check_union_types);
        assert!(options.check_nullables);
        assert_eq!(config.rules.disabled.len(), 1);
        assert_eq!(
            config.get_severity_override("for-loop-init-overwrites-variable"),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn test_load_extends_preset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".strictcheck.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "extends: [lenient]\nanalysis:\n  check_nullables: true").unwrap();

        let config = Config::load(&path).unwrap();
        let options = config.analysis.resolver_options();
        assert!(!options.check_union_types);
        assert!(options.check_nullables);
    }

    #[test]
    fn test_load_extends_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("base.json"),
            r#"{"rules": {"disabled": ["a"]}, "analysis": {"check_union_types": true}}"#,
        )
        .unwrap();
        let path = dir.path().join("child.yaml");
        std::fs::write(&path, "extends: [base.json]\nrules:\n  disabled: [b]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analysis.check_union_types, Some(true));
        assert_eq!(config.rules.disabled, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_load_self_extending_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loop.yaml");
        std::fs::write(&path, "extends: [loop.yaml]\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }
}
