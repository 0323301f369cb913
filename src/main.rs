//! strictcheck CLI - run strict analysis rules over serialized syntax trees

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use glob::glob;
use std::path::PathBuf;
use strictcheck::config::{ColorMode, Config, OutputFormat};
use strictcheck::engine::Engine;
use strictcheck::output::formatter_for;
use strictcheck::{Rule, Severity};

#[derive(Parser)]
#[command(
    name = "strictcheck",
    version,
    about = "Strict static-analysis rules",
    long_about = "Runs strict analysis rules over syntax trees stored as YAML or JSON analysis units."
)]
struct Cli {
    /// Unit files or glob patterns to analyse
    units: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Only enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show detailed information about a rule and exit
    #[arg(long)]
    explain: Option<String>,

    /// Show per-rule timing statistics
    #[arg(long)]
    timing: bool,

    /// Exit with 0 even if errors are found
    #[arg(long)]
    exit_zero: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn print_rule(rule: &dyn Rule) {
    let meta = rule.metadata();
    let severity = match meta.severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    };
    println!(
        "  {} [{}] ({}, {}) {}",
        meta.id.cyan(),
        severity,
        rule.node_kind(),
        meta.category,
        meta.description.as_deref().unwrap_or("")
    );
}

fn explain_rule(rule: &dyn Rule) {
    let meta = rule.metadata();
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), meta.id.cyan());
    println!("  {}: {}", "Node".bold(), rule.node_kind());
    println!("  {}: {}", "Severity".bold(), meta.severity);
    println!("  {}: {}", "Category".bold(), meta.category);

    if let Some(desc) = &meta.description {
        println!();
        println!("  {}", "Description".bold());
        println!("  {}", desc);
    }

    if let Some(rationale) = &meta.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &meta.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &meta.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }
}

/// Expand file arguments and glob patterns, keeping argument order
fn expand_units(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let paths = glob(pattern).with_context(|| format!("Invalid pattern '{}'", pattern))?;
        let before = files.len();
        for entry in paths.flatten() {
            if entry.is_file() {
                files.push(entry);
            }
        }
        // A plain path that does not exist still gets a load error diagnostic
        if files.len() == before && !pattern.contains(&['*', '?', '['][..]) {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

fn run(cli: Cli, config: Config) -> Result<i32> {
    let engine = Engine::new(config);

    if let Some(rule_id) = &cli.explain {
        let Some(rule) = engine.rules().get(rule_id) else {
            bail!("Unknown rule '{}'", rule_id);
        };
        explain_rule(rule.as_ref());
        return Ok(0);
    }

    if cli.list_rules {
        println!("{} ({}):", "Available rules".bold(), engine.rules().len());
        for rule in engine.rules().iter() {
            print_rule(rule.as_ref());
        }
        return Ok(0);
    }

    if cli.units.is_empty() {
        bail!("No analysis units specified");
    }

    let files = expand_units(&cli.units)?;
    if files.is_empty() {
        bail!("No analysis units found");
    }
    if engine.config().output.verbose {
        eprintln!("Analysing {} units", files.len());
    }

    let result = engine.analyze_files(&files);

    let formatter = formatter_for(
        engine.config().output.format,
        engine.config().output.color != ColorMode::Never,
    );
    print!("{}", formatter.format(&result));

    if cli.timing {
        eprintln!();
        eprint!("{}", result.format_timings());
    }

    Ok(if cli.exit_zero { 0 } else { result.exit_code() })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path).unwrap_or_else(|e| {
            eprintln!("{}: Failed to load config: {}", "error".red().bold(), e);
            std::process::exit(1);
        })
    } else {
        Config::load_default().unwrap_or_else(|e| {
            log::warn!("ignoring default config: {}", e);
            Config::default()
        })
    };

    config.merge_cli(
        cli.format.map(OutputFormat::from),
        cli.verbose.then_some(true),
        cli.jobs,
        cli.disable.clone(),
        cli.select.clone(),
    );
    if cli.no_color {
        config.output.color = ColorMode::Never;
    }

    match config.output.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    match run(cli, config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
