//! metrics-query CLI - rewrite metrics queries into storage keys
//!
//! Usage:
//!   metrics-query modulate <query.json> --projects <projects.json> [--config <settings.toml>]
//!   metrics-query check [--config <settings.toml>]
//!
//! Examples:
//!   metrics-query modulate query.json --projects projects.json
//!   metrics-query modulate query.json --projects projects.json --format mql
//!   metrics-query check --config modulators.toml

use clap::{Parser, Subcommand, ValueEnum};
use metrics_query::config::Settings;
use metrics_query::modulator::Project;
use metrics_query::query::QueryExpression;
use metrics_query::visitor::{ExpressionVisitor, ModulatorVisitor};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metrics-query")]
#[command(about = "Rewrite metrics queries from public field names to internal storage keys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a JSON query with the configured modulators
    Modulate {
        /// Path to the query JSON file
        file: PathBuf,

        /// Path to a JSON array of projects in scope
        #[arg(short, long)]
        projects: PathBuf,

        /// Path to the settings TOML (built-in defaults if not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Validate settings without rewriting anything
    Check {
        /// Path to the settings TOML (built-in defaults if not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Rewritten query and applied modulators as JSON
    Json,
    /// Rewritten query in MQL-like text
    Mql,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "metrics_query=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Modulate {
            file,
            projects,
            config,
            format,
        } => cmd_modulate(file, projects, config, format),
        Commands::Check { config } => cmd_check(config),
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings, String> {
    match config {
        Some(path) => Settings::load(path).map_err(|e| e.to_string()),
        None => Ok(Settings::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&source)
        .map_err(|e| format!("Error parsing JSON in '{}': {}", path.display(), e))
}

fn cmd_modulate(
    file: PathBuf,
    projects: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> ExitCode {
    let settings = match load_settings(config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let modulators = match settings.modulator_set() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let query: QueryExpression = match read_json(&file) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let projects: Vec<Project> = match read_json(&projects) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut visitor =
        ModulatorVisitor::new(&projects, &modulators).with_max_depth(settings.visitor.max_depth);
    let rewritten = match visitor.visit(&query) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Modulation error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let applied = visitor.into_applied();

    match format {
        OutputFormat::Json => {
            let applied: Vec<_> = applied
                .key_pairs()
                .into_iter()
                .map(|(from, to)| serde_json::json!({ "from_key": from, "to_key": to }))
                .collect();
            let output = serde_json::json!({
                "query": rewritten,
                "applied_modulators": applied,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    eprintln!("Error serializing output: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        OutputFormat::Mql => {
            println!("{}", rewritten);
            for (from, to) in applied.key_pairs() {
                eprintln!("applied: {} -> {}", from, to);
            }
        }
    }
    ExitCode::SUCCESS
}

fn cmd_check(config: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match settings.modulator_set() {
        Ok(set) => {
            println!("Max depth: {}", settings.visitor.max_depth);
            println!("Modulators:");
            for m in set.iter() {
                println!(
                    "  - {} -> {} ({})",
                    m.from_key(),
                    m.to_key(),
                    m.transform_name()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            ExitCode::FAILURE
        }
    }
}
