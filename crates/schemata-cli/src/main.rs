use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemata_core::{Config, Object, Registry, Validation};
use schemata_yaml::{Banner, Codec, CodecError};

mod catalog;
mod report;
mod select;

use report::CheckReport;

/// Schemata - typed YAML documents for station metadata
#[derive(Parser)]
#[command(name = "schemata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemata.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and deeply validate every document under the given paths
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only check paths matching this regex
        #[arg(short, long, default_value = r"\.ya?ml$")]
        pattern: String,

        /// Write a JSON report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Regularize all documents of a file and write them back out
    Regularize {
        /// Input document stream
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered schemas and their fields
    Schemas {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    let registry = catalog::builtin(&config.tag_prefix).context("Failed to register built-in schemas")?;

    match cli.command {
        Commands::Check { paths, pattern, report } => {
            check_command(&config, &registry, &paths, &pattern, report.as_deref(), cli.verbose)
        }
        Commands::Regularize { input, output } => {
            regularize_command(&config, &registry, &input, output.as_deref(), cli.verbose)
        }
        Commands::Schemas { json } => schemas_command(&registry, json),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let default_path = Path::new("schemata.toml");

    let config = if let Some(path) = path {
        Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))?
    } else if default_path.exists() {
        Config::from_file(default_path).context("Failed to load schemata.toml")?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!("{} tag prefix: {}", "Using".cyan(), config.tag_prefix);
    }
    Ok(config)
}

/// Check command - load every selected file and validate each document deeply
fn check_command(
    config: &Config,
    registry: &Registry,
    paths: &[PathBuf],
    pattern: &str,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let regex = Regex::new(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    let files = select::select_files(paths, Some(&regex), None).context("Failed to select files")?;

    if verbose {
        eprintln!("{} {} files", "Checking".cyan(), files.len());
    }

    let codec = Codec::from_config(registry, config);
    let mut report = CheckReport::new();

    for file in &files {
        report.summary.files += 1;
        let name = file.display().to_string();

        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                report.add_failure(&name, None, e.to_string());
                continue;
            }
        };

        if let Some(banner) = Banner::parse(&text) {
            tracing::debug!(file = %name, format = %banner.format_version, model = %banner.model_version, "banner");
        }

        let mut failures = 0;
        for (index, document) in codec.load_all(&text).enumerate() {
            let outcome = document.and_then(|obj| obj.check(false).map_err(CodecError::from));
            match outcome {
                Ok(()) => report.add_valid(),
                Err(e @ CodecError::Yaml(_)) => {
                    report.add_failure(&name, None, e.to_string());
                    failures += 1;
                }
                Err(e) => {
                    report.add_failure(&name, Some(index + 1), e.to_string());
                    failures += 1;
                }
            }
        }

        if verbose && failures > 0 {
            eprintln!("  {} {} ({} failures)", "✗".red(), name, failures);
        } else if verbose {
            eprintln!("  {} {}", "✓".green(), name);
        }
    }

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_check_summary(&report);

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Regularize command - rewrite a document stream in canonical form
fn regularize_command(
    config: &Config,
    registry: &Registry,
    input: &Path,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let codec = Codec::from_config(registry, config);
    let mut objects: Vec<Object> = Vec::new();
    for (index, document) in codec.load_all(&text).enumerate() {
        let mut obj = document.with_context(|| format!("{}: document {}", input.display(), index + 1))?;
        obj.validate(Validation::REGULARIZE)
            .with_context(|| format!("{}: document {}", input.display(), index + 1))?;
        objects.push(obj);
    }

    let banner = Banner::from_config(&config.banner);
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            codec.write_all(std::io::BufWriter::new(file), &objects, banner.as_ref())?;
            if verbose {
                eprintln!("{} {} documents to {}", "Wrote".green(), objects.len(), path.display());
            }
        }
        None => {
            codec.write_all(std::io::stdout().lock(), &objects, banner.as_ref())?;
        }
    }

    Ok(())
}

/// Schemas command - list registered tags with their fields
fn schemas_command(registry: &Registry, json: bool) -> Result<()> {
    if json {
        let schemas: Vec<serde_json::Value> = registry
            .iter()
            .map(|(tag, schema)| {
                let fields: Vec<serde_json::Value> = schema
                    .field_names()
                    .iter()
                    .zip(schema.fields())
                    .map(|(name, field)| {
                        serde_json::json!({
                            "name": name,
                            "kind": field.kind().to_string(),
                            "optional": field.is_optional(),
                        })
                    })
                    .collect();

                serde_json::json!({
                    "tag": tag,
                    "base": schema.base().map(|b| b.name()),
                    "fields": fields,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    for (tag, schema) in registry.iter() {
        match schema.base() {
            Some(base) => println!("{} {}", tag.bold().bright_blue(), format!("({})", base.name()).dimmed()),
            None => println!("{}", tag.bold().bright_blue()),
        }

        for (name, field) in schema.field_names().iter().zip(schema.fields()) {
            let optional = if field.is_optional() { " (optional)" } else { "" };
            println!("  {}: {}{}", name.green(), field.kind(), optional.dimmed());
        }
    }

    Ok(())
}

/// Print check summary to stdout
fn print_check_summary(report: &CheckReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schemata Check Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{} {}", "Files:".bold(), report.summary.files);
    println!("{} {}", "Documents:".bold(), report.summary.documents);
    println!("{} {}", "Valid:".bold(), report.summary.valid.to_string().green());

    if report.summary.failed > 0 {
        println!("{} {}", "Failed:".bold(), report.summary.failed.to_string().red());
        println!();

        for failure in &report.failures {
            match failure.document {
                Some(n) => println!("  {} {} [document {}]", "✗".red(), failure.file, n),
                None => println!("  {} {}", "✗".red(), failure.file),
            }
            println!("    {}", failure.message);
        }
    } else {
        println!();
        println!("{}", "✓ All documents valid".green());
    }

    println!();
}
