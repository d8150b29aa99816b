//! ctxguard CLI binary.
//!
//! Test harness that drives the detection engine directly.
//!
//! # Commands
//!
//! - `scan` - Validate content against a declared context
//! - `patterns` - List the rule catalog
//! - `corpus` - Run the canonical benign/attack fixtures
//! - `policy` - Print the active configuration as TOML

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ctxguard::{
    security::{PatternCategory, SecurityValidationResult},
    Config, ContentType, DetectionEngine, ValidationContext, VERSION,
};

#[derive(Parser)]
#[command(name = "ctxguard")]
#[command(version = VERSION)]
#[command(about = "Context-aware injection detection for untrusted text", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/ctxguard/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate content against a declared context
    Scan {
        /// Content to scan (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Content type (structured, free_text, url, file_path, long_form_message, auto)
        #[arg(short = 't', long = "context", default_value = "auto")]
        content_type: String,

        /// Field name, carried through to the result
        #[arg(long)]
        field: Option<String>,

        /// Endpoint, carried through to the result
        #[arg(long)]
        endpoint: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the rule catalog
    Patterns {
        /// Filter by category (sql, xss, command)
        #[arg(long)]
        category: Option<String>,
    },

    /// Run the canonical benign/attack fixtures
    Corpus,

    /// Print the active configuration as TOML
    Policy,
}

/// A fixture: content, context, expected verdict
struct Fixture {
    name: &'static str,
    content: &'static str,
    content_type: ContentType,
    expect_valid: bool,
}

const CORPUS: &[Fixture] = &[
    Fixture {
        name: "announcement",
        content: "Dear citizens, I am excited to announce a new initiative... Thank you for your ongoing support.",
        content_type: ContentType::LongFormMessage,
        expect_valid: true,
    },
    Fixture {
        name: "product description",
        content: "Fresh organic vegetables and 5 different varieties available daily",
        content_type: ContentType::FreeText,
        expect_valid: true,
    },
    Fixture {
        name: "boolean tautology",
        content: "1 AND 1=1",
        content_type: ContentType::Structured,
        expect_valid: false,
    },
    Fixture {
        name: "union select",
        content: "UNION SELECT * FROM users",
        content_type: ContentType::Structured,
        expect_valid: false,
    },
    Fixture {
        name: "drop table",
        content: "'; DROP TABLE users; --",
        content_type: ContentType::Structured,
        expect_valid: false,
    },
    Fixture {
        name: "waitfor delay",
        content: "'; WAITFOR DELAY '00:00:05'; --",
        content_type: ContentType::Structured,
        expect_valid: false,
    },
    Fixture {
        name: "bedtime advice",
        content: "Kids need enough sleep (about ten hours) every night.",
        content_type: ContentType::LongFormMessage,
        expect_valid: true,
    },
    Fixture {
        name: "stored xss review",
        content: "<img src=x onerror=alert(document.cookie)>",
        content_type: ContentType::FreeText,
        expect_valid: false,
    },
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let engine = DetectionEngine::from_config(&config.engine, config.policy.clone())?;

    match cli.command {
        Commands::Scan {
            input,
            file,
            content_type,
            field,
            endpoint,
            json,
        } => cmd_scan(&engine, input, file, &content_type, field, endpoint, json),

        Commands::Patterns { category } => cmd_patterns(&engine, category.as_deref()),

        Commands::Corpus => cmd_corpus(&engine),

        Commands::Policy => {
            print!("{}", config.to_toml()?);
            Ok(())
        },
    }
}

fn cmd_scan(
    engine: &DetectionEngine,
    input: Option<String>,
    file: Option<PathBuf>,
    content_type: &str,
    field: Option<String>,
    endpoint: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;

    let mut context = if content_type.eq_ignore_ascii_case("auto") {
        ValidationContext::inferred(&content)
    } else {
        ValidationContext::new(content_type.parse().map_err(anyhow::Error::msg)?)
    };
    if let Some(field) = field {
        context = context.with_field_name(field);
    }
    if let Some(endpoint) = endpoint {
        context = context.with_endpoint(endpoint);
    }

    let result = engine.validate_content(&content, &context);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if !result.is_valid {
        std::process::exit(1);
    }

    Ok(())
}

fn print_result(result: &SecurityValidationResult) {
    if result.is_valid {
        println!(
            "VALID ({}, confidence: {:.2})",
            result.context.content_type, result.confidence
        );
    } else {
        println!(
            "REJECTED ({}, threat: {}, confidence: {:.2})",
            result.context.content_type, result.threat_level, result.confidence
        );
    }

    if result.truncated {
        println!("Note: only a leading prefix of the content was scanned");
    }

    if !result.violations.is_empty() {
        println!();
        println!("Violations:");
        for v in &result.violations {
            println!(
                "  - {} ({}) at {} confidence: {:.2} severity: {}",
                v.pattern_id, v.category, v.position, v.confidence, v.severity
            );
            println!("    {}: {:?}", v.description, v.matched_text);
        }
    }
}

fn cmd_patterns(engine: &DetectionEngine, category: Option<&str>) -> anyhow::Result<()> {
    let filter = match category.map(str::to_lowercase).as_deref() {
        None => None,
        Some("sql" | "sql_injection") => Some(PatternCategory::SqlInjection),
        Some("xss") => Some(PatternCategory::Xss),
        Some("command" | "cmd" | "command_injection") => Some(PatternCategory::CommandInjection),
        Some(other) => anyhow::bail!("Unknown category: {other}. Use: sql, xss, command"),
    };

    println!(
        "{:<22} {:<18} {:>10} {:>8} {:<9}",
        "ID", "Category", "Confidence", "Context", "Severity"
    );
    println!("{}", "-".repeat(71));

    for p in engine
        .registry()
        .iter()
        .filter(|p| filter.map_or(true, |c| p.category == c))
    {
        println!(
            "{:<22} {:<18} {:>10.2} {:>8} {:<9}",
            p.id,
            p.category.to_string(),
            p.minimum_confidence,
            if p.context_required { "yes" } else { "no" },
            p.severity.to_string()
        );
    }

    Ok(())
}

fn cmd_corpus(engine: &DetectionEngine) -> anyhow::Result<()> {
    let mut failures = 0;

    for fixture in CORPUS {
        let context = ValidationContext::new(fixture.content_type);
        let result = engine.validate_content(fixture.content, &context);
        let passed = result.is_valid == fixture.expect_valid;
        if !passed {
            failures += 1;
        }

        println!(
            "{} {:<20} expected {:<8} got {:<8} {}",
            if passed { "PASS" } else { "FAIL" },
            fixture.name,
            if fixture.expect_valid { "valid" } else { "rejected" },
            if result.is_valid { "valid" } else { "rejected" },
            result.summary()
        );
    }

    println!();
    println!("{} of {} fixtures passed", CORPUS.len() - failures, CORPUS.len());

    if failures > 0 {
        anyhow::bail!("{failures} fixture(s) failed");
    }
    Ok(())
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
