//! `allergen-scan` command line: scan one ingredient list against a profile.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use allergen_scan::config::{self, ScanConfig};
use allergen_scan::models::UserProfile;
use allergen_scan::scan::{IngredientSource, RiskReport, ScanStatus};
use allergen_scan::{init_tracing, KnowledgeBase, ScanEngine, Scanner};

#[derive(Parser)]
#[command(
    name = "allergen-scan",
    version,
    about = "Check a food ingredient list against your allergies and medications",
    long_about = "Check a food ingredient list against your allergies and medications.\n\n\
                  Pass the label text as the argument. Without it the scan is reported \
                  as not analyzed."
)]
struct Cli {
    /// Ingredient list as printed on the label.
    #[arg(value_name = "INGREDIENTS")]
    ingredients: Option<String>,

    /// Knowledge base directory (allergens.json, medications.json, interactions.json).
    /// Defaults to $ALLERGEN_SCAN_KB_DIR, the user data dir, then the bundled data.
    #[arg(long = "kb-dir", value_name = "DIR")]
    kb_dir: Option<PathBuf>,

    /// Allergy by id or name (repeatable).
    #[arg(long = "allergy", value_name = "NAME")]
    allergies: Vec<String>,

    /// Medication by id, generic or brand name (repeatable).
    #[arg(long = "medication", value_name = "NAME")]
    medications: Vec<String>,

    /// JSON profile file ({"allergy_ids": [...], "medication_ids": [...]}).
    #[arg(long = "profile", value_name = "FILE")]
    profile: Option<PathBuf>,

    /// JSON file overriding matching thresholds.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Why no ingredient list is given (used when INGREDIENTS is absent).
    #[arg(long = "unavailable-reason", value_name = "TEXT")]
    unavailable_reason: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Errors only.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&log_filter(&cli));

    if let Err(error) = run(&cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn log_filter(cli: &Cli) -> String {
    if cli.quiet {
        return "error".to_string();
    }
    match cli.verbose {
        0 => config::default_log_filter(),
        1 => "allergen_scan=debug,warn".to_string(),
        _ => "allergen_scan=trace,info".to_string(),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let knowledge = load_knowledge(cli.kb_dir.as_deref())?;
    let scan_config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    let profile = build_profile(cli, &knowledge)?;

    let source = match &cli.ingredients {
        Some(text) => IngredientSource::text(text.as_str()),
        None => IngredientSource::unavailable(
            cli.unavailable_reason
                .clone()
                .unwrap_or_else(|| "no ingredient list provided".to_string()),
        ),
    };

    let engine = ScanEngine::new(Arc::new(knowledge), scan_config);
    let report = engine.scan(&source, &profile);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn load_knowledge(kb_dir: Option<&Path>) -> Result<KnowledgeBase> {
    if let Some(dir) = kb_dir {
        return KnowledgeBase::load_dir(dir)
            .with_context(|| format!("failed to load knowledge base from {}", dir.display()));
    }
    if let Some(dir) = config::knowledge_dir().filter(|d| d.is_dir()) {
        tracing::debug!(dir = %dir.display(), "Using knowledge base directory");
        return KnowledgeBase::load_dir(&dir)
            .with_context(|| format!("failed to load knowledge base from {}", dir.display()));
    }
    KnowledgeBase::builtin().context("bundled knowledge base is invalid")
}

/// Profile file (if any) plus names given on the command line.
fn build_profile(cli: &Cli, knowledge: &KnowledgeBase) -> Result<UserProfile> {
    let mut profile = match &cli.profile {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read profile {}", path.display()))?;
            serde_json::from_str::<UserProfile>(&json)
                .with_context(|| format!("failed to parse profile {}", path.display()))?
        }
        None => UserProfile::default(),
    };

    let resolution = knowledge.resolve_profile(&cli.allergies, &cli.medications);
    for name in &resolution.unknown {
        tracing::warn!(name = %name, "Not in the knowledge base, ignored");
    }
    profile.allergy_ids.extend(resolution.profile.allergy_ids);
    profile.medication_ids.extend(resolution.profile.medication_ids);
    Ok(profile)
}

fn print_report(report: &RiskReport) {
    if let ScanStatus::NotAnalyzed { reason } = &report.status {
        println!("Not analyzed: {reason}");
    }
    println!("Overall: {}", report.overall_severity.as_str().to_uppercase());

    if !report.findings.is_empty() {
        println!();
        println!("{:<9} {:<24} {:<24} {:>5}", "SEVERITY", "FINDING", "INGREDIENT", "CONF");
        for finding in &report.findings {
            println!(
                "{:<9} {:<24} {:<24} {:>5.2}",
                finding.severity.as_str(),
                finding.entry_id,
                finding.matched_ingredient,
                finding.confidence,
            );
            println!("          {}", finding.explanation);
            if let Some(advice) = &finding.advice {
                println!("          {advice}");
            }
        }
    }

    if !report.unresolved_tokens.is_empty() {
        println!();
        println!("Unrecognized: {}", report.unresolved_tokens.join(", "));
    }

    println!();
    for line in &report.recommendations {
        println!("- {line}");
    }
    println!();
    println!(
        "Knowledge base: allergens {}, medications {}, interactions {}",
        report.knowledge_version.allergens,
        report.knowledge_version.medications,
        report.knowledge_version.interactions,
    );
}
