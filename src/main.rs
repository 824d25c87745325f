use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use curriculum_audit::{load_history, load_student_info, AuditConfig, AuditEngine, StudentHistory};

const DEFAULT_CONFIG: &str = "curriculum-audit.toml";

const USAGE: &str = "Usage:
  curriculum-audit [--config FILE] audit <history.sdf> [--id ID] [--name NAME]
  curriculum-audit [--config FILE] batch";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = take_option(&mut args, "--config")?
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = AuditConfig::load(&config_path)
        .with_context(|| format!("Failed to load config: {:?}", config_path))?;

    let command = if args.is_empty() { None } else { Some(args.remove(0)) };
    match command.as_deref() {
        Some("audit") => run_audit(&config, &mut args),
        Some("batch") => run_batch(&config),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

/// Remove `flag VALUE` from args and return VALUE
fn take_option(args: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{} requires a value", flag);
    }

    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn run_audit(config: &AuditConfig, args: &mut Vec<String>) -> Result<()> {
    let id = take_option(args, "--id")?;
    let name = take_option(args, "--name")?;
    let Some(history_path) = args.first().map(PathBuf::from) else {
        bail!("audit needs a history file\n{}", USAGE);
    };

    let (file_id, file_name) = identity_next_to(&history_path)?;
    let history = StudentHistory {
        student_id: id.unwrap_or(file_id),
        student_name: name.unwrap_or(file_name),
        records: load_history(&history_path)?,
    };

    let engine = AuditEngine::from_config(config)?;
    let audit = engine.audit_student(&history)?;

    println!("{}", serde_json::to_string_pretty(&audit)?);
    Ok(())
}

/// Identity from a sibling `.edf` file, falling back to the file stem
fn identity_next_to(history_path: &Path) -> Result<(String, String)> {
    let edf = history_path.with_extension("edf");
    if edf.exists() {
        return load_student_info(&edf);
    }

    let stem = history_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok((stem, String::new()))
}

fn run_batch(config: &AuditConfig) -> Result<()> {
    println!("🎓 Batch audit: {:?} → {:?}", config.history_dir, config.output_dir);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let engine = AuditEngine::from_config(config)?;
    let mut report = engine.audit_directory(&config.history_dir)?;

    for path in report.write_reports(&config.output_dir) {
        println!("✓ {:?}", path);
    }
    for failure in &report.failures {
        println!("❌ {}: {}", failure.student, failure.error);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", report.summary());

    Ok(())
}
