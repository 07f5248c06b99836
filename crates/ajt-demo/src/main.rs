//! `ajt-demo` records a handful of AI judgments to a JSON Lines trail.
//!
//! Configuration is read from `ajt.yaml` in the working directory when
//! present. The optional positional argument overrides the output path.

mod scenarios;

use ajt_core::{AjtConfig, LogFormat, LoggingConfig, OutputKind};
use ajt_trail::{JudgmentFilter, JudgmentRecorder};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use scenarios::KeywordPolicyEngine;

const CONFIG_FILE: &str = "ajt.yaml";

#[derive(Parser, Debug)]
#[command(name = "ajt-demo", version, about = "Record the AI Judgment Trail demo scenarios")]
struct Cli {
    /// JSONL trail to append to (default: output.path from ajt.yaml, else ajt_trace.jsonl)
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_from_cwd()?;
    init_tracing(&config.logging);

    if let Some(output) = cli.output {
        config.output.path = output;
        if !config.output.kind.writes_file() {
            config.output.kind = OutputKind::File;
        }
    }

    let trail_path = config.output.path.clone();
    let writes_file = config.output.kind.writes_file();
    let recorder = JudgmentRecorder::new(config).context("failed to create judgment recorder")?;

    let session_id = scenarios::demo_session_id();
    tracing::info!(session_id = %session_id, "Running judgment scenarios");

    let mut events = vec![
        scenarios::hallucination_detection(&recorder, &session_id)?,
        scenarios::human_override(&recorder, &session_id)?,
    ];
    events.extend(scenarios::policy_compliance(&recorder, &session_id, "v1.0", "v2.0")?);
    recorder.record_batch(&events)?;

    let engine = KeywordPolicyEngine::new("policy-v2.3");
    for prompt in ["Summarize the quarterly report", "Delete all user records"] {
        let event = recorder.record_verdict(&engine, prompt, "demo-agent", &session_id)?;
        events.push(event);
    }

    for event in &events {
        println!("{}", event.to_log_line());
    }
    println!();
    println!("Recorded {} judgments (session {})", events.len(), session_id);

    if writes_file && recorder.is_enabled() {
        print_trail_summary(&trail_path, &session_id)?;
    }

    Ok(())
}

fn load_config_from_cwd() -> Result<AjtConfig> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        AjtConfig::from_file(path).with_context(|| format!("failed to load {}", CONFIG_FILE))
    } else {
        Ok(AjtConfig {
            app_version: "demo-0.1".to_string(),
            ..Default::default()
        })
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_trail_summary(path: &Path, session_id: &str) -> Result<()> {
    let count = ajt_trail::validate_trail(path)
        .with_context(|| format!("trail {} failed validation", path.display()))?;

    let session = JudgmentFilter {
        session_id: Some(session_id.to_string()),
        ..Default::default()
    };
    let stops = JudgmentFilter {
        decision: Some("stop".to_string()),
        ..session.clone()
    };
    let this_run = ajt_trail::query_trail(path, &session)?.len();
    let stopped = ajt_trail::query_trail(path, &stops)?.len();

    println!("Trail: {}", path.display());
    println!("  {} valid records in file", count);
    println!("  {} for this session, {} stopped", this_run, stopped);
    Ok(())
}
