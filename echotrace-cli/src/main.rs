//! echotrace CLI
//!
//! Runs the analysis engine over a graph snapshot loaded from a JSON file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use echotrace_core::{GraphSnapshot, PatternKind, TimeFrame};
use echotrace_runtime::{AnalysisEngine, InMemoryProvider};

#[derive(Parser)]
#[command(name = "echotrace")]
#[command(author, version, about = "Interaction-graph spread-pattern classification and reality-deviation scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect automated and coordinated spread patterns in a snapshot
    Patterns {
        /// Path to a graph snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Frame start, RFC 3339 (default: earliest edge in the snapshot)
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Frame end, RFC 3339 (default: latest edge in the snapshot)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score how far one content item deviates from its reference baseline
    Deviation {
        /// Path to a graph snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Content node id to profile
        #[arg(short, long)]
        content: String,

        /// Frame start, RFC 3339 (default: earliest edge in the snapshot)
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Frame end, RFC 3339 (default: latest edge in the snapshot)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the aggregate credibility of a publishing source
    Credibility {
        /// Path to a graph snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Source node id to score
        #[arg(short = 'S', long)]
        source: String,

        /// Frame start, RFC 3339 (default: earliest edge in the snapshot)
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Frame end, RFC 3339 (default: latest edge in the snapshot)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Patterns {
            snapshot,
            start,
            end,
            json,
        } => {
            run_patterns(snapshot, start, end, json).await?;
        }
        Commands::Deviation {
            snapshot,
            content,
            start,
            end,
            json,
        } => {
            run_deviation(snapshot, &content, start, end, json).await?;
        }
        Commands::Credibility {
            snapshot,
            source,
            start,
            end,
            json,
        } => {
            run_credibility(snapshot, &source, start, end, json).await?;
        }
    }

    Ok(())
}

fn load_snapshot(path: &PathBuf) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file {}", path.display()))?;
    let snapshot: GraphSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse snapshot file {}", path.display()))?;
    Ok(snapshot)
}

/// Explicit bounds win; missing bounds fall back to the snapshot's own extent
fn resolve_frame(
    snapshot: &GraphSnapshot,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<TimeFrame> {
    let extent = snapshot.observed_extent();
    let start = start
        .or_else(|| extent.map(|f| f.start()))
        .context("snapshot has no edges; pass --start and --end explicitly")?;
    let end = end
        .or_else(|| extent.map(|f| f.end()))
        .context("snapshot has no edges; pass --start and --end explicitly")?;
    Ok(TimeFrame::new(start, end)?)
}

async fn run_patterns(
    path: PathBuf,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(&path)?;
    let frame = resolve_frame(&snapshot, start, end)?;

    let engine = AnalysisEngine::new(InMemoryProvider::new(snapshot));
    let mut patterns = engine.detect_patterns(&frame).await?;
    patterns.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    println!(
        "🔍 Frame: {} → {}",
        frame.start().to_rfc3339(),
        frame.end().to_rfc3339()
    );
    if patterns.is_empty() {
        println!("No automated or coordinated patterns detected.");
        return Ok(());
    }

    for pattern in &patterns {
        let label = match pattern.kind {
            PatternKind::Automated => "🤖 automated",
            PatternKind::Coordinated => "🤝 coordinated",
            PatternKind::Organic => "🌱 organic",
        };
        println!(
            "{label}  confidence {:.2}  accounts/nodes {}  edges {}  [{}]",
            pattern.confidence,
            pattern.node_ids.len(),
            pattern.edge_ids.len(),
            pattern.fingerprint,
        );
    }
    println!("\n{} pattern(s) detected.", patterns.len());
    Ok(())
}

async fn run_deviation(
    path: PathBuf,
    content_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(&path)?;
    let frame = resolve_frame(&snapshot, start, end)?;

    let engine = AnalysisEngine::new(InMemoryProvider::new(snapshot));
    let metrics = engine.measure_reality_deviation(content_id, &frame).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("📊 Reality deviation for {content_id}");
    println!("   baseline score:        {:.3}", metrics.baseline_score);
    println!("   deviation magnitude:   {:.3}", metrics.deviation_magnitude);
    println!("   propagation velocity:  {:.1} shares/hour", metrics.propagation_velocity);
    println!("   cross-reference score: {:.3}", metrics.cross_reference_score);
    println!("   source credibility:    {:.3}", metrics.source_credibility);
    println!("   impact score:          {:.3}", metrics.impact_score);
    Ok(())
}

async fn run_credibility(
    path: PathBuf,
    source_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(&path)?;
    let frame = resolve_frame(&snapshot, start, end)?;

    let engine = AnalysisEngine::new(InMemoryProvider::new(snapshot));
    let credibility = engine.calculate_source_credibility(source_id, &frame).await?;

    if json {
        println!("{}", serde_json::json!({ "source": source_id, "credibility": credibility }));
        return Ok(());
    }

    println!("🏷️  Source {source_id}: credibility {credibility:.3}");
    Ok(())
}
