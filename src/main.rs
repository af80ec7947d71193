use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use resultcalc::pass::{run_pass, CohortSnapshot, PassConfig, SnapshotSource};
use resultcalc::telemetry;
use resultcalc::{FormulaRef, FormulaRegistry, GradeScale};

#[derive(Parser)]
#[command(name = "resultcalc")]
#[command(about = "Compute ranked academic term results from raw examination marks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reporting pass over a cohort snapshot
    Compute {
        /// JSON snapshot with formulas, roster and marks
        #[arg(long)]
        snapshot: PathBuf,
        /// Formula id to compute under; defaults to the active formula
        #[arg(long)]
        formula: Option<String>,
        /// Write result records here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Validate formula definitions and show which one is active
    CheckFormulas {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

fn load_snapshot(path: &PathBuf) -> anyhow::Result<CohortSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("snapshot {} is not a valid cohort snapshot", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init("info")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            snapshot,
            formula,
            out,
            concurrency,
            timeout_secs,
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let registry = FormulaRegistry::load(snapshot.formulas)?;
            let wanted = match formula {
                Some(id) => FormulaRef::Id(id),
                None => FormulaRef::Active,
            };
            let config = PassConfig {
                concurrency,
                student_timeout: Duration::from_secs(timeout_secs),
            };
            let source = Arc::new(SnapshotSource::new(snapshot.marks));

            let results = run_pass(
                &registry,
                &wanted,
                &GradeScale::default(),
                &snapshot.roster,
                source,
                &config,
                Utc::now().date_naive(),
            )
            .await?;

            let rendered = serde_json::to_string_pretty(&results)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} result records written to {}.", results.len(), path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::CheckFormulas { snapshot } => {
            let snapshot = load_snapshot(&snapshot)?;
            let registry = FormulaRegistry::load(snapshot.formulas)?;
            for formula in registry.formulas() {
                let total: f64 = formula.weights.values().sum();
                let flag = if formula.is_active { " (active)" } else { "" };
                println!(
                    "- {} '{}'{} pass mark {:.1}",
                    formula.id, formula.name, flag, formula.passing_score
                );
                let mut labels: Vec<&String> = formula.weights.keys().collect();
                labels.sort();
                for label in labels {
                    let weight = formula.weights[label];
                    let share = if total > 0.0 { weight / total } else { 0.0 };
                    println!("    {}: {} ({:.0}% when all types graded)", label, weight, share * 100.0);
                }
            }
        }
    }

    Ok(())
}
