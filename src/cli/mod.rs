//! lucidtree CLI Module
//!
//! Command-line interface for attribution reports and data inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::FeatureTable;
use crate::report::{
    run_report, ReportConfig, DEFAULT_CLASS_OF_INTEREST, DEFAULT_SAMPLE_CAP, DEFAULT_SEED,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(110, 110, 110)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lucidtree")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Attribution reports for tree-ensemble classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute attribution scores and write the summary and bar plots
    Report {
        /// Serialized model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Held-out feature table (CSV with header)
        #[arg(short, long)]
        features: PathBuf,

        /// Label vector (CSV, single column); logged, not explained
        #[arg(long)]
        labels: Option<PathBuf>,

        /// Output directory for the two PNG artifacts
        #[arg(short, long, default_value = "results")]
        out_dir: PathBuf,

        /// Dataset identity used in output filenames (e.g. credit, fraud)
        #[arg(short, long)]
        label: String,

        /// Plot title override
        #[arg(long)]
        title: Option<String>,

        /// Row cap for the attribution sample
        #[arg(long, default_value_t = DEFAULT_SAMPLE_CAP)]
        sample_cap: usize,

        /// Sampling seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Class whose scores feed the plots
        #[arg(long, default_value_t = DEFAULT_CLASS_OF_INTEREST)]
        class: usize,
    },

    /// Show feature table information
    Info {
        /// Input data file (CSV with header)
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_report(
    model: &Path,
    features: &Path,
    labels: Option<&Path>,
    out_dir: &Path,
    label: &str,
    title: Option<&str>,
    sample_cap: usize,
    seed: u64,
    class: usize,
) -> anyhow::Result<()> {
    section("Attribution Report");

    let mut cfg = ReportConfig::new(label, model, features, out_dir)
        .with_sample_cap(sample_cap)
        .with_seed(seed)
        .with_class_of_interest(class);
    if let Some(labels) = labels {
        cfg = cfg.with_labels_path(labels);
    }
    if let Some(title) = title {
        cfg = cfg.with_title(title);
    }

    let start = Instant::now();
    let artifacts = run_report(&cfg)?;

    step_ok(&format!(
        "{} rows x {} features explained in {:.2?}",
        artifacts.rows_used,
        artifacts.n_features,
        start.elapsed()
    ));
    println!();
    println!(
        "  {:<10} {}",
        muted("summary"),
        artifacts.summary_path.display()
    );
    println!("  {:<10} {}", muted("bar"), artifacts.bar_path.display());
    println!();

    Ok(())
}

pub fn cmd_info(data: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let table = FeatureTable::from_csv(data)?;

    println!("  {:<12} {}", muted("File"), data.display());
    println!("  {:<12} {}", muted("Rows"), table.n_rows());
    println!("  {:<12} {}", muted("Columns"), table.n_features());
    println!();

    println!(
        "  {:<20} {:>12} {:>12} {:>12} {:>8}",
        muted("Column"),
        muted("Min"),
        muted("Max"),
        muted("Mean"),
        muted("NaN")
    );
    println!("  {}", dim(&"─".repeat(68)));

    for (j, name) in table.names().iter().enumerate() {
        let col = table.matrix().column(j);
        let finite: Vec<f64> = col.iter().copied().filter(|v| v.is_finite()).collect();
        let nan_count = col.len() - finite.len();

        let (min, max, mean) = if finite.is_empty() {
            (f64::NAN, f64::NAN, f64::NAN)
        } else {
            let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = finite.iter().sum::<f64>() / finite.len() as f64;
            (min, max, mean)
        };

        println!(
            "  {:<20} {:>12.4} {:>12.4} {:>12.4} {:>8}",
            name, min, max, mean, nan_count
        );
    }
    println!();

    Ok(())
}
