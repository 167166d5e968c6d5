//! lucidtree - Main Entry Point
//!
//! Attribution reports for tree-ensemble classifiers: exact TreeSHAP
//! values rendered as summary and importance plots.

use clap::Parser;
use lucidtree::cli::{cmd_info, cmd_report, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lucidtree=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            model,
            features,
            labels,
            out_dir,
            label,
            title,
            sample_cap,
            seed,
            class,
        } => {
            cmd_report(
                &model, &features, labels.as_deref(), &out_dir, &label,
                title.as_deref(), sample_cap, seed, class,
            )?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
