//! Restore command - re-import every logged receipt URL.

use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use nfimport_core::SourceLog;

/// Arguments for the restore command.
#[derive(Args)]
pub struct RestoreArgs {
    /// Seconds to wait between imports (overrides the configured cooldown)
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Only list the URLs that would be imported
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: RestoreArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let cooldown = args
        .cooldown_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.restore.cooldown());

    let importer = super::open_importer(&config)?;
    let urls = importer.log().urls();

    if urls.is_empty() {
        println!(
            "{} No URLs in {}",
            style("ℹ").blue(),
            config.paths.processed_log.display()
        );
        return Ok(());
    }

    println!(
        "{} Found {} logged URLs",
        style("ℹ").blue(),
        urls.len()
    );

    if args.dry_run {
        for url in &urls {
            println!("  {}", url);
        }
        return Ok(());
    }

    let mut importer = importer.with_cooldown(cooldown);

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} urls")
            .unwrap()
            .progress_chars("=>-"),
    );

    let report = importer.restore_with(&urls, |_, _| pb.inc(1));
    pb.finish_with_message("Complete");

    let conflicts = report.conflicts();
    let other_failures = report.failures.len() - conflicts;

    println!();
    println!(
        "{} Restored {} URLs in {:?}",
        style("✓").green(),
        report.attempted(),
        start.elapsed()
    );
    println!(
        "   {} imported, {} already stored, {} failed",
        style(report.imported.len()).green(),
        style(conflicts).yellow(),
        style(other_failures).red()
    );

    if other_failures > 0 {
        println!();
        println!("{}", style("Failed URLs:").red());
        for failure in report.failures.iter().filter(|f| !f.error.is_conflict()) {
            println!("  - {}: {}", failure.url, failure.error);
        }
    }

    Ok(())
}
