//! XML command - import NFe/NFCe XML files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use nfimport_core::{ImportOutcome, ImportSource};

use super::output::{format_document, OutputFormat};

/// Arguments for the xml command.
#[derive(Args)]
pub struct XmlArgs {
    /// Input file or glob pattern
    #[arg(required = true)]
    input: String,

    /// Directory for one rendered document per imported file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each document
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

struct FileResult {
    path: PathBuf,
    outcome: Result<ImportOutcome, String>,
}

pub fn run(args: XmlArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to import",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let mut importer = super::open_importer(&config)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let outcome = fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| importer.import(ImportSource::Xml(bytes)).map_err(|e| e.to_string()));

        if let Err(ref error_msg) = outcome {
            if args.continue_on_error {
                warn!("Failed to import {}: {}", path.display(), error_msg);
            } else {
                error!("Failed to import {}: {}", path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Import failed for {}: {}", path.display(), error_msg);
            }
        }

        results.push(FileResult { path, outcome });
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(ref output_dir) = args.output_dir {
        for result in &results {
            let Ok(outcome) = &result.outcome else {
                continue;
            };
            let stem = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&output_path, format_document(&outcome.document, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    let successful: Vec<_> = results.iter().filter_map(|r| r.outcome.as_ref().ok()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();
    let orphans: usize = successful.iter().map(|o| o.orphan_count).sum();

    println!();
    println!(
        "{} Imported {} of {} files in {:?}",
        style("✓").green(),
        successful.len(),
        results.len(),
        start.elapsed()
    );
    for outcome in &successful {
        println!(
            "   record {}: {} ({} items)",
            outcome.record_id,
            outcome.document.access_key,
            outcome.document.item_count()
        );
    }
    if orphans > 0 {
        println!(
            "   {} items without a product code",
            style(orphans).yellow()
        );
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(error_msg) = &result.outcome {
                println!("  - {}: {}", result.path.display(), error_msg);
            }
        }
    }

    Ok(())
}
