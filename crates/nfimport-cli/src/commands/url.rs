//! URL command - import a receipt from its consultation page.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use nfimport_core::ImportSource;

use super::output::{format_document, OutputFormat};

/// Arguments for the url command.
#[derive(Args)]
pub struct UrlArgs {
    /// SEFAZ consultation URL (usually read from the receipt QR code)
    #[arg(required = true)]
    url: String,

    /// Go straight to the rendering browser
    #[arg(long)]
    render: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub fn run(args: UrlArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
        anyhow::bail!("Not an http(s) URL: {}", args.url);
    }

    let mut importer = super::open_importer(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Fetching receipt page...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let source = if args.render {
        ImportSource::rendered(args.url.as_str())
    } else {
        ImportSource::url(args.url.as_str())
    };
    let result = importer.import(source);
    spinner.finish_and_clear();

    let outcome = result?;
    info!(
        "Imported {} in {:?}",
        outcome.document.access_key,
        start.elapsed()
    );

    let content = format_document(&outcome.document, args.format)?;

    if let Some(output_path) = args.output {
        fs::write(&output_path, &content)?;
        println!(
            "{} Record {} written to {}",
            style("✓").green(),
            outcome.record_id,
            output_path.display()
        );
    } else {
        println!("{}", content);
    }

    if outcome.orphan_count > 0 {
        eprintln!(
            "{} {} items have no product code",
            style("⚠").yellow(),
            outcome.orphan_count
        );
    }

    Ok(())
}
