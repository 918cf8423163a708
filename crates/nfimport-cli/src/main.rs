//! CLI application for Brazilian fiscal receipt import.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, orphans, restore, url, xml};

/// nfimport - Import NFe/NFCe receipts from XML files and SEFAZ pages
#[derive(Parser)]
#[command(name = "nfimport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import NFe/NFCe XML files
    Xml(xml::XmlArgs),

    /// Import a receipt from its SEFAZ consultation URL
    Url(url::UrlArgs),

    /// Re-import every URL in the processed-source log
    Restore(restore::RestoreArgs),

    /// List stored items without a product code
    Orphans(orphans::OrphansArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Xml(args) => xml::run(args, cli.config.as_deref()),
        Commands::Url(args) => url::run(args, cli.config.as_deref()),
        Commands::Restore(args) => restore::run(args, cli.config.as_deref()),
        Commands::Orphans(args) => orphans::run(args, cli.config.as_deref()),
        Commands::Config(args) => config::run(args),
    }
}
