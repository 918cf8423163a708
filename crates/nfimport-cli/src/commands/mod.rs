//! Subcommands and the plumbing they share.

pub mod config;
pub mod orphans;
pub mod output;
pub mod restore;
pub mod url;
pub mod xml;

use std::path::Path;

use tracing::debug;

use nfimport_core::{ImportConfig, Importer, JsonFileStore, JsonSourceLog, MappingTable};

/// Importer over the file-backed store, mapping table and log.
pub type FileImporter = Importer<JsonFileStore, MappingTable, JsonSourceLog>;

/// Load the explicit config file, else the default one, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ImportConfig> {
    if let Some(path) = config_path {
        return Ok(ImportConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(ImportConfig::from_file(&default_path)?)
    } else {
        Ok(ImportConfig::default())
    }
}

/// Build an importer over the data files named in `config.paths`.
pub fn open_importer(config: &ImportConfig) -> anyhow::Result<FileImporter> {
    let store = JsonFileStore::open(&config.paths.store)?;

    let mappings = if config.paths.mappings.exists() {
        MappingTable::from_file(&config.paths.mappings)?
    } else {
        debug!(
            "No mapping table at {}, resolving declared codes only",
            config.paths.mappings.display()
        );
        MappingTable::new()
    };
    debug!("Loaded {} product mappings", mappings.len());

    let log = JsonSourceLog::load(&config.paths.processed_log);

    Ok(Importer::from_config(config, store, mappings, log)?)
}
