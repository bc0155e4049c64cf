//! Write a config file and create the datastore

use std::fs;
use std::path::Path;

use log::info;

use codeattest::adapters::SqliteStore;
use codeattest::config::{Config, RecalculationMode};
use codeattest::output::{InitResult, OutputMode};
use codeattest::paths;

/// Initialize codeattest in the working directory
pub fn init(
    config_path: Option<&Path>,
    force: bool,
    mode: Option<RecalculationMode>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let target = config_path.map_or_else(paths::local_config, Path::to_path_buf);

    let config_written = !target.exists() || force;
    let config = if config_written {
        let mut config = Config::default();
        if let Some(mode) = mode {
            config.recalculation.mode = mode;
        }
        config.save(&target)?;
        info!("Wrote {}", target.display());
        config
    } else {
        Config::load(Some(&target))?
    };

    let mut effective = config;
    effective.apply_env();

    SqliteStore::open(&effective.storage.database_path)?;
    fs::create_dir_all(&effective.storage.webhook_data_directory)?;

    InitResult {
        config_path: target,
        config_written,
        database_path: effective.storage.database_path,
        webhook_data_directory: effective.storage.webhook_data_directory,
    }
    .render(output);
    Ok(())
}
