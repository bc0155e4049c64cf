//! Recompute composition from the command line

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use codeattest::adapters::SqliteStore;
use codeattest::config::Config;
use codeattest::core::services::recalculate_commits;
use codeattest::output::{OutputMode, RecalculateResult};
use codeattest::worker::Worker;

/// Recompute the given commits, or drain queued recalculation jobs
pub fn recalculate(
    config_path: Option<&Path>,
    commit_ids: &[i64],
    output: OutputMode,
) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let store = SqliteStore::open(&config.storage.database_path)?;

    let result = if commit_ids.is_empty() {
        let worker = Worker::new(Arc::new(store.clone()), Arc::new(store), Duration::ZERO);
        RecalculateResult {
            commits: 0,
            jobs: worker.drain()?,
        }
    } else {
        RecalculateResult {
            commits: recalculate_commits(&store, commit_ids)?,
            jobs: 0,
        }
    };

    result.render(output);
    Ok(())
}
