//! Run the HTTP service

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use codeattest::app::App;
use codeattest::config::{Config, RecalculationMode};
use codeattest::server;
use codeattest::worker::Worker;

/// Serve until interrupted
pub fn serve(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let app = App::from_config(&config)?;

    if config.recalculation.mode == RecalculationMode::Deferred {
        let worker = Worker::new(
            Arc::new(app.store.clone()),
            Arc::new(app.store.clone()),
            Duration::from_secs(config.recalculation.poll_interval_secs.max(1)),
        );
        // Detached: the worker lives as long as the process
        drop(worker.spawn());
    }

    server::serve(&app, &config.bind_address())
}
