use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db::Database;

/// Opens the database and serves the HTTP API until Ctrl-C.
pub(crate) fn as_server(config: &Config) -> Result<()> {
    let db = Database::open(&config.db_path)?;
    info!(db = %config.db_path.display(), "database ready");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(crate::api::serve(config, db))
}
