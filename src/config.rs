use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub(crate) const DB_VAR: &str = "BUDGET_TRACKER_DB";
pub(crate) const ADDR_VAR: &str = "BUDGET_TRACKER_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DB_FILE: &str = "budget-tracker.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    /// Reads settings from the process environment, after loading `.env`
    /// from the working directory when one exists.
    pub(crate) fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup(DB_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path.trim()),
            None => default_db_path()?,
        };
        let raw_addr = lookup(ADDR_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse()
            .with_context(|| format!("Invalid {ADDR_VAR}: {raw_addr}"))?;
        Ok(Self { db_path, addr })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "budget-tracker", "BudgetTracker")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE))
}
