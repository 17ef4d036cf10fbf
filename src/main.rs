mod api;
mod config;
mod credentials;
mod db;
mod models;
mod report;
mod run;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env()?;
    init_tracing();

    match args.len() {
        1 => run::as_server(&config),
        _ => run::as_cli(&args, &config),
    }
}

/// Logs to stderr. `RUST_LOG` overrides the default `budget_tracker=info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("budget_tracker=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
