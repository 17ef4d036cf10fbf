use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::{Config, ADDR_VAR, DB_VAR};
use crate::db::{Database, SeedOptions};

const DEFAULT_SEED_USER: &str = "testuser";
const DEFAULT_SEED_COUNT: usize = 75;

pub(crate) fn as_cli(args: &[String], config: &Config) -> Result<()> {
    match args[1].as_str() {
        "serve" => super::as_server(config),
        "seed" => cli_seed(&args[2..], config),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budget-tracker {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("budget-tracker: personal budget and spending API");
    println!();
    println!("Usage: budget-tracker [command]");
    println!();
    println!("Commands:");
    println!("  (none), serve                 Start the HTTP server");
    println!("  seed                          Create demo users and sample data");
    println!("    --user <name>               User to fill with data (default: {DEFAULT_SEED_USER})");
    println!("    --count <n>                 Transactions to generate (default: {DEFAULT_SEED_COUNT})");
    println!("    --clear                     Delete the user's existing data first");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment:");
    println!("  {DB_VAR:<29} SQLite database path");
    println!("  {ADDR_VAR:<29} Listen address (default: 127.0.0.1:8000)");
    println!("  RUST_LOG                      Log filter (default: budget_tracker=info)");
}

fn cli_seed(args: &[String], config: &Config) -> Result<()> {
    let opts = seed_options(args, chrono::Local::now().date_naive())?;
    let mut db = Database::open(&config.db_path)?;
    let report = db.seed_demo(&opts)?;

    println!("Seeded data for {}", opts.user);
    println!("  Users created:        {}", report.users_created);
    println!("  Categories created:   {}", report.categories_created);
    println!("  Transactions created: {}", report.transactions_created);
    println!("    in the current month: {}", report.transactions_this_month);
    println!("  Budgets created:      {}", report.budgets_created);
    Ok(())
}

fn seed_options(args: &[String], today: NaiveDate) -> Result<SeedOptions> {
    let user = args
        .windows(2)
        .find(|w| w[0] == "--user")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| DEFAULT_SEED_USER.to_string());

    let count = match args.windows(2).find(|w| w[0] == "--count") {
        Some(w) => w[1]
            .parse()
            .with_context(|| format!("Invalid --count: {}", w[1]))?,
        None => DEFAULT_SEED_COUNT,
    };

    Ok(SeedOptions {
        user,
        clear: args.iter().any(|a| a == "--clear"),
        count,
        today,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seed_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let opts = seed_options(&[], today).unwrap();
        assert_eq!(opts.user, "testuser");
        assert_eq!(opts.count, 75);
        assert!(!opts.clear);
        assert_eq!(opts.today, today);
    }

    #[test]
    fn test_seed_flags() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let opts = seed_options(&args(&["--clear", "--user", "janedoe", "--count", "10"]), today)
            .unwrap();
        assert_eq!(opts.user, "janedoe");
        assert_eq!(opts.count, 10);
        assert!(opts.clear);
    }

    #[test]
    fn test_seed_bad_count() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(seed_options(&args(&["--count", "many"]), today).is_err());
    }

    #[test]
    fn test_unknown_command_fails() {
        let config = Config {
            db_path: "unused.db".into(),
            addr: "127.0.0.1:0".parse().unwrap(),
        };
        let err = as_cli(&args(&["budget-tracker", "frobnicate"]), &config).unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
        assert!(as_cli(&args(&["budget-tracker", "version"]), &config).is_ok());
    }
}
