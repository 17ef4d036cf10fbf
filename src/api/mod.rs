//! HTTP surface. Every handler resolves the caller first, then runs its
//! reads and writes while holding the database lock.

mod auth;
mod budgets;
mod categories;
mod error;
mod health;
mod transactions;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::config::Config;
use crate::db::Database;

pub(crate) use auth::CurrentUser;
pub(crate) use error::{ApiError, ApiResult};

#[derive(Clone)]
pub(crate) struct AppState {
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub(crate) fn db(&self) -> ApiResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Database lock poisoned")))
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/", get(health::health))
        .route("/health/db/", get(health::db_health))
        .route("/auth/register/", axum::routing::post(auth::register))
        .route("/auth/login/", axum::routing::post(auth::login))
        .route("/auth/profile/", get(auth::profile))
        .route(
            "/transactions/categories/",
            get(categories::list).post(categories::create),
        )
        .route(
            "/transactions/categories/:id/",
            get(categories::detail)
                .put(categories::replace)
                .patch(categories::update)
                .delete(categories::remove),
        )
        .route("/transactions/summary/", get(transactions::summary))
        .route(
            "/transactions/",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/:id/",
            get(transactions::detail)
                .put(transactions::replace)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route("/budgets/analysis/", get(budgets::analysis))
        .route("/budgets/", get(budgets::list).post(budgets::create))
        .route(
            "/budgets/:id/",
            get(budgets::detail)
                .put(budgets::replace)
                .patch(budgets::update)
                .delete(budgets::remove),
        )
        .with_state(state)
}

pub(crate) async fn serve(config: &Config, db: Database) -> Result<()> {
    let app = router(AppState::new(db));
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!(addr = %config.addr, db = %config.db_path.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Parses an optional query parameter. Blank values count as absent.
pub(super) fn parse_param<T: FromStr>(
    field: &str,
    raw: Option<&str>,
    message: &str,
) -> ApiResult<Option<T>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::invalid(field, message)),
        None => Ok(None),
    }
}

pub(super) const DATE_FORMAT_MESSAGE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub(super) const NUMBER_MESSAGE: &str = "Enter a number.";

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(super) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Passes `value` through, but a full (non-partial) write must supply it.
pub(super) fn present<T>(value: Option<T>, field: &str, partial: bool) -> ApiResult<Option<T>> {
    match value {
        None if !partial => Err(ApiError::invalid(field, error::REQUIRED)),
        other => Ok(other),
    }
}

/// Trims `value` and rejects it when blank or longer than `max` characters.
pub(super) fn required_text(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid(field, error::BLANK));
    }
    if value.chars().count() > max {
        return Err(ApiError::invalid(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(value.to_string())
}
