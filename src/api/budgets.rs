use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::{NON_FIELD, OWN_CATEGORIES_ONLY};
use super::{nullable, parse_param, ApiError, ApiResult, AppState, CurrentUser};
use crate::db::{BudgetFilter, Database};
use crate::models::{check_amount, Budget, UserId};
use crate::report::{self, BudgetAnalysis, BudgetView};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;
const INTEGER_MESSAGE: &str = "A valid integer is required.";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BudgetQuery {
    pub month: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BudgetInput {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    /// Absent leaves the category alone; `null` makes this the overall budget.
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<i64>>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

fn check_month(month: u32) -> ApiResult<u32> {
    if month < 1 {
        Err(ApiError::invalid("month", "Ensure this value is greater than or equal to 1."))
    } else if !Budget::is_valid_month(month) {
        Err(ApiError::invalid("month", "Ensure this value is less than or equal to 12."))
    } else {
        Ok(month)
    }
}

fn check_year(year: i32) -> ApiResult<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ApiError::invalid(
            "year",
            format!("Ensure this value is between {MIN_YEAR} and {MAX_YEAR}."),
        ))
    }
}

pub(crate) async fn list(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<BudgetQuery>,
) -> ApiResult<Json<Vec<BudgetView>>> {
    let filter = BudgetFilter {
        month: parse_param("month", query.month.as_deref(), INTEGER_MESSAGE)?,
        year: parse_param("year", query.year.as_deref(), INTEGER_MESSAGE)?,
        category_id: parse_param("category", query.category.as_deref(), INTEGER_MESSAGE)?,
    };
    let db = state.db()?;
    let budgets = db.find_budgets(user, &filter)?;
    Ok(Json(report::evaluate_all(&db, user, budgets)?))
}

pub(crate) async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<BudgetInput>,
) -> ApiResult<(StatusCode, Json<BudgetView>)> {
    let db = state.db()?;
    let mut budget = Budget::new(user, String::new(), Decimal::ZERO, None, 1, 1);
    apply(&db, user, &mut budget, input, false)?;
    budget.id = Some(db.insert_budget(&budget)?);
    Ok((StatusCode::CREATED, Json(report::evaluate(&db, budget)?)))
}

pub(crate) async fn detail(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BudgetView>> {
    let db = state.db()?;
    let budget = db.get_budget(user, id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(report::evaluate(&db, budget)?))
}

pub(crate) async fn replace(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<BudgetInput>,
) -> ApiResult<Json<BudgetView>> {
    write(&state, user, id, input, false)
}

pub(crate) async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<BudgetInput>,
) -> ApiResult<Json<BudgetView>> {
    write(&state, user, id, input, true)
}

pub(crate) async fn remove(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db()?.delete_budget(user, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnalysisQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

/// Budget vs. actual for one month, defaulting to the current one.
pub(crate) async fn analysis(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> ApiResult<Json<BudgetAnalysis>> {
    let today = chrono::Local::now().date_naive();
    let month = parse_param("month", query.month.as_deref(), INTEGER_MESSAGE)?
        .map(check_month)
        .transpose()?
        .unwrap_or(today.month());
    let year = parse_param("year", query.year.as_deref(), INTEGER_MESSAGE)?
        .map(check_year)
        .transpose()?
        .unwrap_or(today.year());

    let db = state.db()?;
    Ok(Json(report::analyze_budgets(&db, user, month, year)?))
}

fn write(
    state: &AppState,
    user: UserId,
    id: i64,
    input: BudgetInput,
    partial: bool,
) -> ApiResult<Json<BudgetView>> {
    let db = state.db()?;
    let mut budget = db.get_budget(user, id)?.ok_or(ApiError::NotFound)?;
    apply(&db, user, &mut budget, input, partial)?;
    budget.updated_at = crate::models::timestamp_now();
    if !db.update_budget(&budget)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(report::evaluate(&db, budget)?))
}

/// Validates `input` and copies it onto `budget`. Full writes require
/// `name`, `amount`, `month` and `year`; `category` may be omitted for an
/// overall budget.
fn apply(
    db: &Database,
    user: UserId,
    budget: &mut Budget,
    input: BudgetInput,
    partial: bool,
) -> ApiResult<()> {
    if let Some(name) = super::present(input.name, "name", partial)? {
        budget.name = super::required_text("name", &name, Budget::MAX_NAME_LEN)?;
    }
    if let Some(amount) = super::present(input.amount, "amount", partial)? {
        check_amount(amount).map_err(|msg| ApiError::invalid("amount", msg))?;
        budget.amount = amount;
    }
    match input.category {
        Some(category) => budget.category_id = category,
        None if !partial => budget.category_id = None,
        None => {}
    }
    if let Some(month) = super::present(input.month, "month", partial)? {
        budget.month = check_month(month)?;
    }
    if let Some(year) = super::present(input.year, "year", partial)? {
        budget.year = check_year(year)?;
    }

    if let Some(cid) = budget.category_id {
        if db.get_category(user, cid)?.is_none() {
            return Err(ApiError::invalid("category", OWN_CATEGORIES_ONLY));
        }
    }
    if db.budget_slot_taken(user, budget.month, budget.year, budget.category_id, budget.id)? {
        return Err(ApiError::invalid(
            NON_FIELD,
            "The fields user, month, year, category must make a unique set.",
        ));
    }
    Ok(())
}
