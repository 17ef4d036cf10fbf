use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::categories::parse_entry_type;
use super::error::OWN_CATEGORIES_ONLY;
use super::{parse_param, ApiError, ApiResult, AppState, CurrentUser};
use super::{DATE_FORMAT_MESSAGE, NUMBER_MESSAGE};
use crate::db::{Database, TransactionFilter, TransactionOrder};
use crate::models::{check_amount, Category, Transaction, UserId};
use crate::report::{self, FinancialSummary, Period};

/// A transaction with its category's display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

impl TransactionView {
    fn new(transaction: Transaction, category: Option<&Category>) -> Self {
        Self {
            transaction,
            category_name: category.map(|c| c.name.clone()),
            category_color: category.map(|c| c.color.clone()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub amount_min: Option<String>,
    pub amount_max: Option<String>,
    pub ordering: Option<String>,
}

impl TransactionQuery {
    fn into_filter(self, user: UserId) -> ApiResult<TransactionFilter> {
        let mut filter = TransactionFilter::for_user(user);
        if let Some(raw) = self.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.kind(parse_entry_type("type", raw)?);
        }
        filter.category_id = parse_param(
            "category",
            self.category.as_deref(),
            "Select a valid choice. That choice is not one of the available choices.",
        )?;
        filter.search = self.search.filter(|s| !s.trim().is_empty());
        filter.date_from = parse_param("date_from", self.date_from.as_deref(), DATE_FORMAT_MESSAGE)?;
        filter.date_to = parse_param("date_to", self.date_to.as_deref(), DATE_FORMAT_MESSAGE)?;
        filter.amount_min = parse_param("amount_min", self.amount_min.as_deref(), NUMBER_MESSAGE)?;
        filter.amount_max = parse_param("amount_max", self.amount_max.as_deref(), NUMBER_MESSAGE)?;
        if let Some(raw) = self.ordering.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Unknown ordering fields are ignored and the default order applies.
            if let Some(order) = TransactionOrder::parse(raw) {
                filter.order = order;
            }
        }
        Ok(filter)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransactionInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub(crate) async fn list(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    let filter = query.into_filter(user)?;
    let db = state.db()?;
    let categories = db.get_categories(user, None)?;
    let views = db
        .find_transactions(&filter)?
        .into_iter()
        .map(|t| {
            let category = Category::find_by_id(&categories, t.category_id);
            TransactionView::new(t, category)
        })
        .collect();
    Ok(Json(views))
}

pub(crate) async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<TransactionInput>,
) -> ApiResult<(StatusCode, Json<TransactionView>)> {
    let db = state.db()?;
    let mut txn = Transaction::new(
        user,
        String::new(),
        Decimal::ZERO,
        crate::models::EntryType::Expense,
        0,
        NaiveDate::default(),
    );
    let category = apply(&db, user, &mut txn, input, false)?;
    txn.id = Some(db.insert_transaction(&txn)?);
    Ok((StatusCode::CREATED, Json(TransactionView::new(txn, Some(&category)))))
}

pub(crate) async fn detail(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TransactionView>> {
    let db = state.db()?;
    let txn = db.get_transaction(user, id)?.ok_or(ApiError::NotFound)?;
    let category = db.get_category(user, txn.category_id)?;
    Ok(Json(TransactionView::new(txn, category.as_ref())))
}

pub(crate) async fn replace(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TransactionInput>,
) -> ApiResult<Json<TransactionView>> {
    write(&state, user, id, input, false)
}

pub(crate) async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TransactionInput>,
) -> ApiResult<Json<TransactionView>> {
    write(&state, user, id, input, true)
}

pub(crate) async fn remove(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db()?.delete_transaction(user, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Income, expenses and per-category totals between two dates, both included.
/// Defaults to the current month up to today.
pub(crate) async fn summary(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<FinancialSummary>> {
    let today = chrono::Local::now().date_naive();
    let default = Period::month_to_date(today);
    let start = parse_param("start_date", query.start_date.as_deref(), DATE_FORMAT_MESSAGE)?
        .unwrap_or(default.start);
    let end = parse_param("end_date", query.end_date.as_deref(), DATE_FORMAT_MESSAGE)?
        .unwrap_or(default.end);

    let db = state.db()?;
    Ok(Json(report::summarize(&db, user, &Period::explicit(start, end))?))
}

fn write(
    state: &AppState,
    user: UserId,
    id: i64,
    input: TransactionInput,
    partial: bool,
) -> ApiResult<Json<TransactionView>> {
    let db = state.db()?;
    let mut txn = db.get_transaction(user, id)?.ok_or(ApiError::NotFound)?;
    let category = apply(&db, user, &mut txn, input, partial)?;
    txn.updated_at = crate::models::timestamp_now();
    if !db.update_transaction(&txn)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(TransactionView::new(txn, Some(&category))))
}

/// Validates `input`, copies it onto `txn` and returns the category the
/// transaction ends up in. Full writes require every field but `description`.
fn apply(
    db: &Database,
    user: UserId,
    txn: &mut Transaction,
    input: TransactionInput,
    partial: bool,
) -> ApiResult<Category> {
    if let Some(title) = super::present(input.title, "title", partial)? {
        txn.title = super::required_text("title", &title, Transaction::MAX_TITLE_LEN)?;
    }
    if let Some(description) = input.description {
        txn.description = description;
    }
    if let Some(amount) = super::present(input.amount, "amount", partial)? {
        check_amount(amount).map_err(|msg| ApiError::invalid("amount", msg))?;
        txn.amount = amount;
    }
    if let Some(raw) = super::present(input.kind, "type", partial)? {
        txn.kind = parse_entry_type("type", &raw)?;
    }
    if let Some(category_id) = super::present(input.category, "category", partial)? {
        txn.category_id = category_id;
    }
    if let Some(date) = super::present(input.date, "date", partial)? {
        txn.date = date;
    }

    db.get_category(user, txn.category_id)?
        .ok_or_else(|| ApiError::invalid("category", OWN_CATEGORIES_ONLY))
}
