use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::{NON_FIELD, REQUIRED};
use super::{ApiError, ApiResult, AppState, CurrentUser};
use crate::db::Database;
use crate::models::{Category, EntryType, UserId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Body for create and update. Every field is optional so the same shape
/// serves PATCH; full writes check presence themselves.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub color: Option<String>,
}

pub(super) fn parse_entry_type(field: &str, raw: &str) -> ApiResult<EntryType> {
    EntryType::parse(raw).ok_or_else(|| {
        ApiError::invalid(field, format!("\"{raw}\" is not a valid choice."))
    })
}

pub(crate) async fn list(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<Category>>> {
    let kind = match query.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_entry_type("type", raw)?),
        None => None,
    };
    let db = state.db()?;
    Ok(Json(db.get_categories(user, kind)?))
}

pub(crate) async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let db = state.db()?;
    let mut category = Category::new(
        user,
        String::new(),
        EntryType::Expense,
        Category::DEFAULT_COLOR.to_string(),
    );
    apply(&db, user, &mut category, input, false)?;
    category.id = Some(db.insert_category(&category)?);
    Ok((StatusCode::CREATED, Json(category)))
}

pub(crate) async fn detail(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    let db = state.db()?;
    db.get_category(user, id)?.map(Json).ok_or(ApiError::NotFound)
}

pub(crate) async fn replace(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    write(&state, user, id, input, false)
}

pub(crate) async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    write(&state, user, id, input, true)
}

pub(crate) async fn remove(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db()?.delete_category(user, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

fn write(
    state: &AppState,
    user: UserId,
    id: i64,
    input: CategoryInput,
    partial: bool,
) -> ApiResult<Json<Category>> {
    let db = state.db()?;
    let mut category = db.get_category(user, id)?.ok_or(ApiError::NotFound)?;
    apply(&db, user, &mut category, input, partial)?;
    if !db.update_category(&category)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(category))
}

/// Validates `input` and copies it onto `category`. When `partial` is false,
/// `name` and `type` must be present.
fn apply(
    db: &Database,
    user: UserId,
    category: &mut Category,
    input: CategoryInput,
    partial: bool,
) -> ApiResult<()> {
    match input.name {
        Some(name) => category.name = super::required_text("name", &name, Category::MAX_NAME_LEN)?,
        None if !partial => return Err(ApiError::invalid("name", REQUIRED)),
        None => {}
    }
    match input.kind {
        Some(raw) => category.kind = parse_entry_type("type", &raw)?,
        None if !partial => return Err(ApiError::invalid("type", REQUIRED)),
        None => {}
    }
    if let Some(color) = input.color {
        let color = color.trim();
        if !Category::is_valid_color(color) {
            return Err(ApiError::invalid("color", "Enter a valid hex color, eg. #3B82F6."));
        }
        category.color = color.to_string();
    }

    if db.category_name_taken(user, &category.name, category.id)? {
        return Err(ApiError::invalid(
            NON_FIELD,
            "The fields name, user must make a unique set.",
        ));
    }
    Ok(())
}
