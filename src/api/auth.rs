use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{NON_FIELD, REQUIRED};
use super::{ApiError, ApiResult, AppState};
use crate::credentials::{self, MIN_PASSWORD_LEN};
use crate::db::Database;
use crate::models::{User, UserId};

const NO_CREDENTIALS: &str = "Authentication credentials were not provided.";
const INVALID_TOKEN: &str = "Invalid token.";
const MAX_USERNAME_LEN: usize = 150;

/// The authenticated caller, resolved from an `Authorization: Token <key>`
/// (or `Bearer <key>`) header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CurrentUser(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated(NO_CREDENTIALS))?;
        let key = token_from_header(header).ok_or(ApiError::Unauthenticated(INVALID_TOKEN))?;

        let owner = state.db()?.user_for_token(key)?;
        match owner {
            Some(user) => Ok(Self(user)),
            None => {
                warn!("rejected unknown or inactive token");
                Err(ApiError::Unauthenticated(INVALID_TOKEN))
            }
        }
    }
}

fn token_from_header(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty() && !key.contains(' ')).then_some(key)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthResponse {
    pub user: User,
    pub token: String,
}

pub(crate) async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let username = super::required_text("username", &req.username, MAX_USERNAME_LEN)?;
    if req.password.is_empty() {
        return Err(ApiError::invalid("password", REQUIRED));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        ));
    }
    if req.password != req.password_confirm {
        return Err(ApiError::invalid(NON_FIELD, "Passwords don't match."));
    }

    let password_hash = credentials::hash_password(&req.password)?;
    let db = state.db()?;
    if db.get_user_by_username(&username)?.is_some() {
        return Err(ApiError::invalid(
            "username",
            "A user with that username already exists.",
        ));
    }

    let mut user = User::new(
        username,
        req.email.trim().to_string(),
        password_hash,
    );
    user.first_name = req.first_name.trim().to_string();
    user.last_name = req.last_name.trim().to_string();
    let id = UserId(db.insert_user(&user)?);
    user.id = Some(id.0);

    let token = issue_token(&db, id)?;
    info!(user = %id, username = %user.username, "registered user");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid(
            NON_FIELD,
            "Must include \"username\" and \"password\".",
        ));
    }

    let db = state.db()?;
    let user = db
        .get_user_by_username(req.username.trim())?
        .filter(|u| credentials::verify_password(&req.password, &u.password_hash));
    let Some(user) = user else {
        warn!(username = %req.username.trim(), "failed login");
        return Err(ApiError::invalid(
            NON_FIELD,
            "Unable to log in with provided credentials.",
        ));
    };
    if !user.is_active {
        return Err(ApiError::invalid(NON_FIELD, "User account is disabled."));
    }
    let id = user
        .user_id()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Stored user without id")))?;

    let token = issue_token(&db, id)?;
    Ok(Json(AuthResponse { user, token }))
}

pub(crate) async fn profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<User>> {
    let db = state.db()?;
    db.get_user(user)?.map(Json).ok_or(ApiError::NotFound)
}

/// Returns the user's token, creating one on first use.
fn issue_token(db: &Database, user: UserId) -> ApiResult<String> {
    if let Some(key) = db.token_for_user(user)? {
        return Ok(key);
    }
    let key = credentials::new_token_key();
    db.insert_token(user, &key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::token_from_header;

    #[test]
    fn test_token_from_header() {
        assert_eq!(token_from_header("Token abc"), Some("abc"));
        assert_eq!(token_from_header("Bearer abc"), Some("abc"));
        assert_eq!(token_from_header("token  abc "), Some("abc"));
        assert_eq!(token_from_header("Basic abc"), None);
        assert_eq!(token_from_header("Token"), None);
        assert_eq!(token_from_header("Token a b"), None);
    }
}
