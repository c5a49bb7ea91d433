//! Handlers for the `/auth` resource: registration, login, token refresh,
//! logout, current user, and admin impersonation.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use bazaar_core::error::CoreError;
use bazaar_core::impersonation::check_impersonation;
use bazaar_core::roles::Role;
use bazaar_core::types::DbId;
use bazaar_core::validation::validate_dto;
use bazaar_db::models::session::CreateSession;
use bazaar_db::models::user::{CreateUser, User, UserResponse};
use bazaar_db::repositories::{SessionRepo, UserRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::cookies::{clear_session_cookies, read_cookie, session_cookies, REFRESH_COOKIE};
use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Optional body for `POST /auth/refresh` when the cookie is unavailable.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `GET /auth/me` payload.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Admin id when this session is an impersonation.
    pub impersonated_by: Option<DbId>,
}

type SessionCookies = AppendHeaders<[(axum::http::HeaderName, String); 2]>;

fn cookie_headers(cookies: [String; 2]) -> SessionCookies {
    let [access, refresh] = cookies;
    AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)])
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create a buyer or seller account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role = input.role.unwrap_or(Role::Buyer);
    if !role.is_self_assignable() {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot register as {role}"
        ))));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash,
            role: role.as_str().to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role, "User registered");

    let cookies = issue_session(&state, &user, None, user_agent(&headers)).await?;
    Ok((
        StatusCode::CREATED,
        cookie_headers(cookies),
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email + password. Sets the access and refresh cookies.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let count = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if count >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, "Account locked after repeated failed logins");
        }
        return Err(invalid());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let cookies = issue_session(&state, &user, None, user_agent(&headers)).await?;
    Ok((
        cookie_headers(cookies),
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/refresh
///
/// Exchange a valid refresh token (cookie, or JSON body) for a new pair.
/// The old session is revoked; impersonation sessions stay impersonations.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let token = match read_cookie(&headers, REFRESH_COOKIE) {
        Some(token) => token,
        None if !body.is_empty() => {
            serde_json::from_slice::<RefreshRequest>(&body)
                .map_err(|e| AppError::BadRequest(e.to_string()))?
                .refresh_token
        }
        None => {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Missing refresh token".into(),
            )))
        }
    };

    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid or expired refresh token".into()));

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &hash_refresh_token(&token))
        .await?
        .ok_or_else(invalid)?;

    // A concurrent refresh already rotated this token.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(invalid());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let cookies = issue_session(&state, &user, session.impersonator_id, user_agent(&headers)).await?;
    Ok((
        cookie_headers(cookies),
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Revoke the caller's sessions and clear the auth cookies. Returns 204.
/// Ending an impersonated session only revokes the admin's impersonations.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    match auth_user.impersonator_id {
        Some(admin_id) => SessionRepo::revoke_impersonations_by(&state.pool, admin_id).await?,
        None => SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?,
    };

    Ok((
        StatusCode::NO_CONTENT,
        cookie_headers(clear_session_cookies(&state.config)),
    ))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| not_found("User", auth_user.user_id))?;

    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from(&user),
            impersonated_by: auth_user.impersonator_id,
        },
    }))
}

/// POST /api/auth/impersonate/{user_id}
///
/// Admin-only. Issues a session for the target user tagged with the admin's id.
pub async fn impersonate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    headers: HeaderMap,
    Path(target_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let target = UserRepo::find_by_id(&state.pool, target_id)
        .await?
        .ok_or_else(|| not_found("User", target_id))?;
    let target_role = Role::parse(&target.role)?;

    check_impersonation(
        auth_user.user_id,
        auth_user.role,
        auth_user.impersonator_id.is_some(),
        target.id,
        target_role,
        target.is_active,
    )?;

    tracing::info!(
        admin_id = auth_user.user_id,
        target_user_id = target.id,
        "Impersonation started"
    );

    let cookies =
        issue_session(&state, &target, Some(auth_user.user_id), user_agent(&headers)).await?;
    Ok((
        cookie_headers(cookies),
        Json(DataResponse {
            data: MeResponse {
                user: UserResponse::from(&target),
                impersonated_by: Some(auth_user.user_id),
            },
        }),
    ))
}

/// POST /api/auth/impersonate/stop
///
/// Ends the impersonation and signs the admin back in as themselves.
pub async fn stop_impersonation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.impersonator_id.ok_or_else(|| {
        AppError::BadRequest("This session is not an impersonation".into())
    })?;

    let admin = UserRepo::find_by_id(&state.pool, admin_id)
        .await?
        .filter(|u| u.is_active && u.role == Role::Admin.as_str())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Impersonating admin is no longer active".into(),
            ))
        })?;

    SessionRepo::revoke_impersonations_by(&state.pool, admin_id).await?;

    tracing::info!(
        admin_id,
        target_user_id = auth_user.user_id,
        "Impersonation stopped"
    );

    let cookies = issue_session(&state, &admin, None, user_agent(&headers)).await?;
    Ok((
        cookie_headers(cookies),
        Json(DataResponse {
            data: UserResponse::from(&admin),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.chars().take(255).collect())
}

/// Generate access + refresh tokens, persist a session row, and return the
/// `Set-Cookie` values.
async fn issue_session(
    state: &AppState,
    user: &User,
    impersonator: Option<DbId>,
    user_agent: Option<String>,
) -> AppResult<[String; 2]> {
    let access_token = generate_access_token(user.id, &user.role, impersonator, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            impersonator_id: impersonator,
            expires_at,
            user_agent,
        },
    )
    .await?;

    Ok(session_cookies(
        &state.config,
        &access_token,
        &refresh_plaintext,
    ))
}
