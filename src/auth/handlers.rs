use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::auth::{
    dto::{
        ChangePasswordRequest, ChangePasswordResponse, CreateUserRequest, LoginRequest,
        SessionValidation, UserInfo,
    },
    extractors::{client_ip_from_headers, session_token_from_headers, SessionUser, SESSION_COOKIE},
    service,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
        .route("/auth/me", get(me))
        .route("/auth/users", post(create_user))
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
    )
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "Username and password are required" })),
        )
            .into_response();
    }

    let ip = client_ip_from_headers(&headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let result = match service::login(
        &state.db,
        &state.config.auth,
        payload.username.trim(),
        &payload.password,
        ip.as_deref(),
        user_agent.as_deref(),
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "login failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": "Internal error" })),
            )
                .into_response();
        }
    };

    if !result.success {
        warn!(username = %payload.username.trim(), "login rejected");
        return (StatusCode::UNAUTHORIZED, Json(result)).into_response();
    }

    info!(username = %payload.username.trim(), "user logged in");
    let max_age = state.config.auth.session_ttl_minutes * 60;
    let mut response_headers = HeaderMap::new();
    if let Some(token) = result.session_token.as_deref() {
        if let Ok(value) = session_cookie(token, max_age).parse() {
            response_headers.insert(header::SET_COOKIE, value);
        }
    }
    (StatusCode::OK, response_headers, Json(result)).into_response()
}

#[instrument(skip(state))]
async fn validate(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token_from_headers(&headers) else {
        return (StatusCode::UNAUTHORIZED, Json(SessionValidation::invalid()));
    };

    match service::validate_session(&state.db, &state.config.auth, &token).await {
        Ok(validation) if validation.is_valid => (StatusCode::OK, Json(validation)),
        Ok(validation) => (StatusCode::UNAUTHORIZED, Json(validation)),
        Err(e) => {
            error!(error = %e, "session validation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SessionValidation::invalid()),
            )
        }
    }
}

#[instrument(skip(state))]
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token_from_headers(&headers) {
        if let Err(e) = service::logout(&state.db, &token).await {
            error!(error = %e, "logout failed");
        }
    }

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = session_cookie("", 0).parse() {
        response_headers.insert(header::SET_COOKIE, value);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(serde_json::json!({ "success": true })),
    )
}

#[instrument(skip(state, payload))]
async fn change_password(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, (StatusCode, String)> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Current and new password are required".into(),
        ));
    }

    let (success, message) = service::change_password(
        &state.db,
        user.user_id,
        &payload.current_password,
        &payload.new_password,
    )
    .await
    .map_err(internal)?;

    if !success {
        return Err((StatusCode::BAD_REQUEST, message));
    }
    info!(user_id = user.user_id, "password changed");
    Ok(Json(ChangePasswordResponse { success, message }))
}

#[instrument(skip_all)]
async fn me(SessionUser(user): SessionUser) -> Json<UserInfo> {
    Json(user)
}

#[instrument(skip(state, payload))]
async fn create_user(
    State(state): State<AppState>,
    SessionUser(admin): SessionUser,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if admin.role != "Admin" {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "message": "Admin role required" })),
        )
            .into_response();
    }
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "Username and password are required" })),
        )
            .into_response();
    }

    match service::create_user(&state.db, &payload).await {
        Ok(result) => {
            if result.success {
                info!(username = %payload.username, created_by = admin.user_id, "user created");
            }
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": "Internal error" })),
            )
                .into_response()
        }
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let cookie = session_cookie("tok-1", 28800);
        assert!(cookie.starts_with("poker_session=tok-1;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=28800"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = session_cookie("", 0);
        assert!(cookie.starts_with("poker_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
