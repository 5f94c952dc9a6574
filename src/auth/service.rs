use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::dto::{
    CreateUserRequest, CreateUserResponse, LoginResponse, SessionValidation, UserInfo,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo;
use crate::auth::repo_types::UserAuthRow;
use crate::config::AuthConfig;

const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
const MSG_RATE_LIMITED: &str = "Too many failed login attempts. Try again later.";
const MSG_USER_INACTIVE: &str = "Account is inactive";

/// Why a login was refused. The rate limit outranks everything else, so a
/// limited account learns nothing about its credentials; unknown users and
/// wrong passwords share one client-facing message.
#[derive(Debug, PartialEq, Eq)]
enum LoginDenial {
    RateLimited,
    UnknownUser,
    Inactive,
    WrongPassword,
}

impl LoginDenial {
    fn failure_reason(&self) -> &'static str {
        match self {
            LoginDenial::RateLimited => "Rate limit exceeded",
            LoginDenial::UnknownUser => "User not found",
            LoginDenial::Inactive => "User inactive",
            LoginDenial::WrongPassword => "Invalid password",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            LoginDenial::RateLimited => MSG_RATE_LIMITED,
            LoginDenial::Inactive => MSG_USER_INACTIVE,
            LoginDenial::UnknownUser | LoginDenial::WrongPassword => MSG_INVALID_CREDENTIALS,
        }
    }
}

/// The pre-session checks, in precedence order: rate limit first (before
/// the password is even looked at), then existence, activity, password.
fn gate_login(
    user: Option<UserAuthRow>,
    password: &str,
    recent_failures: i64,
    max_failed_logins: i64,
) -> Result<UserAuthRow, LoginDenial> {
    if recent_failures >= max_failed_logins {
        return Err(LoginDenial::RateLimited);
    }
    let Some(user) = user else {
        return Err(LoginDenial::UnknownUser);
    };
    if !user.is_active {
        return Err(LoginDenial::Inactive);
    }
    if !verify_password(password, &user.password_hash, &user.salt) {
        return Err(LoginDenial::WrongPassword);
    }
    Ok(user)
}

/// Authenticates a user and opens a new session. Failures never reveal
/// which of username/password was wrong.
pub async fn login(
    db: &PgPool,
    cfg: &AuthConfig,
    username: &str,
    password: &str,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> anyhow::Result<LoginResponse> {
    let recent_failures =
        repo::count_recent_failed_attempts(db, username, cfg.rate_limit_window_minutes).await?;
    let candidate = repo::find_user_for_login(db, username).await?;

    let user = match gate_login(candidate, password, recent_failures, cfg.max_failed_logins) {
        Ok(user) => user,
        Err(denial) => {
            record_attempt(db, username, false, ip_address, Some(denial.failure_reason())).await;
            return Ok(LoginResponse::rejected(denial.message()));
        }
    };

    let session_token = Uuid::new_v4();
    let refresh_token = Uuid::new_v4();
    repo::insert_session(
        db,
        user.user_id,
        session_token,
        refresh_token,
        cfg.session_ttl_minutes,
        ip_address,
        user_agent,
    )
    .await?;
    repo::touch_last_login(db, user.user_id).await?;

    record_attempt(db, username, true, ip_address, None).await;
    record_audit(db, user.user_id, "Login", Some("User"), Some(user.user_id), ip_address).await;

    Ok(LoginResponse {
        success: true,
        session_token: Some(session_token.to_string()),
        user: Some(UserInfo {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
            player_id: user.player_id,
            full_name: user.full_name,
        }),
        message: "Login successful".to_string(),
    })
}

/// Validates a session token, sliding its expiry forward on success.
/// Malformed tokens fail fast without touching the database.
pub async fn validate_session(
    db: &PgPool,
    cfg: &AuthConfig,
    token: &str,
) -> anyhow::Result<SessionValidation> {
    let Ok(token) = Uuid::parse_str(token) else {
        return Ok(SessionValidation::invalid());
    };

    let Some(session) = repo::validate_and_renew(db, token, cfg.renew_minutes).await? else {
        return Ok(SessionValidation::invalid());
    };

    debug!(user_id = session.user_id, expires_at = %session.expires_at, "session renewed");
    Ok(SessionValidation {
        is_valid: true,
        user: Some(UserInfo {
            user_id: session.user_id,
            username: session.username,
            role: session.role,
            player_id: session.player_id,
            full_name: session.full_name,
        }),
    })
}

/// Idempotent: unknown, malformed or already-inactive tokens return false.
pub async fn logout(db: &PgPool, token: &str) -> anyhow::Result<bool> {
    let Ok(token) = Uuid::parse_str(token) else {
        return Ok(false);
    };
    repo::deactivate_session(db, token).await
}

/// Changes the password and forces re-login everywhere by deactivating
/// every session the user holds.
pub async fn change_password(
    db: &PgPool,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> anyhow::Result<(bool, String)> {
    let Some(user) = repo::find_credentials(db, user_id).await? else {
        return Ok((false, "User not found".to_string()));
    };

    if !verify_password(current_password, &user.password_hash, &user.salt) {
        return Ok((false, "Current password is incorrect".to_string()));
    }

    let (hash, salt) = hash_password(new_password);
    repo::update_password(db, user_id, &hash, &salt).await?;
    repo::deactivate_user_sessions(db, user_id).await?;
    record_audit(db, user_id, "PasswordChanged", Some("User"), Some(user_id), None).await;

    Ok((true, "Password changed".to_string()))
}

pub async fn create_user(db: &PgPool, req: &CreateUserRequest) -> anyhow::Result<CreateUserResponse> {
    if repo::username_exists(db, &req.username).await? {
        return Ok(CreateUserResponse {
            success: false,
            message: "Username already exists".to_string(),
            user_id: None,
        });
    }

    let (hash, salt) = hash_password(&req.password);
    let user_id = repo::insert_user(db, &req.username, &hash, &salt, &req.role, req.player_id).await?;

    Ok(CreateUserResponse {
        success: true,
        message: "User created".to_string(),
        user_id: Some(user_id),
    })
}

/// Attempt logging feeds rate limiting and the audit trail; a failure to
/// write it must not fail the login itself.
async fn record_attempt(
    db: &PgPool,
    username: &str,
    success: bool,
    ip_address: Option<&str>,
    failure_reason: Option<&str>,
) {
    if let Err(e) = repo::insert_login_attempt(db, username, success, ip_address, failure_reason).await
    {
        warn!(error = %e, username, "failed to record login attempt");
    }
}

async fn record_audit(
    db: &PgPool,
    user_id: i32,
    action: &str,
    entity_type: Option<&str>,
    entity_id: Option<i32>,
    ip_address: Option<&str>,
) {
    if let Err(e) =
        repo::insert_audit_entry(db, user_id, action, entity_type, entity_id, None, ip_address).await
    {
        warn!(error = %e, user_id, action, "failed to record audit entry");
    }
}

#[cfg(test)]
mod gate_tests {
    use super::*;
    use crate::auth::password::compute_hash;

    const MAX_FAILED: i64 = 5;

    fn account(password: &str, is_active: bool) -> UserAuthRow {
        let salt = "5b1c7a8e-aaaa-bbbb-cccc-000000000001";
        UserAuthRow {
            user_id: 7,
            username: "dealer".to_string(),
            password_hash: compute_hash(password, salt),
            salt: salt.to_string(),
            role: "Player".to_string(),
            player_id: Some(3),
            is_active,
            full_name: Some("Dana Dealer".to_string()),
        }
    }

    #[test]
    fn fifth_failure_blocks_sixth_attempt_even_with_correct_password() {
        let user = account("right-password", true);
        let denied = gate_login(Some(user), "right-password", MAX_FAILED, MAX_FAILED);
        assert_eq!(denied.unwrap_err(), LoginDenial::RateLimited);
    }

    #[test]
    fn four_recent_failures_still_allow_login() {
        let user = account("right-password", true);
        let allowed = gate_login(Some(user), "right-password", MAX_FAILED - 1, MAX_FAILED);
        assert_eq!(allowed.unwrap().user_id, 7);
    }

    #[test]
    fn unknown_user_is_denied() {
        let denied = gate_login(None, "whatever", 0, MAX_FAILED);
        assert_eq!(denied.unwrap_err(), LoginDenial::UnknownUser);
    }

    #[test]
    fn inactive_account_is_denied_before_password_check() {
        let user = account("right-password", false);
        let denied = gate_login(Some(user), "right-password", 0, MAX_FAILED);
        assert_eq!(denied.unwrap_err(), LoginDenial::Inactive);
    }

    #[test]
    fn wrong_password_is_denied() {
        let user = account("right-password", true);
        let denied = gate_login(Some(user), "wrong-password", 0, MAX_FAILED);
        assert_eq!(denied.unwrap_err(), LoginDenial::WrongPassword);
    }

    #[test]
    fn unknown_user_and_wrong_password_share_one_client_message() {
        let user = account("right-password", true);
        let wrong_pw = gate_login(Some(user), "wrong-password", 0, MAX_FAILED).unwrap_err();
        let unknown = gate_login(None, "wrong-password", 0, MAX_FAILED).unwrap_err();
        assert_eq!(wrong_pw.message(), unknown.message());
        assert_eq!(wrong_pw.message(), MSG_INVALID_CREDENTIALS);
    }

    #[test]
    fn rate_limit_outranks_unknown_user() {
        let denied = gate_login(None, "whatever", MAX_FAILED, MAX_FAILED);
        assert_eq!(denied.unwrap_err(), LoginDenial::RateLimited);
    }
}
