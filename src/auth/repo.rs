use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{CredentialRow, UserAuthRow, ValidatedSessionRow};

/// Exact-match username lookup, joined to the player for the full name.
pub async fn find_user_for_login(db: &PgPool, username: &str) -> anyhow::Result<Option<UserAuthRow>> {
    let row = sqlx::query_as::<_, UserAuthRow>(
        r#"
        SELECT u.user_id, u.username, u.password_hash, u.salt, u.role,
               u.player_id, u.is_active, p.full_name
        FROM users u
        LEFT JOIN players p ON p.player_id = u.player_id
        WHERE u.username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Failed attempts for a username within the trailing rate-limit window.
pub async fn count_recent_failed_attempts(
    db: &PgPool,
    username: &str,
    window_minutes: i64,
) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM login_attempts
        WHERE username = $1
          AND NOT success
          AND attempted_at > now() - make_interval(mins => $2::int)
        "#,
    )
    .bind(username)
    .bind(window_minutes)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn insert_login_attempt(
    db: &PgPool,
    username: &str,
    success: bool,
    ip_address: Option<&str>,
    failure_reason: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO login_attempts (username, success, ip_address, failure_reason)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(username)
    .bind(success)
    .bind(ip_address)
    .bind(failure_reason)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_audit_entry(
    db: &PgPool,
    user_id: i32,
    action: &str,
    entity_type: Option<&str>,
    entity_id: Option<i32>,
    details: Option<&str>,
    ip_address: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (user_id, action, entity_type, entity_id, details, ip_address)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(details)
    .bind(ip_address)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_session(
    db: &PgPool,
    user_id: i32,
    session_token: Uuid,
    refresh_token: Uuid,
    ttl_minutes: i64,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_sessions
            (user_id, session_token, refresh_token, expires_at, ip_address, user_agent)
        VALUES ($1, $2, $3, now() + make_interval(mins => $4::int), $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(session_token)
    .bind(refresh_token)
    .bind(ttl_minutes)
    .bind(ip_address)
    .bind(user_agent)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn touch_last_login(db: &PgPool, user_id: i32) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Validates a session in one statement: the row must be active and
/// unexpired, and a hit slides the expiry forward. GREATEST keeps the
/// extension monotonic so renewal can never shorten a session.
pub async fn validate_and_renew(
    db: &PgPool,
    token: Uuid,
    renew_minutes: i64,
) -> anyhow::Result<Option<ValidatedSessionRow>> {
    let row = sqlx::query_as::<_, ValidatedSessionRow>(
        r#"
        UPDATE user_sessions s
        SET expires_at = GREATEST(s.expires_at, now() + make_interval(mins => $2::int))
        FROM users u
        LEFT JOIN players p ON p.player_id = u.player_id
        WHERE s.session_token = $1
          AND s.is_active
          AND s.expires_at > now()
          AND u.user_id = s.user_id
        RETURNING u.user_id, u.username, u.role, u.player_id, p.full_name, s.expires_at
        "#,
    )
    .bind(token)
    .bind(renew_minutes)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Returns true when an active session was actually deactivated.
pub async fn deactivate_session(db: &PgPool, token: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE user_sessions SET is_active = FALSE WHERE session_token = $1 AND is_active",
    )
    .bind(token)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn deactivate_user_sessions(db: &PgPool, user_id: i32) -> anyhow::Result<()> {
    sqlx::query("UPDATE user_sessions SET is_active = FALSE WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_credentials(db: &PgPool, user_id: i32) -> anyhow::Result<Option<CredentialRow>> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT user_id, password_hash, salt FROM users WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn update_password(
    db: &PgPool,
    user_id: i32,
    password_hash: &str,
    salt: &str,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = $1, salt = $2 WHERE user_id = $3")
        .bind(password_hash)
        .bind(salt)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn username_exists(db: &PgPool, username: &str) -> anyhow::Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn insert_user(
    db: &PgPool,
    username: &str,
    password_hash: &str,
    salt: &str,
    role: &str,
    player_id: Option<i32>,
) -> anyhow::Result<i32> {
    let user_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, salt, role, player_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING user_id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(salt)
    .bind(role)
    .bind(player_id)
    .fetch_one(db)
    .await?;
    Ok(user_id)
}
