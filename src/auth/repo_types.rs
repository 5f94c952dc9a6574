use sqlx::FromRow;
use time::OffsetDateTime;

/// Credential row joined to the linked player, as loaded for login.
#[derive(Debug, Clone, FromRow)]
pub struct UserAuthRow {
    pub user_id: i32,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub role: String,
    pub player_id: Option<i32>,
    pub is_active: bool,
    pub full_name: Option<String>,
}

/// Result of validating (and renewing) a session token.
#[derive(Debug, Clone, FromRow)]
pub struct ValidatedSessionRow {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub player_id: Option<i32>,
    pub full_name: Option<String>,
    pub expires_at: OffsetDateTime,
}

/// Just enough of a user to check the current password.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub user_id: i32,
    pub password_hash: String,
    pub salt: String,
}
