use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Projection of a user returned to the client; full name comes from the
/// linked player row on both the login and validate paths.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub player_id: Option<i32>,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    pub message: String,
}

impl LoginResponse {
    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            session_token: None,
            user: None,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

impl SessionValidation {
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            user: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
    pub message: String,
}

/// Admin-only user creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    pub player_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_serializes_camel_case() {
        let user = UserInfo {
            user_id: 3,
            username: "dana".into(),
            role: "Admin".into(),
            player_id: Some(9),
            full_name: Some("Dana Levi".into()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"userId\":3"));
        assert!(json.contains("\"playerId\":9"));
        assert!(json.contains("Dana Levi"));
    }

    #[test]
    fn rejected_login_omits_token_and_user() {
        let json = serde_json::to_string(&LoginResponse::rejected("no")).unwrap();
        assert!(!json.contains("sessionToken"));
        assert!(!json.contains("\"user\""));
        assert!(json.contains("\"success\":false"));
    }
}
