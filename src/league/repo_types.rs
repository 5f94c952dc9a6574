use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    pub player_id: i32,
    pub full_name: String,
    pub nickname: Option<String>,
    pub phone: Option<String>,
    pub language_preference: Option<String>,
    pub user_type: String,
    pub is_active: bool,
}
