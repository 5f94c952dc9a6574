use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Event header joined to its tournament type, host and league keeper.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub event_id: i32,
    pub season_id: i32,
    #[serde(with = "date_format")]
    pub event_date: Date,
    pub host_player_id: Option<i32>,
    pub tournament_type_id: Option<i32>,
    pub buy_in_amount: Decimal,
    pub rebuy_limit: i32,
    pub league_keeper_player_id: Option<i32>,
    pub notes: Option<String>,
    pub tournament_type_name: Option<String>,
    pub host_name: Option<String>,
    pub keeper_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventPlayerRow {
    pub event_player_id: i32,
    pub player_id: i32,
    pub full_name: String,
    pub buy_ins: i32,
    pub rebuys: i32,
    pub finish_place: Option<i32>,
    pub prize_won: Option<Decimal>,
}

/// Invite with the player's latest response, when any.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteRow {
    pub invite_id: i32,
    pub player_id: i32,
    pub full_name: String,
    pub response: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub responded_at: Option<OffsetDateTime>,
}
