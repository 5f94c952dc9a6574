use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::events::repo_types::{EventPlayerRow, EventRow, InviteRow};

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub season_id: i32,
    /// Defaults to the league's next Thursday when omitted.
    #[serde(default, with = "date_format::option")]
    pub event_date: Option<Date>,
    pub host_player_id: Option<i32>,
    pub tournament_type_id: Option<i32>,
    pub buy_in_amount: Option<Decimal>,
    #[serde(default)]
    pub rebuy_limit: i32,
    pub league_keeper_player_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub event_id: i32,
    #[serde(with = "date_format")]
    pub event_date: Date,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    pub player_id: i32,
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub player_id: i32,
    pub buy_ins: i32,
    pub rebuys: i32,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub updated: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub player_id: i32,
    pub finish_place: i32,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    pub event: EventRow,
    pub players: Vec<EventPlayerRow>,
    pub invites: Vec<InviteRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_event_request_parses_camel_case_with_date() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"seasonId":1,"eventDate":"2026-08-27","rebuyLimit":2,"buyInAmount":"50"}"#,
        )
        .unwrap();
        assert_eq!(req.season_id, 1);
        assert_eq!(req.rebuy_limit, 2);
        assert_eq!(
            req.event_date,
            Some(Date::from_calendar_date(2026, time::Month::August, 27).unwrap())
        );
    }

    #[test]
    fn event_date_is_optional() {
        let req: CreateEventRequest =
            serde_json::from_str(r#"{"seasonId":1,"rebuyLimit":0}"#).unwrap();
        assert!(req.event_date.is_none());
    }
}
