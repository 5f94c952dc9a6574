use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Date, Duration, OffsetDateTime, Weekday};
use tracing::{error, info, instrument};

use crate::events::dto::{
    AttendanceEntry, AttendanceResponse, CreateEventRequest, CreateEventResponse, EventDetails,
    ResultEntry, ResultsResponse, RsvpRequest,
};
use crate::events::repo;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/create", post(create_event))
        .route("/events/:event_id", get(get_event))
        .route("/events/:event_id/rsvp", post(rsvp))
        .route("/events/:event_id/attendance", post(attendance))
        .route("/events/:event_id/results", post(results))
}

/// Poker night is Thursday; a date that already is one maps to itself.
fn next_thursday(from: Date) -> Date {
    let offset = (Weekday::Thursday.number_days_from_monday() as i64
        - from.weekday().number_days_from_monday() as i64)
        .rem_euclid(7);
    from + Duration::days(offset)
}

/// League-local today. The league runs on UTC+2; close enough for picking
/// a default event date.
fn league_today() -> Date {
    (OffsetDateTime::now_utc() + Duration::hours(2)).date()
}

#[instrument(skip(state, payload))]
async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<CreateEventResponse>, (StatusCode, String)> {
    let event_date = payload.event_date.unwrap_or_else(|| next_thursday(league_today()));

    let event_id = repo::create_event(&state.db, &payload, event_date)
        .await
        .map_err(internal)?;

    info!(event_id, season_id = payload.season_id, %event_date, "event ready");
    Ok(Json(CreateEventResponse {
        event_id,
        event_date,
    }))
}

#[instrument(skip(state))]
async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<EventDetails>, (StatusCode, String)> {
    match repo::get_event(&state.db, event_id).await.map_err(internal)? {
        Some((event, players, invites)) => Ok(Json(EventDetails {
            event,
            players,
            invites,
        })),
        None => Err((StatusCode::NOT_FOUND, "Event not found".into())),
    }
}

#[instrument(skip(state, payload))]
async fn rsvp(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Json(payload): Json<RsvpRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let written = repo::rsvp(&state.db, event_id, payload.player_id, &payload.response)
        .await
        .map_err(internal)?;

    if written == 0 {
        return Err((StatusCode::NOT_FOUND, "No invite for this player".into()));
    }
    Ok(StatusCode::OK)
}

#[instrument(skip(state, entries))]
async fn attendance(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Json(entries): Json<Vec<AttendanceEntry>>,
) -> Result<Json<AttendanceResponse>, (StatusCode, String)> {
    let updated = repo::upsert_attendance(&state.db, event_id, &entries)
        .await
        .map_err(internal)?;
    Ok(Json(AttendanceResponse {
        updated: updated as i64,
    }))
}

#[instrument(skip(state, entries))]
async fn results(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Json(entries): Json<Vec<ResultEntry>>,
) -> Result<Json<ResultsResponse>, (StatusCode, String)> {
    repo::save_results(&state.db, event_id, &entries)
        .await
        .map_err(internal)?;
    info!(event_id, results = entries.len(), "event settled");
    Ok(Json(ResultsResponse { saved: true }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn date(y: i32, m: Month, d: u8) -> Date {
        Date::from_calendar_date(y, m, d).unwrap()
    }

    #[test]
    fn thursday_maps_to_itself() {
        let thursday = date(2026, Month::August, 27);
        assert_eq!(thursday.weekday(), Weekday::Thursday);
        assert_eq!(next_thursday(thursday), thursday);
    }

    #[test]
    fn friday_rolls_to_next_week() {
        let friday = date(2026, Month::August, 28);
        assert_eq!(next_thursday(friday), date(2026, Month::September, 3));
    }

    #[test]
    fn monday_rolls_forward_same_week() {
        let monday = date(2026, Month::August, 24);
        assert_eq!(next_thursday(monday), date(2026, Month::August, 27));
    }

    #[test]
    fn result_is_always_a_thursday() {
        let mut day = date(2026, Month::January, 1);
        for _ in 0..30 {
            assert_eq!(next_thursday(day).weekday(), Weekday::Thursday);
            day = day.next_day().unwrap();
        }
    }
}
