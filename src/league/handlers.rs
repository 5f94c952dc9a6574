use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::league::repo;
use crate::league::repo_types::PlayerRow;
use crate::settlement::{self, Standing};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/league/:season_id/standings", get(standings))
        .route("/league/:season_id/report", post(weekly_report))
        .route("/players/active", get(active_players))
}

#[instrument(skip(state))]
async fn standings(
    State(state): State<AppState>,
    Path(season_id): Path<i32>,
) -> Result<Json<Vec<Standing>>, (StatusCode, String)> {
    let entries = repo::season_entries(&state.db, season_id)
        .await
        .map_err(internal)?;
    Ok(Json(settlement::compute_standings(&entries)))
}

#[instrument(skip(state))]
async fn active_players(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerRow>>, (StatusCode, String)> {
    let players = repo::active_players(&state.db).await.map_err(internal)?;
    Ok(Json(players))
}

/// On-demand weekly report: compiles the standings and hands the rendered
/// document to the report store. Rendering richer formats (PDF) lives with
/// the report collaborator, not here.
#[instrument(skip(state))]
async fn weekly_report(
    State(state): State<AppState>,
    Path(season_id): Path<i32>,
) -> Result<String, (StatusCode, String)> {
    let entries = repo::season_entries(&state.db, season_id)
        .await
        .map_err(internal)?;
    let standings = settlement::compute_standings(&entries);

    let today = OffsetDateTime::now_utc().date();
    let key = report_key(season_id, today);
    let body = render_report(season_id, &standings);

    state
        .reports
        .put_object(&key, Bytes::from(body), "text/plain; charset=utf-8")
        .await
        .map_err(internal)?;

    info!(season_id, %key, players = standings.len(), "weekly report uploaded");
    Ok("Report generated".to_string())
}

fn report_key(season_id: i32, date: time::Date) -> String {
    let stamp = date
        .format(time::macros::format_description!("[year][month][day]"))
        .unwrap_or_default();
    format!("league_{season_id}_weekly_{stamp}.txt")
}

fn render_report(season_id: i32, standings: &[Standing]) -> String {
    let mut out = format!("Weekly league report - season #{season_id}\n\n");
    out.push_str("  # | Player                         | Points\n");
    out.push_str("----|--------------------------------|-------\n");
    for (rank, row) in standings.iter().enumerate() {
        out.push_str(&format!(
            "{:>3} | {:<30} | {:>6}\n",
            rank + 1,
            row.full_name,
            row.total_points
        ));
    }
    if standings.is_empty() {
        out.push_str("(no events recorded yet)\n");
    }
    out
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    fn standing(player_id: i32, name: &str, points: i32) -> Standing {
        Standing {
            player_id,
            full_name: name.to_string(),
            total_points: points,
        }
    }

    #[test]
    fn report_key_embeds_season_and_date() {
        let date = Date::from_calendar_date(2026, Month::August, 28).unwrap();
        assert_eq!(report_key(3, date), "league_3_weekly_20260828.txt");
    }

    #[test]
    fn report_lists_players_in_order() {
        let body = render_report(1, &[standing(1, "Gil", 50), standing(2, "Avi", 23)]);
        let gil = body.find("Gil").unwrap();
        let avi = body.find("Avi").unwrap();
        assert!(gil < avi);
        assert!(body.contains("season #1"));
        assert!(body.contains("50"));
    }

    #[test]
    fn empty_report_says_so() {
        let body = render_report(2, &[]);
        assert!(body.contains("no events recorded yet"));
    }
}
