use sqlx::PgPool;

use crate::league::repo_types::PlayerRow;
use crate::settlement::SeasonEntry;

/// One row per event attendance in the season, feeding the points model.
pub async fn season_entries(db: &PgPool, season_id: i32) -> anyhow::Result<Vec<SeasonEntry>> {
    let rows = sqlx::query_as::<_, SeasonEntry>(
        r#"
        SELECT ep.player_id, pl.full_name, ep.finish_place
        FROM event_players ep
        JOIN events e ON e.event_id = ep.event_id
        JOIN players pl ON pl.player_id = ep.player_id
        WHERE e.season_id = $1
        "#,
    )
    .bind(season_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn active_players(db: &PgPool) -> anyhow::Result<Vec<PlayerRow>> {
    let rows = sqlx::query_as::<_, PlayerRow>(
        r#"
        SELECT player_id, full_name, nickname, phone, language_preference,
               user_type, is_active
        FROM players
        WHERE is_active
        ORDER BY full_name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
