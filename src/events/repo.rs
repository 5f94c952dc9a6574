use rust_decimal::Decimal;
use sqlx::PgPool;
use time::Date;

use crate::events::dto::{AttendanceEntry, CreateEventRequest, ResultEntry};
use crate::events::repo_types::{EventPlayerRow, EventRow, InviteRow};
use crate::settlement;

/// Creates an event idempotently on (season, date) and seeds invites for
/// every active player that does not already hold one. Re-running fills
/// invite gaps for newly activated players without duplicating rows.
pub async fn create_event(
    db: &PgPool,
    req: &CreateEventRequest,
    event_date: Date,
) -> anyhow::Result<i32> {
    let mut tx = db.begin().await?;

    let inserted: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO events
            (season_id, event_date, host_player_id, tournament_type_id,
             buy_in_amount, rebuy_limit, league_keeper_player_id, notes)
        VALUES
            ($1, $2, $3, $4,
             COALESCE($5, (SELECT default_buy_in FROM tournament_types
                           WHERE tournament_type_id = $4), 0),
             $6, $7, $8)
        ON CONFLICT (season_id, event_date) DO NOTHING
        RETURNING event_id
        "#,
    )
    .bind(req.season_id)
    .bind(event_date)
    .bind(req.host_player_id)
    .bind(req.tournament_type_id)
    .bind(req.buy_in_amount)
    .bind(req.rebuy_limit)
    .bind(req.league_keeper_player_id)
    .bind(req.notes.as_deref())
    .fetch_optional(&mut *tx)
    .await?;

    let event_id = match inserted {
        Some(id) => id,
        None => {
            sqlx::query_scalar("SELECT event_id FROM events WHERE season_id = $1 AND event_date = $2")
                .bind(req.season_id)
                .bind(event_date)
                .fetch_one(&mut *tx)
                .await?
        }
    };

    sqlx::query(
        r#"
        INSERT INTO event_invites (event_id, player_id)
        SELECT $1, p.player_id FROM players p WHERE p.is_active
        ON CONFLICT (event_id, player_id) DO NOTHING
        "#,
    )
    .bind(event_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(event_id)
}

pub async fn get_event(
    db: &PgPool,
    event_id: i32,
) -> anyhow::Result<Option<(EventRow, Vec<EventPlayerRow>, Vec<InviteRow>)>> {
    let Some(event) = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT e.event_id, e.season_id, e.event_date, e.host_player_id,
               e.tournament_type_id, e.buy_in_amount, e.rebuy_limit,
               e.league_keeper_player_id, e.notes,
               t.name AS tournament_type_name,
               h.full_name AS host_name,
               k.full_name AS keeper_name
        FROM events e
        LEFT JOIN tournament_types t ON t.tournament_type_id = e.tournament_type_id
        LEFT JOIN players h ON h.player_id = e.host_player_id
        LEFT JOIN players k ON k.player_id = e.league_keeper_player_id
        WHERE e.event_id = $1
        "#,
    )
    .bind(event_id)
    .fetch_optional(db)
    .await?
    else {
        return Ok(None);
    };

    let players = sqlx::query_as::<_, EventPlayerRow>(
        r#"
        SELECT ep.event_player_id, ep.player_id, pl.full_name,
               ep.buy_ins, ep.rebuys, ep.finish_place, ep.prize_won
        FROM event_players ep
        JOIN players pl ON pl.player_id = ep.player_id
        WHERE ep.event_id = $1
        ORDER BY pl.full_name
        "#,
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;

    let invites = sqlx::query_as::<_, InviteRow>(
        r#"
        SELECT i.invite_id, i.player_id, pl.full_name, r.response, r.responded_at
        FROM event_invites i
        JOIN players pl ON pl.player_id = i.player_id
        LEFT JOIN LATERAL (
            SELECT response, responded_at
            FROM event_responses
            WHERE invite_id = i.invite_id
            ORDER BY responded_at DESC
            LIMIT 1
        ) r ON TRUE
        WHERE i.event_id = $1
        ORDER BY pl.full_name
        "#,
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;

    Ok(Some((event, players, invites)))
}

/// Appends a response to the invite's history. Returns 0 when the player
/// was never invited to this event; the response log is append-only and
/// the latest row by timestamp wins on the read side.
pub async fn rsvp(
    db: &PgPool,
    event_id: i32,
    player_id: i32,
    response: &str,
) -> anyhow::Result<u64> {
    let invite_id: Option<i32> = sqlx::query_scalar(
        "SELECT invite_id FROM event_invites WHERE event_id = $1 AND player_id = $2",
    )
    .bind(event_id)
    .bind(player_id)
    .fetch_optional(db)
    .await?;

    let Some(invite_id) = invite_id else {
        return Ok(0);
    };

    let result = sqlx::query(
        "INSERT INTO event_responses (invite_id, response, source) VALUES ($1, $2, 'Web')",
    )
    .bind(invite_id)
    .bind(response)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Batch upsert of buy-ins/rebuys inside one transaction; a failure on any
/// entry rolls back the whole batch.
pub async fn upsert_attendance(
    db: &PgPool,
    event_id: i32,
    entries: &[AttendanceEntry],
) -> anyhow::Result<u64> {
    let mut tx = db.begin().await?;
    let mut total = 0;
    for entry in entries {
        let result = sqlx::query(
            r#"
            INSERT INTO event_players (event_id, player_id, buy_ins, rebuys)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, player_id)
            DO UPDATE SET buy_ins = EXCLUDED.buy_ins, rebuys = EXCLUDED.rebuys
            "#,
        )
        .bind(event_id)
        .bind(entry.player_id)
        .bind(entry.buy_ins)
        .bind(entry.rebuys)
        .execute(&mut *tx)
        .await?;
        total += result.rows_affected();
    }
    tx.commit().await?;
    Ok(total)
}

/// Writes finish places, pays the top three from the distributable pool
/// and books the league cut into the ledger, all in one transaction.
pub async fn save_results(
    db: &PgPool,
    event_id: i32,
    results: &[ResultEntry],
) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;

    for result in results {
        sqlx::query(
            "UPDATE event_players SET finish_place = $1 WHERE event_id = $2 AND player_id = $3",
        )
        .bind(result.finish_place)
        .bind(event_id)
        .bind(result.player_id)
        .execute(&mut *tx)
        .await?;
    }

    let pool: Decimal = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(ep.buy_ins + ep.rebuys), 0)::NUMERIC * e.buy_in_amount
        FROM events e
        LEFT JOIN event_players ep ON ep.event_id = e.event_id
        WHERE e.event_id = $1
        GROUP BY e.buy_in_amount
        "#,
    )
    .bind(event_id)
    .fetch_one(&mut *tx)
    .await?;

    let split = settlement::split_pool(pool);

    // Prizes are rewritten for every player so a re-run clears stale amounts
    // for anyone who fell out of the top three.
    let placements: Vec<(i32, Option<i32>)> = sqlx::query_as(
        "SELECT player_id, finish_place FROM event_players WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_all(&mut *tx)
    .await?;

    for (player_id, place) in placements {
        sqlx::query(
            "UPDATE event_players SET prize_won = $1 WHERE event_id = $2 AND player_id = $3",
        )
        .bind(settlement::prize_for_place(&split, place))
        .bind(event_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO league_ledger (event_id, amount_in, amount_out, keeper_player_id, note)
        VALUES ($1, $2, 0,
                (SELECT league_keeper_player_id FROM events WHERE event_id = $1),
                '10% from prize pool')
        "#,
    )
    .bind(event_id)
    .bind(split.league_cut)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
