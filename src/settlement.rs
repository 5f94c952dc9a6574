use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

/// Every player who shows up earns this, placed or not.
pub const ATTENDANCE_POINTS: i32 = 5;

/// Fraction of the pool kept by the league (10%).
fn league_share() -> Decimal {
    Decimal::new(1, 1)
}

/// Prize shares for places 1..=3, as fractions of the distributable pool.
fn prize_shares() -> [Decimal; 3] {
    [Decimal::new(5, 1), Decimal::new(3, 1), Decimal::new(2, 1)]
}

/// How an event's collected pool is divided between the league and the
/// top three finishers. Amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSplit {
    pub pool: Decimal,
    pub league_cut: Decimal,
    pub distributable: Decimal,
    /// Prize amounts for finish places 1, 2 and 3.
    pub prizes: [Decimal; 3],
}

pub fn split_pool(pool: Decimal) -> PoolSplit {
    let league_cut = (pool * league_share()).round_dp(2);
    let distributable = pool - league_cut;
    let prizes = prize_shares().map(|share| (distributable * share).round_dp(2));
    PoolSplit {
        pool,
        league_cut,
        distributable,
        prizes,
    }
}

/// Prize owed for a finish place, or `None` for everyone outside the top
/// three. Settlement writes this for every player, so a re-run that demotes
/// a former winner clears their prize instead of leaving it behind.
pub fn prize_for_place(split: &PoolSplit, finish_place: Option<i32>) -> Option<Decimal> {
    match finish_place {
        Some(place @ 1..=3) => Some(split.prizes[(place - 1) as usize]),
        _ => None,
    }
}

/// Placement bonus for a recorded finish. Places outside 1..=10 still earn
/// a single point for finishing; an unrecorded finish earns nothing.
pub fn placement_points(finish_place: Option<i32>) -> i32 {
    match finish_place {
        Some(1) => 25,
        Some(2) => 18,
        Some(3) => 15,
        Some(4) => 12,
        Some(5) => 10,
        Some(6) => 8,
        Some(7) => 6,
        Some(8) => 4,
        Some(9) => 3,
        Some(10) => 2,
        Some(_) => 1,
        None => 0,
    }
}

/// One event-player row of a season, as fetched for standings.
#[derive(Debug, Clone, FromRow)]
pub struct SeasonEntry {
    pub player_id: i32,
    pub full_name: String,
    pub finish_place: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: i32,
    pub full_name: String,
    pub total_points: i32,
}

/// Aggregates season entries into the league table: attendance bonus per
/// event plus placement bonus, ordered by points descending with ties
/// broken by player name.
pub fn compute_standings(entries: &[SeasonEntry]) -> Vec<Standing> {
    let mut totals: HashMap<i32, (String, i32)> = HashMap::new();
    for entry in entries {
        let slot = totals
            .entry(entry.player_id)
            .or_insert_with(|| (entry.full_name.clone(), 0));
        slot.1 += ATTENDANCE_POINTS + placement_points(entry.finish_place);
    }

    let mut standings: Vec<Standing> = totals
        .into_iter()
        .map(|(player_id, (full_name, total_points))| Standing {
            player_id,
            full_name,
            total_points,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    standings
}

#[cfg(test)]
mod split_tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn league_takes_ten_percent() {
        let split = split_pool(dec("1000"));
        assert_eq!(split.league_cut, dec("100.00"));
        assert_eq!(split.distributable, dec("900.00"));
    }

    #[test]
    fn prizes_are_fifty_thirty_twenty() {
        let split = split_pool(dec("1000"));
        assert_eq!(split.prizes[0], dec("450.00"));
        assert_eq!(split.prizes[1], dec("270.00"));
        assert_eq!(split.prizes[2], dec("180.00"));
    }

    #[test]
    fn prizes_never_exceed_distributable() {
        for pool in ["0", "1", "37.50", "999.99", "12345.67"] {
            let split = split_pool(dec(pool));
            let paid: Decimal = split.prizes.iter().copied().sum();
            assert!(paid <= split.distributable + dec("0.02"), "pool {pool}");
        }
    }

    #[test]
    fn money_is_conserved_within_a_cent() {
        let split = split_pool(dec("777.77"));
        let paid: Decimal = split.prizes.iter().copied().sum();
        let diff = (split.pool - split.league_cut - paid).abs();
        assert!(diff <= dec("0.02"), "diff {diff}");
    }

    #[test]
    fn zero_pool_pays_nothing() {
        let split = split_pool(Decimal::ZERO);
        assert_eq!(split.league_cut, Decimal::ZERO);
        assert!(split.prizes.iter().all(|p| p.is_zero()));
    }

    #[test]
    fn top_three_get_their_shares() {
        let split = split_pool(dec("1000"));
        assert_eq!(prize_for_place(&split, Some(1)), Some(dec("450.00")));
        assert_eq!(prize_for_place(&split, Some(2)), Some(dec("270.00")));
        assert_eq!(prize_for_place(&split, Some(3)), Some(dec("180.00")));
    }

    #[test]
    fn places_outside_top_three_earn_no_prize() {
        let split = split_pool(dec("1000"));
        assert_eq!(prize_for_place(&split, Some(4)), None);
        assert_eq!(prize_for_place(&split, Some(11)), None);
        assert_eq!(prize_for_place(&split, None), None);
    }

    #[test]
    fn demoted_winner_loses_the_prize() {
        let split = split_pool(dec("1000"));
        // Finished 3rd in a first pass, then corrected to 4th.
        assert!(prize_for_place(&split, Some(3)).is_some());
        assert_eq!(prize_for_place(&split, Some(4)), None);
    }
}

#[cfg(test)]
mod points_tests {
    use super::*;

    #[test]
    fn placement_table_is_exact() {
        let expected = [25, 18, 15, 12, 10, 8, 6, 4, 3, 2];
        for (place, points) in expected.iter().enumerate() {
            assert_eq!(placement_points(Some(place as i32 + 1)), *points);
        }
    }

    #[test]
    fn deep_finishes_earn_one_point() {
        assert_eq!(placement_points(Some(11)), 1);
        assert_eq!(placement_points(Some(42)), 1);
    }

    #[test]
    fn unplaced_earns_nothing() {
        assert_eq!(placement_points(None), 0);
    }

    fn entry(player_id: i32, name: &str, place: Option<i32>) -> SeasonEntry {
        SeasonEntry {
            player_id,
            full_name: name.to_string(),
            finish_place: place,
        }
    }

    #[test]
    fn season_of_first_fifth_and_unplaced_totals_fifty() {
        let entries = vec![
            entry(7, "Dana", Some(1)),
            entry(7, "Dana", Some(5)),
            entry(7, "Dana", None),
        ];
        let standings = compute_standings(&entries);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].total_points, 50);
    }

    #[test]
    fn standings_order_by_points_then_name() {
        let entries = vec![
            entry(1, "Ben", Some(2)),
            entry(2, "Avi", Some(2)),
            entry(3, "Gil", Some(1)),
        ];
        let standings = compute_standings(&entries);
        assert_eq!(standings[0].full_name, "Gil");
        // Ben and Avi both have 23 points; Avi sorts first.
        assert_eq!(standings[1].full_name, "Avi");
        assert_eq!(standings[2].full_name, "Ben");
    }

    #[test]
    fn recomputing_same_entries_is_stable() {
        let entries = vec![
            entry(1, "Ben", Some(3)),
            entry(2, "Avi", None),
            entry(1, "Ben", Some(9)),
        ];
        assert_eq!(compute_standings(&entries), compute_standings(&entries));
    }

    #[test]
    fn empty_season_has_empty_standings() {
        assert!(compute_standings(&[]).is_empty());
    }
}
