// Leaderboard: a read-only projection over the car store.

use serde::{Deserialize, Serialize};

use crate::db::{Car, Database};
use crate::error::{Error, Result};

/// Supported sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    Wins,
    WinPct,
}

impl LeaderboardSort {
    /// Parse the `sort_by` query value.
    pub fn from_str_name(s: &str) -> Result<Self> {
        match s {
            "wins" => Ok(Self::Wins),
            "win_pct" => Ok(Self::WinPct),
            other => Err(Error::InvalidSort(other.to_string())),
        }
    }
}

/// One leaderboard row: the car plus its derived win percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub horsepower: i64,
    pub weight: f64,
    pub zero_to_sixty: f64,
    pub top_speed: i64,
    pub handling: i64,
    pub car_class: String,
    pub races: i64,
    pub wins: i64,
    /// Win percentage rounded to one decimal; 0.0 for an unraced car.
    pub win_pct: f64,
}

impl From<Car> for LeaderboardEntry {
    fn from(car: Car) -> Self {
        let win_pct = if car.races > 0 {
            (car.wins as f64 / car.races as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        LeaderboardEntry {
            id: car.id,
            make: car.make,
            model: car.model,
            year: car.year,
            horsepower: car.horsepower,
            weight: car.weight,
            zero_to_sixty: car.zero_to_sixty,
            top_speed: car.top_speed,
            handling: car.handling,
            car_class: car.car_class,
            races: car.races,
            wins: car.wins,
            win_pct,
        }
    }
}

/// Cars with at least one race, sorted by the requested key descending;
/// ties break by id ascending (registration order).
pub async fn leaderboard(db: &Database, sort: LeaderboardSort) -> Result<Vec<LeaderboardEntry>> {
    tracing::info!(?sort, "retrieving leaderboard");
    let mut entries: Vec<LeaderboardEntry> = db
        .leaderboard_rows()
        .await?
        .into_iter()
        .map(LeaderboardEntry::from)
        .collect();

    match sort {
        LeaderboardSort::Wins => {
            entries.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.id.cmp(&b.id)));
        }
        LeaderboardSort::WinPct => {
            entries.sort_by(|a, b| {
                b.win_pct
                    .partial_cmp(&a.win_pct)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
        }
    }
    Ok(entries)
}
