// Race resolution: scores, win probability, and the statistics update.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::db::{Car, Database, NewCar};
use crate::error::Result;
use crate::leaderboard::{self, LeaderboardEntry, LeaderboardSort};
use crate::metrics;
use crate::random::RandomSource;
use crate::scoring::performance_score;
use crate::track::Track;

/// Divisor applied to the score gap before the logistic mapping, so a
/// realistic gap of a couple hundred points maps to a strong but not
/// certain favorite.
pub const SCORE_SCALE: f64 = 100.0;

/// Win probability for the first entrant given both performance scores.
///
/// Logistic in the signed score difference: equal scores give 0.5, a
/// larger gap pushes the probability smoothly toward 1 (or 0) without
/// ever reaching it, so the weaker car always keeps a chance.
pub fn win_probability(score_a: f64, score_b: f64) -> f64 {
    1.0 / (1.0 + ((score_b - score_a) / SCORE_SCALE).exp())
}

/// Outcome of a resolved race. The probability and the drawn number are
/// both carried so a result can be re-checked independently of the draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub winner_id: i64,
    pub loser_id: i64,
    /// "Make Model" of the winner.
    pub winner: String,
    /// Performance score of the first entrant.
    pub score_a: f64,
    /// Performance score of the second entrant.
    pub score_b: f64,
    /// Win probability of the first entrant.
    pub win_probability: f64,
    /// The random draw compared against the probability.
    pub roll: f64,
}

/// The race engine: track, car cache, store handle, and randomness
/// source for one deployment instance. Constructed explicitly and
/// shared by cloning the `Arc` it usually lives in; there is no
/// process-wide singleton.
pub struct RaceEngine {
    db: Arc<Database>,
    random: Arc<dyn RandomSource>,
    track: Track,
    cache: TtlCache<Car>,
    // Serializes resolutions so two concurrent run_race calls cannot
    // interleave between reading the pair and clearing the track.
    resolve_lock: Mutex<()>,
}

impl RaceEngine {
    pub fn new(db: Arc<Database>, random: Arc<dyn RandomSource>, config: &Config) -> Self {
        tracing::info!(ttl_secs = config.cache_ttl.as_secs(), "race engine ready");
        Self {
            db,
            random,
            track: Track::new(),
            cache: TtlCache::new(config.cache_ttl),
            resolve_lock: Mutex::new(()),
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn cache(&self) -> &TtlCache<Car> {
        &self.cache
    }

    /// Register a new car.
    pub async fn register_car(&self, new: NewCar) -> Result<Car> {
        self.db.create_car(new).await
    }

    /// Delete a car and purge any cached record of it, so a later lookup
    /// misses and surfaces `NotFound` instead of a stale snapshot.
    pub async fn delete_car(&self, car_id: i64) -> Result<()> {
        self.db.delete_car(car_id).await?;
        self.cache.invalidate(car_id);
        Ok(())
    }

    /// Cached car lookup, falling back to the store on miss or expiry.
    pub async fn get_car(&self, car_id: i64) -> Result<Car> {
        self.cache
            .get_or_load(car_id, || self.db.get_car(car_id))
            .await
    }

    /// Put a car on the track. The car must exist; its record is warmed
    /// into the cache on the way in.
    pub async fn enter_race(&self, car_id: i64) -> Result<usize> {
        let car = self.get_car(car_id).await?;
        let count = self.track.enter(car_id)?;
        tracing::info!(
            car_id,
            make = %car.make,
            model = %car.model,
            count,
            "car ready to race"
        );
        Ok(count)
    }

    /// Resolve the race between the two cars on the track.
    ///
    /// Any failure before the statistics commit leaves the track and all
    /// statistics exactly as they were; every aborted attempt counts
    /// toward the failed-races metric.
    pub async fn run_race(&self) -> Result<RaceOutcome> {
        let _guard = self.resolve_lock.lock().await;
        match self.resolve().await {
            Ok(outcome) => {
                metrics::RACES_RUN_TOTAL.inc();
                Ok(outcome)
            }
            Err(e) => {
                metrics::RACES_FAILED_TOTAL.inc();
                Err(e)
            }
        }
    }

    async fn resolve(&self) -> Result<RaceOutcome> {
        let (id_a, id_b) = self.track.take_pair()?;
        let car_a = self.get_car(id_a).await?;
        let car_b = self.get_car(id_b).await?;

        let label_a = format!("{} {}", car_a.make, car_a.model);
        let label_b = format!("{} {}", car_b.make, car_b.model);
        tracing::info!(car_a = %label_a, car_b = %label_b, "race started");

        let score_a = performance_score(&car_a);
        let score_b = performance_score(&car_b);
        let probability = win_probability(score_a, score_b);
        tracing::debug!(score_a, score_b, probability, "scores computed");

        let roll = match self.random.next_float().await {
            Ok(r) => r,
            Err(e) => {
                metrics::RANDOM_FAILURES_TOTAL.inc();
                return Err(e);
            }
        };

        let (winner, loser, winner_label) = if roll < probability {
            (&car_a, &car_b, label_a)
        } else {
            (&car_b, &car_a, label_b)
        };

        self.db.record_race_result(winner.id, loser.id).await?;
        self.cache.invalidate(id_a);
        self.cache.invalidate(id_b);
        self.track.clear();

        tracing::info!(
            winner_id = winner.id,
            winner = %winner_label,
            roll,
            probability,
            "race resolved"
        );

        Ok(RaceOutcome {
            winner_id: winner.id,
            loser_id: loser.id,
            winner: winner_label,
            score_a,
            score_b,
            win_probability: probability,
            roll,
        })
    }

    /// Leaderboard projection over the store.
    pub async fn leaderboard(&self, sort: LeaderboardSort) -> Result<Vec<LeaderboardEntry>> {
        leaderboard::leaderboard(&self.db, sort).await
    }
}
