// End-to-end race flow: registration, track entry, resolution,
// leaderboard, and the statistical behavior of the win probability.

use std::sync::Arc;

use racing_backend::db::{Database, NewCar};
use racing_backend::leaderboard::LeaderboardSort;
use racing_backend::race::{win_probability, RaceEngine};
use racing_backend::random::SeededSource;
use racing_backend::scoring::performance_score;
use racing_backend::{Config, Error};

fn hot_hatch() -> NewCar {
    NewCar {
        make: "Porsche".to_string(),
        model: "911 GT3".to_string(),
        year: 2022,
        horsepower: 502,
        weight: 3164.0,
        zero_to_sixty: 3.2,
        top_speed: 197,
        handling: 10,
    }
}

fn commuter() -> NewCar {
    NewCar {
        make: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 1996,
        horsepower: 105,
        weight: 2535.0,
        zero_to_sixty: 10.4,
        top_speed: 112,
        handling: 4,
    }
}

async fn engine(seed: u64) -> RaceEngine {
    // All tests share the binary; only the first init takes effect.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    RaceEngine::new(db, Arc::new(SeededSource::new(seed)), &Config::default())
}

#[tokio::test]
async fn full_race_flow() {
    let engine = engine(1).await;

    let fast = engine.register_car(hot_hatch()).await.unwrap();
    let slow = engine.register_car(commuter()).await.unwrap();

    // Duplicate registration is rejected
    assert!(matches!(
        engine.register_car(hot_hatch()).await,
        Err(Error::DuplicateName { .. })
    ));

    assert_eq!(engine.enter_race(fast.id).await.unwrap(), 1);
    assert_eq!(engine.enter_race(slow.id).await.unwrap(), 2);

    // Track is full and duplicates are rejected
    assert!(matches!(
        engine.enter_race(fast.id).await,
        Err(Error::DuplicateEntry(_))
    ));
    let third = engine
        .register_car(NewCar {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            ..commuter()
        })
        .await
        .unwrap();
    assert!(matches!(
        engine.enter_race(third.id).await,
        Err(Error::TrackFull)
    ));

    let outcome = engine.run_race().await.unwrap();
    assert!(outcome.winner_id == fast.id || outcome.winner_id == slow.id);
    assert!(outcome.win_probability > 0.0 && outcome.win_probability < 1.0);
    assert!((0.0..1.0).contains(&outcome.roll));
    assert!(engine.track().is_empty());

    // Exactly one win and two participations were recorded
    let fast = engine.get_car(fast.id).await.unwrap();
    let slow = engine.get_car(slow.id).await.unwrap();
    assert_eq!(fast.races + slow.races, 2);
    assert_eq!(fast.wins + slow.wins, 1);
    assert!(fast.wins <= fast.races && slow.wins <= slow.races);

    // Leaderboard reflects the new totals; unraced third car excluded
    let board = engine.leaderboard(LeaderboardSort::Wins).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].id, outcome.winner_id);
    assert_eq!(board[0].wins, 1);
    assert_eq!(board[0].win_pct, 100.0);
}

#[tokio::test]
async fn empirical_win_rate_matches_probability() {
    let engine = engine(42).await;

    let fast = engine.register_car(hot_hatch()).await.unwrap();
    let slow = engine.register_car(commuter()).await.unwrap();

    let predicted = win_probability(performance_score(&fast), performance_score(&slow));
    assert!(predicted > 0.5, "test premise: the fast car is the favorite");

    const RACES: i64 = 10_000;
    for _ in 0..RACES {
        engine.enter_race(fast.id).await.unwrap();
        engine.enter_race(slow.id).await.unwrap();
        engine.run_race().await.unwrap();
    }

    let fast = engine.get_car(fast.id).await.unwrap();
    let slow = engine.get_car(slow.id).await.unwrap();
    assert_eq!(fast.races, RACES);
    assert_eq!(slow.races, RACES);
    assert_eq!(fast.wins + slow.wins, RACES);

    let empirical = fast.wins as f64 / RACES as f64;
    assert!(empirical > 0.5);
    // Binomial stddev at n=10k is under 0.005; 0.02 is four sigmas.
    assert!(
        (empirical - predicted).abs() < 0.02,
        "empirical {empirical} vs predicted {predicted}"
    );
}

#[tokio::test]
async fn deleting_a_car_purges_its_cache_entry() {
    let engine = engine(3).await;
    let car = engine.register_car(hot_hatch()).await.unwrap();

    // Warm the cache via a lookup, then delete
    engine.get_car(car.id).await.unwrap();
    engine.delete_car(car.id).await.unwrap();

    // Never a stale record
    assert!(matches!(
        engine.get_car(car.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        engine.delete_car(car.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn outcome_serializes_for_the_http_layer() {
    let engine = engine(9).await;
    let fast = engine.register_car(hot_hatch()).await.unwrap();
    let slow = engine.register_car(commuter()).await.unwrap();
    engine.enter_race(fast.id).await.unwrap();
    engine.enter_race(slow.id).await.unwrap();

    let outcome = engine.run_race().await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json.get("winner_id").is_some());
    assert!(json.get("win_probability").is_some());
    assert!(json.get("roll").is_some());

    let board = engine.leaderboard(LeaderboardSort::WinPct).await.unwrap();
    let json = serde_json::to_value(&board).unwrap();
    assert!(json.as_array().unwrap().len() == 2);
}
