//! Core of a competitive racing-simulation backend.
//!
//! Cars are registered with physical attributes, two of them enter the
//! track, and a simulated race picks a winner from the performance-score
//! gap plus a draw from an external randomness source. Outcomes update
//! persistent win/race statistics and feed a leaderboard. The HTTP
//! layer, user accounts, and front end live elsewhere and consume this
//! crate through [`race::RaceEngine`].

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod metrics;
pub mod race;
pub mod random;
pub mod scoring;
pub mod track;

pub use config::Config;
pub use error::{Error, Result};
pub use race::{RaceEngine, RaceOutcome};
