// Crate-wide error taxonomy.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in the racing core. Nothing here is
/// fatal to the process; each variant maps to a caller-facing rejection.
#[derive(Debug, Error)]
pub enum Error {
    /// A car attribute is outside its valid range.
    #[error("invalid attributes: {0}")]
    InvalidAttributes(String),

    /// A car with the same make and model is already registered.
    #[error("car '{make} {model}' already exists")]
    DuplicateName { make: String, model: String },

    /// The car is already on the track.
    #[error("car {0} is already on the track")]
    DuplicateEntry(i64),

    /// The track already holds two cars.
    #[error("track is full, there can only be two cars in a race")]
    TrackFull,

    /// A race was started with fewer than two cars on the track.
    #[error("there must be two cars on the track to start a race")]
    NotEnoughCars,

    /// The external randomness source timed out or returned garbage.
    /// The race is aborted; track and statistics are left unchanged.
    #[error("randomness source unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Lookup or delete on an unknown car ID.
    #[error("car {0} not found")]
    NotFound(i64),

    /// Lookup on an unknown make/model pair.
    #[error("car '{make} {model}' not found")]
    NameNotFound { make: String, model: String },

    /// Unrecognized leaderboard sort key.
    #[error("invalid sort_by parameter: {0}")]
    InvalidSort(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::DuplicateName {
                make: "Mazda".into(),
                model: "Miata".into()
            }
            .to_string(),
            "car 'Mazda Miata' already exists"
        );
        assert_eq!(Error::NotFound(7).to_string(), "car 7 not found");
        assert_eq!(
            Error::TrackFull.to_string(),
            "track is full, there can only be two cars in a race"
        );
    }
}
