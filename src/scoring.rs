// Performance scoring and car classification.
//
// Pure functions of car attributes: no I/O, no randomness. The same
// inputs always produce the same score and class.

use serde::{Deserialize, Serialize};

use crate::db::{Car, NewCar};
use crate::error::{Error, Result};

/// Power-to-weight thresholds (hp per 1000 lb) separating the classes.
/// Intervals are half-open upward: a ratio exactly at a threshold takes
/// the higher class, so [0,100) is Economy, [100,200) Sport, and so on.
pub const SPORT_THRESHOLD: f64 = 100.0;
pub const SUPER_THRESHOLD: f64 = 200.0;
pub const HYPER_THRESHOLD: f64 = 300.0;

/// Earliest model year accepted at registration.
pub const MIN_YEAR: i64 = 1950;
/// Latest model year accepted at registration.
pub const MAX_YEAR: i64 = 2025;

/// Car class derived from the power-to-weight ratio at creation time.
/// Never recomputed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CarClass {
    Economy,
    Sport,
    Super,
    Hyper,
}

impl CarClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarClass::Economy => "Economy",
            CarClass::Sport => "Sport",
            CarClass::Super => "Super",
            CarClass::Hyper => "Hyper",
        }
    }
}

impl std::fmt::Display for CarClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power-to-weight ratio in horsepower per 1000 pounds.
pub fn power_to_weight(horsepower: i64, weight: f64) -> f64 {
    horsepower as f64 / weight * 1000.0
}

/// Assign a class from horsepower and weight.
pub fn classify(horsepower: i64, weight: f64) -> Result<CarClass> {
    if horsepower <= 0 {
        return Err(Error::InvalidAttributes(format!(
            "horsepower must be greater than 0, got {horsepower}"
        )));
    }
    if !(weight > 0.0) {
        return Err(Error::InvalidAttributes(format!(
            "weight must be greater than 0, got {weight}"
        )));
    }

    let ratio = power_to_weight(horsepower, weight);
    let class = if ratio < SPORT_THRESHOLD {
        CarClass::Economy
    } else if ratio < SUPER_THRESHOLD {
        CarClass::Sport
    } else if ratio < HYPER_THRESHOLD {
        CarClass::Super
    } else {
        CarClass::Hyper
    };
    Ok(class)
}

/// Performance score for a car.
///
/// Every attribute contributes monotonically in the direction that
/// intuitively makes a car faster: more power per pound, a shorter 0-60
/// time, a higher top speed, better handling, and a newer model year
/// all raise the score.
pub fn performance_score(car: &Car) -> f64 {
    let ptw = power_to_weight(car.horsepower, car.weight);
    let acceleration_factor = 10.0 / car.zero_to_sixty;
    let year_factor = (car.year - MIN_YEAR) as f64 / 70.0;

    ptw * 0.4
        + acceleration_factor * 20.0
        + (car.top_speed as f64 / 200.0) * 20.0
        + (car.handling as f64 / 10.0) * 15.0
        + year_factor * 5.0
}

/// Validate registration attributes. Ranges live next to the formula
/// they feed so the two cannot drift apart.
pub fn validate_attributes(new: &NewCar) -> Result<()> {
    if new.make.trim().is_empty() || new.model.trim().is_empty() {
        return Err(Error::InvalidAttributes(
            "make and model must not be empty".to_string(),
        ));
    }
    if new.year < MIN_YEAR || new.year > MAX_YEAR {
        return Err(Error::InvalidAttributes(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
            new.year
        )));
    }
    if new.horsepower <= 0 {
        return Err(Error::InvalidAttributes(format!(
            "horsepower must be greater than 0, got {}",
            new.horsepower
        )));
    }
    if !(new.weight > 0.0) {
        return Err(Error::InvalidAttributes(format!(
            "weight must be greater than 0, got {}",
            new.weight
        )));
    }
    if !(new.zero_to_sixty > 0.0) {
        return Err(Error::InvalidAttributes(format!(
            "0-60 time must be greater than 0, got {}",
            new.zero_to_sixty
        )));
    }
    if new.top_speed <= 0 {
        return Err(Error::InvalidAttributes(format!(
            "top speed must be greater than 0, got {}",
            new.top_speed
        )));
    }
    if new.handling < 1 || new.handling > 10 {
        return Err(Error::InvalidAttributes(format!(
            "handling must be between 1 and 10, got {}",
            new.handling
        )));
    }
    Ok(())
}
