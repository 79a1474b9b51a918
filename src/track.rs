// The track: a fixed-capacity holding area for cars awaiting a race.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::metrics;

/// Maximum number of cars in a race.
pub const TRACK_CAPACITY: usize = 2;

/// Thread-safe slot set of at most two car IDs, in entry order.
///
/// State machine: Empty -> One -> Two, advanced one step per `enter`;
/// only `clear` goes back to Empty.
#[derive(Debug, Clone)]
pub struct Track {
    inner: Arc<Mutex<Vec<i64>>>,
}

impl Track {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::with_capacity(TRACK_CAPACITY))),
        }
    }

    /// Add a car to the track. Returns the occupant count after entry.
    ///
    /// Fails with `DuplicateEntry` if the car is already on the track and
    /// `TrackFull` once two cars are present; either failure leaves the
    /// existing occupants untouched.
    pub fn enter(&self, car_id: i64) -> Result<usize> {
        let mut slots = self.inner.lock().unwrap();
        if slots.contains(&car_id) {
            tracing::warn!(car_id, "car is already on the track");
            return Err(Error::DuplicateEntry(car_id));
        }
        if slots.len() >= TRACK_CAPACITY {
            tracing::warn!(car_id, "track is full");
            return Err(Error::TrackFull);
        }
        slots.push(car_id);
        metrics::TRACK_OCCUPANCY.set(slots.len() as i64);
        tracing::info!(car_id, count = slots.len(), "car entered the track");
        Ok(slots.len())
    }

    /// Empty the track unconditionally. Idempotent.
    pub fn clear(&self) {
        let mut slots = self.inner.lock().unwrap();
        if slots.is_empty() {
            tracing::warn!("clearing an already empty track");
        }
        slots.clear();
        metrics::TRACK_OCCUPANCY.set(0);
    }

    /// Snapshot of the occupants in entry order.
    pub fn occupants(&self) -> Vec<i64> {
        self.inner.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically read both occupants for resolution, in entry order.
    /// Does not clear; the resolver clears only after statistics commit.
    pub fn take_pair(&self) -> Result<(i64, i64)> {
        let slots = self.inner.lock().unwrap();
        if slots.len() < TRACK_CAPACITY {
            tracing::error!(count = slots.len(), "not enough cars to start a race");
            return Err(Error::NotEnoughCars);
        }
        Ok((slots[0], slots[1]))
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}
