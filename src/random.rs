// Randomness sources: the external random.org service and a local
// seeded PRNG for tests and explicitly configured local deployments.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::{Error, Result};

/// A supplier of uniformly distributed floats in [0, 1).
///
/// The race resolver draws exactly one value per race through this
/// trait; which implementation sits behind it is a deployment decision,
/// never a branch inside the resolver.
#[async_trait]
pub trait RandomSource: Send + Sync {
    async fn next_float(&self) -> Result<f64>;
}

/// Network-backed source using random.org's plain-text decimal-fraction
/// endpoint. Timeouts, transport failures, and malformed bodies all
/// surface as `RandomnessUnavailable`; there is no silent fallback.
pub struct RandomOrgSource {
    client: reqwest::Client,
    url: String,
}

impl RandomOrgSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RandomSource for RandomOrgSource {
    async fn next_float(&self) -> Result<f64> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::RandomnessUnavailable("request to random.org timed out".to_string())
            } else {
                Error::RandomnessUnavailable(format!("request to random.org failed: {e}"))
            }
        })?;

        let body = response
            .error_for_status()
            .map_err(|e| Error::RandomnessUnavailable(format!("random.org returned {e}")))?
            .text()
            .await
            .map_err(|e| Error::RandomnessUnavailable(format!("failed to read body: {e}")))?;

        let text = body.trim();
        let value: f64 = text.parse().map_err(|_| {
            Error::RandomnessUnavailable(format!("invalid response from random.org: {text}"))
        })?;

        if !(0.0..1.0).contains(&value) {
            return Err(Error::RandomnessUnavailable(format!(
                "value out of range [0,1): {value}"
            )));
        }

        tracing::debug!(value, "random number from random.org");
        Ok(value)
    }
}

/// Deterministic local source. Used by tests and, behind the explicit
/// `LOCAL_RANDOM` configuration flag, by offline deployments.
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

#[async_trait]
impl RandomSource for SeededSource {
    async fn next_float(&self) -> Result<f64> {
        let value = self.rng.lock().unwrap().gen::<f64>();
        Ok(value)
    }
}

/// Build the configured randomness source.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn RandomSource>> {
    if config.local_random {
        tracing::warn!("using local PRNG instead of random.org (LOCAL_RANDOM is set)");
        Ok(Arc::new(SeededSource::from_entropy()))
    } else {
        Ok(Arc::new(RandomOrgSource::new(
            &config.random_org_url,
            config.random_timeout,
        )?))
    }
}
