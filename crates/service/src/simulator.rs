//! Latency and failure injection in front of every API operation.
//!
//! The simulator runs before any query or mutation logic, so an injected
//! failure never leaves partial state behind. Its random source is injectable
//! to let tests pin both branches.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::NetworkConfig;

/// Status/message pairs a simulated failure is drawn from, uniformly.
pub const TRANSPORT_FAILURES: [(u16, &str); 4] = [
    (500, "Internal Server Error"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (429, "Too Many Requests"),
];

/// Jitter applied to the configured latency, as a fraction either way.
const JITTER: f64 = 0.2;

/// An artificial transport failure. Transient by construction; callers may
/// retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("simulated transport failure {status}: {message}")]
pub struct SimulatedTransportError {
    pub status: u16,
    pub message: String,
}

pub struct NetworkSimulator {
    latency: Duration,
    fail_rate: f64,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl std::fmt::Debug for NetworkSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSimulator")
            .field("latency", &self.latency)
            .field("fail_rate", &self.fail_rate)
            .finish_non_exhaustive()
    }
}

impl NetworkSimulator {
    /// Simulator seeded from OS entropy.
    pub fn new(config: &NetworkConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Simulator drawing from `rng`. `fail_rate` is clamped into `0.0..=1.0`.
    pub fn with_rng(config: &NetworkConfig, rng: impl RngCore + Send + 'static) -> Self {
        let fail_rate = if config.fail_rate.is_nan() {
            0.0
        } else {
            config.fail_rate.clamp(0.0, 1.0)
        };
        NetworkSimulator {
            latency: Duration::from_millis(config.latency_ms),
            fail_rate,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// No latency and no failures.
    pub fn disabled() -> Self {
        Self::with_rng(&NetworkConfig::default(), StdRng::seed_from_u64(0))
    }

    /// Decide the outcome of one call without waiting: either the delay to
    /// apply or the failure to raise.
    pub fn roll(&self) -> Result<Duration, SimulatedTransportError> {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.fail_rate > 0.0 && rng.gen_bool(self.fail_rate) {
            let (status, message) = TRANSPORT_FAILURES[rng.gen_range(0..TRANSPORT_FAILURES.len())];
            return Err(SimulatedTransportError {
                status,
                message: message.to_string(),
            });
        }
        if self.latency.is_zero() {
            return Ok(Duration::ZERO);
        }
        let factor = rng.gen_range((1.0 - JITTER)..=(1.0 + JITTER));
        let secs = self.latency.as_secs_f64() * factor;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    /// Roll, then either fail immediately or sleep for the jittered latency.
    /// This is the only suspension point of an API call.
    pub async fn simulate(&self) -> Result<(), SimulatedTransportError> {
        match self.roll() {
            Ok(delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(status = err.status, message = %err.message, "simulated transport failure");
                Err(err)
            }
        }
    }
}

impl Default for NetworkSimulator {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(latency_ms: u64, fail_rate: f64) -> NetworkConfig {
        NetworkConfig {
            latency_ms,
            fail_rate,
        }
    }

    #[test]
    fn disabled_never_fails_or_waits() {
        let sim = NetworkSimulator::disabled();
        for _ in 0..100 {
            assert_eq!(sim.roll(), Ok(Duration::ZERO));
        }
    }

    #[test]
    fn certain_failure_uses_the_fixed_set() {
        let sim = NetworkSimulator::with_rng(&network(0, 1.0), StdRng::seed_from_u64(5));
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let err = sim.roll().unwrap_err();
            assert!(TRANSPORT_FAILURES
                .iter()
                .any(|(s, m)| *s == err.status && *m == err.message));
            seen.insert(err.status);
        }
        assert_eq!(seen.len(), TRANSPORT_FAILURES.len(), "all codes drawn");
    }

    #[test]
    fn latency_stays_within_jitter_band() {
        let sim = NetworkSimulator::with_rng(&network(1_000, 0.0), StdRng::seed_from_u64(9));
        for _ in 0..500 {
            let delay = sim.roll().unwrap();
            assert!(delay >= Duration::from_millis(800), "{delay:?}");
            assert!(delay <= Duration::from_millis(1_200), "{delay:?}");
        }
    }

    #[test]
    fn extreme_latency_does_not_overflow() {
        let sim = NetworkSimulator::with_rng(&network(u64::MAX, 0.0), StdRng::seed_from_u64(4));
        for _ in 0..50 {
            let delay = sim.roll().unwrap();
            assert!(delay >= Duration::from_millis(u64::MAX).mul_f64(0.79), "{delay:?}");
        }
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        let sim = NetworkSimulator::with_rng(&network(0, 7.0), StdRng::seed_from_u64(1));
        assert!(sim.roll().is_err());
        let sim = NetworkSimulator::with_rng(&network(0, -1.0), StdRng::seed_from_u64(1));
        assert!(sim.roll().is_ok());
    }

    #[test]
    fn same_seed_same_outcomes() {
        let a = NetworkSimulator::with_rng(&network(250, 0.3), StdRng::seed_from_u64(77));
        let b = NetworkSimulator::with_rng(&network(250, 0.3), StdRng::seed_from_u64(77));
        for _ in 0..50 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_sleeps_for_the_rolled_delay() {
        let sim = NetworkSimulator::with_rng(&network(500, 0.0), StdRng::seed_from_u64(3));
        let start = tokio::time::Instant::now();
        sim.simulate().await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(400), "{waited:?}");
        assert!(waited <= Duration::from_millis(601), "{waited:?}");
    }
}
