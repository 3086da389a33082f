use std::future::Future;
use std::time::Duration;

use eyre::{Result, eyre};
use log::{debug, warn};
use rand::Rng;

/// Delay between a failed attempt and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    Uniform { min: Duration, max: Duration },
}

impl Backoff {
    pub fn delay(&self) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Uniform { min, max } => {
                let lo = min.min(max).as_millis() as u64;
                let hi = min.max(max).as_millis() as u64;
                Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
            }
        }
    }
}

/// Bounded retry: `pacing` before every attempt, `backoff` between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pacing: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Transcript providers: 3 attempts, 1-3s randomized backoff
    pub fn transcript() -> Self {
        Self {
            max_attempts: 3,
            pacing: Duration::ZERO,
            backoff: Backoff::Uniform {
                min: Duration::from_secs(1),
                max: Duration::from_secs(3),
            },
        }
    }

    /// Generation API: 3 attempts, 2s rate-limit pacing, 5s after an error
    pub fn generation() -> Self {
        Self {
            max_attempts: 3,
            pacing: Duration::from_secs(2),
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }

    /// No sleeping at all
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            pacing: Duration::ZERO,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `operation` until it succeeds or the attempt bound is reached.
    /// Returns the last error on exhaustion.
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts();
        let mut last_err = None;
        for attempt in 1..=attempts {
            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            debug!("{label}: attempt {attempt}/{attempts}");
            match operation().await {
                Ok(val) => return Ok(val),
                Err(e) => {
                    warn!("{label}: attempt {attempt}/{attempts} failed: {e}");
                    if attempt < attempts {
                        let delay = self.backoff.delay();
                        if !delay.is_zero() {
                            debug!("{label}: retrying in {delay:?}");
                            tokio::time::sleep(delay).await;
                        }
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| eyre!("{label}: no attempts made")))
    }
}
