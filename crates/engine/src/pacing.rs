//! Wait policy for a run
//!
//! Every sleep in the engine goes through a `Pacer`, so the randomised
//! delays live in one place and tests can run with no delay at all.

use miwallet_core::{Error, Result};
use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    /// Before claiming the new-user award
    BonusAward,
    /// Simulated page view before completing a browse task
    TaskDwell,
    /// Between browse steps, and after each round
    StepJitter,
    /// After a successful exchange
    ExchangeCooldown,
    BetweenAccounts,
    CountdownTick,
}

impl Pause {
    /// Inclusive (min, max)
    pub fn bounds(self) -> (Duration, Duration) {
        let secs = Duration::from_secs;
        match self {
            Pause::BonusAward => (secs(5), secs(5)),
            Pause::TaskDwell => (secs(10), secs(15)),
            Pause::StepJitter => (secs(2), secs(5)),
            Pause::ExchangeCooldown => (secs(2), secs(2)),
            Pause::BetweenAccounts => (secs(5), secs(5)),
            Pause::CountdownTick => (secs(1), secs(1)),
        }
    }
}

pub trait Pacer: Send + Sync {
    fn delay_for(&self, pause: Pause) -> Duration;
}

/// Uniformly random delay within each pause's bounds
#[derive(Debug, Default, Clone, Copy)]
pub struct JitterPacer;

impl Pacer for JitterPacer {
    fn delay_for(&self, pause: Pause) -> Duration {
        let (min, max) = pause.bounds();
        if min >= max {
            return min;
        }
        let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// No delay; remembers which pauses were requested
#[derive(Debug, Default)]
pub struct InstantPacer {
    requested: Mutex<Vec<Pause>>,
}

impl InstantPacer {
    pub fn requested(&self) -> Vec<Pause> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Pacer for InstantPacer {
    fn delay_for(&self, pause: Pause) -> Duration {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(pause);
        }
        Duration::ZERO
    }
}

/// Sleep for `pause`, returning `Cancelled` as soon as the token fires
pub async fn wait(pacer: &dyn Pacer, pause: Pause, cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let delay = pacer.delay_for(pause);
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
