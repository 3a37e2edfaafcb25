//! Shared test doubles for clock- and sleep-driven code.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::Sleeper;

/// Fixed instant used as "now" across unit tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("valid fixture time"),
    }
}

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Returns immediately, recording each requested delay and optionally
/// moving a [`MutableClock`] forward by it.
#[derive(Default)]
pub struct RecordingSleeper {
    clock: Option<Arc<MutableClock>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn advancing(clock: Arc<MutableClock>) -> Self {
        Self {
            clock: Some(clock),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.lock_sleeps().clone()
    }

    fn lock_sleeps(&self) -> MutexGuard<'_, Vec<Duration>> {
        match self.sleeps.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.lock_sleeps().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
        tokio::task::yield_now().await;
    }
}
