use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::{interval_at, sleep, Duration, Instant, Interval};
use tracing::info;

use super::PollCycle;
use crate::config::ScheduleConfig;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Time from `now` until `offset` past the next whole hour.
///
/// Always the next boundary: at 10:05 with an 11 minute offset the poll is
/// at 11:11, not 10:11.
pub fn delay_until_next_poll(now: DateTime<Utc>, offset: Duration) -> Duration {
    let now_ms = now.timestamp_millis();
    let next_hour_ms = (now_ms.div_euclid(HOUR_MS) + 1) * HOUR_MS;
    Duration::from_millis((next_hour_ms - now_ms) as u64) + offset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Poll once at start
    Initial,
    /// Poll once at the next aligned hour
    WaitingForAlignment,
    /// Poll every interval
    SteadyState,
}

/// Drives poll cycles aligned to the upstream hourly publication.
///
/// Cycles are spawned rather than awaited, so a slow cycle can overlap the
/// next one.
pub struct PollScheduler {
    target: Arc<dyn PollCycle>,
    offset: Duration,
    interval: Duration,
    clock: fn() -> DateTime<Utc>,
    phase: SchedulerPhase,
    ticker: Option<Interval>,
}

impl PollScheduler {
    pub fn new(target: Arc<dyn PollCycle>, cfg: &ScheduleConfig) -> Self {
        Self {
            target,
            offset: cfg.offset(),
            interval: cfg.interval(),
            clock: Utc::now,
            phase: SchedulerPhase::Initial,
            ticker: None,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    fn fire(&self) {
        let target = self.target.clone();
        tokio::spawn(async move {
            target.poll_cycle().await;
        });
    }

    /// Wait for the current phase's firing time, fire, and advance.
    pub async fn step(&mut self) {
        match self.phase {
            SchedulerPhase::Initial => {
                info!("initial poll");
                self.fire();
                self.phase = SchedulerPhase::WaitingForAlignment;
            }
            SchedulerPhase::WaitingForAlignment => {
                let delay = delay_until_next_poll((self.clock)(), self.offset);
                info!(delay_secs = delay.as_secs(), "next poll aligned to upstream update");
                sleep(delay).await;
                self.fire();
                self.ticker = Some(interval_at(Instant::now() + self.interval, self.interval));
                self.phase = SchedulerPhase::SteadyState;
            }
            SchedulerPhase::SteadyState => {
                let interval = self.interval;
                let ticker = self
                    .ticker
                    .get_or_insert_with(|| interval_at(Instant::now() + interval, interval));
                ticker.tick().await;
                self.fire();
            }
        }
    }

    pub async fn run(mut self) {
        loop {
            self.step().await;
        }
    }
}
