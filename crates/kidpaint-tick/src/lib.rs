//! Restartable round timer for KidPaint studios.
//!
//! A Draw & Guess round counts down once per second. Every new round
//! restarts the countdown, and the game ending stops it. The scheduler
//! never spawns anything: the owning actor polls
//! [`TickScheduler::wait_for_tick`] from its `tokio::select!` loop, so a
//! tick is just another event in the same serialized stream as client
//! messages.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = timer.wait_for_tick() => { /* count down */ }
//!     }
//! }
//! ```
//!
//! Restarting replaces the deadline in place, so there is never more
//! than one live tick stream.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Default: one second.
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

impl TickConfig {
    /// Config for an arbitrary period. Zero is bumped to one millisecond
    /// so the timer can't spin.
    pub fn every(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Ticks since the last [`TickScheduler::start`], starting at 1.
    pub tick: u64,
    /// `true` if this tick fired more than one full period late.
    pub overrun: bool,
    /// Whole periods skipped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// A stoppable, restartable periodic timer.
///
/// Created stopped. [`start`](Self::start) arms it one period from now,
/// [`stop`](Self::stop) disarms it.
pub struct TickScheduler {
    period: Duration,
    /// When the next tick should fire. `None` while stopped.
    next_tick: Option<Instant>,
    tick_count: u64,
}

impl TickScheduler {
    /// Create a stopped scheduler from config.
    pub fn new(config: TickConfig) -> Self {
        let period = TickConfig::every(config.period).period;
        debug!(period_ms = period.as_millis() as u64, "tick scheduler created");
        Self {
            period,
            next_tick: None,
            tick_count: 0,
        }
    }

    /// (Re)arm the timer: the first tick fires one period from now and the
    /// tick count resets. Any pending deadline is discarded.
    pub fn start(&mut self) {
        let was_running = self.is_running();
        self.next_tick = Some(Instant::now() + self.period);
        self.tick_count = 0;
        debug!(restarted = was_running, "tick scheduler started");
    }

    /// Disarm the timer. `wait_for_tick` pends until the next `start`.
    ///
    /// Safe to call multiple times.
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(ticks = self.tick_count, "tick scheduler stopped");
        }
    }

    /// Wait until the next tick is due.
    ///
    /// While stopped this future pends forever, which lets
    /// `tokio::select!` keep servicing its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped =
            (late_by.as_nanos() / self.period.as_nanos()) as u64;
        let overrun = ticks_skipped > 0;
        if overrun {
            warn!(
                tick = self.tick_count + 1,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
            self.next_tick = Some(now + self.period);
        } else {
            // Keep the original cadence so small delays don't accumulate.
            self.next_tick = Some(next + self.period);
        }

        self.tick_count += 1;
        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Whether the timer is armed.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Ticks fired since the last start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }
}
