use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::errors::{GatorError, GatorResult};
use crate::feed::FetchContext;
use crate::services::ingest_service::IngestCycle;

/// Fixed-rate timer that can be interrupted through a shutdown channel.
///
/// A tick that is already overdue fires at once and the schedule restarts
/// from that moment; missed ticks are dropped rather than queued.
pub struct Ticker {
    interval: Duration,
    next: Instant,
    shutdown: Receiver<()>,
}

impl Ticker {
    pub fn new(interval: Duration, shutdown: Receiver<()>) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
            shutdown,
        }
    }

    /// Block until the next tick. Returns `false` once shutdown has been
    /// requested or every shutdown sender is gone.
    pub fn wait(&mut self) -> bool {
        let remaining = self.next.saturating_duration_since(Instant::now());

        match self.shutdown.recv_timeout(remaining) {
            Err(RecvTimeoutError::Timeout) => {
                self.advance();
                true
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn advance(&mut self) {
        let now = Instant::now();
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
    }
}

pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> GatorResult<Self> {
        if interval.is_zero() {
            return Err(GatorError::InvalidInput(
                "Interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle now and one per tick after that, until `shutdown`
    /// fires. Cycle failures are logged and never stop the loop. Returns
    /// the number of cycles run.
    pub fn run<C: IngestCycle>(
        &self,
        pipeline: &C,
        ctx: &FetchContext,
        shutdown: Receiver<()>,
    ) -> usize {
        let mut ticker = Ticker::new(self.interval, shutdown);
        let mut cycles = 0;

        loop {
            Self::tick(pipeline, ctx);
            cycles += 1;

            if !ticker.wait() {
                tracing::info!(cycles, "Scheduler stopped");
                return cycles;
            }
        }
    }

    /// Run until the process is terminated.
    pub fn run_forever<C: IngestCycle>(&self, pipeline: &C, ctx: &FetchContext) {
        let (_keep_alive, shutdown) = mpsc::channel();
        self.run(pipeline, ctx, shutdown);
    }

    fn tick<C: IngestCycle>(pipeline: &C, ctx: &FetchContext) {
        match pipeline.run_cycle(ctx) {
            Ok(_) => {}
            Err(GatorError::NoFeeds) => {
                tracing::info!("No feeds to fetch yet");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Feed cycle failed");
            }
        }
    }
}
