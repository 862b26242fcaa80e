use std::sync::{Arc, Once, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::scene::FrameStats;

static POISON_WARNING: Once = Once::new();

fn recover_poisoned<G>(operation: &'static str, poisoned: PoisonError<G>) -> G {
    POISON_WARNING.call_once(|| {
        warn!(operation, "loop metrics lock poisoned; using last published value");
    });
    poisoned.into_inner()
}

/// Averages over one logging interval of what the scene did per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    /// Longest single frame in the interval.
    pub worst_frame_ms: f32,
    pub drawn_per_frame: f32,
    pub culled_per_frame: f32,
    pub skipped_per_frame: f32,
    /// Scene events plus timer callbacks.
    pub events_per_frame: f32,
}

/// Shared read side of the loop metrics; clones observe the same snapshot.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(|poisoned| recover_poisoned("read", poisoned))
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self
            .latest
            .write()
            .unwrap_or_else(|poisoned| recover_poisoned("write", poisoned)) = snapshot;
    }
}

/// Running totals for the current interval.
#[derive(Debug, Default)]
struct FrameWindow {
    frames: u32,
    frame_time: Duration,
    worst_frame: Duration,
    totals: FrameStats,
}

impl FrameWindow {
    fn push(&mut self, frame_dt: Duration, stats: &FrameStats) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time = self.frame_time.saturating_add(frame_dt);
        self.worst_frame = self.worst_frame.max(frame_dt);
        let totals = &mut self.totals;
        totals.drawn = totals.drawn.saturating_add(stats.drawn);
        totals.culled = totals.culled.saturating_add(stats.culled);
        totals.skipped = totals.skipped.saturating_add(stats.skipped);
        totals.events_run = totals.events_run.saturating_add(stats.events_run);
        totals.timers_fired = totals.timers_fired.saturating_add(stats.timers_fired);
    }

    fn per_frame(&self, total: usize) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            total as f32 / self.frames as f32
        }
    }

    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            self.frame_time.as_secs_f32() * 1000.0 / self.frames as f32
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            drawn_per_frame: self.per_frame(self.totals.drawn),
            culled_per_frame: self.per_frame(self.totals.culled),
            skipped_per_frame: self.per_frame(self.totals.skipped),
            events_per_frame: self.per_frame(self.totals.events_run + self.totals.timers_fired),
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    window_start: Instant,
    window: FrameWindow,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            window: FrameWindow::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, stats: &FrameStats) {
        self.window.push(frame_dt, stats);
    }

    /// Closes the interval once it has run its length and starts a fresh one at `now`.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let snapshot = self.window.summarize(elapsed);
        self.window = FrameWindow::default();
        self.window_start = now;
        Some(snapshot)
    }
}
