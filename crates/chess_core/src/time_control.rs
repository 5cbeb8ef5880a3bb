//! Search limits and time management.
//!
//! Engines poll a shared `TimeControl` at well-defined points: between
//! iterative-deepening iterations, at node entry, and between root moves.
//! The stop flag is also the front-end's cancellation handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Margin kept in reserve when allocating from a game clock.
const SAFETY_MARGIN: Duration = Duration::from_millis(100);
/// Assumed number of moves left in the game when dividing the clock.
const EXPECTED_MOVES_LEFT: u32 = 25;
const MIN_MOVE_TIME: Duration = Duration::from_millis(5);

/// Limits that control when a search must stop.
///
/// Depth, wall clock and node count all bound the search independently; the
/// first one reached wins. Time overrides depth: when the budget is gone the
/// engine returns the best move of the last completed iteration.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum search depth in plies.
    pub depth: u8,
    /// Wall-clock budget for this move (None = unbounded).
    pub move_time: Option<Duration>,
    /// Node budget (None = unbounded).
    pub node_cap: Option<u64>,
    /// Keep searching until stopped explicitly.
    pub infinite: bool,
    /// Shared controller checked at polling points.
    pub time_control: TimeControl,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            move_time: None,
            node_cap: None,
            infinite: false,
            time_control: TimeControl::new(None),
        }
    }

    pub fn depth_and_time(depth: u8, move_time: Duration) -> Self {
        Self {
            depth,
            move_time: Some(move_time),
            node_cap: None,
            infinite: false,
            time_control: TimeControl::new(Some(move_time)),
        }
    }

    pub fn time(move_time: Duration) -> Self {
        Self::depth_and_time(u8::MAX, move_time)
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::depth(u8::MAX)
        }
    }

    pub fn with_node_cap(mut self, cap: u64) -> Self {
        self.node_cap = Some(cap);
        self
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.time_control.is_stopped()
    }

    #[inline]
    pub fn node_cap_reached(&self, nodes: u64) -> bool {
        self.node_cap.is_some_and(|cap| nodes >= cap)
    }

    /// Start the clock. Call once when the search begins.
    pub fn start(&self) {
        self.time_control.start();
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::depth(4)
    }
}

/// Budget for one move out of a running game clock: an even share of the
/// remaining time, minus a safety margin, plus the increment.
pub fn allocate_move_time(remaining: Duration, increment: Duration) -> Duration {
    let share = remaining.saturating_sub(SAFETY_MARGIN) / EXPECTED_MOVES_LEFT;
    (share + increment).max(MIN_MOVE_TIME)
}

/// Thread-safe stop controller, cheaply cloneable.
///
/// `is_stopped()` is a relaxed atomic load and can be called at every node;
/// the actual clock read happens every `check_interval` nodes.
#[derive(Debug, Clone)]
pub struct TimeControl {
    stopped: Arc<AtomicBool>,
    start_time: Arc<std::sync::RwLock<Option<Instant>>>,
    time_limit: Option<Duration>,
    check_interval: u64,
}

impl TimeControl {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            start_time: Arc::new(std::sync::RwLock::new(None)),
            time_limit,
            check_interval: 1024,
        }
    }

    pub fn start(&self) {
        if let Ok(mut start) = self.start_time.write() {
            *start = Some(Instant::now());
        }
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Read the clock and raise the stop flag if the budget is exhausted.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }

        if let Some(limit) = self.time_limit
            && let Ok(start) = self.start_time.read()
            && let Some(start) = *start
            && start.elapsed() >= limit
        {
            self.stop();
            return true;
        }

        false
    }

    /// True every `check_interval` nodes.
    #[inline]
    pub fn should_check_time(&self, nodes: u64) -> bool {
        nodes.is_multiple_of(self.check_interval)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .read()
            .ok()
            .and_then(|s| *s)
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn remaining(&self) -> Option<Duration> {
        let limit = self.time_limit?;
        Some(limit.saturating_sub(self.elapsed()))
    }

    /// The wall-clock budget this controller enforces, if any.
    pub fn budget(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
