// THEORY:
// The `smoother` module gives the laser tracker a short memory. Raw detections jitter
// by a pixel or two from frame to frame and drop out entirely for a frame when the dot
// crosses a dark patch or the exposure flickers. The reported position should do
// neither.
//
// Key architectural principles:
// 1.  **Bounded History**: the last N detection cycles live in a FIFO window. Every
//     cycle appends exactly one entry, a mapped position or a "no detection" marker,
//     and the oldest entry falls out once the window is full.
// 2.  **Dropout Tolerance**: the estimate is the mean of the valid entries only, so a
//     single missed frame does not blank the output; it takes N consecutive misses.
// 3.  **Two States**: `Tracking` while any valid entry remains, `Lost` otherwise.
//     There is no extra hysteresis beyond the window length.

use crate::core_modules::blob::Point;
use crate::config::DEFAULT_SMOOTHING_WINDOW;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// At least one recent cycle saw the dot.
    Tracking,
    /// No valid detection left in the window.
    Lost,
}

/// Fixed-capacity history of mapped detections.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: VecDeque<Option<Point>>,
    capacity: usize,
}

impl TemporalSmoother {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records one detection cycle.
    pub fn observe(&mut self, position: Option<Point>) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(position);
    }

    /// Integer-truncated mean of the valid entries in the window.
    pub fn current_estimate(&self) -> Option<Point> {
        let (count, sum_x, sum_y) = self
            .window
            .iter()
            .flatten()
            .fold((0i64, 0i64, 0i64), |(n, sx, sy), p| (n + 1, sx + p.x as i64, sy + p.y as i64));
        if count == 0 {
            return None;
        }
        Some(Point::new((sum_x / count) as i32, (sum_y / count) as i32))
    }

    pub fn state(&self) -> TrackingState {
        if self.window.iter().any(Option::is_some) {
            TrackingState::Tracking
        } else {
            TrackingState::Lost
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}
