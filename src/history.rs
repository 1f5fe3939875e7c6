//! Rolling history of readings
//!
//! [`HistoryBuffer`] is the time-series backing store for chart capture: a
//! fixed-capacity, insertion-ordered sequence of [`Reading`]s. Insertion
//! order is the time axis. The buffer is created pre-filled with zero-valued
//! readings spaced one period apart so a display can render a full-width
//! axis before any real data arrives.
//!
//! Timestamps are assigned here, monotonically (`last + period`), never from
//! the wall clock; replaying a recorded stream therefore produces an
//! identical axis.

use crate::types::Reading;
use std::collections::VecDeque;

/// Fixed-capacity FIFO sequence of readings
///
/// The capacity invariant (`len ≤ capacity`) holds after every operation:
/// when an append would exceed it, the oldest entry is evicted *before* the
/// new one is inserted, so the bound is never exceeded even transiently.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    readings: VecDeque<Reading>,
    capacity: usize,
    period_ms: f64,
}

impl HistoryBuffer {
    /// Create a buffer pre-filled with `capacity` zero readings spaced
    /// `period_ms` apart
    ///
    /// `period_ms` must be positive.
    pub fn new(capacity: usize, period_ms: f64) -> Self {
        debug_assert!(period_ms > 0.0);
        let mut buffer = Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
            period_ms,
        };
        buffer.prefill();
        buffer
    }

    fn prefill(&mut self) {
        self.readings.clear();
        for index in 0..self.capacity {
            self.readings
                .push_back(Reading::zero(self.period_ms * index as f64));
        }
    }

    /// Discard the current axis and start a fresh one at a new period
    ///
    /// Used when a new capture stream begins with a different sample period.
    pub fn reset(&mut self, period_ms: f64) {
        debug_assert!(period_ms > 0.0);
        self.period_ms = period_ms;
        self.prefill();
    }

    /// Append a sample, evicting the oldest reading when full
    ///
    /// The timestamp is assigned as `last timestamp + period`. Returns the
    /// reading as stored. Amortized O(1).
    pub fn append(&mut self, current_ma: f64, voltage_v: f64) -> Reading {
        let timestamp_ms = self
            .readings
            .back()
            .map(|r| r.timestamp_ms + self.period_ms)
            .unwrap_or(0.0);
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        let reading = Reading::new(timestamp_ms, current_ma, voltage_v);
        self.readings.push_back(reading);
        reading
    }

    /// Copy out the readings whose axis positions fall in `[min_ms, max_ms)`
    ///
    /// Inverted bounds are swapped, not rejected. Indices are computed as
    /// `floor(t / period)` and clamped to the live length, so an
    /// out-of-range request silently yields a truncated (possibly empty)
    /// slice. The result is an owned copy; callers may mutate it freely
    /// without affecting the buffer.
    pub fn range(&self, min_ms: f64, max_ms: f64) -> Vec<Reading> {
        let (min_ms, max_ms) = if min_ms > max_ms {
            (max_ms, min_ms)
        } else {
            (min_ms, max_ms)
        };
        let min_index = self.index_for(min_ms);
        let max_index = self.index_for(max_ms);
        self.readings
            .iter()
            .skip(min_index)
            .take(max_index.saturating_sub(min_index))
            .copied()
            .collect()
    }

    fn index_for(&self, time_ms: f64) -> usize {
        let index = (time_ms / self.period_ms).floor();
        if index <= 0.0 {
            return 0;
        }
        (index as usize).min(self.readings.len())
    }

    /// Copy out the whole buffer in arrival order
    pub fn series(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }

    /// The time span covered by a full buffer, in milliseconds
    pub fn span_ms(&self) -> f64 {
        self.capacity as f64 * self.period_ms
    }

    /// Number of readings currently held
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the buffer holds no readings
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Maximum number of readings
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sample period in milliseconds
    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// The most recent reading
    pub fn last(&self) -> Option<&Reading> {
        self.readings.back()
    }
}
