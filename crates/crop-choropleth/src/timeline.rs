// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Play/pause stepping through the available years.

use std::time::{Duration, Instant};

/// Default step interval of the year animation.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// The year after `current` in `years`, wrapping to the first.
///
/// A `current` that is not in `years` also restarts at the first year.
#[must_use]
pub fn next_year(years: &[i32], current: i32) -> Option<i32> {
    let first = *years.first()?;
    let next = years
        .iter()
        .position(|&y| y == current)
        .and_then(|i| years.get(i + 1).copied());
    Some(next.unwrap_or(first))
}

/// Year animation state. Time is passed in so stepping is deterministic.
#[derive(Debug, Clone)]
pub struct Timeline {
    playing: bool,
    interval: Duration,
    last_step: Option<Instant>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl Timeline {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            playing: false,
            interval,
            last_step: None,
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn toggle(&mut self, now: Instant) {
        self.playing = !self.playing;
        self.last_step = self.playing.then_some(now);
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.last_step = None;
    }

    /// Advance if an interval has elapsed. Returns the new year, if any.
    pub fn poll(&mut self, now: Instant, years: &[i32], current: i32) -> Option<i32> {
        if !self.playing {
            return None;
        }
        let last = *self.last_step.get_or_insert(now);
        if now.saturating_duration_since(last) < self.interval {
            return None;
        }
        self.last_step = Some(now);
        next_year(years, current)
    }

    /// Time left before the next step, for scheduling a repaint.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        if !self.playing {
            return None;
        }
        let elapsed = self
            .last_step
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        Some(self.interval.saturating_sub(elapsed))
    }
}
