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

//! Redraw bookkeeping for the single live overlay.
//!
//! A redraw is split in two halves. [`RedrawController::begin_redraw`] drops
//! the current overlay and hands out a [`RedrawTicket`]; the caller then
//! fetches the boundaries and passes the result to
//! [`RedrawController::complete_redraw`] together with the UI state as it is
//! *at completion time*.
//!
//! Responses are applied in arrival order. With overlapping redraws a slow,
//! older response can therefore replace a newer overlay. Setting
//! `discard_stale_responses` makes the controller drop any response whose
//! ticket is older than one already applied.

use log::{debug, warn};

use crate::geometry::{BoundaryError, FeatureCollection};
use crate::records::CropRecord;
use crate::render::{render, Overlay, RenderState};

/// Identifies one redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RedrawTicket {
    pub epoch: u64,
}

/// What [`RedrawController::complete_redraw`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    /// The response replaced the overlay.
    Applied,
    /// The fetch failed; no overlay is shown.
    Failed,
    /// An already-applied response was newer.
    Discarded,
}

/// Owns the loaded records and the one overlay currently on the map.
#[derive(Debug)]
pub struct RedrawController {
    records: Vec<CropRecord>,
    overlay: Option<Overlay>,
    next_epoch: u64,
    applied_epoch: Option<u64>,
    in_flight: usize,
    pub discard_stale_responses: bool,
}

impl Default for RedrawController {
    fn default() -> Self {
        Self::new()
    }
}

impl RedrawController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            overlay: None,
            next_epoch: 0,
            applied_epoch: None,
            in_flight: 0,
            discard_stale_responses: false,
        }
    }

    /// Replace the loaded records. The overlay is left as is until the next redraw.
    pub fn set_records(&mut self, records: Vec<CropRecord>) {
        debug!("Replacing records with {} new ones", records.len());
        self.records = records;
    }

    #[must_use]
    pub fn records(&self) -> &[CropRecord] {
        &self.records
    }

    #[must_use]
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Redraws begun but not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Remove the current overlay and start a new redraw.
    pub fn begin_redraw(&mut self) -> RedrawTicket {
        self.overlay = None;
        self.in_flight += 1;
        let ticket = RedrawTicket {
            epoch: self.next_epoch,
        };
        self.next_epoch += 1;
        debug!("Begin redraw {}", ticket.epoch);
        ticket
    }

    /// Apply a boundary fetch result, rendering it for `state`.
    ///
    /// `state` is read now rather than when the redraw began, so a response
    /// always reflects the latest selection.
    pub fn complete_redraw(
        &mut self,
        ticket: RedrawTicket,
        boundaries: Result<FeatureCollection, BoundaryError>,
        state: &RenderState,
    ) -> RedrawOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.discard_stale_responses
            && self.applied_epoch.is_some_and(|applied| applied > ticket.epoch)
        {
            debug!("Discarding stale redraw {}", ticket.epoch);
            return RedrawOutcome::Discarded;
        }

        match boundaries {
            Ok(boundaries) => {
                self.overlay = Some(render(&self.records, boundaries, state));
                self.applied_epoch = Some(ticket.epoch);
                RedrawOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to load boundaries for redraw {}: {e}", ticket.epoch);
                RedrawOutcome::Failed
            }
        }
    }
}
