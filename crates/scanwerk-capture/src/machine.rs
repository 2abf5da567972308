// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session state machine.
//
// Pure and synchronous: every transition is a method call that returns what
// the driver must do next. The async controller owns one of these and is
// its only caller, so there is no locking here.
//
//   Idle --start--> Detecting --shutter--> Capturing --still--> Correcting
//                      ^   |                  |                    |
//                      |   +--complete--> Finished                 |
//                      |                      |                    v
//                      +--capture failed------+              Reviewing
//                      +------------------review elapsed-----------+
//
// Any non-terminal state --cancel--> Cancelled.

use image::DynamicImage;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::{Quadrilateral, Size};
use scanwerk_core::{CapturedImage, Page, ScanConfig, ScanMode, Session, SessionState};
use scanwerk_document::ImageProcessor;
use scanwerk_document::transform::{default_quad, sensor_to_image, usable_or_default};
use tracing::{debug, info, instrument, warn};

use crate::tracker::TrackedQuad;

/// Identifies one shutter press. Results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(u64);

impl CaptureTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterOutcome {
    /// A still must be captured; report it with this ticket.
    Accepted(CaptureTicket),
    /// Not in `Detecting`; nothing happens.
    Ignored,
}

/// Perspective correction the driver must run off the async threads.
#[derive(Debug, Clone)]
pub struct RectifyJob {
    pub ticket: CaptureTicket,
    /// Orientation-normalised still.
    pub image: DynamicImage,
    /// Crop region in `image` pixel space.
    pub quad: Quadrilateral,
}

/// What the driver must do after a transition.
#[derive(Debug)]
pub enum Step {
    /// Run this correction and report back through `rectified`.
    Rectify(RectifyJob),
    /// A page was appended at this index; start the review timer.
    Review(usize),
    /// The session finished; hand these pages to the host.
    Finished(Vec<Page>),
    /// Back in `Detecting` after a failed capture.
    Resumed,
    /// Stale or out-of-state input; nothing to do.
    Ignored,
}

/// A still on its way through correction.
struct InFlight {
    ticket: CaptureTicket,
    /// The tracked quad frozen at the shutter press.
    tracked: Option<TrackedQuad>,
    /// Built once the still arrives.
    page: Option<Page>,
}

/// One scan or rescan flow.
pub struct ScanSession {
    mode: ScanMode,
    state: SessionState,
    pages: Session,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    collinearity_tolerance: f64,
}

impl ScanSession {
    pub fn new(mode: ScanMode, config: &ScanConfig) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            pages: Session::new(),
            in_flight: None,
            next_ticket: 0,
            collinearity_tolerance: config.detector.collinearity_tolerance,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> &ScanMode {
        &self.mode
    }

    /// Pages captured so far. Empty once the session has terminated.
    pub fn pages(&self) -> &[Page] {
        self.pages.pages()
    }

    /// Idle -> Detecting. Returns `false` if already started.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.transition(SessionState::Detecting);
        true
    }

    /// Freeze the tracked quad and request a still.
    #[instrument(skip_all, fields(state = %self.state, tracked = tracked.is_some()))]
    pub fn press_shutter(&mut self, tracked: Option<TrackedQuad>) -> ShutterOutcome {
        if !self.state.accepts_shutter() {
            debug!("shutter ignored");
            return ShutterOutcome::Ignored;
        }
        self.next_ticket += 1;
        let ticket = CaptureTicket(self.next_ticket);
        self.in_flight = Some(InFlight {
            ticket,
            tracked,
            page: None,
        });
        self.transition(SessionState::Capturing);
        ShutterOutcome::Accepted(ticket)
    }

    /// The still for `ticket` arrived (or failed).
    #[instrument(skip_all, fields(ticket = ticket.0, ok = result.is_ok()))]
    pub fn still_captured(&mut self, ticket: CaptureTicket, result: Result<CapturedImage>) -> Step {
        if self.state != SessionState::Capturing || !self.owns(ticket) {
            debug!(state = %self.state, "stale still discarded");
            return Step::Ignored;
        }
        let Some(mut in_flight) = self.in_flight.take() else {
            return Step::Ignored;
        };

        let captured = match result {
            Ok(captured) => captured,
            Err(err) => {
                warn!(%err, "still capture failed; resuming detection");
                self.transition(SessionState::Detecting);
                return Step::Resumed;
            }
        };

        let image = ImageProcessor::normalize_orientation(captured.image, captured.orientation);
        let image_size = Size::from_pixels(image.width(), image.height());
        let quad = in_flight.tracked.map(|t| self.quad_for_still(&t, image_size));
        let page = Page::new(self.pages.next_index(), image);

        match quad {
            Some(quad) => {
                let job = RectifyJob {
                    ticket,
                    image: page.raw_image.clone(),
                    quad,
                };
                let mut page = page;
                page.quad = Some(quad);
                in_flight.page = Some(page);
                self.in_flight = Some(in_flight);
                self.transition(SessionState::Correcting);
                Step::Rectify(job)
            }
            None => {
                debug!("no tracked quad; keeping the still uncorrected");
                let mut page = page;
                page.result_image = Some(page.raw_image.clone());
                self.finish_page(page)
            }
        }
    }

    /// Correction for `ticket` finished (or failed).
    #[instrument(skip_all, fields(ticket = ticket.0, ok = result.is_ok()))]
    pub fn rectified(&mut self, ticket: CaptureTicket, result: Result<DynamicImage>) -> Step {
        if self.state != SessionState::Correcting || !self.owns(ticket) {
            debug!(state = %self.state, "stale correction discarded");
            return Step::Ignored;
        }
        let Some(mut page) = self.in_flight.take().and_then(|f| f.page) else {
            return Step::Ignored;
        };

        match result {
            Ok(corrected) => page.result_image = Some(corrected),
            Err(err) => {
                warn!(%err, "correction failed; keeping the raw still");
                page.result_image = Some(page.raw_image.clone());
                page.is_edited = false;
            }
        }
        self.finish_page(page)
    }

    /// Reviewing -> Detecting.
    pub fn review_elapsed(&mut self) -> Step {
        if self.state != SessionState::Reviewing {
            return Step::Ignored;
        }
        self.transition(SessionState::Detecting);
        Step::Resumed
    }

    /// Detecting -> Finished, handing over every page by value.
    #[instrument(skip_all, fields(state = %self.state, pages = self.pages.len()))]
    pub fn complete(&mut self) -> Result<Vec<Page>> {
        if self.state != SessionState::Detecting || self.mode.is_rescan() {
            return Err(self.invalid("complete"));
        }
        self.transition(SessionState::Finished);
        let pages = std::mem::take(&mut self.pages).into_pages();
        info!(pages = pages.len(), "scan session completed");
        Ok(pages)
    }

    /// Abort. Pending results are discarded and pages dropped. Returns
    /// `false` if the session had already terminated.
    #[instrument(skip_all, fields(state = %self.state))]
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.in_flight = None;
        self.pages = Session::new();
        self.transition(SessionState::Cancelled);
        info!("scan session cancelled");
        true
    }

    /// Drop the most recent page so it can be shot again.
    pub fn remove_last_page(&mut self) -> Result<Option<Page>> {
        if self.state != SessionState::Detecting {
            return Err(self.invalid("remove_last_page"));
        }
        let removed = self.pages.remove_last()?;
        if let Some(page) = &removed {
            info!(index = page.index, "last page removed for reshoot");
        }
        Ok(removed)
    }

    fn owns(&self, ticket: CaptureTicket) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.ticket == ticket)
    }

    /// Map the frozen sensor quad into the still, falling back to the default
    /// quad if it does not survive the trip.
    fn quad_for_still(&self, tracked: &TrackedQuad, image_size: Size) -> Quadrilateral {
        match sensor_to_image(&tracked.quad, tracked.frame_size, image_size) {
            Ok(quad) => usable_or_default(&quad, image_size, self.collinearity_tolerance),
            Err(err) => {
                warn!(%err, "cannot map tracked quad into the still; using default quad");
                default_quad(image_size)
            }
        }
    }

    fn finish_page(&mut self, mut page: Page) -> Step {
        match &self.mode {
            ScanMode::Scan => {
                let index = self.pages.push(page);
                self.transition(SessionState::Reviewing);
                info!(index, "page captured");
                Step::Review(index)
            }
            ScanMode::Rescan { page: original } => {
                page.index = original.index;
                page.meta = original.meta.clone();
                page.is_edited = original.is_edited;
                self.transition(SessionState::Finished);
                info!(index = page.index, "replacement page captured");
                Step::Finished(vec![page])
            }
        }
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = %self.state, %to, "session transition");
        self.state = to;
    }

    fn invalid(&self, action: &'static str) -> ScanwerkError {
        ScanwerkError::InvalidTransition {
            from: self.state.to_string(),
            action,
        }
    }
}
