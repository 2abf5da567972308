// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live frame pipeline: detect -> track -> map to display -> render, run
// synchronously on the camera's frame thread.
//
// Back-pressure policy: if a frame arrives while the previous one is still
// being processed it is dropped, never queued. While a capture is in flight
// the pipeline is frozen and frames are skipped so the overlay stays put.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use scanwerk_bridge::{FrameSource, OverlayRenderer};
use scanwerk_core::error::Result;
use scanwerk_core::geometry::{Quadrilateral, Size};
use scanwerk_core::{Frame, FrameOrientation, TrackerConfig};
use scanwerk_document::{DisplayMapping, QuadDetector};
use tracing::{debug, instrument, trace, warn};

use crate::tracker::{CornerTracker, TrackedQuad, TrackerUpdate};

/// What happened to an offered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Processed; carries the overlay quad sent to the renderer.
    Processed(Option<Quadrilateral>),
    /// A previous frame was still being processed.
    Dropped,
    /// Capture in flight; the frame was ignored.
    Frozen,
}

/// Mutable per-tick state, held only while a frame is processed.
struct TickState {
    tracker: CornerTracker,
    display_size: Size,
    /// Cached mapping plus the sensor size and mounting it was built for.
    mapping: Option<(Size, FrameOrientation, DisplayMapping)>,
}

impl TickState {
    fn mapping_for(&mut self, frame_size: Size, orientation: FrameOrientation) -> Option<DisplayMapping> {
        if let Some((size, orient, mapping)) = self.mapping {
            if size == frame_size && orient == orientation {
                return Some(mapping);
            }
        }
        match DisplayMapping::for_orientation(frame_size, self.display_size, orientation) {
            Ok(mapping) => {
                self.mapping = Some((frame_size, orientation, mapping));
                Some(mapping)
            }
            Err(err) => {
                warn!(%err, "cannot map frame to display");
                self.mapping = None;
                None
            }
        }
    }
}

/// Drives detection for the live preview.
pub struct FramePipeline {
    detector: QuadDetector,
    renderer: Arc<dyn OverlayRenderer>,
    tick: Mutex<TickState>,
    /// Last tracked quad, readable by the session without waiting on a tick.
    latest: Mutex<Option<TrackedQuad>>,
    stable: AtomicBool,
    frozen: AtomicBool,
    processed: AtomicU64,
    dropped: AtomicU64,
}

impl FramePipeline {
    pub fn new(
        detector: QuadDetector,
        tracker: TrackerConfig,
        display_size: Size,
        renderer: Arc<dyn OverlayRenderer>,
    ) -> Self {
        Self {
            detector,
            renderer,
            tick: Mutex::new(TickState {
                tracker: CornerTracker::new(tracker),
                display_size,
                mapping: None,
            }),
            latest: Mutex::new(None),
            stable: AtomicBool::new(false),
            frozen: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Process one frame, or drop it if the pipeline is busy or frozen.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn offer_frame(&self, frame: Frame) -> FrameOutcome {
        if self.is_frozen() {
            return FrameOutcome::Frozen;
        }

        let mut tick = match self.tick.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("frame dropped; previous frame still in flight");
                return FrameOutcome::Dropped;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let detection = self.detector.detect(&frame);
        // The shutter may have frozen the overlay while this frame was in
        // detection; its result must not land.
        if self.is_frozen() {
            trace!("frozen mid-tick; detection discarded");
            return FrameOutcome::Frozen;
        }
        let update = tick.tracker.update(&detection);
        let tracked = update.quad().copied();

        let overlay = tracked.and_then(|t| {
            tick.mapping_for(t.frame_size, frame.orientation)
                .map(|mapping| mapping.sensor_to_display(&t.quad))
        });
        if matches!(update, TrackerUpdate::Lost) {
            debug!("overlay cleared");
        }

        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = tracked;
        self.stable.store(tick.tracker.is_stable(), Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
        drop(tick);

        if self.is_frozen() {
            return FrameOutcome::Frozen;
        }
        self.renderer.on_quad_update(overlay);
        FrameOutcome::Processed(overlay)
    }

    /// Pull frames from `source` until it ends, returning how many were
    /// processed.
    pub fn run(&self, source: &dyn FrameSource) -> Result<u64> {
        let mut processed = 0u64;
        while let Some(frame) = source.next_frame()? {
            if matches!(self.offer_frame(frame), FrameOutcome::Processed(_)) {
                processed += 1;
            }
        }
        debug!(processed, "frame source ended");
        Ok(processed)
    }

    /// The quad currently tracked, in sensor space.
    pub fn tracked(&self) -> Option<TrackedQuad> {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the tracked quad has been steady long enough to capture.
    pub fn is_stable(&self) -> bool {
        self.stable.load(Ordering::Relaxed)
    }

    pub fn set_frozen(&self, frozen: bool) {
        let was = self.frozen.swap(frozen, Ordering::AcqRel);
        if was != frozen {
            debug!(frozen, "frame pipeline freeze toggled");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// The preview was resized, e.g. after a device rotation.
    pub fn set_display_size(&self, display_size: Size) {
        let mut tick = self.tick.lock().unwrap_or_else(PoisonError::into_inner);
        tick.display_size = display_size;
        tick.mapping = None;
    }

    /// Forget the tracked quad.
    pub fn reset(&self) {
        let mut tick = self.tick.lock().unwrap_or_else(PoisonError::into_inner);
        tick.tracker.reset();
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.stable.store(false, Ordering::Relaxed);
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;
    use scanwerk_core::geometry::{Point, Rect};
    use scanwerk_core::{DetectorConfig, ScanwerkError};
    use scanwerk_document::{Candidate, RectangleFinder};
    use std::sync::mpsc;

    struct Always(Option<Vec<Point>>);

    impl RectangleFinder for Always {
        fn find_candidates(&self, _frame: &Frame) -> Vec<Candidate> {
            self.0.iter().map(|c| Candidate::new(c.clone(), 1.0)).collect()
        }
    }

    /// Finder that parks inside detection until told to continue.
    struct Parked {
        entered: Mutex<mpsc::Sender<()>>,
        resume: Mutex<mpsc::Receiver<()>>,
    }

    impl RectangleFinder for Parked {
        fn find_candidates(&self, _frame: &Frame) -> Vec<Candidate> {
            let _ = self.entered.lock().expect("lock").send(());
            let _ = self.resume.lock().expect("lock").recv();
            Vec::new()
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Option<Quadrilateral>>>);

    impl OverlayRenderer for Recorder {
        fn on_quad_update(&self, quad: Option<Quadrilateral>) {
            self.0.lock().expect("lock").push(quad);
        }
    }

    fn rect_corners() -> Vec<Point> {
        Quadrilateral::from_rect(&Rect::new(Point::new(80.0, 60.0), Size::new(480.0, 360.0)))
            .corners()
            .to_vec()
    }

    fn frame() -> Frame {
        Frame::new(GrayImage::new(640, 480), FrameOrientation::LandscapeSensor)
    }

    fn pipeline(finder: Box<dyn RectangleFinder>, renderer: Arc<Recorder>) -> FramePipeline {
        FramePipeline::new(
            QuadDetector::new(finder, DetectorConfig::default()),
            TrackerConfig::default(),
            Size::new(390.0, 844.0),
            renderer,
        )
    }

    #[test]
    fn renders_once_per_processed_frame() {
        let renderer = Arc::new(Recorder::default());
        let p = pipeline(Box::new(Always(Some(rect_corners()))), Arc::clone(&renderer));
        for _ in 0..3 {
            assert!(matches!(p.offer_frame(frame()), FrameOutcome::Processed(Some(_))));
        }
        let calls = renderer.0.lock().expect("lock");
        assert_eq!(calls.len(), 3);
        let overlay = calls[0].expect("overlay");
        assert!(overlay.top_left.x < overlay.top_right.x);
        assert!(p.tracked().is_some());
    }

    #[test]
    fn frozen_pipeline_skips_frames() {
        let renderer = Arc::new(Recorder::default());
        let p = pipeline(Box::new(Always(None)), Arc::clone(&renderer));
        p.set_frozen(true);
        assert_eq!(p.offer_frame(frame()), FrameOutcome::Frozen);
        assert!(renderer.0.lock().expect("lock").is_empty());
        p.set_frozen(false);
        assert_eq!(p.offer_frame(frame()), FrameOutcome::Processed(None));
    }

    /// A frame offered while another is mid-detection is dropped, not queued.
    #[test]
    fn busy_pipeline_drops_frames() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let renderer = Arc::new(Recorder::default());
        let p = Arc::new(pipeline(
            Box::new(Parked {
                entered: Mutex::new(entered_tx),
                resume: Mutex::new(resume_rx),
            }),
            Arc::clone(&renderer),
        ));

        let worker = {
            let p = Arc::clone(&p);
            std::thread::spawn(move || p.offer_frame(frame()))
        };
        entered_rx.recv().expect("first frame entered detection");
        assert_eq!(p.offer_frame(frame()), FrameOutcome::Dropped);
        resume_tx.send(()).expect("resume");

        assert_eq!(worker.join().expect("worker"), FrameOutcome::Processed(None));
        assert_eq!(p.processed_frames(), 1);
        assert_eq!(p.dropped_frames(), 1);
        assert_eq!(renderer.0.lock().expect("lock").len(), 1);
    }

    /// Freezing while a frame is mid-detection keeps its result off the
    /// overlay and out of the tracked quad.
    #[test]
    fn freeze_during_detection_discards_the_tick() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let renderer = Arc::new(Recorder::default());
        let p = Arc::new(pipeline(
            Box::new(Parked {
                entered: Mutex::new(entered_tx),
                resume: Mutex::new(resume_rx),
            }),
            Arc::clone(&renderer),
        ));

        let worker = {
            let p = Arc::clone(&p);
            std::thread::spawn(move || p.offer_frame(frame()))
        };
        entered_rx.recv().expect("frame entered detection");
        p.set_frozen(true);
        resume_tx.send(()).expect("resume");

        assert_eq!(worker.join().expect("worker"), FrameOutcome::Frozen);
        assert!(renderer.0.lock().expect("lock").is_empty());
        assert_eq!(p.processed_frames(), 0);
        assert!(p.tracked().is_none());
    }

    struct Scripted(Mutex<Vec<Frame>>);

    impl FrameSource for Scripted {
        fn next_frame(&self) -> Result<Option<Frame>> {
            Ok(self.0.lock().expect("lock").pop())
        }
    }

    struct Broken;

    impl FrameSource for Broken {
        fn next_frame(&self) -> Result<Option<Frame>> {
            Err(ScanwerkError::Capture("camera unplugged".into()))
        }
    }

    #[test]
    fn run_drains_source() {
        let renderer = Arc::new(Recorder::default());
        let p = pipeline(Box::new(Always(Some(rect_corners()))), Arc::clone(&renderer));
        let source = Scripted(Mutex::new(vec![frame(), frame(), frame(), frame(), frame(), frame()]));
        assert_eq!(p.run(&source).expect("run"), 6);
        assert!(p.is_stable());
        assert!(p.run(&Broken).is_err());
    }

    #[test]
    fn display_resize_rebuilds_mapping() {
        let renderer = Arc::new(Recorder::default());
        let p = pipeline(Box::new(Always(Some(rect_corners()))), Arc::clone(&renderer));
        let FrameOutcome::Processed(Some(portrait)) = p.offer_frame(frame()) else {
            panic!("expected overlay");
        };
        p.set_display_size(Size::new(844.0, 390.0));
        let FrameOutcome::Processed(Some(landscape)) = p.offer_frame(frame()) else {
            panic!("expected overlay");
        };
        assert_ne!(portrait, landscape);
        p.reset();
        assert!(p.tracked().is_none());
    }
}
