// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame-to-frame corner tracking.
//
// Raw detections jitter by a few pixels every frame and drop out for a frame
// or two whenever the camera moves. The tracker blends small movements,
// adopts large ones, and keeps showing the last quad for a grace period of
// missed frames before clearing the overlay.

use scanwerk_core::geometry::{Quadrilateral, Size};
use scanwerk_core::{DetectionResult, TrackerConfig};
use tracing::{debug, trace};

/// The stabilised quad shown as the live overlay, in sensor space.
///
/// Replaced on every update, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedQuad {
    pub quad: Quadrilateral,
    /// Size of the frames the quad was tracked against.
    pub frame_size: Size,
    /// Consecutive frames with a detection consistent with this quad.
    pub hits: u32,
}

/// What the tracker decided for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    /// A detection arrived; show this quad.
    Tracking(TrackedQuad),
    /// No detection, but still within the grace period; keep showing this.
    Held(TrackedQuad),
    /// The grace period just ran out; clear the overlay. Emitted once per
    /// loss.
    Lost,
    /// Nothing tracked and nothing detected.
    Empty,
}

impl TrackerUpdate {
    /// The quad to display, if any.
    pub fn quad(&self) -> Option<&TrackedQuad> {
        match self {
            Self::Tracking(t) | Self::Held(t) => Some(t),
            Self::Lost | Self::Empty => None,
        }
    }
}

/// Smooths detections across consecutive frames.
#[derive(Debug, Clone)]
pub struct CornerTracker {
    config: TrackerConfig,
    current: Option<TrackedQuad>,
    /// Consecutive frames without a detection.
    frames_since_detection: u32,
}

impl Default for CornerTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl CornerTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            current: None,
            frames_since_detection: 0,
        }
    }

    pub fn current(&self) -> Option<&TrackedQuad> {
        self.current.as_ref()
    }

    pub fn frames_since_detection(&self) -> u32 {
        self.frames_since_detection
    }

    /// Whether the quad has been detected steadily for long enough to be
    /// worth capturing.
    pub fn is_stable(&self) -> bool {
        self.frames_since_detection == 0
            && self
                .current
                .is_some_and(|t| t.hits >= self.config.min_stable_frames)
    }

    /// Forget everything, e.g. after the camera was restarted.
    pub fn reset(&mut self) {
        self.current = None;
        self.frames_since_detection = 0;
    }

    /// Feed one frame's detection.
    pub fn update(&mut self, detection: &DetectionResult) -> TrackerUpdate {
        match detection.quad {
            Some(quad) => {
                self.frames_since_detection = 0;
                let next = self.follow(quad, detection.frame_size);
                self.current = Some(next);
                TrackerUpdate::Tracking(next)
            }
            None => self.miss(),
        }
    }

    fn follow(&self, quad: Quadrilateral, frame_size: Size) -> TrackedQuad {
        let Some(prev) = self.current.filter(|t| t.frame_size == frame_size) else {
            trace!("adopting first detection");
            return TrackedQuad {
                quad,
                frame_size,
                hits: 1,
            };
        };

        let diagonal = frame_size.diagonal();
        let movement = if diagonal > 0.0 {
            prev.quad.centroid().distance(quad.centroid()) / diagonal
        } else {
            f64::INFINITY
        };

        if movement < self.config.jitter_threshold {
            TrackedQuad {
                quad: prev.quad.lerp(&quad, self.config.smoothing),
                frame_size,
                hits: prev.hits.saturating_add(1),
            }
        } else {
            trace!(movement, "large movement; adopting detection");
            TrackedQuad {
                quad,
                frame_size,
                hits: 1,
            }
        }
    }

    fn miss(&mut self) -> TrackerUpdate {
        let Some(held) = self.current else {
            return TrackerUpdate::Empty;
        };

        self.frames_since_detection = self.frames_since_detection.saturating_add(1);
        if self.frames_since_detection > self.config.grace_frames {
            debug!(
                missed = self.frames_since_detection,
                "detection lost; clearing tracked quad"
            );
            self.current = None;
            self.frames_since_detection = 0;
            TrackerUpdate::Lost
        } else {
            TrackerUpdate::Held(held)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::geometry::{Point, Rect};

    const FRAME: Size = Size::new(640.0, 480.0);

    fn found(x: f64, y: f64) -> DetectionResult {
        let quad = Quadrilateral::from_rect(&Rect::new(Point::new(x, y), Size::new(300.0, 200.0)));
        DetectionResult::found(quad, FRAME)
    }

    fn tracker(grace_frames: u32) -> CornerTracker {
        CornerTracker::new(TrackerConfig {
            grace_frames,
            ..TrackerConfig::default()
        })
    }

    #[test]
    fn first_detection_is_adopted() {
        let mut t = tracker(3);
        let update = t.update(&found(100.0, 100.0));
        let TrackerUpdate::Tracking(tq) = update else {
            panic!("expected Tracking, got {update:?}");
        };
        assert_eq!(tq.quad, found(100.0, 100.0).quad.expect("quad"));
        assert_eq!(tq.hits, 1);
    }

    #[test]
    fn small_jitter_is_blended() {
        let mut t = tracker(3);
        t.update(&found(100.0, 100.0));
        let update = t.update(&found(104.0, 100.0));
        let tq = update.quad().expect("tracked");
        // smoothing 0.35: 100 + 4 * 0.35
        assert!((tq.quad.top_left.x - 101.4).abs() < 1e-9);
        assert_eq!(tq.hits, 2);
    }

    #[test]
    fn large_jump_is_adopted_and_resets_stability() {
        let mut t = tracker(3);
        for _ in 0..6 {
            t.update(&found(100.0, 100.0));
        }
        assert!(t.is_stable());
        let update = t.update(&found(300.0, 250.0));
        let tq = update.quad().expect("tracked");
        assert_eq!(tq.quad.top_left, Point::new(300.0, 250.0));
        assert_eq!(tq.hits, 1);
        assert!(!t.is_stable());
    }

    /// After a stable quad, misses hold it for exactly `grace_frames` frames,
    /// then clear it once.
    #[test]
    fn clears_exactly_once_after_grace() {
        let grace = 10;
        let mut t = tracker(grace);
        for _ in 0..8 {
            t.update(&found(100.0, 100.0));
        }
        assert!(t.is_stable());

        let miss = DetectionResult::none(FRAME);
        let updates: Vec<_> = (0..40).map(|_| t.update(&miss)).collect();

        let lost: Vec<_> = updates
            .iter()
            .enumerate()
            .filter(|(_, u)| matches!(u, TrackerUpdate::Lost))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(lost, vec![grace as usize]);
        assert!(updates[..grace as usize].iter().all(|u| matches!(u, TrackerUpdate::Held(_))));
        assert!(updates[grace as usize + 1..].iter().all(|u| matches!(u, TrackerUpdate::Empty)));
        assert!(t.current().is_none());
    }

    #[test]
    fn detection_during_grace_resets_miss_counter() {
        let mut t = tracker(2);
        t.update(&found(100.0, 100.0));
        let miss = DetectionResult::none(FRAME);
        t.update(&miss);
        t.update(&miss);
        assert_eq!(t.frames_since_detection(), 2);
        t.update(&found(100.0, 100.0));
        assert_eq!(t.frames_since_detection(), 0);
        assert!(matches!(t.update(&miss), TrackerUpdate::Held(_)));
        assert!(matches!(t.update(&miss), TrackerUpdate::Held(_)));
        assert!(matches!(t.update(&miss), TrackerUpdate::Lost));
    }

    #[test]
    fn held_quad_is_not_stable() {
        let mut t = tracker(5);
        for _ in 0..10 {
            t.update(&found(100.0, 100.0));
        }
        t.update(&DetectionResult::none(FRAME));
        assert!(!t.is_stable());
    }

    #[test]
    fn frame_size_change_adopts_directly() {
        let mut t = tracker(3);
        t.update(&found(100.0, 100.0));
        let rotated = DetectionResult::found(
            found(101.0, 100.0).quad.expect("quad"),
            FRAME.transposed(),
        );
        let tq = *t.update(&rotated).quad().expect("tracked");
        assert_eq!(tq.hits, 1);
        assert_eq!(tq.frame_size, FRAME.transposed());
    }

    #[test]
    fn reset_forgets() {
        let mut t = tracker(3);
        t.update(&found(100.0, 100.0));
        t.reset();
        assert!(matches!(t.update(&DetectionResult::none(FRAME)), TrackerUpdate::Empty));
    }
}
