// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScanwerkError};

/// Default file name used by [`ScanConfig::load_from_dir`].
pub const CONFIG_FILE: &str = "scanwerk.json";

/// Tunables for validating rectangle-finder candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum quad area as a fraction of the frame area (filters specks).
    pub min_area_fraction: f64,
    /// Maximum ratio of the longer to the shorter mean edge length.
    pub max_aspect_ratio: f64,
    /// Candidates the finder scores below this are discarded.
    pub min_confidence: f32,
    /// Collinearity tolerance used by the degenerate-quad check.
    pub collinearity_tolerance: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.10,
            max_aspect_ratio: 4.0,
            min_confidence: 0.0,
            collinearity_tolerance: 0.02,
        }
    }
}

/// Tunables for the frame-to-frame corner tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Centroid movement, as a fraction of the frame diagonal, below which a
    /// new detection is blended into the current quad instead of replacing it.
    pub jitter_threshold: f64,
    /// Weight of the new detection when blending (0 keeps the old quad,
    /// 1 adopts the new one).
    pub smoothing: f64,
    /// Consecutive frames without detection tolerated before the overlay
    /// is cleared.
    pub grace_frames: u32,
    /// Consecutive detections required before the quad counts as stable.
    pub min_stable_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            jitter_threshold: 0.02,
            smoothing: 0.35,
            // ~0.33 s at 30 fps.
            grace_frames: 10,
            min_stable_frames: 5,
        }
    }
}

/// Session-level timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a freshly corrected page is shown before detection resumes.
    pub review_delay_ms: u64,
}

impl SessionConfig {
    pub fn review_delay(&self) -> Duration {
        Duration::from_millis(self.review_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            review_delay_ms: 2_000,
        }
    }
}

/// Complete capture pipeline settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    pub session: SessionConfig,
}

impl ScanConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if !(0.0..1.0).contains(&d.min_area_fraction) {
            return Err(ScanwerkError::Config(format!(
                "detector.min_area_fraction must be in [0, 1), got {}",
                d.min_area_fraction
            )));
        }
        if d.max_aspect_ratio < 1.0 {
            return Err(ScanwerkError::Config(format!(
                "detector.max_aspect_ratio must be >= 1, got {}",
                d.max_aspect_ratio
            )));
        }
        let t = &self.tracker;
        if !(0.0..=1.0).contains(&t.smoothing) {
            return Err(ScanwerkError::Config(format!(
                "tracker.smoothing must be in [0, 1], got {}",
                t.smoothing
            )));
        }
        if t.jitter_threshold < 0.0 {
            return Err(ScanwerkError::Config(
                "tracker.jitter_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from a JSON file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "scan config loaded");
        Ok(config)
    }

    /// Load `scanwerk.json` from `dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(CONFIG_FILE);
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                info!(path = %path.display(), error = %e, "using default scan config");
                Self::default()
            }
        }
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ScanConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn save_and_load_from_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ScanConfig::default();
        config.tracker.grace_frames = 15;
        config.session.review_delay_ms = 500;
        config.save(dir.path().join(CONFIG_FILE)).expect("save");

        let loaded = ScanConfig::load_from_dir(dir.path());
        assert_eq!(loaded, config);
        assert_eq!(loaded.session.review_delay(), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(ScanConfig::load_from_dir(dir.path()), ScanConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"tracker": {"grace_frames": 3}}"#).expect("parse");
        assert_eq!(config.tracker.grace_frames, 3);
        assert_eq!(config.tracker.min_stable_frames, 5);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn invalid_smoothing_rejected() {
        let mut config = ScanConfig::default();
        config.tracker.smoothing = 1.5;
        assert!(matches!(config.validate(), Err(ScanwerkError::Config(_))));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"detector": {"max_aspect_ratio": 0.5}}"#).expect("write");
        assert!(ScanConfig::load(&path).is_err());
    }
}
