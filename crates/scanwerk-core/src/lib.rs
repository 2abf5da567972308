// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Core types, geometry primitives, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod session;
pub mod types;

pub use config::{DetectorConfig, ScanConfig, SessionConfig, TrackerConfig};
pub use error::ScanwerkError;
pub use geometry::{AffineTransform, Point, Quadrilateral, Rect, Size};
pub use session::{PageHandle, Session};
pub use types::*;
