// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.
//
// Nothing here is fatal to the process: every variant has a defined fallback
// in the capture pipeline, and errors reach the host only as outcome values.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Detection / geometry --
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("degenerate quadrilateral: {0}")]
    DegenerateQuad(String),

    // -- Capture / correction --
    #[error("still capture failed: {0}")]
    Capture(String),

    #[error("perspective correction failed: {0}")]
    Rectification(String),

    // -- Session --
    #[error("invalid session transition from {from} on {action}")]
    InvalidTransition { from: String, action: &'static str },

    #[error("no page at index {0}")]
    PageNotFound(usize),

    #[error("page {0} is already checked out")]
    PageCheckedOut(usize),

    #[error("page handle is stale or belongs to another session")]
    StaleHandle,

    #[error("capture session is closed")]
    SessionClosed,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
