//! Error types for the session lifecycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during session lifecycle operations.
///
/// Everything here is synchronous and locally raised; the host facade
/// flattens these to a boolean plus a logged diagnostic.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine refused to start.
    #[error("Failed to start engine: {0}")]
    EngineStartup(String),

    /// The asset data path is unusable.
    #[error("Data path not usable: {path}: {reason}")]
    PathConfig { path: PathBuf, reason: String },

    /// Global audio context reset failed.
    #[error("Failed to initialize audio: {status}")]
    AudioContext { status: i32 },

    /// Global video context reset failed.
    #[error("Failed to initialize video: {status}")]
    VideoContext { status: i32 },

    /// The engine returned a null encoder handle.
    #[error("Failed to create {kind} encoder '{id}'")]
    EncoderCreation { kind: &'static str, id: String },

    /// The engine returned a null service handle.
    #[error("Failed to create streaming service")]
    ServiceCreation,

    /// The engine returned a null output handle.
    #[error("Failed to create streaming output")]
    OutputCreation,

    /// Operation requires a completed `initialize()` (or, for start,
    /// a configured stream).
    #[error("Session not initialized")]
    NotInitialized,

    /// `initialize()` was called on an already initialized session.
    #[error("Session already initialized")]
    AlreadyInitialized,

    /// The output refused to start.
    #[error("Failed to start streaming: {reason}")]
    StreamStart { reason: String },
}
