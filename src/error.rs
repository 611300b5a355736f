//! Error types for the inkpress library.
//!
//! Every failure surfaces to the immediate caller on the first attempt —
//! nothing in the pipeline retries, and there is no partial-success mode:
//! either full PDF bytes come back or an [`InkpressError`] does.
//!
//! Two deliberate non-errors exist at the container-runtime boundary:
//! image-not-found (triggers a pull) and instance-not-found during pre-run
//! cleanup (expected on a clean host). Those are modelled on
//! [`crate::runtime::RuntimeError`] so callers of the trait can tell them
//! apart from genuine failures.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the inkpress library.
#[derive(Debug, Error)]
pub enum InkpressError {
    // ── Rendering errors ──────────────────────────────────────────────────
    /// The templating collaborator failed; its error is carried as-is.
    #[error("Template '{template}' failed to render: {source}")]
    RenderFailed {
        template: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Temporary-resource errors ─────────────────────────────────────────
    /// Could not create a uniquely named temporary document.
    #[error("Failed to create temporary document in '{dir}': {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing rendered markup to the temporary document failed.
    ///
    /// The partially written file is always closed and deleted before this
    /// error propagates.
    #[error("Failed to write temporary document '{path}': {source}")]
    TempFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── External engine errors ────────────────────────────────────────────
    /// The container runtime could not be reached at all.
    #[error("Container runtime is unavailable: {detail}\nIs the daemon running and the client binary on PATH?")]
    EngineUnavailable { detail: String },

    /// The engine image was absent and pulling it failed.
    #[error("Failed to pull engine image '{image}': {detail}")]
    ImagePullFailed { image: String, detail: String },

    /// The engine instance exited abnormally.
    #[error("PDF conversion failed: {detail}")]
    ConversionFailed { detail: String },

    /// The engine exited cleanly but produced no output file.
    #[error("Engine produced no output file at '{path}'")]
    MissingOutput { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
