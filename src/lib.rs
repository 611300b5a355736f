//! # inkpress
//!
//! Render HTML templates to PDF through a containerized conversion engine.
//!
//! ## Why this crate?
//!
//! Layout-faithful HTML-to-PDF conversion needs a real browser engine, which
//! is a miserable thing to link into a Rust process. Instead this crate
//! renders your templates to temporary files, rewrites asset references to
//! `file://` URLs the isolated engine can resolve, runs the conversion
//! inside a throwaway container (the athenapdf image by default), and hands
//! you the PDF bytes. The container is created and destroyed per conversion;
//! the engine image is pulled once on first use.
//!
//! ## Pipeline Overview
//!
//! ```text
//! template + context
//!  │
//!  ├─ 1. Render   templating collaborator → markup (TemplateEngine trait)
//!  ├─ 2. Rewrite  /media/… and /static/… → absolute file:// URLs
//!  ├─ 3. Tempdoc  markup → uniquely named temp file (RAII cleanup)
//!  ├─ 4. Engine   containerized converter over a bind mount → out file
//!  └─ 5. Bytes    output read into memory and returned
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inkpress::{render_pdf, ConvertConfig, DockerCli, FileTemplateEngine, PdfRequest};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = FileTemplateEngine::new("templates/");
//!     let runtime = DockerCli::new();
//!     let config = ConvertConfig::builder()
//!         .media_root("/srv/media/")
//!         .media_url("/media/")
//!         .build()?;
//!
//!     let request = PdfRequest::new("invoice.html")
//!         .context(json!({"customer": "Acme Corp", "total": "9000.00"}));
//!
//!     let pdf = render_pdf(&engine, &runtime, &request, &config)?;
//!     std::fs::write("invoice.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! The pipeline is synchronous and blocking, with no internal parallelism,
//! retries or timeouts; the conversion call returns when the engine's
//! process exits. Independent conversions may run concurrently from
//! separate threads — generated instance names are unique per call — but a
//! configured fixed instance name is a shared resource that callers must
//! serialise themselves.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `inkpress` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! inkpress = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod http;
pub mod options;
pub mod pipeline;
pub mod runtime;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConvertConfig, ConvertConfigBuilder};
pub use convert::{render_pdf, PdfRequest};
pub use error::InkpressError;
pub use http::{content_disposition_filename, http_quote};
pub use options::{EngineOptions, OptionValue};
pub use pipeline::render::{FileTemplateEngine, FnTemplateEngine, RenderError, TemplateEngine};
pub use pipeline::rewrite::{rewrite_asset_urls, RootMapping};
pub use pipeline::tempdoc::RenderedDocument;
pub use runtime::{BindMount, ContainerRuntime, DockerCli, RuntimeError};
