//! Pipeline stages for HTML-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step, which keeps
//! every stage independently testable and lets the two external
//! collaborators (templating engine, container runtime) be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ rewrite ──▶ tempdoc ──▶ engine
//! (template)  (file://)   (on disk)   (container → PDF bytes)
//! ```
//!
//! 1. [`render`]  — the [`TemplateEngine`](render::TemplateEngine) seam that
//!    turns a template identifier plus JSON context into markup
//! 2. [`rewrite`] — rewrite `/media/...`-style references to absolute
//!    `file://` URLs the isolated engine can resolve
//! 3. [`tempdoc`] — materialise markup as a temp file with RAII cleanup
//! 4. [`engine`]  — run the containerized converter and collect the bytes

pub mod engine;
pub mod render;
pub mod rewrite;
pub mod tempdoc;
