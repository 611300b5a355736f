//! Top-level orchestration: templates in, PDF bytes out.
//!
//! [`render_pdf`] renders up to four logical documents — main body always,
//! header, footer and cover when their templates are supplied — into
//! temporary files, wires their paths into the engine options, and hands the
//! assembled job to the engine invoker. All rendered documents live on the
//! stack of this call: whatever exit path is taken, dropping them closes and
//! deletes the temp files (unless the config keeps them for debugging).

use crate::config::ConvertConfig;
use crate::error::InkpressError;
use crate::options::EngineOptions;
use crate::pipeline::engine::convert_documents;
use crate::pipeline::render::TemplateEngine;
use crate::pipeline::tempdoc::RenderedDocument;
use crate::runtime::ContainerRuntime;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// One conversion request: a main template, optional companion templates, a
/// shared context and caller-supplied engine options.
///
/// # Example
/// ```rust,no_run
/// use inkpress::{render_pdf, ConvertConfig, DockerCli, FileTemplateEngine, PdfRequest};
/// use serde_json::json;
///
/// # fn main() -> Result<(), inkpress::InkpressError> {
/// let engine = FileTemplateEngine::new("templates/");
/// let runtime = DockerCli::new();
/// let config = ConvertConfig::default();
///
/// let request = PdfRequest::new("invoice.html")
///     .header("header.html")
///     .context(json!({"customer": "Acme", "total": "90.00"}));
///
/// let pdf = render_pdf(&engine, &runtime, &request, &config)?;
/// std::fs::write("invoice.pdf", pdf).unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PdfRequest {
    pub template: String,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub cover_template: Option<String>,
    pub context: Value,
    pub options: EngineOptions,
}

impl PdfRequest {
    /// Request converting `template` with an empty context and no options.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            header_template: None,
            footer_template: None,
            cover_template: None,
            context: Value::Null,
            options: EngineOptions::new(),
        }
    }

    pub fn header(mut self, template: impl Into<String>) -> Self {
        self.header_template = Some(template.into());
        self
    }

    pub fn footer(mut self, template: impl Into<String>) -> Self {
        self.footer_template = Some(template.into());
        self
    }

    pub fn cover(mut self, template: impl Into<String>) -> Self {
        self.cover_template = Some(template.into());
        self
    }

    pub fn context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

/// Render the request's templates and convert them to PDF bytes.
///
/// Header and footer documents override any `header_html` / `footer_html`
/// already present in the request options — clobber only if provided, so
/// hardcoded static files in the options survive when no template is given.
/// A cover document becomes the first input and sets the `has_cover` flag.
///
/// Single attempt, no partial output: either the full PDF bytes come back or
/// an error does, and every temporary document is released either way.
pub fn render_pdf(
    engine: &dyn TemplateEngine,
    runtime: &dyn ContainerRuntime,
    request: &PdfRequest,
    config: &ConvertConfig,
) -> Result<Vec<u8>, InkpressError> {
    let main = RenderedDocument::render(engine, &request.template, &request.context, config)?;

    let header = request
        .header_template
        .as_deref()
        .map(|t| RenderedDocument::render(engine, t, &request.context, config))
        .transpose()?;
    let footer = request
        .footer_template
        .as_deref()
        .map(|t| RenderedDocument::render(engine, t, &request.context, config))
        .transpose()?;
    let cover = request
        .cover_template
        .as_deref()
        .map(|t| RenderedDocument::render(engine, t, &request.context, config))
        .transpose()?;

    let mut options = request.options.clone();
    if let Some(doc) = &header {
        options.set("header_html", doc.path().to_string_lossy());
    }
    if let Some(doc) = &footer {
        options.set("footer_html", doc.path().to_string_lossy());
    }

    let inputs: Vec<&Path> = match &cover {
        Some(doc) => {
            options.set_flag("has_cover");
            vec![doc.path(), main.path()]
        }
        None => vec![main.path()],
    };

    debug!(
        template = %request.template,
        header = request.header_template.is_some(),
        footer = request.footer_template.is_some(),
        cover = request.cover_template.is_some(),
        "rendered request documents"
    );

    convert_documents(runtime, &inputs, &options, config)
    // main/header/footer/cover drop here on every path, releasing the files.
}
