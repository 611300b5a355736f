//! Temporary rendered documents with guaranteed cleanup.
//!
//! The engine reads its inputs from the filesystem, so rendered markup has to
//! be materialised somewhere the bind mount can see. [`RenderedDocument`]
//! owns that file: while the handle lives the path is valid, and dropping it
//! closes the file exactly once and deletes it — on success, on error, and
//! on panic alike. With `keep_rendered_files` set the file is persisted at
//! creation time (closed immediately, path retained) so the exact HTML the
//! engine saw can be inspected afterwards.

use crate::config::ConvertConfig;
use crate::error::InkpressError;
use crate::pipeline::render::TemplateEngine;
use crate::pipeline::rewrite::rewrite_asset_urls;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const FILE_PREFIX: &str = "inkpress";
const FILE_SUFFIX: &str = ".html";

/// A rendered document materialised as a uniquely named file on disk.
pub struct RenderedDocument {
    path: PathBuf,
    /// `Some` while the file is ephemeral; drop deletes it. `None` when the
    /// file was persisted for debugging.
    file: Option<NamedTempFile>,
}

impl RenderedDocument {
    /// Render `template` with `context`, rewrite asset references using the
    /// configured root mappings, and write the result to a temporary file in
    /// `config.temp_dir`.
    pub fn render(
        engine: &dyn TemplateEngine,
        template: &str,
        context: &Value,
        config: &ConvertConfig,
    ) -> Result<Self, InkpressError> {
        let markup =
            engine
                .render(template, context)
                .map_err(|source| InkpressError::RenderFailed {
                    template: template.to_string(),
                    source,
                })?;
        let markup = rewrite_asset_urls(&markup, &config.root_mappings());
        let doc = Self::create(&markup, config)?;
        debug!(template, path = %doc.path().display(), "rendered document");
        Ok(doc)
    }

    /// Write already-rendered markup to a temporary file.
    ///
    /// On a write failure the partially written file is closed and deleted
    /// before the error propagates; no handle or filesystem entry leaks.
    pub fn create(markup: &str, config: &ConvertConfig) -> Result<Self, InkpressError> {
        let mut file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(FILE_SUFFIX)
            .tempfile_in(&config.temp_dir)
            .map_err(|source| InkpressError::TempFile {
                dir: config.temp_dir.clone(),
                source,
            })?;

        // An early return here drops `file`, which closes and deletes it.
        file.write_all(markup.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| InkpressError::TempFileWrite {
                path: file.path().to_path_buf(),
                source,
            })?;

        if config.keep_rendered_files {
            let tentative = file.path().to_path_buf();
            let (persisted, path) = file.keep().map_err(|e| InkpressError::TempFileWrite {
                path: tentative,
                source: e.error,
            })?;
            drop(persisted); // close now; the path stays on disk
            Ok(Self { path, file: None })
        } else {
            let path = file.path().to_path_buf();
            Ok(Self {
                path,
                file: Some(file),
            })
        }
    }

    /// Absolute path of the document for the duration of the handle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file will outlive this handle.
    pub fn is_persisted(&self) -> bool {
        self.file.is_none()
    }
}

impl std::fmt::Debug for RenderedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedDocument")
            .field("path", &self.path)
            .field("persisted", &self.is_persisted())
            .finish()
    }
}
