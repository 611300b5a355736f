//! Configuration for the HTML-to-PDF pipeline.
//!
//! All pipeline behaviour is controlled through [`ConvertConfig`], built via
//! its [`ConvertConfigBuilder`]. The asset roots (media/static) live here
//! explicitly rather than being looked up from ambient process state, so two
//! configs with different roots can coexist in one process and a config can
//! be logged or diffed when two runs disagree.

use crate::error::InkpressError;
use crate::pipeline::rewrite::RootMapping;
use std::path::PathBuf;

/// Configuration for a conversion pipeline.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use inkpress::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .media_root("/srv/media/")
///     .media_url("/media/")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Engine image name. Default: `arachnysdocker/athenapdf`.
    ///
    /// Looked up by name at conversion start and pulled if absent, so the
    /// first conversion on a fresh host pays the pull cost once.
    pub image: String,

    /// Command executed inside the engine container. Default: `athenapdf`.
    pub engine_command: String,

    /// Host directory where rendered documents and the engine output live.
    /// Default: [`std::env::temp_dir()`].
    ///
    /// This directory is bind-mounted read-write into the container at
    /// [`container_mount`](Self::container_mount), so every input path handed
    /// to the engine must be inside it.
    pub temp_dir: PathBuf,

    /// Mount point of [`temp_dir`](Self::temp_dir) inside the container.
    /// Default: `/converted/`. The engine image uses it as its working
    /// directory, which is why invocation commands use `./` relative paths.
    pub container_mount: String,

    /// Fixed engine instance name, or `None` to generate a unique name per
    /// conversion (default).
    ///
    /// A fixed name is a process-wide shared resource: two concurrent
    /// conversions using the same name race — one's pre-run cleanup can
    /// remove the other's in-flight instance. Callers configuring a fixed
    /// name must serialise conversions themselves.
    pub container_name: Option<String>,

    /// Prefix for generated instance names. Default: `inkpress`.
    pub container_prefix: String,

    /// Filesystem root that media URLs resolve to, e.g. `/srv/media/`.
    pub media_root: Option<PathBuf>,

    /// URL prefix under which media is served, e.g. `/media/`. Skipped when
    /// empty or already carrying a scheme.
    pub media_url: Option<String>,

    /// Filesystem root that static-asset URLs resolve to.
    pub static_root: Option<PathBuf>,

    /// URL prefix under which static assets are served.
    pub static_url: Option<String>,

    /// Keep rendered documents and the engine output file on disk after the
    /// pipeline returns. Default: `false`.
    ///
    /// Debugging aid: with this set, the exact HTML the engine saw survives
    /// in [`temp_dir`](Self::temp_dir) for inspection.
    pub keep_rendered_files: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            image: "arachnysdocker/athenapdf".to_string(),
            engine_command: "athenapdf".to_string(),
            temp_dir: std::env::temp_dir(),
            container_mount: "/converted/".to_string(),
            container_name: None,
            container_prefix: "inkpress".to_string(),
            media_root: None,
            media_url: None,
            static_root: None,
            static_url: None,
            keep_rendered_files: false,
        }
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }

    /// The asset-root mappings used when rewriting rendered markup, media
    /// first, then static. A mapping is present only when both its root and
    /// URL prefix are configured.
    pub fn root_mappings(&self) -> Vec<RootMapping> {
        let mut mappings = Vec::with_capacity(2);
        if let (Some(root), Some(url)) = (&self.media_root, &self.media_url) {
            mappings.push(RootMapping::new(root.clone(), url.clone()));
        }
        if let (Some(root), Some(url)) = (&self.static_root, &self.static_url) {
            mappings.push(RootMapping::new(root.clone(), url.clone()));
        }
        mappings
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.config.image = image.into();
        self
    }

    pub fn engine_command(mut self, command: impl Into<String>) -> Self {
        self.config.engine_command = command.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn container_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.container_mount = mount.into();
        self
    }

    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.config.container_name = Some(name.into());
        self
    }

    pub fn container_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.container_prefix = prefix.into();
        self
    }

    pub fn media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.media_root = Some(root.into());
        self
    }

    pub fn media_url(mut self, url: impl Into<String>) -> Self {
        self.config.media_url = Some(url.into());
        self
    }

    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.static_root = Some(root.into());
        self
    }

    pub fn static_url(mut self, url: impl Into<String>) -> Self {
        self.config.static_url = Some(url.into());
        self
    }

    pub fn keep_rendered_files(mut self, keep: bool) -> Self {
        self.config.keep_rendered_files = keep;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, InkpressError> {
        let c = &self.config;
        if c.image.is_empty() {
            return Err(InkpressError::InvalidConfig(
                "engine image name must not be empty".into(),
            ));
        }
        if c.engine_command.is_empty() {
            return Err(InkpressError::InvalidConfig(
                "engine command must not be empty".into(),
            ));
        }
        if !c.container_mount.starts_with('/') {
            return Err(InkpressError::InvalidConfig(format!(
                "container mount must be an absolute path, got '{}'",
                c.container_mount
            )));
        }
        if c.container_prefix.is_empty() && c.container_name.is_none() {
            return Err(InkpressError::InvalidConfig(
                "container name prefix must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
