//! The templating collaborator: an explicit seam instead of a concrete engine.
//!
//! The pipeline never interprets templates itself; it hands a template
//! identifier and a JSON context to a [`TemplateEngine`] and gets markup
//! back. Applications with a real templating stack (tera, minijinja, askama
//! wrappers) implement the trait — or wrap a closure with
//! [`FnTemplateEngine`] — and the rest of the pipeline is unchanged.
//!
//! [`FileTemplateEngine`] is the built-in implementation: it loads the
//! template from a directory and substitutes `{{ key }}` placeholders from a
//! flat JSON object. Enough for standalone documents and the CLI; anything
//! with loops or inheritance belongs in a dedicated engine behind the trait.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;

/// Boxed error from a templating backend, carried through
/// [`crate::InkpressError::RenderFailed`] untouched.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Renders a template identifier with a JSON context into markup.
pub trait TemplateEngine {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

/// Adapter implementing [`TemplateEngine`] for any closure, mainly useful in
/// tests and for bridging to engines with incompatible signatures.
pub struct FnTemplateEngine<F>(pub F)
where
    F: Fn(&str, &Value) -> Result<String, RenderError>;

impl<F> TemplateEngine for FnTemplateEngine<F>
where
    F: Fn(&str, &Value) -> Result<String, RenderError>,
{
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        (self.0)(template, context)
    }
}

/// Placeholder syntax: `{{ key }}`, optional inner whitespace.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").unwrap());

/// File-backed engine with `{{ key }}` placeholder substitution.
///
/// Template identifiers are paths relative to the engine's root directory.
/// Context values render via their JSON form, except strings which render
/// unquoted. Unknown placeholders are left verbatim so a typo is visible in
/// the produced document rather than silently blank.
pub struct FileTemplateEngine {
    root: PathBuf,
}

impl FileTemplateEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateEngine for FileTemplateEngine {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let path = self.root.join(template);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read template '{}': {e}", path.display()))?;
        Ok(substitute(&source, context))
    }
}

fn substitute(source: &str, context: &Value) -> String {
    PLACEHOLDER
        .replace_all(source, |caps: &regex::Captures<'_>| {
            match context.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
