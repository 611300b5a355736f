//! Asset-reference rewriting: absolute `file://` URLs for the engine.
//!
//! The conversion engine runs inside a container with no access to the web
//! server that normally serves `/media/...` and `/static/...` URLs. Rendered
//! markup therefore has every such reference rewritten to an absolute
//! `file://` URL pointing at the corresponding filesystem root, which the
//! engine can resolve through the bind mount (or a shared filesystem).
//!
//! Matching is intentionally literal: quoted substrings starting with a
//! configured URL prefix are collected across the whole document, then each
//! distinct match is replaced everywhere it occurs as plain text. A string
//! that coincidentally equals a matched reference outside a quoted attribute
//! is rewritten too; callers with such content should pick less ambiguous
//! URL prefixes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Pairs a filesystem root with the URL prefix it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMapping {
    /// Filesystem directory the URLs resolve to, e.g. `/srv/media/`.
    pub root: PathBuf,
    /// URL prefix under which the root is served, e.g. `/media/`.
    pub url_prefix: String,
}

impl RootMapping {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

/// Matches URL prefixes that already carry a scheme (`http://`, `file://`).
static HAS_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^:/]+://").unwrap());

/// Rewrite every quoted asset reference in `markup` to a `file://` URL.
///
/// Mappings are applied in order. A mapping is skipped when its URL prefix
/// is empty, already has a scheme, or its root is not an absolute path (no
/// `file://` URL can be formed for it). Mappings with no match are no-ops,
/// so rewriting already-rewritten markup changes nothing.
pub fn rewrite_asset_urls(markup: &str, mappings: &[RootMapping]) -> String {
    let mut content = markup.to_string();

    for mapping in mappings {
        if mapping.url_prefix.is_empty() || HAS_SCHEME.is_match(&mapping.url_prefix) {
            continue;
        }
        let Some(root_url) = file_url_for_dir(&mapping.root) else {
            warn!(
                root = %mapping.root.display(),
                "skipping asset mapping: root is not an absolute path"
            );
            continue;
        };

        // Quoted substrings starting with the prefix, e.g. "/media/logo.png".
        let pattern = format!(r#"["']({}.*?)["']"#, regex::escape(&mapping.url_prefix));
        let finder = Regex::new(&pattern).expect("escaped prefix forms a valid pattern");

        let mut seen = HashSet::new();
        let matches: Vec<String> = finder
            .captures_iter(&content)
            .map(|caps| caps[1].to_string())
            .filter(|m| seen.insert(m.clone()))
            .collect();

        for reference in matches {
            let rewritten = format!("{}{}", root_url, &reference[mapping.url_prefix.len()..]);
            debug!(from = %reference, to = %rewritten, "rewriting asset reference");
            // Global literal replacement, not scoped to the quoted context.
            content = content.replace(&reference, &rewritten);
        }
    }

    content
}

/// `file://` URL for a directory, normalised to end with a slash so a
/// URL-path suffix can be appended directly.
fn file_url_for_dir(root: &Path) -> Option<String> {
    let url = Url::from_file_path(root).ok()?;
    let mut s = url.to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Some(s)
}
