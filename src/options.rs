//! Engine option handling: flag normalisation and CLI-argument serialisation.
//!
//! The external engine descends from wkhtmltopdf and keeps its argument
//! convention: a fixed set of flags take no value (presence alone conveys
//! meaning), everything else is a `--key value` pair. [`NO_ARGUMENT_FLAGS`]
//! is that whitelist; an option whose normalised flag appears in it is
//! serialised bare even when a value was supplied.
//!
//! Options live in a `BTreeMap` so serialisation order is deterministic,
//! which keeps invocation commands stable across runs and easy to assert
//! against in tests.

use once_cell::sync::Lazy;
use std::collections::{btree_map, BTreeMap, HashSet};

/// Flags the engine accepts with no argument.
const NO_ARGUMENT_OPTIONS: &[&str] = &[
    "--collate",
    "--no-collate",
    "-H",
    "--extended-help",
    "-g",
    "--grayscale",
    "-h",
    "--help",
    "--htmldoc",
    "--license",
    "-l",
    "--lowquality",
    "--manpage",
    "--no-pdf-compression",
    "-q",
    "--quiet",
    "--read-args-from-stdin",
    "--readme",
    "--use-xserver",
    "-V",
    "--version",
    "--dump-default-toc-xsl",
    "--outline",
    "--no-outline",
    "--background",
    "--no-background",
    "--custom-header-propagation",
    "--no-custom-header-propagation",
    "--debug-javascript",
    "--no-debug-javascript",
    "--default-header",
    "--disable-external-links",
    "--enable-external-links",
    "--disable-forms",
    "--enable-forms",
    "--images",
    "--no-images",
    "--disable-internal-links",
    "--enable-internal-links",
    "-n",
    "--disable-javascript",
    "--enable-javascript",
    "--keep-relative-links",
    "--load-error-handling",
    "--load-media-error-handling",
    "--disable-local-file-access",
    "--enable-local-file-access",
    "--exclude-from-outline",
    "--include-in-outline",
    "--disable-plugins",
    "--enable-plugins",
    "--print-media-type",
    "--no-print-media-type",
    "--resolve-relative-links",
    "--disable-smart-shrinking",
    "--enable-smart-shrinking",
    "--stop-slow-scripts",
    "--no-stop-slow-scripts",
    "--disable-toc-back-links",
    "--enable-toc-back-links",
    "--footer-line",
    "--no-footer-line",
    "--header-line",
    "--no-header-line",
    "--disable-dotted-lines",
    "--disable-toc-links",
    "--verbose",
];

/// Whitelist of no-argument engine flags, keyed by normalised flag name.
static NO_ARGUMENT_FLAGS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| NO_ARGUMENT_OPTIONS.iter().copied().collect());

/// Value attached to an engine option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Presence-only flag; serialised without a value.
    Flag,
    /// Flag with an argument, serialised as `--key value` unless the flag is
    /// in the no-argument whitelist.
    Value(String),
}

/// Ordered mapping of engine flags, assembled by the caller and extended by
/// the orchestrator (`header_html`, `footer_html`, `has_cover`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option with a value. Replaces any previous entry for the key
    /// (later-wins, which is what lets the orchestrator clobber a hardcoded
    /// `header_html` with the freshly rendered one).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), OptionValue::Value(value.into()));
    }

    /// Set a presence-only flag.
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), OptionValue::Flag);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, OptionValue> {
        self.entries.iter()
    }

    /// Serialise the options into engine CLI arguments.
    ///
    /// Keys are normalised with [`flag_name`]; whitelisted and presence-only
    /// flags are emitted bare, everything else as a flag/value pair.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);
        for (key, value) in &self.entries {
            let flag = flag_name(key);
            match value {
                OptionValue::Value(v) if !NO_ARGUMENT_FLAGS.contains(flag.as_str()) => {
                    args.push(flag);
                    args.push(v.clone());
                }
                // Whitelisted flags drop their value: presence alone counts.
                _ => args.push(flag),
            }
        }
        args
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for EngineOptions {
    fn from_iter<T: IntoIterator<Item = (K, OptionValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Normalise an option key to its engine flag spelling.
///
/// Keys already starting with a dash pass through untouched (`-q`,
/// `--grayscale`); bare keys get a `--` prefix with underscores mapped to
/// hyphens (`header_html` → `--header-html`).
pub fn flag_name(key: &str) -> String {
    if key.starts_with('-') {
        key.to_string()
    } else {
        format!("--{}", key.replace('_', "-"))
    }
}
