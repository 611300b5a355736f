//! String utilities for serving the produced PDF over HTTP.
//!
//! No HTTP layer lives in this crate; these helpers only format a filename
//! for a `Content-Disposition` header, where browser support is far narrower
//! than the standard permits (see
//! <http://greenbytes.de/tech/tc2231/#attmultinstances>).

/// Sanitize a filename for use in a `Content-Disposition` header.
///
/// Semicolons and double quotes are dropped entirely before quoting; both
/// confuse enough browsers that escaping is not worth the compatibility risk.
pub fn content_disposition_filename(filename: &str) -> String {
    let cleaned: String = filename.chars().filter(|c| *c != ';' && *c != '"').collect();
    http_quote(&cleaned)
}

/// Quote a string for use in an HTTP header.
///
/// Non-ASCII characters are replaced with `?`, backslashes and double quotes
/// are escaped, and the result is wrapped in double quotes.
pub fn http_quote(s: &str) -> String {
    let ascii: String = s
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect();
    let escaped = ascii.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
