use crate::error::{ProxyError, Result};
use url::{ParseError, Url};

/// Resolve a playlist reference against the URL the playlist was fetched from.
///
/// Absolute references are returned byte-for-byte unchanged. Relative ones are
/// joined onto `base` with standard URL resolution (`..`/`.` normalised).
///
/// # Errors
/// Returns [`ProxyError::MalformedUrl`] when the reference is an invalid
/// absolute URL, or when it is relative and `base` does not parse.
pub fn resolve(reference: &str, base: &str) -> Result<String> {
    match Url::parse(reference) {
        Ok(_) => Ok(reference.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base)
                .map_err(|e| ProxyError::MalformedUrl(format!("{base}: {e}")))?;
            base.join(reference)
                .map(String::from)
                .map_err(|e| ProxyError::MalformedUrl(format!("{reference}: {e}")))
        }
        Err(e) => Err(ProxyError::MalformedUrl(format!("{reference}: {e}"))),
    }
}
