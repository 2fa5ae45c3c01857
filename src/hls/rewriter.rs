//! Line-based playlist rewriting.
//!
//! Every URI line of a playlist is resolved against the playlist's own URL and
//! replaced with a proxy-routed URL carrying the upstream URL in its `url`
//! query parameter. Tag and comment lines pass through byte-for-byte, including
//! URIs embedded in tag attributes (`#EXT-X-KEY`, `#EXT-X-MAP`), which are not
//! touched.

use super::resolver::resolve;
use tracing::debug;

/// Rewrites playlist URI lines so players fetch them back through the proxy.
#[derive(Clone, Debug)]
pub struct PlaylistRewriter {
    proxy_base: String,
    /// `<proxy_base>?url=`, precomputed for the already-proxied check
    proxied_prefix: String,
}

impl PlaylistRewriter {
    /// `proxy_base` is the streaming endpoint, either absolute
    /// (`https://proxy.example.com/api/v1/streamingProxy`) or path-only.
    pub fn new(proxy_base: impl Into<String>) -> Self {
        let proxy_base = proxy_base.into();
        let proxied_prefix = format!("{proxy_base}?url=");
        Self {
            proxy_base,
            proxied_prefix,
        }
    }

    pub fn proxy_base(&self) -> &str {
        &self.proxy_base
    }

    /// Build the proxy-routed URL for an absolute upstream URL.
    pub fn proxy_url(&self, upstream_url: &str) -> String {
        format!("{}{}", self.proxied_prefix, urlencoding::encode(upstream_url))
    }

    /// Rewrite every URI line of `playlist`, resolving relative references
    /// against `request_url`. Line order and terminators are preserved.
    ///
    /// Lines are classified with surrounding whitespace ignored, so an indented
    /// tag is still a tag. Lines that fail to resolve are emitted unchanged.
    pub fn rewrite(&self, playlist: &str, request_url: &str) -> String {
        let mut output = String::with_capacity(playlist.len() * 2);

        for chunk in playlist.split_inclusive('\n') {
            let (content, terminator) = split_terminator(chunk);
            let reference = content.trim();

            if is_tag_or_blank(reference) || reference.starts_with(&self.proxied_prefix) {
                output.push_str(chunk);
                continue;
            }

            match resolve(reference, request_url) {
                Ok(absolute) => {
                    output.push_str(&self.proxy_url(&absolute));
                    output.push_str(terminator);
                }
                Err(e) => {
                    debug!("Leaving playlist line unrewritten: {}", e);
                    output.push_str(chunk);
                }
            }
        }

        output
    }
}

fn is_tag_or_blank(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Split a line into its content and its `\r\n` / `\n` / empty terminator.
fn split_terminator(chunk: &str) -> (&str, &str) {
    if let Some(content) = chunk.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = chunk.strip_suffix('\n') {
        (content, "\n")
    } else {
        (chunk, "")
    }
}
