pub mod resolver;
pub mod rewriter;

/// Content type served for playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
/// Content type served for media segments.
pub const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// How a requested URL is treated: rewritten playlist or opaque segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Playlist,
    Segment,
}

impl ContentKind {
    /// Classify by suffix of the requested URL string. Anything that does not
    /// end in `.m3u8` is proxied as a segment.
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".m3u8") {
            ContentKind::Playlist
        } else {
            ContentKind::Segment
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ContentKind::Playlist => PLAYLIST_CONTENT_TYPE,
            ContentKind::Segment => SEGMENT_CONTENT_TYPE,
        }
    }

    /// Client-side cache hint. Independent from the proxy's own cache TTL.
    pub fn cache_control(self) -> &'static str {
        match self {
            ContentKind::Playlist => "public, max-age=600",
            ContentKind::Segment => "public, max-age=31536000",
        }
    }

    /// Label used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Playlist => "playlist",
            ContentKind::Segment => "segment",
        }
    }
}
