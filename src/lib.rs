//! HLS streaming proxy.
//!
//! Fetches playlists and segments with a forced `Referer`, rewrites playlist
//! URI lines to route back through the proxy, and caches responses in memory.

pub mod cache;
pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod server;
pub mod upstream;
