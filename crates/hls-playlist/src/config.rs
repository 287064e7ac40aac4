//! Options controlling how a playlist is loaded

use crate::fetch::FetchConfig;
use crate::types::PlayListType;
use serde::{Deserialize, Serialize};

/// Playlist loading options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Strict RFC 8216 conformance: case-sensitive tags, no trimming,
    /// `.m3u8`/`.m3u` name or HLS MIME type required
    pub strict: bool,
    /// Playlist type known in advance, `Unknown` to infer it
    pub expected_type: PlayListType,
    /// Transport settings for URL based playlists
    pub fetch: FetchConfig,
}

impl LoadOptions {
    /// Relaxed loading, the default
    pub fn relaxed() -> Self {
        Self::default()
    }

    /// Strict loading
    pub fn strict() -> Self {
        Self { strict: true, ..Self::default() }
    }

    pub fn with_type(mut self, expected_type: PlayListType) -> Self {
        self.expected_type = expected_type;
        self
    }
}
