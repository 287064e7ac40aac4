//! Resources referenced by a playlist
//!
//! A media playlist references media segments, a master playlist references
//! media playlists (variants) and alternative renditions. All of them share
//! a [`MediaReference`] describing where the resource is.

use crate::types::{BitRate, Resolution};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Location of a referenced resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// URI as written in the playlist
    pub relative_uri: String,
    /// Resolved file path, or URL path for URL based playlists
    pub file_path: String,
    /// Resolved URL, absent for file based playlists
    pub url: Option<Url>,
}

impl MediaReference {
    /// Full URL when known, file path otherwise
    pub fn url_string(&self) -> String {
        match &self.url {
            Some(url) => url.to_string(),
            None => self.file_path.clone(),
        }
    }

    /// Path name without query or fragment, used to check extensions
    pub fn path_name(&self) -> &str {
        match &self.url {
            Some(url) => url.path(),
            None => &self.file_path,
        }
    }

    /// Case-insensitive check of the path extension
    pub fn has_extension(&self, extension: &str) -> bool {
        ends_with_ignore_case(self.path_name(), extension)
    }

    pub fn is_empty(&self) -> bool {
        self.relative_uri.is_empty()
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url_string())
    }
}

pub(crate) fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
    text.len() >= suffix.len()
        && text
            .get(text.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// One media segment of a media playlist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSegment {
    pub reference: MediaReference,
    /// Optional title from `#EXTINF`
    pub title: String,
    /// Segment duration, millisecond precision
    pub duration: Duration,
    /// Indicative bitrate from `#EXT-X-BITRATE`, zero if unknown
    pub bitrate: BitRate,
    /// Segment marked with `#EXT-X-GAP`
    pub gap: bool,
}

impl MediaSegment {
    /// Segment with a URI and a duration, convenient for building playlists
    pub fn new(uri: impl Into<String>, duration: Duration) -> Self {
        Self {
            reference: MediaReference { relative_uri: uri.into(), ..Default::default() },
            duration,
            ..Default::default()
        }
    }

    pub fn url_string(&self) -> String {
        self.reference.url_string()
    }
}

impl std::fmt::Display for MediaSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reference.relative_uri)?;
        if !self.title.is_empty() {
            write!(f, " \"{}\"", self.title)?;
        }
        write!(f, ", {} ms", self.duration.as_millis())?;
        if !self.bitrate.is_zero() {
            write!(f, ", {}", self.bitrate)?;
        }
        if self.gap {
            write!(f, ", gap")?;
        }
        Ok(())
    }
}

/// One variant of a master playlist (`#EXT-X-STREAM-INF` + URI)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPlayList {
    pub reference: MediaReference,
    pub bandwidth: BitRate,
    pub average_bandwidth: BitRate,
    pub width: u32,
    pub height: u32,
    /// Frame rate in milli-frames per second
    pub frame_rate: u64,
    pub codecs: String,
    pub hdcp: String,
    pub video_range: String,
    pub video: String,
    pub audio: String,
    pub subtitles: String,
    pub closed_captions: String,
}

impl MediaPlayList {
    /// Variant with a URI and a bandwidth, convenient for building playlists
    pub fn new(uri: impl Into<String>, bandwidth: BitRate) -> Self {
        Self {
            reference: MediaReference { relative_uri: uri.into(), ..Default::default() },
            bandwidth,
            ..Default::default()
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn url_string(&self) -> String {
        self.reference.url_string()
    }
}

impl std::fmt::Display for MediaPlayList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reference.relative_uri)?;
        if self.width > 0 || self.height > 0 {
            write!(f, ", {}", self.resolution())?;
        }
        if !self.bandwidth.is_zero() {
            write!(f, ", {}", self.bandwidth)?;
        }
        if !self.average_bandwidth.is_zero() {
            write!(f, ", average {}", self.average_bandwidth)?;
        }
        if self.frame_rate > 0 {
            write!(f, ", @{}.{:03} fps", self.frame_rate / 1000, self.frame_rate % 1000)?;
        }
        if !self.codecs.is_empty() {
            write!(f, ", codecs {}", self.codecs)?;
        }
        Ok(())
    }
}

/// Alternative rendition (`#EXT-X-MEDIA`) of a master playlist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltPlayList {
    /// URI is optional for alternative renditions
    pub reference: MediaReference,
    /// `TYPE` attribute: AUDIO, VIDEO, SUBTITLES, CLOSED-CAPTIONS
    pub media_type: String,
    pub name: String,
    pub group_id: String,
    pub stable_rendition_id: String,
    pub language: String,
    pub assoc_language: String,
    pub in_stream_id: String,
    pub characteristics: String,
    pub channels: String,
    pub is_default: bool,
    pub auto_select: bool,
    pub forced: bool,
}

impl AltPlayList {
    pub fn url_string(&self) -> String {
        self.reference.url_string()
    }
}

impl std::fmt::Display for AltPlayList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.reference.is_empty() {
            write!(f, "{}, ", self.reference.relative_uri)?;
        }
        write!(f, "type: {}, name: {}, group: {}", self.media_type, self.name, self.group_id)?;
        if !self.language.is_empty() {
            write!(f, ", language: {}", self.language)?;
        }
        if self.is_default {
            write!(f, ", default")?;
        }
        Ok(())
    }
}
