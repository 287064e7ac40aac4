//! Catalog of HLS tags
//!
//! Every recognized tag has a canonical name (without the leading `#`) and
//! an applicability scope which tells whether it may only appear in a
//! master playlist, only in a media playlist, or in both. The scope is used
//! to classify a playlist as soon as a discriminating tag is met.

use tracing::{debug, error};

/// Where a tag may legitimately appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagScope {
    /// Header tag, says nothing about the playlist kind
    None,
    /// Master (multivariant) playlists only
    MasterOnly,
    /// Media playlists only
    MediaOnly,
    /// Either kind of playlist
    Both,
}

impl TagScope {
    /// True when the tag can appear in a master playlist
    pub fn master(&self) -> bool {
        matches!(self, TagScope::MasterOnly | TagScope::Both)
    }

    /// True when the tag can appear in a media playlist
    pub fn media(&self) -> bool {
        matches!(self, TagScope::MediaOnly | TagScope::Both)
    }
}

/// HLS tags known by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    // Basic tags
    Extm3u,
    Version,
    // Media segment tags
    Extinf,
    ByteRange,
    Discontinuity,
    Key,
    Map,
    ProgramDateTime,
    DateRange,
    Gap,
    Bitrate,
    Part,
    // Media playlist tags
    TargetDuration,
    MediaSequence,
    DiscontinuitySequence,
    EndList,
    PlayListType,
    IFramesOnly,
    PartInf,
    ServerControl,
    Skip,
    PreloadHint,
    RenditionReport,
    // Master playlist tags
    Media,
    StreamInf,
    IFrameStreamInf,
    SessionData,
    SessionKey,
    ContentSteering,
    // Media or master playlist tags
    IndependentSegments,
    Start,
    Define,
}

/// Every tag, in catalog order
const ALL_TAGS: &[Tag] = &[
    Tag::Extm3u,
    Tag::Version,
    Tag::Extinf,
    Tag::ByteRange,
    Tag::Discontinuity,
    Tag::Key,
    Tag::Map,
    Tag::ProgramDateTime,
    Tag::DateRange,
    Tag::Gap,
    Tag::Bitrate,
    Tag::Part,
    Tag::TargetDuration,
    Tag::MediaSequence,
    Tag::DiscontinuitySequence,
    Tag::EndList,
    Tag::PlayListType,
    Tag::IFramesOnly,
    Tag::PartInf,
    Tag::ServerControl,
    Tag::Skip,
    Tag::PreloadHint,
    Tag::RenditionReport,
    Tag::Media,
    Tag::StreamInf,
    Tag::IFrameStreamInf,
    Tag::SessionData,
    Tag::SessionKey,
    Tag::ContentSteering,
    Tag::IndependentSegments,
    Tag::Start,
    Tag::Define,
];

impl Tag {
    /// Look up a tag by name (without `#`).
    ///
    /// Strict lookups are case-sensitive. An unknown name is logged, at
    /// error level in strict mode and debug level otherwise, and `None` is
    /// returned: unknown tags never invalidate a playlist.
    pub fn resolve(name: &str, strict: bool) -> Option<Tag> {
        let found = ALL_TAGS
            .iter()
            .copied()
            .find(|tag| if strict { tag.name() == name } else { tag.name().eq_ignore_ascii_case(name) });

        if found.is_none() {
            if strict {
                error!("unsupported HLS tag: {}", name);
            } else {
                debug!("unsupported HLS tag: {}", name);
            }
        }
        found
    }

    /// Canonical tag name, without the leading `#`
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Extm3u => "EXTM3U",
            Tag::Version => "EXT-X-VERSION",
            Tag::Extinf => "EXTINF",
            Tag::ByteRange => "EXT-X-BYTERANGE",
            Tag::Discontinuity => "EXT-X-DISCONTINUITY",
            Tag::Key => "EXT-X-KEY",
            Tag::Map => "EXT-X-MAP",
            Tag::ProgramDateTime => "EXT-X-PROGRAM-DATE-TIME",
            Tag::DateRange => "EXT-X-DATERANGE",
            Tag::Gap => "EXT-X-GAP",
            Tag::Bitrate => "EXT-X-BITRATE",
            Tag::Part => "EXT-X-PART",
            Tag::TargetDuration => "EXT-X-TARGETDURATION",
            Tag::MediaSequence => "EXT-X-MEDIA-SEQUENCE",
            Tag::DiscontinuitySequence => "EXT-X-DISCONTINUITY-SEQUENCE",
            Tag::EndList => "EXT-X-ENDLIST",
            Tag::PlayListType => "EXT-X-PLAYLIST-TYPE",
            Tag::IFramesOnly => "EXT-X-I-FRAMES-ONLY",
            Tag::PartInf => "EXT-X-PART-INF",
            Tag::ServerControl => "EXT-X-SERVER-CONTROL",
            Tag::Skip => "EXT-X-SKIP",
            Tag::PreloadHint => "EXT-X-PRELOAD-HINT",
            Tag::RenditionReport => "EXT-X-RENDITION-REPORT",
            Tag::Media => "EXT-X-MEDIA",
            Tag::StreamInf => "EXT-X-STREAM-INF",
            Tag::IFrameStreamInf => "EXT-X-I-FRAME-STREAM-INF",
            Tag::SessionData => "EXT-X-SESSION-DATA",
            Tag::SessionKey => "EXT-X-SESSION-KEY",
            Tag::ContentSteering => "EXT-X-CONTENT-STEERING",
            Tag::IndependentSegments => "EXT-X-INDEPENDENT-SEGMENTS",
            Tag::Start => "EXT-X-START",
            Tag::Define => "EXT-X-DEFINE",
        }
    }

    /// Where this tag may appear
    pub fn scope(&self) -> TagScope {
        match self {
            Tag::Extm3u => TagScope::None,
            Tag::Version
            | Tag::IndependentSegments
            | Tag::Start
            | Tag::Define => TagScope::Both,
            Tag::Extinf
            | Tag::ByteRange
            | Tag::Discontinuity
            | Tag::Key
            | Tag::Map
            | Tag::ProgramDateTime
            | Tag::DateRange
            | Tag::Gap
            | Tag::Bitrate
            | Tag::Part
            | Tag::TargetDuration
            | Tag::MediaSequence
            | Tag::DiscontinuitySequence
            | Tag::EndList
            | Tag::PlayListType
            | Tag::IFramesOnly
            | Tag::PartInf
            | Tag::ServerControl
            | Tag::Skip
            | Tag::PreloadHint
            | Tag::RenditionReport => TagScope::MediaOnly,
            Tag::Media
            | Tag::StreamInf
            | Tag::IFrameStreamInf
            | Tag::SessionData
            | Tag::SessionKey
            | Tag::ContentSteering => TagScope::MasterOnly,
        }
    }

    /// All known tags, in catalog order
    pub fn all() -> impl Iterator<Item = Tag> {
        ALL_TAGS.iter().copied()
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.name())
    }
}
