//! Parsing state machine
//!
//! Lines are processed in order. Tags which apply to the next URI only
//! fill a "next" accumulator, tags which apply until changed also fill a
//! "global" one, and each URI line consumes the "next" accumulator before
//! it is reset from the "global" one.

use super::PlayList;
use crate::{
    attributes::{similar, to_milli_value, TagAttributes},
    media::{AltPlayList, MediaPlayList, MediaSegment},
    tag::{Tag, TagScope},
    types::{BitRate, PlayListType},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, error, trace};

impl PlayList {
    /// Parse the loaded lines
    pub(crate) fn parse(&mut self, strict: bool) -> Result<()> {
        let lines = std::mem::take(&mut self.loaded_content);
        let result = self.parse_lines(&lines, strict);
        self.loaded_content = lines;
        result
    }

    fn parse_lines(&mut self, lines: &[String], strict: bool) -> Result<()> {
        // The playlist must always start with #EXTM3U.
        let header = lines.first().map(|line| if strict { line.as_str() } else { line.trim() });
        if !matches!(header.and_then(|line| self.get_tag(line, strict)), Some((Tag::Extm3u, _))) {
            error!("{}", Error::MissingHeader);
            self.valid = false;
            return Err(Error::MissingHeader);
        }

        // Assume valid playlist, invalidate when necessary.
        self.valid = true;
        self.utc_download = Utc::now();
        self.utc_termination = self.utc_download;

        // Properties valid until next occurrence of the same tag.
        let mut seg_global = MediaSegment::default();
        // Properties valid for the next URI only.
        let mut seg_next = MediaSegment::default();
        let mut pl_next = MediaPlayList::default();

        for (index, raw) in lines.iter().enumerate() {
            let line_number = index + 1;
            let line = if strict { raw.as_str() } else { raw.trim() };
            trace!("playlist: {}", line);

            if self.is_uri(line) {
                if self.is_master() {
                    pl_next.reference.relative_uri = line.to_string();
                    self.origin.resolve_into(&mut pl_next.reference);
                    if !pl_next.reference.has_extension(".m3u8") {
                        debug!("unexpected playlist file extension in reference URI: {}", line);
                    }
                    self.playlists.push_back(std::mem::take(&mut pl_next));
                } else if self.is_media() {
                    seg_next.reference.relative_uri = line.to_string();
                    self.origin.resolve_into(&mut seg_next.reference);
                    self.utc_termination = chrono::Duration::from_std(seg_next.duration)
                        .ok()
                        .and_then(|delta| self.utc_termination.checked_add_signed(delta))
                        .unwrap_or_else(|| {
                            debug!("termination time out of range after {}", line);
                            DateTime::<Utc>::MAX_UTC
                        });
                    if !seg_next.reference.has_extension(".ts") {
                        debug!("unexpected segment file extension in reference URI: {}", line);
                    }
                    let next = std::mem::replace(&mut seg_next, seg_global.clone());
                    self.segments.push_back(next);
                } else {
                    debug!("unknown URI: {}", line);
                    self.valid = false;
                }
                continue;
            }

            let Some((tag, params)) = self.get_tag(line, strict) else {
                // Blank line, comment or unsupported tag.
                continue;
            };

            match tag {
                Tag::Extm3u => {
                    if strict && line_number > 1 {
                        self.field_error("position", line);
                    }
                }
                Tag::Version => match params.trim().parse() {
                    Ok(version) => self.version = version,
                    Err(_) if strict => self.field_error("HLS playlist version", line),
                    Err(_) => {}
                },
                Tag::Extinf => {
                    // #EXTINF:duration,[title]
                    let (duration, title) = match params.split_once(',') {
                        Some((duration, title)) => (duration, Some(title)),
                        None => (params, None),
                    };
                    match to_milli_value(duration) {
                        Some(ms) => seg_next.duration = Duration::from_millis(ms),
                        None => self.field_error("segment duration", line),
                    }
                    if let Some(title) = title {
                        seg_next.title = title.trim().to_string();
                    }
                }
                Tag::Bitrate => match params.parse::<BitRate>() {
                    // Kilobits, applies to this and all subsequent segments.
                    Ok(kilobits) => {
                        seg_global.bitrate = kilobits * 1024;
                        seg_next.bitrate = seg_global.bitrate;
                    }
                    Err(_) if strict => self.field_error("segment bitrate", line),
                    Err(_) => {}
                },
                Tag::Gap => seg_next.gap = true,
                Tag::TargetDuration => match params.trim().parse() {
                    Ok(seconds) => self.target_duration = Duration::from_secs(seconds),
                    Err(_) if strict => self.field_error("target duration", line),
                    Err(_) => {}
                },
                Tag::MediaSequence => match params.trim().parse() {
                    Ok(sequence) => self.media_sequence = sequence,
                    Err(_) if strict => self.field_error("media sequence", line),
                    Err(_) => {}
                },
                Tag::EndList => self.end_list = true,
                Tag::PlayListType => {
                    // Conflicts are logged and invalidate the playlist.
                    if similar(params, "VOD") {
                        let _ = self.set_type(PlayListType::Vod, false);
                    } else if similar(params, "EVENT") {
                        let _ = self.set_type(PlayListType::Event, false);
                    } else {
                        self.field_error("playlist type", line);
                    }
                }
                Tag::StreamInf => {
                    // Applies to the next playlist URI only.
                    let attr = TagAttributes::parse(params);
                    if let Some(bandwidth) = attr.bitrate("BANDWIDTH") {
                        pl_next.bandwidth = bandwidth;
                    }
                    if let Some(average) = attr.bitrate("AVERAGE-BANDWIDTH") {
                        pl_next.average_bandwidth = average;
                    }
                    if let Some(resolution) = attr.resolution("RESOLUTION") {
                        pl_next.width = resolution.width;
                        pl_next.height = resolution.height;
                    }
                    if let Some(frame_rate) = attr.milli_value("FRAME-RATE") {
                        pl_next.frame_rate = frame_rate;
                    }
                    pl_next.codecs = attr.value("CODECS").to_string();
                    pl_next.hdcp = attr.value("HDCP-LEVEL").to_string();
                    pl_next.video_range = attr.value("VIDEO-RANGE").to_string();
                    pl_next.video = attr.value("VIDEO").to_string();
                    pl_next.audio = attr.value("AUDIO").to_string();
                    pl_next.subtitles = attr.value("SUBTITLES").to_string();
                    pl_next.closed_captions = attr.value("CLOSED-CAPTIONS").to_string();
                }
                Tag::Media => {
                    let alt = self.alt_play_list_from(&TagAttributes::parse(params));
                    self.alt_playlists.push_back(alt);
                }
                Tag::ByteRange
                | Tag::Discontinuity
                | Tag::Key
                | Tag::Map
                | Tag::ProgramDateTime
                | Tag::DateRange
                | Tag::Skip
                | Tag::PreloadHint
                | Tag::RenditionReport
                | Tag::DiscontinuitySequence
                | Tag::IFramesOnly
                | Tag::PartInf
                | Tag::ServerControl
                | Tag::IFrameStreamInf
                | Tag::SessionData
                | Tag::SessionKey
                | Tag::ContentSteering
                | Tag::IndependentSegments
                | Tag::Start
                | Tag::Define
                | Tag::Part => {
                    // Recognized, only used to infer the playlist type.
                }
            }
        }

        if self.valid {
            Ok(())
        } else {
            Err(Error::InvalidPlayList(format!("errors in {}", self.describe_source())))
        }
    }

    /// Build an alternative rendition from the attributes of `#EXT-X-MEDIA`
    fn alt_play_list_from(&self, attr: &TagAttributes) -> AltPlayList {
        let mut alt = AltPlayList {
            media_type: attr.value("TYPE").to_string(),
            name: attr.value("NAME").to_string(),
            group_id: attr.value("GROUP-ID").to_string(),
            stable_rendition_id: attr.value("STABLE-RENDITION-ID").to_string(),
            language: attr.value("LANGUAGE").to_string(),
            assoc_language: attr.value("ASSOC-LANGUAGE").to_string(),
            in_stream_id: attr.value("INSTREAM-ID").to_string(),
            characteristics: attr.value("CHARACTERISTICS").to_string(),
            channels: attr.value("CHANNELS").to_string(),
            is_default: attr.yes("DEFAULT"),
            auto_select: attr.yes("AUTOSELECT"),
            forced: attr.yes("FORCED"),
            ..Default::default()
        };
        let uri = attr.value("URI");
        if !uri.is_empty() {
            alt.reference = self.origin.resolve(uri);
            if !alt.reference.has_extension(".m3u8") {
                debug!("unexpected playlist file extension in reference URI: {}", uri);
            }
        }
        alt
    }

    /// Identify a tag line, returning the tag and its parameters.
    ///
    /// Tags which belong to one kind of playlist only set the playlist type
    /// as a side effect.
    fn get_tag<'a>(&mut self, line: &'a str, strict: bool) -> Option<(Tag, &'a str)> {
        let is_tag = match line.get(..4) {
            Some(prefix) if strict => prefix == "#EXT",
            Some(prefix) => prefix.eq_ignore_ascii_case("#EXT"),
            None => false,
        };
        if !is_tag {
            return None;
        }

        // Tag name: letters, digits and dashes.
        let bytes = line.as_bytes();
        let mut pos = 1;
        while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
            pos += 1;
        }

        // Unknown tags are reported by the catalog but do not invalidate.
        let tag = Tag::resolve(&line[1..pos], strict)?;

        // Type conflicts are logged and invalidate the playlist.
        match tag.scope() {
            TagScope::MasterOnly => {
                let _ = self.set_type(PlayListType::Master, false);
            }
            TagScope::MediaOnly => {
                let _ = self.set_type_media();
            }
            TagScope::Both | TagScope::None => {}
        }

        // The tag must be alone or followed by ':'.
        if !strict {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
        }
        if pos < bytes.len() {
            if bytes[pos] == b':' {
                pos += 1;
            } else {
                error!("invalid HLS playlist line: {}", line);
                self.valid = false;
                return None;
            }
        }
        if !strict {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
        }

        Some((tag, &line[pos..]))
    }

    /// Check if a line is a URI, inferring the playlist type from its extension
    fn is_uri(&mut self, line: &str) -> bool {
        if line.is_empty() || line.starts_with('#') {
            return false;
        }

        let reference = self.origin.resolve(line);
        if reference.has_extension(".m3u8") || reference.has_extension(".m3u") {
            // Reference to another playlist, this is a master playlist.
            let _ = self.set_type(PlayListType::Master, false);
        } else if reference.has_extension(".ts") {
            let _ = self.set_type_media();
        }
        true
    }

    fn field_error(&mut self, field: &'static str, line: &str) {
        self.invalidate(Error::FieldFormat { field, line: line.to_string() });
    }

    fn describe_source(&self) -> String {
        if self.origin.is_none() {
            "HLS playlist text".to_string()
        } else {
            self.origin.to_string()
        }
    }
}
