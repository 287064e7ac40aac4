//! Regeneration of the playlist text

use super::PlayList;
use crate::{
    attributes::similar,
    fetch::save_lines,
    media::{AltPlayList, MediaPlayList, MediaSegment},
    resolver::Origin,
    tag::Tag,
    types::PlayListType,
    Error, Result,
};
use std::path::Path;
use tracing::{debug, error};

impl PlayList {
    /// Build the text of the playlist from its current content
    pub fn text_content(&self) -> Result<String> {
        if !self.valid {
            let err = Error::Serialization("invalid HLS playlist content".to_string());
            error!("{}", err);
            return Err(err);
        }

        let mut text = format!("{}\n{}:{}\n", Tag::Extm3u, Tag::Version, self.version);

        // Application tags come before standard ones.
        for tag in &self.extra_tags {
            if !tag.starts_with('#') {
                text.push('#');
            }
            text.push_str(tag);
            text.push('\n');
        }

        if self.is_master() {
            for alt in &self.alt_playlists {
                write_media_tag(&mut text, alt);
            }
            for pl in self.playlists.iter().filter(|pl| !pl.reference.is_empty()) {
                write_stream_inf(&mut text, pl);
            }
        } else if self.is_media() {
            text.push_str(&format!("{}:{}\n", Tag::TargetDuration, self.target_duration.as_secs()));
            text.push_str(&format!("{}:{}\n", Tag::MediaSequence, self.media_sequence));
            match self.playlist_type {
                PlayListType::Vod => text.push_str(&format!("{}:VOD\n", Tag::PlayListType)),
                PlayListType::Event => text.push_str(&format!("{}:EVENT\n", Tag::PlayListType)),
                _ => {}
            }
            for seg in self.segments.iter().filter(|seg| !seg.reference.is_empty()) {
                write_segment(&mut text, seg);
            }
            if self.end_list {
                text.push_str(&format!("{}\n", Tag::EndList));
            }
        } else {
            let err = Error::Serialization("unknown HLS playlist type (master or media playlist)".to_string());
            error!("{}", err);
            return Err(err);
        }

        Ok(text)
    }

    /// Save the playlist in a file, by default the file it was loaded from
    pub fn save_file(&self, path: Option<&Path>) -> Result<()> {
        let path = match (path, &self.origin) {
            (Some(path), _) => path.to_path_buf(),
            (None, Origin::File { path, .. }) if !path.is_empty() => path.into(),
            _ => {
                error!("no file name specified to store the HLS playlist");
                return Err(Error::NoFileName);
            }
        };

        let text = self.text_content()?;
        debug!("saving HLS playlist in {}", path.display());
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        save_lines(&lines, &path).map_err(|e| {
            error!("error saving HLS playlist in {}: {}", path.display(), e);
            e
        })
    }
}

fn write_media_tag(text: &mut String, alt: &AltPlayList) {
    text.push_str(&format!(
        "{}:TYPE={},GROUP-ID=\"{}\",NAME=\"{}\"",
        Tag::Media,
        alt.media_type,
        alt.group_id,
        alt.name
    ));
    for (flag, name) in [(alt.is_default, "DEFAULT"), (alt.auto_select, "AUTOSELECT"), (alt.forced, "FORCED")] {
        if flag {
            text.push_str(&format!(",{}=YES", name));
        }
    }
    for (value, name) in [
        (&alt.language, "LANGUAGE"),
        (&alt.assoc_language, "ASSOC-LANGUAGE"),
        (&alt.stable_rendition_id, "STABLE-RENDITION-ID"),
        (&alt.in_stream_id, "INSTREAM-ID"),
        (&alt.characteristics, "CHARACTERISTICS"),
        (&alt.channels, "CHANNELS"),
        (&alt.reference.relative_uri, "URI"),
    ] {
        if !value.is_empty() {
            text.push_str(&format!(",{}=\"{}\"", name, value));
        }
    }
    text.push('\n');
}

/// `#EXT-X-STREAM-INF` line immediately followed by the URI line.
///
/// Quoted-string attributes are quoted, enumerated-string ones are not.
fn write_stream_inf(text: &mut String, pl: &MediaPlayList) {
    text.push_str(&format!("{}:BANDWIDTH={}", Tag::StreamInf, pl.bandwidth.bits_per_second()));
    if !pl.average_bandwidth.is_zero() {
        text.push_str(&format!(",AVERAGE-BANDWIDTH={}", pl.average_bandwidth.bits_per_second()));
    }
    if pl.frame_rate > 0 {
        text.push_str(&format!(",FRAME-RATE={}.{:03}", pl.frame_rate / 1000, pl.frame_rate % 1000));
    }
    if pl.width > 0 && pl.height > 0 {
        text.push_str(&format!(",RESOLUTION={}", pl.resolution()));
    }
    if !pl.codecs.is_empty() {
        text.push_str(&format!(",CODECS=\"{}\"", pl.codecs));
    }
    if !pl.hdcp.is_empty() {
        text.push_str(&format!(",HDCP-LEVEL={}", pl.hdcp));
    }
    if !pl.video_range.is_empty() {
        text.push_str(&format!(",VIDEO-RANGE={}", pl.video_range));
    }
    for (value, name) in [(&pl.video, "VIDEO"), (&pl.audio, "AUDIO"), (&pl.subtitles, "SUBTITLES")] {
        if !value.is_empty() {
            text.push_str(&format!(",{}=\"{}\"", name, value));
        }
    }
    if similar(&pl.closed_captions, "NONE") {
        text.push_str(",CLOSED-CAPTIONS=NONE");
    } else if !pl.closed_captions.is_empty() {
        text.push_str(&format!(",CLOSED-CAPTIONS=\"{}\"", pl.closed_captions));
    }
    text.push_str(&format!("\n{}\n", pl.reference.relative_uri));
}

fn write_segment(text: &mut String, seg: &MediaSegment) {
    let ms = seg.duration.as_millis();
    text.push_str(&format!("{}:{}.{:03},{}\n", Tag::Extinf, ms / 1000, ms % 1000, seg.title));
    if seg.bitrate.bits_per_second() > 1024 {
        text.push_str(&format!("{}:{}\n", Tag::Bitrate, (seg.bitrate / 1024).bits_per_second()));
    }
    if seg.gap {
        text.push_str(&format!("{}\n", Tag::Gap));
    }
    text.push_str(&format!("{}\n", seg.reference.relative_uri));
}
