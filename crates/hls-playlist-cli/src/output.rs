//! Output formatting for CLI

use hls_playlist::{AltPlayList, MediaPlayList, MediaReference, MediaSegment, PlayList, PlayListType};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Serializable view of a playlist
#[derive(Serialize)]
struct PlayListReport<'a> {
    source: String,
    playlist_type: PlayListType,
    valid: bool,
    version: u32,
    updatable: bool,
    target_duration_secs: u64,
    media_sequence: u64,
    end_list: bool,
    segments: Vec<&'a MediaSegment>,
    variants: Vec<&'a MediaPlayList>,
    renditions: Vec<&'a AltPlayList>,
}

impl<'a> From<&'a PlayList> for PlayListReport<'a> {
    fn from(pl: &'a PlayList) -> Self {
        Self {
            source: pl.url(),
            playlist_type: pl.playlist_type(),
            valid: pl.is_valid(),
            version: pl.version(),
            updatable: pl.is_updatable(),
            target_duration_secs: pl.target_duration().as_secs(),
            media_sequence: pl.media_sequence(),
            end_list: pl.end_list(),
            segments: pl.segments().collect(),
            variants: pl.play_lists().collect(),
            renditions: pl.alt_play_lists().collect(),
        }
    }
}

#[derive(Tabled)]
struct VariantRow {
    #[tabled(rename = "#")]
    index: usize,
    bandwidth: u64,
    resolution: String,
    quality: &'static str,
    codecs: String,
    uri: String,
}

#[derive(Tabled)]
struct RenditionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "type")]
    media_type: String,
    group: String,
    name: String,
    language: String,
    default: bool,
    uri: String,
}

#[derive(Tabled)]
struct SegmentRow {
    sequence: u64,
    duration_ms: u128,
    bitrate: u64,
    gap: bool,
    uri: String,
}

/// Describe a playlist in the selected format
pub fn render_playlist(pl: &PlayList, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&PlayListReport::from(pl))?),
        OutputFormat::Table => Ok(playlist_tables(pl)),
        OutputFormat::Text => Ok(playlist_text(pl)),
    }
}

fn playlist_text(pl: &PlayList) -> String {
    let mut text = pl.to_string();
    for (i, variant) in pl.play_lists().enumerate() {
        text.push_str(&format!("\n  {}. {}", i, variant));
    }
    for (i, rendition) in pl.alt_play_lists().enumerate() {
        text.push_str(&format!("\n  alt {}. {}", i, rendition));
    }
    for (i, seg) in pl.segments().enumerate() {
        text.push_str(&format!("\n  #{} {}", pl.media_sequence().saturating_add(i as u64), seg));
    }
    text
}

fn playlist_tables(pl: &PlayList) -> String {
    let mut text = pl.to_string();
    if pl.play_list_count() > 0 {
        let rows = pl.play_lists().enumerate().map(|(index, v)| VariantRow {
            index,
            bandwidth: v.bandwidth.bits_per_second(),
            resolution: v.resolution().to_string(),
            quality: v.resolution().quality_name(),
            codecs: v.codecs.clone(),
            uri: v.reference.relative_uri.clone(),
        });
        text.push_str(&format!("\n{}", Table::new(rows)));
    }
    if pl.alt_play_list_count() > 0 {
        let rows = pl.alt_play_lists().enumerate().map(|(index, r)| RenditionRow {
            index,
            media_type: r.media_type.clone(),
            group: r.group_id.clone(),
            name: r.name.clone(),
            language: r.language.clone(),
            default: r.is_default,
            uri: r.reference.relative_uri.clone(),
        });
        text.push_str(&format!("\n{}", Table::new(rows)));
    }
    if pl.segment_count() > 0 {
        let rows = pl.segments().enumerate().map(|(i, seg)| SegmentRow {
            sequence: pl.media_sequence().saturating_add(i as u64),
            duration_ms: seg.duration.as_millis(),
            bitrate: seg.bitrate.bits_per_second(),
            gap: seg.gap,
            uri: seg.reference.relative_uri.clone(),
        });
        text.push_str(&format!("\n{}", Table::new(rows)));
    }
    text
}

/// Resolved location of a selected variant or rendition
pub fn render_reference(reference: &MediaReference, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reference)?),
        OutputFormat::Text | OutputFormat::Table => Ok(reference.url_string()),
    }
}

/// One followed segment
pub fn render_segment(seg: &MediaSegment, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(seg)?),
        OutputFormat::Text | OutputFormat::Table => Ok(seg.url_string()),
    }
}
