//! HLS playlist model
//!
//! A [`PlayList`] is either a master playlist, listing media playlists and
//! alternative renditions, or a media playlist, listing media segments.
//! Its kind is usually not known in advance and is inferred while parsing
//! from the tags and URIs it contains.
//!
//! Submodules:
//! - `parser`: the line-oriented parsing state machine
//! - `loader`: loading from text, files or URLs and live reload
//! - `writer`: regeneration of the playlist text

mod loader;
mod parser;
mod writer;

use crate::{
    media::{AltPlayList, MediaPlayList, MediaSegment},
    resolver::Origin,
    types::{BitRate, PlayListType},
    attributes::similar,
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::error;
use url::Url;

/// An HLS playlist, master or media
#[derive(Debug, Clone)]
pub struct PlayList {
    /// Content loaded and valid
    valid: bool,
    /// Playlist format version
    version: u32,
    playlist_type: PlayListType,
    /// URL or file the playlist was loaded from
    origin: Origin,
    /// Segment target duration (media playlist)
    target_duration: Duration,
    /// Sequence number of the first segment (media playlist)
    media_sequence: u64,
    /// End of list indicator (media playlist)
    end_list: bool,
    utc_download: DateTime<Utc>,
    /// Download time plus all segment durations
    utc_termination: DateTime<Utc>,
    segments: VecDeque<MediaSegment>,
    playlists: VecDeque<MediaPlayList>,
    alt_playlists: VecDeque<AltPlayList>,
    /// Text as loaded, may differ from the current content
    loaded_content: Vec<String>,
    /// Where loaded playlists are automatically saved
    auto_save_dir: Option<PathBuf>,
    /// Tags added by the application, emitted first on output
    extra_tags: Vec<String>,
}

impl Default for PlayList {
    fn default() -> Self {
        Self {
            valid: false,
            version: 1,
            playlist_type: PlayListType::Unknown,
            origin: Origin::None,
            target_duration: Duration::ZERO,
            media_sequence: 0,
            end_list: false,
            utc_download: DateTime::<Utc>::default(),
            utc_termination: DateTime::<Utc>::default(),
            segments: VecDeque::new(),
            playlists: VecDeque::new(),
            alt_playlists: VecDeque::new(),
            loaded_content: Vec::new(),
            auto_save_dir: None,
            extra_tags: Vec::new(),
        }
    }
}

impl PlayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the content, the auto-save directory is preserved
    pub fn clear(&mut self) {
        let auto_save_dir = self.auto_save_dir.take();
        *self = Self { auto_save_dir, ..Self::default() };
    }

    /// Start an empty valid playlist, to be saved in `filename`
    pub fn reset(&mut self, playlist_type: PlayListType, filename: impl AsRef<Path>, version: u32) {
        self.clear();
        self.valid = true;
        self.version = version;
        self.playlist_type = playlist_type;
        let path = filename.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map(|dir| dir.join(path)).unwrap_or_else(|_| path.to_path_buf())
        };
        self.origin = Origin::file(absolute.to_string_lossy().into_owned());
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn playlist_type(&self) -> PlayListType {
        self.playlist_type
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Original URL or file name
    pub fn url(&self) -> String {
        self.origin.as_string()
    }

    /// A live or event playlist which did not reach its end
    pub fn is_updatable(&self) -> bool {
        self.playlist_type.is_live() && !self.end_list
    }

    pub fn is_media(&self) -> bool {
        self.playlist_type.is_media()
    }

    pub fn is_master(&self) -> bool {
        self.playlist_type == PlayListType::Master
    }

    pub fn target_duration(&self) -> Duration {
        self.target_duration
    }

    pub fn media_sequence(&self) -> u64 {
        self.media_sequence
    }

    pub fn end_list(&self) -> bool {
        self.end_list
    }

    pub fn download_utc(&self) -> DateTime<Utc> {
        self.utc_download
    }

    /// Estimated time at which the last segment would be played
    pub fn termination_utc(&self) -> DateTime<Utc> {
        self.utc_termination
    }

    /// Text as it was loaded
    pub fn original_loaded_content(&self) -> &[String] {
        &self.loaded_content
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&MediaSegment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> impl Iterator<Item = &MediaSegment> {
        self.segments.iter()
    }

    pub fn play_list_count(&self) -> usize {
        self.playlists.len()
    }

    pub fn play_list(&self, index: usize) -> Option<&MediaPlayList> {
        self.playlists.get(index)
    }

    pub fn play_lists(&self) -> impl Iterator<Item = &MediaPlayList> {
        self.playlists.iter()
    }

    pub fn alt_play_list_count(&self) -> usize {
        self.alt_playlists.len()
    }

    pub fn alt_play_list(&self, index: usize) -> Option<&AltPlayList> {
        self.alt_playlists.get(index)
    }

    pub fn alt_play_lists(&self) -> impl Iterator<Item = &AltPlayList> {
        self.alt_playlists.iter()
    }

    pub fn custom_tags(&self) -> &[String] {
        &self.extra_tags
    }

    pub fn set_auto_save_directory(&mut self, dir: Option<PathBuf>) {
        self.auto_save_dir = dir;
    }

    // ========================================================================
    // Playlist type
    // ========================================================================

    /// Set the playlist type.
    ///
    /// Without `forced`, the type can only be set when unknown, unchanged,
    /// or when a live media playlist is refined as VoD or event. Any other
    /// change is a conflict which invalidates the playlist.
    pub fn set_type(&mut self, requested: PlayListType, forced: bool) -> Result<()> {
        let current = self.playlist_type;
        if forced
            || current == requested
            || current == PlayListType::Unknown
            || (current == PlayListType::Live
                && matches!(requested, PlayListType::Vod | PlayListType::Event))
        {
            self.playlist_type = requested;
            Ok(())
        } else {
            Err(self.invalidate(Error::TypeConflict {
                current: current.to_string(),
                requested: requested.to_string(),
            }))
        }
    }

    /// Make sure this is a media playlist, live until told otherwise
    pub fn set_type_media(&mut self) -> Result<()> {
        match self.playlist_type {
            PlayListType::Unknown => {
                self.playlist_type = PlayListType::Live;
                Ok(())
            }
            PlayListType::Vod | PlayListType::Event | PlayListType::Live => Ok(()),
            PlayListType::Master => Err(self.invalidate(Error::TypeConflict {
                current: "master".to_string(),
                requested: "media".to_string(),
            })),
        }
    }

    /// Log an error and mark the playlist as invalid
    fn invalidate(&mut self, err: Error) -> Error {
        error!("{}", err);
        self.valid = false;
        err
    }

    // ========================================================================
    // Origin
    // ========================================================================

    /// Make the playlist URL based, all references are resolved again
    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let url = Url::parse(url).map_err(|e| {
            error!("invalid URL: {}", url);
            Error::from(e)
        })?;
        self.set_origin(Origin::Url(url));
        Ok(())
    }

    /// Make the playlist file based, all references are resolved again
    pub fn set_file(&mut self, path: impl AsRef<Path>) {
        self.set_origin(Origin::file(path.as_ref().to_string_lossy().into_owned()));
    }

    fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
        for seg in self.segments.iter_mut() {
            self.origin.resolve_into(&mut seg.reference);
        }
        for pl in self.playlists.iter_mut() {
            self.origin.resolve_into(&mut pl.reference);
        }
        for pl in self.alt_playlists.iter_mut() {
            if !pl.reference.is_empty() {
                self.origin.resolve_into(&mut pl.reference);
            }
        }
    }

    /// URI relative to the playlist directory when it designates a file in it
    fn relative_to_origin(&self, uri: &str) -> String {
        match &self.origin {
            Origin::File { base, .. } if !base.is_empty() => {
                uri.strip_prefix(base.as_str()).unwrap_or(uri).to_string()
            }
            _ => uri.to_string(),
        }
    }

    // ========================================================================
    // Content editing
    // ========================================================================

    /// Set the target duration, media playlists only
    pub fn set_target_duration(&mut self, duration: Duration) -> Result<()> {
        self.set_type_media()?;
        self.target_duration = duration;
        Ok(())
    }

    /// Set the sequence number of the first segment, media playlists only
    pub fn set_media_sequence(&mut self, sequence: u64) -> Result<()> {
        self.set_type_media()?;
        self.media_sequence = sequence;
        Ok(())
    }

    /// Set the end of list marker, media playlists only
    pub fn set_end_list(&mut self, end: bool) -> Result<()> {
        self.set_type_media()?;
        self.end_list = end;
        Ok(())
    }

    /// Append a media segment, the playlist becomes a media playlist
    pub fn add_segment(&mut self, mut seg: MediaSegment) -> Result<()> {
        if seg.reference.is_empty() {
            error!("empty media segment URI");
            return Err(Error::EmptyUri("media segment"));
        }
        self.set_type_media()?;
        seg.reference.relative_uri = self.relative_to_origin(&seg.reference.relative_uri);
        self.origin.resolve_into(&mut seg.reference);
        self.segments.push_back(seg);
        Ok(())
    }

    /// Remove the first segment, the media sequence moves forward
    pub fn pop_first_segment(&mut self) -> Option<MediaSegment> {
        let seg = self.segments.pop_front()?;
        self.media_sequence = self.media_sequence.saturating_add(1);
        Some(seg)
    }

    /// Append a variant, the playlist becomes a master playlist
    pub fn add_play_list(&mut self, mut pl: MediaPlayList) -> Result<()> {
        if pl.reference.is_empty() {
            error!("empty media playlist URI");
            return Err(Error::EmptyUri("media playlist"));
        }
        self.set_type(PlayListType::Master, false)?;
        pl.reference.relative_uri = self.relative_to_origin(&pl.reference.relative_uri);
        self.origin.resolve_into(&mut pl.reference);
        self.playlists.push_back(pl);
        Ok(())
    }

    pub fn delete_play_list(&mut self, index: usize) {
        if index < self.playlists.len() {
            self.playlists.remove(index);
        }
    }

    /// Append an alternative rendition, the playlist becomes a master playlist
    pub fn add_alt_play_list(&mut self, mut pl: AltPlayList) -> Result<()> {
        self.set_type(PlayListType::Master, false)?;
        if !pl.reference.is_empty() {
            pl.reference.relative_uri = self.relative_to_origin(&pl.reference.relative_uri);
            self.origin.resolve_into(&mut pl.reference);
        }
        self.alt_playlists.push_back(pl);
        Ok(())
    }

    pub fn delete_alt_play_list(&mut self, index: usize) {
        if index < self.alt_playlists.len() {
            self.alt_playlists.remove(index);
        }
    }

    /// Add an application tag line, with or without its leading `#`
    pub fn add_custom_tag(&mut self, tag: impl Into<String>) {
        self.extra_tags.push(tag.into());
    }

    pub fn clear_custom_tags(&mut self) {
        self.extra_tags.clear();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Index of the first variant within all bounds, zero meaning no bound.
    ///
    /// A maximum bound also excludes variants where the value is unknown.
    pub fn select_play_list(
        &self,
        min_bitrate: BitRate,
        max_bitrate: BitRate,
        min_width: u32,
        max_width: u32,
        min_height: u32,
        max_height: u32,
    ) -> Option<usize> {
        self.playlists.iter().position(|pl| {
            (min_bitrate.is_zero() || pl.bandwidth >= min_bitrate)
                && (max_bitrate.is_zero() || (!pl.bandwidth.is_zero() && pl.bandwidth <= max_bitrate))
                && (min_width == 0 || pl.width >= min_width)
                && (max_width == 0 || (pl.width > 0 && pl.width <= max_width))
                && (min_height == 0 || pl.height >= min_height)
                && (max_height == 0 || (pl.height > 0 && pl.height <= max_height))
        })
    }

    pub fn select_play_list_lowest_bitrate(&self) -> Option<usize> {
        self.select_by(u64::MAX, |pl| pl.bandwidth.bits_per_second(), |val, best| val < best)
    }

    pub fn select_play_list_highest_bitrate(&self) -> Option<usize> {
        self.select_by(0, |pl| pl.bandwidth.bits_per_second(), |val, best| val > best)
    }

    pub fn select_play_list_lowest_resolution(&self) -> Option<usize> {
        self.select_by(u64::MAX, |pl| pl.resolution().area(), |val, best| val < best)
    }

    pub fn select_play_list_highest_resolution(&self) -> Option<usize> {
        self.select_by(0, |pl| pl.resolution().area(), |val, best| val > best)
    }

    /// Linear scan keeping the first variant which strictly improves `best`
    fn select_by(
        &self,
        initial: u64,
        value: impl Fn(&MediaPlayList) -> u64,
        better: impl Fn(u64, u64) -> bool,
    ) -> Option<usize> {
        let mut result = None;
        let mut best = initial;
        for (index, pl) in self.playlists.iter().enumerate() {
            let val = value(pl);
            if better(val, best) {
                result = Some(index);
                best = val;
            }
        }
        result
    }

    /// Index of the first alternative rendition matching all non-empty criteria
    pub fn select_alt_play_list(
        &self,
        media_type: &str,
        name: &str,
        group_id: &str,
        language: &str,
    ) -> Option<usize> {
        self.alt_playlists.iter().position(|pl| {
            (media_type.is_empty() || similar(&pl.media_type, media_type))
                && (name.is_empty() || similar(&pl.name, name))
                && (group_id.is_empty() || similar(&pl.group_id, group_id))
                && (language.is_empty() || similar(&pl.language, language))
        })
    }
}

impl std::fmt::Display for PlayList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.origin.base_name();
        if !name.is_empty() {
            write!(f, "{}, ", name)?;
        }
        if !self.valid {
            write!(f, "invalid playlist")?;
        } else if self.is_media() {
            write!(f, "media playlist")?;
        } else if self.is_master() {
            write!(f, "master playlist")?;
        } else {
            write!(f, "unknown playlist")?;
        }
        write!(f, "{}", if self.is_updatable() { ", updatable (live)" } else { ", static" })?;
        if self.is_media() {
            write!(f, ", {} segments", self.segments.len())?;
        } else if self.is_master() {
            write!(f, ", {} media playlists", self.playlists.len())?;
            if !self.alt_playlists.is_empty() {
                write!(f, ", {} alternative rendition playlists", self.alt_playlists.len())?;
            }
        }
        if !self.target_duration.is_zero() {
            write!(f, ", {} s/segment", self.target_duration.as_secs())?;
        }
        Ok(())
    }
}
