//! Loading playlists and reloading live ones
//!
//! A live playlist is a sliding window over an ever growing list of
//! segments. Reloading fetches a fresh snapshot and merges the segments
//! which are not yet known, using the media sequence numbers to line up
//! both windows.

use super::PlayList;
use crate::{
    config::LoadOptions,
    fetch::{load_lines, save_lines, split_lines, Fetcher},
    media::ends_with_ignore_case,
    resolver::Origin,
    Error, Result,
};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// MIME types accepted for HLS playlists in strict mode
const PLAYLIST_MIME_TYPES: &[&str] = &["application/vnd.apple.mpegurl", "application/mpegurl", "audio/mpegurl"];

fn has_playlist_extension(name: &str) -> bool {
    ends_with_ignore_case(name, ".m3u8") || ends_with_ignore_case(name, ".m3u")
}

impl PlayList {
    /// Load the playlist from its text content
    pub fn load_text(&mut self, text: &str, options: &LoadOptions) -> Result<()> {
        self.clear();
        self.playlist_type = options.expected_type;
        self.loaded_content = split_lines(text);
        self.parse(options.strict)
    }

    /// Load the playlist from a file
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_file(&mut self, path: impl AsRef<Path>, options: &LoadOptions) -> Result<()> {
        let path = path.as_ref();
        self.clear();
        self.set_file(path);
        self.playlist_type = options.expected_type;

        let name = path.to_string_lossy();
        if options.strict && !has_playlist_extension(&name) {
            error!("invalid file name extension for HLS playlist in {}", name);
            return Err(Error::InvalidFileName(name.into_owned()));
        }

        self.loaded_content = load_lines(path).map_err(|e| {
            error!("error loading {}: {}", name, e);
            e
        })?;
        self.auto_save();
        self.parse(options.strict)
    }

    /// Download the playlist from a URL
    #[instrument(skip(self, options, fetcher))]
    pub fn load_url(&mut self, url: &str, options: &LoadOptions, fetcher: &dyn Fetcher) -> Result<()> {
        let url = Url::parse(url).map_err(|e| {
            error!("invalid URL: {}", url);
            Error::from(e)
        })?;
        self.clear();
        self.origin = Origin::Url(url.clone());
        self.playlist_type = options.expected_type;

        debug!("downloading {}", url);
        let download = fetcher.download_text(&url, &options.fetch).map_err(|e| {
            error!("error downloading {}: {}", url, e);
            e
        })?;

        // Keep the final URL in case of redirections.
        self.origin = Origin::Url(download.final_url.clone());
        debug!("MIME type: {}", download.mime_type);

        // RFC 8216: the name ends in .m3u8 or .m3u, or the MIME type is an HLS one.
        if options.strict
            && !has_playlist_extension(download.final_url.path())
            && !PLAYLIST_MIME_TYPES.contains(&download.mime_type.as_str())
        {
            let err = Error::InvalidMimeType {
                mime: download.mime_type.clone(),
                url: download.final_url.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        self.loaded_content = split_lines(&download.text);
        self.auto_save();
        self.parse(options.strict)
    }

    /// Reload a live playlist from its origin and merge the new segments.
    ///
    /// Playlists which cannot change, or which have no origin, are left
    /// untouched and this is not an error.
    pub fn reload(&mut self, options: &LoadOptions, fetcher: &dyn Fetcher) -> Result<()> {
        if !self.is_updatable() || self.origin.is_none() {
            debug!("non-reloadable playlist: {}", self.origin);
            return Ok(());
        }

        let mut fresh = PlayList::new();
        let options = LoadOptions { expected_type: Default::default(), ..options.clone() };
        match &self.origin {
            Origin::Url(url) => fresh.load_url(url.as_str(), &options, fetcher)?,
            Origin::File { path, .. } => fresh.load_file(path, &options)?,
            Origin::None => return Ok(()),
        }

        self.merge(fresh);
        self.auto_save();
        Ok(())
    }

    /// Merge an updated version of a live playlist given as text
    pub fn reload_text(&mut self, text: &str, options: &LoadOptions) -> Result<()> {
        let mut fresh = PlayList::new();
        let options = LoadOptions { expected_type: Default::default(), ..options.clone() };
        fresh.load_text(text, &options)?;
        if !self.origin.is_none() {
            fresh.set_origin(self.origin.clone());
        }
        self.merge(fresh);
        Ok(())
    }

    /// Move the segments of `fresh` which follow the current ones
    fn merge(&mut self, mut fresh: PlayList) {
        debug!(
            "playlist media sequence: old: {}/{}, new: {}/{}",
            self.media_sequence,
            self.segments.len(),
            fresh.media_sequence,
            fresh.segments.len()
        );

        // Window ends may exceed the u64 range of media sequence numbers.
        let old_end = u128::from(self.media_sequence) + self.segments.len() as u128;
        let new_end = u128::from(fresh.media_sequence) + fresh.segments.len() as u128;
        if new_end <= old_end {
            debug!("no new segment in playlist");
            return;
        }

        self.playlist_type = fresh.playlist_type;
        self.version = fresh.version;
        self.target_duration = fresh.target_duration;
        self.end_list = fresh.end_list;
        self.utc_termination = fresh.utc_termination;
        self.loaded_content = std::mem::take(&mut fresh.loaded_content);

        if old_end < u128::from(fresh.media_sequence) {
            // Reloaded too late, the server already dropped segments we never saw.
            warn!(
                "missed {} HLS segments, dropping {} outdated segments",
                u128::from(fresh.media_sequence) - old_end,
                self.segments.len()
            );
            self.media_sequence = fresh.media_sequence;
            self.segments = std::mem::take(&mut fresh.segments);
        } else {
            // Below fresh.segments.len() since new_end > old_end.
            let first_new = (old_end - u128::from(fresh.media_sequence)) as usize;
            self.segments.extend(fresh.segments.drain(first_new..));
        }
    }

    /// Save the loaded text in the auto-save directory, errors are only logged
    pub(crate) fn auto_save(&self) -> bool {
        let Some(dir) = &self.auto_save_dir else {
            return true;
        };
        let base_name = self.origin.base_name();
        if base_name.is_empty() {
            return true;
        }
        let path = dir.join(base_name);
        info!("saving playlist to {}", path.display());
        match save_lines(&self.loaded_content, &path) {
            Ok(()) => true,
            Err(e) => {
                warn!("error saving playlist to {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Download, FetchConfig};
    use crate::types::PlayListType;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Serves queued responses in order, repeating the last one
    struct ScriptedFetcher {
        responses: RefCell<VecDeque<(String, String)>>,
        requests: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(responses: &[(&str, &str)]) -> Self {
            Self {
                responses: RefCell::new(
                    responses.iter().map(|(t, m)| (t.to_string(), m.to_string())).collect(),
                ),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn download_text(&self, url: &Url, _config: &FetchConfig) -> Result<Download> {
            self.requests.borrow_mut().push(url.to_string());
            let mut responses = self.responses.borrow_mut();
            let next = if responses.len() > 1 { responses.pop_front() } else { responses.front().cloned() };
            let (text, mime_type) = next.ok_or_else(|| Error::Download { url: url.to_string(), reason: "404 Not Found".into() })?;
            Ok(Download { text, final_url: url.clone(), mime_type })
        }
    }

    fn window(first: u64, count: u64) -> String {
        let mut text = format!("#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXT-X-MEDIA-SEQUENCE:{}\n", first);
        for i in 0..count {
            text.push_str(&format!("#EXTINF:4.000,\nseg{}.ts\n", first + i));
        }
        text
    }

    fn uris(pl: &PlayList) -> Vec<String> {
        pl.segments().map(|s| s.reference.relative_uri.clone()).collect()
    }

    #[test]
    fn test_reload_appends_only_new_segments() {
        let mut pl = PlayList::new();
        pl.load_text(&window(10, 5), &LoadOptions::default()).unwrap();
        pl.reload_text(&window(12, 5), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), 10);
        assert_eq!(
            uris(&pl),
            vec!["seg10.ts", "seg11.ts", "seg12.ts", "seg13.ts", "seg14.ts", "seg15.ts", "seg16.ts"]
        );
    }

    #[test]
    fn test_reload_without_new_segments_is_noop() {
        let mut pl = PlayList::new();
        pl.load_text(&window(10, 5), &LoadOptions::default()).unwrap();
        let termination = pl.termination_utc();
        pl.reload_text(&window(10, 5), &LoadOptions::default()).unwrap();
        pl.reload_text(&window(8, 6), &LoadOptions::default()).unwrap();
        assert_eq!(pl.segment_count(), 5);
        assert_eq!(pl.media_sequence(), 10);
        assert_eq!(pl.termination_utc(), termination);
    }

    #[test]
    fn test_reload_gap_replaces_window() {
        let mut pl = PlayList::new();
        pl.load_text(&window(10, 3), &LoadOptions::default()).unwrap();
        pl.reload_text(&window(20, 3), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), 20);
        assert_eq!(uris(&pl), vec!["seg20.ts", "seg21.ts", "seg22.ts"]);
    }

    #[test]
    fn test_reload_after_consuming_segments() {
        let mut pl = PlayList::new();
        pl.load_text(&window(10, 3), &LoadOptions::default()).unwrap();
        while pl.pop_first_segment().is_some() {}
        assert_eq!(pl.media_sequence(), 13);
        pl.reload_text(&window(11, 4), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), 13);
        assert_eq!(uris(&pl), vec!["seg13.ts", "seg14.ts"]);
    }

    #[test]
    fn test_reload_copies_end_list() {
        let mut pl = PlayList::new();
        pl.load_text(&window(0, 2), &LoadOptions::default()).unwrap();
        let mut last = window(0, 3);
        last.push_str("#EXT-X-ENDLIST\n");
        pl.reload_text(&last, &LoadOptions::default()).unwrap();
        assert!(pl.end_list());
        assert!(!pl.is_updatable());
        assert_eq!(pl.segment_count(), 3);
    }

    #[test]
    fn test_reload_near_last_media_sequence() {
        let last = u64::MAX;
        let mut pl = PlayList::new();
        pl.load_text(&window(last - 2, 2), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), last - 2);

        // Window ending past u64::MAX.
        pl.reload_text(&window(last - 1, 2), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), last - 2);
        assert_eq!(pl.segment_count(), 3);

        // Same end, nothing new.
        pl.reload_text(&window(last, 1), &LoadOptions::default()).unwrap();
        assert_eq!(pl.segment_count(), 3);

        // Older window is ignored.
        pl.reload_text(&window(last - 10, 2), &LoadOptions::default()).unwrap();
        assert_eq!(pl.segment_count(), 3);
        assert_eq!(pl.media_sequence(), last - 2);
    }

    #[test]
    fn test_reload_gap_at_last_media_sequence() {
        let mut pl = PlayList::new();
        pl.load_text(&window(5, 2), &LoadOptions::default()).unwrap();
        pl.reload_text(&window(u64::MAX, 1), &LoadOptions::default()).unwrap();
        assert_eq!(pl.media_sequence(), u64::MAX);
        assert_eq!(pl.segment_count(), 1);
    }

    #[test]
    fn test_reload_invalid_snapshot_keeps_state() {
        let mut pl = PlayList::new();
        pl.load_text(&window(0, 2), &LoadOptions::default()).unwrap();
        assert!(pl.reload_text("not a playlist", &LoadOptions::default()).is_err());
        assert_eq!(pl.segment_count(), 2);
        assert!(pl.is_valid());
    }

    #[test]
    fn test_load_url_resolves_against_final_url() {
        let fetcher = ScriptedFetcher::new(&[(&window(1, 2), "application/vnd.apple.mpegurl")]);
        let mut pl = PlayList::new();
        pl.load_url("https://cdn.example.com/live/index.m3u8", &LoadOptions::default(), &fetcher)
            .unwrap();
        assert_eq!(pl.url(), "https://cdn.example.com/live/index.m3u8");
        assert_eq!(pl.segment(0).unwrap().url_string(), "https://cdn.example.com/live/seg1.ts");
    }

    #[test]
    fn test_load_url_strict_mime_check() {
        let fetcher = ScriptedFetcher::new(&[(&window(1, 2), "text/html")]);
        let mut pl = PlayList::new();
        let result = pl.load_url("https://cdn.example.com/live/stream", &LoadOptions::strict(), &fetcher);
        assert!(matches!(result, Err(Error::InvalidMimeType { .. })));

        let fetcher = ScriptedFetcher::new(&[(&window(1, 2), "audio/mpegurl")]);
        assert!(pl.load_url("https://cdn.example.com/live/stream", &LoadOptions::strict(), &fetcher).is_ok());
    }

    #[test]
    fn test_load_url_invalid() {
        let fetcher = ScriptedFetcher::new(&[]);
        let mut pl = PlayList::new();
        assert!(matches!(
            pl.load_url("::not a url::", &LoadOptions::default(), &fetcher),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            pl.load_url("https://cdn.example.com/a.m3u8", &LoadOptions::default(), &fetcher),
            Err(Error::Download { .. })
        ));
        assert!(!pl.is_valid());
    }

    #[test]
    fn test_reload_from_url() {
        let fetcher = ScriptedFetcher::new(&[
            (&window(10, 5), "application/vnd.apple.mpegurl"),
            (&window(12, 5), "application/vnd.apple.mpegurl"),
        ]);
        let options = LoadOptions::default();
        let mut pl = PlayList::new();
        pl.load_url("https://cdn.example.com/live/index.m3u8", &options, &fetcher).unwrap();
        pl.reload(&options, &fetcher).unwrap();
        assert_eq!(pl.segment_count(), 7);
        assert_eq!(pl.segment(6).unwrap().url_string(), "https://cdn.example.com/live/seg16.ts");

        // Same snapshot served again.
        pl.reload(&options, &fetcher).unwrap();
        assert_eq!(pl.segment_count(), 7);
        assert_eq!(fetcher.requests.borrow().len(), 3);
    }

    #[test]
    fn test_reload_static_playlist_is_noop() {
        let fetcher = ScriptedFetcher::new(&[]);
        let mut pl = PlayList::new();
        let mut vod = window(0, 2);
        vod.push_str("#EXT-X-ENDLIST\n");
        pl.load_text(&vod, &LoadOptions::default()).unwrap();
        assert!(pl.reload(&LoadOptions::default(), &fetcher).is_ok());
        assert!(fetcher.requests.borrow().is_empty());

        // Live but loaded from text: no origin to reload from.
        pl.load_text(&window(0, 2), &LoadOptions::default()).unwrap();
        assert!(pl.reload(&LoadOptions::default(), &fetcher).is_ok());
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn test_load_file_and_auto_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.m3u8");
        std::fs::write(&path, window(3, 2)).unwrap();
        let save_dir = dir.path().join("saved");
        std::fs::create_dir(&save_dir).unwrap();

        let mut pl = PlayList::new();
        pl.set_auto_save_directory(Some(save_dir.clone()));
        pl.load_file(&path, &LoadOptions::strict()).unwrap();
        assert_eq!(pl.segment_count(), 2);
        assert_eq!(pl.segment(0).unwrap().reference.file_path, dir.path().join("seg3.ts").to_string_lossy());
        assert!(save_dir.join("live.m3u8").exists());

        std::fs::write(&path, window(4, 2)).unwrap();
        pl.reload(&LoadOptions::default(), &ScriptedFetcher::new(&[])).unwrap();
        assert_eq!(pl.segment_count(), 3);
        assert_eq!(pl.playlist_type(), PlayListType::Live);
    }

    #[test]
    fn test_load_file_strict_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, window(0, 1)).unwrap();
        let mut pl = PlayList::new();
        assert!(matches!(pl.load_file(&path, &LoadOptions::strict()), Err(Error::InvalidFileName(_))));
        assert!(pl.load_file(&path, &LoadOptions::default()).is_ok());
        assert!(matches!(
            pl.load_file(dir.path().join("missing.m3u8"), &LoadOptions::default()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_expected_type() {
        let mut pl = PlayList::new();
        let options = LoadOptions::default().with_type(PlayListType::Master);
        assert!(pl.load_text(&window(0, 1), &options).is_err());
        assert!(pl.is_master());
    }
}
