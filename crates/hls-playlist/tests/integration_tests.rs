//! Integration tests for hls-playlist

use hls_playlist::{
    AltPlayList, BitRate, Error, LoadOptions, MediaPlayList, MediaSegment, PlayList, PlayListType,
    Resolution, TagAttributes,
};
use std::time::Duration;

fn load(text: &str) -> PlayList {
    let mut pl = PlayList::new();
    let _ = pl.load_text(text, &LoadOptions::default());
    pl
}

fn live_window(first: u64, count: u64) -> String {
    let mut text = format!("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:{}\n", first);
    for seq in first..first + count {
        text.push_str(&format!("#EXTINF:6.006,\nchunk_{}.ts\n", seq));
    }
    text
}

fn segment_names(pl: &PlayList) -> Vec<String> {
    pl.segments().map(|s| s.reference.relative_uri.clone()).collect()
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_vod_media_playlist() {
    let pl = load(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:5\n#EXTINF:9.009,\nseg5.ts\n#EXT-X-ENDLIST\n",
    );
    assert!(pl.is_valid());
    assert_eq!(pl.version(), 3);
    assert_eq!(pl.target_duration(), Duration::from_secs(10));
    assert_eq!(pl.media_sequence(), 5);
    assert_eq!(pl.segment_count(), 1);
    assert_eq!(pl.segment(0).unwrap().duration, Duration::from_millis(9009));
    assert_eq!(pl.segment(0).unwrap().reference.relative_uri, "seg5.ts");
    assert!(pl.end_list());
}

#[test]
fn test_missing_header_is_fatal() {
    let mut pl = PlayList::new();
    let result = pl.load_text("#EXT-X-TARGETDURATION:10\n#EXTINF:9.009,\nseg5.ts\n", &LoadOptions::default());
    assert!(matches!(result, Err(Error::MissingHeader)));
    assert!(!pl.is_valid());
}

#[test]
fn test_master_playlist_selection() {
    let pl = load(
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=640x360\nlow.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2560000,RESOLUTION=1280x720\nhigh.m3u8\n",
    );
    assert!(pl.is_master());
    assert_eq!(pl.play_list_count(), 2);
    assert_eq!(pl.select_play_list_highest_bitrate(), Some(1));
    assert_eq!(pl.select_play_list_lowest_bitrate(), Some(0));
    assert_eq!(pl.play_list(1).unwrap().resolution(), Resolution::new(1280, 720));
}

#[test]
fn test_media_attributes() {
    let attr = TagAttributes::parse(r#"TYPE=AUDIO,GROUP-ID="aac",NAME="English",DEFAULT=YES"#);
    assert_eq!(attr.value("TYPE"), "AUDIO");
    assert_eq!(attr.value("GROUP-ID"), "aac");
    assert_eq!(attr.value("NAME"), "English");
    assert!(attr.yes("DEFAULT"));

    let pl = load("#EXTM3U\n#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English\",DEFAULT=YES\n");
    let alt = pl.alt_play_list(0).unwrap();
    assert_eq!(alt.media_type, "AUDIO");
    assert_eq!(alt.group_id, "aac");
    assert_eq!(alt.name, "English");
    assert!(alt.is_default);
}

#[test]
fn test_full_master_playlist() {
    let pl = load(concat!(
        "#EXTM3U\n",
        "#EXT-X-VERSION:6\n",
        "#EXT-X-INDEPENDENT-SEGMENTS\n",
        "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"English\",LANGUAGE=\"en\",DEFAULT=YES,AUTOSELECT=YES,URI=\"audio/en/index.m3u8\"\n",
        "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"Deutsch\",LANGUAGE=\"de\",AUTOSELECT=YES,URI=\"audio/de/index.m3u8\"\n",
        "#EXT-X-MEDIA:TYPE=CLOSED-CAPTIONS,GROUP-ID=\"cc\",NAME=\"CC1\",INSTREAM-ID=\"CC1\"\n",
        "#EXT-X-STREAM-INF:BANDWIDTH=800000,AVERAGE-BANDWIDTH=700000,RESOLUTION=640x360,FRAME-RATE=25.000,AUDIO=\"aud\",CLOSED-CAPTIONS=\"cc\"\n",
        "360p/index.m3u8\n",
        "#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,FRAME-RATE=50.000,AUDIO=\"aud\",CLOSED-CAPTIONS=\"cc\"\n",
        "1080p/index.m3u8\n",
        "#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=100000,URI=\"iframes.m3u8\"\n",
    ));
    assert!(pl.is_valid());
    assert_eq!(pl.version(), 6);
    assert_eq!(pl.play_list_count(), 2);
    assert_eq!(pl.alt_play_list_count(), 3);
    assert_eq!(pl.select_alt_play_list("audio", "", "", "de"), Some(1));
    assert_eq!(pl.select_alt_play_list("CLOSED-CAPTIONS", "", "cc", ""), Some(2));
    assert_eq!(pl.select_play_list_highest_resolution(), Some(1));

    let hd = pl.play_list(1).unwrap();
    assert_eq!(hd.frame_rate, 50_000);
    assert_eq!(hd.audio, "aud");
    assert_eq!(pl.play_list(0).unwrap().average_bandwidth, BitRate(700_000));
}

// =============================================================================
// Live Reload Tests
// =============================================================================

#[test]
fn test_live_reload_merges_new_segments() {
    let mut pl = load(&live_window(10, 5));
    assert!(pl.is_updatable());
    pl.reload_text(&live_window(12, 5), &LoadOptions::default()).unwrap();
    assert_eq!(pl.media_sequence(), 10);
    assert_eq!(
        segment_names(&pl),
        (10..=16).map(|seq| format!("chunk_{}.ts", seq)).collect::<Vec<_>>()
    );
}

#[test]
fn test_live_reload_idempotent() {
    let mut pl = load(&live_window(10, 5));
    pl.reload_text(&live_window(12, 5), &LoadOptions::default()).unwrap();
    let before = segment_names(&pl);
    pl.reload_text(&live_window(12, 5), &LoadOptions::default()).unwrap();
    assert_eq!(segment_names(&pl), before);
}

#[test]
fn test_live_reload_end_is_monotonic() {
    let mut pl = load(&live_window(0, 4));
    let mut last_end = pl.media_sequence() + pl.segment_count() as u64;
    for (first, count) in [(1, 4), (1, 3), (3, 4), (6, 2), (5, 5)] {
        pl.reload_text(&live_window(first, count), &LoadOptions::default()).unwrap();
        let end = pl.media_sequence() + pl.segment_count() as u64;
        assert!(end >= last_end, "end went from {} to {}", last_end, end);
        last_end = end;
    }
    assert_eq!(last_end, 10);
    assert_eq!(pl.media_sequence(), 0);
}

#[test]
fn test_live_reload_with_player_consumption() {
    let mut pl = load(&live_window(100, 3));
    let mut played = Vec::new();
    for (first, count) in [(101, 3), (102, 3), (103, 3)] {
        while let Some(seg) = pl.pop_first_segment() {
            played.push(seg.reference.relative_uri);
        }
        pl.reload_text(&live_window(first, count), &LoadOptions::default()).unwrap();
    }
    while let Some(seg) = pl.pop_first_segment() {
        played.push(seg.reference.relative_uri);
    }
    assert_eq!(played, (100..106).map(|seq| format!("chunk_{}.ts", seq)).collect::<Vec<_>>());
}

// =============================================================================
// Type Invariant Tests
// =============================================================================

#[test]
fn test_playlist_never_both_master_and_media() {
    let documents = [
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\na.m3u8\n#EXT-X-TARGETDURATION:3\n",
        "#EXTM3U\n#EXT-X-TARGETDURATION:3\n#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"a\",NAME=\"a\"\n",
        "#EXTM3U\nseg.ts\nvariant.m3u8\n",
    ];
    for text in documents {
        let pl = load(text);
        assert!(!(pl.is_master() && pl.is_media()));
        assert!(!pl.is_valid(), "conflicting document accepted: {:?}", text);
    }
}

#[test]
fn test_editing_respects_type() {
    let mut pl = PlayList::new();
    pl.add_play_list(MediaPlayList::new("a.m3u8", BitRate(1000))).unwrap();
    assert!(pl.add_segment(MediaSegment::new("a.ts", Duration::from_secs(1))).is_err());
    assert!(pl.is_master());

    let mut media = PlayList::new();
    media.add_segment(MediaSegment::new("a.ts", Duration::from_secs(1))).unwrap();
    assert!(media.add_alt_play_list(AltPlayList::default()).is_err());
    assert_eq!(media.playlist_type(), PlayListType::Live);
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_media_round_trip() {
    let mut text = live_window(42, 4);
    text.push_str("#EXT-X-ENDLIST\n");
    let pl = load(&text);
    let regenerated = pl.text_content().unwrap();

    let again = load(&regenerated);
    assert!(again.is_valid());
    assert_eq!(again.segment_count(), pl.segment_count());
    assert_eq!(again.media_sequence(), 42);
    assert_eq!(again.target_duration(), pl.target_duration());
    assert!(again.end_list());
}

#[test]
fn test_master_round_trip() {
    let pl = load(concat!(
        "#EXTM3U\n#EXT-X-VERSION:4\n",
        "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"Francais\",LANGUAGE=\"fr\",FORCED=YES,URI=\"subs/fr.m3u8\"\n",
        "#EXT-X-STREAM-INF:BANDWIDTH=1500000,RESOLUTION=960x540,CODECS=\"avc1.4d401f\",SUBTITLES=\"subs\",CLOSED-CAPTIONS=NONE\n",
        "540p.m3u8\n",
    ));
    let again = load(&pl.text_content().unwrap());
    assert!(again.is_master());
    assert_eq!(again.play_list(0).unwrap(), pl.play_list(0).unwrap());
    assert_eq!(again.alt_play_list(0).unwrap(), pl.alt_play_list(0).unwrap());
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_build_save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("event.m3u8");

    let mut pl = PlayList::new();
    pl.reset(PlayListType::Event, &path, 3);
    pl.set_target_duration(Duration::from_secs(2)).unwrap();
    for i in 0..3 {
        pl.add_segment(MediaSegment::new(format!("part{}.ts", i), Duration::from_millis(1_960))).unwrap();
    }
    pl.save_file(None).unwrap();

    let mut loaded = PlayList::new();
    loaded.load_file(&path, &LoadOptions::strict()).unwrap();
    assert_eq!(loaded.playlist_type(), PlayListType::Event);
    assert_eq!(loaded.segment_count(), 3);
    assert_eq!(loaded.segment(2).unwrap().duration, Duration::from_millis(1_960));
    assert_eq!(loaded.segment(2).unwrap().reference.path_name(), dir.path().join("part2.ts").to_string_lossy());
    assert!(loaded.is_updatable());
}
