//! HLS playlist engine
//!
//! This crate loads, edits, reloads and regenerates HTTP Live Streaming
//! playlists (RFC 8216):
//! - Master playlists, with their variants and alternative renditions
//! - Media playlists, with their segments
//! - Live playlists, merged incrementally on each reload
//! - Variant selection by bitrate and resolution
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         hls-playlist                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │     Tag      │  │  Attribute   │  │     URI      │           │
//! │  │   Catalog    │  │    Lists     │  │   Resolver   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │  PlayList   │                              │
//! │                    │ parse/write │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │    Media     │  │   Loader    │  │   Fetcher    │            │
//! │  │  References  │  │  & Reload   │  │ (HTTP, file) │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use hls_playlist::{LoadOptions, PlayList};
//!
//! let mut pl = PlayList::new();
//! pl.load_text("#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4,\nseg0.ts\n", &LoadOptions::default())
//!     .unwrap();
//! assert!(pl.is_media());
//! assert_eq!(pl.segment_count(), 1);
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod playlist;
pub mod resolver;
pub mod tag;
pub mod types;

pub use attributes::TagAttributes;
pub use config::LoadOptions;
pub use error::{Error, Result};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{Download, FetchConfig, Fetcher};
pub use media::{AltPlayList, MediaPlayList, MediaReference, MediaSegment};
pub use playlist::PlayList;
pub use resolver::Origin;
pub use tag::{Tag, TagScope};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version, once at startup
pub fn init() {
    tracing::info!(version = VERSION, "hls-playlist initialized");
}
