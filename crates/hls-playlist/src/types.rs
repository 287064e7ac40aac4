//! Core value types shared by the playlist model

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul};
use std::str::FromStr;

/// Kind of HLS playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayListType {
    /// Not classified yet
    #[default]
    Unknown,
    /// Multivariant playlist referencing media playlists
    Master,
    /// Media playlist with `EXT-X-PLAYLIST-TYPE:VOD`
    Vod,
    /// Media playlist with `EXT-X-PLAYLIST-TYPE:EVENT`
    Event,
    /// Media playlist without playlist type tag
    Live,
}

impl PlayListType {
    /// Returns true for the three media playlist kinds
    pub fn is_media(&self) -> bool {
        matches!(self, PlayListType::Vod | PlayListType::Event | PlayListType::Live)
    }

    /// Returns true if the content of such a playlist may change over time
    pub fn is_live(&self) -> bool {
        matches!(self, PlayListType::Event | PlayListType::Live)
    }
}

impl std::fmt::Display for PlayListType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayListType::Unknown => write!(f, "unknown"),
            PlayListType::Master => write!(f, "master"),
            PlayListType::Vod => write!(f, "VoD"),
            PlayListType::Event => write!(f, "event"),
            PlayListType::Live => write!(f, "live"),
        }
    }
}

/// Bit rate in bits per second, zero meaning unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitRate(pub u64);

impl BitRate {
    pub const ZERO: BitRate = BitRate(0);
    pub const MAX: BitRate = BitRate(u64::MAX);

    pub fn new(bits_per_second: u64) -> Self {
        Self(bits_per_second)
    }

    pub fn bits_per_second(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Mul<u64> for BitRate {
    type Output = BitRate;

    fn mul(self, rhs: u64) -> BitRate {
        BitRate(self.0.saturating_mul(rhs))
    }
}

impl Div<u64> for BitRate {
    type Output = BitRate;

    fn div(self, rhs: u64) -> BitRate {
        BitRate(self.0.checked_div(rhs).unwrap_or(0))
    }
}

impl Add for BitRate {
    type Output = BitRate;

    fn add(self, rhs: BitRate) -> BitRate {
        BitRate(self.0.saturating_add(rhs.0))
    }
}

impl From<u64> for BitRate {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for BitRate {
    type Err = std::num::ParseIntError;

    /// Parses a decimal integer, tolerating surrounding blanks and a
    /// fractional part which is truncated.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let integral = match s.split_once('.') {
            Some((left, right)) if right.chars().all(|c| c.is_ascii_digit()) => left,
            _ => s,
        };
        integral.parse::<u64>().map(BitRate)
    }
}

impl std::fmt::Display for BitRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} b/s", self.0)
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels, used to order variants by resolution
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0 => "unknown",
            1..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid resolution: {}", s))?;
        let width = w.trim().parse().map_err(|_| format!("invalid width: {}", w))?;
        let height = h.trim().parse().map_err(|_| format!("invalid height: {}", h))?;
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
