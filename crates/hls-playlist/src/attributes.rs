//! Attribute lists of HLS tags
//!
//! Tags such as `#EXT-X-STREAM-INF` or `#EXT-X-MEDIA` carry a comma
//! separated list of `NAME=value` pairs where values are either bare
//! tokens or quoted strings. Typed accessors never fail loudly: a value
//! which cannot be converted is reported as absent.

use crate::types::{BitRate, Resolution};
use std::collections::HashMap;
use std::str::FromStr;

/// Parsed attribute list of one tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagAttributes {
    map: HashMap<String, String>,
}

impl TagAttributes {
    /// Parse an attribute list. Duplicate names: the last one wins.
    pub fn parse(params: &str) -> Self {
        let chars: Vec<char> = params.chars().collect();
        let len = chars.len();
        let mut map = HashMap::new();
        let mut pos = 0;

        while pos < len {
            // Attribute name, up to '=' or ','.
            let start = pos;
            while pos < len && chars[pos] != '=' && chars[pos] != ',' {
                pos += 1;
            }
            let name: String = chars[start..pos].iter().collect::<String>().trim().to_string();

            // Optional value, commas inside quotes do not terminate it.
            let mut value = String::new();
            if pos < len && chars[pos] == '=' {
                pos += 1;
                let start = pos;
                let mut quoted = false;
                while pos < len && (quoted || chars[pos] != ',') {
                    match chars[pos] {
                        '"' => quoted = !quoted,
                        '\\' if pos + 1 < len => pos += 1,
                        _ => {}
                    }
                    pos += 1;
                }
                value = unquote(chars[start..pos].iter().collect::<String>().trim());
            }

            if !name.is_empty() {
                map.insert(name, value);
            }

            // Skip the separating comma.
            pos += 1;
        }

        Self { map }
    }

    /// Returns true when the attribute is present
    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Attribute value, empty when absent
    pub fn value(&self, name: &str) -> &str {
        self.map.get(name).map(String::as_str).unwrap_or("")
    }

    /// Integer value of an attribute
    pub fn integer<T: FromStr>(&self, name: &str) -> Option<T> {
        self.map.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Decimal value scaled by 1000, see [`to_milli_value`]
    pub fn milli_value(&self, name: &str) -> Option<u64> {
        self.map.get(name).and_then(|v| to_milli_value(v))
    }

    /// Bit rate value of an attribute
    pub fn bitrate(&self, name: &str) -> Option<BitRate> {
        self.map.get(name).and_then(|v| v.parse().ok())
    }

    /// `WIDTHxHEIGHT` value of an attribute
    pub fn resolution(&self, name: &str) -> Option<Resolution> {
        self.map.get(name).and_then(|v| v.parse().ok())
    }

    /// True when an enumerated attribute is `YES`
    pub fn yes(&self, name: &str) -> bool {
        similar(self.value(name), "YES")
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Convert a decimal string to a value in thousandths.
///
/// `"9.009"` gives 9009, `"29.97"` gives 29970 and `"10"` gives 10000.
/// Decimals beyond the third are truncated. Returns `None` when the
/// integral part is not an integer or the decimals are not digits.
pub fn to_milli_value(text: &str) -> Option<u64> {
    let text = text.trim();
    let (left, right) = match text.split_once('.') {
        Some((left, right)) => (left, right),
        None => (text, ""),
    };
    let integral: u64 = left.trim().parse().ok()?;
    if !right.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut decimals: String = right.chars().take(3).collect();
    while decimals.len() < 3 {
        decimals.push('0');
    }
    let fraction: u64 = decimals.parse().ok()?;
    integral.checked_mul(1000)?.checked_add(fraction)
}

/// Locale-insensitive comparison ignoring case and blanks
pub fn similar(a: &str, b: &str) -> bool {
    let mut left = a.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase);
    let mut right = b.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}
