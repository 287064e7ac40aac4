//! Resolution of URIs found in a playlist
//!
//! URIs inside a playlist are relative to the playlist itself. A playlist
//! downloaded from the web resolves them with the usual URL joining rules,
//! a playlist read from a file resolves them against its directory.

use crate::media::MediaReference;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Where a playlist was loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// Text supplied by the caller, no base to resolve against
    #[default]
    None,
    /// Downloaded playlist, final URL after redirections
    Url(Url),
    /// Playlist file, with its directory including a trailing separator
    File { path: String, base: String },
}

impl Origin {
    /// Origin of a playlist file
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let base = match Path::new(&path).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR)
            }
            _ => String::new(),
        };
        Origin::File { path, base }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Origin::Url(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Origin::None)
    }

    /// Original URL or file name, empty when unknown
    pub fn as_string(&self) -> String {
        match self {
            Origin::None => String::new(),
            Origin::Url(url) => url.to_string(),
            Origin::File { path, .. } => path.clone(),
        }
    }

    /// Last component of the URL path or file name
    pub fn base_name(&self) -> String {
        match self {
            Origin::None => String::new(),
            Origin::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
            Origin::File { path, .. } => Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Build the location of a resource referenced by `uri`
    pub fn resolve(&self, uri: &str) -> MediaReference {
        let mut reference = MediaReference { relative_uri: uri.to_string(), ..Default::default() };
        self.resolve_into(&mut reference);
        reference
    }

    /// Recompute path and URL of a reference from its relative URI
    pub fn resolve_into(&self, reference: &mut MediaReference) {
        let uri = reference.relative_uri.as_str();
        reference.url = None;
        reference.file_path = match self {
            Origin::Url(base) => match base.join(uri) {
                Ok(url) => {
                    let path = url.path().to_string();
                    reference.url = Some(url);
                    path
                }
                Err(e) => {
                    debug!("cannot resolve {} against {}: {}", uri, base, e);
                    uri.to_string()
                }
            },
            Origin::File { .. } if uri.starts_with('/') => uri.to_string(),
            Origin::File { base, .. } => format!("{}{}", base, uri),
            Origin::None => uri.to_string(),
        };
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
