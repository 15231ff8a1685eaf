//! Asset references carried by overlay operations.
//!
//! An operation names its overlay media as a filesystem path, a `data:` URL
//! with a base64 payload, or an `http(s)` URL. Classification happens once,
//! when the plan is parsed; turning the reference into a local file is the
//! resolver's job.

use std::fmt;
use std::path::PathBuf;

/// What kind of media an asset is expected to hold. Decides the fallback extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Image,
    Audio,
    Video,
}

impl AssetRole {
    #[must_use]
    pub fn default_extension(self) -> &'static str {
        match self {
            AssetRole::Image => "png",
            AssetRole::Audio => "mp3",
            AssetRole::Video => "mp4",
        }
    }
}

/// A parameter value naming overlay media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    /// Used in place; never owned or deleted by the pipeline.
    LocalPath(PathBuf),
    /// `data:<media_type>/<subtype>;base64,<payload>`; the payload is kept encoded.
    Embedded {
        media_type: String,
        subtype: String,
        payload: String,
    },
    /// `http://` or `https://` URL.
    Remote(String),
}

impl AssetReference {
    /// Classifies a parameter value. Fails on empty values and malformed `data:` URLs.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("asset reference is empty".to_string());
        }

        if let Some(rest) = value.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| "data URL has no payload".to_string())?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| "only base64 data URLs are supported".to_string())?;
            let (media_type, subtype) = mime
                .split_once('/')
                .filter(|(t, s)| !t.is_empty() && !s.is_empty())
                .ok_or_else(|| format!("invalid media type '{mime}' in data URL"))?;
            return Ok(AssetReference::Embedded {
                media_type: media_type.to_ascii_lowercase(),
                subtype: subtype.to_ascii_lowercase(),
                payload: payload.to_string(),
            });
        }

        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(AssetReference::Remote(value.to_string()));
        }

        Ok(AssetReference::LocalPath(PathBuf::from(value)))
    }

    /// The reference as it appears in plan JSON.
    #[must_use]
    pub fn to_param(&self) -> String {
        match self {
            AssetReference::LocalPath(path) => path.to_string_lossy().into_owned(),
            AssetReference::Embedded {
                media_type,
                subtype,
                payload,
            } => format!("data:{media_type}/{subtype};base64,{payload}"),
            AssetReference::Remote(url) => url.clone(),
        }
    }

    /// File extension for a local copy of this asset.
    #[must_use]
    pub fn extension(&self, role: AssetRole) -> String {
        let candidate = match self {
            AssetReference::LocalPath(path) => path
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
            AssetReference::Embedded { subtype, .. } => subtype
                .split(['+', ';'])
                .next()
                .map(str::to_string),
            AssetReference::Remote(url) => extension_from_url(url),
        };
        candidate
            .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| role.default_extension().to_string())
    }
}

/// Extension of the last path segment of a URL, ignoring query and fragment.
fn extension_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let (_, path) = after_scheme.split_once('/')?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    Some(ext.to_string())
}

impl fmt::Display for AssetReference {
    /// Short form for logs; embedded payloads are summarised, not printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetReference::LocalPath(path) => write!(f, "{}", path.display()),
            AssetReference::Embedded {
                media_type,
                subtype,
                payload,
            } => write!(f, "embedded {media_type}/{subtype} ({} base64 chars)", payload.len()),
            AssetReference::Remote(url) => write!(f, "{url}"),
        }
    }
}
