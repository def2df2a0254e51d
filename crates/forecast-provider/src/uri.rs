//! Resource URI parsing and classification.
//!
//! Accepted shapes, for the configured authority:
//! - `content://<authority>/weather` (collection)
//! - `content://<authority>/weather/<segment>` (directory)
//! - `content://<authority>/weather/<segment>/<id>` (single item)

use std::fmt;

use url::Url;

use crate::contract::{CONTENT_SCHEME, PATH_WEATHER};
use crate::error::{ProviderError, ProviderResult};

/// A parsed `content://` URI: authority plus non-empty path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    authority: String,
    segments: Vec<String>,
}

impl ResourceUri {
    /// Parse a `content://` URI.
    ///
    /// Query strings and fragments are dropped, as is a trailing slash.
    pub fn parse(raw: &str) -> ProviderResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|_| ProviderError::unsupported(raw))?;

        if url.scheme() != CONTENT_SCHEME {
            return Err(ProviderError::unsupported(raw));
        }

        let authority = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(ProviderError::unsupported(raw)),
        };

        let mut segments: Vec<String> = url
            .path_segments()
            .map(|parts| parts.map(str::to_string).collect())
            .unwrap_or_default();
        if segments.last().is_some_and(String::is_empty) {
            segments.pop();
        }
        if segments.iter().any(String::is_empty) {
            return Err(ProviderError::unsupported(raw));
        }

        Ok(Self {
            authority,
            segments,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when `self` equals `other` or is a path prefix of it.
    pub fn contains(&self, other: &ResourceUri) -> bool {
        self.authority == other.authority
            && self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", CONTENT_SCHEME, self.authority)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ResourceUri {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What a weather URI addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherResource {
    /// The whole table.
    Collection,
    /// A named sub-collection; filters like the collection.
    Directory { segment: String },
    /// One row, by identifier.
    Item { segment: String, id: i64 },
}

impl WeatherResource {
    /// Row identifier for item resources.
    pub fn item_id(&self) -> Option<i64> {
        match self {
            WeatherResource::Item { id, .. } => Some(*id),
            WeatherResource::Collection | WeatherResource::Directory { .. } => None,
        }
    }
}

/// Classifies URIs for one authority.
#[derive(Debug, Clone)]
pub struct UriRouter {
    authority: String,
}

impl UriRouter {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    /// Classify a parsed URI, failing with `UnsupportedResource` on any
    /// other authority or path shape.
    pub fn classify(&self, uri: &ResourceUri) -> ProviderResult<WeatherResource> {
        if uri.authority() != self.authority {
            return Err(ProviderError::unsupported(uri));
        }

        match uri.segments() {
            [root] if root == PATH_WEATHER => Ok(WeatherResource::Collection),
            [root, segment] if root == PATH_WEATHER => Ok(WeatherResource::Directory {
                segment: segment.clone(),
            }),
            [root, segment, id] if root == PATH_WEATHER => {
                let id = parse_row_id(id).ok_or_else(|| ProviderError::unsupported(uri))?;
                Ok(WeatherResource::Item {
                    segment: segment.clone(),
                    id,
                })
            }
            _ => Err(ProviderError::unsupported(uri)),
        }
    }

    /// Parse and classify in one step.
    pub fn route(&self, raw: &str) -> ProviderResult<(ResourceUri, WeatherResource)> {
        let uri = ResourceUri::parse(raw)?;
        let resource = self.classify(&uri)?;
        Ok((uri, resource))
    }
}

fn parse_row_id(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
