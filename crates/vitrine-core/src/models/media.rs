use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Identity of one loaded image buffer.
///
/// Assigned when the bytes enter a draft and used by the owning form to
/// address the slot holding them (e.g. when the user removes a picture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(Uuid);

impl MediaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MediaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// Where the bytes of a slot came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum SourceRef {
    /// Asset picked by the user (photo-library identifier or file path)
    Asset(String),
    /// Image already stored remotely, identified by its public URL
    Remote(String),
}

impl SourceRef {
    pub fn asset(location: impl Into<String>) -> Self {
        SourceRef::Asset(location.into())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        SourceRef::Remote(url.into())
    }

    /// URL of a remote source, `None` for local assets.
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            SourceRef::Remote(url) => Some(url),
            SourceRef::Asset(_) => None,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            SourceRef::Asset(location) | SourceRef::Remote(location) => location,
        }
    }
}

impl Display for SourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SourceRef::Asset(location) => write!(f, "asset:{}", location),
            SourceRef::Remote(url) => write!(f, "remote:{}", url),
        }
    }
}

/// Raw, not yet transcoded image bytes together with their identity.
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    id: MediaId,
    data: Bytes,
}

impl ImageBuffer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            id: MediaId::new(),
            data: data.into(),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Debug for ImageBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ImageBuffer")
            .field("id", &self.id)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}
