//! Asset request model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a generated asset within a session (e.g. `"ch1"`).
///
/// Ids are catalog slugs, unique per session. The same id always refers to
/// the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Creates an asset id from a slug.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// The kind of media a request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// A single still image, returned inline by the backend.
    Image,
    /// A video produced by a long-running operation that must be polled.
    Video,
}

/// Backend-specific rendering knobs, carried opaquely by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output aspect ratio, e.g. `"1:1"` or `"16:9"`.
    pub aspect_ratio: String,
    /// Output resolution, e.g. `"1K"` or `"1080p"`.
    pub resolution: String,
}

impl RenderConfig {
    /// Creates a render config from aspect ratio and resolution.
    #[must_use]
    pub fn new(aspect_ratio: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self {
            aspect_ratio: aspect_ratio.into(),
            resolution: resolution.into(),
        }
    }
}

/// An immutable unit of generation work.
///
/// Requests are built by the catalog (or directly by tests) and never
/// mutated; all mutable state lives in the asset slot keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRequest {
    /// The slot this request targets.
    pub id: AssetId,
    /// The kind of media to produce.
    pub kind: AssetKind,
    /// The generation prompt.
    pub prompt: String,
    /// Rendering knobs passed through to the backend.
    pub config: RenderConfig,
}
