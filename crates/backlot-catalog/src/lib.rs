//! Compile-time bundled asset briefs for the storybook experience.
//!
//! The production manifest (one cinematic opener plus one interior
//! illustration per chapter) is bundled into the binary via `include_str!`
//! and parsed once at startup. The catalog is the authority on which asset
//! ids exist and what request each id expands to.

use backlot_core::asset::{AssetId, AssetKind, AssetRequest, RenderConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// The bundled production manifest.
const STORYBOOK_MANIFEST: &str = include_str!("../manifests/storybook.yaml");

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The manifest failed to parse as YAML.
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two briefs share the same id.
    #[error("duplicate brief id: {0}")]
    DuplicateId(String),

    /// A brief is structurally invalid.
    #[error("invalid brief {id}: {reason}")]
    InvalidBrief {
        /// The offending brief's id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// One interior illustration brief.
#[derive(Debug, Clone, Deserialize)]
pub struct IllustrationBrief {
    /// Stable asset id (chapter slug).
    pub id: String,
    /// Chapter heading shown alongside the illustration.
    pub chapter: String,
    /// Generation prompt.
    pub prompt: String,
    /// Caption shown under the finished illustration.
    pub caption: String,
}

/// The featured cinematic brief.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoBrief {
    /// Stable asset id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Generation prompt.
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    video: VideoBrief,
    illustrations: Vec<IllustrationBrief>,
}

/// Render settings applied to every illustration brief.
fn illustration_config() -> RenderConfig {
    RenderConfig::new("1:1", "1K")
}

/// Render settings applied to the cinematic brief.
fn video_config() -> RenderConfig {
    RenderConfig::new("16:9", "1080p")
}

/// The validated asset catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    video: VideoBrief,
    illustrations: Vec<IllustrationBrief>,
}

impl Catalog {
    /// Loads and validates the bundled production manifest.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled manifest is malformed; that is
    /// a build defect, so callers treat it as fatal at startup.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(STORYBOOK_MANIFEST)
    }

    /// Parses and validates a manifest from YAML.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed YAML, duplicate ids, or briefs
    /// with empty ids or prompts.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let manifest: Manifest = serde_yaml::from_str(yaml)?;

        let mut seen: Vec<&str> = Vec::with_capacity(manifest.illustrations.len() + 1);
        validate_brief(&manifest.video.id, &manifest.video.prompt)?;
        seen.push(&manifest.video.id);
        for brief in &manifest.illustrations {
            validate_brief(&brief.id, &brief.prompt)?;
            if seen.contains(&brief.id.as_str()) {
                return Err(CatalogError::DuplicateId(brief.id.clone()));
            }
            seen.push(&brief.id);
            debug!(id = %brief.id, chapter = %brief.chapter, "loaded illustration brief");
        }
        debug!(
            illustrations = manifest.illustrations.len(),
            video = %manifest.video.id,
            "catalog loaded"
        );

        Ok(Self {
            video: manifest.video,
            illustrations: manifest.illustrations,
        })
    }

    /// Returns the cinematic brief.
    #[must_use]
    pub fn video(&self) -> &VideoBrief {
        &self.video
    }

    /// Returns the illustration briefs in manifest order.
    #[must_use]
    pub fn illustrations(&self) -> &[IllustrationBrief] {
        &self.illustrations
    }

    /// Returns whether `id` names a brief in this catalog.
    #[must_use]
    pub fn contains(&self, id: &AssetId) -> bool {
        self.request_for(id).is_some()
    }

    /// Expands a catalog id into its generation request.
    #[must_use]
    pub fn request_for(&self, id: &AssetId) -> Option<AssetRequest> {
        if self.video.id == id.as_str() {
            return Some(AssetRequest {
                id: id.clone(),
                kind: AssetKind::Video,
                prompt: self.video.prompt.clone(),
                config: video_config(),
            });
        }
        self.illustrations
            .iter()
            .find(|brief| brief.id == id.as_str())
            .map(|brief| AssetRequest {
                id: AssetId::new(brief.id.clone()),
                kind: AssetKind::Image,
                prompt: brief.prompt.clone(),
                config: illustration_config(),
            })
    }

    /// Returns every request in display order: the cinematic opener first,
    /// then the illustrations in manifest order.
    #[must_use]
    pub fn requests(&self) -> Vec<AssetRequest> {
        let mut requests = Vec::with_capacity(self.illustrations.len() + 1);
        if let Some(request) = self.request_for(&AssetId::new(self.video.id.clone())) {
            requests.push(request);
        }
        for brief in &self.illustrations {
            if let Some(request) = self.request_for(&AssetId::new(brief.id.clone())) {
                requests.push(request);
            }
        }
        requests
    }

    /// Returns the illustration requests in manifest order. This is the set
    /// a gallery batch runs over; the cinematic opener is triggered on its
    /// own.
    #[must_use]
    pub fn illustration_requests(&self) -> Vec<AssetRequest> {
        self.illustrations
            .iter()
            .filter_map(|brief| self.request_for(&AssetId::new(brief.id.clone())))
            .collect()
    }
}

fn validate_brief(id: &str, prompt: &str) -> Result<(), CatalogError> {
    if id.trim().is_empty() {
        return Err(CatalogError::InvalidBrief {
            id: id.to_owned(),
            reason: "empty id".to_owned(),
        });
    }
    if prompt.trim().is_empty() {
        return Err(CatalogError::InvalidBrief {
            id: id.to_owned(),
            reason: "empty prompt".to_owned(),
        });
    }
    Ok(())
}
