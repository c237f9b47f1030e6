//! Canonical texture names: `<source>_<W>-<H>-<D>_<texW>-<texH>`.
//!
//! The name is the only persisted link between a texture and the volume it
//! was baked from. A RON sidecar carrying the same five fields is accepted too.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::types::{TextureDims, VolumeDims};

/// Volume fields are 1-3 digits, texture fields 1-4 digits.
pub const CANONICAL_PATTERN: &str = r"[0-9]{1,3}-[0-9]{1,3}-[0-9]{1,3}_[0-9]{1,4}-[0-9]{1,4}";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("texture name {0:?} does not contain W-H-D_texW-texH")]
    NoMatch(String),

    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("sidecar error: {0}")]
    Sidecar(String),

    #[error("canonical name pattern failed to compile: {0}")]
    Pattern(String),
}

/// Volume and texture dimensions recovered from a canonical name.
///
/// Field order is the wire order: W, H, D, texW, texH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TextureMetadata {
    pub volume_width: u32,
    pub volume_height: u32,
    pub volume_depth: u32,
    pub texture_width: u32,
    pub texture_height: u32,
}

fn canonical_regex() -> Result<&'static Regex, MetadataError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CANONICAL_PATTERN))
        .as_ref()
        .map_err(|e| MetadataError::Pattern(e.to_string()))
}

impl TextureMetadata {
    pub fn new(volume: VolumeDims, texture: TextureDims) -> Self {
        Self {
            volume_width: volume.width,
            volume_height: volume.height,
            volume_depth: volume.depth,
            texture_width: texture.width,
            texture_height: texture.height,
        }
    }

    pub fn volume(&self) -> VolumeDims {
        VolumeDims::new(self.volume_width, self.volume_height, self.volume_depth)
    }

    pub fn texture(&self) -> TextureDims {
        TextureDims::new(self.texture_width, self.texture_height)
    }

    /// Build `<source>_<W>-<H>-<D>_<texW>-<texH>`.
    pub fn canonical_name(&self, source_name: &str) -> String {
        format!(
            "{}_{}-{}-{}_{}-{}",
            source_name,
            self.volume_width,
            self.volume_height,
            self.volume_depth,
            self.texture_width,
            self.texture_height
        )
    }

    /// Recover the five dimensions from the first pattern match inside `name`.
    ///
    /// Texture dimensions are not checked for being powers of two.
    pub fn resolve(name: &str) -> Result<Self, MetadataError> {
        let found = canonical_regex()?
            .find(name)
            .ok_or_else(|| MetadataError::NoMatch(name.to_string()))?
            .as_str();

        // The pattern guarantees exactly one '_' and the dash counts below
        let (volume_part, texture_part) = found
            .split_once('_')
            .ok_or_else(|| MetadataError::NoMatch(name.to_string()))?;
        let mut volume = volume_part.split('-');
        let mut texture = texture_part.split('-');

        Ok(Self {
            volume_width: parse_field("volume width", volume.next())?,
            volume_height: parse_field("volume height", volume.next())?,
            volume_depth: parse_field("volume depth", volume.next())?,
            texture_width: parse_field("texture width", texture.next())?,
            texture_height: parse_field("texture height", texture.next())?,
        })
    }

    /// Serialize as a RON sidecar record.
    pub fn to_sidecar(&self) -> Result<String, MetadataError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| MetadataError::Sidecar(e.to_string()))
    }

    /// Parse a RON sidecar record.
    pub fn from_sidecar(text: &str) -> Result<Self, MetadataError> {
        ron::Options::default()
            .from_str(text)
            .map_err(|e| MetadataError::Sidecar(e.to_string()))
    }
}

fn parse_field(field: &'static str, part: Option<&str>) -> Result<u32, MetadataError> {
    let value = part.unwrap_or_default();
    value.parse().map_err(|_| MetadataError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
