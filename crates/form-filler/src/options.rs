//! Fill options

use pdf_core::ImageScaleMode;
use serde::{Deserialize, Serialize};

/// How a filled document is finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOptions {
    /// Make every field read-only after filling
    #[serde(default = "default_true")]
    pub lock_fields: bool,

    /// Ask viewers to regenerate field appearances
    #[serde(default = "default_true")]
    pub need_appearances: bool,

    /// How images are sized inside their field rectangle
    #[serde(default)]
    pub image_scale: ImageScale,
}

fn default_true() -> bool {
    true
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            lock_fields: true,
            need_appearances: true,
            image_scale: ImageScale::default(),
        }
    }
}

impl FillOptions {
    /// Leave fields editable after filling
    pub fn editable() -> Self {
        Self {
            lock_fields: false,
            ..Self::default()
        }
    }

    pub fn with_image_scale(mut self, scale: ImageScale) -> Self {
        self.image_scale = scale;
        self
    }
}

/// Image scaling mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ImageScale {
    Stretch,
    FitWidth,
    FitHeight,
    #[default]
    FitBox,
    Natural,
}

impl From<ImageScale> for ImageScaleMode {
    fn from(scale: ImageScale) -> Self {
        match scale {
            ImageScale::Stretch => ImageScaleMode::Stretch,
            ImageScale::FitWidth => ImageScaleMode::FitWidth,
            ImageScale::FitHeight => ImageScaleMode::FitHeight,
            ImageScale::FitBox => ImageScaleMode::FitBox,
            ImageScale::Natural => ImageScaleMode::Natural,
        }
    }
}
