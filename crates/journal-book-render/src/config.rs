//! Layout and book configuration.

use journal_book::{FontProps, FontStyle, PageMargins, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of movie layers a book keeps loaded at once.
pub const MOVIE_CACHE_CAPACITY: usize = 8;

/// Canvas geometry and typography defaults used by the paginator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Page canvas width in layout units.
    pub canvas_width: i32,
    /// Page canvas height in layout units.
    pub canvas_height: i32,
    /// Margin applied on every side until a `<margin>` tag overrides it.
    pub default_margin: i32,
    pub default_font_face: String,
    pub default_font_size: u16,
    /// Per-tick color step of checkbox fades.
    pub checkbox_fade_step: f32,
    /// Vertical correction applied to no-resize images and movies.
    pub no_resize_aspect: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 512,
            canvas_height: 512,
            default_margin: 16,
            default_font_face: "Arial".to_string(),
            default_font_size: 24,
            checkbox_fade_step: 0.1,
            no_resize_aspect: 0.7,
        }
    }
}

impl LayoutConfig {
    /// Defaults for a canvas of the given size.
    pub fn for_canvas(width: i32, height: i32) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn default_margins(&self) -> PageMargins {
        PageMargins::uniform(self.default_margin)
    }

    /// Font in effect before any `<font>` tag.
    pub fn default_font(&self) -> FontProps {
        FontProps {
            face: self.default_font_face.clone(),
            size: self.default_font_size,
            style: FontStyle::Regular,
            color: Rgba::BLACK,
            line_spacing: 0,
        }
    }
}

/// Per-book presentation options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Registered GUI to present the book with.
    pub gui: String,
    /// Show the book already open instead of on its cover.
    pub start_open: bool,
    pub allow_page_turning: bool,
    /// Preferred image location for `<img src=..>` lookups.
    pub location_hint: Option<String>,
    pub layout: LayoutConfig,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            gui: crate::gui::DEFAULT_GUI.to_string(),
            start_open: false,
            allow_page_turning: true,
            location_hint: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl BookConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
