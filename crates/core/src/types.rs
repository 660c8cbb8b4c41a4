//! Domain types for the presentation document.
//!
//! The JSON shape (camelCase keys, elements tagged by `"type"`) is the one the
//! remote store API exchanges. Presentations and slides deserialize through the
//! wire types in [`crate::normalize`], so every value built from JSON already
//! has its defaults filled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::normalize::{RawPresentation, RawSlide};

/// Colour used by the default background.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Font family given to new slides.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// The root document: every presentation the user owns, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub presentations: Vec<Presentation>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a presentation by id.
    pub fn presentation(&self, id: &str) -> Option<&Presentation> {
        self.presentations.iter().find(|p| p.id == id)
    }

    /// Number of presentations in the store.
    pub fn len(&self) -> usize {
        self.presentations.len()
    }

    /// Whether the store holds no presentations.
    pub fn is_empty(&self) -> bool {
        self.presentations.is_empty()
    }
}

/// A named deck of slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPresentation")]
pub struct Presentation {
    /// Unique, immutable after creation.
    pub id: String,

    pub name: String,

    /// Image URI or base64 data URL; empty when unset.
    pub thumbnail: String,

    pub description: String,

    pub favorited: bool,

    /// Transition used by slides that do not set their own.
    pub transition_type: TransitionType,

    /// Background given to new slides and to slides that lack one.
    pub default_background: Background,

    /// Slides in presentation order. Never empty.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Look up a slide by id.
    pub fn slide(&self, id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    /// 0-based position of a slide in the deck.
    pub fn slide_index(&self, id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    /// Font family inherited by new slides: the first slide's, or the default.
    pub fn font_family(&self) -> &str {
        self.slides
            .first()
            .map(|s| s.font_family.as_str())
            .unwrap_or(DEFAULT_FONT_FAMILY)
    }

    /// Slide ids in deck order.
    pub fn slide_ids(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.id.as_str()).collect()
    }
}

/// A single canvas of positioned elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSlide")]
pub struct Slide {
    /// Unique within the owning presentation.
    pub id: String,

    /// Elements in insertion order; drawing order is given by `layer`.
    pub elements: Vec<Element>,

    pub background: Background,

    pub font_family: String,

    /// `TransitionType::None` falls back to the presentation's transition
    /// during playback.
    pub transition_type: TransitionType,
}

impl Slide {
    /// Look up an element by id.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Layer that puts a new element above every existing one.
    pub fn next_layer(&self) -> i32 {
        self.elements
            .iter()
            .map(|e| e.layer.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Elements sorted back-to-front.
    pub fn elements_by_layer(&self) -> Vec<&Element> {
        let mut sorted: Vec<&Element> = self.elements.iter().collect();
        sorted.sort_by_key(|e| e.layer);
        sorted
    }
}

/// Slide-to-slide transition effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionType {
    #[default]
    None,
    Fade,
    SlideLeft,
    SlideRight,
}

impl TransitionType {
    /// Wire name of the transition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::SlideLeft => "slideLeft",
            Self::SlideRight => "slideRight",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "slideleft" => Ok(Self::SlideLeft),
            "slideright" => Ok(Self::SlideRight),
            other => Err(Error::Validation(format!(
                "unknown transition type: {}",
                other
            ))),
        }
    }
}

/// Fill kind of a background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundStyle {
    #[default]
    Solid,
    Gradient,
    Image,
}

/// Solid, gradient or image fill for a slide.
///
/// Only the fields matching `style` are meaningful; the rest keep their
/// defaults so switching style in the editor does not lose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Background {
    pub style: BackgroundStyle,
    pub color: String,
    pub gradient: Gradient,
    /// Image URI or base64 data URL.
    pub image: String,
    /// Image picked from the user's machine, as a data URL.
    pub uploaded_image: String,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            style: BackgroundStyle::Solid,
            color: DEFAULT_BACKGROUND_COLOR.to_string(),
            gradient: Gradient::default(),
            image: String::new(),
            uploaded_image: String::new(),
        }
    }
}

impl Background {
    /// A solid fill of the given colour.
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            style: BackgroundStyle::Solid,
            color: color.into(),
            ..Self::default()
        }
    }

    /// A gradient fill.
    pub fn gradient(direction: impl Into<String>, colors: Vec<String>) -> Self {
        Self {
            style: BackgroundStyle::Gradient,
            gradient: Gradient {
                direction: direction.into(),
                colors,
            },
            ..Self::default()
        }
    }

    /// An image fill from a URI or data URL.
    pub fn image(src: impl Into<String>) -> Self {
        Self {
            style: BackgroundStyle::Image,
            image: src.into(),
            ..Self::default()
        }
    }

    /// The image actually shown for an image background, preferring an upload.
    pub fn image_source(&self) -> Option<&str> {
        [&self.uploaded_image, &self.image]
            .into_iter()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// Linear gradient parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    /// CSS direction such as `to right` or `45deg`.
    pub direction: String,
    /// Colour stops, in order.
    pub colors: Vec<String>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            direction: "to right".to_string(),
            colors: vec!["#ffffff".to_string(), "#000000".to_string()],
        }
    }
}

/// Top-left corner of an element, as percentages of the slide canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Extent of an element, as percentages of the slide canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 10.0,
        }
    }
}

/// A positioned content unit on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique within the owning slide.
    pub id: String,

    #[serde(flatten)]
    pub kind: ElementKind,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub size: Size,

    /// Z-order; higher is drawn on top.
    #[serde(default)]
    pub layer: i32,
}

/// Type-specific payload of an element, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Text(TextContent),
    Image(ImageContent),
    Video(VideoContent),
    Code(CodeContent),
}

impl ElementKind {
    /// Wire name of the element type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Code(_) => "code",
        }
    }
}

/// Text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub content: String,
    /// In `em`.
    pub font_size: f64,
    pub color: String,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 1.0,
            color: "#000000".to_string(),
        }
    }
}

/// Image by URL or data URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContent {
    pub src: String,
    /// Alternative text.
    pub alt: String,
}

/// Embedded video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoContent {
    pub src: String,
    pub auto_play: bool,
}

/// Syntax-highlighted code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeContent {
    pub code: String,
    /// Highlighting language, e.g. `rust`, `python`, `c`.
    pub language: String,
    /// In `em`.
    pub font_size: f64,
}

impl Default for CodeContent {
    fn default() -> Self {
        Self {
            code: String::new(),
            language: "plaintext".to_string(),
            font_size: 1.0,
        }
    }
}
