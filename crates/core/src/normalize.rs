//! Default filling for presentations and slides entering the store.
//!
//! Documents fetched from the API (or typed by hand into a store file) may be
//! missing any of the optional fields. They are normalized exactly once, when
//! they are deserialized: the wire types below keep every field optional and
//! their conversions fill what is absent without touching what is present.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids;
use crate::types::{
    Background, Element, Presentation, Slide, Store, TransitionType, DEFAULT_FONT_FAMILY,
};

/// A presentation as it may appear on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPresentation {
    pub id: Option<String>,
    pub name: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub favorited: Option<bool>,
    pub transition_type: Option<TransitionType>,
    pub default_background: Option<Background>,
    #[serde(default)]
    pub slides: Vec<RawSlide>,
}

/// A slide as it may appear on the wire.
///
/// Slide edits carry this form so that a slide sent without a background
/// picks up its presentation's default when the edit is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<TransitionType>,
}

impl RawSlide {
    /// Fill missing fields, inheriting `background` when the slide has none.
    pub fn into_slide(self, background: &Background) -> Slide {
        Slide {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(ids::new_id),
            elements: self.elements,
            background: self.background.unwrap_or_else(|| background.clone()),
            font_family: self
                .font_family
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            transition_type: self.transition_type.unwrap_or_default(),
        }
    }
}

impl From<RawSlide> for Slide {
    fn from(raw: RawSlide) -> Self {
        raw.into_slide(&Background::default())
    }
}

impl From<Slide> for RawSlide {
    fn from(slide: Slide) -> Self {
        Self {
            id: Some(slide.id),
            elements: slide.elements,
            background: Some(slide.background),
            font_family: Some(slide.font_family),
            transition_type: Some(slide.transition_type),
        }
    }
}

impl From<RawPresentation> for Presentation {
    fn from(raw: RawPresentation) -> Self {
        let default_background = raw.default_background.unwrap_or_default();

        let mut slides: Vec<Slide> = raw
            .slides
            .into_iter()
            .map(|s| s.into_slide(&default_background))
            .collect();

        let id = raw.id.filter(|id| !id.is_empty()).unwrap_or_else(ids::new_id);

        if slides.is_empty() {
            log::warn!("Presentation {} arrived with no slides; adding a blank one", id);
            slides.push(RawSlide::default().into_slide(&default_background));
        }

        Presentation {
            id,
            name: raw.name.unwrap_or_default(),
            thumbnail: raw.thumbnail.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            favorited: raw.favorited.unwrap_or(false),
            transition_type: raw.transition_type.unwrap_or_default(),
            default_background,
            slides,
        }
    }
}

/// Parse a store document (`{"presentations": [...]}`), normalizing every entry.
pub fn store_from_json(json: &str) -> Result<Store> {
    Ok(serde_json::from_str(json)?)
}

/// Normalize a single presentation given as loose JSON.
pub fn presentation_from_value(value: serde_json::Value) -> Result<Presentation> {
    Ok(serde_json::from_value(value)?)
}

/// Normalize a single slide given as loose JSON, inheriting `background`.
pub fn slide_from_value(value: serde_json::Value, background: &Background) -> Result<Slide> {
    let raw: RawSlide = serde_json::from_value(value)?;
    Ok(raw.into_slide(background))
}

/// Re-apply defaults to a presentation built in memory.
///
/// Typed values cannot lack fields, but they can carry blanks the editor
/// would render as broken: an empty font family, a gradient with no stops,
/// or (after a bad update) no slides at all.
pub fn repair_presentation(mut presentation: Presentation) -> Presentation {
    if presentation.default_background.gradient.colors.is_empty() {
        presentation.default_background.gradient = Default::default();
    }

    for slide in &mut presentation.slides {
        if slide.id.is_empty() {
            slide.id = ids::new_id();
        }
        if slide.font_family.trim().is_empty() {
            slide.font_family = DEFAULT_FONT_FAMILY.to_string();
        }
        if slide.background.gradient.colors.is_empty() {
            slide.background.gradient = Default::default();
        }
    }

    if presentation.slides.is_empty() {
        log::warn!(
            "Presentation {} has no slides; adding a blank one",
            presentation.id
        );
        let blank = RawSlide::default().into_slide(&presentation.default_background);
        presentation.slides.push(blank);
    }

    presentation
}
