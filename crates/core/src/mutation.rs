//! Whole-document mutations.
//!
//! Every edit the editor can make is a [`Mutation`]. Applying one to a store
//! never touches that store: [`Store::apply`] returns the next document, which
//! the caller persists and only then adopts.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::ids;
use crate::normalize::{repair_presentation, RawSlide};
use crate::types::{
    Background, Element, ElementKind, Position, Presentation, Size, Slide, Store, TransitionType,
};
use crate::validate;

/// A single edit to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Append a presentation built by [`new_presentation`].
    AddPresentation { presentation: Presentation },

    /// Remove a presentation. Unknown ids are ignored.
    DeletePresentation { presentation_id: String },

    /// Replace the presentation with the same id.
    UpdatePresentation { presentation: Presentation },

    /// Append a blank slide inheriting the presentation's background and font.
    AddSlide {
        presentation_id: String,
        #[serde(default = "ids::new_id")]
        slide_id: String,
    },

    /// Replace the slide with the same id. A slide without a background
    /// takes the presentation's default.
    UpdateSlide {
        presentation_id: String,
        slide: RawSlide,
    },

    /// Remove a slide. Rejected for a presentation's only slide.
    DeleteSlide {
        presentation_id: String,
        slide_id: String,
    },

    /// Replace the slide sequence with the given order.
    ReorderSlides {
        presentation_id: String,
        slides: Vec<RawSlide>,
    },

    /// Put a new element on top of a slide.
    AddElement {
        presentation_id: String,
        slide_id: String,
        element: Element,
    },

    /// Replace the element with the same id.
    UpdateElement {
        presentation_id: String,
        slide_id: String,
        element: Element,
    },

    /// Remove an element.
    DeleteElement {
        presentation_id: String,
        slide_id: String,
        element_id: String,
    },

    /// Replace the presentation's default background.
    UpdateDefaultBackground {
        presentation_id: String,
        background: Background,
    },

    /// Replace the presentation's transition.
    UpdateTransitionType {
        presentation_id: String,
        transition_type: TransitionType,
    },
}

impl Mutation {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPresentation { .. } => "add presentation",
            Self::DeletePresentation { .. } => "delete presentation",
            Self::UpdatePresentation { .. } => "update presentation",
            Self::AddSlide { .. } => "add slide",
            Self::UpdateSlide { .. } => "update slide",
            Self::DeleteSlide { .. } => "delete slide",
            Self::ReorderSlides { .. } => "reorder slides",
            Self::AddElement { .. } => "add element",
            Self::UpdateElement { .. } => "update element",
            Self::DeleteElement { .. } => "delete element",
            Self::UpdateDefaultBackground { .. } => "update default background",
            Self::UpdateTransitionType { .. } => "update transition type",
        }
    }
}

/// Build a new presentation: one blank slide, default background, not favorited.
pub fn new_presentation(name: &str, description: &str) -> Result<Presentation> {
    validate::name(name)?;

    let default_background = Background::default();
    let first_slide = RawSlide::default().into_slide(&default_background);

    Ok(Presentation {
        id: ids::new_id(),
        name: name.trim().to_string(),
        thumbnail: String::new(),
        description: description.to_string(),
        favorited: false,
        transition_type: TransitionType::None,
        default_background,
        slides: vec![first_slide],
    })
}

/// Build an element at the top-left corner with the default size.
///
/// The layer is assigned when the element is added to a slide.
pub fn new_element(kind: ElementKind) -> Element {
    Element {
        id: ids::new_id(),
        kind,
        position: Position::default(),
        size: Size::default(),
        layer: 0,
    }
}

/// The presentation's slides with the one at `from` moved to `to` (both 0-based).
pub fn moved_slides(presentation: &Presentation, from: usize, to: usize) -> Result<Vec<Slide>> {
    let count = presentation.slides.len();
    if from >= count || to >= count {
        return Err(Error::Validation(format!(
            "slide index out of range: {} -> {} (deck has {} slides)",
            from + 1,
            to + 1,
            count
        )));
    }

    let mut slides = presentation.slides.clone();
    let slide = slides.remove(from);
    slides.insert(to, slide);
    Ok(slides)
}

fn presentation_mut<'a>(store: &'a mut Store, id: &str) -> Result<&'a mut Presentation> {
    store
        .presentations
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::PresentationNotFound(id.to_string()))
}

fn slide_mut<'a>(presentation: &'a mut Presentation, id: &str) -> Result<&'a mut Slide> {
    presentation
        .slides
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::SlideNotFound(id.to_string()))
}

fn is_permutation(current: &[Slide], proposed: &[Slide]) -> bool {
    let before: HashSet<&str> = current.iter().map(|s| s.id.as_str()).collect();
    let after: HashSet<&str> = proposed.iter().map(|s| s.id.as_str()).collect();
    current.len() == proposed.len() && before == after
}

impl Store {
    /// Compute the store that results from applying `mutation`.
    ///
    /// `self` is left untouched; on error no new store is produced.
    pub fn apply(&self, mutation: &Mutation) -> Result<Store> {
        let mut next = self.clone();

        match mutation {
            Mutation::AddPresentation { presentation } => {
                validate::name(&presentation.name)?;
                if next.presentation(&presentation.id).is_some() {
                    return Err(Error::Validation(format!(
                        "duplicate presentation id: {}",
                        presentation.id
                    )));
                }
                next.presentations
                    .push(repair_presentation(presentation.clone()));
            }

            Mutation::DeletePresentation { presentation_id } => {
                next.presentations.retain(|p| &p.id != presentation_id);
            }

            Mutation::UpdatePresentation { presentation } => {
                validate::name(&presentation.name)?;
                let target = presentation_mut(&mut next, &presentation.id)?;
                *target = repair_presentation(presentation.clone());
            }

            Mutation::AddSlide {
                presentation_id,
                slide_id,
            } => {
                let Some(target) = next
                    .presentations
                    .iter_mut()
                    .find(|p| &p.id == presentation_id)
                else {
                    log::warn!("Cannot add slide: presentation {} not found", presentation_id);
                    return Ok(next);
                };
                if target.slide(slide_id).is_some() {
                    return Err(Error::Validation(format!("duplicate slide id: {}", slide_id)));
                }

                let slide = RawSlide {
                    id: Some(slide_id.clone()),
                    font_family: Some(target.font_family().to_string()),
                    ..RawSlide::default()
                }
                .into_slide(&target.default_background);
                target.slides.push(slide);
            }

            Mutation::UpdateSlide {
                presentation_id,
                slide,
            } => {
                let Some(slide_id) = slide.id.as_deref().filter(|id| !id.is_empty()) else {
                    return Err(Error::Validation("slide id is required".to_string()));
                };
                let target = presentation_mut(&mut next, presentation_id)?;
                let slide = slide.clone().into_slide(&target.default_background);
                validate::background(&slide.background)?;
                *slide_mut(target, slide_id)? = slide;
            }

            Mutation::DeleteSlide {
                presentation_id,
                slide_id,
            } => {
                let target = presentation_mut(&mut next, presentation_id)?;
                if target.slide(slide_id).is_none() {
                    return Err(Error::SlideNotFound(slide_id.clone()));
                }
                if target.slides.len() <= 1 {
                    log::warn!(
                        "Refusing to delete the only slide of presentation {}",
                        presentation_id
                    );
                    return Err(Error::LastSlide);
                }
                target.slides.retain(|s| &s.id != slide_id);
            }

            Mutation::ReorderSlides {
                presentation_id,
                slides,
            } => {
                let target = presentation_mut(&mut next, presentation_id)?;
                if slides.is_empty() {
                    return Err(Error::Validation(
                        "a presentation needs at least one slide".to_string(),
                    ));
                }
                let slides: Vec<Slide> = slides
                    .iter()
                    .map(|s| s.clone().into_slide(&target.default_background))
                    .collect();
                if !is_permutation(&target.slides, &slides) {
                    log::warn!(
                        "Slide order for presentation {} is not a permutation of its slides; \
                         storing it as given",
                        presentation_id
                    );
                }
                target.slides = slides;
            }

            Mutation::AddElement {
                presentation_id,
                slide_id,
                element,
            } => {
                validate::element(element)?;
                let target = presentation_mut(&mut next, presentation_id)?;
                let slide = slide_mut(target, slide_id)?;
                if slide.element(&element.id).is_some() {
                    return Err(Error::Validation(format!(
                        "duplicate element id: {}",
                        element.id
                    )));
                }
                let mut element = element.clone();
                element.layer = slide.next_layer();
                slide.elements.push(element);
            }

            Mutation::UpdateElement {
                presentation_id,
                slide_id,
                element,
            } => {
                validate::element(element)?;
                let target = presentation_mut(&mut next, presentation_id)?;
                let slide = slide_mut(target, slide_id)?;
                let existing = slide
                    .elements
                    .iter_mut()
                    .find(|e| e.id == element.id)
                    .ok_or_else(|| Error::ElementNotFound(element.id.clone()))?;
                *existing = element.clone();
            }

            Mutation::DeleteElement {
                presentation_id,
                slide_id,
                element_id,
            } => {
                let target = presentation_mut(&mut next, presentation_id)?;
                let slide = slide_mut(target, slide_id)?;
                if slide.element(element_id).is_none() {
                    return Err(Error::ElementNotFound(element_id.clone()));
                }
                slide.elements.retain(|e| &e.id != element_id);
            }

            Mutation::UpdateDefaultBackground {
                presentation_id,
                background,
            } => {
                validate::background(background)?;
                presentation_mut(&mut next, presentation_id)?.default_background =
                    background.clone();
            }

            Mutation::UpdateTransitionType {
                presentation_id,
                transition_type,
            } => {
                presentation_mut(&mut next, presentation_id)?.transition_type = *transition_type;
            }
        }

        Ok(next)
    }
}
