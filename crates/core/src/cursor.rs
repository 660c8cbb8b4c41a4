//! Slide navigation for the editor and the full-screen player.
//!
//! The editor keeps its current slide in the `slide` URL query parameter as a
//! 1-based index; [`SlideCursor`] converts between that and a position that is
//! always inside the deck.

use crate::types::{Presentation, Slide, TransitionType};

/// Name of the URL query parameter holding the current slide.
pub const SLIDE_QUERY_PARAM: &str = "slide";

/// Position within a deck of `count` slides. Never out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideCursor {
    index: usize,
    count: usize,
}

impl SlideCursor {
    /// Cursor on the first slide.
    pub fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    /// Cursor from the value of the `slide` parameter.
    ///
    /// Missing or unparsable values select the first slide; numbers past
    /// either end are clamped.
    pub fn from_query_value(value: Option<&str>, count: usize) -> Self {
        let number = value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(1);
        let index = usize::try_from(number.saturating_sub(1)).unwrap_or(0);

        let mut cursor = Self::new(count);
        cursor.index = index.min(cursor.last_index());
        cursor
    }

    /// Cursor from a full query string such as `?slide=3&mode=edit`.
    pub fn from_query(query: &str, count: usize) -> Self {
        let value = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == SLIDE_QUERY_PARAM)
            .map(|(_, value)| value);
        Self::from_query_value(value, count)
    }

    /// The `slide` parameter value for this position.
    pub fn query_value(&self) -> String {
        self.number().to_string()
    }

    /// `slide=N` for building URLs.
    pub fn query_pair(&self) -> String {
        format!("{}={}", SLIDE_QUERY_PARAM, self.number())
    }

    /// 0-based position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based position, as shown to the user.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Number of slides in the deck.
    pub fn count(&self) -> usize {
        self.count
    }

    fn last_index(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.last_index()
    }

    /// Step forward. Returns false at the last slide.
    pub fn step_forward(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step back. Returns false at the first slide.
    pub fn step_back(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to a 0-based position, clamped into the deck.
    pub fn go_to(&mut self, index: usize) {
        self.index = index.min(self.last_index());
    }

    /// Follow a change in deck length (e.g. after deleting a slide).
    pub fn resize(&mut self, count: usize) {
        self.count = count;
        self.index = self.index.min(self.last_index());
    }
}

/// One step of playback: the slide to show and how to transition into it.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// 1-based slide number.
    pub number: usize,
    pub slide: &'a Slide,
    pub transition: TransitionType,
}

/// Transition used when entering `slide`: its own, or the presentation's.
pub fn effective_transition(presentation: &Presentation, slide: &Slide) -> TransitionType {
    match slide.transition_type {
        TransitionType::None => presentation.transition_type,
        own => own,
    }
}

/// Walks a presentation in order for preview/full-screen playback.
#[derive(Debug, Clone)]
pub struct Playback<'a> {
    presentation: &'a Presentation,
    cursor: SlideCursor,
}

impl<'a> Playback<'a> {
    /// Start at the first slide.
    pub fn new(presentation: &'a Presentation) -> Self {
        Self {
            presentation,
            cursor: SlideCursor::new(presentation.slides.len()),
        }
    }

    /// Start at the position given by the `slide` query value.
    pub fn starting_at(presentation: &'a Presentation, query_value: Option<&str>) -> Self {
        Self {
            presentation,
            cursor: SlideCursor::from_query_value(query_value, presentation.slides.len()),
        }
    }

    pub fn cursor(&self) -> SlideCursor {
        self.cursor
    }

    fn step(&self) -> Option<Step<'a>> {
        let slide = self.presentation.slides.get(self.cursor.index())?;
        Some(Step {
            number: self.cursor.number(),
            slide,
            transition: effective_transition(self.presentation, slide),
        })
    }

    /// The slide currently on screen.
    pub fn current(&self) -> Option<Step<'a>> {
        self.step()
    }

    /// Advance and return the new slide, or `None` at the end.
    pub fn advance(&mut self) -> Option<Step<'a>> {
        if self.cursor.step_forward() {
            self.step()
        } else {
            None
        }
    }

    /// Go back and return the new slide, or `None` at the start.
    pub fn back(&mut self) -> Option<Step<'a>> {
        if self.cursor.step_back() {
            self.step()
        } else {
            None
        }
    }

    /// Every step from the current slide to the end.
    pub fn remaining(&self) -> Vec<Step<'a>> {
        let mut walker = self.clone();
        let mut steps: Vec<Step<'a>> = walker.current().into_iter().collect();
        while let Some(step) = walker.advance() {
            steps.push(step);
        }
        steps
    }
}
