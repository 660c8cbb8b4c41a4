//! The store handle: owns the current document and funnels every edit
//! through "compute next document, persist it, adopt it".
//!
//! The handle is the only writer (`&mut self` on every mutation). Readers take
//! [`Arc<Store>`] snapshots that stay valid and unchanged after later edits.

use std::sync::Arc;

use crate::backend::{Backend, Revision};
use crate::error::{Error, Result};
use crate::ids;
use crate::mutation::{self, Mutation};
use crate::types::{Background, Element, ElementKind, Presentation, Slide, Store, TransitionType};

/// Load state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been fetched yet, or a fetch is in progress.
    Loading,
    /// The document was fetched and can be edited.
    Ready,
    /// The last fetch failed.
    Error,
}

/// A user's presentation collection, mirrored from a [`Backend`].
pub struct PresentationStore<B: Backend> {
    backend: B,
    current: Arc<Store>,
    revision: Revision,
    status: Status,
    error: Option<String>,
}

impl<B: Backend> PresentationStore<B> {
    /// Create a handle over `backend`. Call [`load`](Self::load) before editing.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: Arc::new(Store::new()),
            revision: Revision::unknown(),
            status: Status::Loading,
            error: None,
        }
    }

    /// Fetch the document from the backend, replacing local state.
    ///
    /// Called whenever the signed-in user changes; calling it again after a
    /// failure retries the fetch.
    pub fn load(&mut self) -> Result<()> {
        self.status = Status::Loading;

        match self.backend.fetch() {
            Ok(snapshot) => {
                log::debug!(
                    "Loaded {} presentations at revision {}",
                    snapshot.store.len(),
                    snapshot.revision
                );
                self.current = Arc::new(snapshot.store);
                self.revision = snapshot.revision;
                self.status = Status::Ready;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load store: {}", e);
                self.status = Status::Error;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Current document. The snapshot never changes after it is taken.
    pub fn snapshot(&self) -> Arc<Store> {
        Arc::clone(&self.current)
    }

    /// Current load status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Message from the most recent failed operation, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Revision the current document was read or written at.
    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// The backend this store persists to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply a mutation: compute the next document, persist it, then adopt it.
    ///
    /// On any failure the current document is kept and the error message is
    /// recorded.
    pub fn commit(&mut self, mutation: &Mutation) -> Result<Arc<Store>> {
        match self.try_commit(mutation) {
            Ok(store) => {
                self.error = None;
                Ok(store)
            }
            Err(e) => {
                log::warn!("{} failed: {}", mutation.name(), e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn try_commit(&mut self, mutation: &Mutation) -> Result<Arc<Store>> {
        if self.status != Status::Ready {
            return Err(Error::NotLoaded);
        }

        let next = self.current.apply(mutation)?;
        let revision = self.backend.replace(&next, &self.revision)?;

        log::debug!("{} committed at revision {}", mutation.name(), revision);
        self.current = Arc::new(next);
        self.revision = revision;
        Ok(self.snapshot())
    }

    /// Record the error of a step that fails before reaching [`commit`](Self::commit).
    fn recorded<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            log::warn!("Edit rejected: {}", e);
            self.error = Some(e.to_string());
        }
        result
    }

    fn presentation(&self, id: &str) -> Result<&Presentation> {
        self.current
            .presentation(id)
            .ok_or_else(|| Error::PresentationNotFound(id.to_string()))
    }

    /// Create a presentation with one blank slide. Returns its id.
    pub fn create_presentation(&mut self, name: &str, description: &str) -> Result<String> {
        let presentation = mutation::new_presentation(name, description);
        let presentation = self.recorded(presentation)?;
        let id = presentation.id.clone();
        self.commit(&Mutation::AddPresentation { presentation })?;
        Ok(id)
    }

    /// Delete a presentation. Unknown ids succeed without change.
    pub fn delete_presentation(&mut self, id: &str) -> Result<()> {
        self.commit(&Mutation::DeletePresentation {
            presentation_id: id.to_string(),
        })?;
        Ok(())
    }

    /// Replace a presentation wholesale.
    pub fn update_presentation(&mut self, presentation: Presentation) -> Result<()> {
        self.commit(&Mutation::UpdatePresentation { presentation })?;
        Ok(())
    }

    /// Flip a presentation's favorite flag. Returns the new value.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let found = self.presentation(id).cloned();
        let mut presentation = self.recorded(found)?;
        presentation.favorited = !presentation.favorited;
        let favorited = presentation.favorited;
        self.update_presentation(presentation)?;
        Ok(favorited)
    }

    /// Rename a presentation.
    pub fn rename_presentation(&mut self, id: &str, name: &str) -> Result<()> {
        let found = self.presentation(id).cloned();
        let mut presentation = self.recorded(found)?;
        presentation.name = name.trim().to_string();
        self.update_presentation(presentation)
    }

    /// Append a blank slide. Returns its id, or `None` when the presentation
    /// does not exist (the store is left unchanged in that case).
    pub fn add_slide(&mut self, presentation_id: &str) -> Result<Option<String>> {
        let slide_id = ids::new_id();
        let store = self.commit(&Mutation::AddSlide {
            presentation_id: presentation_id.to_string(),
            slide_id: slide_id.clone(),
        })?;

        let added = store
            .presentation(presentation_id)
            .and_then(|p| p.slide(&slide_id))
            .is_some();
        Ok(added.then_some(slide_id))
    }

    /// Replace a slide (background, font, transition, elements).
    pub fn update_slide(&mut self, presentation_id: &str, slide: Slide) -> Result<()> {
        self.commit(&Mutation::UpdateSlide {
            presentation_id: presentation_id.to_string(),
            slide: slide.into(),
        })?;
        Ok(())
    }

    /// Delete a slide. Fails with [`Error::LastSlide`] for the only slide.
    pub fn delete_slide(&mut self, presentation_id: &str, slide_id: &str) -> Result<()> {
        self.commit(&Mutation::DeleteSlide {
            presentation_id: presentation_id.to_string(),
            slide_id: slide_id.to_string(),
        })?;
        Ok(())
    }

    /// Replace the slide order with `slides`, as dropped by the editor.
    pub fn reorder_slides(&mut self, presentation_id: &str, slides: Vec<Slide>) -> Result<()> {
        self.commit(&Mutation::ReorderSlides {
            presentation_id: presentation_id.to_string(),
            slides: slides.into_iter().map(Into::into).collect(),
        })?;
        Ok(())
    }

    /// Move the slide at `from` to `to` (0-based).
    pub fn move_slide(&mut self, presentation_id: &str, from: usize, to: usize) -> Result<()> {
        let slides = self
            .presentation(presentation_id)
            .and_then(|p| mutation::moved_slides(p, from, to));
        let slides = self.recorded(slides)?;
        self.reorder_slides(presentation_id, slides)
    }

    /// Add an element at the default position and size on top of a slide.
    /// Returns its id.
    pub fn add_element(
        &mut self,
        presentation_id: &str,
        slide_id: &str,
        kind: ElementKind,
    ) -> Result<String> {
        self.insert_element(presentation_id, slide_id, mutation::new_element(kind))
    }

    /// Add a fully specified element on top of a slide. Returns its id.
    pub fn insert_element(
        &mut self,
        presentation_id: &str,
        slide_id: &str,
        element: Element,
    ) -> Result<String> {
        let id = element.id.clone();
        self.commit(&Mutation::AddElement {
            presentation_id: presentation_id.to_string(),
            slide_id: slide_id.to_string(),
            element,
        })?;
        Ok(id)
    }

    /// Replace an element.
    pub fn update_element(
        &mut self,
        presentation_id: &str,
        slide_id: &str,
        element: Element,
    ) -> Result<()> {
        self.commit(&Mutation::UpdateElement {
            presentation_id: presentation_id.to_string(),
            slide_id: slide_id.to_string(),
            element,
        })?;
        Ok(())
    }

    /// Delete an element.
    pub fn delete_element(
        &mut self,
        presentation_id: &str,
        slide_id: &str,
        element_id: &str,
    ) -> Result<()> {
        self.commit(&Mutation::DeleteElement {
            presentation_id: presentation_id.to_string(),
            slide_id: slide_id.to_string(),
            element_id: element_id.to_string(),
        })?;
        Ok(())
    }

    /// Replace a presentation's default background.
    pub fn update_default_background(
        &mut self,
        presentation_id: &str,
        background: Background,
    ) -> Result<()> {
        self.commit(&Mutation::UpdateDefaultBackground {
            presentation_id: presentation_id.to_string(),
            background,
        })?;
        Ok(())
    }

    /// Replace a presentation's transition.
    pub fn update_transition_type(
        &mut self,
        presentation_id: &str,
        transition_type: TransitionType,
    ) -> Result<()> {
        self.commit(&Mutation::UpdateTransitionType {
            presentation_id: presentation_id.to_string(),
            transition_type,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::types::{Position, Size, TextContent};

    fn loaded() -> PresentationStore<MemoryBackend> {
        let mut store = PresentationStore::new(MemoryBackend::new());
        store.load().unwrap();
        store
    }

    #[test]
    fn test_status_transitions() {
        let mut store = PresentationStore::new(MemoryBackend::new());
        assert_eq!(store.status(), Status::Loading);

        store.load().unwrap();
        assert_eq!(store.status(), Status::Ready);
    }

    #[test]
    fn test_edits_require_load() {
        let mut store = PresentationStore::new(MemoryBackend::new());
        let result = store.create_presentation("Deck", "");

        assert!(matches!(result, Err(Error::NotLoaded)));
        assert!(store.backend().stored().is_empty());
        assert!(store.error().is_some());
    }

    #[test]
    fn test_q1_review_example() {
        let mut store = loaded();
        let id = store.create_presentation("Q1 Review", "").unwrap();

        let snapshot = store.snapshot();
        let deck = snapshot.presentation(&id).unwrap();
        assert_eq!(deck.name, "Q1 Review");
        assert!(!deck.favorited);
        assert_eq!(deck.slides.len(), 1);
        assert!(deck.slides[0].elements.is_empty());

        let slide_id = deck.slides[0].id.clone();
        store
            .add_element(
                &id,
                &slide_id,
                ElementKind::Text(TextContent {
                    content: String::new(),
                    font_size: 2.0,
                    color: "#FF5733".to_string(),
                }),
            )
            .unwrap();

        let snapshot = store.snapshot();
        let elements = &snapshot.presentation(&id).unwrap().slides[0].elements;
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].position, Position { x: 0.0, y: 0.0 });
        assert_eq!(elements[0].size, Size { width: 30.0, height: 10.0 });

        // Persisted exactly as adopted
        assert_eq!(store.backend().stored(), *snapshot);
    }

    #[test]
    fn test_blank_name_is_rejected_before_write() {
        let mut store = loaded();
        assert!(matches!(
            store.create_presentation("  ", ""),
            Err(Error::Validation(_))
        ));
        assert!(store.snapshot().is_empty());
        assert!(store.error().is_some());
    }

    #[test]
    fn test_failed_write_keeps_state_and_records_error() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();
        let before = store.snapshot();

        store.backend().set_fail_writes(true);
        let result = store.add_slide(&id);

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(*store.snapshot(), *before);
        assert!(store.error().unwrap().contains("write rejected"));

        store.backend().set_fail_writes(false);
        assert!(store.add_slide(&id).unwrap().is_some());
        assert!(store.error().is_none());
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();
        let before = store.snapshot();

        store.add_slide(&id).unwrap();

        assert_eq!(before.presentation(&id).unwrap().slides.len(), 1);
        assert_eq!(store.snapshot().presentation(&id).unwrap().slides.len(), 2);
    }

    #[test]
    fn test_delete_last_slide_message() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();
        let slide_id = store.snapshot().presentation(&id).unwrap().slides[0].id.clone();

        assert!(matches!(store.delete_slide(&id, &slide_id), Err(Error::LastSlide)));
        assert!(store.error().unwrap().contains("delete the presentation instead"));
        assert_eq!(store.snapshot().presentation(&id).unwrap().slides.len(), 1);
    }

    #[test]
    fn test_add_slide_to_missing_presentation() {
        let mut store = loaded();
        assert_eq!(store.add_slide("missing").unwrap(), None);
    }

    #[test]
    fn test_toggle_favorite_round_trips() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();

        assert!(store.toggle_favorite(&id).unwrap());
        assert!(!store.toggle_favorite(&id).unwrap());
        assert!(!store.snapshot().presentation(&id).unwrap().favorited);
    }

    #[test]
    fn test_rename_presentation() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();

        store.rename_presentation(&id, " Renamed ").unwrap();
        assert_eq!(store.snapshot().presentation(&id).unwrap().name, "Renamed");
        assert!(store.rename_presentation(&id, "").is_err());
    }

    #[test]
    fn test_move_slide() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();
        let first = store.snapshot().presentation(&id).unwrap().slides[0].id.clone();
        let second = store.add_slide(&id).unwrap().unwrap();

        store.move_slide(&id, 1, 0).unwrap();
        assert_eq!(
            store.snapshot().presentation(&id).unwrap().slide_ids(),
            vec![second.as_str(), first.as_str()]
        );
    }

    #[test]
    fn test_lookup_failures_record_error() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();

        assert!(store.move_slide(&id, 5, 0).is_err());
        assert!(store.error().unwrap().contains("out of range"));

        store.add_slide(&id).unwrap();
        assert!(store.error().is_none());

        assert!(matches!(
            store.toggle_favorite("missing"),
            Err(Error::PresentationNotFound(_))
        ));
        assert!(store.error().is_some());

        store.add_slide(&id).unwrap();
        assert!(store.rename_presentation("missing", "Other").is_err());
        assert!(store.error().is_some());
        assert_eq!(store.snapshot().presentation(&id).unwrap().slides.len(), 3);
    }

    #[test]
    fn test_concurrent_writer_is_detected() {
        let backend = MemoryBackend::new();
        let mut store = PresentationStore::new(backend);
        store.load().unwrap();
        store.create_presentation("Mine", "").unwrap();

        // Another session writes behind our back
        let mut other = store.snapshot().as_ref().clone();
        other.presentations.clear();
        let base = store.revision().clone();
        store.backend().replace(&other, &base).unwrap();

        let before = store.snapshot();
        let result = store.create_presentation("Second", "");
        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert_eq!(*store.snapshot(), *before);

        // Reloading picks up the other writer's document
        store.load().unwrap();
        assert!(store.snapshot().is_empty());
        store.create_presentation("Second", "").unwrap();
    }

    #[test]
    fn test_background_and_transition() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();

        store
            .update_default_background(&id, Background::solid("#000000"))
            .unwrap();
        store
            .update_transition_type(&id, TransitionType::SlideLeft)
            .unwrap();
        assert!(store
            .update_default_background(&id, Background::solid("black"))
            .is_err());

        let snapshot = store.snapshot();
        let deck = snapshot.presentation(&id).unwrap();
        assert_eq!(deck.default_background.color, "#000000");
        assert_eq!(deck.transition_type, TransitionType::SlideLeft);
    }
}
