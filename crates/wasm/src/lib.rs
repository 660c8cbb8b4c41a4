//! WASM bindings for the Presto store.
//!
//! The browser editor keeps the store in JavaScript and calls into this crate
//! to normalize fetched documents and compute the next document for an edit.
//! Persisting the result stays on the JavaScript side.

use presto_core::mutation::new_presentation;
use presto_core::{Mutation, Presentation, SlideCursor, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(message: impl AsRef<str>) -> JsValue {
    js_sys::Error::new(message.as_ref()).into()
}

fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("Invalid {}: {}", what, e)))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than ES Maps, so the result can go straight to JSON.stringify
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error(format!("Serialization error: {}", e)))
}

/// Fill defaults into a store fetched from the API.
///
/// # Arguments
/// * `store` - The `store` object of the API response (`{presentations: [...]}`)
#[wasm_bindgen]
pub fn normalize_store(store: JsValue) -> Result<JsValue, JsValue> {
    let store: Store = from_js(store, "store")?;
    to_js(&store)
}

/// Fill defaults into a single presentation.
#[wasm_bindgen]
pub fn normalize_presentation(presentation: JsValue) -> Result<JsValue, JsValue> {
    let presentation: Presentation = from_js(presentation, "presentation")?;
    to_js(&presentation)
}

/// Build a new presentation with one blank slide.
///
/// Throws if the name is empty.
#[wasm_bindgen]
pub fn create_presentation(name: &str, description: &str) -> Result<JsValue, JsValue> {
    let presentation = create_presentation_impl(name, description).map_err(js_error)?;
    to_js(&presentation)
}

fn create_presentation_impl(name: &str, description: &str) -> Result<Presentation, String> {
    new_presentation(name, description).map_err(|e| e.to_string())
}

/// Compute the store that results from an edit.
///
/// # Arguments
/// * `store` - The current store
/// * `mutation` - An edit such as `{op: "deleteSlide", presentationId, slideId}`
///
/// # Returns
/// The next store. The input is not modified; on error nothing changes and
/// the thrown message is suitable for showing to the user.
#[wasm_bindgen]
pub fn apply_mutation(store: JsValue, mutation: JsValue) -> Result<JsValue, JsValue> {
    let store: Store = from_js(store, "store")?;
    let mutation: Mutation = from_js(mutation, "mutation")?;

    let next = apply_mutation_impl(&store, &mutation).map_err(js_error)?;
    to_js(&next)
}

fn apply_mutation_impl(store: &Store, mutation: &Mutation) -> Result<Store, String> {
    store.apply(mutation).map_err(|e| e.to_string())
}

/// 1-based slide number selected by a `?slide=` query string, clamped into
/// a deck of `count` slides.
#[wasm_bindgen]
pub fn slide_from_query(query: &str, count: usize) -> usize {
    SlideCursor::from_query(query, count).number()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_apply() {
        let presentation = create_presentation_impl("Q1 Review", "").unwrap();
        let store = apply_mutation_impl(
            &Store::new(),
            &Mutation::AddPresentation {
                presentation: presentation.clone(),
            },
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.presentations[0].slides.len(), 1);
        assert!(!store.presentations[0].favorited);
    }

    #[test]
    fn test_errors_are_user_messages() {
        assert!(create_presentation_impl("", "").is_err());

        let presentation = create_presentation_impl("Deck", "").unwrap();
        let store = Store {
            presentations: vec![presentation.clone()],
        };
        let message = apply_mutation_impl(
            &store,
            &Mutation::DeleteSlide {
                presentation_id: presentation.id.clone(),
                slide_id: presentation.slides[0].id.clone(),
            },
        )
        .unwrap_err();
        assert!(message.contains("delete the presentation instead"));
    }

    #[test]
    fn test_slide_from_query() {
        assert_eq!(slide_from_query("?slide=2", 3), 2);
        assert_eq!(slide_from_query("?slide=9", 3), 3);
        assert_eq!(slide_from_query("", 3), 1);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    fn deck_store() -> (Store, Presentation) {
        let presentation = create_presentation_impl("Deck", "").unwrap();
        let store = Store {
            presentations: vec![presentation.clone()],
        };
        (store, presentation)
    }

    #[wasm_bindgen_test]
    fn apply_mutation_returns_next_store() {
        let (store, presentation) = deck_store();
        let mutation = Mutation::AddSlide {
            presentation_id: presentation.id.clone(),
            slide_id: "second".to_string(),
        };

        let next = apply_mutation(to_js(&store).unwrap(), to_js(&mutation).unwrap()).unwrap();
        let next: Store = from_js(next, "store").unwrap();

        assert_eq!(
            next.presentations[0].slide_ids(),
            vec![presentation.slides[0].id.as_str(), "second"]
        );
    }

    #[wasm_bindgen_test]
    fn apply_mutation_throws_js_error() {
        let (store, presentation) = deck_store();
        let mutation = Mutation::DeleteSlide {
            presentation_id: presentation.id.clone(),
            slide_id: presentation.slides[0].id.clone(),
        };

        let thrown =
            apply_mutation(to_js(&store).unwrap(), to_js(&mutation).unwrap()).unwrap_err();
        let error: js_sys::Error = thrown.dyn_into().unwrap();
        let message = String::from(error.message());
        assert!(message.contains("delete the presentation instead"));
    }
}
