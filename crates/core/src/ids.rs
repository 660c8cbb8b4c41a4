//! Identifier generation for presentations, slides and elements.

use uuid::Uuid;

/// Generate a fresh unique identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
