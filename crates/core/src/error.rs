//! Error types for the Presto store.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing or persisting the store.
#[derive(Error, Debug)]
pub enum Error {
    /// A value failed a pre-mutation check (empty name, bad colour, ...).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No presentation with the given id.
    #[error("Presentation not found: {0}")]
    PresentationNotFound(String),

    /// No slide with the given id in the presentation.
    #[error("Slide not found: {0}")]
    SlideNotFound(String),

    /// No element with the given id on the slide.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The slide is the presentation's only slide.
    #[error("Cannot delete the only slide of a presentation; delete the presentation instead")]
    LastSlide,

    /// A write was attempted before the store was loaded.
    #[error("Store has not been loaded yet")]
    NotLoaded,

    /// The backend holds a newer document than the one the write was based on.
    #[error("Store was changed elsewhere (expected revision {expected}, found {found})")]
    Conflict { expected: String, found: String },

    /// The persistence backend failed or rejected the request.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
