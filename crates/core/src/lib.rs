//! Core document model, normalization and store handle for the Presto
//! slide editor.

pub mod backend;
pub mod cursor;
pub mod error;
pub mod ids;
pub mod mutation;
pub mod normalize;
pub mod store;
pub mod types;
pub mod validate;

pub use backend::{Backend, FileBackend, MemoryBackend, Revision, Snapshot, StoreDocument};
pub use cursor::{Playback, SlideCursor, Step};
pub use error::{Error, Result};
pub use mutation::Mutation;
pub use store::{PresentationStore, Status};
pub use types::{
    Background, BackgroundStyle, CodeContent, Element, ElementKind, Gradient, ImageContent,
    Position, Presentation, Size, Slide, Store, TextContent, TransitionType, VideoContent,
};
