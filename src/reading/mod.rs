//! Reading requests: input handling, generated content, and the manager
//!
//! A "reading" is one request for generated relationship narrative content
//! for a pair of persons, in preview or full form. This module owns input
//! sanitization/validation, the content payload types with their generation
//! collaborator, and the [`ReadingManager`] that creates and fetches reading
//! records through the durable store.

pub mod content;
pub mod input;
pub mod manager;

pub use content::{ContentGenerator, FullReading, PreviewReading, TemplateGenerator};
pub use input::{validate, Gender, PersonInput, RawPersonInput, RawReadingInput, ReadingInput};
pub use manager::{ReadingManager, ReadingView};
