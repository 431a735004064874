//! Ready-made interactive message kinds built on [`crate::interactive`].

/// Field-by-field document editor
pub mod editable_document;
/// Page-flipping message
pub mod paged;

pub use editable_document::{Document, EditableDocumentMessage, FieldValue};
pub use paged::PagedMessage;
