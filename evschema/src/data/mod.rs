//! Schema data structures and the selection engine.
//!
//! ## Architecture
//!
//! - [`field`] - Fields, type variants and selectable nodes
//! - [`schema`] - Root schemas and structural walks
//! - [`catalog`] - The catalog contract and an in-memory bundle catalog
//! - [`selection`] - Path-keyed selection store
//! - [`classify`] - Field kinds and configuration sources
//! - [`resolver`] - Lazy, single-flight reference hydration
//! - [`projector`] - Event document projection
//! - [`session`] - One schema being composed into an event

/// Textual selection actions.
pub mod action;

/// Schema catalog contract and implementations.
pub mod catalog;

/// Presentation groups of root fields.
pub mod categories;

/// Field kind classification.
pub mod classify;

/// JSON path writer used by the projector.
pub mod document;

/// Field and type variant representation.
pub mod field;

/// Selection store to event document projection.
pub mod projector;

/// Lazy hydration of referenced subtrees.
pub mod resolver;

/// Root schema representation.
pub mod schema;

/// Path-keyed selection store.
pub mod selection;

/// Composition session.
pub mod session;

pub use field::{Field, FieldType, Selectable, TypeVariant};
pub use schema::Schema;
pub use selection::{SelectionKey, SelectionMode, SelectionStore};
pub use session::Session;
