//! # evschema
//!
//! A selection engine that composes tracking events from versioned schemas.
//!
//! A schema is a tree of fields, some of which point at definitions fetched
//! lazily from a catalog. Callers select fields and values along paths; the
//! engine keeps the selection in a path-keyed store and projects it into a
//! JSON event document on demand.
//!
//! ## Features
//!
//! - Copy-on-write selection snapshots with ADD, REPLACE and REMOVE semantics
//! - Cascading ancestor selection and mutually exclusive variant groups
//! - Single-flight hydration of shared references
//! - Pure, idempotent event projection
//! - TOML and JSON configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use evschema::{config::EngineConfig, data::catalog::BundleCatalog, data::Session};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(BundleCatalog::load("catalog.json").await?);
//! let mut session =
//!     Session::open(catalog, EngineConfig::default(), "event", None, Some("Click")).await?;
//!
//! session.dispatch("select actor.id").await;
//! println!("{}", session.event());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Engine configuration
//! - [`data`] - Schema data structures and the selection engine
//! - [`run`] - Batch composition workflow

/// Engine configuration loading.
pub mod config;

/// Schema data structures and the selection engine.
///
/// This module holds the field model, the selection store, reference
/// hydration and event projection.
pub mod data;

/// Batch composition workflow.
pub mod run;

pub use run::*;
pub use serde_json::Value;
