//! # evschema-cli
//!
//! Command line front end of the `evschema` event composition engine.
//!
//! ## Modules
//!
//! - [`ctx`] - Application context and state management
//! - [`commands`] - Subcommand handlers
//!
//! ## Example
//!
//! ```text
//! evschema schemas --catalog catalog.json
//! evschema compose --catalog catalog.json --schema event --type Click \
//!     --select actor.id --value object=Article
//! evschema categories --catalog catalog.json --schema event
//! ```

/// Application context and state management.
pub mod ctx;

/// Subcommand handlers.
pub mod commands;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
