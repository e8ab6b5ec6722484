//! libshelf-core library.
//!
//! Symbol-driven dependency inference for native libraries: the library
//! catalog, its symbol index and components, symbol-table extraction, and
//! snapshot persistence.
//!
//! # Conventions
//!
//! - **Errors**: each module exposes a `thiserror` enum with an
//!   `error_code()` mapping to [`error::ErrorCode`]; configuration loading
//!   uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod analyze;
pub mod catalog;
pub mod components;
pub mod config;
pub mod error;
pub mod extract;
pub mod library;
pub mod snapshot;
pub mod symbols;

pub use catalog::{AnalysisOptions, Catalog, CatalogError};
pub use error::ErrorCode;
