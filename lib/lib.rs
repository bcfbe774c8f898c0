//! burrow shared library.
//!
//! The core of a caching Gopher server: a bounded, concurrent file cache with
//! background freshness monitoring, layered over a gophermap menu engine.

/// Caching primitives for burrow.
pub mod cache;
pub mod error;
pub mod io;
/// Gophermap parsing and menu rendering.
pub mod menu;
pub mod policy;
pub mod settings;

/// Software name reported in generated policy files.
pub const SERVER_SOFTWARE: &str = "Burrow";

/// Software version reported in generated policy files.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
