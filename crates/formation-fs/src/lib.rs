//! Document I/O for Formation
//!
//! Loads templates and platform state from YAML, JSON or TOML files and
//! writes them back atomically.

pub mod error;
pub mod format;
pub mod io;
pub mod store;

pub use error::{Error, Result};
pub use format::Format;
pub use store::{DocumentStore, render};
