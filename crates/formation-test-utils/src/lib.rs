//! Shared test utilities for the formation workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fault`]: [`FaultyTransport`] for injecting platform failures
//! - [`templates`]: template fixtures used across test suites
//! - [`workspace`]: [`TestWorkspace`] temporary directory with template,
//!   state and settings helpers

pub mod fault;
pub mod templates;
pub mod workspace;

pub use fault::{CallKind, FaultyTransport};
pub use workspace::TestWorkspace;
