//! Command implementations for formation-cli

pub mod apply;
pub mod inspect;
pub mod validate;

pub use apply::{ApplyOptions, run_apply};
pub use inspect::run_inspect;
pub use validate::run_validate;
