//! Settings resolution
//!
//! Settings are read from TOML files and merged in a fixed order, later
//! sources overriding earlier ones:
//!
//! 1. **Global** - `<config_dir>/formation/config.toml`
//! 2. **Project** - `formation.toml` in the working directory
//! 3. **Command line** - flags passed to [`SettingsResolver::resolve_with`]
//!
//! ```toml
//! [gateway]
//! policy = "get-or-create"
//!
//! [output]
//! format = "json"
//! tree = true
//! ```

mod resolver;
mod settings;

pub use resolver::{PROJECT_SETTINGS_FILE, ResolvedSettings, SettingsResolver};
pub use settings::{GatewaySection, OutputFormat, OutputSection, Settings};
