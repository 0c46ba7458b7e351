//! Hierarchical settings resolution

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::settings::{OutputFormat, Settings};
use crate::Result;
use crate::policy::CreationPolicy;

/// Name of the project settings file looked up in the working directory.
pub const PROJECT_SETTINGS_FILE: &str = "formation.toml";

/// Effective settings after every source is merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSettings {
    pub policy: CreationPolicy,
    pub output_format: OutputFormat,
    pub show_tree: bool,
}

impl From<Settings> for ResolvedSettings {
    fn from(settings: Settings) -> Self {
        Self {
            policy: settings.gateway.policy.unwrap_or_default(),
            output_format: settings.output.format.unwrap_or_default(),
            show_tree: settings.output.tree.unwrap_or(false),
        }
    }
}

/// Resolves settings by merging the global and project files.
pub struct SettingsResolver {
    /// Directory holding `formation.toml`
    root: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl SettingsResolver {
    /// Create a resolver for the project rooted at `root`.
    ///
    /// The global file lives under the platform config directory:
    /// - Linux: `~/.config/formation/config.toml`
    /// - macOS: `~/Library/Application Support/formation/config.toml`
    /// - Windows: `%APPDATA%\formation\config.toml`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(root: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("formation"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project settings file, whether or not it exists.
    pub fn project_settings_path(&self) -> PathBuf {
        self.root.join(PROJECT_SETTINGS_FILE)
    }

    /// Merge the global and project files.
    ///
    /// Missing files are skipped. Invalid TOML in either is an error.
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        self.resolve_with(&Settings::default())
    }

    /// Merge the global and project files, then `overrides` on top.
    pub fn resolve_with(&self, overrides: &Settings) -> Result<ResolvedSettings> {
        let mut settings = Settings::default();

        if let Some(global_dir) = self.global_config_dir() {
            let global_path = global_dir.join("config.toml");
            Self::merge_file(&mut settings, &global_path, "global")?;
        }
        Self::merge_file(&mut settings, &self.project_settings_path(), "project")?;

        settings.merge(overrides);
        Ok(ResolvedSettings::from(settings))
    }

    fn merge_file(settings: &mut Settings, path: &Path, layer: &str) -> Result<()> {
        if !path.is_file() {
            tracing::debug!(?path, layer, "No settings file, skipping");
            return Ok(());
        }
        tracing::debug!(?path, layer, "Loading settings");
        let content = fs::read_to_string(path)?;
        settings.merge(&Settings::parse(&content)?);
        Ok(())
    }
}
