//! [`TestWorkspace`] builder for CLI and end-to-end scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use formation_core::LocalPlatform;
use serde_json::Value;
use tempfile::TempDir;

/// A temporary working directory with helpers for writing templates and
/// settings and for reading back annotated templates and platform state.
///
/// # Example
///
/// ```rust,no_run
/// use formation_test_utils::{TestWorkspace, templates};
///
/// let ws = TestWorkspace::new();
/// ws.write("template.yaml", templates::PROJECT_WITH_FOLDERS);
/// ws.assert_file_exists("template.yaml");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write the project settings file `formation.toml`.
    pub fn write_settings(&self, content: &str) -> PathBuf {
        self.write("formation.toml", content)
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Read a YAML or JSON document into the template model.
    pub fn read_document(&self, relative: &str) -> Value {
        serde_yaml::from_str(&self.read(relative))
            .unwrap_or_else(|e| panic!("{relative} is not a valid document: {e}"))
    }

    /// Load platform state persisted at `relative`.
    pub fn load_state(&self, relative: &str) -> LocalPlatform {
        LocalPlatform::load(&self.path(relative))
            .unwrap_or_else(|e| panic!("Could not load state {relative}: {e}"))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the path exists.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
