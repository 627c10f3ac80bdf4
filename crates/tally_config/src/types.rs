//! Configuration types deserialized from `tally.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tally_store::{OutputsStore, PayloadFormat};

/// The top-level configuration parsed from `tally.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TallyConfig {
    /// Where and how the outputs snapshot is stored.
    #[serde(default)]
    pub store: StoreConfig,
    /// Filesystem locations of build outputs.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Snapshot storage settings.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the snapshot, relative to the project directory.
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
    /// Snapshot file name within `dir`.
    #[serde(default = "default_store_file")]
    pub file: String,
    /// Payload encoding used when saving.
    #[serde(default)]
    pub format: PayloadFormat,
}

/// Build output locations.
#[derive(Debug, Default, Deserialize)]
pub struct PathsConfig {
    /// The build's output base. Relative local artifact paths in the
    /// snapshot are resolved against it.
    #[serde(default)]
    pub output_base: Option<PathBuf>,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".tally")
}

fn default_store_file() -> String {
    "outputs.snapshot".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            file: default_store_file(),
            format: PayloadFormat::default(),
        }
    }
}

impl TallyConfig {
    /// Path of the snapshot file for a project rooted at `project_dir`.
    pub fn snapshot_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store.dir).join(&self.store.file)
    }

    /// Builds the snapshot store described by this configuration.
    pub fn open_store(&self, project_dir: &Path) -> OutputsStore {
        let store =
            OutputsStore::new(self.snapshot_path(project_dir)).with_format(self.store.format);
        match &self.paths.output_base {
            Some(output_base) => store.with_output_base(output_base),
            None => store,
        }
    }
}
