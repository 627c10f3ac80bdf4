//! Locations of build inputs and outputs as reported by target metadata.

use serde::{Deserialize, Serialize};

/// Prefix of execution-root-relative paths that lie in the output tree.
pub const OUTPUT_ROOT_PREFIX: &str = "blaze-out/";

/// A file referenced by target metadata: either a source file or a build output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Path relative to the package root (workspace or external repository).
    pub relative_path: String,

    /// Execution-root-relative directory the file lives under, e.g.
    /// `blaze-out/k8-opt/bin`. Empty for workspace source files.
    #[serde(default)]
    pub root_execution_path_fragment: String,

    /// Whether the file is a source file rather than a build output.
    pub is_source: bool,

    /// Whether the file belongs to an external repository.
    #[serde(default)]
    pub is_external: bool,
}

impl ArtifactLocation {
    /// A workspace source file.
    pub fn source(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            root_execution_path_fragment: String::new(),
            is_source: true,
            is_external: false,
        }
    }

    /// A build output under the given execution-root-relative directory.
    pub fn generated(
        root_execution_path_fragment: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            root_execution_path_fragment: root_execution_path_fragment.into(),
            is_source: false,
            is_external: false,
        }
    }

    /// Path of the file relative to the execution root.
    pub fn execution_root_relative_path(&self) -> String {
        if self.root_execution_path_fragment.is_empty() {
            self.relative_path.clone()
        } else {
            format!(
                "{}/{}",
                self.root_execution_path_fragment.trim_end_matches('/'),
                self.relative_path
            )
        }
    }
}
