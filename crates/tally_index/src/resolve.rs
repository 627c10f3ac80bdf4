//! Resolution of caller-supplied output paths to recorded artifacts.

use tally_artifact::{ArtifactLocation, ArtifactRecord, OUTPUT_ROOT_PREFIX};

use crate::index::TargetSetIndex;

/// Second path segments that older path formats omit, e.g.
/// `k8-opt/pkg/foo.jar` for `k8-opt/bin/pkg/foo.jar`.
pub const POSSIBLY_MISSING_PATH_COMPONENTS: [&str; 3] = ["bin", "genfiles", "testlogs"];

impl TargetSetIndex {
    /// Finds the artifact for a blaze-out-relative path.
    ///
    /// The exact path is tried first. On a miss, if the second segment of the
    /// path is one of [`POSSIBLY_MISSING_PATH_COMPONENTS`], the lookup is
    /// retried with that segment removed.
    pub fn find_output_artifact(&self, blaze_out_relative_path: &str) -> Option<&ArtifactRecord> {
        self.get(blaze_out_relative_path)
            .or_else(|| self.find_alternate_path_format(blaze_out_relative_path))
    }

    /// Finds the artifact a target-metadata location refers to.
    ///
    /// Source files and paths outside `blaze-out/` never resolve.
    pub fn find_output_artifact_at(&self, location: &ArtifactLocation) -> Option<&ArtifactRecord> {
        if location.is_source {
            return None;
        }
        let exec_root_path = location.execution_root_relative_path();
        let relative = exec_root_path.strip_prefix(OUTPUT_ROOT_PREFIX)?;
        self.find_output_artifact(relative)
    }

    /// Finds a generated file by its genfiles-relative path.
    ///
    /// Tries `<mnemonic>/genfiles/<path>` for every known configuration
    /// mnemonic and returns the first hit. Which mnemonic wins when several
    /// match is unspecified.
    pub fn resolve_genfiles_path(&self, genfiles_relative_path: &str) -> Option<&ArtifactRecord> {
        self.configuration_mnemonics().iter().find_map(|mnemonic| {
            self.find_output_artifact(&format!("{mnemonic}/genfiles/{genfiles_relative_path}"))
        })
    }

    fn find_alternate_path_format(&self, path: &str) -> Option<&ArtifactRecord> {
        let (first, rest) = path.split_once('/')?;
        let (second, tail) = rest.split_once('/')?;
        if !POSSIBLY_MISSING_PATH_COMPONENTS.contains(&second) {
            return None;
        }
        self.get(&format!("{first}/{tail}"))
    }
}
