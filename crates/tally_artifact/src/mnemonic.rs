//! Extraction of the build-configuration segment from output paths.

/// Returns the configuration mnemonic of a blaze-out-relative path.
///
/// Output paths are laid out as `<mnemonic>/<bin|genfiles|testlogs>/...`, so
/// the mnemonic is the first path segment. A path without any `/` is returned
/// whole.
pub fn configuration_mnemonic(relative_path: &str) -> &str {
    match relative_path.find('/') {
        Some(index) => &relative_path[..index],
        None => relative_path,
    }
}
