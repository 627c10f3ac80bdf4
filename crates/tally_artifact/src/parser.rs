//! Registry of descriptor parsers.
//!
//! Each [`DescriptorKind`] maps to at most one parse function. Descriptors of
//! a kind with no registered parser, or that a parser rejects, produce no
//! record. Callers filter those out rather than failing the whole load, so
//! state written by other tool versions degrades instead of breaking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::descriptor::{ArtifactDescriptor, DescriptorKind};
use crate::record::{ArtifactRecord, LocalArtifact, RemoteArtifact};

/// Turns a descriptor into a record, given the optional output base used to
/// resolve relative local paths.
pub type ParseFn = fn(&ArtifactDescriptor, Option<&Path>) -> Option<ArtifactRecord>;

/// Maps descriptor kinds to the function that parses them.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<DescriptorKind, ParseFn>,
}

impl ParserRegistry {
    /// Creates a registry with no parsers.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry that understands local files and remote artifacts.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(DescriptorKind::LocalFile, parse_local_file);
        registry.register(DescriptorKind::RemoteArtifact, parse_remote_artifact);
        registry
    }

    /// Registers `parser` for `kind`, returning the parser it replaces.
    pub fn register(&mut self, kind: DescriptorKind, parser: ParseFn) -> Option<ParseFn> {
        self.parsers.insert(kind, parser)
    }

    /// Returns `true` if a parser is registered for `kind`.
    pub fn supports(&self, kind: DescriptorKind) -> bool {
        self.parsers.contains_key(&kind)
    }

    /// Parses a descriptor, returning `None` if no parser recognizes it.
    pub fn parse(
        &self,
        descriptor: &ArtifactDescriptor,
        output_base: Option<&Path>,
    ) -> Option<ArtifactRecord> {
        let kind = descriptor.kind();
        let Some(parser) = self.parsers.get(&kind) else {
            tracing::debug!(
                target = "tally.artifact",
                kind = ?kind,
                "no parser registered for artifact descriptor; skipping"
            );
            return None;
        };
        let record = parser(descriptor, output_base);
        if record.is_none() {
            tracing::debug!(
                target = "tally.artifact",
                kind = ?kind,
                "artifact descriptor rejected by parser; skipping"
            );
        }
        record
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.parsers.keys().collect();
        kinds.sort();
        f.debug_struct("ParserRegistry").field("kinds", &kinds).finish()
    }
}

fn parse_local_file(
    descriptor: &ArtifactDescriptor,
    output_base: Option<&Path>,
) -> Option<ArtifactRecord> {
    let local = descriptor.local_file.as_ref()?;
    if local.path.is_empty() || local.relative_path.is_empty() {
        return None;
    }
    let path = PathBuf::from(&local.path);
    let file = match output_base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    };
    Some(LocalArtifact::new(file, local.relative_path.clone()).into())
}

fn parse_remote_artifact(
    descriptor: &ArtifactDescriptor,
    _output_base: Option<&Path>,
) -> Option<ArtifactRecord> {
    let remote = descriptor.artifact.as_ref()?;
    if remote.relative_path.is_empty() {
        return None;
    }
    Some(
        RemoteArtifact::new(
            remote.relative_path.clone(),
            remote.length,
            remote.bytestream_uri.clone(),
            remote.digest.clone(),
        )
        .with_sync_start_time(remote.sync_start_time_millis)
        .into(),
    )
}
