//! Reading and writing the index snapshot file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tally_artifact::ParserRegistry;
use tally_index::{decode, decode_legacy_remote, encode, TargetSetIndex};

use crate::error::StoreError;
use crate::snapshot::{decode_snapshot, encode_snapshot, PayloadFormat, PersistedOutputs};

/// Version recorded in snapshots written by this build.
const TALLY_VERSION: &str = env!("CARGO_PKG_VERSION");

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A snapshot file holding one persisted [`TargetSetIndex`].
#[derive(Debug, Clone)]
pub struct OutputsStore {
    path: PathBuf,
    format: PayloadFormat,
    registry: ParserRegistry,
    output_base: Option<PathBuf>,
}

impl OutputsStore {
    /// Creates a store for the snapshot at `path`, writing binary payloads
    /// and parsing artifacts with [`ParserRegistry::standard`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: PayloadFormat::default(),
            registry: ParserRegistry::standard(),
            output_base: None,
        }
    }

    /// Sets the payload format used when saving. Loading accepts either.
    pub fn with_format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the registry used to parse artifact descriptors on load.
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the output base that relative local artifact paths resolve against.
    pub fn with_output_base(mut self, output_base: impl Into<PathBuf>) -> Self {
        self.output_base = Some(output_base.into());
        self
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload format used when saving.
    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Loads the persisted index, or an empty index if there is none or it
    /// cannot be read.
    ///
    /// This is fail-safe: any problem with the snapshot is logged and results
    /// in starting from an empty index.
    pub fn load(&self) -> TargetSetIndex {
        match self.try_load() {
            Ok(Some(index)) => index,
            Ok(None) => TargetSetIndex::empty(),
            Err(err) => {
                tracing::debug!(
                    target = "tally.store",
                    path = %self.path.display(),
                    error = %err,
                    "failed to load outputs snapshot; treating as empty"
                );
                TargetSetIndex::empty()
            }
        }
    }

    /// Loads the persisted index, returning `Ok(None)` if no snapshot exists.
    pub fn try_load(&self) -> Result<Option<TargetSetIndex>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        let (header, outputs) = decode_snapshot(&self.path, &raw)?;
        if header.tally_version != TALLY_VERSION {
            tracing::debug!(
                target = "tally.store",
                path = %self.path.display(),
                written_by = %header.tally_version,
                current = TALLY_VERSION,
                "loading outputs snapshot written by a different tally version"
            );
        }

        let index = match outputs {
            PersistedOutputs::Tracked(tracked) => {
                decode(&tracked, &self.registry, self.output_base.as_deref()).map_err(
                    |source| StoreError::Decode {
                        path: self.path.clone(),
                        source,
                    },
                )?
            }
            PersistedOutputs::LegacyRemote(remote) => {
                decode_legacy_remote(&remote, &self.registry)
            }
        };
        Ok(Some(index))
    }

    /// Persists `index`, replacing any existing snapshot.
    ///
    /// The snapshot is written to a temporary file next to the destination
    /// and renamed into place, so readers never observe a partial file.
    pub fn save(&self, index: &TargetSetIndex) -> Result<(), StoreError> {
        self.write(&PersistedOutputs::Tracked(encode(index)))
    }

    /// Deletes the snapshot. Returns `false` if there was none.
    pub fn remove(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            }),
        }
    }

    pub(crate) fn write(&self, outputs: &PersistedOutputs) -> Result<(), StoreError> {
        let bytes = encode_snapshot(outputs, self.format, TALLY_VERSION)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;

        let (tmp_path, mut file) = open_unique_tmp_file(&self.path, parent).map_err(|e| {
            StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            }
        })?;
        let written = file.write_all(&bytes).and_then(|()| file.sync_all());
        drop(file);
        if let Err(err) = written.and_then(|()| fs::rename(&tmp_path, &self.path)) {
            if let Err(remove_err) = fs::remove_file(&tmp_path) {
                if remove_err.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(
                        target = "tally.store",
                        path = %tmp_path.display(),
                        error = %remove_err,
                        "failed to remove temporary snapshot file"
                    );
                }
            }
            return Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            });
        }

        tracing::trace!(
            target = "tally.store",
            path = %self.path.display(),
            bytes = bytes.len(),
            "saved outputs snapshot"
        );
        Ok(())
    }
}

fn open_unique_tmp_file(dest: &Path, parent: &Path) -> io::Result<(PathBuf, fs::File)> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::other("destination path has no file name"))?;
    let pid = std::process::id();

    loop {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!(".tmp.{pid}.{counter}"));
        let tmp_path = parent.join(tmp_name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
}
