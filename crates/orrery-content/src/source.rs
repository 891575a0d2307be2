//! Byte sources: where a [`TypeReaderRegistry`](crate::TypeReaderRegistry) gets asset bytes.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orrery_core::alloc::HashMap;

use crate::error::{ContentError, ContentResult};
use crate::key::normalize_separators;
use crate::scratch::ScratchBuffer;

/// Fetches the raw bytes of a named asset.
pub trait ByteSource: Send + Sync {
    /// Read the bytes of `name`, resolved against `root_directory`.
    ///
    /// Sources that have to copy may fill `scratch` and return a slice of it.
    fn read<'s>(
        &'s self,
        root_directory: &Path,
        name: &str,
        scratch: &'s mut ScratchBuffer,
    ) -> ContentResult<&'s [u8]>;

    /// Check whether `name` exists.
    fn exists(&self, root_directory: &Path, name: &str) -> bool;
}

/// Reads assets from disk at `base_path / root_directory / name[.extension]`.
#[derive(Debug, Clone)]
pub struct FileSource {
    base_path: PathBuf,
    extension: Option<String>,
}

impl FileSource {
    /// Create a file source rooted at `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            extension: None,
        }
    }

    /// Append `.extension` to every asset name (e.g. `xnb` for compiled content).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    /// Resolve an asset name to a physical path.
    pub fn resolve(&self, root_directory: &Path, name: &str) -> PathBuf {
        let mut path = self.base_path.join(root_directory);
        for part in normalize_separators(name).split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }

        match &self.extension {
            Some(extension) => {
                let mut path = path.into_os_string();
                path.push(".");
                path.push(extension);
                PathBuf::from(path)
            }
            None => path,
        }
    }
}

impl ByteSource for FileSource {
    fn read<'s>(
        &'s self,
        root_directory: &Path,
        name: &str,
        scratch: &'s mut ScratchBuffer,
    ) -> ContentResult<&'s [u8]> {
        let path = self.resolve(root_directory, name);
        let io_error = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ContentError::NotFound {
                    name: name.to_string(),
                }
            } else {
                ContentError::Io {
                    path: path.clone(),
                    source,
                }
            }
        };

        let mut file = std::fs::File::open(&path).map_err(io_error)?;
        let len = file.metadata().map_err(io_error)?.len();
        let len = usize::try_from(len)
            .map_err(|_| ContentError::read_failed(name, format!("file too large ({len} bytes)")))?;

        let buffer = scratch.get(len);
        file.read_exact(&mut buffer[..len]).map_err(io_error)?;
        tracing::trace!(path = %path.display(), len, "read asset bytes");

        let filled: &'s [u8] = buffer;
        Ok(&filled[..len])
    }

    fn exists(&self, root_directory: &Path, name: &str) -> bool {
        self.resolve(root_directory, name).is_file()
    }
}

/// In-memory resource table, for embedded content and tests.
///
/// Names are matched after separator normalization; the root directory is ignored.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    entries: HashMap<String, Arc<[u8]>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl AsRef<str>, bytes: impl Into<Arc<[u8]>>) {
        self.entries
            .insert(normalize_separators(name.as_ref()), bytes.into());
    }

    /// Add static bytes under `name`.
    pub fn insert_static(&mut self, name: impl AsRef<str>, bytes: &'static [u8]) {
        self.insert(name, bytes);
    }

    /// Remove the entry for `name`.
    pub fn remove(&mut self, name: impl AsRef<str>) -> Option<Arc<[u8]>> {
        self.entries.remove(&normalize_separators(name.as_ref()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ByteSource for MemorySource {
    fn read<'s>(
        &'s self,
        _root_directory: &Path,
        name: &str,
        _scratch: &'s mut ScratchBuffer,
    ) -> ContentResult<&'s [u8]> {
        self.entries
            .get(&normalize_separators(name))
            .map(|bytes| &bytes[..])
            .ok_or_else(|| ContentError::NotFound {
                name: name.to_string(),
            })
    }

    fn exists(&self, _root_directory: &Path, name: &str) -> bool {
        self.entries.contains_key(&normalize_separators(name))
    }
}
