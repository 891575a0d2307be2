//! Content manager configuration.

use std::path::PathBuf;

use crate::key::KeyComparison;

/// What `load::<T>` does when the cache holds the key under a different type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeMismatchPolicy {
    /// Treat it as a miss: read the asset again as `T` and replace the cache entry.
    #[default]
    Reread,
    /// Fail with [`ContentError::TypeMismatch`](crate::ContentError::TypeMismatch) without
    /// touching the reader or the cache.
    Error,
}

/// Configuration for a content manager.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Directory asset names resolve against. Changing it later does not reload anything.
    pub root_directory: PathBuf,
    /// How cache keys are compared.
    pub key_comparison: KeyComparison,
    /// Behaviour on a cache hit of the wrong type.
    pub mismatch_policy: TypeMismatchPolicy,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::new(),
            key_comparison: KeyComparison::platform_default(),
            mismatch_policy: TypeMismatchPolicy::default(),
        }
    }
}

impl ContentConfig {
    pub fn with_root_directory(mut self, root_directory: impl Into<PathBuf>) -> Self {
        self.root_directory = root_directory.into();
        self
    }

    pub fn with_key_comparison(mut self, key_comparison: KeyComparison) -> Self {
        self.key_comparison = key_comparison;
        self
    }

    pub fn with_mismatch_policy(mut self, mismatch_policy: TypeMismatchPolicy) -> Self {
        self.mismatch_policy = mismatch_policy;
        self
    }
}
