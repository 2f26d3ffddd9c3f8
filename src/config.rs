//! Library configuration.

use serde::{Deserialize, Serialize};

/// Default LRU cache size handed to store backends that support caching.
pub const DEFAULT_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Default bound on simultaneously open stores per engine.
pub const DEFAULT_MAX_OPEN_STORES: usize = 64;

/// Configuration shared by the [`Myrica`](crate::Myrica) façade, the
/// per-index engines and the store backends.
///
/// `data_dir` is required and is the root under which every index gets its
/// own directory. A trailing path separator is stripped on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for all index data.
    pub data_dir: String,

    /// Enables chatty per-command tracing.
    #[serde(default)]
    pub debug: bool,

    /// Ask store backends to keep a block cache.
    #[serde(default)]
    pub enable_cache: bool,

    /// Cache size in bytes, meaningful only with `enable_cache`.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Bound on simultaneously open stores per engine.
    #[serde(default = "default_max_open_stores")]
    pub max_open_stores: usize,
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_max_open_stores() -> usize {
    DEFAULT_MAX_OPEN_STORES
}

impl Config {
    /// Create a configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<String>) -> Self {
        let mut data_dir = data_dir.into();
        while data_dir.len() > 1 && data_dir.ends_with('/') {
            data_dir.pop();
        }

        Self {
            data_dir,
            debug: false,
            enable_cache: false,
            cache_size: DEFAULT_CACHE_SIZE,
            max_open_stores: DEFAULT_MAX_OPEN_STORES,
        }
    }

    /// Enable or disable debug tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable the store cache with the given size in bytes.
    pub fn with_cache(mut self, size: usize) -> Self {
        self.enable_cache = true;
        self.cache_size = size;
        self
    }

    /// Override the open-store bound.
    pub fn with_max_open_stores(mut self, max: usize) -> Self {
        self.max_open_stores = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = Config::new("/tmp/myrica-data/");
        assert_eq!(config.data_dir, "/tmp/myrica-data");

        let config = Config::new("/tmp/myrica-data///");
        assert_eq!(config.data_dir, "/tmp/myrica-data");
    }

    #[test]
    fn test_builder_options() {
        let config = Config::new("/tmp/data")
            .with_debug(true)
            .with_cache(1024)
            .with_max_open_stores(8);

        assert!(config.debug);
        assert!(config.enable_cache);
        assert_eq!(config.cache_size, 1024);
        assert_eq!(config.max_open_stores, 8);
    }
}
