//! Memoized render results.
//!
//! Re-diffing a long motion on every keystroke is expensive, so callers
//! memoize merge results keyed by every input that affects the output and
//! invalidate whenever settings or the change set move. The engine itself
//! stays pure; the cache is owned by the caller.

use std::collections::HashMap;

use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::types::{ChangeSource, MotionRenderConfig};

/// Cache key — hex SHA-256 over motion id, render config, and change set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey(String);

/// Fingerprint one render request. Identical inputs produce identical keys;
/// any change to the mode, line length, numbering, highlight, or change set
/// produces a different one.
pub fn render_key(
    motion_id: u64,
    config: &MotionRenderConfig,
    changes: &[ChangeSource],
) -> RenderKey {
    let mut hasher = Sha256::new();
    hasher.update(motion_id.to_le_bytes());
    hasher.update(serde_json::to_string(config).unwrap_or_default());
    hasher.update(serde_json::to_string(changes).unwrap_or_default());
    let digest = hasher.finalize();
    return RenderKey(format!("{digest:x}"));
}

/// Lazily recomputed render results, keyed by [`RenderKey`].
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<RenderKey, String>,
}

impl RenderCache {
    /// An empty cache.
    pub fn new() -> Self {
        return Self::default();
    }

    /// The cached rendering for a key, if present.
    pub fn get(&self, key: &RenderKey) -> Option<&str> {
        return self.entries.get(key).map(String::as_str);
    }

    /// Return the cached rendering, or run `render` and cache its result.
    ///
    /// # Errors
    ///
    /// Propagates whatever `render` returns; failures are not cached.
    pub fn get_or_render<F>(&mut self, key: RenderKey, render: F) -> Result<String, Error>
    where
        F: FnOnce() -> Result<String, Error>,
    {
        if let Some(hit) = self.entries.get(&key) {
            tracing::trace!("render cache hit");
            return Ok(hit.clone());
        }
        let value = render()?;
        self.entries.insert(key, value.clone());
        return Ok(value);
    }

    /// Drop every entry — the reactive caller invalidates wholesale whenever
    /// a dependency changes.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Number of cached renderings.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}
