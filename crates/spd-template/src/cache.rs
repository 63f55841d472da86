//! Template cache using moka
//!
//! Templates are loaded once per path and shared as `Arc<Template>` across
//! every artifact that instantiates them. Each entry remembers the blake3
//! hash of the source it was built from; a changed file is reloaded.

use crate::error::TemplateLoadError;
use crate::issue::{IssueKind, ValidationIssue};
use crate::template::Template;
use moka::sync::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

#[derive(Debug, Clone)]
struct CachedTemplate {
    hash: blake3::Hash,
    template: Arc<Template>,
}

/// Path-keyed, content-checked template cache
#[derive(Debug, Clone)]
pub struct TemplateCache {
    inner: Cache<PathBuf, CachedTemplate>,
}

impl TemplateCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Load a template, reusing the cached copy while its content is unchanged
    ///
    /// # Errors
    /// Returns [`TemplateLoadError`] when the file is unreadable or malformed.
    /// Failed loads are not cached.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Template>, TemplateLoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TemplateLoadError::new(
                path,
                vec![ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    1,
                    format!("cannot read template: {e}"),
                )],
            )
        })?;
        let hash = blake3::hash(source.as_bytes());

        if let Some(cached) = self.inner.get(path) {
            if cached.hash == hash {
                tracing::trace!(path = %path.display(), "template cache hit");
                return Ok(cached.template);
            }
            tracing::debug!(path = %path.display(), "template changed on disk, reloading");
        }

        let template = Arc::new(Template::from_source(path, &source)?);
        self.inner.insert(
            path.to_path_buf(),
            CachedTemplate {
                hash,
                template: Arc::clone(&template),
            },
        );
        Ok(template)
    }

    /// Drop a cached template
    #[inline]
    pub fn invalidate(&self, path: &Path) {
        self.inner.invalidate(path);
    }

    /// Drop every cached template
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Whether `path` has a cached template
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.inner.contains_key(path)
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for TemplateCache {
    /// Create cache with default capacity (1,024 templates)
    fn default() -> Self {
        Self::new(1_024)
    }
}
