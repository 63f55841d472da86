//! Registry configuration
//!
//! The registry (`spd.toml`) lists the systems and identifier kinds of a
//! project, the artifacts to validate with their templates, and the source
//! roots scanned for traceability tags. Relative paths are resolved
//! against the directory holding the registry file.

use serde::Deserialize;
use spd_crossref::CommentSyntax;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default registry file name
pub const DEFAULT_REGISTRY: &str = "spd.toml";

/// Registry loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read registry {}: {source}", .path.display())]
    Read {
        /// Registry path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid registry TOML
    #[error("invalid registry {}: {source}", .path.display())]
    Parse {
        /// Registry path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Semantically invalid entry
    #[error("invalid registry {}: {reason}", .path.display())]
    Invalid {
        /// Registry path
        path: PathBuf,
        /// What is wrong
        reason: String,
    },
}

/// Registered system
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemEntry {
    /// System name as used in identifiers
    pub name: String,
}

/// Artifact to validate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactEntry {
    /// Artifact document
    pub path: PathBuf,
    /// Template it instantiates
    pub template: PathBuf,
}

/// Source roots for traceability
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeConfig {
    /// Files or directories to scan
    pub paths: Vec<PathBuf>,
    /// Extension to comment prefixes, merged over the defaults
    pub comment_syntax: BTreeMap<String, Vec<String>>,
}

/// Parsed registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Registry {
    /// Identifier kind allow-list (empty means unrestricted)
    pub kinds: Vec<String>,
    /// Registered systems
    pub systems: Vec<SystemEntry>,
    /// Artifacts to validate
    pub artifacts: Vec<ArtifactEntry>,
    /// Traceability settings
    pub code: Option<CodeConfig>,
}

impl Registry {
    /// Parse registry text; paths stay as written
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or empty names.
    pub fn from_toml(path: impl AsRef<Path>, content: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let registry: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if registry.systems.iter().any(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "system name must not be empty".to_string(),
            });
        }
        if let Some(kind) = registry.kinds.iter().find(|k| k.contains('-')) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: format!("identifier kind '{kind}' must not contain '-'"),
            });
        }
        Ok(registry)
    }

    /// Load a registry file and resolve its relative paths
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file is unreadable or invalid.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let registry = Self::from_toml(path, &content)?.resolved_against(base);
        tracing::debug!(
            systems = registry.systems.len(),
            artifacts = registry.artifacts.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    /// Rebase every relative path onto `base`
    #[must_use]
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for artifact in &mut self.artifacts {
            rebase(&mut artifact.path);
            rebase(&mut artifact.template);
        }
        if let Some(code) = &mut self.code {
            code.paths.iter_mut().for_each(rebase);
        }
        self
    }

    /// Registered system names
    #[must_use]
    pub fn registered_systems(&self) -> BTreeSet<String> {
        self.systems.iter().map(|s| s.name.clone()).collect()
    }

    /// Kind allow-list, `None` when unrestricted
    #[must_use]
    pub fn known_kinds(&self) -> Option<BTreeSet<String>> {
        (!self.kinds.is_empty()).then(|| self.kinds.iter().cloned().collect())
    }

    /// Comment syntax table: defaults plus registry overrides
    #[must_use]
    pub fn comment_syntax(&self) -> CommentSyntax {
        let mut syntax = CommentSyntax::default();
        if let Some(code) = &self.code {
            for (ext, prefixes) in &code.comment_syntax {
                syntax.insert(ext, prefixes.iter().cloned());
            }
        }
        syntax
    }
}
