//! Testing utilities for the SPD workspace
//!
//! Shared fixture builders for templates, artifacts and on-disk projects.

#![allow(missing_docs)]

use spd_template::{Artifact, Template};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Render one marker-delimited block
pub fn block(type_token: &str, name: &str, attrs: &str, body: &str) -> String {
    let open = if attrs.is_empty() {
        format!("<!-- spd:{type_token}:{name} -->")
    } else {
        format!("<!-- spd:{type_token}:{name} {attrs} -->")
    };
    let close = format!("<!-- spd:{type_token}:{name} -->");
    if body.is_empty() {
        format!("{open}\n{close}\n")
    } else {
        format!("{open}\n{}\n{close}\n", body.trim_end_matches('\n'))
    }
}

/// Template source with a header declaring `kind`
pub fn template_source(kind: &str, body: &str) -> String {
    format!("---\nspd-template:\n  kind: {kind}\n  version:\n    major: 1\n    minor: 0\n---\n{body}")
}

pub fn create_template(kind: &str, body: &str) -> Arc<Template> {
    let path = format!("{}.template.md", kind.to_lowercase());
    Arc::new(Template::from_source(&path, &template_source(kind, body)).unwrap())
}

pub fn create_artifact(template: &Arc<Template>, path: &str, text: &str) -> Artifact {
    Artifact::from_source(Arc::clone(template), path, text)
}

/// Identifier block template with `covered_by` and optional extra attributes
pub fn id_template(kind: &str, id_kind: &str, attrs: &str) -> Arc<Template> {
    create_template(
        kind,
        &block("id", id_kind, format!("repeat=\"many\" {attrs}").trim_end(), "**ID**: `spd-x-y-z`"),
    )
}

/// Template whose only block is a reference block named `ref_kind`
pub fn ref_template(kind: &str, ref_kind: &str) -> Arc<Template> {
    create_template(
        kind,
        &block("id-ref", ref_kind, "required=\"false\" repeat=\"many\"", ""),
    )
}

pub fn systems(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Temporary project directory
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `text` at `rel`, creating parent directories
    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
