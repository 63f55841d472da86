use pretty_assertions::assert_eq;
use spd_template::{Artifact, IssueKind, TemplateCache};
use std::fs;
use std::path::Path;

const PRD_TEMPLATE: &str = r#"---
spd-template:
  version:
    major: 1
    minor: 0
  policy:
    unknown_sections: warn
---
<!-- spd:#:title -->
# Title
<!-- spd:#:title -->

<!-- spd:paragraph:overview -->
Overview text.
<!-- spd:paragraph:overview -->

<!-- spd:id:req has="priority,task" covered_by="DESIGN" repeat="many" -->
- [ ] `p1` - **ID**: `spd-app-req-x`

<!-- spd:task-list:tasks required="false" -->
- [ ] `p1` task
<!-- spd:task-list:tasks -->
<!-- spd:id:req -->

<!-- spd:table:matrix required="false" -->
| a | b |
|---|---|
| 1 | 2 |
<!-- spd:table:matrix -->
"#;

const PRD: &str = r#"<!-- spd:#:title -->
# Login PRD
<!-- spd:#:title -->

<!-- spd:paragraph:overview -->
Users log in. See `spd-app-design-auth` for the design.
<!-- spd:paragraph:overview -->

<!-- spd:id:req -->
- [x] `p1` - **ID**: `spd-app-req-login`

<!-- spd:task-list:tasks -->
- [x] `p1` write form
- [x] `p2` wire backend
<!-- spd:task-list:tasks -->
<!-- spd:id:req -->

<!-- spd:id:req -->
- [ ] `p2` - **ID**: `spd-app-req-logout`
<!-- spd:id:req -->
"#;

fn write(dir: &Path, rel: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn clean_artifact_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = write(dir.path(), "kit/artifacts/PRD/template.md", PRD_TEMPLATE);
    let artifact_path = write(dir.path(), "docs/PRD.md", PRD);

    let cache = TemplateCache::default();
    let template = cache.load(&template_path).unwrap();
    assert_eq!(template.kind, "PRD");
    assert_eq!(template.blocks.len(), 5);

    let artifact = Artifact::parse(template, &artifact_path);
    let report = artifact.validate();
    assert!(report.is_ok(), "{:#?}", report.errors);
    assert!(report.warnings.is_empty());

    let ids: Vec<_> = artifact.definitions.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["spd-app-req-login", "spd-app-req-logout"]);
    assert_eq!(artifact.tasks.len(), 2);

    let informal: Vec<_> = artifact.references.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(informal, vec!["spd-app-design-auth"]);
}

#[test]
fn template_load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = write(dir.path(), "artifacts/PRD/template.md", PRD_TEMPLATE);

    let a = spd_template::Template::load(&template_path).unwrap();
    let b = spd_template::Template::load(&template_path).unwrap();
    assert_eq!(a, b);
}

#[test]
fn every_problem_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = write(dir.path(), "artifacts/PRD/template.md", PRD_TEMPLATE);
    let broken = r#"<!-- spd:#:title -->
Not a heading
<!-- spd:#:title -->

<!-- spd:id:req -->
- [ ] **ID**: `spd-app-req-login`
<!-- spd:task-list:tasks -->
- [x] done
<!-- spd:task-list:tasks -->
<!-- spd:id:req -->

<!-- spd:table:matrix -->
| a | b |
|---|---|
<!-- spd:table:matrix -->

<!-- spd:appendix -->
extra
<!-- spd:appendix -->
"#;
    let artifact_path = write(dir.path(), "PRD.md", broken);

    let cache = TemplateCache::default();
    let artifact = Artifact::parse(cache.load(&template_path).unwrap(), &artifact_path);
    let report = artifact.validate();

    let mut messages: Vec<_> = report.errors.iter().map(|e| (e.line, e.message.clone())).collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            (1, "Required block 'paragraph:overview' is missing".to_string()),
            (2, "Expected a level-1 heading".to_string()),
            (6, "Identifier definition is missing a priority".to_string()),
            (6, "all tasks done but identifier not marked done".to_string()),
            (12, "Table must have at least one data row".to_string()),
        ]
    );
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].detail("marker_type"), Some("free"));
    assert!(report.errors.iter().all(|e| e.kind == IssueKind::Structure));
}

#[test]
fn missing_artifact_is_a_file_issue() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = write(dir.path(), "artifacts/PRD/template.md", PRD_TEMPLATE);
    let cache = TemplateCache::default();

    let artifact = Artifact::parse(cache.load(&template_path).unwrap(), dir.path().join("nope.md"));
    let report = artifact.validate();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, IssueKind::File);
}
