use pretty_assertions::assert_eq;
use spd_cli::{command, execute, validate_project, Registry, EXIT_INVALID, EXIT_OK};
use spd_template::{IssueKind, TemplateCache};
use spd_test_utils::{block, template_source, TestProject};
use std::process::ExitCode;

const REGISTRY: &str = r#"
kinds = ["req"]

[[systems]]
name = "app"

[[artifacts]]
path = "docs/PRD.md"
template = "templates/artifacts/PRD/template.md"

[code]
paths = ["src"]
"#;

fn project(prd_body: &str, source: &str) -> TestProject {
    let project = TestProject::new();
    project.write("spd.toml", REGISTRY);
    project.write(
        "templates/artifacts/PRD/template.md",
        &template_source(
            "PRD",
            &block("id", "req", "to_code=\"true\" repeat=\"many\"", "**ID**: `spd-x-req-y`"),
        ),
    );
    project.write("docs/PRD.md", prd_body);
    project.write("src/auth.rs", source);
    project
}

fn two_requirements() -> String {
    format!(
        "{}{}",
        block("id", "req", "", "**ID**: `spd-app-req-login`"),
        block("id", "req", "", "**ID**: `spd-app-req-logout`"),
    )
}

#[test]
fn registry_run_reports_traceability_gaps() {
    let project = project(
        &two_requirements(),
        "// spd:impl:spd-app-req-login\nfn login() {}\n// spd:impl:spd-app-req-ghost\nfn ghost() {}\n",
    );
    let registry = Registry::load(project.root().join("spd.toml")).unwrap();
    let summary = validate_project(&registry, &TemplateCache::default());

    assert_eq!(summary.artifacts, 1);
    assert_eq!(summary.definitions, 2);
    assert_eq!(summary.code_tags, 2);

    let messages: Vec<_> = summary
        .report
        .errors
        .iter()
        .map(|e| (e.kind, e.message.as_str(), e.detail("id")))
        .collect();
    assert_eq!(
        messages,
        vec![
            (
                IssueKind::Traceability,
                "identifier expected in code has no code marker",
                Some("spd-app-req-logout")
            ),
            (
                IssueKind::Traceability,
                "code marker references an undefined identifier",
                Some("spd-app-req-ghost")
            ),
        ]
    );
}

#[test]
fn clean_project_passes() {
    let project = project(
        &block("id", "req", "", "**ID**: `spd-app-req-login`"),
        "// spd:impl:spd-app-req-login\nfn login() {}\n",
    );
    let registry = Registry::load(project.root().join("spd.toml")).unwrap();
    let summary = validate_project(&registry, &TemplateCache::default());
    assert!(summary.report.is_ok(), "{:?}", summary.report.errors);
    assert!(summary.report.warnings.is_empty());
}

#[test]
fn missing_artifact_is_a_file_issue() {
    let project = project("", "");
    std::fs::remove_file(project.root().join("docs/PRD.md")).unwrap();
    let registry = Registry::load(project.root().join("spd.toml")).unwrap();
    let summary = validate_project(&registry, &TemplateCache::default());

    assert_eq!(summary.artifacts, 0);
    assert!(summary.report.errors.iter().any(|e| e.kind == IssueKind::File));
}

#[test]
fn validate_subcommand_exit_codes() {
    let broken = project(&two_requirements(), "");
    let registry = broken.root().join("spd.toml");
    let matches = command()
        .try_get_matches_from(["spd", "validate", "--json", "--registry", registry.to_str().unwrap()])
        .unwrap();
    assert_eq!(execute(&matches).unwrap(), ExitCode::from(EXIT_INVALID));

    let clean = project(
        &block("id", "req", "", "**ID**: `spd-app-req-login`"),
        "// spd:test:spd-app-req-login\n",
    );
    let registry = clean.root().join("spd.toml");
    let matches = command()
        .try_get_matches_from(["spd", "validate", "--registry", registry.to_str().unwrap()])
        .unwrap();
    assert_eq!(execute(&matches).unwrap(), ExitCode::from(EXIT_OK));
}

#[test]
fn parse_id_subcommand() {
    let resolves = command()
        .try_get_matches_from(["spd", "parse-id", "spd-app-req-login", "--kind", "req", "--system", "app"])
        .unwrap();
    assert_eq!(execute(&resolves).unwrap(), ExitCode::from(EXIT_OK));

    let unresolved = command()
        .try_get_matches_from(["spd", "parse-id", "spd-app-req-login", "--kind", "algo"])
        .unwrap();
    assert_eq!(execute(&unresolved).unwrap(), ExitCode::from(EXIT_INVALID));
}
