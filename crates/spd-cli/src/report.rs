//! Report rendering

use spd_ident::ParsedIdentifier;
use spd_template::{Template, ValidationReport};
use std::fmt::Write as _;

/// Human-readable report, one issue per line
#[must_use]
pub fn render_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    for issue in &report.errors {
        let _ = writeln!(out, "error: {issue}");
    }
    for issue in &report.warnings {
        let _ = writeln!(out, "warning: {issue}");
    }
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    );
    out
}

/// `{"errors": [...], "warnings": [...]}`
///
/// # Errors
/// Returns [`serde_json::Error`] if serialization fails.
pub fn render_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Template summary: header values and one line per declared block
#[must_use]
pub fn render_template(template: &Template) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "kind: {}", template.kind);
    let _ = writeln!(out, "version: {}", template.version);
    let policy = serde_json::to_value(template.unknown_sections)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let _ = writeln!(out, "unknown_sections: {policy}");
    for block in &template.blocks {
        let depth = std::iter::successors(block.parent, |&p| template.blocks[p].parent).count();
        let _ = writeln!(
            out,
            "{:indent$}{} (lines {}-{}){}{}",
            "",
            block.key,
            block.start_line,
            block.end_line,
            if block.required { " required" } else { "" },
            if block.repeat == spd_template::Repeat::Many { " repeat=many" } else { "" },
            indent = depth * 2,
        );
    }
    out
}

/// Resolver decomposition
#[must_use]
pub fn render_identifier(parsed: &ParsedIdentifier) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "system: {}", parsed.system);
    let _ = writeln!(out, "kind: {}", parsed.kind);
    let _ = writeln!(out, "slug: {}", parsed.slug);
    if let Some(parent) = &parsed.prefix_id {
        let _ = writeln!(out, "parent: {parent}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spd_template::{IssueKind, ValidationIssue};

    fn report() -> ValidationReport {
        let mut report = ValidationReport::new();
        report.error(
            ValidationIssue::new(IssueKind::Structure, "PRD.md", 4, "reference has no definition")
                .with("id", "spd-app-req-x"),
        );
        report
    }

    #[test]
    fn text_lists_issues_and_totals() {
        let text = render_text(&report());
        assert!(text.starts_with("error: PRD.md:4: [structure] reference has no definition"));
        assert!(text.ends_with("1 error(s), 0 warning(s)\n"));
    }

    #[test]
    fn json_shape() {
        let value: serde_json::Value = serde_json::from_str(&render_json(&report()).unwrap()).unwrap();
        assert_eq!(value["errors"][0]["type"], "structure");
        assert_eq!(value["errors"][0]["line"], 4);
        assert_eq!(value["errors"][0]["id"], "spd-app-req-x");
        assert_eq!(value["warnings"], serde_json::json!([]));
    }

    #[test]
    fn template_rendering_indents_children() {
        let template = Template::from_source(
            "t.md",
            "---\nkind: PRD\n---\n<!-- spd:id:req repeat=\"many\" -->\n<!-- spd:task-list:tasks required=\"false\" -->\n<!-- spd:task-list:tasks -->\n<!-- spd:id:req -->\n",
        )
        .unwrap();
        let text = render_template(&template);
        assert!(text.contains("kind: PRD\nversion: 1.0\nunknown_sections: warn\n"));
        assert!(text.contains("id:req (lines 4-7) required repeat=many\n"));
        assert!(text.contains("  task-list:tasks (lines 5-6)\n"));
    }

    #[test]
    fn identifier_rendering() {
        let parsed = ParsedIdentifier {
            system: "app".into(),
            kind: "algo".into(),
            slug: "hash".into(),
            prefix_id: Some("spd-app-spec-auth".into()),
        };
        assert_eq!(
            render_identifier(&parsed),
            "system: app\nkind: algo\nslug: hash\nparent: spd-app-spec-auth\n"
        );
    }
}
