//! Identifier and task extraction
//!
//! Walks each block's own lines once, outside fenced code, and collects
//! definitions from identifier blocks, formal references from reference
//! blocks, informal backticked mentions from everything else, and task
//! checkbox states from task lists and flow steps.

use crate::artifact::Artifact;
use crate::block::BlockKind;
use crate::content::{flow_step_checkbox, outside_fences, task_checkbox};
use serde::Serialize;
use spd_ident::{find_backticked_ids, parse_definition_line, parse_reference_token, strip_list_marker};
use std::collections::HashSet;
use std::path::PathBuf;

/// Identifier definition found in an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdDefinition {
    /// Defined identifier, as written
    pub id: String,
    /// 1-based line
    pub line: usize,
    /// Checkbox is ticked
    pub checked: bool,
    /// Priority token, if any
    pub priority: Option<String>,
    /// Index of the defining block
    pub block: usize,
    /// Artifact path
    pub path: PathBuf,
    /// Block expects a source-code tag for this identifier
    pub to_code: bool,
}

/// Identifier reference found in an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdReference {
    /// Referenced identifier, as written
    pub id: String,
    /// 1-based line
    pub line: usize,
    /// Checkbox is ticked
    pub checked: bool,
    /// Priority token, if any
    pub priority: Option<String>,
    /// Index of the containing block
    pub block: usize,
    /// Artifact path
    pub path: PathBuf,
    /// From an `id-ref` block rather than a prose mention
    pub formal: bool,
}

/// Checkbox state of one task line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    /// 1-based line
    pub line: usize,
    /// Checkbox is ticked
    pub checked: bool,
    /// Index of the containing block
    pub block: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Extraction {
    pub(crate) definitions: Vec<IdDefinition>,
    pub(crate) references: Vec<IdReference>,
    pub(crate) tasks: Vec<TaskStatus>,
}

pub(crate) fn extract(artifact: &Artifact) -> Extraction {
    let mut out = Extraction::default();
    let mut informal_seen: HashSet<String> = HashSet::new();

    for (index, block) in artifact.blocks.iter().enumerate() {
        let own = artifact.own_lines(index);
        let lines = outside_fences(&own);

        match block.kind() {
            BlockKind::Id(attrs) => {
                for line in &lines {
                    if let Some(def) = parse_definition_line(line.text) {
                        out.definitions.push(IdDefinition {
                            checked: def.checked(),
                            id: def.id,
                            line: line.number,
                            priority: def.priority,
                            block: index,
                            path: artifact.path.clone(),
                            to_code: attrs.to_code,
                        });
                    }
                }
            }
            BlockKind::IdRef { .. } => {
                for line in &lines {
                    let (_, rest) = strip_list_marker(line.text);
                    for token in rest.split(',') {
                        if let Some(reference) = parse_reference_token(token) {
                            out.references.push(IdReference {
                                checked: reference.checked(),
                                id: reference.id,
                                line: line.number,
                                priority: reference.priority,
                                block: index,
                                path: artifact.path.clone(),
                                formal: true,
                            });
                        }
                    }
                }
            }
            kind => {
                for line in &lines {
                    if kind.tracks_tasks() {
                        let checked = match kind {
                            BlockKind::Fdl => flow_step_checkbox(line.text),
                            _ => task_checkbox(line.text),
                        };
                        if let Some(checked) = checked {
                            out.tasks.push(TaskStatus {
                                line: line.number,
                                checked,
                                block: index,
                            });
                        }
                    }
                    for id in find_backticked_ids(line.text) {
                        if informal_seen.insert(id.clone()) {
                            out.references.push(IdReference {
                                id,
                                line: line.number,
                                checked: false,
                                priority: None,
                                block: index,
                                path: artifact.path.clone(),
                                formal: false,
                            });
                        }
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use crate::artifact::Artifact;
    use crate::template::Template;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn parse(artifact: &str) -> Artifact {
        let template = Template::from_source("t.md", "---\nkind: PRD\n---\n").unwrap();
        Artifact::from_source(Arc::new(template), "PRD.md", artifact)
    }

    #[test]
    fn definitions_from_id_blocks() {
        let a = parse(
            "<!-- spd:id:req to_code=\"true\" -->\n- [x] `p1` - **ID**: `spd-app-req-a`\n```\n**ID**: `spd-app-req-fenced`\n```\n<!-- spd:id:req -->\n",
        );
        assert_eq!(a.definitions.len(), 1);
        let def = &a.definitions[0];
        assert_eq!(def.id, "spd-app-req-a");
        assert_eq!(def.line, 2);
        assert!(def.checked);
        assert_eq!(def.priority.as_deref(), Some("p1"));
    }

    #[test]
    fn formal_references_are_kept_per_occurrence() {
        let a = parse(
            "<!-- spd:id-ref:reqs -->\n- [x] `spd-app-req-a`, `spd-app-req-b`\n- `spd-app-req-a`\n<!-- spd:id-ref:reqs -->\n",
        );
        let ids: Vec<_> = a.references.iter().map(|r| (r.id.as_str(), r.checked, r.formal)).collect();
        assert_eq!(
            ids,
            vec![
                ("spd-app-req-a", true, true),
                ("spd-app-req-b", false, true),
                ("spd-app-req-a", false, true),
            ]
        );
    }

    #[test]
    fn informal_references_deduplicated() {
        let a = parse(
            "<!-- spd:paragraph:p -->\nSee `spd-app-req-a` and `spd-app-req-a`.\n<!-- spd:paragraph:p -->\n\
             <!-- spd:list:l -->\n- `spd-app-req-a` and `spd-app-req-b`\n<!-- spd:list:l -->\n",
        );
        let ids: Vec<_> = a.references.iter().map(|r| (r.id.as_str(), r.line)).collect();
        assert_eq!(ids, vec![("spd-app-req-a", 2), ("spd-app-req-b", 5)]);
        assert!(a.references.iter().all(|r| !r.formal));
    }

    #[test]
    fn tasks_from_task_lists_and_flows() {
        let a = parse(
            "<!-- spd:task-list:t -->\n- [x] one\n- [ ] two\n<!-- spd:task-list:t -->\n\
             <!-- spd:fdl:f -->\n1. [x] - `p1` - Step - `inst-step`\n<!-- spd:fdl:f -->\n\
             <!-- spd:list:l -->\n- [x] not a task container\n<!-- spd:list:l -->\n",
        );
        let tasks: Vec<_> = a.tasks.iter().map(|t| (t.line, t.checked)).collect();
        assert_eq!(tasks, vec![(2, true), (3, false), (6, true)]);
    }

    #[test]
    fn nested_lines_extracted_once() {
        let a = parse(
            "<!-- spd:id:req -->\n**ID**: `spd-app-req-a`\n<!-- spd:paragraph:note -->\nsee `spd-app-req-b`\n<!-- spd:paragraph:note -->\n<!-- spd:id:req -->\n",
        );
        assert_eq!(a.definitions.len(), 1);
        assert_eq!(a.references.len(), 1);
        assert_eq!(a.references[0].block, 1);
    }
}
