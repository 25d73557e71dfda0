//! Auto-start: which projects should get their first task PR after a push
//! that touched their `spec.md`.

use std::collections::BTreeMap;

use crate::project::{project_name_for_spec_path, Project};

/// How a file changed between two commits. Ordered by strength; when one
/// project shows several changes the strongest is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeType {
    Modified,
    Added,
    Deleted,
}

impl ChangeType {
    /// Map a `git diff --name-status` status letter.
    pub fn from_status(status: &str) -> Option<Self> {
        match status.chars().next()? {
            'A' | 'C' => Some(ChangeType::Added),
            'M' | 'T' => Some(ChangeType::Modified),
            'D' => Some(ChangeType::Deleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
        }
    }
}

/// Parse `git diff --name-status` output. A rename becomes a deletion of
/// the old path and an addition of the new one.
pub fn parse_name_status(output: &str) -> Vec<(ChangeType, String)> {
    let mut changes = Vec::new();
    for line in output.lines() {
        let mut fields = line.split('\t');
        let Some(status) = fields.next().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let paths: Vec<&str> = fields.collect();
        if status.starts_with('R') {
            if let [old, new] = paths[..] {
                changes.push((ChangeType::Deleted, old.to_string()));
                changes.push((ChangeType::Added, new.to_string()));
            }
            continue;
        }
        match (ChangeType::from_status(status), paths.last()) {
            (Some(kind), Some(path)) => changes.push((kind, path.to_string())),
            _ => tracing::debug!(line = line, "ignoring unrecognised name-status line"),
        }
    }
    changes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedProject {
    pub project: Project,
    pub change_type: ChangeType,
}

/// Projects whose `spec.md` changed, sorted by name.
pub fn detect_changed_projects<S: AsRef<str>>(changes: &[(ChangeType, S)]) -> Vec<ChangedProject> {
    let mut strongest: BTreeMap<&str, ChangeType> = BTreeMap::new();
    for (kind, path) in changes {
        let Some(name) = project_name_for_spec_path(path.as_ref()) else {
            continue;
        };
        strongest
            .entry(name)
            .and_modify(|k| *k = (*k).max(*kind))
            .or_insert(*kind);
    }
    strongest
        .into_iter()
        .map(|(name, change_type)| ChangedProject {
            project: Project::resolve_paths(name),
            change_type,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoStartDecision {
    pub project_name: String,
    pub should_trigger: bool,
    pub reason: String,
}

/// Trigger only projects that still have a spec and no open PRs.
pub fn decide(changed: &ChangedProject, existing_open_prs: usize) -> AutoStartDecision {
    let (should_trigger, reason) = if changed.change_type == ChangeType::Deleted {
        (false, "Project spec was deleted".to_string())
    } else if existing_open_prs > 0 {
        (
            false,
            format!("Project already has {existing_open_prs} open PR(s)"),
        )
    } else {
        (true, "New project with no existing PRs".to_string())
    };
    AutoStartDecision {
        project_name: changed.project.name.clone(),
        should_trigger,
        reason,
    }
}
