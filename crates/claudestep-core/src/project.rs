//! Project path conventions and project detection from PR labels or changed
//! files. Pure computation, no I/O.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Directory that holds one sub-directory per project.
pub const PROJECTS_ROOT: &str = "claude-step";

pub const CONFIG_FILE: &str = "configuration.json";
pub const SPEC_FILE: &str = "spec.md";
pub const PR_TEMPLATE_FILE: &str = "pr-template.md";

/// All well-known paths of one project, relative to the repository root and
/// `/`-separated (they are handed to git and gh verbatim).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Project {
    pub name: String,
    pub base_path: String,
    pub config_path: String,
    pub spec_path: String,
    pub pr_template_path: String,
}

/// Optional replacements for individual project paths.
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub config_path: Option<String>,
    pub spec_path: Option<String>,
    pub pr_template_path: Option<String>,
}

impl Project {
    /// Derive every path from the project name.
    pub fn resolve_paths(name: &str) -> Self {
        let base_path = format!("{PROJECTS_ROOT}/{name}");
        Self {
            config_path: format!("{base_path}/{CONFIG_FILE}"),
            spec_path: format!("{base_path}/{SPEC_FILE}"),
            pr_template_path: format!("{base_path}/{PR_TEMPLATE_FILE}"),
            name: name.to_string(),
            base_path,
        }
    }

    /// Like [`Project::resolve_paths`], with non-empty overrides taking
    /// precedence over the convention.
    pub fn with_overrides(name: &str, overrides: &ProjectOverrides) -> Self {
        fn pick(over: &Option<String>, default: String) -> String {
            over.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        }
        let p = Self::resolve_paths(name);
        Self {
            config_path: pick(&overrides.config_path, p.config_path),
            spec_path: pick(&overrides.spec_path, p.spec_path),
            pr_template_path: pick(&overrides.pr_template_path, p.pr_template_path),
            name: p.name,
            base_path: p.base_path,
        }
    }
}

/// Ordered `label -> project` mapping built by the caller from every
/// project's configuration. Order decides which project wins when a PR
/// carries several configured labels.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    entries: Vec<(String, String)>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, project: impl Into<String>) {
        self.entries.push((label.into(), project.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), p.as_str()))
    }
}

impl FromIterator<(String, String)> for LabelIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Project whose configured label appears on the PR. First index entry wins.
pub fn detect_from_pr(
    pr_number: u64,
    pr_labels: &BTreeSet<String>,
    index: &LabelIndex,
) -> Option<String> {
    let found = index
        .iter()
        .find(|(label, _)| pr_labels.contains(*label))
        .map(|(_, project)| project.to_string());
    match &found {
        Some(project) => tracing::info!(
            pr_number = pr_number,
            project = project.as_str(),
            "detected project from PR labels"
        ),
        None => tracing::debug!(pr_number = pr_number, "no configured project label on PR"),
    }
    found
}

fn spec_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^{}/([^/]+)/{}$",
            regex::escape(PROJECTS_ROOT),
            regex::escape(SPEC_FILE)
        ))
        .ok()
    })
    .as_ref()
}

/// Name of the project whose `spec.md` lives at `path`, if any.
pub fn project_name_for_spec_path(path: &str) -> Option<&str> {
    spec_pattern()?
        .captures(path.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Projects whose `spec.md` appears among `paths`, distinct and sorted by
/// name.
pub fn detect_from_changed_files<S: AsRef<str>>(paths: &[S]) -> Vec<Project> {
    let names: BTreeSet<&str> = paths
        .iter()
        .filter_map(|p| project_name_for_spec_path(p.as_ref()))
        .collect();
    names.into_iter().map(Project::resolve_paths).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_paths_follows_convention() {
        let p = Project::resolve_paths("my-project");
        assert_eq!(p.name, "my-project");
        assert_eq!(p.base_path, "claude-step/my-project");
        assert_eq!(p.config_path, "claude-step/my-project/configuration.json");
        assert_eq!(p.spec_path, "claude-step/my-project/spec.md");
        assert_eq!(p.pr_template_path, "claude-step/my-project/pr-template.md");
    }

    #[test]
    fn overrides_replace_only_given_paths() {
        let p = Project::with_overrides(
            "p",
            &ProjectOverrides {
                spec_path: Some("docs/plan.md".into()),
                config_path: Some("  ".into()),
                ..Default::default()
            },
        );
        assert_eq!(p.spec_path, "docs/plan.md");
        assert_eq!(p.config_path, "claude-step/p/configuration.json");
        assert_eq!(p.pr_template_path, "claude-step/p/pr-template.md");
    }

    #[test]
    fn changed_files_yield_sorted_distinct_projects() {
        let files = [
            "claude-step/proj-b/spec.md",
            "README.md",
            "claude-step/proj-a/spec.md",
            "claude-step/proj-b/spec.md",
        ];
        let names: Vec<_> = detect_from_changed_files(&files)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["proj-a", "proj-b"]);
    }

    #[test]
    fn changed_files_ignore_near_misses() {
        let files = [
            "claude-step/proj/configuration.json",
            "claude-step/proj/nested/spec.md",
            "other/proj/spec.md",
            "claude-step/spec.md",
            "src/main.rs",
        ];
        assert!(detect_from_changed_files(&files).is_empty());
    }

    #[test]
    fn detect_from_pr_uses_index_order() {
        let index: LabelIndex = [
            ("refactor-a".to_string(), "proj-a".to_string()),
            ("refactor-b".to_string(), "proj-b".to_string()),
        ]
        .into_iter()
        .collect();
        let labels: BTreeSet<String> = ["refactor-b", "refactor-a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(detect_from_pr(7, &labels, &index).as_deref(), Some("proj-a"));
    }

    #[test]
    fn detect_from_pr_without_match() {
        let mut index = LabelIndex::new();
        index.push("refactor-a", "proj-a");
        let labels: BTreeSet<String> = ["bug".to_string()].into_iter().collect();
        assert_eq!(detect_from_pr(7, &labels, &index), None);
        assert_eq!(index.len(), 1);
    }
}
