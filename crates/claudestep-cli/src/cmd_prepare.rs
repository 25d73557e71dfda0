use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context};
use claudestep_core::branch::{self, NameSuffix};
use claudestep_core::hash::SHORT_HASH_LEN;
use claudestep_core::project::{Project, ProjectOverrides};
use claudestep_core::reviewer::compute_capacity;
use claudestep_core::{OpenPullRequest, ProjectConfiguration, SpecDocument};
use claudestep_github::{GitHubApi, StepOutputs};

use crate::Settings;

pub struct PrepareParams<'a> {
    pub project_name: &'a str,
    pub overrides: ProjectOverrides,
    pub default_base_branch: &'a str,
}

fn read(workspace: &Path, rel: &str, what: &str) -> anyhow::Result<String> {
    let path = workspace.join(rel);
    std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {what} at {}", path.display()))
}

pub fn execute(
    settings: &Settings,
    p: &PrepareParams<'_>,
    api: &dyn GitHubApi,
    out: &mut dyn StepOutputs,
) -> anyhow::Result<()> {
    let name = p.project_name.trim();
    if name.is_empty() {
        bail!("project name is required");
    }
    let project = Project::with_overrides(name, &p.overrides);
    println!("=== ClaudeStep Prepare: {name} ===");

    let config = ProjectConfiguration::from_json(&read(
        &settings.workspace,
        &project.config_path,
        "configuration",
    )?)
    .with_context(|| format!("invalid configuration in {}", project.config_path))?;
    if config.reviewers.is_empty() {
        bail!("no reviewers configured in {}", project.config_path);
    }

    let spec = SpecDocument::parse(&read(&settings.workspace, &project.spec_path, "spec")?);
    spec.validate()
        .with_context(|| format!("invalid spec in {}", project.spec_path))?;
    println!(
        "Spec: {} task(s), {} completed",
        spec.tasks().len(),
        spec.completed_count()
    );

    let label = config.label_or_default();
    let open_prs = api
        .list_open_pull_requests(label)
        .context("failed to list open pull requests")?;
    let capacity = compute_capacity(&config.reviewers, &open_prs, name);

    println!(
        "Reviewer capacity ({} attributed open PR(s)):",
        capacity.total_open_prs()
    );
    for r in &capacity.reviewers {
        let mark = if r.has_capacity { "available" } else { "at capacity" };
        println!(
            "  {}: {}/{} open ({mark})",
            r.username,
            r.open_prs.len(),
            r.max_open_prs
        );
    }

    let Some(reviewer) = capacity.selected_reviewer.as_deref() else {
        println!("\nAll reviewers are at capacity");
        out.write_output("skip", "true")?;
        out.write_output("skip_reason", "All reviewers are at capacity")?;
        out.write_output("all_at_capacity", "true")?;
        return Ok(());
    };

    let in_flight = in_flight_tasks(&spec, &open_prs, name);
    let next = match spec.next_pending() {
        None => Err("No pending tasks in spec"),
        Some(_) => spec
            .next_pending_excluding(&in_flight)
            .ok_or("Every pending task already has an open PR"),
    };
    let task = match next {
        Ok(task) => task,
        Err(reason) => {
            println!("\n{reason}");
            out.write_output("skip", "true")?;
            out.write_output("skip_reason", reason)?;
            out.write_output("all_at_capacity", "false")?;
            return Ok(());
        }
    };

    let branch_name = branch::encode(name, task.index)?;
    let base_branch = config
        .base_branch
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(p.default_base_branch);
    tracing::info!(
        project = name,
        reviewer = reviewer,
        task_index = task.index,
        "prepared task"
    );
    println!("\nSelected reviewer: {reviewer}");
    println!("Next task #{}: {}", task.index, task.description);
    println!("Branch: {branch_name}");

    out.write_output("skip", "false")?;
    out.write_output("reviewer", reviewer)?;
    out.write_output("all_at_capacity", "false")?;
    out.write_output("task_index", &task.index.to_string())?;
    out.write_output("task_description", &task.description)?;
    out.write_output("branch_name", &branch_name)?;
    out.write_output("label", label)?;
    out.write_output("base_branch", base_branch)?;
    out.write_output("project_path", &project.base_path)?;
    out.write_output("config_path", &project.config_path)?;
    out.write_output("spec_path", &project.spec_path)?;
    out.write_output("pr_template_path", &project.pr_template_path)?;
    Ok(())
}

/// Indices of tasks that already have an open PR, by task index or by
/// description hash.
///
/// A hash made only of digits decodes as a task index. When no task has that
/// index, the token is matched against the task hashes as well.
fn in_flight_tasks(spec: &SpecDocument, prs: &[OpenPullRequest], project: &str) -> BTreeSet<u32> {
    let mut in_flight = BTreeSet::new();
    for pr in prs {
        let Some(parsed) = branch::decode(&pr.head_ref_name) else {
            continue;
        };
        if parsed.project != project {
            continue;
        }
        match parsed.suffix {
            NameSuffix::TaskIndex(i) => {
                let token = pr.head_ref_name.rsplit('-').next().unwrap_or_default();
                let known = spec.tasks().iter().any(|t| t.index == i);
                let by_hash = (!known && token.len() == SHORT_HASH_LEN)
                    .then(|| spec.tasks().iter().find(|t| t.hash() == token))
                    .flatten();
                in_flight.insert(by_hash.map_or(i, |t| t.index));
            }
            NameSuffix::Hash(h) => {
                if let Some(t) = spec.tasks().iter().find(|t| t.hash() == h) {
                    in_flight.insert(t.index);
                }
            }
        }
    }
    in_flight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{open_pr, settings, FakeGitHub};
    use claudestep_github::RecordingOutputs;

    const SPEC: &str = "# Plan\n\n- [x] First\n- [ ] Second\n- [ ] Third\n";

    fn workspace(config: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("claude-step").join("auth");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("configuration.json"), config).unwrap();
        std::fs::write(project.join("spec.md"), SPEC).unwrap();
        dir
    }

    fn params() -> PrepareParams<'static> {
        PrepareParams {
            project_name: "auth",
            overrides: ProjectOverrides::default(),
            default_base_branch: "main",
        }
    }

    const CONFIG: &str = r#"{"reviewers":[
        {"username":"alice","maxOpenPRs":1},
        {"username":"bob","maxOpenPRs":2}
    ]}"#;

    #[test]
    fn picks_reviewer_and_next_task() {
        let dir = workspace(CONFIG);
        let api = FakeGitHub::default();
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();

        assert_eq!(out.get("skip"), Some("false"));
        assert_eq!(out.get("reviewer"), Some("alice"));
        assert_eq!(out.get("task_index"), Some("2"));
        assert_eq!(out.get("task_description"), Some("Second"));
        assert_eq!(out.get("branch_name"), Some("claude-step-auth-2"));
        assert_eq!(out.get("base_branch"), Some("main"));
        assert_eq!(out.get("spec_path"), Some("claude-step/auth/spec.md"));
        assert_eq!(api.listed_labels.borrow().as_slice(), ["claudestep"]);
    }

    #[test]
    fn skips_tasks_with_open_prs() {
        let dir = workspace(CONFIG);
        let api = FakeGitHub {
            open_prs: vec![open_pr(10, "claude-step-auth-2", "alice")],
            ..Default::default()
        };
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();

        assert_eq!(out.get("reviewer"), Some("bob"));
        assert_eq!(out.get("task_index"), Some("3"));
    }

    #[test]
    fn all_reviewers_at_capacity() {
        let dir = workspace(r#"{"reviewers":[{"username":"alice","maxOpenPRs":1}]}"#);
        let api = FakeGitHub {
            open_prs: vec![open_pr(10, "claude-step-auth-2", "alice")],
            ..Default::default()
        };
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();

        assert_eq!(out.get("skip"), Some("true"));
        assert_eq!(out.get("all_at_capacity"), Some("true"));
        assert_eq!(out.get("reviewer"), None);
    }

    #[test]
    fn configured_label_and_base_branch() {
        let dir = workspace(
            r#"{"label":"auth-refactor","baseBranch":"develop",
                "reviewers":[{"username":"alice","maxOpenPRs":1}]}"#,
        );
        let api = FakeGitHub::default();
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();

        assert_eq!(out.get("label"), Some("auth-refactor"));
        assert_eq!(out.get("base_branch"), Some("develop"));
        assert_eq!(api.listed_labels.borrow().as_slice(), ["auth-refactor"]);
    }

    #[test]
    fn missing_configuration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeGitHub::default();
        let mut out = RecordingOutputs::new();
        let err = execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out)
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read configuration"));
    }

    #[test]
    fn all_digit_hash_branch_marks_its_task_in_flight() {
        let dir = workspace(CONFIG);
        let spec_path = dir.path().join("claude-step/auth/spec.md");
        std::fs::write(&spec_path, "- [ ] Task 271\n- [ ] Other\n").unwrap();
        let branch = branch::NameCodec::BRANCH
            .encode_with_hash("auth", "Task 271")
            .unwrap();
        assert_eq!(branch, "claude-step-auth-93612392");

        let api = FakeGitHub {
            open_prs: vec![open_pr(8, &branch, "alice")],
            ..Default::default()
        };
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();
        assert_eq!(out.get("task_index"), Some("2"));
        assert_eq!(out.get("task_description"), Some("Other"));
    }

    #[test]
    fn every_pending_task_in_flight_is_skipped() {
        let dir = workspace(CONFIG);
        let api = FakeGitHub {
            open_prs: vec![
                open_pr(1, "claude-step-auth-2", "bob"),
                open_pr(2, "claude-step-auth-3", "bob"),
            ],
            ..Default::default()
        };
        let mut out = RecordingOutputs::new();
        execute(&settings(dir.path().to_path_buf()), &params(), &api, &mut out).unwrap();
        assert_eq!(out.get("skip"), Some("true"));
        assert_eq!(
            out.get("skip_reason"),
            Some("Every pending task already has an open PR")
        );
    }

    #[test]
    fn hash_branches_mark_their_task_in_flight() {
        let spec = SpecDocument::parse(SPEC);
        let branch = branch::NameCodec::BRANCH
            .encode_with_hash("auth", "Second")
            .unwrap();
        let prs = vec![open_pr(3, &branch, "alice")];
        let in_flight = in_flight_tasks(&spec, &prs, "auth");
        assert_eq!(in_flight.into_iter().collect::<Vec<_>>(), vec![2]);
    }
}
