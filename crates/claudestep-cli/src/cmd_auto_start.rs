use std::collections::HashMap;

use anyhow::{bail, Context};
use claudestep_core::autostart::{self, ChangeType, ChangedProject};
use claudestep_core::event::EventContext;
use claudestep_core::{branch, OpenPullRequest, ProjectConfiguration};
use claudestep_github::{GitHubApi, StepOutputs};

use crate::Settings;

/// Object id of git's empty tree; diffing against it lists every file.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

pub struct AutoStartParams<'a> {
    pub before: Option<&'a str>,
    pub after: Option<&'a str>,
    /// Push payload read when `before` or `after` is not given.
    pub event_json: Option<&'a str>,
    pub base_branch: &'a str,
    pub pr_label: &'a str,
}

fn short(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The pushed commit range, from the explicit refs or else the push payload.
fn commit_range(p: &AutoStartParams<'_>) -> anyhow::Result<(String, String)> {
    if let (Some(before), Some(after)) = (non_empty(p.before), non_empty(p.after)) {
        return Ok((before.to_string(), after.to_string()));
    }
    let Some(json) = non_empty(p.event_json) else {
        bail!("no commit range: pass --before and --after or a push event payload");
    };
    let ctx = EventContext::from_json("push", json).context("Auto-start detection failed")?;
    let Some((before, after)) = ctx.push_range() else {
        bail!("push event payload has no before/after commits");
    };
    Ok((
        non_empty(p.before).unwrap_or(before).to_string(),
        non_empty(p.after).unwrap_or(after).to_string(),
    ))
}

/// Label the project's PRs carry: the one in its configuration, or
/// `fallback` when the configuration is missing or invalid.
fn project_label(settings: &Settings, c: &ChangedProject, fallback: &str) -> String {
    let path = settings.workspace.join(&c.project.config_path);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no project configuration");
            return fallback.to_string();
        }
    };
    match ProjectConfiguration::from_json(&content) {
        Ok(config) => config.label_or_default().to_string(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid project configuration");
            fallback.to_string()
        }
    }
}

pub fn execute(
    settings: &Settings,
    p: &AutoStartParams<'_>,
    api: &dyn GitHubApi,
    out: &mut dyn StepOutputs,
) -> anyhow::Result<()> {
    println!("=== ClaudeStep Auto-Start Detection ===");
    println!("Repository: {}", settings.repo.as_deref().unwrap_or("(local)"));
    println!("Base branch: {}", p.base_branch);
    let (before, after) = commit_range(p)?;
    println!("Checking changes: {}...{}", short(&before), short(&after));

    // A branch's first push reports an all-zero "before" commit.
    let before = if before.bytes().all(|b| b == b'0') {
        EMPTY_TREE
    } else {
        before.as_str()
    };
    let diff = api
        .diff_name_status(before, &after)
        .context("Auto-start detection failed")?;
    let changed = autostart::detect_changed_projects(&autostart::parse_name_status(&diff));

    if changed.is_empty() {
        println!("No spec.md changes detected");
        return write_result(out, &[]);
    }
    println!("Found {} changed project(s):", changed.len());
    for c in &changed {
        println!("  - {} ({})", c.project.name, c.change_type.as_str());
    }

    // One listing per distinct label.
    let mut listings: HashMap<String, Vec<OpenPullRequest>> = HashMap::new();
    let mut to_trigger = Vec::new();
    for c in &changed {
        let existing = if c.change_type == ChangeType::Deleted {
            0
        } else {
            let label = project_label(settings, c, p.pr_label);
            if !listings.contains_key(&label) {
                let prs = api
                    .list_open_pull_requests(&label)
                    .context("Auto-start detection failed")?;
                listings.insert(label.clone(), prs);
            }
            listings
                .get(&label)
                .map(|prs| count_for_project(prs, &c.project.name))
                .unwrap_or(0)
        };
        let decision = autostart::decide(c, existing);
        if decision.should_trigger {
            println!("  + {}: TRIGGER - {}", decision.project_name, decision.reason);
            to_trigger.push(decision.project_name);
        } else {
            println!("  - {}: SKIP - {}", decision.project_name, decision.reason);
        }
    }
    tracing::info!(count = to_trigger.len(), "auto-start decisions made");
    write_result(out, &to_trigger)
}

fn count_for_project(prs: &[OpenPullRequest], project: &str) -> usize {
    prs.iter()
        .filter_map(|pr| branch::decode(&pr.head_ref_name))
        .filter(|parsed| parsed.project == project)
        .count()
}

fn write_result(out: &mut dyn StepOutputs, projects: &[String]) -> anyhow::Result<()> {
    out.write_output("projects_to_trigger", &projects.join(" "))?;
    out.write_output("project_count", &projects.len().to_string())?;
    Ok(())
}
