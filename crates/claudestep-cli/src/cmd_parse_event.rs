use anyhow::Context;
use claudestep_core::event::{self, EventContext, EventOutcome, ResolveOptions};
use claudestep_github::StepOutputs;

pub struct ParseEventParams<'a> {
    pub event_name: &'a str,
    pub event_json: &'a str,
    pub project_name: Option<&'a str>,
    pub default_base_branch: &'a str,
    pub pr_label: &'a str,
}

pub fn execute(p: &ParseEventParams<'_>, out: &mut dyn StepOutputs) -> anyhow::Result<()> {
    println!("=== ClaudeStep Event Parsing ===");
    println!("Event name: {}", p.event_name);
    println!(
        "Project name override: {}",
        p.project_name.filter(|s| !s.trim().is_empty()).unwrap_or("(none)")
    );
    println!("Default base branch: {}", p.default_base_branch);
    println!("Required PR label: {}", p.pr_label);

    let ctx =
        EventContext::from_json(p.event_name, p.event_json).context("Event parsing failed")?;
    print_context(&ctx);

    let project_override = p
        .project_name
        .filter(|s| !s.trim().is_empty())
        .or_else(|| ctx.dispatch_project_input());
    let outcome = event::resolve(
        &ctx,
        &ResolveOptions {
            project_override,
            required_label: p.pr_label,
            default_base_branch: p.default_base_branch,
        },
    );

    match outcome {
        EventOutcome::Skip { reason } => {
            println!("\nSkipping: {reason}");
            tracing::info!(reason = reason.as_str(), "event skipped");
            out.write_output("skip", "true")?;
            out.write_output("skip_reason", &reason)?;
        }
        EventOutcome::Proceed {
            project_name,
            checkout_ref,
            base_branch,
            merged_pr_number,
        } => {
            println!("\nEvent parsing complete");
            println!("  Project: {project_name}");
            println!("  Checkout ref: {checkout_ref}");
            println!("  Base branch: {base_branch}");
            out.write_output("skip", "false")?;
            out.write_output("project_name", &project_name)?;
            out.write_output("checkout_ref", &checkout_ref)?;
            out.write_output("base_branch", &base_branch)?;
            if let Some(n) = merged_pr_number {
                println!("  Merged PR number: {n}");
                out.write_output("merged_pr_number", &n.to_string())?;
            }
        }
    }
    Ok(())
}

fn print_context(ctx: &EventContext) {
    println!("\nParsed event context:");
    println!("  Event type: {}", ctx.event_kind.as_str());
    if let Some(n) = ctx.pr_number {
        println!("  PR number: {n}");
        println!("  PR merged: {}", ctx.pr_merged.unwrap_or(false));
        let labels: Vec<&str> = ctx.pr_labels.iter().map(String::as_str).collect();
        println!("  PR labels: {}", labels.join(", "));
    }
    for (name, value) in [
        ("Head ref", &ctx.head_ref),
        ("Base ref", &ctx.base_ref),
        ("Ref name", &ctx.ref_name),
    ] {
        if let Some(v) = value {
            println!("  {name}: {v}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudestep_github::RecordingOutputs;
    use serde_json::json;

    fn params<'a>(name: &'a str, payload: &'a str) -> ParseEventParams<'a> {
        ParseEventParams {
            event_name: name,
            event_json: payload,
            project_name: None,
            default_base_branch: "main",
            pr_label: "claudestep",
        }
    }

    #[test]
    fn merged_pr_proceeds() {
        let payload = json!({
            "pull_request": {
                "number": 42,
                "merged": true,
                "labels": [{"name": "claudestep"}],
                "head": {"ref": "claude-step-my-refactor-3"},
                "base": {"ref": "develop"}
            }
        })
        .to_string();
        let mut out = RecordingOutputs::new();
        execute(&params("pull_request", &payload), &mut out).unwrap();
        assert_eq!(out.get("skip"), Some("false"));
        assert_eq!(out.get("project_name"), Some("my-refactor"));
        assert_eq!(out.get("checkout_ref"), Some("develop"));
        assert_eq!(out.get("base_branch"), Some("develop"));
        assert_eq!(out.get("merged_pr_number"), Some("42"));
    }

    #[test]
    fn closed_pr_is_skipped() {
        let payload = json!({
            "pull_request": {
                "number": 7,
                "merged": false,
                "labels": [{"name": "claudestep"}],
                "head": {"ref": "claude-step-p-1"},
                "base": {"ref": "main"}
            }
        })
        .to_string();
        let mut out = RecordingOutputs::new();
        execute(&params("pull_request", &payload), &mut out).unwrap();
        assert_eq!(out.get("skip"), Some("true"));
        assert_eq!(out.get("skip_reason"), Some("PR was closed but not merged"));
        assert_eq!(out.get("project_name"), None);
    }

    #[test]
    fn dispatch_with_override() {
        let payload = json!({"ref": "refs/heads/main"}).to_string();
        let mut p = params("workflow_dispatch", &payload);
        p.project_name = Some("auth");
        let mut out = RecordingOutputs::new();
        execute(&p, &mut out).unwrap();
        assert_eq!(out.get("skip"), Some("false"));
        assert_eq!(out.get("project_name"), Some("auth"));
        assert_eq!(out.get("checkout_ref"), Some("main"));
        assert_eq!(out.get("base_branch"), Some("main"));
        assert_eq!(out.get("merged_pr_number"), None);
    }

    #[test]
    fn dispatch_input_acts_as_override() {
        let payload = json!({"ref": "refs/heads/main", "inputs": {"project_name": "billing"}})
            .to_string();
        let mut out = RecordingOutputs::new();
        execute(&params("workflow_dispatch", &payload), &mut out).unwrap();
        assert_eq!(out.get("project_name"), Some("billing"));
    }

    #[test]
    fn dispatch_without_project_is_skipped() {
        let payload = json!({"ref": "refs/heads/main"}).to_string();
        let mut out = RecordingOutputs::new();
        execute(&params("workflow_dispatch", &payload), &mut out).unwrap();
        assert_eq!(
            out.get("skip_reason"),
            Some("No project_name provided for workflow_dispatch event")
        );
    }

    #[test]
    fn invalid_json_is_fatal() {
        let mut out = RecordingOutputs::new();
        let err = execute(&params("pull_request", "{not json"), &mut out).unwrap_err();
        assert!(format!("{err:#}").starts_with("Event parsing failed"));
        assert!(out.outputs.is_empty());
    }
}
