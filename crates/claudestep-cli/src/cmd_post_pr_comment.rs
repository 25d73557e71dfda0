use std::path::Path;

use anyhow::{bail, Context};
use claudestep_core::cost::{format_usd, CostBreakdown};
use claudestep_github::comment::{format_pr_comment, run_url};
use claudestep_github::{GitHubApi, StepOutputs};

use crate::Settings;

pub struct CommentParams<'a> {
    pub pr_number: Option<&'a str>,
    pub summary_file: Option<&'a Path>,
    pub main_cost: f64,
    pub summary_cost: f64,
}

pub fn execute(
    settings: &Settings,
    p: &CommentParams<'_>,
    api: &dyn GitHubApi,
    out: &mut dyn StepOutputs,
) -> anyhow::Result<()> {
    let Some(pr) = p.pr_number.map(str::trim).filter(|s| !s.is_empty()) else {
        out.notice("No PR number provided, skipping PR comment");
        out.write_output("comment_posted", "false")?;
        return Ok(());
    };
    let Some(repo) = settings.repo.as_deref().filter(|s| !s.is_empty()) else {
        bail!("GITHUB_REPOSITORY environment variable is required");
    };
    let Some(run_id) = settings.run_id.as_deref().filter(|s| !s.is_empty()) else {
        bail!("GITHUB_RUN_ID environment variable is required");
    };
    let pr_number: u64 = pr
        .parse()
        .with_context(|| format!("Error posting PR comment: invalid PR number '{pr}'"))?;

    // A missing summary is normal when the summary step was skipped.
    let summary = match p.summary_file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "summary file unreadable");
            String::new()
        }),
        None => String::new(),
    };
    let costs = CostBreakdown::new(Some(p.main_cost), Some(p.summary_cost));
    let body = format_pr_comment(&summary, &costs, &run_url(&settings.server_url, repo, run_id));

    println!("Posting PR comment to PR #{pr_number}...");
    api.post_comment(pr_number, &body)
        .context("Failed to post comment")?;

    println!("PR comment posted to PR #{pr_number}");
    if !summary.trim().is_empty() {
        println!("   - AI-generated summary included");
    }
    println!("   - Main task: ${}", format_usd(costs.main_cost));
    println!("   - PR summary: ${}", format_usd(costs.summary_cost));
    println!("   - Total: ${}", format_usd(costs.total()));
    out.write_output("comment_posted", "true")?;
    Ok(())
}
