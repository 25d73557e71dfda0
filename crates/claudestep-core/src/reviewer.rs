//! Reviewer capacity bookkeeping over one snapshot of open PRs.

use std::collections::HashMap;

use crate::branch;
use crate::config::ReviewerRecord;

/// Prefix the workflow puts in front of every PR title.
pub const PR_TITLE_PREFIX: &str = "ClaudeStep: ";

/// One open PR as listed by the collaborator, already filtered by label and
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPullRequest {
    pub number: u64,
    pub head_ref_name: String,
    pub title: String,
    pub assignees: Vec<String>,
}

/// An open PR attributed to a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPRSummary {
    pub pr_number: u64,
    /// `None` for PRs on hash-suffixed branches.
    pub task_index: Option<u32>,
    pub task_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerCapacity {
    pub username: String,
    pub max_open_prs: u32,
    pub open_prs: Vec<OpenPRSummary>,
    pub has_capacity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerCapacityResult {
    /// One entry per reviewer, in roster order.
    pub reviewers: Vec<ReviewerCapacity>,
    pub selected_reviewer: Option<String>,
    pub all_at_capacity: bool,
}

impl ReviewerCapacityResult {
    pub fn get(&self, username: &str) -> Option<&ReviewerCapacity> {
        self.reviewers.iter().find(|r| r.username == username)
    }

    pub fn total_open_prs(&self) -> usize {
        self.reviewers.iter().map(|r| r.open_prs.len()).sum()
    }
}

/// Strip [`PR_TITLE_PREFIX`] from a PR title.
pub fn task_description_from_title(title: &str) -> &str {
    title.strip_prefix(PR_TITLE_PREFIX).unwrap_or(title)
}

/// Attribute each open PR of `project` to a reviewer and pick the first
/// reviewer, in roster order, with spare capacity.
///
/// A PR counts for `project` when its head branch decodes to that project.
/// It is attributed to its first assignee on the roster. PRs whose assignees
/// are all unknown are logged and left out of every ledger.
pub fn compute_capacity(
    reviewers: &[ReviewerRecord],
    open_prs: &[OpenPullRequest],
    project: &str,
) -> ReviewerCapacityResult {
    let mut ledger: HashMap<&str, Vec<OpenPRSummary>> = reviewers
        .iter()
        .map(|r| (r.username.as_str(), Vec::new()))
        .collect();

    for pr in open_prs {
        let Some(parsed) = branch::decode(&pr.head_ref_name) else {
            tracing::debug!(pr = pr.number, branch = pr.head_ref_name.as_str(), "branch not in workflow format");
            continue;
        };
        if parsed.project != project {
            continue;
        }

        let owner = pr
            .assignees
            .iter()
            .find(|a| ledger.contains_key(a.as_str()));
        let Some(owner) = owner else {
            if pr.assignees.is_empty() {
                tracing::debug!(pr = pr.number, "open PR has no assignee");
            } else {
                tracing::warn!(
                    pr = pr.number,
                    assignees = ?pr.assignees,
                    "open PR is assigned to an unknown reviewer; excluded from capacity"
                );
            }
            continue;
        };

        tracing::info!(pr = pr.number, reviewer = owner.as_str(), "attributed open PR");
        if let Some(prs) = ledger.get_mut(owner.as_str()) {
            prs.push(OpenPRSummary {
                pr_number: pr.number,
                task_index: parsed.task_index,
                task_description: task_description_from_title(&pr.title).to_string(),
            });
        }
    }

    let mut selected_reviewer = None;
    let mut capacities = Vec::with_capacity(reviewers.len());
    for r in reviewers {
        let open_prs = ledger.remove(r.username.as_str()).unwrap_or_default();
        let has_capacity = (open_prs.len() as u64) < u64::from(r.max_open_prs);
        tracing::info!(
            reviewer = r.username.as_str(),
            open = open_prs.len(),
            max = r.max_open_prs,
            "reviewer load"
        );
        if has_capacity && selected_reviewer.is_none() {
            selected_reviewer = Some(r.username.clone());
        }
        capacities.push(ReviewerCapacity {
            username: r.username.clone(),
            max_open_prs: r.max_open_prs,
            open_prs,
            has_capacity,
        });
    }

    ReviewerCapacityResult {
        reviewers: capacities,
        all_at_capacity: selected_reviewer.is_none(),
        selected_reviewer,
    }
}
