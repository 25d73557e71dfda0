use std::cell::RefCell;
use std::path::PathBuf;

use claudestep_core::OpenPullRequest;
use claudestep_github::{GhError, GitHubApi};

use crate::Settings;

/// Scripted [`GitHubApi`] that records posted comments.
#[derive(Default)]
pub struct FakeGitHub {
    pub open_prs: Vec<OpenPullRequest>,
    /// Listings for specific labels; other labels get `open_prs`.
    pub prs_by_label: Vec<(String, Vec<OpenPullRequest>)>,
    pub name_status: String,
    pub fail_comment: bool,
    pub comments: RefCell<Vec<(u64, String)>>,
    pub listed_labels: RefCell<Vec<String>>,
    pub diffed: RefCell<Vec<(String, String)>>,
}

impl GitHubApi for FakeGitHub {
    fn list_open_pull_requests(&self, label: &str) -> Result<Vec<OpenPullRequest>, GhError> {
        self.listed_labels.borrow_mut().push(label.to_string());
        let listed = self
            .prs_by_label
            .iter()
            .find(|(l, _)| l == label)
            .map_or(&self.open_prs, |(_, prs)| prs);
        Ok(listed.clone())
    }

    fn post_comment(&self, pr_number: u64, body: &str) -> Result<(), GhError> {
        if self.fail_comment {
            return Err(GhError::Failed {
                program: "gh",
                args: "pr comment".into(),
                code: 1,
                stderr: "HTTP 403".into(),
            });
        }
        self.comments.borrow_mut().push((pr_number, body.to_string()));
        Ok(())
    }

    fn diff_name_status(&self, before: &str, after: &str) -> Result<String, GhError> {
        self.diffed
            .borrow_mut()
            .push((before.to_string(), after.to_string()));
        Ok(self.name_status.clone())
    }
}

pub fn open_pr(number: u64, branch: &str, assignee: &str) -> OpenPullRequest {
    OpenPullRequest {
        number,
        head_ref_name: branch.to_string(),
        title: format!("ClaudeStep: Task {number}"),
        assignees: vec![assignee.to_string()],
    }
}

pub fn settings(workspace: PathBuf) -> Settings {
    Settings {
        github_output: None,
        repo: Some("octo/repo".into()),
        run_id: Some("12345".into()),
        server_url: "https://github.com".into(),
        workspace,
        log_level: "info".into(),
    }
}
