//! Thin wrappers over the `gh` and `git` command-line tools.

use std::io::Write;
use std::process::Command;

use claudestep_core::OpenPullRequest;
use serde::Deserialize;

use crate::error::GhError;

/// Everything the workflow needs from GitHub and the local checkout.
pub trait GitHubApi {
    /// Open PRs carrying `label`.
    fn list_open_pull_requests(&self, label: &str) -> Result<Vec<OpenPullRequest>, GhError>;

    fn post_comment(&self, pr_number: u64, body: &str) -> Result<(), GhError>;

    /// `git diff --name-status` between two commits.
    fn diff_name_status(&self, before: &str, after: &str) -> Result<String, GhError>;
}

/// [`GitHubApi`] backed by `gh` and `git` subprocesses.
#[derive(Debug, Clone, Default)]
pub struct GhCli {
    repo: Option<String>,
}

impl GhCli {
    /// `repo` is `owner/name`; `None` lets `gh` infer it from the checkout.
    pub fn new(repo: Option<String>) -> Self {
        Self {
            repo: repo.filter(|r| !r.trim().is_empty()),
        }
    }

    fn repo_args(&self) -> Vec<String> {
        match &self.repo {
            Some(r) => vec!["--repo".to_string(), r.clone()],
            None => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPr {
    number: u64,
    #[serde(default)]
    head_ref_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    assignees: Vec<RawLogin>,
}

#[derive(Deserialize)]
struct RawLogin {
    login: String,
}

/// Decode `gh pr list --json number,headRefName,title,assignees` output.
pub fn parse_pr_list(json: &str) -> Result<Vec<OpenPullRequest>, GhError> {
    let raw: Vec<RawPr> = serde_json::from_str(json).map_err(|source| GhError::Decode {
        what: "gh pr list output",
        source,
    })?;
    Ok(raw
        .into_iter()
        .map(|p| OpenPullRequest {
            number: p.number,
            head_ref_name: p.head_ref_name,
            title: p.title,
            assignees: p.assignees.into_iter().map(|a| a.login).collect(),
        })
        .collect())
}

fn run(program: &'static str, args: &[String]) -> Result<String, GhError> {
    tracing::debug!(program = program, args = ?args, "running");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| GhError::Spawn { program, source })?;
    if !output.status.success() {
        return Err(GhError::Failed {
            program,
            args: args.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl GitHubApi for GhCli {
    fn list_open_pull_requests(&self, label: &str) -> Result<Vec<OpenPullRequest>, GhError> {
        let mut args: Vec<String> = ["pr", "list"].iter().map(|s| s.to_string()).collect();
        args.extend(self.repo_args());
        args.extend(
            [
                "--label",
                label,
                "--state",
                "open",
                "--limit",
                "100",
                "--json",
                "number,headRefName,title,assignees",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        let prs = parse_pr_list(&run("gh", &args)?)?;
        tracing::info!(label = label, count = prs.len(), "listed open PRs");
        Ok(prs)
    }

    fn post_comment(&self, pr_number: u64, body: &str) -> Result<(), GhError> {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile()?;
        file.write_all(body.as_bytes())?;
        file.flush()?;

        let mut args = vec!["pr".to_string(), "comment".to_string(), pr_number.to_string()];
        args.extend(self.repo_args());
        args.push("--body-file".to_string());
        args.push(file.path().to_string_lossy().into_owned());
        run("gh", &args)?;
        tracing::info!(pr = pr_number, "posted PR comment");
        Ok(())
    }

    fn diff_name_status(&self, before: &str, after: &str) -> Result<String, GhError> {
        let args: Vec<String> = vec![
            "diff".into(),
            "--name-status".into(),
            before.to_string(),
            after.to_string(),
        ];
        run("git", &args)
    }
}
