//! Typed `configuration.json` of one project.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::ConfigError;

/// Label used when a project does not configure its own.
pub const DEFAULT_LABEL: &str = "claudestep";

/// A reviewer and how many open PRs they accept at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewerRecord {
    pub username: String,
    #[serde(rename = "maxOpenPRs", alias = "maxPRs")]
    pub max_open_prs: u32,
}

impl ReviewerRecord {
    pub fn new(username: impl Into<String>, max_open_prs: u32) -> Self {
        Self {
            username: username.into(),
            max_open_prs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    #[serde(default)]
    pub reviewers: Vec<ReviewerRecord>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub base_branch: Option<String>,
}

impl ProjectConfiguration {
    /// Parse and validate. Reviewer order is preserved; it is the selection
    /// priority.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ProjectConfiguration = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for r in &self.reviewers {
            if r.username.trim().is_empty() {
                return Err(ConfigError::EmptyUsername);
            }
            if r.max_open_prs == 0 {
                return Err(ConfigError::ZeroCapacity {
                    username: r.username.clone(),
                });
            }
            if !seen.insert(r.username.as_str()) {
                return Err(ConfigError::DuplicateReviewer(r.username.clone()));
            }
        }
        Ok(())
    }

    /// The configured label, or [`DEFAULT_LABEL`].
    pub fn label_or_default(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LABEL)
    }
}
