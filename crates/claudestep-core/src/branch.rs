//! Branch and artifact naming: `<prefix>-<project>-<suffix>`.
//!
//! Two suffix conventions are in circulation. Older branches end with the
//! numeric task index (`claude-step-my-refactor-42`); newer ones end with an
//! 8-character hash (`claude-step-my-refactor-a1b2c3d4`) and carry no task
//! index at all. Decoding tries each convention in [`DecodeStrategy::ORDER`].

use crate::error::NameError;
use crate::hash::{short_hash, SHORT_HASH_LEN};

/// Prefix shared by every branch the workflow creates.
pub const BRANCH_PREFIX: &str = "claude-step";

/// Prefix of task metadata artifact names (`task-metadata-<project>-<index>.json`).
pub const ARTIFACT_PREFIX: &str = "task-metadata";

/// The trailing segment of a decoded name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSuffix {
    TaskIndex(u32),
    Hash(String),
}

/// Result of decoding a branch or artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub project: String,
    pub task_index: Option<u32>,
    pub suffix: NameSuffix,
}

/// A suffix convention. Strategies are tried in [`DecodeStrategy::ORDER`];
/// the first one that recognises the last token wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Last token is a decimal task index.
    TaskIndex,
    /// Last token is an opaque 8-character hex hash.
    HashSuffix,
}

impl DecodeStrategy {
    pub const ORDER: [DecodeStrategy; 2] = [DecodeStrategy::TaskIndex, DecodeStrategy::HashSuffix];

    fn recognise(self, token: &str) -> Option<NameSuffix> {
        match self {
            DecodeStrategy::TaskIndex => {
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                token.parse::<u32>().ok().map(NameSuffix::TaskIndex)
            }
            DecodeStrategy::HashSuffix => {
                let is_hash = token.len() == SHORT_HASH_LEN
                    && token.bytes().all(|b| b.is_ascii_hexdigit());
                is_hash.then(|| NameSuffix::Hash(token.to_ascii_lowercase()))
            }
        }
    }
}

/// Encoder/decoder for one naming prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameCodec {
    prefix: &'static str,
}

impl NameCodec {
    pub const BRANCH: NameCodec = NameCodec {
        prefix: BRANCH_PREFIX,
    };
    pub const ARTIFACT: NameCodec = NameCodec {
        prefix: ARTIFACT_PREFIX,
    };

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// `<prefix>-<project>-<task_index>`.
    pub fn encode(&self, project: &str, task_index: u32) -> Result<String, NameError> {
        validate_project(project)?;
        Ok(format!("{}-{project}-{task_index}", self.prefix))
    }

    /// `<prefix>-<project>-<hash>`, where the hash is derived from `seed`
    /// (usually the task description).
    pub fn encode_with_hash(&self, project: &str, seed: &str) -> Result<String, NameError> {
        validate_project(project)?;
        Ok(format!("{}-{project}-{}", self.prefix, short_hash(seed)))
    }

    /// Decode a name produced by either convention. Returns `None` when the
    /// prefix is missing, no strategy recognises the suffix, or the project
    /// part would be ambiguous.
    pub fn decode(&self, name: &str) -> Option<ParsedName> {
        let name = name.trim();
        let name = if self.prefix == ARTIFACT_PREFIX {
            name.strip_suffix(".json").unwrap_or(name)
        } else {
            name
        };
        let rest = name.strip_prefix(self.prefix)?.strip_prefix('-')?;
        let (project, last) = rest.rsplit_once('-')?;
        if project.is_empty() {
            return None;
        }

        let suffix = DecodeStrategy::ORDER
            .iter()
            .find_map(|strategy| strategy.recognise(last))?;

        if is_numeric_only(project) {
            tracing::warn!(
                input = name,
                project = project,
                "refusing to decode name whose project part is only numeric tokens"
            );
            return None;
        }

        let task_index = match suffix {
            NameSuffix::TaskIndex(i) => Some(i),
            NameSuffix::Hash(_) => None,
        };
        Some(ParsedName {
            project: project.to_string(),
            task_index,
            suffix,
        })
    }
}

/// Encode a branch name with the numeric task-index suffix.
pub fn encode(project: &str, task_index: u32) -> Result<String, NameError> {
    NameCodec::BRANCH.encode(project, task_index)
}

/// Decode a branch name with either suffix convention.
pub fn decode(branch: &str) -> Option<ParsedName> {
    NameCodec::BRANCH.decode(branch)
}

fn validate_project(project: &str) -> Result<(), NameError> {
    if project.trim().is_empty() {
        return Err(NameError::EmptyProject);
    }
    if is_numeric_only(project) {
        return Err(NameError::AmbiguousProject(project.to_string()));
    }
    Ok(())
}

/// True when every hyphen-separated token is made of ASCII digits, e.g.
/// `"2024"` or `"2024-01"`.
fn is_numeric_only(project: &str) -> bool {
    project
        .split('-')
        .all(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_task_index_form() {
        assert_eq!(
            encode("my-refactor", 42).unwrap(),
            "claude-step-my-refactor-42"
        );
    }

    #[test]
    fn decode_task_index_form() {
        let parsed = decode("claude-step-my-refactor-42").unwrap();
        assert_eq!(parsed.project, "my-refactor");
        assert_eq!(parsed.task_index, Some(42));
        assert_eq!(parsed.suffix, NameSuffix::TaskIndex(42));
    }

    #[test]
    fn decode_project_with_trailing_number_token() {
        let parsed = decode("claude-step-swift-ios-migration-phase-2-99").unwrap();
        assert_eq!(parsed.project, "swift-ios-migration-phase-2");
        assert_eq!(parsed.task_index, Some(99));
    }

    #[test]
    fn decode_hash_form() {
        let parsed = decode("claude-step-my-project-a1b2c3d4").unwrap();
        assert_eq!(parsed.project, "my-project");
        assert_eq!(parsed.task_index, None);
        assert_eq!(parsed.suffix, NameSuffix::Hash("a1b2c3d4".into()));
    }

    #[test]
    fn decode_all_digit_hash_prefers_task_index() {
        let parsed = decode("claude-step-proj-12345678").unwrap();
        assert_eq!(parsed.project, "proj");
        assert_eq!(parsed.task_index, Some(12_345_678));
    }

    #[test]
    fn decode_long_hyphenated_project() {
        let parsed = decode("claude-step-complex-project-name-abcd1234").unwrap();
        assert_eq!(parsed.project, "complex-project-name");
    }

    #[test]
    fn round_trip_task_index() {
        for (project, idx) in [("a", 0), ("my-refactor", 7), ("v2-api-3", 12)] {
            let branch = encode(project, idx).unwrap();
            let parsed = decode(&branch).unwrap();
            assert_eq!(parsed.project, project);
            assert_eq!(parsed.task_index, Some(idx));
        }
    }

    #[test]
    fn round_trip_hash() {
        let branch = NameCodec::BRANCH
            .encode_with_hash("auth-cleanup", "Replace session cookies")
            .unwrap();
        assert!(branch.ends_with(&short_hash("Replace session cookies")));
        let parsed = decode(&branch).unwrap();
        assert_eq!(parsed.project, "auth-cleanup");
    }

    #[test]
    fn decode_rejects_foreign_prefix() {
        assert!(decode("feature/some-feature").is_none());
        assert!(decode("claude-steps-x-1").is_none());
        assert!(decode("main").is_none());
        assert!(decode("").is_none());
    }

    #[test]
    fn decode_rejects_unrecognised_suffix() {
        assert!(decode("claude-step-my-project").is_none());
        assert!(decode("claude-step-my-project-xyz").is_none());
    }

    #[test]
    fn decode_rejects_missing_project() {
        assert!(decode("claude-step-42").is_none());
        assert!(decode("claude-step--42").is_none());
    }

    #[test]
    fn numeric_project_is_rejected_both_ways() {
        assert_eq!(
            encode("2024", 1),
            Err(NameError::AmbiguousProject("2024".into()))
        );
        assert_eq!(
            encode("2024-01", 1),
            Err(NameError::AmbiguousProject("2024-01".into()))
        );
        assert!(decode("claude-step-2024-1").is_none());
        assert!(decode("claude-step-2024-01-1").is_none());
    }

    #[test]
    fn empty_project_is_rejected() {
        assert_eq!(encode("", 1), Err(NameError::EmptyProject));
        assert_eq!(encode("  ", 1), Err(NameError::EmptyProject));
    }

    #[test]
    fn artifact_names_decode_with_extension() {
        let parsed = NameCodec::ARTIFACT
            .decode("task-metadata-myproject-42.json")
            .unwrap();
        assert_eq!(parsed.project, "myproject");
        assert_eq!(parsed.task_index, Some(42));

        let parsed = NameCodec::ARTIFACT.decode("task-metadata-myproject-15").unwrap();
        assert_eq!(parsed.task_index, Some(15));
    }

    #[test]
    fn branch_codec_does_not_decode_artifacts() {
        assert!(decode("task-metadata-myproject-42").is_none());
    }
}
