//! Normalised view of a GitHub webhook payload and the skip/continue rules
//! evaluated against it.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::branch;
use crate::error::EventError;

/// GitHub event kinds the workflow distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PullRequest,
    Push,
    WorkflowDispatch,
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "pull_request" => EventKind::PullRequest,
            "push" => EventKind::Push,
            "workflow_dispatch" => EventKind::WorkflowDispatch,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::Push => "push",
            EventKind::WorkflowDispatch => "workflow_dispatch",
            EventKind::Other(name) => name,
        }
    }
}

// ── Raw payload shapes ──

#[derive(Debug, Default, Deserialize)]
struct RawEvent {
    #[serde(default)]
    pull_request: Option<RawPullRequest>,
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    inputs: Option<RawInputs>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInputs {
    #[serde(default)]
    project_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPullRequest {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    labels: Option<Vec<RawLabel>>,
    #[serde(default)]
    base: Option<RawRef>,
    #[serde(default)]
    head: Option<RawRef>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLabel {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRef {
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
}

// ── EventContext ──

/// Immutable, normalised event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub event_kind: EventKind,
    pub pr_number: Option<u64>,
    pub pr_merged: Option<bool>,
    pub pr_labels: BTreeSet<String>,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
    pub ref_name: Option<String>,
    push_before: Option<String>,
    push_after: Option<String>,
    dispatch_project: Option<String>,
}

/// Outcome of [`EventContext::should_skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
    Continue,
    Skip(String),
}

impl SkipDecision {
    pub fn should_skip(&self) -> bool {
        matches!(self, SkipDecision::Skip(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SkipDecision::Continue => None,
            SkipDecision::Skip(reason) => Some(reason),
        }
    }
}

impl EventContext {
    /// Parse `event_json` (the `toJson(github.event)` payload) for the event
    /// named `event_name`. An empty payload is read as `{}`.
    pub fn from_json(event_name: &str, event_json: &str) -> Result<Self, EventError> {
        let trimmed = event_json.trim();
        let value: serde_json::Value = if trimmed.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(trimmed)?
        };
        Self::from_value(event_name, value)
    }

    /// Build from an already-decoded payload.
    pub fn from_value(event_name: &str, value: serde_json::Value) -> Result<Self, EventError> {
        if !value.is_object() {
            return Err(EventError::NotAnObject(json_kind(&value)));
        }
        let event_kind = EventKind::from_name(event_name);
        // Unknown kinds carry no fields, so their payload is never decoded.
        let raw: RawEvent = match event_kind {
            EventKind::Other(_) => RawEvent::default(),
            _ => serde_json::from_value(value).map_err(EventError::Shape)?,
        };

        let mut ctx = EventContext {
            event_kind,
            pr_number: None,
            pr_merged: None,
            pr_labels: BTreeSet::new(),
            head_ref: None,
            base_ref: None,
            ref_name: None,
            push_before: None,
            push_after: None,
            dispatch_project: None,
        };

        match ctx.event_kind {
            EventKind::PullRequest => {
                let pr = raw.pull_request.unwrap_or_default();
                ctx.pr_number = pr.number;
                ctx.pr_merged = pr.merged;
                ctx.pr_labels = pr
                    .labels
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|l| l.name)
                    .filter(|n| !n.is_empty())
                    .collect();
                ctx.base_ref = pr.base.and_then(|r| non_empty(r.git_ref));
                ctx.head_ref = pr.head.and_then(|r| non_empty(r.git_ref));
            }
            EventKind::Push => {
                ctx.ref_name = non_empty(raw.git_ref).map(|r| strip_heads(&r));
                ctx.push_before = non_empty(raw.before);
                ctx.push_after = non_empty(raw.after);
            }
            EventKind::WorkflowDispatch => {
                ctx.ref_name = non_empty(raw.git_ref).map(|r| strip_heads(&r));
                ctx.dispatch_project = raw
                    .inputs
                    .and_then(|i| non_empty(i.project_name))
                    .map(|p| p.trim().to_string());
            }
            EventKind::Other(_) => {}
        }
        Ok(ctx)
    }

    /// `(before, after)` commits of a push.
    pub fn push_range(&self) -> Option<(&str, &str)> {
        Some((self.push_before.as_deref()?, self.push_after.as_deref()?))
    }

    /// `inputs.project_name` of a workflow_dispatch. [`resolve`] ignores it;
    /// callers decide whether it acts as an override.
    pub fn dispatch_project_input(&self) -> Option<&str> {
        self.dispatch_project.as_deref()
    }

    /// PR-level skip rules, first match wins. Non-PR events always continue;
    /// missing refs or projects are reported later by the resolution steps.
    pub fn should_skip(&self, required_label: &str) -> SkipDecision {
        if self.event_kind != EventKind::PullRequest {
            return SkipDecision::Continue;
        }
        if self.pr_merged != Some(true) {
            return SkipDecision::Skip("PR was closed but not merged".to_string());
        }
        if !self.pr_labels.contains(required_label) {
            return SkipDecision::Skip(format!(
                "PR does not have required label '{required_label}'"
            ));
        }
        SkipDecision::Continue
    }

    /// Project name encoded in the PR head branch (pull_request) or the
    /// pushed branch (push).
    pub fn extract_project_from_branch(&self) -> Option<String> {
        let branch = match self.event_kind {
            EventKind::PullRequest => self.head_ref.as_deref(),
            EventKind::Push => self.ref_name.as_deref(),
            _ => None,
        }?;
        branch::decode(branch).map(|parsed| parsed.project)
    }

    /// Ref to check out. After a merged PR the work continues on the base
    /// branch.
    pub fn get_checkout_ref(&self) -> Result<String, EventError> {
        match self.event_kind {
            EventKind::PullRequest => self
                .base_ref
                .clone()
                .ok_or_else(|| invalid("Pull request event missing base ref")),
            EventKind::Push => self
                .ref_name
                .clone()
                .ok_or_else(|| invalid("Push event missing ref")),
            EventKind::WorkflowDispatch => self
                .ref_name
                .clone()
                .ok_or_else(|| invalid("Workflow dispatch event missing ref")),
            EventKind::Other(ref name) => Err(invalid(&format!(
                "Cannot determine checkout ref for event type '{name}'"
            ))),
        }
    }

    /// Base branch for new PRs. Only pull_request events carry one; callers
    /// substitute their configured default on error.
    pub fn get_default_base_branch(&self) -> Result<String, EventError> {
        match self.event_kind {
            EventKind::PullRequest => self
                .base_ref
                .clone()
                .ok_or_else(|| invalid("Pull request event missing base ref")),
            _ => Err(invalid(&format!(
                "Event type '{}' does not determine a base branch",
                self.event_kind.as_str()
            ))),
        }
    }
}

// ── Resolution ──

/// Caller-supplied knobs for [`resolve`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    pub project_override: Option<&'a str>,
    pub required_label: &'a str,
    pub default_base_branch: &'a str,
}

/// Final decision for an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Skip {
        reason: String,
    },
    Proceed {
        project_name: String,
        checkout_ref: String,
        base_branch: String,
        merged_pr_number: Option<u64>,
    },
}

/// Run the whole decision chain: skip rules, project resolution, checkout
/// ref, base branch.
pub fn resolve(ctx: &EventContext, opts: &ResolveOptions<'_>) -> EventOutcome {
    if let SkipDecision::Skip(reason) = ctx.should_skip(opts.required_label) {
        return EventOutcome::Skip { reason };
    }

    let project = opts
        .project_override
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| ctx.extract_project_from_branch());
    let Some(project_name) = project else {
        let reason = if ctx.event_kind == EventKind::WorkflowDispatch {
            "No project_name provided for workflow_dispatch event"
        } else {
            "Could not determine project name from branch pattern"
        };
        return EventOutcome::Skip {
            reason: reason.to_string(),
        };
    };

    let checkout_ref = match ctx.get_checkout_ref() {
        Ok(r) => r,
        Err(e) => {
            return EventOutcome::Skip {
                reason: format!("Could not determine checkout ref: {e}"),
            }
        }
    };

    let base_branch = ctx
        .get_default_base_branch()
        .unwrap_or_else(|_| opts.default_base_branch.to_string());

    EventOutcome::Proceed {
        project_name,
        checkout_ref,
        base_branch,
        merged_pr_number: ctx.pr_number,
    }
}

fn invalid(msg: &str) -> EventError {
    EventError::InvalidEvent(msg.to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn strip_heads(git_ref: &str) -> String {
    git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(git_ref)
        .to_string()
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
