mod cmd_auto_start;
mod cmd_extract_cost;
mod cmd_finalize;
mod cmd_parse_event;
mod cmd_post_pr_comment;
mod cmd_prepare;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use claudestep_core::config::DEFAULT_LABEL;
use claudestep_github::{GhCli, GitHubApi, StepOutputs, WorkflowOutputs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "claudestep",
    version,
    about = "GitHub Actions glue for incremental, reviewer-paced refactoring PRs"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    cmd: Command,
}

/// Process-wide inputs, read once from flags or the Actions environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// File that receives step outputs
    #[arg(long, env = "GITHUB_OUTPUT", global = true)]
    pub github_output: Option<PathBuf>,
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY", global = true)]
    pub repo: Option<String>,
    /// Workflow run id, used to link the run from PR comments
    #[arg(long, env = "GITHUB_RUN_ID", global = true)]
    pub run_id: Option<String>,
    #[arg(
        long,
        env = "GITHUB_SERVER_URL",
        default_value = "https://github.com",
        global = true
    )]
    pub server_url: String,
    /// Repository checkout that holds the claude-step/ directory
    #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".", global = true)]
    pub workspace: PathBuf,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CLAUDESTEP_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether an inbound event should run the workflow
    ParseEvent {
        #[arg(long, env = "EVENT_NAME", default_value = "")]
        event_name: String,
        /// Event payload as JSON (`toJson(github.event)`)
        #[arg(long, env = "EVENT_JSON", default_value = "{}")]
        event_json: String,
        /// Explicit project, overrides branch decoding
        #[arg(long, env = "PROJECT_NAME")]
        project_name: Option<String>,
        #[arg(long, env = "DEFAULT_BASE_BRANCH", default_value = "main")]
        default_base_branch: String,
        /// Label a merged PR must carry
        #[arg(long, env = "PR_LABEL", default_value = DEFAULT_LABEL)]
        pr_label: String,
    },
    /// Pick a reviewer and the next task of a project
    Prepare {
        #[arg(long, env = "PROJECT_NAME")]
        project_name: String,
        #[arg(long, env = "CONFIG_PATH")]
        config_path: Option<String>,
        #[arg(long, env = "SPEC_PATH")]
        spec_path: Option<String>,
        #[arg(long, env = "PR_TEMPLATE_PATH")]
        pr_template_path: Option<String>,
        #[arg(long, env = "DEFAULT_BASE_BRANCH", default_value = "main")]
        default_base_branch: String,
    },
    /// Sum the costs of the main and summary executions
    Finalize {
        #[arg(long, env = "MAIN_EXECUTION_FILE")]
        main_execution_file: PathBuf,
        #[arg(long, env = "SUMMARY_EXECUTION_FILE")]
        summary_execution_file: Option<PathBuf>,
        #[arg(long, env = "EXECUTION_INDEX", default_value_t = -1, allow_hyphen_values = true)]
        index: i64,
    },
    /// Find projects whose spec.md was pushed and that have no PRs yet
    AutoStart {
        #[arg(long, env = "REF_BEFORE")]
        before: Option<String>,
        #[arg(long, env = "REF_AFTER")]
        after: Option<String>,
        /// Push payload used when --before or --after is not given
        #[arg(long, env = "EVENT_JSON")]
        event_json: Option<String>,
        /// Only printed in the log; detection does not depend on it
        #[arg(long, env = "BASE_BRANCH", default_value = "main")]
        base_branch: String,
        /// Label listed for projects without a readable configuration
        #[arg(long, env = "PR_LABEL", default_value = DEFAULT_LABEL)]
        pr_label: String,
    },
    /// Extract the cost of one execution log
    ExtractCost {
        #[arg(long, env = "EXECUTION_FILE")]
        execution_file: PathBuf,
        #[arg(long, env = "EXECUTION_INDEX", default_value_t = -1, allow_hyphen_values = true)]
        index: i64,
    },
    /// Post the summary and cost breakdown as a PR comment
    PostPrComment {
        #[arg(long, env = "PR_NUMBER")]
        pr_number: Option<String>,
        #[arg(long, env = "SUMMARY_FILE")]
        summary_file: Option<PathBuf>,
        #[arg(long, env = "MAIN_COST", default_value_t = 0.0)]
        main_cost: f64,
        #[arg(long, env = "SUMMARY_COST", default_value_t = 0.0)]
        summary_cost: f64,
    },
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dispatch(
    cmd: Command,
    settings: &Settings,
    api: &dyn GitHubApi,
    out: &mut dyn StepOutputs,
) -> anyhow::Result<()> {
    match cmd {
        Command::ParseEvent {
            event_name,
            event_json,
            project_name,
            default_base_branch,
            pr_label,
        } => cmd_parse_event::execute(
            &cmd_parse_event::ParseEventParams {
                event_name: &event_name,
                event_json: &event_json,
                project_name: project_name.as_deref(),
                default_base_branch: &default_base_branch,
                pr_label: &pr_label,
            },
            out,
        ),
        Command::Prepare {
            project_name,
            config_path,
            spec_path,
            pr_template_path,
            default_base_branch,
        } => cmd_prepare::execute(
            settings,
            &cmd_prepare::PrepareParams {
                project_name: &project_name,
                overrides: claudestep_core::project::ProjectOverrides {
                    config_path,
                    spec_path,
                    pr_template_path,
                },
                default_base_branch: &default_base_branch,
            },
            api,
            out,
        ),
        Command::Finalize {
            main_execution_file,
            summary_execution_file,
            index,
        } => cmd_finalize::execute(
            &main_execution_file,
            summary_execution_file.as_deref(),
            index,
            out,
        ),
        Command::AutoStart {
            before,
            after,
            event_json,
            base_branch,
            pr_label,
        } => cmd_auto_start::execute(
            settings,
            &cmd_auto_start::AutoStartParams {
                before: before.as_deref(),
                after: after.as_deref(),
                event_json: event_json.as_deref(),
                base_branch: &base_branch,
                pr_label: &pr_label,
            },
            api,
            out,
        ),
        Command::ExtractCost {
            execution_file,
            index,
        } => cmd_extract_cost::execute(&execution_file, index, out),
        Command::PostPrComment {
            pr_number,
            summary_file,
            main_cost,
            summary_cost,
        } => cmd_post_pr_comment::execute(
            settings,
            &cmd_post_pr_comment::CommentParams {
                pr_number: pr_number.as_deref(),
                summary_file: summary_file.as_deref(),
                main_cost,
                summary_cost,
            },
            api,
            out,
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.settings.log_level);

    let api = GhCli::new(cli.settings.repo.clone());
    let mut outputs = WorkflowOutputs::new(cli.settings.github_output.clone());

    match dispatch(cli.cmd, &cli.settings, &api, &mut outputs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = message.as_str(), "command failed");
            outputs.set_error(&message);
            ExitCode::FAILURE
        }
    }
}
