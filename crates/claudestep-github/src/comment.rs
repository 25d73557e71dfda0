use claudestep_core::cost::{format_usd, CostBreakdown};

/// Link to a workflow run page.
pub fn run_url(server_url: &str, repo: &str, run_id: &str) -> String {
    format!(
        "{}/{repo}/actions/runs/{run_id}",
        server_url.trim_end_matches('/')
    )
}

/// Body of the PR comment: the generated summary (if any) followed by the
/// cost table.
pub fn format_pr_comment(summary: &str, costs: &CostBreakdown, run_url: &str) -> String {
    let mut body = String::new();
    let summary = summary.trim();
    if !summary.is_empty() {
        body.push_str(summary);
        body.push_str("\n\n---\n\n");
    }
    body.push_str("## 💰 Cost Breakdown\n\n");
    body.push_str("| Component | Cost (USD) |\n");
    body.push_str("|-----------|------------|\n");
    body.push_str(&format!("| Main task | ${} |\n", format_usd(costs.main_cost)));
    body.push_str(&format!("| PR summary | ${} |\n", format_usd(costs.summary_cost)));
    body.push_str(&format!("| **Total** | **${}** |\n", format_usd(costs.total())));
    body.push_str(&format!("\n_[View workflow run]({run_url})_\n"));
    body
}
