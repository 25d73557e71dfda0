use std::path::Path;

use claudestep_core::cost::{format_usd, CostBreakdown};
use claudestep_github::StepOutputs;

use crate::cmd_extract_cost::read_cost;

pub fn execute(
    main_file: &Path,
    summary_file: Option<&Path>,
    index: i64,
    out: &mut dyn StepOutputs,
) -> anyhow::Result<()> {
    let main_cost = read_cost(main_file, index, out);
    let summary_cost = summary_file.and_then(|p| read_cost(p, index, out));
    let costs = CostBreakdown::new(main_cost, summary_cost);

    println!("Main task: ${}", format_usd(costs.main_cost));
    println!("PR summary: ${}", format_usd(costs.summary_cost));
    println!("Total: ${}", format_usd(costs.total()));

    out.write_output("main_cost", &format_usd(costs.main_cost))?;
    out.write_output("summary_cost", &format_usd(costs.summary_cost))?;
    out.write_output("total_cost", &format_usd(costs.total()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudestep_github::RecordingOutputs;

    #[test]
    fn sums_main_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.json");
        let summary = dir.path().join("summary.json");
        std::fs::write(&main, r#"[{"total_cost_usd": 0.75}]"#).unwrap();
        std::fs::write(&summary, r#"{"usage": {"total_cost_usd": "0.05"}}"#).unwrap();

        let mut out = RecordingOutputs::new();
        execute(&main, Some(&summary), -1, &mut out).unwrap();
        assert_eq!(out.get("main_cost"), Some("0.750000"));
        assert_eq!(out.get("summary_cost"), Some("0.050000"));
        assert_eq!(out.get("total_cost"), Some("0.800000"));
    }

    #[test]
    fn missing_summary_counts_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.json");
        std::fs::write(&main, r#"{"total_cost_usd": 2}"#).unwrap();

        let mut out = RecordingOutputs::new();
        execute(&main, None, -1, &mut out).unwrap();
        assert_eq!(out.get("summary_cost"), Some("0.000000"));
        assert_eq!(out.get("total_cost"), Some("2.000000"));
    }
}
