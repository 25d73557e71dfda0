use std::path::Path;

use claudestep_core::cost::{extract_from_document, format_usd};
use claudestep_github::StepOutputs;

/// Cost recorded in one execution file. Problems with the file are reported
/// as annotations and yield `None`; they never fail the workflow.
pub(crate) fn read_cost(path: &Path, index: i64, out: &mut dyn StepOutputs) -> Option<f64> {
    println!("Reading execution file: {}", path.display());
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            out.warning(&format!("Execution file not found: {} ({e})", path.display()));
            return None;
        }
    };
    let doc: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            out.set_error(&format!("Failed to parse execution file as JSON: {e}"));
            return None;
        }
    };
    let cost = extract_from_document(&doc, index);
    if cost.is_none() {
        out.warning("Could not find cost information in execution file");
    }
    cost
}

pub fn execute(path: &Path, index: i64, out: &mut dyn StepOutputs) -> anyhow::Result<()> {
    match read_cost(path, index, out) {
        Some(cost) => {
            out.write_output("cost_usd", &format_usd(cost))?;
            println!("Extracted cost: ${} USD", format_usd(cost));
        }
        None => out.write_output("cost_usd", "0")?,
    }
    Ok(())
}
