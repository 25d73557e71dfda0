//! Cost extraction from agent execution logs.
//!
//! An execution file is either a single result object or a list of stream
//! events, some of which carry `total_cost_usd` (at top level or under
//! `usage`).

use serde_json::Value;

const COST_KEY: &str = "total_cost_usd";

/// Cost of one execution document, in USD.
pub fn extract_cost(doc: &Value) -> Option<f64> {
    doc.get(COST_KEY)
        .and_then(coerce)
        .or_else(|| doc.get("usage").and_then(|u| u.get(COST_KEY)).and_then(coerce))
}

fn coerce(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn carries_cost(v: &Value) -> bool {
    v.get(COST_KEY).is_some() || v.get("usage").and_then(|u| u.get(COST_KEY)).is_some()
}

/// Cost from a list of execution entries.
///
/// Entries carrying a cost are selected by `index`, which may be negative
/// (`-1` is the last one). An out-of-range index falls back to the last
/// entry. When no entry carries a cost, the last element of the whole list
/// is used.
pub fn extract_from_list(items: &[Value], index: i64) -> Option<f64> {
    let with_cost: Vec<&Value> = items.iter().filter(|v| carries_cost(v)).collect();
    if with_cost.is_empty() {
        let last = items.last()?;
        tracing::warn!(
            entries = items.len(),
            "no execution entry carries a cost; using the last entry"
        );
        return extract_cost(last);
    }

    let len = with_cost.len() as i64;
    let resolved = if index < 0 { len + index } else { index };
    let chosen = if (0..len).contains(&resolved) {
        with_cost[resolved as usize]
    } else {
        tracing::warn!(
            index = index,
            entries = len,
            "execution index out of range; using the last entry"
        );
        with_cost[with_cost.len() - 1]
    };
    extract_cost(chosen)
}

/// Cost from either document shape.
pub fn extract_from_document(doc: &Value, index: i64) -> Option<f64> {
    match doc {
        Value::Array(items) => extract_from_list(items, index),
        Value::Object(_) => extract_cost(doc),
        _ => None,
    }
}

/// Sum of known costs; missing ones count as zero.
pub fn aggregate(costs: &[Option<f64>]) -> f64 {
    costs.iter().flatten().sum()
}

pub fn format_usd(cost: f64) -> String {
    format!("{cost:.6}")
}

/// Main and summary execution costs of one task run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    pub main_cost: f64,
    pub summary_cost: f64,
}

impl CostBreakdown {
    pub fn new(main_cost: Option<f64>, summary_cost: Option<f64>) -> Self {
        Self {
            main_cost: main_cost.unwrap_or(0.0),
            summary_cost: summary_cost.unwrap_or(0.0),
        }
    }

    pub fn total(&self) -> f64 {
        aggregate(&[Some(self.main_cost), Some(self.summary_cost)])
    }
}
