//! Savings allocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One saving method within a bucket, e.g. `{"method": "FD", "amount": 300}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsEntry {
    /// Saving method name.
    pub method: String,
    /// Allocated amount. The settings form may submit it as text.
    #[serde(default)]
    pub amount: serde_json::Value,
}

impl SavingsEntry {
    /// Amount as a number, accepting numeric strings.
    pub fn amount_value(&self) -> f64 {
        match &self.amount {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Savings allocation keyed by bucket (e.g. "bank", "investments").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavingsPlan(pub BTreeMap<String, Vec<SavingsEntry>>);

impl SavingsPlan {
    /// Number of saving methods across all buckets.
    pub fn method_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Total allocated across all buckets.
    pub fn total(&self) -> f64 {
        self.0
            .values()
            .flatten()
            .map(SavingsEntry::amount_value)
            .sum()
    }

    /// Sets the amount for a method in a bucket, adding it when missing.
    pub fn set_amount(&mut self, bucket: &str, method: &str, amount: f64) {
        let entries = self.0.entry(bucket.to_string()).or_default();
        match entries.iter_mut().find(|e| e.method == method) {
            Some(entry) => entry.amount = serde_json::Value::from(amount),
            None => entries.push(SavingsEntry {
                method: method.to_string(),
                amount: serde_json::Value::from(amount),
            }),
        }
    }
}
