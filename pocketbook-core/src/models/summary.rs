//! Dashboard summary types.
//!
//! The expense endpoint returns a sparse list of `{month, total}` entries in
//! no particular order. Charts want a dense January..December series, which
//! [`MonthlySeries::from_totals`] builds.

use serde::{Deserialize, Serialize};

/// Number of slots in a [`MonthlySeries`].
pub const MONTHS_PER_YEAR: usize = 12;

// ============================================================================
// Monthly Totals
// ============================================================================

/// Total spent in one month, as returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Month number, 1-indexed.
    pub month: i64,
    /// Amount spent in that month.
    #[serde(default)]
    pub total: f64,
}

impl MonthlyTotal {
    /// Creates a new entry.
    pub fn new(month: i64, total: f64) -> Self {
        Self { month, total }
    }

    /// Zero-based slot for this entry, or `None` when the month is out of range.
    pub fn slot(&self) -> Option<usize> {
        let index = usize::try_from(self.month.checked_sub(1)?).ok()?;
        (index < MONTHS_PER_YEAR).then_some(index)
    }
}

/// Dense expense series, one slot per month (index 0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries([f64; MONTHS_PER_YEAR]);

impl MonthlySeries {
    /// Reshapes sparse monthly totals into a zero-filled 12-slot series.
    ///
    /// Entries whose month falls outside 1..=12 are ignored. When a month
    /// appears more than once the last entry wins.
    pub fn from_totals<'a>(totals: impl IntoIterator<Item = &'a MonthlyTotal>) -> Self {
        let mut slots = [0.0; MONTHS_PER_YEAR];
        for entry in totals {
            if let Some(index) = entry.slot() {
                slots[index] = entry.total;
            }
        }
        Self(slots)
    }

    /// Returns the slots as a slice (always 12 long).
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Amount for a 1-indexed month.
    pub fn month(&self, month: usize) -> Option<f64> {
        month.checked_sub(1).and_then(|i| self.0.get(i).copied())
    }

    /// Sum over the year.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// 1-indexed month with the highest spend, if any spend was recorded.
    pub fn peak_month(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i + 1)
    }
}

impl From<MonthlySeries> for Vec<f64> {
    fn from(series: MonthlySeries) -> Self {
        series.0.to_vec()
    }
}

// ============================================================================
// Category Breakdown
// ============================================================================

/// One slice of the top-categories breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category name.
    pub category: String,
    /// Amount spent in this category.
    #[serde(default)]
    pub amount: f64,
}

impl CategoryTotal {
    /// Creates a new category total.
    pub fn new(category: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }

    /// Share of `total`, as a percentage.
    pub fn share_of(&self, total: f64) -> f64 {
        if total > 0.0 {
            (self.amount / total) * 100.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
