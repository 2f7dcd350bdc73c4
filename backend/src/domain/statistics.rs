//! Per-month activity counts for yearly dashboards.

use serde::{Deserialize, Serialize};

/// Number of entities created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Calendar month, 1 to 12.
    pub month: u32,
    pub total: u64,
}

/// Expand a sparse month list to all twelve months, in order, with missing
/// months reported as zero.
///
/// # Examples
/// ```
/// use crop_connect::domain::{MonthlyCount, fill_missing_months};
///
/// let filled = fill_missing_months(vec![MonthlyCount { month: 3, total: 4 }]);
/// assert_eq!(filled.len(), 12);
/// assert_eq!(filled[2].total, 4);
/// assert_eq!(filled[0].total, 0);
/// ```
pub fn fill_missing_months(sparse: Vec<MonthlyCount>) -> Vec<MonthlyCount> {
    (1..=12)
        .map(|month| {
            let total = sparse
                .iter()
                .filter(|entry| entry.month == month)
                .map(|entry| entry.total)
                .sum();
            MonthlyCount { month, total }
        })
        .collect()
}
