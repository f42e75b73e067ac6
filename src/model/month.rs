use crate::model::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One bucket of a `MonthlyAmounts`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthAmount {
    pub month: String,
    pub amount: Decimal,
}

/// Running sums keyed by `YYYY-MM`, in the caller's month order.
///
/// Every month of the reporting window has a bucket, including months without activity. Months
/// outside the window have no bucket and `add` refuses them.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyAmounts(Vec<MonthAmount>);

impl MonthlyAmounts {
    /// Zero-initialises a bucket for every month. A month listed twice gets one bucket, at its
    /// first position.
    pub fn zeroed<S: AsRef<str>>(months: &[S]) -> Self {
        let mut buckets: Vec<MonthAmount> = Vec::with_capacity(months.len());
        for month in months {
            let month = month.as_ref();
            if !buckets.iter().any(|b| b.month == month) {
                buckets.push(MonthAmount {
                    month: month.to_string(),
                    amount: Decimal::ZERO,
                });
            }
        }
        Self(buckets)
    }

    /// Adds `amount` to the bucket for `month`. Returns false, changing nothing, if the month is
    /// not part of the window.
    pub fn add(&mut self, month: &str, amount: Decimal) -> bool {
        match self.0.iter_mut().find(|b| b.month == month) {
            Some(bucket) => {
                bucket.amount += amount;
                true
            }
            None => false,
        }
    }

    /// The bucket value for `month`, or `None` if the month is not part of the window.
    pub fn get(&self, month: &str) -> Option<Decimal> {
        self.0.iter().find(|b| b.month == month).map(|b| b.amount)
    }

    pub fn contains(&self, month: &str) -> bool {
        self.0.iter().any(|b| b.month == month)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthAmount> {
        self.0.iter()
    }

    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|b| b.month.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sum over every bucket.
    pub fn total(&self) -> Decimal {
        self.0.iter().map(|b| b.amount).sum()
    }

    /// Combines two series month by month with `f`. Both must share this series' window; months
    /// missing from `other` are treated as zero.
    pub fn combine(&self, other: &MonthlyAmounts, f: impl Fn(Decimal, Decimal) -> Decimal) -> Self {
        Self(
            self.0
                .iter()
                .map(|b| MonthAmount {
                    month: b.month.clone(),
                    amount: f(b.amount, other.get(&b.month).unwrap_or_default()),
                })
                .collect(),
        )
    }
}

/// The sorted set of months present in a ledger, ignoring transactions without a month.
pub fn months_in(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .map(|t| t.month())
        .filter(|m| !m.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Restricts `available` to the months named in `window`, keeping the order of `available`.
pub fn window<S: AsRef<str>>(available: &[String], window: &[S]) -> Vec<String> {
    available
        .iter()
        .filter(|m| window.iter().any(|w| w.as_ref() == m.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zeroed_keeps_order_and_dedupes() {
        let m = MonthlyAmounts::zeroed(&["2025-02", "2024-12", "2025-02"]);
        let months: Vec<&str> = m.months().collect();
        assert_eq!(months, vec!["2025-02", "2024-12"]);
        assert_eq!(m.get("2024-12"), Some(Decimal::ZERO));
        assert_eq!(m.get("2025-03"), None);
    }

    #[test]
    fn test_add_only_inside_window() {
        let mut m = MonthlyAmounts::zeroed(&["2025-01", "2025-02"]);
        assert!(m.add("2025-01", dec!(10.50)));
        assert!(m.add("2025-01", dec!(-0.50)));
        assert!(!m.add("2025-03", dec!(99)));
        assert_eq!(m.get("2025-01"), Some(dec!(10.00)));
        assert_eq!(m.total(), dec!(10.00));
    }

    #[test]
    fn test_combine() {
        let mut a = MonthlyAmounts::zeroed(&["2025-01", "2025-02"]);
        let mut b = MonthlyAmounts::zeroed(&["2025-01"]);
        a.add("2025-01", dec!(100));
        a.add("2025-02", dec!(40));
        b.add("2025-01", dec!(30));
        let diff = a.combine(&b, |x, y| x - y);
        assert_eq!(diff.get("2025-01"), Some(dec!(70)));
        assert_eq!(diff.get("2025-02"), Some(dec!(40)));
    }

    #[test]
    fn test_months_in_and_window() {
        let txns = vec![
            Transaction::new("a", "4000", dec!(1), "02/01/2025"),
            Transaction::new("b", "4000", dec!(1), "12/01/2024"),
            Transaction::new("c", "4000", dec!(1), "02/11/2025"),
            Transaction::new("d", "4000", dec!(1), "bad"),
        ];
        let months = months_in(&txns);
        assert_eq!(months, vec!["2024-12", "2025-02"]);
        assert_eq!(window(&months, &["2025-02", "2025-03"]), vec!["2025-02"]);
    }
}
