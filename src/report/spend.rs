use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::Period;
use crate::db::{Database, TransactionFilter};
use crate::models::{EntryType, UserId};

/// Total expense amount for `user` within `period`, optionally limited to one
/// category. Zero when nothing matches.
pub(crate) fn spent_amount(
    db: &Database,
    user: UserId,
    period: &Period,
    category_id: Option<i64>,
) -> Result<Decimal> {
    let mut filter = TransactionFilter::for_user(user)
        .kind(EntryType::Expense)
        .within(period);
    if let Some(cid) = category_id {
        filter = filter.category(cid);
    }
    db.sum_transactions(&filter)
}

/// Expense totals for one user and period, loaded with a single grouped
/// query. Answers the same question as [`spent_amount`] for any number of
/// budgets without going back to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SpendIndex {
    total: Decimal,
    by_category: HashMap<i64, Decimal>,
}

impl SpendIndex {
    pub(crate) fn load(db: &Database, user: UserId, period: &Period) -> Result<Self> {
        let filter = TransactionFilter::for_user(user)
            .kind(EntryType::Expense)
            .within(period);
        let by_category = db.sum_transactions_by_category(&filter)?;
        let total = by_category.values().copied().sum();
        Ok(Self { total, by_category })
    }

    /// Spend for one category, or for everything when `category_id` is `None`.
    pub(crate) fn spent(&self, category_id: Option<i64>) -> Decimal {
        match category_id {
            Some(cid) => self.by_category.get(&cid).copied().unwrap_or(Decimal::ZERO),
            None => self.total,
        }
    }

    pub(crate) fn total(&self) -> Decimal {
        self.total
    }
}
