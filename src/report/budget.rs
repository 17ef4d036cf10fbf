use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::{spent_amount, Period, SpendIndex, OVERALL_LABEL};
use crate::db::Database;
use crate::models::{Budget, UserId};

/// A budget together with how much of it has been used. Built on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BudgetView {
    #[serde(flatten)]
    pub budget: Budget,
    pub category_name: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub spent_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub remaining_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub percentage_used: Decimal,
    pub over_budget: bool,
}

impl BudgetView {
    pub(crate) fn from_spent(budget: Budget, category_name: Option<String>, spent: Decimal) -> Self {
        let remaining_amount = budget.amount - spent;
        let percentage_used = percentage_of(spent, budget.amount);
        let over_budget = spent > budget.amount;
        Self {
            budget,
            category_name,
            spent_amount: spent,
            remaining_amount,
            percentage_used,
            over_budget,
        }
    }

    /// Category name, or "Overall" for a budget without one.
    pub(crate) fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(OVERALL_LABEL)
    }
}

/// `part / whole * 100` rounded to two places; zero when `whole` is not positive.
pub(crate) fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

pub(super) fn budget_period(budget: &Budget) -> Result<Period> {
    Period::month(budget.month, budget.year).with_context(|| {
        format!(
            "Budget {:?} has an invalid period {}/{}",
            budget.id, budget.month, budget.year
        )
    })
}

/// Id → name for every category `user` owns.
pub(super) fn category_names(db: &Database, user: UserId) -> Result<HashMap<i64, String>> {
    Ok(db
        .get_categories(user, None)?
        .into_iter()
        .filter_map(|c| c.id.map(|id| (id, c.name)))
        .collect())
}

/// Evaluates one budget against its month's expenses.
pub(crate) fn evaluate(db: &Database, budget: Budget) -> Result<BudgetView> {
    let period = budget_period(&budget)?;
    let spent = spent_amount(db, budget.user_id, &period, budget.category_id)?;
    let category_name = match budget.category_id {
        Some(cid) => db.get_category(budget.user_id, cid)?.map(|c| c.name),
        None => None,
    };
    Ok(BudgetView::from_spent(budget, category_name, spent))
}

/// Evaluates many budgets of one user, loading each month's expenses once.
/// Output order follows input order.
pub(crate) fn evaluate_all(db: &Database, user: UserId, budgets: Vec<Budget>) -> Result<Vec<BudgetView>> {
    let names = category_names(db, user)?;
    let mut indexes: HashMap<(i32, u32), SpendIndex> = HashMap::new();
    let mut views = Vec::with_capacity(budgets.len());

    for budget in budgets {
        let key = (budget.year, budget.month);
        if !indexes.contains_key(&key) {
            let index = SpendIndex::load(db, user, &budget_period(&budget)?)?;
            indexes.insert(key, index);
        }
        let spent = indexes
            .get(&key)
            .map(|index| index.spent(budget.category_id))
            .unwrap_or(Decimal::ZERO);
        let category_name = budget.category_id.and_then(|cid| names.get(&cid).cloned());
        views.push(BudgetView::from_spent(budget, category_name, spent));
    }

    debug!(user = %user, budgets = views.len(), periods = indexes.len(), "evaluated budgets");
    Ok(views)
}
