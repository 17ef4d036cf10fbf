//! Budget and spending aggregation.
//!
//! Everything here is a read-only function of the current store contents:
//! nothing is cached, so every call reflects the latest transactions.

mod budget;
mod period;
mod spend;
mod summary;

pub(crate) use budget::{evaluate, evaluate_all, percentage_of, BudgetView};
pub(crate) use period::{EndBound, Period};
pub(crate) use spend::{spent_amount, SpendIndex};
pub(crate) use summary::{analyze_budgets, summarize, BudgetAnalysis, FinancialSummary};

/// Label used for budgets without a category.
pub(crate) const OVERALL_LABEL: &str = "Overall";

#[cfg(test)]
mod tests;
