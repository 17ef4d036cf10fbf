use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::budget::category_names;
use super::{percentage_of, BudgetView, Period, SpendIndex};
use crate::db::{Database, TransactionFilter};
use crate::models::{EntryType, UserId};

// ── Financial summary ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FinancialSummary {
    pub period: SummaryPeriod,
    pub totals: SummaryTotals,
    pub category_breakdown: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SummaryPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SummaryTotals {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub income: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub expenses: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CategoryTotal {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub color: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

/// Income, expenses and per-category activity for `user` within `period`.
///
/// The breakdown sums every transaction type per category and leaves out
/// categories whose total is not positive.
pub(crate) fn summarize(db: &Database, user: UserId, period: &Period) -> Result<FinancialSummary> {
    let in_period = TransactionFilter::for_user(user).within(period);

    let income = db.sum_transactions(&in_period.clone().kind(EntryType::Income))?;
    let expenses = db.sum_transactions(&in_period.clone().kind(EntryType::Expense))?;
    let by_category = db.sum_transactions_by_category(&in_period)?;

    let category_breakdown: Vec<CategoryTotal> = db
        .get_categories(user, None)?
        .into_iter()
        .filter_map(|category| {
            let id = category.id?;
            let total = by_category.get(&id).copied().unwrap_or(Decimal::ZERO);
            (total > Decimal::ZERO).then(|| CategoryTotal {
                id,
                name: category.name,
                kind: category.kind,
                color: category.color,
                total,
            })
        })
        .collect();

    debug!(
        user = %user,
        start = %period.start,
        end = %period.end,
        categories = category_breakdown.len(),
        "summarized period"
    );

    Ok(FinancialSummary {
        period: SummaryPeriod {
            start_date: period.start,
            end_date: period.end,
        },
        totals: SummaryTotals {
            income,
            expenses,
            balance: income - expenses,
        },
        category_breakdown,
    })
}

// ── Budget analysis ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BudgetAnalysis {
    pub period: AnalysisPeriod,
    pub summary: AnalysisSummary,
    pub budget_comparison: Vec<BudgetComparison>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct AnalysisPeriod {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AnalysisSummary {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_budgeted: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_spent: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_remaining: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub overall_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BudgetComparison {
    pub budget_id: Option<i64>,
    pub budget_name: String,
    pub category: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub budgeted_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub spent_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub remaining_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub percentage_used: Decimal,
    pub over_budget: bool,
}

impl From<BudgetView> for BudgetComparison {
    fn from(view: BudgetView) -> Self {
        let category = view.category_label().to_string();
        Self {
            budget_id: view.budget.id,
            budget_name: view.budget.name,
            category,
            budgeted_amount: view.budget.amount,
            spent_amount: view.spent_amount,
            remaining_amount: view.remaining_amount,
            percentage_used: view.percentage_used,
            over_budget: view.over_budget,
        }
    }
}

/// Compares every budget `user` has for `month`/`year` with actual spend.
///
/// `total_budgeted` adds up all budgets of the period, the overall budget
/// included, so an overall budget alongside category budgets is counted on
/// top of them. `total_spent` is every expense of the month.
pub(crate) fn analyze_budgets(
    db: &Database,
    user: UserId,
    month: u32,
    year: i32,
) -> Result<BudgetAnalysis> {
    let period = Period::month(month, year)
        .with_context(|| format!("Invalid budget period {month}/{year}"))?;
    let budgets = db.budgets_for_period(user, month, year)?;
    let spend = SpendIndex::load(db, user, &period)?;
    let names = category_names(db, user)?;

    let total_budgeted: Decimal = budgets.iter().map(|b| b.amount).sum();
    let total_spent = spend.total();

    let budget_comparison: Vec<BudgetComparison> = budgets
        .into_iter()
        .map(|budget| {
            let spent = spend.spent(budget.category_id);
            let name = budget.category_id.and_then(|cid| names.get(&cid).cloned());
            BudgetComparison::from(BudgetView::from_spent(budget, name, spent))
        })
        .collect();

    debug!(
        user = %user,
        month,
        year,
        budgets = budget_comparison.len(),
        "analyzed budgets"
    );

    Ok(BudgetAnalysis {
        period: AnalysisPeriod { month, year },
        summary: AnalysisSummary {
            total_budgeted,
            total_spent,
            total_remaining: total_budgeted - total_spent,
            overall_percentage: percentage_of(total_spent, total_budgeted),
        },
        budget_comparison,
    })
}
