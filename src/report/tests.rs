#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::db::Database;
use crate::models::EntryType::{Expense, Income};
use crate::test_support::*;

// ── Period ────────────────────────────────────────────────────

#[test]
fn test_month_period_december_rolls_year() {
    let p = Period::month(12, 2024).unwrap();
    assert_eq!(p.start, date(2024, 12, 1));
    assert_eq!(p.end, date(2025, 1, 1));
    assert_eq!(p.end_bound, EndBound::Exclusive);
}

#[test]
fn test_month_period_mid_year() {
    let p = Period::month(6, 2024).unwrap();
    assert_eq!(p.start, date(2024, 6, 1));
    assert_eq!(p.end, date(2024, 7, 1));
}

#[test]
fn test_month_period_rejects_invalid_month() {
    assert!(Period::month(0, 2024).is_none());
    assert!(Period::month(13, 2024).is_none());
}

#[test]
fn test_month_period_leap_february() {
    let p = Period::month(2, 2024).unwrap();
    assert_eq!(p.start, date(2024, 2, 1));
    assert_eq!(p.end, date(2024, 3, 1));
}

#[test]
fn test_explicit_period_includes_both_ends() {
    let p = Period::explicit(date(2024, 6, 1), date(2024, 6, 30));
    assert_eq!(p.end_bound, EndBound::Inclusive);
    assert_eq!((p.start, p.end), (date(2024, 6, 1), date(2024, 6, 30)));
}

#[test]
fn test_month_period_excludes_next_first() {
    let p = Period::month(12, 2024).unwrap();
    assert!(p.contains(date(2024, 12, 1)));
    assert!(p.contains(date(2024, 12, 31)));
    assert!(!p.contains(date(2025, 1, 1)));
    assert!(!p.contains(date(2024, 11, 30)));
}

#[test]
fn test_explicit_period_contains_end() {
    let p = Period::explicit(date(2024, 6, 1), date(2024, 6, 17));
    assert!(p.contains(date(2024, 6, 1)));
    assert!(p.contains(date(2024, 6, 17)));
    assert!(!p.contains(date(2024, 6, 18)));
    assert!(!p.contains(date(2024, 5, 31)));
}

#[test]
fn test_month_to_date() {
    let p = Period::month_to_date(date(2024, 6, 17));
    assert_eq!(p, Period::explicit(date(2024, 6, 1), date(2024, 6, 17)));
}

// ── Spend aggregation ─────────────────────────────────────────

#[test]
fn test_spent_is_zero_without_expenses() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let salary = add_category(&db, user, "Salary", Income);
    add_txn(&db, user, salary, Income, dec!(1000), date(2024, 6, 1));

    let june = Period::month(6, 2024).unwrap();
    assert_eq!(spent_amount(&db, user, &june, None).unwrap(), Decimal::ZERO);
    assert_eq!(spent_amount(&db, user, &june, Some(salary)).unwrap(), Decimal::ZERO);
}

#[test]
fn test_spent_respects_period_category_and_owner() {
    let db = Database::open_in_memory().unwrap();
    let alice = add_user(&db, "alice");
    let bob = add_user(&db, "bob");
    let groceries = add_category(&db, alice, "Groceries", Expense);
    let fuel = add_category(&db, alice, "Fuel", Expense);
    let bob_food = add_category(&db, bob, "Groceries", Expense);

    add_txn(&db, alice, groceries, Expense, dec!(100.25), date(2024, 6, 3));
    add_txn(&db, alice, fuel, Expense, dec!(40.00), date(2024, 6, 30));
    add_txn(&db, alice, groceries, Expense, dec!(9.99), date(2024, 7, 1));
    add_txn(&db, alice, groceries, Expense, dec!(5.00), date(2024, 5, 31));
    add_txn(&db, bob, bob_food, Expense, dec!(999), date(2024, 6, 10));

    let june = Period::month(6, 2024).unwrap();
    assert_eq!(spent_amount(&db, alice, &june, None).unwrap(), dec!(140.25));
    assert_eq!(spent_amount(&db, alice, &june, Some(groceries)).unwrap(), dec!(100.25));
    assert_eq!(spent_amount(&db, alice, &june, Some(fuel)).unwrap(), dec!(40.00));
    assert_eq!(spent_amount(&db, bob, &june, None).unwrap(), dec!(999));
}

#[test]
fn test_spend_index_matches_per_category_sums() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let groceries = add_category(&db, user, "Groceries", Expense);
    let fuel = add_category(&db, user, "Fuel", Expense);
    let unused = add_category(&db, user, "Travel", Expense);
    add_txn(&db, user, groceries, Expense, dec!(12.34), date(2024, 6, 3));
    add_txn(&db, user, groceries, Expense, dec!(0.66), date(2024, 6, 4));
    add_txn(&db, user, fuel, Expense, dec!(50), date(2024, 6, 5));

    let june = Period::month(6, 2024).unwrap();
    let index = SpendIndex::load(&db, user, &june).unwrap();
    for category in [None, Some(groceries), Some(fuel), Some(unused)] {
        assert_eq!(
            index.spent(category),
            spent_amount(&db, user, &june, category).unwrap()
        );
    }
    assert_eq!(index.total(), dec!(63.00));
}

// ── Budget evaluation ─────────────────────────────────────────

#[test]
fn test_evaluate_groceries_scenario() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let groceries = add_category(&db, user, "Groceries", Expense);
    add_txn(&db, user, groceries, Expense, dec!(120.25), date(2024, 6, 2));
    add_txn(&db, user, groceries, Expense, dec!(60.25), date(2024, 6, 20));

    let budget = add_budget(&db, user, dec!(500), Some(groceries), 6, 2024);
    let view = evaluate(&db, budget).unwrap();

    assert_eq!(view.spent_amount, dec!(180.50));
    assert_eq!(view.remaining_amount, dec!(319.50));
    assert_eq!(view.percentage_used, dec!(36.10));
    assert!(!view.over_budget);
    assert_eq!(view.category_name.as_deref(), Some("Groceries"));
    assert_eq!(view.category_label(), "Groceries");
}

#[test]
fn test_evaluate_zero_overall_budget() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let fuel = add_category(&db, user, "Fuel", Expense);
    add_txn(&db, user, fuel, Expense, dec!(25), date(2024, 6, 2));

    let budget = add_budget(&db, user, Decimal::ZERO, None, 6, 2024);
    let view = evaluate(&db, budget).unwrap();

    assert_eq!(view.percentage_used, Decimal::ZERO);
    assert!(view.over_budget);
    assert_eq!(view.spent_amount, dec!(25));
    assert_eq!(view.remaining_amount, dec!(-25));
    assert_eq!(view.category_label(), OVERALL_LABEL);
}

#[test]
fn test_evaluate_zero_budget_without_spend() {
    let budget = crate::models::Budget::new(
        crate::models::UserId(1),
        "Empty".into(),
        Decimal::ZERO,
        None,
        1,
        2024,
    );
    let view = BudgetView::from_spent(budget, None, Decimal::ZERO);
    assert_eq!(view.percentage_used, Decimal::ZERO);
    assert!(!view.over_budget);
}

#[test]
fn test_evaluate_negative_budget_does_not_fail() {
    let budget = crate::models::Budget::new(
        crate::models::UserId(1),
        "Odd".into(),
        dec!(-10),
        None,
        1,
        2024,
    );
    let view = BudgetView::from_spent(budget, None, dec!(5));
    assert_eq!(view.percentage_used, Decimal::ZERO);
    assert_eq!(view.remaining_amount, dec!(-15));
    assert!(view.over_budget);
}

#[test]
fn test_evaluate_overspent_remaining_is_negative() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let dining = add_category(&db, user, "Dining", Expense);
    add_txn(&db, user, dining, Expense, dec!(330.10), date(2024, 3, 9));

    let budget = add_budget(&db, user, dec!(300), Some(dining), 3, 2024);
    let view = evaluate(&db, budget.clone()).unwrap();
    assert_eq!(view.remaining_amount, budget.amount - view.spent_amount);
    assert_eq!(view.remaining_amount, dec!(-30.10));
    assert_eq!(view.percentage_used, dec!(110.03));
    assert!(view.over_budget);
}

#[test]
fn test_evaluate_is_idempotent_and_tracks_writes() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let groceries = add_category(&db, user, "Groceries", Expense);
    add_txn(&db, user, groceries, Expense, dec!(10), date(2024, 6, 2));
    let budget = add_budget(&db, user, dec!(100), Some(groceries), 6, 2024);

    let first = evaluate(&db, budget.clone()).unwrap();
    let second = evaluate(&db, budget.clone()).unwrap();
    assert_eq!(first, second);

    add_txn(&db, user, groceries, Expense, dec!(15), date(2024, 6, 3));
    let third = evaluate(&db, budget).unwrap();
    assert_eq!(third.spent_amount, dec!(25));
}

#[test]
fn test_evaluate_all_matches_evaluate() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let groceries = add_category(&db, user, "Groceries", Expense);
    let fuel = add_category(&db, user, "Fuel", Expense);
    add_txn(&db, user, groceries, Expense, dec!(80), date(2024, 6, 2));
    add_txn(&db, user, fuel, Expense, dec!(20), date(2024, 6, 2));
    add_txn(&db, user, fuel, Expense, dec!(35), date(2024, 7, 2));

    let budgets = vec![
        add_budget(&db, user, dec!(1000), None, 6, 2024),
        add_budget(&db, user, dec!(100), Some(groceries), 6, 2024),
        add_budget(&db, user, dec!(30), Some(fuel), 7, 2024),
    ];
    let batched = evaluate_all(&db, user, budgets.clone()).unwrap();
    let single: Vec<BudgetView> = budgets
        .into_iter()
        .map(|b| evaluate(&db, b).unwrap())
        .collect();
    assert_eq!(batched, single);
    assert_eq!(batched[0].spent_amount, dec!(100));
    assert!(batched[2].over_budget);
}

#[test]
fn test_percentage_rounding() {
    assert_eq!(percentage_of(dec!(1), dec!(3)), dec!(33.33));
    assert_eq!(percentage_of(dec!(2), dec!(3)), dec!(66.67));
    assert_eq!(percentage_of(dec!(5), Decimal::ZERO), Decimal::ZERO);
}

// ── Summary ───────────────────────────────────────────────────

#[test]
fn test_summary_totals() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let salary = add_category(&db, user, "Salary", Income);
    let rent = add_category(&db, user, "Rent", Expense);
    add_txn(&db, user, salary, Income, dec!(1000), date(2024, 6, 1));
    add_txn(&db, user, rent, Expense, dec!(400), date(2024, 6, 30));

    let period = Period::explicit(date(2024, 6, 1), date(2024, 6, 30));
    let summary = summarize(&db, user, &period).unwrap();
    assert_eq!(summary.totals.income, dec!(1000));
    assert_eq!(summary.totals.expenses, dec!(400));
    assert_eq!(summary.totals.balance, dec!(600));
    assert_eq!(summary.period.start_date, date(2024, 6, 1));
    assert_eq!(summary.period.end_date, date(2024, 6, 30));
}

#[test]
fn test_summary_empty_period_is_zero() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    add_category(&db, user, "Salary", Income);

    let period = Period::explicit(date(2024, 1, 1), date(2024, 1, 31));
    let summary = summarize(&db, user, &period).unwrap();
    assert_eq!(summary.totals.income, Decimal::ZERO);
    assert_eq!(summary.totals.expenses, Decimal::ZERO);
    assert_eq!(summary.totals.balance, Decimal::ZERO);
    assert!(summary.category_breakdown.is_empty());
}

#[test]
fn test_summary_breakdown_skips_idle_categories() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let salary = add_category(&db, user, "Salary", Income);
    let rent = add_category(&db, user, "Rent", Expense);
    let idle = add_category(&db, user, "Travel", Expense);
    add_txn(&db, user, salary, Income, dec!(1000), date(2024, 6, 1));
    add_txn(&db, user, rent, Expense, dec!(400), date(2024, 6, 15));
    add_txn(&db, user, idle, Expense, dec!(70), date(2024, 5, 31));

    let period = Period::explicit(date(2024, 6, 1), date(2024, 6, 30));
    let summary = summarize(&db, user, &period).unwrap();
    let ids: Vec<i64> = summary.category_breakdown.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![salary, rent]);
    assert_eq!(summary.category_breakdown[0].total, dec!(1000));
    assert_eq!(summary.category_breakdown[0].kind, Income);
    assert_eq!(summary.category_breakdown[1].total, dec!(400));
}

#[test]
fn test_summary_end_date_is_inclusive() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let rent = add_category(&db, user, "Rent", Expense);
    add_txn(&db, user, rent, Expense, dec!(400), date(2024, 7, 1));

    let inclusive = Period::explicit(date(2024, 6, 1), date(2024, 7, 1));
    assert_eq!(summarize(&db, user, &inclusive).unwrap().totals.expenses, dec!(400));

    let june = Period::month(6, 2024).unwrap();
    assert_eq!(spent_amount(&db, user, &june, None).unwrap(), Decimal::ZERO);
}

#[test]
fn test_summary_ignores_other_users() {
    let db = Database::open_in_memory().unwrap();
    let alice = add_user(&db, "alice");
    let bob = add_user(&db, "bob");
    let bob_salary = add_category(&db, bob, "Salary", Income);
    add_txn(&db, bob, bob_salary, Income, dec!(5000), date(2024, 6, 1));

    let period = Period::explicit(date(2024, 6, 1), date(2024, 6, 30));
    let summary = summarize(&db, alice, &period).unwrap();
    assert_eq!(summary.totals.income, Decimal::ZERO);
    assert!(summary.category_breakdown.is_empty());
}

// ── Budget analysis ───────────────────────────────────────────

#[test]
fn test_analysis_totals_and_comparison() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let groceries = add_category(&db, user, "Groceries", Expense);
    let fuel = add_category(&db, user, "Fuel", Expense);
    add_txn(&db, user, groceries, Expense, dec!(180.50), date(2024, 6, 2));
    add_txn(&db, user, fuel, Expense, dec!(60), date(2024, 6, 9));

    let overall = add_budget(&db, user, dec!(1000), None, 6, 2024);
    let food = add_budget(&db, user, dec!(500), Some(groceries), 6, 2024);
    add_budget(&db, user, dec!(999), Some(groceries), 7, 2024);

    let analysis = analyze_budgets(&db, user, 6, 2024).unwrap();
    assert_eq!(analysis.period.month, 6);
    assert_eq!(analysis.period.year, 2024);
    // Overall and category budgets are both counted.
    assert_eq!(analysis.summary.total_budgeted, dec!(1500));
    assert_eq!(analysis.summary.total_spent, dec!(240.50));
    assert_eq!(analysis.summary.total_remaining, dec!(1259.50));
    assert_eq!(analysis.summary.overall_percentage, dec!(16.03));

    assert_eq!(analysis.budget_comparison.len(), 2);
    let overall_row = &analysis.budget_comparison[0];
    assert_eq!(overall_row.budget_id, overall.id);
    assert_eq!(overall_row.category, "Overall");
    assert_eq!(overall_row.spent_amount, dec!(240.50));

    let food_row = &analysis.budget_comparison[1];
    assert_eq!(food_row.budget_id, food.id);
    assert_eq!(food_row.category, "Groceries");
    assert_eq!(food_row.budgeted_amount, dec!(500));
    assert_eq!(food_row.spent_amount, dec!(180.50));
    assert_eq!(food_row.remaining_amount, dec!(319.50));
    assert_eq!(food_row.percentage_used, dec!(36.10));
    assert!(!food_row.over_budget);
}

#[test]
fn test_analysis_without_budgets() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    let fuel = add_category(&db, user, "Fuel", Expense);
    add_txn(&db, user, fuel, Expense, dec!(60), date(2024, 6, 9));

    let analysis = analyze_budgets(&db, user, 6, 2024).unwrap();
    assert_eq!(analysis.summary.total_budgeted, Decimal::ZERO);
    assert_eq!(analysis.summary.total_spent, dec!(60));
    assert_eq!(analysis.summary.total_remaining, dec!(-60));
    assert_eq!(analysis.summary.overall_percentage, Decimal::ZERO);
    assert!(analysis.budget_comparison.is_empty());
}

#[test]
fn test_analysis_json_shape() {
    let db = Database::open_in_memory().unwrap();
    let user = add_user(&db, "alice");
    add_budget(&db, user, dec!(250), None, 12, 2024);

    let json = serde_json::to_value(analyze_budgets(&db, user, 12, 2024).unwrap()).unwrap();
    assert_eq!(json["period"]["month"], 12);
    assert_eq!(json["summary"]["total_budgeted"], 250.0);
    assert_eq!(json["budget_comparison"][0]["category"], "Overall");
    assert_eq!(json["budget_comparison"][0]["over_budget"], false);
}
