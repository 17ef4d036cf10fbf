#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── EntryType ─────────────────────────────────────────────────

#[test]
fn test_entry_type_parse() {
    assert_eq!(EntryType::parse("income"), Some(EntryType::Income));
    assert_eq!(EntryType::parse("Expense"), Some(EntryType::Expense));
    assert_eq!(EntryType::parse(" expense "), Some(EntryType::Expense));
    assert_eq!(EntryType::parse("transfer"), None);
    assert_eq!(EntryType::parse(""), None);
}

#[test]
fn test_entry_type_display_matches_storage() {
    for kind in [EntryType::Income, EntryType::Expense] {
        assert_eq!(kind.to_string(), kind.as_str());
        assert_eq!(EntryType::parse(kind.as_str()), Some(kind));
    }
}

#[test]
fn test_entry_type_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&EntryType::Expense).unwrap(),
        "\"expense\""
    );
    let parsed: EntryType = serde_json::from_str("\"income\"").unwrap();
    assert_eq!(parsed, EntryType::Income);
}

// ── Transaction ───────────────────────────────────────────────

fn make_txn(kind: EntryType) -> Transaction {
    Transaction::new(
        UserId(1),
        "Test".into(),
        dec!(10.00),
        kind,
        1,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )
}

#[test]
fn test_transaction_json_shape() {
    let mut txn = make_txn(EntryType::Expense);
    txn.id = Some(7);
    txn.amount = dec!(180.50);
    let json = serde_json::to_value(&txn).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["type"], "expense");
    assert_eq!(json["category"], 1);
    assert_eq!(json["amount"], 180.5);
    assert_eq!(json["date"], "2024-01-15");
    assert!(json.get("user_id").is_none());
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_color_validation() {
    assert!(Category::is_valid_color("#3B82F6"));
    assert!(Category::is_valid_color("#abcdef"));
    assert!(!Category::is_valid_color("3B82F6"));
    assert!(!Category::is_valid_color("#3B82F"));
    assert!(!Category::is_valid_color("#GGGGGG"));
    assert!(!Category::is_valid_color(""));
}

#[test]
fn test_category_find_by_id() {
    let mut food = Category::new(
        UserId(1),
        "Food".into(),
        EntryType::Expense,
        Category::DEFAULT_COLOR.into(),
    );
    food.id = Some(3);
    let cats = vec![food];
    assert_eq!(Category::find_by_id(&cats, 3).unwrap().name, "Food");
    assert!(Category::find_by_id(&cats, 4).is_none());
}

#[test]
fn test_category_display() {
    let cat = Category::new(
        UserId(1),
        "Salary".into(),
        EntryType::Income,
        "#10B981".into(),
    );
    assert_eq!(cat.to_string(), "Salary (income)");
}

// ── Budget ────────────────────────────────────────────────────

#[test]
fn test_budget_month_range() {
    assert!(!Budget::is_valid_month(0));
    assert!(Budget::is_valid_month(1));
    assert!(Budget::is_valid_month(12));
    assert!(!Budget::is_valid_month(13));
}

#[test]
fn test_budget_json_uses_category_key() {
    let budget = Budget::new(UserId(1), "All".into(), dec!(3000), None, 6, 2024);
    let json = serde_json::to_value(&budget).unwrap();
    assert!(json["category"].is_null());
    assert_eq!(json["amount"], 3000.0);
    assert_eq!(json["month"], 6);
}

// ── Amount checks ─────────────────────────────────────────────

#[test]
fn test_check_amount() {
    assert!(check_amount(dec!(180.50)).is_ok());
    assert!(check_amount(dec!(0)).is_ok());
    assert!(check_amount(dec!(99999999.99)).is_ok());
    assert!(check_amount(dec!(1.234)).is_err());
    assert!(check_amount(dec!(100000000)).is_err());
}

#[test]
fn test_check_amount_ignores_trailing_zeros() {
    assert!(check_amount(dec!(12.5000)).is_ok());
    assert!(check_amount(Decimal::new(1000, 3)).is_ok());
}
