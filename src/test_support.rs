//! Fixture builders shared by the unit tests.
#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use std::sync::OnceLock;
use rust_decimal::Decimal;

use crate::db::Database;
use crate::models::*;

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Hash of `testpass123`, computed once per test binary.
pub(crate) fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| crate::credentials::hash_password("testpass123").unwrap())
        .clone()
}

pub(crate) fn add_user(db: &Database, username: &str) -> UserId {
    let user = User::new(
        username.into(),
        format!("{username}@example.com"),
        test_password_hash(),
    );
    UserId(db.insert_user(&user).unwrap())
}

pub(crate) fn add_category(db: &Database, user: UserId, name: &str, kind: EntryType) -> i64 {
    let cat = Category::new(user, name.into(), kind, Category::DEFAULT_COLOR.into());
    db.insert_category(&cat).unwrap()
}

pub(crate) fn add_txn(
    db: &Database,
    user: UserId,
    category_id: i64,
    kind: EntryType,
    amount: Decimal,
    on: NaiveDate,
) -> i64 {
    let txn = Transaction::new(user, format!("{kind} on {on}"), amount, kind, category_id, on);
    db.insert_transaction(&txn).unwrap()
}

pub(crate) fn add_budget(
    db: &Database,
    user: UserId,
    amount: Decimal,
    category_id: Option<i64>,
    month: u32,
    year: i32,
) -> Budget {
    let mut budget = Budget::new(user, "Budget".into(), amount, category_id, month, year);
    budget.id = Some(db.insert_budget(&budget).unwrap());
    budget
}
