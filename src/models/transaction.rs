use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{EntryType, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Option<i64>,
    #[serde(skip)]
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(rename = "category")]
    pub category_id: i64,
    pub date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    pub const MAX_TITLE_LEN: usize = 200;

    pub fn new(
        user_id: UserId,
        title: String,
        amount: Decimal,
        kind: EntryType,
        category_id: i64,
        date: NaiveDate,
    ) -> Self {
        let now = super::timestamp_now();
        Self {
            id: None,
            user_id,
            title,
            description: String::new(),
            amount,
            kind,
            category_id,
            date,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
