use rust_decimal::Decimal;
use serde::Serialize;

use super::UserId;

/// A spending cap for one calendar month. `category_id == None` is the
/// overall budget covering every expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: Option<i64>,
    #[serde(skip)]
    pub user_id: UserId,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(rename = "category")]
    pub category_id: Option<i64>,
    pub month: u32,
    pub year: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Budget {
    pub const MAX_NAME_LEN: usize = 200;

    pub fn new(
        user_id: UserId,
        name: String,
        amount: Decimal,
        category_id: Option<i64>,
        month: u32,
        year: i32,
    ) -> Self {
        let now = super::timestamp_now();
        Self {
            id: None,
            user_id,
            name,
            amount,
            category_id,
            month,
            year,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_valid_month(month: u32) -> bool {
        (1..=12).contains(&month)
    }
}
