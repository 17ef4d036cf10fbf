mod budget;
mod category;
mod entry_type;
mod transaction;
mod user;

pub use budget::Budget;
pub use category::Category;
pub use entry_type::EntryType;
pub use transaction::Transaction;
pub use user::{User, UserId};

use rust_decimal::Decimal;

/// Largest magnitude accepted for stored money fields (10 digits, 2 of them decimal).
const MAX_AMOUNT_INTEGER_PART: i64 = 100_000_000;

/// Checks a money amount against the stored column shape.
pub fn check_amount(amount: Decimal) -> Result<(), String> {
    if amount.normalize().scale() > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".into());
    }
    if amount.abs() >= Decimal::new(MAX_AMOUNT_INTEGER_PART, 0) {
        return Err("Ensure that there are no more than 10 digits in total.".into());
    }
    Ok(())
}

/// Current time in the format every `created_at`/`updated_at` column uses.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests;
