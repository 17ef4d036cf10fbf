mod filter;
mod schema;
mod seed;

use anyhow::{Context, Result};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

pub(crate) use filter::{TransactionFilter, TransactionOrder};
pub(crate) use seed::SeedOptions;

/// Optional narrowing for budget listings.
#[derive(Debug, Clone, Default)]
pub(crate) struct BudgetFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub category_id: Option<i64>,
}

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    /// Round-trips a trivial query; used by the health endpoint.
    pub(crate) fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database ping failed")?;
        Ok(())
    }

    // ── Users & tokens ────────────────────────────────────────

    pub(crate) fn insert_user(&self, user: &User) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (username, email, first_name, last_name, password_hash, is_active, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.username,
                user.email,
                user.first_name,
                user.last_name,
                user.password_hash,
                user.is_active,
                user.date_joined,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.query_user("WHERE id = ?1", &id.0)
    }

    pub(crate) fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user("WHERE username = ?1", &username)
    }

    fn query_user(&self, where_sql: &str, param: &dyn ToSql) -> Result<Option<User>> {
        let sql = format!(
            "SELECT id, username, email, first_name, last_name, password_hash, is_active, date_joined
             FROM users {where_sql}"
        );
        let result = self.conn.query_row(&sql, [param], |row| {
            Ok(User {
                id: Some(row.get(0)?),
                username: row.get(1)?,
                email: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                password_hash: row.get(5)?,
                is_active: row.get(6)?,
                date_joined: row.get(7)?,
            })
        });
        match result {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn insert_token(&self, user: UserId, key: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![key, user.0, timestamp_now()],
        )?;
        Ok(())
    }

    /// The user's existing token, if one was issued before.
    pub(crate) fn token_for_user(&self, user: UserId) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT key FROM auth_tokens WHERE user_id = ?1 ORDER BY created_at LIMIT 1",
            params![user.0],
            |row| row.get(0),
        );
        match result {
            Ok(key) => Ok(Some(key)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a token to its owner. Tokens of deactivated users resolve to nothing.
    pub(crate) fn user_for_token(&self, key: &str) -> Result<Option<UserId>> {
        let result = self.conn.query_row(
            "SELECT u.id FROM auth_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.key = ?1 AND u.is_active = 1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(UserId(id))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (user_id, name, type, color, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                cat.user_id.0,
                cat.name,
                cat.kind.as_str(),
                cat.color,
                cat.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_categories(
        &self,
        user: UserId,
        kind: Option<EntryType>,
    ) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, type, color, created_at FROM categories
             WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2)
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user.0, kind.map(|k| k.as_str())], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category(&self, user: UserId, id: i64) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, name, type, color, created_at FROM categories
             WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn category_name_taken(
        &self,
        user: UserId,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories
             WHERE user_id = ?1 AND name = ?2 AND id != IFNULL(?3, -1))",
            params![user.0, name, exclude_id],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn update_category(&self, cat: &Category) -> Result<bool> {
        let id = cat.id.context("Cannot update a category without an id")?;
        let changed = self.conn.execute(
            "UPDATE categories SET name = ?1, type = ?2, color = ?3 WHERE id = ?4 AND user_id = ?5",
            params![cat.name, cat.kind.as_str(), cat.color, id, cat.user_id.0],
        )?;
        Ok(changed > 0)
    }

    /// Deleting a category also removes its transactions and budgets.
    pub(crate) fn delete_category(&self, user: UserId, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        Ok(changed > 0)
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (user_id, title, description, amount, type, category_id, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                txn.user_id.0,
                txn.title,
                txn.description,
                txn.amount.to_string(),
                txn.kind.as_str(),
                txn.category_id,
                txn.date,
                txn.created_at,
                txn.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_transaction(&self, user: UserId, id: i64) -> Result<Option<Transaction>> {
        let result = self.conn.query_row(
            "SELECT t.id, t.user_id, t.title, t.description, t.amount, t.type, t.category_id,
                    t.date, t.created_at, t.updated_at
             FROM transactions t WHERE t.id = ?1 AND t.user_id = ?2",
            params![id, user.0],
            transaction_from_row,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn find_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let (where_sql, param_values) = filter.where_clause();
        let sql = format!(
            "SELECT t.id, t.user_id, t.title, t.description, t.amount, t.type, t.category_id,
                    t.date, t.created_at, t.updated_at
             FROM transactions t{where_sql}{}",
            filter.order_clause()
        );
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn update_transaction(&self, txn: &Transaction) -> Result<bool> {
        let id = txn.id.context("Cannot update a transaction without an id")?;
        let changed = self.conn.execute(
            "UPDATE transactions
             SET title = ?1, description = ?2, amount = ?3, type = ?4, category_id = ?5,
                 date = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9",
            params![
                txn.title,
                txn.description,
                txn.amount.to_string(),
                txn.kind.as_str(),
                txn.category_id,
                txn.date,
                txn.updated_at,
                id,
                txn.user_id.0,
            ],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn delete_transaction(&self, user: UserId, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        Ok(changed > 0)
    }

    // ── Aggregation ───────────────────────────────────────────
    //
    // Amounts are stored as decimal text; summing happens here in Decimal
    // rather than in SQLite, whose SUM would go through floating point.

    /// Sum of `amount` over every row matching `filter`; zero when none match.
    pub(crate) fn sum_transactions(&self, filter: &TransactionFilter) -> Result<Decimal> {
        let (where_sql, param_values) = filter.where_clause();
        let sql = format!("SELECT t.amount FROM transactions t{where_sql}");
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let amounts = stmt.query_map(params_ref.as_slice(), |row| decimal_at(row, 0))?;
        let mut total = Decimal::ZERO;
        for amount in amounts {
            total += amount?;
        }
        Ok(total)
    }

    /// Like [`Database::sum_transactions`], grouped by category in one query.
    /// Categories with no matching rows are absent from the map.
    pub(crate) fn sum_transactions_by_category(
        &self,
        filter: &TransactionFilter,
    ) -> Result<HashMap<i64, Decimal>> {
        let (where_sql, param_values) = filter.where_clause();
        let sql = format!("SELECT t.category_id, t.amount FROM transactions t{where_sql}");
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            Ok((row.get::<_, i64>(0)?, decimal_at(row, 1)?))
        })?;
        let mut totals: HashMap<i64, Decimal> = HashMap::new();
        for row in rows {
            let (category_id, amount) = row?;
            *totals.entry(category_id).or_insert(Decimal::ZERO) += amount;
        }
        Ok(totals)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO budgets (user_id, name, amount, category_id, month, year, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                budget.user_id.0,
                budget.name,
                budget.amount.to_string(),
                budget.category_id,
                budget.month,
                budget.year,
                budget.created_at,
                budget.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_budget(&self, user: UserId, id: i64) -> Result<Option<Budget>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, name, amount, category_id, month, year, created_at, updated_at
             FROM budgets WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
            budget_from_row,
        );
        match result {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn find_budgets(&self, user: UserId, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, amount, category_id, month, year, created_at, updated_at
             FROM budgets
             WHERE user_id = ?1
               AND (?2 IS NULL OR month = ?2)
               AND (?3 IS NULL OR year = ?3)
               AND (?4 IS NULL OR category_id = ?4)
             ORDER BY year DESC, month DESC, id",
        )?;
        let rows = stmt.query_map(
            params![user.0, filter.month, filter.year, filter.category_id],
            budget_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn budgets_for_period(&self, user: UserId, month: u32, year: i32) -> Result<Vec<Budget>> {
        self.find_budgets(
            user,
            &BudgetFilter {
                month: Some(month),
                year: Some(year),
                category_id: None,
            },
        )
    }

    /// Whether another budget already covers this (period, category) slot.
    pub(crate) fn budget_slot_taken(
        &self,
        user: UserId,
        month: u32,
        year: i32,
        category_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM budgets
             WHERE user_id = ?1 AND month = ?2 AND year = ?3
               AND IFNULL(category_id, 0) = IFNULL(?4, 0)
               AND id != IFNULL(?5, -1))",
            params![user.0, month, year, category_id, exclude_id],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn update_budget(&self, budget: &Budget) -> Result<bool> {
        let id = budget.id.context("Cannot update a budget without an id")?;
        let changed = self.conn.execute(
            "UPDATE budgets
             SET name = ?1, amount = ?2, category_id = ?3, month = ?4, year = ?5, updated_at = ?6
             WHERE id = ?7 AND user_id = ?8",
            params![
                budget.name,
                budget.amount.to_string(),
                budget.category_id,
                budget.month,
                budget.year,
                budget.updated_at,
                id,
                budget.user_id.0,
            ],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn delete_budget(&self, user: UserId, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM budgets WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        Ok(changed > 0)
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(idx, e))
}

#[derive(Debug, thiserror::Error)]
#[error("unknown entry type: {0}")]
struct UnknownEntryType(String);

fn entry_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntryType> {
    let text: String = row.get(idx)?;
    EntryType::parse(&text).ok_or_else(|| conversion_error(idx, UnknownEntryType(text)))
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        user_id: UserId(row.get(1)?),
        name: row.get(2)?,
        kind: entry_type_at(row, 3)?,
        color: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        user_id: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        amount: decimal_at(row, 4)?,
        kind: entry_type_at(row, 5)?,
        category_id: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: Some(row.get(0)?),
        user_id: UserId(row.get(1)?),
        name: row.get(2)?,
        amount: decimal_at(row, 3)?,
        category_id: row.get(4)?,
        month: row.get(5)?,
        year: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// True when `err` is a UNIQUE/CHECK/foreign-key violation raised by SQLite.
pub(crate) fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
