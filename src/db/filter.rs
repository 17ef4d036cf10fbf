use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rust_decimal::Decimal;

use crate::models::{EntryType, UserId};
use crate::report::{EndBound, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderField {
    Date,
    Amount,
    CreatedAt,
}

/// Sort order for transaction listings. Ties always fall back to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransactionOrder {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for TransactionOrder {
    fn default() -> Self {
        Self {
            field: OrderField::Date,
            descending: true,
        }
    }
}

impl TransactionOrder {
    /// Parses `date`, `-date`, `amount`, `-amount`, `created_at`, `-created_at`.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let (descending, name) = match s.trim().strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.trim()),
        };
        let field = match name {
            "date" => OrderField::Date,
            "amount" => OrderField::Amount,
            "created_at" => OrderField::CreatedAt,
            _ => return None,
        };
        Some(Self { field, descending })
    }

    fn sql(&self) -> String {
        let column = match self.field {
            OrderField::Date => "t.date",
            OrderField::Amount => "CAST(t.amount AS REAL)",
            OrderField::CreatedAt => "t.created_at",
        };
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{column} {direction}, t.created_at DESC, t.id DESC")
    }
}

/// Predicate over one user's transactions. Shared by listing and summing so
/// both always agree on which rows are in scope.
#[derive(Debug, Clone)]
pub(crate) struct TransactionFilter {
    pub user: UserId,
    pub kind: Option<EntryType>,
    pub category_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub date_to: Option<NaiveDate>,
    /// Exclusive upper bound.
    pub date_before: Option<NaiveDate>,
    pub search: Option<String>,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub order: TransactionOrder,
}

impl TransactionFilter {
    pub(crate) fn for_user(user: UserId) -> Self {
        Self {
            user,
            kind: None,
            category_id: None,
            date_from: None,
            date_to: None,
            date_before: None,
            search: None,
            amount_min: None,
            amount_max: None,
            order: TransactionOrder::default(),
        }
    }

    pub(crate) fn kind(mut self, kind: EntryType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub(crate) fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Restricts dates to `period`, honouring its end bound.
    pub(crate) fn within(mut self, period: &Period) -> Self {
        self.date_from = Some(period.start);
        match period.end_bound {
            EndBound::Exclusive => self.date_before = Some(period.end),
            EndBound::Inclusive => self.date_to = Some(period.end),
        }
        self
    }

    pub(super) fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut sql = String::from(" WHERE t.user_id = ?1");
        let mut param_values: Vec<Box<dyn ToSql>> = vec![Box::new(self.user.0)];

        if let Some(kind) = self.kind {
            sql.push_str(&format!(" AND t.type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }
        if let Some(cid) = self.category_id {
            sql.push_str(&format!(" AND t.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }
        if let Some(from) = self.date_from {
            sql.push_str(&format!(" AND t.date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(from));
        }
        if let Some(to) = self.date_to {
            sql.push_str(&format!(" AND t.date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(to));
        }
        if let Some(before) = self.date_before {
            sql.push_str(&format!(" AND t.date < ?{}", param_values.len() + 1));
            param_values.push(Box::new(before));
        }
        if let Some(s) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            sql.push_str(&format!(
                " AND (t.title LIKE ?{0} ESCAPE '\\' OR t.description LIKE ?{0} ESCAPE '\\')",
                param_values.len() + 1
            ));
            param_values.push(Box::new(format!("%{}%", escape_like(s.trim()))));
        }
        if let Some(min) = self.amount_min {
            sql.push_str(&format!(
                " AND CAST(t.amount AS REAL) >= CAST(?{} AS REAL)",
                param_values.len() + 1
            ));
            param_values.push(Box::new(min.to_string()));
        }
        if let Some(max) = self.amount_max {
            sql.push_str(&format!(
                " AND CAST(t.amount AS REAL) <= CAST(?{} AS REAL)",
                param_values.len() + 1
            ));
            param_values.push(Box::new(max.to_string()));
        }

        (sql, param_values)
    }

    pub(super) fn order_clause(&self) -> String {
        format!(" ORDER BY {}", self.order.sql())
    }
}

/// Makes `%`, `_` and `\` match literally under `LIKE ... ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
