use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::Database;
use crate::credentials;
use crate::models::{timestamp_now, EntryType};
use crate::report::Period;

/// (username, email, password, first name, last name)
const DEMO_USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("testuser", "testuser@example.com", "testpass123", "Test", "User"),
    ("johndoe", "john.doe@example.com", "password123", "John", "Doe"),
    ("janedoe", "jane.doe@example.com", "password123", "Jane", "Doe"),
    ("demouser", "demo@example.com", "demo123", "Demo", "User"),
];

const INCOME_CATEGORIES: &[(&str, &str)] = &[
    ("Salary", "#10B981"),
    ("Freelance", "#059669"),
    ("Investment Returns", "#047857"),
    ("Side Business", "#065F46"),
    ("Bonus", "#064E3B"),
    ("Gift Money", "#022C22"),
];

const EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Groceries", "#EF4444"),
    ("Transportation", "#DC2626"),
    ("Entertainment", "#B91C1C"),
    ("Utilities", "#991B1B"),
    ("Healthcare", "#7F1D1D"),
    ("Rent/Mortgage", "#450A0A"),
    ("Dining Out", "#F97316"),
    ("Shopping", "#EA580C"),
    ("Education", "#3B82F6"),
    ("Insurance", "#2563EB"),
    ("Subscriptions", "#8B5CF6"),
    ("Travel", "#7C3AED"),
    ("Personal Care", "#EC4899"),
    ("Home Maintenance", "#F59E0B"),
    ("Miscellaneous", "#6B7280"),
];

struct TxnTemplate {
    title: &'static str,
    range: (i64, i64),
    descriptions: &'static [&'static str],
}

const INCOME_TEMPLATES: &[TxnTemplate] = &[
    TxnTemplate { title: "Monthly Salary", range: (3000, 5000), descriptions: &["Regular monthly salary payment", "Salary deposit"] },
    TxnTemplate { title: "Freelance Project", range: (500, 2000), descriptions: &["Web development project", "Design work", "Consulting fee"] },
    TxnTemplate { title: "Investment Dividend", range: (100, 800), descriptions: &["Stock dividend payment", "Mutual fund returns"] },
    TxnTemplate { title: "Side Business Income", range: (200, 1500), descriptions: &["Online store sales", "Service income"] },
    TxnTemplate { title: "Bonus Payment", range: (500, 3000), descriptions: &["Performance bonus", "Year-end bonus"] },
    TxnTemplate { title: "Gift Money", range: (50, 500), descriptions: &["Birthday gift", "Holiday money"] },
];

/// Expense templates keyed by the category they belong to; `None` entries
/// are drawn at random for categories without a dedicated template.
const EXPENSE_TEMPLATES: &[(Option<&str>, TxnTemplate)] = &[
    (Some("Groceries"), TxnTemplate { title: "Grocery Shopping", range: (50, 200), descriptions: &["Weekly groceries", "Supermarket shopping"] }),
    (Some("Transportation"), TxnTemplate { title: "Gas Station", range: (30, 80), descriptions: &["Fuel for car", "Public transport"] }),
    (Some("Entertainment"), TxnTemplate { title: "Movie Night", range: (15, 50), descriptions: &["Cinema tickets", "Concert tickets"] }),
    (Some("Utilities"), TxnTemplate { title: "Electric Bill", range: (80, 150), descriptions: &["Monthly electricity bill", "Water bill"] }),
    (Some("Healthcare"), TxnTemplate { title: "Doctor Visit", range: (100, 300), descriptions: &["Medical consultation", "Pharmacy"] }),
    (Some("Rent/Mortgage"), TxnTemplate { title: "Rent Payment", range: (800, 2000), descriptions: &["Monthly rent", "Mortgage payment"] }),
    (Some("Dining Out"), TxnTemplate { title: "Restaurant Dinner", range: (25, 100), descriptions: &["Dinner out", "Lunch meeting"] }),
    (Some("Shopping"), TxnTemplate { title: "Online Shopping", range: (20, 200), descriptions: &["Amazon purchase", "Clothing shopping"] }),
    (None, TxnTemplate { title: "Course Fee", range: (100, 500), descriptions: &["Online course", "Training program", "Educational material"] }),
    (None, TxnTemplate { title: "Car Insurance", range: (100, 300), descriptions: &["Monthly insurance premium", "Auto insurance"] }),
    (None, TxnTemplate { title: "Netflix Subscription", range: (10, 20), descriptions: &["Streaming service", "Monthly subscription"] }),
    (None, TxnTemplate { title: "Weekend Trip", range: (200, 800), descriptions: &["Travel expenses", "Hotel booking", "Vacation cost"] }),
    (None, TxnTemplate { title: "Haircut", range: (20, 60), descriptions: &["Salon visit", "Hair styling"] }),
    (None, TxnTemplate { title: "Home Repair", range: (50, 500), descriptions: &["Plumbing fix", "Maintenance work", "Home improvement"] }),
    (None, TxnTemplate { title: "Coffee Shop", range: (5, 15), descriptions: &["Morning coffee", "Cafe visit"] }),
];

/// (category, budget name, whole-unit amount range)
const BUDGET_TEMPLATES: &[(&str, &str, (i64, i64))] = &[
    ("Groceries", "Groceries Budget", (400, 600)),
    ("Transportation", "Transportation Budget", (200, 400)),
    ("Entertainment", "Entertainment Budget", (150, 300)),
    ("Utilities", "Utilities Budget", (200, 350)),
    ("Healthcare", "Healthcare Budget", (300, 500)),
    ("Dining Out", "Dining Out Budget", (200, 400)),
    ("Shopping", "Shopping Budget", (300, 600)),
    ("Personal Care", "Personal Care Budget", (100, 200)),
    ("Subscriptions", "Subscriptions Budget", (50, 150)),
    ("Travel", "Travel Budget", (500, 1000)),
];

const HISTORY_DAYS: i64 = 180;
const INCOME_SHARE: f64 = 0.2;

#[derive(Debug, Clone)]
pub(crate) struct SeedOptions {
    pub user: String,
    pub clear: bool,
    pub count: usize,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SeedReport {
    pub users_created: usize,
    pub categories_created: usize,
    pub transactions_created: usize,
    /// Generated transactions dated in the month of `today`.
    pub transactions_this_month: usize,
    pub budgets_created: usize,
}

impl Database {
    /// Populates demo users and sample data for `opts.user`.
    /// Everything is written in one transaction: on error nothing is kept.
    pub(crate) fn seed_demo(&mut self, opts: &SeedOptions) -> Result<SeedReport> {
        let mut rng = rand::thread_rng();
        let mut report = SeedReport::default();
        let now = timestamp_now();

        let tx = self.conn.transaction()?;

        for &(username, email, password, first, last) in DEMO_USERS {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![username],
                |row| row.get(0),
            )?;
            if exists {
                continue;
            }
            let created = tx.execute(
                "INSERT INTO users (username, email, first_name, last_name, password_hash, is_active, date_joined)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![
                    username,
                    email,
                    first,
                    last,
                    credentials::hash_password(password)?,
                    now
                ],
            )?;
            report.users_created += created;
        }

        let user_id: i64 = tx
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![opts.user],
                |row| row.get(0),
            )
            .optional()?
            .with_context(|| format!("User \"{}\" does not exist", opts.user))?;

        if opts.clear {
            debug!(user = %opts.user, "clearing existing data before seeding");
            tx.execute("DELETE FROM budgets WHERE user_id = ?1", params![user_id])?;
            tx.execute("DELETE FROM transactions WHERE user_id = ?1", params![user_id])?;
            tx.execute("DELETE FROM categories WHERE user_id = ?1", params![user_id])?;
        }

        let seeded = INCOME_CATEGORIES
            .iter()
            .map(|c| (c, EntryType::Income))
            .chain(EXPENSE_CATEGORIES.iter().map(|c| (c, EntryType::Expense)));
        for (&(name, color), kind) in seeded {
            report.categories_created += tx.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, type, color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, name, kind.as_str(), color, now],
            )?;
        }

        let mut income: Vec<(i64, String)> = Vec::new();
        let mut expense: Vec<(i64, String)> = Vec::new();
        {
            let mut stmt =
                tx.prepare("SELECT id, name, type FROM categories WHERE user_id = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?;
            for row in rows {
                let (id, name, kind) = row?;
                match EntryType::parse(&kind) {
                    Some(EntryType::Income) => income.push((id, name)),
                    Some(EntryType::Expense) => expense.push((id, name)),
                    None => {}
                }
            }
        }
        if expense.is_empty() {
            anyhow::bail!("No expense categories found for \"{}\"", opts.user);
        }

        let this_month = Period::month(opts.today.month(), opts.today.year())
            .context("today has no calendar month")?;
        let start = opts.today - Duration::days(HISTORY_DAYS);
        for _ in 0..opts.count {
            let date = start + Duration::days(rng.gen_range(0..=HISTORY_DAYS));
            let is_income = rng.gen_bool(INCOME_SHARE) && !income.is_empty();

            let (kind, (category_id, _), template) = if is_income {
                let category = income.choose(&mut rng).context("no income category")?;
                let template = INCOME_TEMPLATES.choose(&mut rng).context("no income template")?;
                (EntryType::Income, category, template)
            } else {
                let category = expense.choose(&mut rng).context("no expense category")?;
                (EntryType::Expense, category, expense_template(&category.1, &mut rng)?)
            };

            let (low, high) = template.range;
            let amount = Decimal::new(rng.gen_range(low * 100..=high * 100), 2);
            let description = template.descriptions.choose(&mut rng).copied().unwrap_or("");

            tx.execute(
                "INSERT INTO transactions (user_id, title, description, amount, type, category_id, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    user_id,
                    template.title,
                    description,
                    amount.to_string(),
                    kind.as_str(),
                    category_id,
                    date,
                    now
                ],
            )?;
            report.transactions_created += 1;
            if this_month.contains(date) {
                report.transactions_this_month += 1;
            }
        }

        for (month, year) in [
            (opts.today.month(), opts.today.year()),
            next_month(opts.today.month(), opts.today.year()),
        ] {
            let overall = Decimal::new(rng.gen_range(3000..=5000), 0);
            report.budgets_created += tx.execute(
                "INSERT OR IGNORE INTO budgets (user_id, name, amount, category_id, month, year, created_at, updated_at)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?6)",
                params![
                    user_id,
                    format!("Overall Budget - {month}/{year}"),
                    overall.to_string(),
                    month,
                    year,
                    now
                ],
            )?;

            let mut candidates = expense.clone();
            candidates.shuffle(&mut rng);
            let upper = candidates.len().min(8);
            let picked = rng.gen_range(upper.min(5)..=upper);

            for (category_id, name) in candidates.iter().take(picked) {
                let (budget_name, (low, high)) = BUDGET_TEMPLATES
                    .iter()
                    .find(|(category, _, _)| *category == name.as_str())
                    .map(|&(_, budget_name, range)| (budget_name.to_string(), range))
                    .unwrap_or_else(|| (format!("{name} Budget"), (100, 500)));
                let amount = Decimal::new(rng.gen_range(low..=high), 0);
                report.budgets_created += tx.execute(
                    "INSERT OR IGNORE INTO budgets (user_id, name, amount, category_id, month, year, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                    params![
                        user_id,
                        budget_name,
                        amount.to_string(),
                        category_id,
                        month,
                        year,
                        now
                    ],
                )?;
            }
        }

        tx.commit().context("Failed to commit seed data")?;
        info!(
            user = %opts.user,
            users = report.users_created,
            categories = report.categories_created,
            transactions = report.transactions_created,
            this_month = report.transactions_this_month,
            budgets = report.budgets_created,
            "seeding complete"
        );
        Ok(report)
    }
}

fn expense_template(category: &str, rng: &mut impl Rng) -> Result<&'static TxnTemplate> {
    if let Some((_, template)) = EXPENSE_TEMPLATES
        .iter()
        .find(|(owner, _)| *owner == Some(category))
    {
        return Ok(template);
    }
    EXPENSE_TEMPLATES
        .choose(rng)
        .map(|(_, template)| template)
        .context("no expense template")
}

fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month == 12 {
        (1, year + 1)
    } else {
        (month + 1, year)
    }
}

