use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndBound {
    Exclusive,
    Inclusive,
}

/// A date interval used to scope aggregation. The start is always inclusive;
/// the end depends on how the period was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub end_bound: EndBound,
}

impl Period {
    /// `[year-month-01, first day of the following month)`.
    /// Returns `None` for a month outside 1..=12.
    pub(crate) fn month(month: u32, year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end,
            end_bound: EndBound::Exclusive,
        })
    }

    /// `[start, end]`, both ends inclusive.
    pub(crate) fn explicit(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            end_bound: EndBound::Inclusive,
        }
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start
            && match self.end_bound {
                EndBound::Exclusive => date < self.end,
                EndBound::Inclusive => date <= self.end,
            }
    }

    /// First of `today`'s month through `today`, inclusive.
    pub(crate) fn month_to_date(today: NaiveDate) -> Self {
        Self::explicit(today.with_day(1).unwrap_or(today), today)
    }
}
