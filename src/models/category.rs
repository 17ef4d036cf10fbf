use serde::Serialize;

use super::{EntryType, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: Option<i64>,
    #[serde(skip)]
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub color: String,
    pub created_at: String,
}

impl Category {
    pub const DEFAULT_COLOR: &'static str = "#3B82F6";
    pub const MAX_NAME_LEN: usize = 100;

    pub fn new(user_id: UserId, name: String, kind: EntryType, color: String) -> Self {
        Self {
            id: None,
            user_id,
            name,
            kind,
            color,
            created_at: super::timestamp_now(),
        }
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }

    /// `#RRGGBB` only.
    pub fn is_valid_color(color: &str) -> bool {
        color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
