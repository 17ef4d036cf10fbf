use serde::Serialize;

/// Identity of the authenticated caller. Every query that touches owned
/// records takes one of these explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub is_active: bool,
    pub date_joined: String,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: None,
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_active: true,
            date_joined: super::timestamp_now(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.id.map(UserId)
    }
}
