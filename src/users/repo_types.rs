use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,                   // assigned by the store
    pub nickname: String,           // unique
    pub email: String,              // unique
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Candidate record handed to `UserStore::create`; id and timestamps are filled by the store.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub password_hash: String,
}

/// Partial update. `None` and empty strings leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    /// Returns `user` with every non-empty patch field applied.
    pub fn merged_into(&self, user: &User) -> User {
        fn pick(patch: &Option<String>, current: &str) -> String {
            match patch.as_deref() {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => current.to_string(),
            }
        }

        User {
            nickname: pick(&self.nickname, &user.nickname),
            email: pick(&self.email, &user.email),
            first_name: pick(&self.first_name, &user.first_name),
            last_name: pick(&self.last_name, &user.last_name),
            country: pick(&self.country, &user.country),
            password_hash: pick(&self.password_hash, &user.password_hash),
            ..user.clone()
        }
    }
}

/// One page of a filtered scan plus the number of matches before slicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Unique field named by a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Nickname,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Nickname => f.write_str("nickname"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}
