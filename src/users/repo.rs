use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::users::filter::UserFilter;
use crate::users::repo_types::{NewUser, Page, UniqueField, User, UserPatch};

/// Storage contract the service layer is written against.
pub trait UserStore: Send + Sync {
    fn create(&self, candidate: NewUser) -> Result<User, StoreError>;
    fn get(&self, id: Uuid) -> Result<User, StoreError>;
    fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;
    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    /// Which unique field, if any, is already held by a live record.
    fn exists_by_nickname_or_email(&self, nickname: &str, email: &str) -> Option<UniqueField>;
    fn list_filtered(&self, field: &str, value: &str, limit: usize, offset: usize) -> Page<User>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Source of record ids. Implementations must never repeat an id.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Primary collection plus its three indexes. Only ever touched under one lock.
#[derive(Default)]
struct Tables {
    users: Vec<User>,                    // insertion order
    by_id: HashMap<Uuid, usize>,         // id -> position in `users`
    by_nickname: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
}

impl Tables {
    fn taken(&self, nickname: &str, email: &str) -> Option<UniqueField> {
        if self.by_nickname.contains_key(nickname) {
            return Some(UniqueField::Nickname);
        }
        if self.by_email.contains_key(email) {
            return Some(UniqueField::Email);
        }
        None
    }

    fn held_by_other(index: &HashMap<String, Uuid>, key: &str, id: Uuid) -> bool {
        index.get(key).is_some_and(|owner| *owner != id)
    }
}

/// In-memory user store with unique nickname and email indexes.
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(SystemClock), Arc::new(RandomIds))
    }

    pub fn with_collaborators(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
            ids,
        }
    }

    // A panic while holding the lock cannot leave `Tables` half-written: every
    // mutation validates first and only then touches the maps.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, candidate: NewUser) -> Result<User, StoreError> {
        let mut t = self.write();

        if let Some(field) = t.taken(&candidate.nickname, &candidate.email) {
            debug!(%field, "create rejected: duplicate");
            return Err(StoreError::Conflict(field));
        }

        let mut id = self.ids.next_id();
        while t.by_id.contains_key(&id) {
            warn!(user_id = %id, "id generator repeated a live id; drawing again");
            id = self.ids.next_id();
        }
        let now = self.clock.now();
        let user = User {
            id,
            nickname: candidate.nickname,
            email: candidate.email,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            country: candidate.country,
            password_hash: candidate.password_hash,
            created_at: now,
            updated_at: now,
        };

        let pos = t.users.len();
        t.by_id.insert(id, pos);
        t.by_nickname.insert(user.nickname.clone(), id);
        t.by_email.insert(user.email.clone(), id);
        t.users.push(user.clone());

        debug!(user_id = %id, "user stored");
        Ok(user)
    }

    fn get(&self, id: Uuid) -> Result<User, StoreError> {
        let t = self.read();
        t.by_id
            .get(&id)
            .map(|&pos| t.users[pos].clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut t = self.write();

        let pos = *t.by_id.get(&id).ok_or(StoreError::NotFound(id))?;
        let current = &t.users[pos];
        let mut merged = patch.merged_into(current);

        let nickname_changed = merged.nickname != current.nickname;
        let email_changed = merged.email != current.email;
        if nickname_changed && Tables::held_by_other(&t.by_nickname, &merged.nickname, id) {
            return Err(StoreError::Conflict(UniqueField::Nickname));
        }
        if email_changed && Tables::held_by_other(&t.by_email, &merged.email, id) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }

        merged.updated_at = self.clock.now();
        let old_nickname = current.nickname.clone();
        let old_email = current.email.clone();

        if nickname_changed {
            t.by_nickname.remove(&old_nickname);
            t.by_nickname.insert(merged.nickname.clone(), id);
        }
        if email_changed {
            t.by_email.remove(&old_email);
            t.by_email.insert(merged.email.clone(), id);
        }
        t.users[pos] = merged.clone();

        debug!(user_id = %id, nickname_changed, email_changed, "user updated");
        Ok(merged)
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut t = self.write();

        let pos = t.by_id.remove(&id).ok_or(StoreError::NotFound(id))?;
        let user = t.users.remove(pos);
        t.by_nickname.remove(&user.nickname);
        t.by_email.remove(&user.email);

        // Records after the removed one shift down by one.
        let Tables { users, by_id, .. } = &mut *t;
        for shifted in &users[pos..] {
            if let Some(p) = by_id.get_mut(&shifted.id) {
                *p -= 1;
            }
        }

        debug!(user_id = %id, "user deleted");
        Ok(())
    }

    fn exists_by_nickname_or_email(&self, nickname: &str, email: &str) -> Option<UniqueField> {
        self.read().taken(nickname, email)
    }

    fn list_filtered(&self, field: &str, value: &str, limit: usize, offset: usize) -> Page<User> {
        let filter = UserFilter::new(field, value);
        let t = self.read();

        let matched: Vec<&User> = t.users.iter().filter(|u| filter.matches(u)).collect();
        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Page { items, total }
    }
}

#[cfg(test)]
impl InMemoryUserStore {
    fn len(&self) -> usize {
        self.read().users.len()
    }

    /// Sizes of (collection, id index, nickname index, email index).
    fn sizes(&self) -> (usize, usize, usize, usize) {
        let t = self.read();
        (
            t.users.len(),
            t.by_id.len(),
            t.by_nickname.len(),
            t.by_email.len(),
        )
    }

    fn assert_consistent(&self) {
        let t = self.read();
        assert_eq!(t.users.len(), t.by_id.len());
        assert_eq!(t.users.len(), t.by_nickname.len());
        assert_eq!(t.users.len(), t.by_email.len());
        for (pos, user) in t.users.iter().enumerate() {
            assert_eq!(t.by_id.get(&user.id), Some(&pos));
            assert_eq!(t.by_nickname.get(&user.nickname), Some(&user.id));
            assert_eq!(t.by_email.get(&user.email), Some(&user.id));
        }
    }
}
