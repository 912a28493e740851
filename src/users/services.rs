use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApiError, StoreError};
use crate::users::{
    dto::{CreateUserRequest, ListQuery, UpdateUserRequest, UserListResponse, UserResponse},
    filter::parse_filter,
    password::hash_password,
    repo::UserStore,
    repo_types::{NewUser, UserPatch},
};

pub const MIN_PAGE_SIZE: usize = 10;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 64;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_nickname(nickname: &str) -> bool {
    lazy_static! {
        static ref NICKNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").unwrap();
    }
    NICKNAME_RE.is_match(nickname)
}

fn check_name(label: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(format!("{label} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!("{label} is too long")));
    }
    Ok(())
}

fn check_nickname(nickname: &str) -> Result<(), ApiError> {
    if !is_valid_nickname(nickname) {
        warn!(%nickname, "invalid nickname");
        return Err(ApiError::validation("Invalid nickname"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation("Password too short"));
    }
    Ok(())
}

/// Trims a provided field; an all-blank value becomes "not provided".
fn provided(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request-shaped entry point over a `UserStore`.
pub struct UsersService {
    store: Arc<dyn UserStore>,
    max_page_size: usize,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>, max_page_size: usize) -> Self {
        Self {
            store,
            max_page_size: max_page_size.max(MIN_PAGE_SIZE),
        }
    }

    #[instrument(skip(self, req), fields(nickname = %req.nickname))]
    pub fn create(&self, req: CreateUserRequest) -> Result<UserResponse, ApiError> {
        let nickname = req.nickname.trim().to_string();
        let email = req.email.trim().to_lowercase();
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();
        let country = req.country.trim().to_string();

        check_nickname(&nickname)?;
        check_email(&email)?;
        check_name("first_name", &first_name)?;
        check_name("last_name", &last_name)?;
        check_name("country", &country)?;
        check_password(&req.password)?;

        // Ensure nickname and email are free before paying for the hash
        if let Some(field) = self.store.exists_by_nickname_or_email(&nickname, &email) {
            warn!(%field, "already taken");
            return Err(StoreError::Conflict(field).into());
        }

        let password_hash = hash_password(&req.password)?;
        let user = self.store.create(NewUser {
            nickname,
            email,
            first_name,
            last_name,
            country,
            password_hash,
        })?;

        info!(user_id = %user.id, nickname = %user.nickname, "user created");
        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub fn get(&self, id: Uuid) -> Result<UserResponse, ApiError> {
        Ok(self.store.get(id)?.into())
    }

    #[instrument(skip(self, req))]
    pub fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<UserResponse, ApiError> {
        let nickname = provided(req.nickname);
        let email = provided(req.email).map(|e| e.to_lowercase());
        let first_name = provided(req.first_name);
        let last_name = provided(req.last_name);
        let country = provided(req.country);

        if let Some(n) = &nickname {
            check_nickname(n)?;
        }
        if let Some(e) = &email {
            check_email(e)?;
        }
        for (label, value) in [
            ("first_name", &first_name),
            ("last_name", &last_name),
            ("country", &country),
        ] {
            if let Some(v) = value {
                check_name(label, v)?;
            }
        }

        let password_hash = match req.password.filter(|p| !p.is_empty()) {
            Some(p) => {
                check_password(&p)?;
                Some(hash_password(&p)?)
            }
            None => None,
        };

        let user = self.store.update(
            id,
            UserPatch {
                nickname,
                email,
                first_name,
                last_name,
                country,
                password_hash,
            },
        )?;

        info!(user_id = %user.id, "user updated");
        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.store.delete(id)?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn list(&self, query: ListQuery) -> UserListResponse {
        let page = query.page.unwrap_or(1).max(1) as usize;
        let page_size = (query.page_size.unwrap_or(0).max(0) as usize)
            .clamp(MIN_PAGE_SIZE, self.max_page_size);
        let (field, value) = parse_filter(query.filter.as_deref().unwrap_or_default());
        let offset = page_size.saturating_mul(page - 1);

        let found = self.store.list_filtered(&field, &value, page_size, offset);

        UserListResponse {
            page,
            page_size,
            total: found.total,
            users: found.items.into_iter().map(UserResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::password::verify_password;
    use crate::users::repo_types::{Page, UniqueField, User};
    use std::sync::Mutex;
    use time::OffsetDateTime;

    /// Store double that records what the service hands it.
    #[derive(Default)]
    struct FakeStore {
        taken: Option<UniqueField>,
        created: Mutex<Vec<NewUser>>,
        patches: Mutex<Vec<(Uuid, UserPatch)>>,
        scans: Mutex<Vec<(String, String, usize, usize)>>,
    }

    fn user_from(id: Uuid, nickname: &str, email: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id,
            nickname: nickname.into(),
            email: email.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            country: "Country".into(),
            password_hash: "hash".into(),
            created_at: now,
            updated_at: now,
        }
    }

    impl UserStore for FakeStore {
        fn create(&self, candidate: NewUser) -> Result<User, StoreError> {
            let user = user_from(Uuid::new_v4(), &candidate.nickname, &candidate.email);
            self.created.lock().unwrap().push(candidate);
            Ok(user)
        }

        fn get(&self, id: Uuid) -> Result<User, StoreError> {
            Err(StoreError::NotFound(id))
        }

        fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
            self.patches.lock().unwrap().push((id, patch));
            Ok(user_from(id, "patched", "patched@example.com"))
        }

        fn delete(&self, id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::NotFound(id))
        }

        fn exists_by_nickname_or_email(&self, _: &str, _: &str) -> Option<UniqueField> {
            self.taken
        }

        fn list_filtered(&self, field: &str, value: &str, limit: usize, offset: usize) -> Page<User> {
            self.scans
                .lock()
                .unwrap()
                .push((field.into(), value.into(), limit, offset));
            Page {
                items: vec![user_from(Uuid::new_v4(), "bob", "bob@example.com")],
                total: 42,
            }
        }
    }

    fn service(store: Arc<FakeStore>) -> UsersService {
        UsersService::new(store, 100)
    }

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            nickname: "  bob_builder ".into(),
            email: "Bob@Example.COM".into(),
            first_name: "Bob".into(),
            last_name: "Builder".into(),
            country: "USA".into(),
            password: "can-we-fix-it".into(),
        }
    }

    #[test]
    fn create_normalises_and_hashes_before_storing() {
        let store = Arc::new(FakeStore::default());
        let resp = service(store.clone()).create(create_request()).unwrap();

        assert_eq!(resp.nickname, "bob_builder");
        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].email, "bob@example.com");
        assert_ne!(created[0].password_hash, "can-we-fix-it");
        assert!(verify_password("can-we-fix-it", &created[0].password_hash).unwrap());
    }

    #[test]
    fn create_stops_at_uniqueness_precheck() {
        let store = Arc::new(FakeStore {
            taken: Some(UniqueField::Email),
            ..Default::default()
        });
        let err = service(store.clone()).create(create_request()).unwrap_err();

        assert!(matches!(
            err,
            ApiError::Store(StoreError::Conflict(UniqueField::Email))
        ));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[test]
    fn create_rejects_invalid_payloads() {
        let svc = service(Arc::new(FakeStore::default()));

        let cases = [
            CreateUserRequest { nickname: "x".into(), ..create_request() },
            CreateUserRequest { email: "not-an-email".into(), ..create_request() },
            CreateUserRequest { country: "   ".into(), ..create_request() },
            CreateUserRequest { password: "short".into(), ..create_request() },
        ];
        for req in cases {
            assert!(matches!(svc.create(req), Err(ApiError::Validation(_))));
        }
    }

    #[test]
    fn update_passes_only_provided_fields() {
        let store = Arc::new(FakeStore::default());
        let id = Uuid::new_v4();
        let req = UpdateUserRequest {
            country: Some(" UK ".into()),
            first_name: Some("   ".into()),
            password: Some(String::new()),
            ..Default::default()
        };
        service(store.clone()).update(id, req).unwrap();

        let patches = store.patches.lock().unwrap();
        let (patched_id, patch) = &patches[0];
        assert_eq!(*patched_id, id);
        assert_eq!(patch.country.as_deref(), Some("UK"));
        assert!(patch.first_name.is_none());
        assert!(patch.nickname.is_none());
        assert!(patch.password_hash.is_none());
    }

    #[test]
    fn update_rehashes_new_password_and_validates_email() {
        let store = Arc::new(FakeStore::default());
        let svc = service(store.clone());

        let req = UpdateUserRequest {
            password: Some("brand-new-secret".into()),
            ..Default::default()
        };
        svc.update(Uuid::new_v4(), req).unwrap();
        let hash = store.patches.lock().unwrap()[0].1.password_hash.clone().unwrap();
        assert!(verify_password("brand-new-secret", &hash).unwrap());

        let bad = UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(Uuid::new_v4(), bad),
            Err(ApiError::Validation(_))
        ));
        assert_eq!(store.patches.lock().unwrap().len(), 1);
    }

    #[test]
    fn list_translates_page_to_offset_and_parses_filter() {
        let store = Arc::new(FakeStore::default());
        let resp = service(store.clone()).list(ListQuery {
            page: Some(3),
            page_size: Some(20),
            filter: Some("country=usa".into()),
        });

        assert_eq!(resp.page, 3);
        assert_eq!(resp.page_size, 20);
        assert_eq!(resp.total, 42);
        assert_eq!(resp.users.len(), 1);
        assert_eq!(
            store.scans.lock().unwrap()[0],
            ("country".to_string(), "usa".to_string(), 20, 40)
        );
    }

    #[test]
    fn list_clamps_page_and_page_size() {
        let store = Arc::new(FakeStore::default());
        let svc = service(store.clone());

        let resp = svc.list(ListQuery {
            page: Some(0),
            page_size: Some(3),
            filter: Some("garbage".into()),
        });
        assert_eq!((resp.page, resp.page_size), (1, MIN_PAGE_SIZE));

        let resp = svc.list(ListQuery {
            page: Some(-4),
            page_size: Some(5_000),
            filter: None,
        });
        assert_eq!((resp.page, resp.page_size), (1, 100));

        let scans = store.scans.lock().unwrap();
        assert_eq!(scans[0], (String::new(), String::new(), MIN_PAGE_SIZE, 0));
        assert_eq!(scans[1], (String::new(), String::new(), 100, 0));
    }

    #[test]
    fn not_found_from_store_is_propagated() {
        let svc = service(Arc::new(FakeStore::default()));
        let id = Uuid::new_v4();
        assert!(matches!(
            svc.get(id),
            Err(ApiError::Store(StoreError::NotFound(missing))) if missing == id
        ));
        assert!(matches!(
            svc.delete(id),
            Err(ApiError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn email_and_nickname_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(is_valid_nickname("bob.the-builder_2"));
        assert!(!is_valid_nickname("no spaces"));
        assert!(!is_valid_nickname("ab"));
    }
}
