//! User store trait and in-memory implementation.
//!
//! The store is the single owner of the user collection. It is handed to the
//! router by value (dependency injection) rather than living in a module-level
//! singleton, so tests can build isolated stores and production can share one
//! behind an `Arc`.
//!
//! Insertion order is authoritative: `list` returns records in the order they
//! were appended, and `replace` keeps a record at its original position.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Gender of a user record. The wire format uses the variant names verbatim;
/// anything outside this set is rejected at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// One user record, exactly as stored and as serialized over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, assigned by the store on creation and immutable.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    /// Stored as a JSON number; fractional ages are kept as sent.
    pub age: f64,
    pub birth_place: String,
    pub country: String,
    pub hobby_list: Vec<String>,
}

/// The mutable fields of a user, already validated by the handler layer.
/// The store attaches the id.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: f64,
    pub birth_place: String,
    pub country: String,
    pub hobby_list: Vec<String>,
}

impl User {
    fn from_fields(id: Uuid, fields: UserFields) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            gender: fields.gender,
            age: fields.age,
            birth_place: fields.birth_place,
            country: fields.country,
            hobby_list: fields.hobby_list,
        }
    }
}

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A writer panicked while holding the lock; the collection can no
    /// longer be trusted.
    #[error("user store lock poisoned")]
    LockPoisoned,
}

/// Trait for user store operations.
///
/// Handlers are generic over this trait so tests can substitute their own
/// store. All operations are synchronous scans over the in-memory sequence;
/// the async signatures keep the interface uniform with the handler layer.
pub trait UserStore: Clone + Send + Sync + 'static {
    /// The error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns all users in insertion order.
    fn list(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;

    /// Returns the user with the given id, or `None`. O(n) scan.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;

    /// Assigns a fresh unique id, appends the record to the end of the
    /// sequence, and returns it.
    fn append(&self, fields: UserFields)
    -> impl Future<Output = Result<User, Self::Error>> + Send;

    /// Overwrites the record with the given id in place, preserving its
    /// position and id. Returns `None` if no record matches.
    fn replace(
        &self,
        id: Uuid,
        fields: UserFields,
    ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;

    /// Removes and returns the record with the given id, or `None`.
    fn remove(&self, id: Uuid)
    -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;
}

/// Demo records the service starts with.
pub fn seed_users() -> Vec<UserFields> {
    vec![
        UserFields {
            first_name: "John".to_owned(),
            last_name: "Doe".to_owned(),
            gender: Gender::Male,
            age: 28.0,
            birth_place: "New York".to_owned(),
            country: "USA".to_owned(),
            hobby_list: vec!["Reading".to_owned(), "Hiking".to_owned()],
        },
        UserFields {
            first_name: "Jane".to_owned(),
            last_name: "Smith".to_owned(),
            gender: Gender::Female,
            age: 32.0,
            birth_place: "London".to_owned(),
            country: "UK".to_owned(),
            hobby_list: vec![
                "Painting".to_owned(),
                "Yoga".to_owned(),
                "Traveling".to_owned(),
            ],
        },
    ]
}

/// In-memory implementation of `UserStore`.
///
/// A single `RwLock` around the whole sequence gives the mutual-exclusion
/// discipline the multi-threaded runtime requires: writers are exclusive, so
/// any reader sees a record either fully old or fully new. Clones share the
/// same underlying collection.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryUserStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the seed records.
    pub fn with_seed() -> Self {
        Self::with_users(seed_users())
    }

    /// Creates a store pre-populated with the given records, in order.
    /// Ids are assigned here, as on append.
    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = UserFields>,
    {
        let users = users
            .into_iter()
            .map(|fields| User::from_fields(Uuid::new_v4(), fields))
            .collect();

        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Returns the number of users in the store.
    ///
    /// A poisoned lock still guards the last consistent sequence, so the
    /// count is reported rather than propagating the poison.
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUserStore {
    type Error = StoreError;

    async fn list(&self) -> Result<Vec<User>, Self::Error> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, Self::Error> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn append(&self, fields: UserFields) -> Result<User, Self::Error> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        let user = User::from_fields(Uuid::new_v4(), fields);
        users.push(user.clone());
        Ok(user)
    }

    async fn replace(&self, id: Uuid, fields: UserFields) -> Result<Option<User>, Self::Error> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        match users.iter_mut().find(|u| u.id == id) {
            Some(slot) => {
                *slot = User::from_fields(id, fields);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<Option<User>, Self::Error> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        match users.iter().position(|u| u.id == id) {
            Some(index) => Ok(Some(users.remove(index))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(first_name: &str) -> UserFields {
        UserFields {
            first_name: first_name.to_owned(),
            last_name: "Tester".to_owned(),
            gender: Gender::Other,
            age: 40.0,
            birth_place: "Berlin".to_owned(),
            country: "Germany".to_owned(),
            hobby_list: vec![],
        }
    }

    #[tokio::test]
    async fn test_append_assigns_unique_ids() {
        let store = MemoryUserStore::new();

        let a = store.append(fields("a")).await.expect("should append");
        let b = store.append(fields("b")).await.expect("should append");

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = MemoryUserStore::new();

        for name in ["first", "second", "third"] {
            store.append(fields(name)).await.expect("should append");
        }

        let users = store.list().await.expect("should list");
        let names: Vec<&str> = users.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = MemoryUserStore::new();

        let created = store.append(fields("alice")).await.expect("should append");

        let found = store
            .find_by_id(created.id)
            .await
            .expect("should not error");
        assert_eq!(found, Some(created));

        let absent = store
            .find_by_id(Uuid::new_v4())
            .await
            .expect("should not error");
        assert_eq!(absent, None);
    }

    #[tokio::test]
    async fn test_replace_preserves_position_and_id() {
        let store = MemoryUserStore::new();

        let first = store.append(fields("first")).await.expect("should append");
        store.append(fields("second")).await.expect("should append");

        let updated = store
            .replace(first.id, fields("renamed"))
            .await
            .expect("should not error")
            .expect("record should exist");

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.first_name, "renamed");

        let users = store.list().await.expect("should list");
        assert_eq!(users[0].first_name, "renamed");
        assert_eq!(users[1].first_name, "second");
    }

    #[tokio::test]
    async fn test_replace_missing_id_is_none() {
        let store = MemoryUserStore::new();

        let result = store
            .replace(Uuid::new_v4(), fields("ghost"))
            .await
            .expect("should not error");
        assert_eq!(result, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_returns_the_record() {
        let store = MemoryUserStore::new();

        let created = store.append(fields("alice")).await.expect("should append");

        let removed = store.remove(created.id).await.expect("should not error");
        assert_eq!(removed, Some(created.clone()));
        assert!(store.is_empty());

        // A second remove finds nothing.
        let again = store.remove(created.id).await.expect("should not error");
        assert_eq!(again, None);
    }

    #[tokio::test]
    async fn test_with_seed_populates_demo_records() {
        let store = MemoryUserStore::with_seed();

        let users = store.list().await.expect("should list");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].first_name, "John");
        assert_eq!(users[0].gender, Gender::Male);
        assert_eq!(users[1].first_name, "Jane");
        assert_eq!(users[1].hobby_list.len(), 3);
        assert_ne!(users[0].id, users[1].id);
    }

    #[tokio::test]
    async fn test_len_survives_a_poisoned_lock() {
        let store = MemoryUserStore::with_seed();

        // Panic while holding the write guard to poison the lock.
        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.users.write().expect("lock should be clean");
            panic!("poison the lock");
        })
        .join();

        assert_eq!(store.len(), 2);
        assert!(matches!(store.list().await, Err(StoreError::LockPoisoned)));
    }

    #[tokio::test]
    async fn test_store_is_clone_and_shares_data() {
        let store1 = MemoryUserStore::new();
        store1.append(fields("alice")).await.expect("should append");

        let store2 = store1.clone();
        assert_eq!(store2.len(), 1);

        store2.append(fields("bob")).await.expect("should append");
        assert_eq!(store1.len(), 2);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::from_fields(Uuid::nil(), fields("alice"));
        let value = serde_json::to_value(&user).expect("should serialize");

        assert!(value.get("firstName").is_some());
        assert!(value.get("birthPlace").is_some());
        assert!(value.get("hobbyList").is_some());
        assert_eq!(value["gender"], "Other");
    }
}
