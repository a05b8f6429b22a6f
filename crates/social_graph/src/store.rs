//! In-memory entity store.
//!
//! The store is built in two phases: all records are registered first, then
//! friendships are wired by id. [`UserStoreBuilder::build`] validates the
//! whole batch at once, so declaration order never matters. After that the
//! store is immutable and can be shared behind an `Arc` without locking.

use crate::error::{ResolveError, ResolveResult, StoreError};
use crate::model::{User, UserId};
use rustc_hash::FxHashMap;

/// Read-only registry of users, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    users: Vec<User>,
    index: FxHashMap<UserId, usize>,
}

impl UserStore {
    pub fn builder() -> UserStoreBuilder {
        UserStoreBuilder::default()
    }

    /// Gets a user by id.
    pub fn get(&self, id: &str) -> Option<&User> {
        self.index.get(id).map(|&i| &self.users[i])
    }

    /// Gets a user by id, failing with `UserNotFound` on a miss.
    pub fn lookup(&self, id: &str) -> ResolveResult<&User> {
        self.get(id).ok_or_else(|| ResolveError::UserNotFound { id: id.to_string() })
    }

    /// Iterates users in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Resolves a user's friend references, in declared order.
    ///
    /// Returns `None` when the user has no friends list at all.
    pub fn friends_of(&self, user: &User) -> Option<Vec<&User>> {
        user.friends
            .as_ref()
            .map(|ids| ids.iter().filter_map(|id| self.get(id.as_str())).collect())
    }
}

/// Two-phase builder for [`UserStore`].
#[derive(Debug, Default)]
pub struct UserStoreBuilder {
    users: Vec<User>,
    friendships: Vec<(UserId, Vec<UserId>)>,
}

impl UserStoreBuilder {
    /// Registers a record.
    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Registers several records.
    pub fn users(mut self, users: impl IntoIterator<Item = User>) -> Self {
        self.users.extend(users);
        self
    }

    /// Declares the friends of `id`, replacing any list set on the record.
    pub fn friends<I, S>(mut self, id: impl Into<UserId>, friends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        self.friendships
            .push((id.into(), friends.into_iter().map(Into::into).collect()));
        self
    }

    /// Indexes the records, wires friendships and validates every reference.
    pub fn build(self) -> Result<UserStore, StoreError> {
        let mut users = self.users;
        let mut index = FxHashMap::default();
        index.reserve(users.len());

        for (i, user) in users.iter().enumerate() {
            if index.insert(user.id.clone(), i).is_some() {
                return Err(StoreError::DuplicateId(user.id.to_string()));
            }
        }

        for (id, friends) in self.friendships {
            let Some(&i) = index.get(&id) else {
                return Err(StoreError::UnknownUser(id.to_string()));
            };
            users[i].friends = Some(friends);
        }

        for user in &users {
            let dangling = user
                .friends
                .iter()
                .flatten()
                .find(|friend| !index.contains_key(*friend));
            if let Some(friend) = dangling {
                return Err(StoreError::DanglingFriend {
                    user: user.id.to_string(),
                    friend: friend.to_string(),
                });
            }
        }

        tracing::debug!(users = users.len(), "built user store");
        Ok(UserStore { users, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use chrono::{TimeZone, Utc};

    fn user(id: &str, name: &str) -> User {
        User {
            id: UserId::new(id),
            name: name.to_string(),
            role: Role::User,
            email: format!("{}@example.com", id),
            phone: "000-000-0000".to_string(),
            address: None,
            friends: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_lookup_roundtrip() {
        let mut alice = user("a", "Alice");
        alice.address = Some(vec!["1 Main St".to_string()]);
        let store = UserStore::builder()
            .user(alice.clone())
            .user(user("b", "Bob"))
            .build()
            .unwrap();

        assert_eq!(store.lookup("a").unwrap(), &alice);
        assert_eq!(store.len(), 2);
        assert!(store.contains("b"));
        assert_eq!(
            store.lookup("z").unwrap_err(),
            ResolveError::UserNotFound { id: "z".to_string() }
        );
    }

    #[test]
    fn test_insertion_order() {
        let store = UserStore::builder()
            .users([user("c", "Carol"), user("a", "Alice"), user("b", "Bob")])
            .build()
            .unwrap();

        let ids: Vec<&str> = store.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_friends_wired_after_records() {
        // A friend declared before its record exists still resolves.
        let store = UserStore::builder()
            .user(user("a", "Alice"))
            .friends("a", ["c", "b"])
            .user(user("b", "Bob"))
            .user(user("c", "Carol"))
            .build()
            .unwrap();

        let alice = store.lookup("a").unwrap();
        let friends: Vec<&str> = store
            .friends_of(alice)
            .unwrap()
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(friends, vec!["Carol", "Bob"]);

        let bob = store.lookup("b").unwrap();
        assert!(store.friends_of(bob).is_none());
    }

    #[test]
    fn test_empty_friends_list_is_present() {
        let store = UserStore::builder()
            .user(user("a", "Alice"))
            .friends("a", Vec::<UserId>::new())
            .build()
            .unwrap();

        let alice = store.lookup("a").unwrap();
        assert_eq!(store.friends_of(alice), Some(Vec::new()));
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = UserStore::builder()
            .user(user("a", "Alice"))
            .user(user("a", "Another Alice"))
            .build()
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_rejects_unknown_owner() {
        let err = UserStore::builder()
            .user(user("a", "Alice"))
            .friends("x", ["a"])
            .build()
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownUser("x".to_string()));
    }

    #[test]
    fn test_rejects_dangling_friend() {
        let err = UserStore::builder()
            .user(user("a", "Alice"))
            .friends("a", ["ghost"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DanglingFriend {
                user: "a".to_string(),
                friend: "ghost".to_string(),
            }
        );

        // Lists set directly on a record are checked too.
        let mut bob = user("b", "Bob");
        bob.friends = Some(vec![UserId::new("nobody")]);
        assert!(matches!(
            UserStore::builder().user(bob).build(),
            Err(StoreError::DanglingFriend { .. })
        ));
    }
}
