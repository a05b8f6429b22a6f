//! Records and the two polymorphic views over them.
//!
//! [`Admin`] is a narrow capability interface (anything exposing id, name and
//! role). [`SearchResult`] is the closed set of kinds a search can return.

use crate::error::ResolveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(ResolveError::invalid_argument(
                "role",
                format!("unknown role {other}, expected ADMIN or USER"),
            )),
        }
    }
}

/// A user record.
///
/// `address: None` means no address is known, which is not the same as an
/// empty list. `friends` holds references by id; the store guarantees every
/// id resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub phone: String,
    pub address: Option<Vec<String>>,
    #[serde(skip)]
    pub friends: Option<Vec<UserId>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const TYPENAME: &'static str = "User";
}

/// Anything that can answer as an administrator.
pub trait Admin: fmt::Debug + Send + Sync {
    fn id(&self) -> &UserId;
    fn name(&self) -> &str;
    fn role(&self) -> Role;

    /// Name of the concrete object type behind the interface.
    fn typename(&self) -> &'static str;
}

impl Admin for User {
    fn id(&self) -> &UserId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    fn typename(&self) -> &'static str {
        User::TYPENAME
    }
}

/// One hit of a free-text search.
///
/// The set of kinds is closed: a new kind means a new variant here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchResult<'a> {
    User(&'a User),
}

impl<'a> SearchResult<'a> {
    /// Returns the user when this result is one.
    pub fn to_user(&self) -> Option<&'a User> {
        match *self {
            SearchResult::User(user) => Some(user),
        }
    }

    /// Name of the concrete object type.
    pub fn typename(&self) -> &'static str {
        match self {
            SearchResult::User(_) => User::TYPENAME,
        }
    }

    /// Returns true if this result is of the named kind.
    pub fn is_kind(&self, typename: &str) -> bool {
        self.typename() == typename
    }
}

impl<'a> From<&'a User> for SearchResult<'a> {
    fn from(user: &'a User) -> Self {
        SearchResult::User(user)
    }
}
