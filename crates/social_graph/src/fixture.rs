//! The built-in social graph.
//!
//! Four users with a deliberately non-symmetric friendship relation:
//! `0x01` lists only `0x02`, while `0x02` lists everyone else.

use crate::error::StoreError;
use crate::model::{Role, User, UserId};
use crate::store::UserStore;
use chrono::{DateTime, Utc};

/// Friendships by user id, in the order friends are listed.
pub const FRIENDSHIPS: &[(&str, &[&str])] = &[
    ("0x01", &["0x02"]),
    ("0x02", &["0x01", "0x03", "0x04"]),
    ("0x03", &["0x02", "0x04"]),
    ("0x04", &["0x02", "0x03"]),
];

/// The fixture records, without friendships, all stamped `created_at`.
pub fn users(created_at: DateTime<Utc>) -> Vec<User> {
    [
        (
            "0x01",
            "Albus Dumbledore",
            Role::Admin,
            "Albus@hogwarts.com",
            "000-000-0000",
            ["Office @ Hogwarts", "where Horcruxes are"],
        ),
        (
            "0x02",
            "Harry Potter",
            Role::User,
            "harry@hogwarts.com",
            "000-000-0001",
            ["123 dorm room @ Hogwarts", "456 random place"],
        ),
        (
            "0x03",
            "Hermione Granger",
            Role::User,
            "hermione@hogwarts.com",
            "000-000-0011",
            ["233 dorm room @ Hogwarts", "786 @ random place"],
        ),
        (
            "0x04",
            "Ronald Weasley",
            Role::User,
            "ronald@hogwarts.com",
            "000-000-0111",
            ["411 dorm room @ Hogwarts", "981 @ random place"],
        ),
    ]
    .into_iter()
    .map(|(id, name, role, email, phone, address)| User {
        id: UserId::new(id),
        name: name.to_string(),
        role,
        email: email.to_string(),
        phone: phone.to_string(),
        address: Some(address.iter().map(|line| line.to_string()).collect()),
        friends: None,
        created_at,
    })
    .collect()
}

/// Builds the fixture store, stamped with the current time.
pub fn store() -> Result<UserStore, StoreError> {
    store_at(Utc::now())
}

/// Builds the fixture store with a fixed creation time.
pub fn store_at(created_at: DateTime<Utc>) -> Result<UserStore, StoreError> {
    FRIENDSHIPS
        .iter()
        .fold(
            UserStore::builder().users(users(created_at)),
            |builder, (id, friends)| builder.friends(*id, friends.iter().copied()),
        )
        .build()
}
