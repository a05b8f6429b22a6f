//! Resolution core for the social graph.
//!
//! This crate answers the three query shapes of the social graph schema:
//! - `store`: Immutable user store with two-phase construction
//! - `model`: Records, the `Admin` capability and the `SearchResult` union
//! - `pagination`: Offset windows over a user's friends
//! - `query`: The `admin`, `user` and `search` entry points
//! - `resolvers`: Binding of the entry points to a `social_runtime` resolver map
//! - `schema`: The schema as SDL and as runtime type definitions
//! - `fixture`: The built-in four-user graph
//!
//! # Example
//!
//! ```no_run
//! use social_graph::{fixture, SocialQuery};
//! use std::sync::Arc;
//!
//! let store = Arc::new(fixture::store().unwrap());
//! let query = SocialQuery::new(store);
//! let hits = query.search("Potter");
//! assert_eq!(hits.len(), 1);
//! ```

pub mod error;
pub mod fixture;
pub mod model;
pub mod pagination;
pub mod query;
pub mod resolvers;
pub mod schema;
pub mod store;

pub use error::{ResolveError, ResolveResult, StoreError};
pub use model::{Admin, Role, SearchResult, User, UserId};
pub use pagination::{paginate, Page};
pub use query::SocialQuery;
pub use resolvers::{executor, resolvers};
pub use schema::{schema, SDL};
pub use store::{UserStore, UserStoreBuilder};
