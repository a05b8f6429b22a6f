//! Query entry points over the user store.

use crate::error::{ResolveError, ResolveResult};
use crate::model::{Admin, Role, SearchResult, User};
use crate::pagination::{paginate, Page};
use crate::store::UserStore;
use social_runtime::{fields_from_context, Context};
use std::sync::Arc;
use tracing::debug;

/// The `Query` root: admin, user and search lookups.
///
/// Cheap to clone; the store is shared.
#[derive(Debug, Clone)]
pub struct SocialQuery {
    store: Arc<UserStore>,
}

impl SocialQuery {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Looks up a user that holds exactly `role`.
    pub fn admin(&self, id: &str, role: Role) -> ResolveResult<&dyn Admin> {
        match self.store.get(id) {
            Some(user) if user.role == role => Ok(user as &dyn Admin),
            _ => Err(ResolveError::AdminNotFound {
                id: id.to_string(),
                role,
            }),
        }
    }

    /// Looks up a user by id.
    ///
    /// The requested selection is logged when the context carries one; a
    /// missing selection never fails the lookup.
    pub fn user(&self, ctx: &Context, id: &str) -> ResolveResult<&User> {
        match fields_from_context(ctx) {
            Ok(fields) => {
                for field in &fields {
                    debug!(
                        name = %field.name,
                        selected_children = field.has_children(),
                        args = ?field.args,
                        "user selection"
                    );
                }
            }
            Err(e) => debug!(error = %e, "user selection unavailable"),
        }

        self.store.lookup(id)
    }

    /// Users whose name contains `text`, case-sensitively, in store order.
    pub fn search(&self, text: &str) -> Vec<SearchResult<'_>> {
        self.store
            .iter()
            .filter(|user| user.name.contains(text))
            .map(SearchResult::User)
            .collect()
    }

    /// A user's friends, windowed by `page`.
    ///
    /// `Ok(None)` means the user has no friends list at all.
    pub fn friends(&self, user: &User, page: Option<&Page>) -> ResolveResult<Option<Vec<&User>>> {
        let Some(friends) = self.store.friends_of(user) else {
            return Ok(None);
        };
        Ok(Some(paginate(&friends, page)?.to_vec()))
    }
}
