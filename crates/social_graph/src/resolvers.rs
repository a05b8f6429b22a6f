//! Binds the query entry points to the runtime's resolver map.
//!
//! Objects are returned as JSON with a `__typename` so the executor can
//! dispatch abstract types. Fields without a registered resolver (every
//! scalar on `User` and `Admin`) fall through to the default resolver.

use crate::model::{Admin, Role, SearchResult, User};
use crate::pagination::Page;
use crate::query::SocialQuery;
use crate::schema::schema;
use crate::store::UserStore;
use serde_json::{json, Value};
use social_runtime::{
    Context, Executor, ExecutorConfig, ResolverArgs, ResolverError, ResolverMap, ResolverResult,
    SelectionNode,
};
use std::sync::Arc;

/// Fields kept on a projected user regardless of the selection.
const ALWAYS_KEPT: [&str; 2] = ["__typename", "id"];

/// Creates the resolver map for a store.
pub fn resolvers(store: Arc<UserStore>) -> ResolverMap {
    let query = SocialQuery::new(store);
    let mut map = ResolverMap::new();

    let q = query.clone();
    map.register_fn("Query", "admin", move |_parent, args, _ctx, _info| {
        resolve_admin(&q, args)
    });

    let q = query.clone();
    map.register_fn("Query", "user", move |_parent, args, ctx, _info| {
        resolve_user(&q, args, ctx)
    });

    let q = query.clone();
    map.register_fn("Query", "search", move |_parent, args, _ctx, _info| {
        resolve_search(&q, args)
    });

    map.register_fn("User", "friends", move |parent, args, _ctx, _info| {
        resolve_friends(&query, parent, args)
    });

    map
}

/// Creates an executor over the social graph schema.
pub fn executor(store: Arc<UserStore>, config: ExecutorConfig) -> Executor {
    Executor::with_config(config, schema(), resolvers(store))
}

fn resolve_admin(query: &SocialQuery, args: &ResolverArgs) -> ResolverResult {
    let id: String = args.require("id")?;
    let role: Role = args.require::<String>("role")?.parse()?;
    Ok(admin_value(query.admin(&id, role)?))
}

fn resolve_user(query: &SocialQuery, args: &ResolverArgs, ctx: &Context) -> ResolverResult {
    let id: String = args.require("id")?;
    let user = query.user(ctx, &id)?;
    let value = user_value(user)?;

    // Outside the executor there is no selection; return the whole record.
    match ctx.selected_fields() {
        Ok(selection) => Ok(project(value, &selection)),
        Err(_) => Ok(value),
    }
}

fn resolve_search(query: &SocialQuery, args: &ResolverArgs) -> ResolverResult {
    let text: String = args.require("text")?;
    let results = query
        .search(&text)
        .into_iter()
        .map(search_result_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(results))
}

fn resolve_friends(query: &SocialQuery, parent: &Value, args: &ResolverArgs) -> ResolverResult {
    let id = parent
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ResolverError::Internal("parent user has no id".to_string()))?;
    let user = query.store().lookup(id)?;
    let page: Option<Page> = args.optional("page")?;

    match query.friends(user, page.as_ref())? {
        Some(friends) => friends
            .into_iter()
            .map(user_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        None => Ok(Value::Null),
    }
}

fn admin_value(admin: &dyn Admin) -> Value {
    json!({
        "__typename": admin.typename(),
        "id": admin.id(),
        "name": admin.name(),
        "role": admin.role(),
    })
}

/// Serializes a user with its `__typename`.
pub fn user_value(user: &User) -> ResolverResult {
    let mut value =
        serde_json::to_value(user).map_err(|e| ResolverError::Internal(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("__typename".to_string(), json!(User::TYPENAME));
    }
    Ok(value)
}

fn search_result_value(result: SearchResult<'_>) -> ResolverResult {
    match result {
        SearchResult::User(user) => user_value(user),
    }
}

/// Keeps only the selected keys of an object.
fn project(value: Value, selection: &[SelectionNode]) -> Value {
    match value {
        Value::Object(mut map) => {
            map.retain(|key, _| {
                ALWAYS_KEPT.contains(&key.as_str()) || selection.iter().any(|n| &n.name == key)
            });
            Value::Object(map)
        }
        other => other,
    }
}
