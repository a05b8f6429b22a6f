//! Query execution.
//!
//! The executor walks a [`QueryPlan`], calls the registered resolver for each
//! field and assembles the JSON response. Every resolver call receives its own
//! clone of the request [`Context`] carrying a [`SelectedFields`] accessor for
//! that field's sub-selection.

use crate::context::Context;
use crate::query::{FieldInfo, Operation, PlanNode, QueryPlan, QueryPlanner};
use crate::resolver::{ResolverArgs, ResolverInfo, ResolverMap};
use crate::schema::Schema;
use crate::selection::SelectedFields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::debug;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of resolvers running at once within one query.
    pub max_concurrent_fields: usize,
    /// Resolve sibling fields concurrently.
    pub parallel: bool,
    /// Emit a debug event for every resolved field.
    pub tracing: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fields: 100,
            parallel: true,
            tracing: false,
        }
    }
}

/// The query executor.
pub struct Executor {
    config: ExecutorConfig,
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("resolvers", &self.resolvers)
            .finish()
    }
}

impl Executor {
    /// Creates an executor for a schema and its resolvers.
    pub fn new(schema: Schema, resolvers: ResolverMap) -> Self {
        Self::with_config(ExecutorConfig::default(), schema, resolvers)
    }

    /// Creates an executor with configuration.
    pub fn with_config(config: ExecutorConfig, schema: Schema, resolvers: ResolverMap) -> Self {
        Self {
            config,
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
        }
    }

    /// Plans and executes an operation.
    ///
    /// Planning failures produce a response without data.
    pub async fn run(
        &self,
        planner: &QueryPlanner,
        operation: &Operation,
        ctx: &Context,
    ) -> Response {
        match planner.plan(operation, &self.schema) {
            Ok(plan) => self.execute(&plan, ctx).await,
            Err(e) => Response::error(
                FieldError::new(e.message).with_code("GRAPHQL_VALIDATION_FAILED"),
            ),
        }
    }

    /// Executes a query plan.
    pub async fn execute(&self, plan: &QueryPlan, ctx: &Context) -> Response {
        let exec_ctx = ExecutionContext {
            schema: Arc::clone(&self.schema),
            ctx: ctx.clone(),
            resolvers: Arc::clone(&self.resolvers),
            config: self.config.clone(),
            permits: Arc::new(Semaphore::new(self.config.max_concurrent_fields.max(1))),
            errors: Arc::new(RwLock::new(Vec::new())),
        };

        // Get root value (empty object for Query)
        let root_value = Value::Object(serde_json::Map::new());

        let data = execute_node(&plan.root, root_value, Vec::new(), &exec_ctx).await;

        let errors = exec_ctx.errors.read().await;
        let errors = if errors.is_empty() {
            None
        } else {
            Some(errors.clone())
        };

        Response {
            data: Some(data),
            errors,
        }
    }
}

/// Executes a plan node.
fn execute_node<'a>(
    node: &'a PlanNode,
    parent: Value,
    path: Vec<PathSegment>,
    ctx: &'a ExecutionContext,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Value> + Send + 'a>> {
    Box::pin(async move {
        match node {
            PlanNode::Parallel(nodes) if ctx.config.parallel => {
                execute_parallel(nodes, parent, path, ctx).await
            }
            PlanNode::Parallel(nodes) => execute_sequence(nodes, parent, path, ctx).await,
            PlanNode::Field {
                info,
                response_name,
                children,
            } => execute_field(info, response_name, children, parent, path, ctx).await,
            PlanNode::Leaf { field } => execute_leaf(field, parent, path, ctx).await,
            PlanNode::TypeCondition { type_name, node } => {
                let matches = parent
                    .get("__typename")
                    .and_then(Value::as_str)
                    .map_or(true, |typename| typename == type_name);
                if matches {
                    execute_node(node, parent, path, ctx).await
                } else {
                    Value::Object(serde_json::Map::new())
                }
            }
        }
    })
}

fn merge_into(result: &mut serde_json::Map<String, Value>, value: Value) {
    if let Value::Object(map) = value {
        for (k, v) in map {
            result.insert(k, v);
        }
    }
}

/// Executes nodes sequentially.
async fn execute_sequence(
    nodes: &[PlanNode],
    parent: Value,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Value {
    let mut result = serde_json::Map::new();

    for node in nodes {
        let value = execute_node(node, parent.clone(), path.clone(), ctx).await;
        merge_into(&mut result, value);
    }

    Value::Object(result)
}

/// Executes nodes in parallel.
async fn execute_parallel(
    nodes: &[PlanNode],
    parent: Value,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Value {
    let mut handles = Vec::with_capacity(nodes.len());

    for node in nodes {
        let parent = parent.clone();
        let path = path.clone();
        let local_ctx = ctx.clone();
        let node = node.clone();

        handles.push(tokio::spawn(async move {
            execute_node(&node, parent, path, &local_ctx).await
        }));
    }

    let mut result = serde_json::Map::new();

    for handle in handles {
        match handle.await {
            Ok(value) => merge_into(&mut result, value),
            Err(e) => {
                let mut errors = ctx.errors.write().await;
                errors.push(
                    FieldError::new(format!("Parallel execution failed: {}", e))
                        .with_path(path.clone())
                        .with_code("INTERNAL_ERROR"),
                );
            }
        }
    }

    Value::Object(result)
}

/// Executes a field with nested selections.
async fn execute_field(
    info: &FieldInfo,
    response_name: &str,
    children: &PlanNode,
    parent: Value,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Value {
    let mut field_path = path;
    field_path.push(PathSegment::Field(response_name.to_string()));

    let field_value = resolve_field(info, &parent, &field_path, ctx).await;

    // Lists execute their children once per item
    let result = match field_value {
        Value::Array(items) => {
            let mut results = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                if item.is_null() {
                    results.push(Value::Null);
                    continue;
                }
                let mut item_path = field_path.clone();
                item_path.push(PathSegment::Index(i));
                results.push(execute_node(children, item, item_path, ctx).await);
            }
            Value::Array(results)
        }
        Value::Null => Value::Null,
        other => execute_node(children, other, field_path, ctx).await,
    };

    let mut obj = serde_json::Map::new();
    obj.insert(response_name.to_string(), result);
    Value::Object(obj)
}

/// Executes a leaf field.
async fn execute_leaf(
    info: &FieldInfo,
    parent: Value,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Value {
    let response_key = info.response_key();
    let mut field_path = path;
    field_path.push(PathSegment::Field(response_key.to_string()));

    let value = resolve_field(info, &parent, &field_path, ctx).await;

    let mut obj = serde_json::Map::new();
    obj.insert(response_key.to_string(), value);
    Value::Object(obj)
}

/// Resolves a single field.
async fn resolve_field(
    info: &FieldInfo,
    parent: &Value,
    path: &[PathSegment],
    ctx: &ExecutionContext,
) -> Value {
    // Handle __typename specially
    if info.is_introspection && info.name == "__typename" {
        let typename = parent
            .get("__typename")
            .and_then(Value::as_str)
            .unwrap_or(info.parent_type.as_str());
        return Value::String(typename.to_string());
    }

    let resolver = ctx.resolvers.get(&info.parent_type, &info.name);

    let args = ResolverArgs::from_pairs(info.arguments.clone());
    let resolver_info = ResolverInfo::new(&info.name, &info.parent_type)
        .with_return_type(&info.return_type)
        .with_path(path.to_vec());
    let field_ctx = ctx
        .ctx
        .clone()
        .with_selection(SelectedFields::from_nodes(Arc::clone(&info.selection)));

    let result = {
        let Ok(_permit) = ctx.permits.acquire().await else {
            ctx.push_error(FieldError::new("Executor is shutting down").with_path(path.to_vec()))
                .await;
            return Value::Null;
        };
        resolver
            .resolve(parent, &args, &field_ctx, &resolver_info)
            .await
    };

    let result = result.map_err(FieldError::from).and_then(|value| {
        check_runtime_type(&ctx.schema, &info.return_type, &value)?;
        Ok(value)
    });

    match result {
        Ok(value) => {
            if ctx.config.tracing {
                debug!(
                    field = %format!("{}.{}", info.parent_type, info.name),
                    path = ?path,
                    "resolved field"
                );
            }
            value
        }
        Err(e) => {
            ctx.push_error(e.with_path(path.to_vec())).await;
            Value::Null
        }
    }
}

/// Values of interface or union type must name a possible object type.
fn check_runtime_type(schema: &Schema, return_type: &str, value: &Value) -> Result<(), FieldError> {
    if !schema.is_abstract(return_type) {
        return Ok(());
    }
    match value {
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| check_runtime_type(schema, return_type, item)),
        Value::Object(map) => {
            let typename = map.get("__typename").and_then(Value::as_str);
            match typename {
                Some(name) if schema.possible_types(return_type).contains(&name) => Ok(()),
                _ => Err(FieldError::new(format!(
                    "Abstract type \"{}\" must resolve to an object type at runtime, got {:?}",
                    return_type, typename
                ))
                .with_code("INTERNAL_ERROR")),
            }
        }
        _ => Ok(()),
    }
}

/// Execution context.
#[derive(Clone)]
struct ExecutionContext {
    schema: Arc<Schema>,
    ctx: Context,
    resolvers: Arc<ResolverMap>,
    config: ExecutorConfig,
    permits: Arc<Semaphore>,
    errors: Arc<RwLock<Vec<FieldError>>>,
}

impl ExecutionContext {
    async fn push_error(&self, error: FieldError) {
        self.errors.write().await.push(error);
    }
}

/// A GraphQL response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// The errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Response {
    /// Creates a successful response with data.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates an error response.
    pub fn error(error: FieldError) -> Self {
        Self {
            data: None,
            errors: Some(vec![error]),
        }
    }

    /// Returns true if the response has errors.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().map(|e| !e.is_empty()).unwrap_or(false)
    }

    /// Returns true if the response has data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// A field error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// The error message.
    pub message: String,
    /// The path to the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    /// Error extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

/// A path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }

    /// Adds a path to the error.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Adds an extension.
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the error code extension.
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_extension("code", serde_json::Value::String(code.into()))
    }

    /// Returns the error code extension, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}
