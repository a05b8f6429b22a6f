//! Execution runtime for the social graph.
//!
//! This crate provides the pieces a resolver runs inside of:
//! - `schema`: Schema definition and building
//! - `selection`: Field selection trees and the selected-fields accessor
//! - `context`: Request-scoped context with typed extensions
//! - `resolver`: Resolver trait and resolver map
//! - `query`: Query planning
//! - `executor`: Query execution

pub mod context;
pub mod executor;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod selection;

pub use context::{Context, Extensions};
pub use executor::{Executor, ExecutorConfig, FieldError, PathSegment, Response};
pub use query::{FieldInfo, Operation, PlanError, PlanNode, PlannerConfig, QueryPlan, QueryPlanner};
pub use resolver::{
    FnResolver, Resolver, ResolverArgs, ResolverError, ResolverInfo, ResolverMap, ResolverResult,
};
pub use schema::{Schema, SchemaBuilder, TypeDef, TypeRef};
pub use selection::{fields_from_context, SelectedFields, SelectionError, SelectionNode};
