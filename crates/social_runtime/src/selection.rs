//! Field selection trees and the selected-fields accessor.
//!
//! The executor injects a [`SelectedFields`] accessor into the context of
//! every resolver call. A resolver reads it back with
//! [`fields_from_context`] (or [`Context::selected_fields`]) to learn which of
//! its own output fields were requested, together with their arguments and
//! nested selections.

use crate::context::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One requested field in a query's selection tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionNode {
    /// The field name.
    pub name: String,
    /// Arguments supplied at this field.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, Value>,
    /// Sub-field requests, in query order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<SelectionNode>,
}

impl SelectionNode {
    /// Creates a node without arguments or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: IndexMap::new(),
            selected: Vec::new(),
        }
    }

    /// Adds an argument.
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Adds a child selection.
    pub fn select(mut self, child: SelectionNode) -> Self {
        self.selected.push(child);
        self
    }

    /// Adds leaf children by name.
    pub fn select_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected
            .extend(names.into_iter().map(SelectionNode::new));
        self
    }

    /// Returns true if this node has sub-selections.
    pub fn has_children(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Finds a direct child by name.
    pub fn child(&self, name: &str) -> Option<&SelectionNode> {
        find(&self.selected, name)
    }

    /// Depth of the tree rooted at this node (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.selected.iter().map(Self::depth).max().unwrap_or(0)
    }
}

/// Finds the first node named `name`.
pub fn find<'a>(nodes: &'a [SelectionNode], name: &str) -> Option<&'a SelectionNode> {
    nodes.iter().find(|node| node.name == name)
}

/// Accessor function injected into the context by the executor.
pub type SelectedFieldsFn = dyn Fn() -> Vec<SelectionNode> + Send + Sync;

/// The selected-fields accessor for one resolver invocation.
#[derive(Clone)]
pub struct SelectedFields(Arc<SelectedFieldsFn>);

impl SelectedFields {
    /// Wraps an accessor function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Vec<SelectionNode> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// An accessor returning a fixed list of nodes.
    pub fn from_nodes(nodes: Arc<Vec<SelectionNode>>) -> Self {
        Self::new(move || nodes.as_ref().clone())
    }

    /// Calls the accessor.
    pub fn get(&self) -> Vec<SelectionNode> {
        (self.0)()
    }
}

impl fmt::Debug for SelectedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SelectedFields(..)")
    }
}

/// Error returned when no accessor was injected into the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("could not get graphql fields from context")]
    Unavailable,
}

impl SelectionError {
    /// Machine-readable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "SELECTION_UNAVAILABLE",
        }
    }
}

/// Returns the selection of the field currently being resolved.
pub fn fields_from_context(ctx: &Context) -> Result<Vec<SelectionNode>, SelectionError> {
    ctx.extension::<SelectedFields>()
        .map(SelectedFields::get)
        .ok_or(SelectionError::Unavailable)
}
