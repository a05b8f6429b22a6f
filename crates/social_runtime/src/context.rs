//! Request-scoped context passed to every resolver.
//!
//! A context carries typed extensions keyed by `TypeId`. The executor uses an
//! extension to hand each resolver its [`SelectedFields`] accessor.

use crate::selection::{self, SelectedFields, SelectionError, SelectionNode};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-safe storage for request-scoped values.
///
/// Values are reference counted, so cloning a context for a nested resolver
/// call does not copy them.
#[derive(Clone, Default)]
pub struct Extensions {
    map: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates an empty extension map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Gets a reference to a value by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("count", &self.map.len())
            .finish()
    }
}

/// Execution context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    extensions: Extensions,
}

impl Context {
    /// Creates a new context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a typed extension.
    pub fn extension<T: 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// Attaches the selected-fields accessor for one resolver call.
    pub fn with_selection(mut self, fields: SelectedFields) -> Self {
        self.extensions.insert(fields);
        self
    }

    /// Returns the selection of the field currently being resolved.
    ///
    /// Fails with [`SelectionError::Unavailable`] when the context was not
    /// populated by the executor.
    pub fn selected_fields(&self) -> Result<Vec<SelectionNode>, SelectionError> {
        selection::fields_from_context(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct RequestId(String);

    #[test]
    fn test_extensions() {
        let mut ext = Extensions::new();
        assert!(ext.get::<RequestId>().is_none());

        ext.insert(RequestId("req_1".to_string()));
        let cloned = ext.clone();
        ext.insert(RequestId("req_2".to_string()));

        assert_eq!(cloned.get::<RequestId>().unwrap().0, "req_1");
        assert_eq!(ext.get::<RequestId>().unwrap().0, "req_2");
        assert!(ext.get::<u32>().is_none());
    }

    #[test]
    fn test_with_selection() {
        let ctx = Context::new();
        assert!(ctx.extension::<SelectedFields>().is_none());
        assert_eq!(ctx.selected_fields(), Err(SelectionError::Unavailable));

        let ctx = ctx.with_selection(SelectedFields::new(|| {
            vec![SelectionNode::new("name"), SelectionNode::new("email")]
        }));
        let names: Vec<String> = ctx
            .selected_fields()
            .unwrap()
            .into_iter()
            .map(|node| node.name)
            .collect();
        assert_eq!(names, vec!["name", "email"]);
    }
}
