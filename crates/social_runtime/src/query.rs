//! Query planning.
//!
//! The planner walks an operation's selection tree against the schema and
//! produces a [`QueryPlan`]. Every planned field keeps its own sub-selection
//! so the executor can hand it to the field's resolver.

use crate::schema::{Schema, TypeDef, TypeRef};
use crate::selection::SelectionNode;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Query planner configuration.
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    /// Maximum selection depth; 0 disables the check.
    pub max_depth: usize,
}

/// An operation to plan: the root selection of a query.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub name: Option<String>,
    pub selection: Vec<SelectionNode>,
}

impl Operation {
    /// Creates an anonymous query operation.
    pub fn query(selection: Vec<SelectionNode>) -> Self {
        Self {
            name: None,
            selection,
        }
    }

    /// Depth of the deepest selection.
    pub fn depth(&self) -> usize {
        self.selection
            .iter()
            .map(SelectionNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// The query planner.
#[derive(Debug, Default)]
pub struct QueryPlanner {
    config: PlannerConfig,
}

impl QueryPlanner {
    /// Creates a new query planner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query planner with configuration.
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Plans an operation.
    pub fn plan(&self, operation: &Operation, schema: &Schema) -> Result<QueryPlan, PlanError> {
        let root_type = schema
            .query_type
            .as_deref()
            .ok_or_else(|| PlanError::new("Schema does not define a query type"))?;

        let depth = operation.depth();
        if self.config.max_depth > 0 && depth > self.config.max_depth {
            return Err(PlanError::new(format!(
                "Query depth {} exceeds the maximum of {}",
                depth, self.config.max_depth
            )));
        }

        let nodes = plan_selection(root_type, &operation.selection, schema)?;
        debug!(
            operation = operation.name.as_deref().unwrap_or("<anonymous>"),
            fields = nodes.len(),
            depth,
            "planned query"
        );

        Ok(QueryPlan {
            root: PlanNode::Parallel(nodes),
            operation_name: operation.name.clone(),
            max_depth: depth,
        })
    }
}

fn plan_selection(
    parent_type: &str,
    nodes: &[SelectionNode],
    schema: &Schema,
) -> Result<Vec<PlanNode>, PlanError> {
    let mut planned = Vec::with_capacity(nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        // A response key is written once; repeats must ask for the same thing.
        if let Some(earlier) = nodes[..i].iter().find(|n| n.name == node.name) {
            if earlier != node {
                return Err(PlanError::new(format!(
                    "Fields \"{}\" conflict because they have differing arguments or subselections",
                    node.name
                )));
            }
            continue;
        }

        if node.name == "__typename" {
            planned.push(PlanNode::Leaf {
                field: FieldInfo::typename(parent_type),
            });
            continue;
        }

        match schema.get_type(parent_type) {
            // Union members are only known at runtime, so a field selected on
            // the union is planned once per member that declares it.
            Some(TypeDef::Union(union)) => {
                let mut matched = false;
                for member in &union.members {
                    if schema.field(member, &node.name).is_some() {
                        matched = true;
                        planned.push(PlanNode::TypeCondition {
                            type_name: member.clone(),
                            node: Box::new(plan_field(member, node, schema)?),
                        });
                    }
                }
                if !matched {
                    return Err(PlanError::unknown_field(&node.name, parent_type));
                }
            }
            _ => planned.push(plan_field(parent_type, node, schema)?),
        }
    }

    Ok(planned)
}

fn plan_field(
    parent_type: &str,
    node: &SelectionNode,
    schema: &Schema,
) -> Result<PlanNode, PlanError> {
    let def = schema
        .field(parent_type, &node.name)
        .ok_or_else(|| PlanError::unknown_field(&node.name, parent_type))?;

    if let Some(unknown) = node.args.keys().find(|a| !def.arguments.contains_key(*a)) {
        return Err(PlanError::new(format!(
            "Unknown argument \"{}\" on field \"{}.{}\"",
            unknown, parent_type, node.name
        )));
    }

    let mut arguments = Vec::with_capacity(def.arguments.len());
    for (name, arg) in &def.arguments {
        let value = node
            .args
            .get(name)
            .filter(|v| !v.is_null())
            .or(arg.default_value.as_ref());
        match value {
            Some(value) => {
                check_input(name, &arg.ty, value, schema)?;
                arguments.push((name.clone(), value.clone()));
            }
            None if matches!(arg.ty, TypeRef::NonNull(_)) => {
                return Err(PlanError::new(format!(
                    "Field \"{}\" argument \"{}\" of type \"{}\" is required",
                    node.name, name, arg.ty
                )));
            }
            None => {}
        }
    }

    let return_type = def.ty.named_type();
    let info = FieldInfo {
        name: node.name.clone(),
        parent_type: parent_type.to_string(),
        return_type: return_type.to_string(),
        arguments,
        is_introspection: false,
        selection: Arc::new(node.selected.clone()),
    };

    if schema.is_leaf(return_type) {
        if node.has_children() {
            return Err(PlanError::new(format!(
                "Field \"{}\" of type \"{}\" must not have a selection",
                node.name, def.ty
            )));
        }
        return Ok(PlanNode::Leaf { field: info });
    }

    if !node.has_children() {
        return Err(PlanError::new(format!(
            "Field \"{}\" of type \"{}\" must have a selection of subfields",
            node.name, def.ty
        )));
    }

    let children = plan_selection(return_type, &node.selected, schema)?;
    Ok(PlanNode::Field {
        response_name: node.name.clone(),
        info,
        children: Box::new(PlanNode::Parallel(children)),
    })
}

/// Checks an argument value against the input object and enum types it
/// names. Scalars are left to the resolver.
fn check_input(name: &str, ty: &TypeRef, value: &Value, schema: &Schema) -> Result<(), PlanError> {
    if value.is_null() {
        return Ok(());
    }
    let type_name = match ty {
        TypeRef::NonNull(inner) => return check_input(name, inner, value, schema),
        TypeRef::List(inner) => {
            return match value {
                Value::Array(items) => items
                    .iter()
                    .try_for_each(|item| check_input(name, inner, item, schema)),
                other => check_input(name, inner, other, schema),
            };
        }
        TypeRef::Named(type_name) => type_name,
    };

    match schema.get_type(type_name) {
        Some(TypeDef::InputObject(input)) => {
            let Value::Object(fields) = value else {
                return Err(PlanError::new(format!(
                    "Argument \"{}\" expects an input object of type \"{}\"",
                    name, type_name
                )));
            };
            if let Some(unknown) = fields.keys().find(|k| !input.fields.contains_key(*k)) {
                return Err(PlanError::new(format!(
                    "Field \"{}\" is not defined by type \"{}\"",
                    unknown, type_name
                )));
            }
            for (field_name, def) in &input.fields {
                match fields.get(field_name) {
                    Some(field_value) => check_input(field_name, &def.ty, field_value, schema)?,
                    None if matches!(def.ty, TypeRef::NonNull(_)) && def.default_value.is_none() => {
                        return Err(PlanError::new(format!(
                            "Field \"{}.{}\" of required type \"{}\" was not provided",
                            type_name, field_name, def.ty
                        )));
                    }
                    None => {}
                }
            }
            Ok(())
        }
        Some(TypeDef::Enum(def)) => match value.as_str() {
            Some(v) if def.values.iter().any(|known| known == v) => Ok(()),
            _ => Err(PlanError::new(format!(
                "Value {} does not exist in \"{}\" enum",
                value, type_name
            ))),
        },
        _ => Ok(()),
    }
}

/// A query plan.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// The root node of the plan.
    pub root: PlanNode,
    pub operation_name: Option<String>,
    pub max_depth: usize,
}

/// A node in the query plan.
#[derive(Debug, Clone)]
pub enum PlanNode {
    /// Sibling nodes that may run concurrently.
    Parallel(Vec<PlanNode>),
    /// A field with nested selections.
    Field {
        info: FieldInfo,
        response_name: String,
        children: Box<PlanNode>,
    },
    /// A leaf field to resolve.
    Leaf { field: FieldInfo },
    /// Executes `node` only when the parent value is of `type_name`.
    TypeCondition {
        type_name: String,
        node: Box<PlanNode>,
    },
}

/// A planned field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub parent_type: String,
    pub return_type: String,
    pub arguments: Vec<(String, Value)>,
    pub is_introspection: bool,
    /// The field's own sub-selection, as requested.
    pub selection: Arc<Vec<SelectionNode>>,
}

impl FieldInfo {
    /// The `__typename` meta field on `parent_type`.
    pub fn typename(parent_type: &str) -> Self {
        Self {
            name: "__typename".to_string(),
            parent_type: parent_type.to_string(),
            return_type: "String".to_string(),
            arguments: Vec::new(),
            is_introspection: true,
            selection: Arc::new(Vec::new()),
        }
    }

    /// The key this field is written under in the response.
    pub fn response_key(&self) -> &str {
        &self.name
    }
}

/// A planning error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanError {
    pub message: String,
}

impl PlanError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn unknown_field(field: &str, type_name: &str) -> Self {
        Self::new(format!(
            "Cannot query field \"{}\" on type \"{}\"",
            field, type_name
        ))
    }
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PlanError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        EnumDef, FieldDef, InputFieldDef, InputObjectDef, InterfaceDef, ObjectDef, SchemaBuilder,
        UnionDef,
    };
    use indexmap::IndexMap;
    use serde_json::json;

    fn fields(defs: Vec<FieldDef>) -> IndexMap<String, FieldDef> {
        defs.into_iter().map(|f| (f.name.clone(), f)).collect()
    }

    fn test_schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(TypeDef::Object(ObjectDef {
                name: "Query".to_string(),
                description: None,
                fields: fields(vec![
                    FieldDef::new("pet", TypeRef::named("Pet")).argument(
                        InputFieldDef::new("id", TypeRef::non_null(TypeRef::named("ID"))),
                    ),
                    FieldDef::new("named", TypeRef::named("Named")).argument(
                        InputFieldDef::new("kind", TypeRef::named("String"))
                            .with_default(json!("DOG")),
                    ),
                    FieldDef::new("pets", TypeRef::list(TypeRef::named("Pet"))).argument(
                        InputFieldDef::new("filter", TypeRef::named("PetFilter")),
                    ),
                ]),
                implements: Vec::new(),
            }))
            .add_type(TypeDef::Interface(InterfaceDef {
                name: "Named".to_string(),
                description: None,
                fields: fields(vec![FieldDef::new("name", TypeRef::named("String"))]),
            }))
            .add_type(TypeDef::Object(ObjectDef {
                name: "Dog".to_string(),
                description: None,
                fields: fields(vec![
                    FieldDef::new("name", TypeRef::named("String")),
                    FieldDef::new("barks", TypeRef::named("Boolean")),
                ]),
                implements: vec!["Named".to_string()],
            }))
            .add_type(TypeDef::Object(ObjectDef {
                name: "Cat".to_string(),
                description: None,
                fields: fields(vec![FieldDef::new("name", TypeRef::named("String"))]),
                implements: vec!["Named".to_string()],
            }))
            .add_type(TypeDef::Union(UnionDef {
                name: "Pet".to_string(),
                description: None,
                members: vec!["Dog".to_string(), "Cat".to_string()],
            }))
            .add_type(TypeDef::InputObject(InputObjectDef {
                name: "PetFilter".to_string(),
                description: None,
                fields: [
                    InputFieldDef::new("kind", TypeRef::named("Kind")),
                    InputFieldDef::new("limit", TypeRef::named("Int")),
                ]
                .into_iter()
                .map(|f| (f.name.clone(), f))
                .collect(),
            }))
            .add_type(TypeDef::Enum(EnumDef {
                name: "Kind".to_string(),
                description: None,
                values: vec!["DOG".to_string(), "CAT".to_string()],
            }))
            .build()
    }

    fn plan(selection: Vec<SelectionNode>) -> Result<QueryPlan, PlanError> {
        QueryPlanner::new().plan(&Operation::query(selection), &test_schema())
    }

    fn root_nodes(plan: &QueryPlan) -> &[PlanNode] {
        match &plan.root {
            PlanNode::Parallel(nodes) => nodes,
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn test_plan_union_fields_per_member() {
        let plan = plan(vec![SelectionNode::new("pet")
            .arg("id", json!("1"))
            .select_all(["name", "barks"])])
        .unwrap();

        let PlanNode::Field { info, children, .. } = &root_nodes(&plan)[0] else {
            panic!("expected field");
        };
        assert_eq!(info.return_type, "Pet");
        assert_eq!(info.selection.len(), 2);

        let PlanNode::Parallel(children) = children.as_ref() else {
            panic!("expected parallel children");
        };
        // name on Dog and Cat, barks on Dog only
        let conditions: Vec<&str> = children
            .iter()
            .map(|node| match node {
                PlanNode::TypeCondition { type_name, .. } => type_name.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(conditions, vec!["Dog", "Cat", "Dog"]);
    }

    #[test]
    fn test_plan_applies_default_arguments() {
        let plan = plan(vec![SelectionNode::new("named").select_all(["name"])]).unwrap();
        let PlanNode::Field { info, .. } = &root_nodes(&plan)[0] else {
            panic!("expected field");
        };
        assert_eq!(
            info.arguments,
            vec![("kind".to_string(), json!("DOG"))]
        );
    }

    #[test]
    fn test_plan_rejects_missing_required_argument() {
        let err = plan(vec![SelectionNode::new("pet").select_all(["name"])]).unwrap_err();
        assert_eq!(
            err.message,
            "Field \"pet\" argument \"id\" of type \"ID!\" is required"
        );
    }

    #[test]
    fn test_plan_rejects_unknown_field_and_argument() {
        let err = plan(vec![SelectionNode::new("nope")]).unwrap_err();
        assert_eq!(err.message, "Cannot query field \"nope\" on type \"Query\"");

        let err = plan(vec![SelectionNode::new("named")
            .arg("color", json!("red"))
            .select_all(["name"])])
        .unwrap_err();
        assert!(err.message.contains("Unknown argument \"color\""));

        let err = plan(vec![SelectionNode::new("named").select_all(["barks"])]).unwrap_err();
        assert_eq!(err.message, "Cannot query field \"barks\" on type \"Named\"");
    }

    #[test]
    fn test_plan_checks_selection_shape() {
        let err = plan(vec![SelectionNode::new("named")]).unwrap_err();
        assert!(err.message.contains("must have a selection of subfields"));

        let err = plan(vec![SelectionNode::new("named")
            .select(SelectionNode::new("name").select(SelectionNode::new("length")))])
        .unwrap_err();
        assert!(err.message.contains("must not have a selection"));
    }

    #[test]
    fn test_plan_max_depth() {
        let planner = QueryPlanner::with_config(PlannerConfig { max_depth: 1 });
        let operation = Operation::query(vec![SelectionNode::new("named").select_all(["name"])]);

        let err = planner.plan(&operation, &test_schema()).unwrap_err();
        assert_eq!(err.message, "Query depth 2 exceeds the maximum of 1");
    }

    #[test]
    fn test_plan_typename() {
        let plan = plan(vec![SelectionNode::new("__typename")]).unwrap();
        let PlanNode::Leaf { field } = &root_nodes(&plan)[0] else {
            panic!("expected leaf");
        };
        assert!(field.is_introspection);
        assert_eq!(field.parent_type, "Query");
    }

    #[test]
    fn test_plan_rejects_conflicting_fields() {
        let err = plan(vec![
            SelectionNode::new("pet").arg("id", json!("1")).select_all(["name"]),
            SelectionNode::new("pet").arg("id", json!("2")).select_all(["name"]),
        ])
        .unwrap_err();
        assert_eq!(
            err.message,
            "Fields \"pet\" conflict because they have differing arguments or subselections"
        );

        let err = plan(vec![SelectionNode::new("named")
            .select(SelectionNode::new("name"))
            .select(SelectionNode::new("name").select(SelectionNode::new("length")))])
        .unwrap_err();
        assert!(err.message.starts_with("Fields \"name\" conflict"));
    }

    #[test]
    fn test_plan_merges_identical_fields() {
        let pet = SelectionNode::new("pet").arg("id", json!("1")).select_all(["name"]);
        let plan = plan(vec![pet.clone(), SelectionNode::new("__typename"), pet]).unwrap();
        assert_eq!(root_nodes(&plan).len(), 2);
    }

    #[test]
    fn test_plan_checks_input_objects() {
        let pets = |filter| SelectionNode::new("pets").arg("filter", filter).select_all(["name"]);

        assert!(plan(vec![pets(json!({"kind": "CAT", "limit": 2}))]).is_ok());
        assert!(plan(vec![pets(json!({}))]).is_ok());

        let err = plan(vec![pets(json!({"limit": 1, "bogus": 2}))]).unwrap_err();
        assert_eq!(err.message, "Field \"bogus\" is not defined by type \"PetFilter\"");

        let err = plan(vec![pets(json!({"kind": "BIRD"}))]).unwrap_err();
        assert_eq!(err.message, "Value \"BIRD\" does not exist in \"Kind\" enum");

        let err = plan(vec![pets(json!("CAT"))]).unwrap_err();
        assert!(err.message.contains("expects an input object of type \"PetFilter\""));
    }
}
