//! Schema definition for the social graph runtime.
//!
//! The schema is plain data: the planner reads it to find field types,
//! argument defaults and the possible types of interfaces and unions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub query_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Looks up a field on an object or interface type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        match self.get_type(type_name)? {
            TypeDef::Object(o) => o.fields.get(field_name),
            TypeDef::Interface(i) => i.fields.get(field_name),
            _ => None,
        }
    }

    /// Returns true for interfaces and unions.
    pub fn is_abstract(&self, type_name: &str) -> bool {
        matches!(
            self.get_type(type_name),
            Some(TypeDef::Interface(_) | TypeDef::Union(_))
        )
    }

    /// Returns true for scalars and enums.
    pub fn is_leaf(&self, type_name: &str) -> bool {
        matches!(
            self.get_type(type_name),
            Some(TypeDef::Scalar(_) | TypeDef::Enum(_))
        )
    }

    /// Returns the object types a value of `type_name` can have at runtime.
    ///
    /// Objects are their own only possible type. Interface implementors are
    /// returned in declaration order, union members in member order.
    pub fn possible_types(&self, type_name: &str) -> Vec<&str> {
        match self.get_type(type_name) {
            Some(TypeDef::Object(o)) => vec![o.name.as_str()],
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    TypeDef::Object(o) if o.implements.iter().any(|i| i == type_name) => {
                        Some(o.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(TypeDef::Union(u)) => u.members.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// A type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    /// Returns the type name.
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Scalar(s) => &s.name,
            TypeDef::Object(o) => &o.name,
            TypeDef::Interface(i) => &i.name,
            TypeDef::Union(u) => &u.name,
            TypeDef::Enum(e) => &e.name,
            TypeDef::InputObject(i) => &i.name,
        }
    }
}

/// Scalar type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

/// Interface type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

/// Union type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

/// Enum type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

/// Input object type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputFieldDef>,
}

/// Field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputFieldDef>,
}

impl FieldDef {
    /// Creates a field without arguments.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
        }
    }

    /// Adds an argument.
    pub fn argument(mut self, arg: InputFieldDef) -> Self {
        self.arguments.insert(arg.name.clone(), arg);
        self
    }
}

/// Input field (or argument) definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl InputFieldDef {
    /// Creates an input field without a default.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Returns the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::NonNull(inner) => write!(f, "{}!", inner),
            Self::List(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// Schema builder.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        let mut builder = Self::default();
        // Add built-in scalars
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            builder.schema.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: Some(format!("Built-in {name} scalar")),
                }),
            );
        }
        builder
    }

    /// Sets the query type.
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self
    }

    /// Adds a type.
    pub fn add_type(mut self, type_def: TypeDef) -> Self {
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, implements: &[&str], fields: &[(&str, &str)]) -> TypeDef {
        TypeDef::Object(ObjectDef {
            name: name.to_string(),
            description: None,
            fields: fields
                .iter()
                .map(|(f, ty)| (f.to_string(), FieldDef::new(*f, TypeRef::named(*ty))))
                .collect(),
            implements: implements.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_schema_builder() {
        let schema = SchemaBuilder::new()
            .query_type("Query")
            .add_type(object("Query", &[], &[("hello", "String")]))
            .build();

        assert_eq!(schema.query_type, Some("Query".to_string()));
        assert!(schema.is_leaf("String"));
        assert!(schema.field("Query", "hello").is_some());
        assert!(schema.field("Query", "missing").is_none());
    }

    #[test]
    fn test_possible_types() {
        let schema = SchemaBuilder::new()
            .add_type(TypeDef::Interface(InterfaceDef {
                name: "Node".to_string(),
                description: None,
                fields: IndexMap::new(),
            }))
            .add_type(object("A", &["Node"], &[("id", "ID")]))
            .add_type(object("B", &[], &[("id", "ID")]))
            .add_type(TypeDef::Union(UnionDef {
                name: "AorB".to_string(),
                description: None,
                members: vec!["B".to_string(), "A".to_string()],
            }))
            .build();

        assert_eq!(schema.possible_types("Node"), vec!["A"]);
        assert_eq!(schema.possible_types("AorB"), vec!["B", "A"]);
        assert_eq!(schema.possible_types("A"), vec!["A"]);
        assert!(schema.is_abstract("Node"));
        assert!(!schema.is_abstract("A"));
    }

    #[test]
    fn test_named_type() {
        let ty = TypeRef::list(TypeRef::non_null(TypeRef::named("User")));
        assert_eq!(ty.named_type(), "User");
        assert_eq!(ty.to_string(), "[User!]");
    }
}
