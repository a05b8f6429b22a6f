//! The social graph schema, as SDL and as runtime type definitions.

use indexmap::IndexMap;
use serde_json::json;
use social_runtime::schema::{
    EnumDef, FieldDef, InputFieldDef, InputObjectDef, InterfaceDef, ObjectDef, ScalarDef, UnionDef,
};
use social_runtime::{Schema, SchemaBuilder, TypeDef, TypeRef};

/// Schema definition language for the social graph.
pub const SDL: &str = r#"schema {
  query: Query
}

type Query {
  admin(id: ID!, role: Role = ADMIN): Admin!
  user(id: ID!): User!
  search(text: String!): [SearchResult]!
}

interface Admin {
  id: ID!
  name: String!
  role: Role!
}

scalar Time

type User implements Admin {
  id: ID!
  name: String!
  email: String!
  role: Role!
  phone: String!
  address: [String!]
  friends(page: Pagination): [User]
  createdAt: Time!
}

input Pagination {
  first: Int
  last: Int
}

enum Role {
  ADMIN
  USER
}

union SearchResult = User
"#;

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

fn required(name: &str) -> TypeRef {
    TypeRef::non_null(named(name))
}

fn fields(defs: impl IntoIterator<Item = FieldDef>) -> IndexMap<String, FieldDef> {
    defs.into_iter().map(|f| (f.name.clone(), f)).collect()
}

fn admin_fields() -> [FieldDef; 3] {
    [
        FieldDef::new("id", required("ID")),
        FieldDef::new("name", required("String")),
        FieldDef::new("role", required("Role")),
    ]
}

/// Builds the runtime schema matching [`SDL`].
pub fn schema() -> Schema {
    let query = ObjectDef {
        name: "Query".to_string(),
        description: None,
        fields: fields([
            FieldDef::new("admin", required("Admin"))
                .argument(InputFieldDef::new("id", required("ID")))
                .argument(InputFieldDef::new("role", named("Role")).with_default(json!("ADMIN"))),
            FieldDef::new("user", required("User"))
                .argument(InputFieldDef::new("id", required("ID"))),
            FieldDef::new(
                "search",
                TypeRef::non_null(TypeRef::list(named("SearchResult"))),
            )
            .argument(InputFieldDef::new("text", required("String"))),
        ]),
        implements: Vec::new(),
    };

    let admin = InterfaceDef {
        name: "Admin".to_string(),
        description: None,
        fields: fields(admin_fields()),
    };

    let user = ObjectDef {
        name: "User".to_string(),
        description: None,
        fields: fields(admin_fields().into_iter().chain([
            FieldDef::new("email", required("String")),
            FieldDef::new("phone", required("String")),
            FieldDef::new("address", TypeRef::list(required("String"))),
            FieldDef::new("friends", TypeRef::list(named("User")))
                .argument(InputFieldDef::new("page", named("Pagination"))),
            FieldDef::new("createdAt", required("Time")),
        ])),
        implements: vec!["Admin".to_string()],
    };

    let pagination = InputObjectDef {
        name: "Pagination".to_string(),
        description: None,
        fields: ["first", "last"]
            .into_iter()
            .map(|name| (name.to_string(), InputFieldDef::new(name, named("Int"))))
            .collect(),
    };

    SchemaBuilder::new()
        .query_type("Query")
        .add_type(TypeDef::Object(query))
        .add_type(TypeDef::Interface(admin))
        .add_type(TypeDef::Scalar(ScalarDef {
            name: "Time".to_string(),
            description: Some("RFC 3339 timestamp".to_string()),
        }))
        .add_type(TypeDef::Object(user))
        .add_type(TypeDef::InputObject(pagination))
        .add_type(TypeDef::Enum(EnumDef {
            name: "Role".to_string(),
            description: None,
            values: vec!["ADMIN".to_string(), "USER".to_string()],
        }))
        .add_type(TypeDef::Union(UnionDef {
            name: "SearchResult".to_string(),
            description: None,
            members: vec!["User".to_string()],
        }))
        .build()
}
