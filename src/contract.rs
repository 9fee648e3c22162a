//! The contract registry: one static table describing every operation the
//! API exposes — method, path template, parameter rules, input schema, and
//! the response schema per declared status code.
//!
//! The server handlers validate incoming requests against this table and the
//! typed client builds its requests from the same entries, so the two sides
//! cannot drift apart. The table also renders as an OpenAPI document (served
//! at `/openapi.json`) for external tooling.

use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::schema::{self, FieldKind, Schema, ValidationError};

/// Stable identifier for each operation, named after its alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationId {
    GetPosts,
    CreatePost,
    GetPostById,
    UpdatePost,
    DeletePost,
    GetUsers,
    CreateUser,
    GetUserById,
    UpdateUser,
    DeleteUser,
    GetUserPosts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Rule for one path or query parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Payload shape declared for a status code.
#[derive(Debug, Clone, Copy)]
pub enum Payload {
    Empty,
    One(&'static Schema),
    ListOf(&'static Schema),
}

/// An error status the operation is declared to return.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSpec {
    pub status: u16,
    pub schema: &'static Schema,
}

/// One operation: everything the server needs to validate a request and
/// everything the client needs to build one. Entries live in [`OPERATIONS`]
/// and never change after startup.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub id: OperationId,
    /// Operation alias; doubles as the OpenAPI operationId.
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path template with `{name}` parameters.
    pub path: &'static str,
    pub path_params: &'static [ParamSpec],
    pub query_params: &'static [ParamSpec],
    /// Request body schema for create/update operations.
    pub request: Option<&'static Schema>,
    pub success: u16,
    pub response: Payload,
    pub errors: &'static [ErrorSpec],
}

const ID_PARAM: ParamSpec = ParamSpec { name: "id", kind: FieldKind::Uuid, required: true };

pub static OPERATIONS: [OperationSpec; 11] = [
    OperationSpec {
        id: OperationId::GetPosts,
        name: "getPosts",
        method: HttpMethod::Get,
        path: "/posts",
        path_params: &[],
        query_params: &[ParamSpec {
            name: "published",
            kind: FieldKind::Bool { default: None },
            required: false,
        }],
        request: None,
        success: 200,
        response: Payload::ListOf(&schema::POST),
        errors: &[],
    },
    OperationSpec {
        id: OperationId::CreatePost,
        name: "createPost",
        method: HttpMethod::Post,
        path: "/posts",
        path_params: &[],
        query_params: &[],
        request: Some(&schema::CREATE_POST_REQUEST),
        success: 201,
        response: Payload::One(&schema::POST),
        errors: &[ErrorSpec { status: 400, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::GetPostById,
        name: "getPostById",
        method: HttpMethod::Get,
        path: "/posts/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: None,
        success: 200,
        response: Payload::One(&schema::POST),
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::UpdatePost,
        name: "updatePost",
        method: HttpMethod::Put,
        path: "/posts/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: Some(&schema::UPDATE_POST_REQUEST),
        success: 200,
        response: Payload::One(&schema::POST),
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::DeletePost,
        name: "deletePost",
        method: HttpMethod::Delete,
        path: "/posts/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: None,
        success: 204,
        response: Payload::Empty,
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::GetUsers,
        name: "getUsers",
        method: HttpMethod::Get,
        path: "/users",
        path_params: &[],
        query_params: &[],
        request: None,
        success: 200,
        response: Payload::ListOf(&schema::USER),
        errors: &[],
    },
    OperationSpec {
        id: OperationId::CreateUser,
        name: "createUser",
        method: HttpMethod::Post,
        path: "/users",
        path_params: &[],
        query_params: &[],
        request: Some(&schema::CREATE_USER_REQUEST),
        success: 201,
        response: Payload::One(&schema::USER),
        errors: &[ErrorSpec { status: 400, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::GetUserById,
        name: "getUserById",
        method: HttpMethod::Get,
        path: "/users/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: None,
        success: 200,
        response: Payload::One(&schema::USER),
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::UpdateUser,
        name: "updateUser",
        method: HttpMethod::Put,
        path: "/users/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: Some(&schema::UPDATE_USER_REQUEST),
        success: 200,
        response: Payload::One(&schema::USER),
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::DeleteUser,
        name: "deleteUser",
        method: HttpMethod::Delete,
        path: "/users/{id}",
        path_params: &[ID_PARAM],
        query_params: &[],
        request: None,
        success: 204,
        response: Payload::Empty,
        errors: &[ErrorSpec { status: 404, schema: &schema::ERROR_RESPONSE }],
    },
    OperationSpec {
        id: OperationId::GetUserPosts,
        name: "getUserPosts",
        method: HttpMethod::Get,
        path: "/users/{userId}/posts",
        path_params: &[ParamSpec { name: "userId", kind: FieldKind::Uuid, required: true }],
        query_params: &[],
        request: None,
        success: 200,
        response: Payload::ListOf(&schema::POST),
        errors: &[],
    },
];

/// Looks up the table entry for an operation id.
pub fn get(id: OperationId) -> &'static OperationSpec {
    OPERATIONS
        .iter()
        .find(|op| op.id == id)
        .expect("every OperationId has a table entry")
}

/// Looks up the table entry for a (method, path template) pair.
pub fn lookup(method: HttpMethod, path_template: &str) -> Option<&'static OperationSpec> {
    OPERATIONS
        .iter()
        .find(|op| op.method == method && op.path == path_template)
}

impl OperationSpec {
    /// Validates a request body against the declared input schema.
    pub fn validate_body(&self, body: &Value) -> Result<Value, ValidationError> {
        match self.request {
            Some(request) => request.validate(body),
            None => Ok(body.clone()),
        }
    }

    /// Validates a raw path parameter against its declared UUID rule and
    /// parses it.
    pub fn parse_path_uuid(&self, name: &str, raw: &str) -> Result<Uuid, ValidationError> {
        let declared = self
            .path_params
            .iter()
            .any(|p| p.name == name && p.kind == FieldKind::Uuid);
        if !declared {
            return Err(ValidationError::single(name, "is not a declared path parameter"));
        }
        Uuid::parse_str(raw).map_err(|_| ValidationError::single(name, "must be a valid UUID"))
    }

    /// Parses the declared boolean query parameter `name`, if supplied.
    pub fn parse_query_bool(
        &self,
        name: &str,
        raw: Option<&str>,
    ) -> Result<Option<bool>, ValidationError> {
        let Some(param) = self.query_params.iter().find(|p| p.name == name) else {
            return Err(ValidationError::single(name, "is not a declared query parameter"));
        };
        match raw {
            None if param.required => Err(ValidationError::single(name, "is required")),
            None => Ok(None),
            Some(raw) => {
                schema::check_str(param.kind, raw)
                    .map_err(|message| ValidationError::single(name, message))?;
                Ok(Some(raw == "true"))
            }
        }
    }

    /// Substitutes named path parameters into the template, percent-encoding
    /// each value.
    pub fn render_path(&self, params: &[(&str, String)]) -> String {
        let mut rendered = self.path.to_string();
        for (name, value) in params {
            let placeholder = format!("{{{name}}}");
            rendered = rendered.replace(&placeholder, &urlencoding::encode(value));
        }
        rendered
    }
}

/// The registry rendered as an OpenAPI 3.0 document.
pub static DOCUMENT: Lazy<Value> = Lazy::new(build_document);

const DOCUMENT_SCHEMAS: [&Schema; 7] = [
    &schema::USER,
    &schema::CREATE_USER_REQUEST,
    &schema::UPDATE_USER_REQUEST,
    &schema::POST,
    &schema::CREATE_POST_REQUEST,
    &schema::UPDATE_POST_REQUEST,
    &schema::ERROR_RESPONSE,
];

fn build_document() -> Value {
    let mut paths: Map<String, Value> = Map::new();
    for op in &OPERATIONS {
        let methods = paths.entry(op.path.to_string()).or_insert_with(|| json!({}));
        if let Value::Object(map) = methods {
            map.insert(op.method.as_str().to_ascii_lowercase(), operation_object(op));
        }
    }

    let mut schemas: Map<String, Value> = Map::new();
    for definition in DOCUMENT_SCHEMAS {
        schemas.insert(definition.name.to_string(), schema_object(definition));
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Miniblog API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": { "schemas": schemas },
    })
}

fn operation_object(op: &OperationSpec) -> Value {
    let mut object = Map::new();
    object.insert("operationId".to_string(), json!(op.name));

    let parameters: Vec<Value> = op
        .path_params
        .iter()
        .map(|p| param_object(p, "path"))
        .chain(op.query_params.iter().map(|p| param_object(p, "query")))
        .collect();
    if !parameters.is_empty() {
        object.insert("parameters".to_string(), Value::Array(parameters));
    }

    if let Some(request) = op.request {
        object.insert(
            "requestBody".to_string(),
            json!({
                "required": true,
                "content": { "application/json": { "schema": schema_ref(request) } },
            }),
        );
    }

    let mut responses = Map::new();
    responses.insert(op.success.to_string(), response_object(op.response));
    for declared in op.errors {
        responses.insert(
            declared.status.to_string(),
            response_object(Payload::One(declared.schema)),
        );
    }
    object.insert("responses".to_string(), Value::Object(responses));

    Value::Object(object)
}

fn response_object(payload: Payload) -> Value {
    match payload {
        Payload::Empty => json!({ "description": "No Content" }),
        Payload::One(definition) => json!({
            "description": definition.name,
            "content": { "application/json": { "schema": schema_ref(definition) } },
        }),
        Payload::ListOf(definition) => json!({
            "description": format!("Array of {}", definition.name),
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": schema_ref(definition) },
                },
            },
        }),
    }
}

fn param_object(param: &ParamSpec, location: &str) -> Value {
    json!({
        "name": param.name,
        "in": location,
        "required": param.required,
        "schema": field_object(param.kind),
    })
}

fn field_object(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Uuid => json!({ "type": "string", "format": "uuid" }),
        FieldKind::Email => json!({ "type": "string", "format": "email" }),
        FieldKind::Str { min, max } => {
            json!({ "type": "string", "minLength": min, "maxLength": max })
        }
        FieldKind::Text => json!({ "type": "string" }),
        FieldKind::Bool { default: None } => json!({ "type": "boolean" }),
        FieldKind::Bool { default: Some(default) } => {
            json!({ "type": "boolean", "default": default })
        }
        FieldKind::DateTime => json!({ "type": "string", "format": "date-time" }),
    }
}

fn schema_ref(definition: &Schema) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", definition.name) })
}

fn schema_object(definition: &Schema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in definition.fields {
        properties.insert(field.name.to_string(), field_object(field.kind));
        if field.required {
            required.push(json!(field.name));
        }
    }
    let mut object = Map::new();
    object.insert("type".to_string(), json!("object"));
    object.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        object.insert("required".to_string(), Value::Array(required));
    }
    // Unknown extra fields are accepted, so the document says so.
    object.insert("additionalProperties".to_string(), json!(true));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_is_addressable_both_ways() {
        for op in &OPERATIONS {
            assert_eq!(get(op.id).name, op.name);
            let found = lookup(op.method, op.path).expect("template lookup resolves");
            assert_eq!(found.id, op.id);
        }
    }

    #[test]
    fn lookup_misses_on_unknown_templates() {
        assert!(lookup(HttpMethod::Get, "/nope").is_none());
        assert!(lookup(HttpMethod::Delete, "/posts").is_none());
    }

    #[test]
    fn create_operations_declare_400_and_lookups_declare_404() {
        for op in [OperationId::CreateUser, OperationId::CreatePost] {
            assert_eq!(get(op).errors[0].status, 400);
        }
        for op in [
            OperationId::GetUserById,
            OperationId::UpdateUser,
            OperationId::DeleteUser,
            OperationId::GetPostById,
            OperationId::UpdatePost,
            OperationId::DeletePost,
        ] {
            assert_eq!(get(op).errors[0].status, 404);
        }
        for op in [OperationId::GetUsers, OperationId::GetPosts, OperationId::GetUserPosts] {
            assert!(get(op).errors.is_empty());
        }
    }

    #[test]
    fn render_path_substitutes_named_parameters() {
        let op = get(OperationId::GetUserPosts);
        let rendered = op.render_path(&[("userId", "abc 123".to_string())]);
        assert_eq!(rendered, "/users/abc%20123/posts");
    }

    #[test]
    fn parse_path_uuid_validates_shape() {
        let op = get(OperationId::GetUserById);
        assert!(op.parse_path_uuid("id", "not-a-uuid").is_err());
        assert!(op.parse_path_uuid("other", "not-declared").is_err());
        let id = uuid::Uuid::new_v4();
        assert_eq!(op.parse_path_uuid("id", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_query_bool_accepts_true_false_only() {
        let op = get(OperationId::GetPosts);
        assert_eq!(op.parse_query_bool("published", None).unwrap(), None);
        assert_eq!(op.parse_query_bool("published", Some("true")).unwrap(), Some(true));
        assert_eq!(op.parse_query_bool("published", Some("false")).unwrap(), Some(false));
        assert!(op.parse_query_bool("published", Some("yes")).is_err());
        assert!(op.parse_query_bool("undeclared", Some("true")).is_err());
    }

    #[test]
    fn document_covers_every_path_and_schema() {
        let document: &Value = &DOCUMENT;
        let paths = document["paths"].as_object().expect("paths object");
        for template in ["/users", "/users/{id}", "/users/{userId}/posts", "/posts", "/posts/{id}"] {
            assert!(paths.contains_key(template), "missing {template}");
        }
        let schemas = document["components"]["schemas"]
            .as_object()
            .expect("schemas object");
        assert_eq!(schemas.len(), DOCUMENT_SCHEMAS.len());
        assert_eq!(schemas["CreatePostRequest"]["properties"]["published"]["default"], json!(false));
        assert_eq!(
            document["paths"]["/users"]["post"]["responses"]["400"]["content"]["application/json"]
                ["schema"]["$ref"],
            json!("#/components/schemas/ErrorResponse")
        );
    }
}
