//! Schema definitions for everything that crosses the HTTP boundary.
//!
//! Each schema is a static table of [`FieldSpec`]s walked by one generic
//! [`Schema::validate`]. The walker reports every violated field in a single
//! pass, fills in declared defaults, and passes unknown fields through
//! untouched. The same [`FieldKind`] rules back the contract registry's path
//! and query parameter checks.

use std::fmt;

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Validation rule attached to a single declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Syntactically valid UUID, any version.
    Uuid,
    /// Syntactically valid email address.
    Email,
    /// String with an inclusive character-count range.
    Str { min: usize, max: usize },
    /// Unrestricted string.
    Text,
    /// Boolean; `default` is inserted when the field is absent.
    Bool { default: Option<bool> },
    /// ISO-8601 datetime string, offset required.
    DateTime,
}

/// One declared field of a schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// A named set of field rules. Schemas are `static` and never change after
/// startup.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A single violated field and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Every rule violation found in one validation pass. Never partial: all
/// violated fields are reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl Schema {
    /// Checks `value` against every declared field and returns the accepted
    /// object with defaults filled in. Unknown fields pass through untouched.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError::single("body", "must be a JSON object"));
        };
        let mut accepted = object.clone();
        let mut violations = Vec::new();
        for field in self.fields {
            match object.get(field.name) {
                None => {
                    if let FieldKind::Bool { default: Some(default) } = field.kind {
                        accepted.insert(field.name.to_string(), Value::Bool(default));
                    } else if field.required {
                        violations.push(FieldViolation::new(field.name, "is required"));
                    }
                }
                Some(present) => {
                    if let Err(message) = check_value(field.kind, present) {
                        violations.push(FieldViolation::new(field.name, message));
                    }
                }
            }
        }
        if violations.is_empty() {
            Ok(Value::Object(accepted))
        } else {
            Err(ValidationError { violations })
        }
    }
}

fn check_value(kind: FieldKind, value: &Value) -> Result<(), String> {
    match kind {
        FieldKind::Bool { .. } => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err("must be a boolean".to_string())
            }
        }
        _ => match value.as_str() {
            Some(raw) => check_str(kind, raw),
            None => Err("must be a string".to_string()),
        },
    }
}

/// Rule check over a raw string, shared with path/query parameter validation
/// where every incoming value is a string.
pub(crate) fn check_str(kind: FieldKind, raw: &str) -> Result<(), String> {
    match kind {
        FieldKind::Uuid => Uuid::parse_str(raw)
            .map(|_| ())
            .map_err(|_| "must be a valid UUID".to_string()),
        FieldKind::Email => {
            if EMAIL_RE.is_match(raw) {
                Ok(())
            } else {
                Err("must be a valid email address".to_string())
            }
        }
        FieldKind::Str { min, max } => {
            let len = raw.chars().count();
            if len < min {
                Err(if min == 1 {
                    "must not be empty".to_string()
                } else {
                    format!("must be at least {min} characters")
                })
            } else if len > max {
                Err(format!("must be at most {max} characters"))
            } else {
                Ok(())
            }
        }
        FieldKind::Text => Ok(()),
        FieldKind::Bool { .. } => match raw {
            "true" | "false" => Ok(()),
            _ => Err("must be a boolean".to_string()),
        },
        FieldKind::DateTime => DateTime::parse_from_rfc3339(raw)
            .map(|_| ())
            .map_err(|_| "must be an ISO-8601 datetime with offset".to_string()),
    }
}

pub static USER: Schema = Schema {
    name: "User",
    fields: &[
        FieldSpec { name: "id", kind: FieldKind::Uuid, required: true },
        FieldSpec { name: "email", kind: FieldKind::Email, required: true },
        FieldSpec { name: "name", kind: FieldKind::Str { min: 1, max: 100 }, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::DateTime, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::DateTime, required: true },
    ],
};

pub static CREATE_USER_REQUEST: Schema = Schema {
    name: "CreateUserRequest",
    fields: &[
        FieldSpec { name: "email", kind: FieldKind::Email, required: true },
        FieldSpec { name: "name", kind: FieldKind::Str { min: 1, max: 100 }, required: true },
    ],
};

pub static UPDATE_USER_REQUEST: Schema = Schema {
    name: "UpdateUserRequest",
    fields: &[
        FieldSpec { name: "email", kind: FieldKind::Email, required: false },
        FieldSpec { name: "name", kind: FieldKind::Str { min: 1, max: 100 }, required: false },
    ],
};

pub static POST: Schema = Schema {
    name: "Post",
    fields: &[
        FieldSpec { name: "id", kind: FieldKind::Uuid, required: true },
        FieldSpec { name: "title", kind: FieldKind::Str { min: 1, max: 200 }, required: true },
        FieldSpec { name: "content", kind: FieldKind::Text, required: true },
        FieldSpec { name: "published", kind: FieldKind::Bool { default: None }, required: true },
        FieldSpec { name: "authorId", kind: FieldKind::Uuid, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::DateTime, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::DateTime, required: true },
    ],
};

pub static CREATE_POST_REQUEST: Schema = Schema {
    name: "CreatePostRequest",
    fields: &[
        FieldSpec { name: "title", kind: FieldKind::Str { min: 1, max: 200 }, required: true },
        FieldSpec { name: "content", kind: FieldKind::Text, required: true },
        FieldSpec { name: "published", kind: FieldKind::Bool { default: Some(false) }, required: false },
        FieldSpec { name: "authorId", kind: FieldKind::Uuid, required: true },
    ],
};

pub static UPDATE_POST_REQUEST: Schema = Schema {
    name: "UpdatePostRequest",
    fields: &[
        FieldSpec { name: "title", kind: FieldKind::Str { min: 1, max: 200 }, required: false },
        FieldSpec { name: "content", kind: FieldKind::Text, required: false },
        FieldSpec { name: "published", kind: FieldKind::Bool { default: None }, required: false },
    ],
};

pub static ERROR_RESPONSE: Schema = Schema {
    name: "ErrorResponse",
    fields: &[
        FieldSpec { name: "message", kind: FieldKind::Text, required: true },
        FieldSpec { name: "code", kind: FieldKind::Text, required: false },
    ],
};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::models::Post;

    #[test]
    fn accepts_a_valid_create_user_request() {
        let accepted = CREATE_USER_REQUEST
            .validate(&json!({ "email": "ada@example.com", "name": "Ada Lovelace" }))
            .expect("valid request");
        assert_eq!(accepted["email"], "ada@example.com");
        assert_eq!(accepted["name"], "Ada Lovelace");
    }

    #[test]
    fn reports_every_violation_in_one_pass() {
        let err = CREATE_USER_REQUEST
            .validate(&json!({ "email": "not-an-email", "name": "" }))
            .unwrap_err();
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
        let rendered = err.to_string();
        assert!(rendered.contains("email must be a valid email address"));
        assert!(rendered.contains("name must not be empty"));
    }

    #[test]
    fn missing_required_fields_are_violations() {
        let err = CREATE_USER_REQUEST.validate(&json!({})).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.violations.iter().all(|v| v.message == "is required"));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let accepted = CREATE_USER_REQUEST
            .validate(&json!({
                "email": "ada@example.com",
                "name": "Ada",
                "nickname": "countess"
            }))
            .expect("extra fields are not an error");
        assert_eq!(accepted["nickname"], "countess");
    }

    #[test]
    fn non_object_body_is_a_single_violation() {
        let err = CREATE_USER_REQUEST.validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "body");
    }

    #[test]
    fn create_post_defaults_published_to_false() {
        let author = Uuid::new_v4();
        let accepted = CREATE_POST_REQUEST
            .validate(&json!({
                "title": "Hello",
                "content": "World",
                "authorId": author.to_string()
            }))
            .expect("valid request");
        assert_eq!(accepted["published"], json!(false));
    }

    #[test]
    fn create_post_keeps_an_explicit_published_flag() {
        let accepted = CREATE_POST_REQUEST
            .validate(&json!({
                "title": "Hello",
                "content": "World",
                "published": true,
                "authorId": Uuid::new_v4().to_string()
            }))
            .expect("valid request");
        assert_eq!(accepted["published"], json!(true));
    }

    #[test]
    fn update_variant_accepts_an_empty_object() {
        assert!(UPDATE_USER_REQUEST.validate(&json!({})).is_ok());
        assert!(UPDATE_POST_REQUEST.validate(&json!({})).is_ok());
    }

    #[test]
    fn update_variant_revalidates_present_fields() {
        let err = UPDATE_USER_REQUEST
            .validate(&json!({ "email": "nope" }))
            .unwrap_err();
        assert_eq!(err.violations[0].field, "email");
    }

    #[test]
    fn null_is_not_absent() {
        let err = UPDATE_USER_REQUEST
            .validate(&json!({ "name": null }))
            .unwrap_err();
        assert_eq!(err.violations[0].message, "must be a string");
    }

    #[test]
    fn datetime_requires_an_offset() {
        let base = json!({
            "id": Uuid::new_v4().to_string(),
            "email": "ada@example.com",
            "name": "Ada",
            "updatedAt": "2024-05-01T10:00:00Z"
        });

        let mut missing_offset = base.clone();
        missing_offset["createdAt"] = json!("2024-05-01T10:00:00");
        let err = USER.validate(&missing_offset).unwrap_err();
        assert_eq!(err.violations[0].field, "createdAt");

        let mut zulu = base.clone();
        zulu["createdAt"] = json!("2024-05-01T10:00:00Z");
        assert!(USER.validate(&zulu).is_ok());

        let mut numeric_offset = base;
        numeric_offset["createdAt"] = json!("2024-05-01T10:00:00+02:00");
        assert!(USER.validate(&numeric_offset).is_ok());
    }

    #[test]
    fn uuid_rule_accepts_any_version() {
        // v4 and a v1-style value both parse.
        assert!(check_str(FieldKind::Uuid, &Uuid::new_v4().to_string()).is_ok());
        assert!(check_str(FieldKind::Uuid, "6ba7b810-9dad-11d1-80b4-00c04fd430c8").is_ok());
        assert!(check_str(FieldKind::Uuid, "definitely-not-a-uuid").is_err());
    }

    #[test]
    fn title_length_bounds_are_inclusive() {
        let author = Uuid::new_v4().to_string();
        let at_limit = json!({
            "title": "x".repeat(200),
            "content": "",
            "authorId": author
        });
        assert!(CREATE_POST_REQUEST.validate(&at_limit).is_ok());

        let over_limit = json!({
            "title": "x".repeat(201),
            "content": "",
            "authorId": Uuid::new_v4().to_string()
        });
        let err = CREATE_POST_REQUEST.validate(&over_limit).unwrap_err();
        assert_eq!(err.violations[0].message, "must be at most 200 characters");
    }

    #[test]
    fn wrong_types_are_violations() {
        let err = CREATE_POST_REQUEST
            .validate(&json!({
                "title": 42,
                "content": "World",
                "published": "yes",
                "authorId": Uuid::new_v4().to_string()
            }))
            .unwrap_err();
        let by_field: Vec<(&str, &str)> = err
            .violations
            .iter()
            .map(|v| (v.field.as_str(), v.message.as_str()))
            .collect();
        assert_eq!(
            by_field,
            vec![("title", "must be a string"), ("published", "must be a boolean")]
        );
    }

    #[test]
    fn post_round_trips_through_the_response_schema() {
        let post = Post {
            id: Uuid::new_v4(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            published: true,
            author_id: Uuid::new_v4(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        };
        let serialized = serde_json::to_value(&post).expect("post serializes");
        let accepted = POST.validate(&serialized).expect("serialized post conforms");
        let parsed: Post = serde_json::from_value(accepted).expect("accepted value parses");
        assert_eq!(parsed, post);
    }
}
