//! Schema validation.
//!
//! Planned state is checked against the resource schema before any request is
//! sent to the control plane, so enum and presence violations surface as
//! attribute-level diagnostics rather than as opaque HTTP 400s.
//!
//! # Example
//!
//! ```
//! use controlplane_provider::schema::{Attribute, Schema};
//! use controlplane_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "deployment_method",
//!     Attribute::required_string().with_allowed_values(["docker", "helm3"]),
//! );
//!
//! assert!(validate(&schema, &json!({"deployment_method": "helm3"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"deployment_method": "ansible"}));
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("deployment_method"));
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::diagnostics::Diagnostic;
use crate::schema::{Attribute, AttributeType, Schema};

/// Validate `value` against `schema`, returning one diagnostic per violation.
///
/// - required attributes must be present and non-null
/// - computed-only attributes are not checked (the control plane sets them)
/// - types must match, recursively through lists and objects
/// - string values must be among `allowed_values` when those are declared
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    match value {
        Value::Object(obj) => validate_attributes(&schema.attributes, obj, "", &mut diagnostics),
        Value::Null => validate_attributes(&schema.attributes, &Map::new(), "", &mut diagnostics),
        other => diagnostics.push(
            Diagnostic::error("Expected object").with_detail(format!("Got {}", type_name(other))),
        ),
    }
    diagnostics
}

/// Like [`validate`], returning `Err` with the diagnostics if any were found.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

fn validate_attributes(
    attributes: &BTreeMap<String, Attribute>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr) in attributes {
        if attr.is_computed_only() {
            continue;
        }
        let attr_path = join_path(path, name);
        match obj.get(name) {
            None | Some(Value::Null) => {
                if attr.flags.required {
                    diagnostics.push(
                        Diagnostic::error(format!("Missing required attribute '{}'", attr_path))
                            .with_attribute(attr_path),
                    );
                }
            },
            Some(value) => validate_value(attr, &attr.attr_type, value, &attr_path, diagnostics),
        }
    }
}

fn validate_value(
    attr: &Attribute,
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => match value.as_str() {
            Some(s) => check_allowed(attr, s, path, diagnostics),
            None => diagnostics.push(type_error(path, "string", value)),
        },
        AttributeType::Int64 => {
            if value.as_i64().is_none() {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    validate_value(attr, element_type, item, &item_path, diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "list", value)),
        },
        AttributeType::Object(fields) => match value.as_object() {
            Some(obj) => validate_attributes(fields, obj, path, diagnostics),
            None => diagnostics.push(type_error(path, "object", value)),
        },
    }
}

fn check_allowed(attr: &Attribute, value: &str, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    if attr.allowed_values.is_empty() || attr.allowed_values.iter().any(|v| v == value) {
        return;
    }
    diagnostics.push(
        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
            .with_detail(format!(
                "Expected one of [{}], got '{}'",
                attr.allowed_values.join(", "),
                value
            ))
            .with_attribute(path),
    );
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, type_name(got)))
        .with_attribute(path)
}
