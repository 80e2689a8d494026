//! Field schemas for the provider, its resources and data sources.
//!
//! Schemas describe the shape of declarative configuration. The runtime uses
//! them for planning and documentation; the provider uses them to validate
//! planned state before any request is sent (see [`crate::validation`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<AttributeType>),
    /// A nested object with its own attributes.
    Object(BTreeMap<String, Attribute>),
}

impl AttributeType {
    /// Create a list type.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// Create an object type from `(name, attribute)` pairs.
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self::Object(
            attributes
                .into_iter()
                .map(|(name, attr)| (name.into(), attr))
                .collect(),
        )
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The attribute is required in configuration.
    pub required: bool,
    /// The attribute is optional in configuration.
    pub optional: bool,
    /// The attribute is set by the control plane.
    pub computed: bool,
    /// The attribute is hidden in logs and plan output.
    pub sensitive: bool,
}

/// Describes a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Flags describing how the attribute can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Changing this attribute forces replacement of the resource.
    #[serde(default)]
    pub force_new: bool,
    /// Default value applied by the control plane when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// The permitted values for string attributes (and string list elements).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl Attribute {
    fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
            default: None,
            allowed_values: Vec::new(),
        }
    }

    /// A required attribute of the given type.
    pub fn required(attr_type: AttributeType) -> Self {
        Self::new(
            attr_type,
            AttributeFlags {
                required: true,
                ..Default::default()
            },
        )
    }

    /// An optional attribute of the given type.
    pub fn optional(attr_type: AttributeType) -> Self {
        Self::new(
            attr_type,
            AttributeFlags {
                optional: true,
                ..Default::default()
            },
        )
    }

    /// A read-only attribute set by the control plane.
    pub fn computed(attr_type: AttributeType) -> Self {
        Self::new(
            attr_type,
            AttributeFlags {
                computed: true,
                ..Default::default()
            },
        )
    }

    /// An optional attribute that the control plane fills in when unset.
    pub fn optional_computed(attr_type: AttributeType) -> Self {
        Self::new(
            attr_type,
            AttributeFlags {
                optional: true,
                computed: true,
                ..Default::default()
            },
        )
    }

    /// A required string attribute.
    pub fn required_string() -> Self {
        Self::required(AttributeType::String)
    }

    /// An optional string attribute.
    pub fn optional_string() -> Self {
        Self::optional(AttributeType::String)
    }

    /// A computed string attribute.
    pub fn computed_string() -> Self {
        Self::computed(AttributeType::String)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Changing this attribute replaces the resource.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict the attribute to `values`.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Whether the attribute is only ever set by the control plane.
    pub fn is_computed_only(&self) -> bool {
        self.flags.computed && !self.flags.optional && !self.flags.required
    }
}

/// Schema for a resource, a data source or the provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// The schema version (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attributes by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// An empty schema at version 0.
    pub fn v0() -> Self {
        Self::default()
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Add the computed `id` attribute every resource carries.
    pub fn with_id(self, description: impl Into<String>) -> Self {
        self.with_attribute(
            crate::state::ID_ATTRIBUTE,
            Attribute::computed_string().with_description(description),
        )
    }
}

/// Schema of the whole provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Provider configuration schema.
    #[serde(default)]
    pub provider: Schema,
    /// Resource schemas by type name.
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    /// Data source schemas by type name.
    #[serde(default)]
    pub data_sources: BTreeMap<String, Schema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_flags() {
        let required = Attribute::required_string();
        assert!(required.flags.required);
        assert!(!required.is_computed_only());

        let computed = Attribute::computed_string();
        assert!(computed.is_computed_only());

        let both = Attribute::optional_computed(AttributeType::Bool);
        assert!(both.flags.optional && both.flags.computed);
        assert!(!both.is_computed_only());

        assert!(Attribute::optional_string().sensitive().flags.sensitive);
    }

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required(AttributeType::list(AttributeType::String))
            .with_description("Repository types served by the listener")
            .with_allowed_values(["mysql", "postgresql"])
            .with_force_new();

        assert_eq!(attr.attr_type, AttributeType::List(Box::new(AttributeType::String)));
        assert_eq!(attr.allowed_values, vec!["mysql", "postgresql"]);
        assert!(attr.force_new);
    }

    #[test]
    fn test_schema_builder() {
        let schema = Schema::v0()
            .with_description("A sidecar")
            .with_id("Sidecar identifier")
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "address",
                Attribute::optional(AttributeType::object([
                    ("host", Attribute::optional_string()),
                    ("port", Attribute::required(AttributeType::Int64)),
                ])),
            );

        assert_eq!(schema.version, 0);
        assert!(schema.attributes["id"].is_computed_only());
        match &schema.attributes["address"].attr_type {
            AttributeType::Object(fields) => assert!(fields["port"].flags.required),
            other => panic!("unexpected type {:?}", other),
        }
    }

    #[test]
    fn test_schema_serialization() {
        let schema = Schema::v0().with_attribute(
            "deployment_method",
            Attribute::required_string()
                .with_allowed_values(["docker"])
                .with_default(json!("docker")),
        );
        let json = serde_json::to_value(&schema).unwrap();
        let attr = &json["attributes"]["deployment_method"];
        assert_eq!(attr["type"], "string");
        assert_eq!(attr["required"], true);
        assert_eq!(attr["allowed_values"], json!(["docker"]));
        assert_eq!(attr["default"], "docker");
    }
}
