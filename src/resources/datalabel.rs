//! `cp_datalabel`: a custom data label. Labels are keyed by name, so create
//! and update are the same idempotent `PUT`.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::{CreateResource, DeleteResource, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
use crate::policy::ErrorPolicy;
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceState;

/// Resource type name.
pub const TYPE_NAME: &str = "cp_datalabel";

/// Supported classification rule types.
pub const RULE_TYPES: &[&str] = &["UNKNOWN", "REGO"];

/// Supported classification rule statuses.
pub const RULE_STATUSES: &[&str] = &["ENABLED", "DISABLED"];

/// Rule that classifies data under this label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Rule language.
    pub rule_type: String,
    /// Rule source.
    #[serde(default)]
    pub rule_code: String,
    /// Whether the rule is active.
    pub rule_status: String,
}

/// Declarative configuration of a data label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLabelState {
    /// Label name, also the id.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Classification rule.
    #[serde(default)]
    pub classification_rule: Option<ClassificationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRule {
    rule_type: String,
    #[serde(default)]
    rule_code: String,
    rule_status: String,
}

/// Wire representation of a data label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLabel {
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classification_rule: Option<WireRule>,
}

impl RequestData for DataLabel {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        let label: DataLabelState = state.decode()?;
        Ok(Self {
            description: label.description,
            tags: label.tags,
            classification_rule: label.classification_rule.map(|rule| WireRule {
                rule_type: rule.rule_type,
                rule_code: rule.rule_code,
                rule_status: rule.rule_status,
            }),
        })
    }
}

impl ResponseData for DataLabel {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let rule = self.classification_rule.as_ref().map(|rule| ClassificationRule {
            rule_type: rule.rule_type.clone(),
            rule_code: rule.rule_code.clone(),
            rule_status: rule.rule_status.clone(),
        });
        state.set("description", &self.description)?;
        state.set("tags", &self.tags)?;
        state.set("classification_rule", rule)
    }
}

/// Response to the create `PUT`. The body carries nothing of interest; the
/// label name becomes the id.
#[derive(Debug, Deserialize)]
pub struct DataLabelWritten {}

impl ResponseData for DataLabelWritten {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let name = state.require_str("name")?.to_string();
        state.set_id(name);
        Ok(())
    }
}

/// The label name, preferring the `name` attribute over the id.
fn label_name(state: &ResourceState) -> &str {
    state
        .get_str("name")
        .filter(|name| !name.is_empty())
        .or_else(|| state.id())
        .unwrap_or_default()
}

fn label_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/datalabels", [label_name(state)])
}

/// Schema of `cp_datalabel`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a custom data label")
        .with_id("The label name")
        .with_attribute("name", Attribute::required_string().with_force_new())
        .with_attribute("description", Attribute::optional_string())
        .with_attribute(
            "tags",
            Attribute::optional(AttributeType::list(AttributeType::String)),
        )
        .with_attribute(
            "classification_rule",
            Attribute::optional(AttributeType::object([
                (
                    "rule_type",
                    Attribute::required_string().with_allowed_values(RULE_TYPES.iter().copied()),
                ),
                ("rule_code", Attribute::optional_string()),
                (
                    "rule_status",
                    Attribute::required_string().with_allowed_values(RULE_STATUSES.iter().copied()),
                ),
            ])),
        )
}

fn read_config() -> OperationConfig {
    OperationConfig::new("DataLabelRead", HttpMethod::Get, label_url)
        .with_response::<DataLabel>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_datalabel` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("DataLabelCreate", HttpMethod::Put, label_url)
        .with_request::<DataLabel>()
        .with_response::<DataLabelWritten>();

    let update = OperationConfig::new("DataLabelUpdate", HttpMethod::Put, label_url)
        .with_request::<DataLabel>();

    let delete = OperationConfig::new("DataLabelDelete", HttpMethod::Delete, label_url)
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnDelete);

    Ok(Resource::new(
        TYPE_NAME,
        schema(),
        CreateResource::new(create, read_config())?,
        ReadResource::new(read_config())?,
        DeleteResource::new(delete)?,
    )
    .with_update(UpdateResource::new(update, read_config())?))
}
