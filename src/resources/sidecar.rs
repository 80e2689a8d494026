//! `cp_sidecar`: a data-plane sidecar registered with the control plane.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::{CreateResource, DeleteResource, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
use crate::policy::ErrorPolicy;
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceState;

use super::id_segment;

/// Resource type name.
pub const TYPE_NAME: &str = "cp_sidecar";

/// Supported deployment methods.
pub const DEPLOYMENT_METHODS: &[&str] = &[
    "automated",
    "cft-ec2",
    "custom",
    "docker",
    "helm3",
    "linux",
    "singleContainer",
    "terraform",
];

/// Declarative configuration of a sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Display name.
    pub name: String,
    /// How the sidecar is deployed.
    pub deployment_method: String,
    /// Free-form labels.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Endpoint clients use to reach the sidecar.
    #[serde(default)]
    pub user_endpoint: Option<String>,
    /// Integration receiving activity logs.
    #[serde(default)]
    pub activity_log_integration_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidecarProperties {
    deployment_method: String,
}

/// Wire representation of a sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    name: String,
    properties: SidecarProperties,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_endpoint: Option<String>,
    #[serde(
        rename = "activityLogIntegrationID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    activity_log_integration_id: Option<String>,
}

impl From<SidecarConfig> for Sidecar {
    fn from(config: SidecarConfig) -> Self {
        Self {
            name: config.name,
            properties: SidecarProperties {
                deployment_method: config.deployment_method,
            },
            labels: config.labels,
            user_endpoint: config.user_endpoint,
            activity_log_integration_id: config.activity_log_integration_id,
        }
    }
}

impl RequestData for Sidecar {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        Ok(state.decode::<SidecarConfig>()?.into())
    }
}

impl ResponseData for Sidecar {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.merge(&SidecarConfig {
            name: self.name.clone(),
            deployment_method: self.properties.deployment_method.clone(),
            labels: self.labels.clone(),
            user_endpoint: self.user_endpoint.clone(),
            activity_log_integration_id: self.activity_log_integration_id.clone(),
        })
    }
}

/// Response to a create call.
#[derive(Debug, Deserialize)]
pub struct SidecarCreated {
    #[serde(rename = "ID")]
    id: String,
}

impl ResponseData for SidecarCreated {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.set_id(&self.id);
        Ok(())
    }
}

fn sidecar_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/sidecars", [id_segment(state)])
}

/// Schema of `cp_sidecar`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a sidecar")
        .with_id("Sidecar identifier assigned by the control plane")
        .with_attribute("name", Attribute::required_string().with_description("Sidecar name"))
        .with_attribute(
            "deployment_method",
            Attribute::required_string()
                .with_description("How the sidecar is deployed")
                .with_allowed_values(DEPLOYMENT_METHODS.iter().copied()),
        )
        .with_attribute(
            "labels",
            Attribute::optional(AttributeType::list(AttributeType::String)),
        )
        .with_attribute("user_endpoint", Attribute::optional_string())
        .with_attribute("activity_log_integration_id", Attribute::optional_string())
}

fn read_config() -> OperationConfig {
    OperationConfig::new("SidecarRead", HttpMethod::Get, sidecar_url)
        .with_response::<Sidecar>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_sidecar` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("SidecarCreate", HttpMethod::Post, |_, client| {
        client.endpoint("/v1/sidecars")
    })
    .with_request::<Sidecar>()
    .with_response::<SidecarCreated>();

    let update = OperationConfig::new("SidecarUpdate", HttpMethod::Put, sidecar_url)
        .with_request::<Sidecar>();

    let delete = OperationConfig::new("SidecarDelete", HttpMethod::Delete, sidecar_url)
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
