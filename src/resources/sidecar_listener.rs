//! `cp_sidecar_listener`: a port a sidecar listens on for one or more
//! repository types.
//!
//! The resource id is composed as `sidecar_id/listener_id`.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::{CreateResource, DeleteResource, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::id::{compose_id, SLASH};
use crate::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
use crate::policy::ErrorPolicy;
use crate::resource::{import_composed, Resource};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceState;

use super::{segment, REPOSITORY_TYPES};

/// Resource type name.
pub const TYPE_NAME: &str = "cp_sidecar_listener";

/// Fields encoded in the composed id, in order.
pub const ID_FIELDS: &[&str] = &["sidecar_id", "listener_id"];

/// Host and port a listener binds to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddress {
    /// Bind host. The control plane defaults to all interfaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Bind port.
    pub port: u16,
}

/// MySQL specific listener settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlSettings {
    /// Version advertised to clients.
    #[serde(default)]
    pub db_version: Option<String>,
    /// Default character set.
    #[serde(default)]
    pub character_set: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMysqlSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    db_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    character_set: Option<String>,
}

impl From<MysqlSettings> for WireMysqlSettings {
    fn from(settings: MysqlSettings) -> Self {
        Self {
            db_version: settings.db_version,
            character_set: settings.character_set,
        }
    }
}

impl From<&WireMysqlSettings> for MysqlSettings {
    fn from(wire: &WireMysqlSettings) -> Self {
        Self {
            db_version: wire.db_version.clone(),
            character_set: wire.character_set.clone(),
        }
    }
}

/// Declarative configuration of a listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListenerState {
    /// Owning sidecar.
    pub sidecar_id: String,
    /// Listener id, assigned by the control plane.
    #[serde(default)]
    pub listener_id: Option<String>,
    /// Repository types served on this listener.
    pub repo_types: Vec<String>,
    /// Bind address.
    #[serde(default)]
    pub network_address: Option<NetworkAddress>,
    /// MySQL settings.
    #[serde(default)]
    pub mysql_settings: Option<MysqlSettings>,
}

/// Wire representation of a listener's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerConfig {
    /// Listener id, only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Repository types.
    #[serde(default)]
    pub repo_types: Vec<String>,
    /// Bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<NetworkAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mysql_settings: Option<WireMysqlSettings>,
}

/// Request and read-response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerEnvelope {
    listener_config: ListenerConfig,
}

impl RequestData for ListenerEnvelope {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        let listener: ListenerState = state.decode()?;
        Ok(Self {
            listener_config: ListenerConfig {
                id: None,
                repo_types: listener.repo_types,
                address: listener.network_address,
                mysql_settings: listener.mysql_settings.map(Into::into),
            },
        })
    }
}

impl ResponseData for ListenerEnvelope {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let config = &self.listener_config;
        state.set("repo_types", &config.repo_types)?;
        state.set("network_address", &config.address)?;
        state.set(
            "mysql_settings",
            config.mysql_settings.as_ref().map(MysqlSettings::from),
        )?;
        if let Some(id) = &config.id {
            state.set("listener_id", id)?;
        }
        Ok(())
    }
}

/// Response to a create call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerCreated {
    listener_id: String,
}

impl ResponseData for ListenerCreated {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let sidecar_id = state.require_str("sidecar_id")?.to_string();
        state.set("listener_id", &self.listener_id)?;
        state.set_id(compose_id(&[sidecar_id.as_str(), self.listener_id.as_str()], SLASH));
        Ok(())
    }
}

fn listeners_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/sidecars", [segment(state, "sidecar_id"), "listeners"])
}

fn listener_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with(
        "/v1/sidecars",
        [segment(state, "sidecar_id"), "listeners", segment(state, "listener_id")],
    )
}

/// Schema of a network address block.
pub(crate) fn network_address_type() -> AttributeType {
    AttributeType::object([
        ("host", Attribute::optional_computed(AttributeType::String)),
        ("port", Attribute::required(AttributeType::Int64)),
    ])
}

/// Schema of `cp_sidecar_listener`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a sidecar listener")
        .with_id("Composed id: sidecar_id/listener_id")
        .with_attribute(
            "sidecar_id",
            Attribute::required_string().with_force_new(),
        )
        .with_attribute("listener_id", Attribute::computed_string())
        .with_attribute(
            "repo_types",
            Attribute::required(AttributeType::list(AttributeType::String))
                .with_description("Repository types served on this listener")
                .with_allowed_values(REPOSITORY_TYPES.iter().copied()),
        )
        .with_attribute(
            "network_address",
            Attribute::optional_computed(network_address_type()),
        )
        .with_attribute(
            "mysql_settings",
            Attribute::optional_computed(AttributeType::object([
                ("db_version", Attribute::optional_string()),
                ("character_set", Attribute::optional_string()),
            ])),
        )
}

fn read_config() -> OperationConfig {
    OperationConfig::new("ListenerRead", HttpMethod::Get, listener_url)
        .with_response::<ListenerEnvelope>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_sidecar_listener` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("ListenerCreate", HttpMethod::Post, listeners_url)
        .with_request::<ListenerEnvelope>()
        .with_response::<ListenerCreated>();

    let update = OperationConfig::new("ListenerUpdate", HttpMethod::Put, listener_url)
        .with_request::<ListenerEnvelope>();

    let delete = OperationConfig::new("ListenerDelete", HttpMethod::Delete, listener_url)
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnDelete);

    Ok(Resource::new(
        TYPE_NAME,
        schema(),
        CreateResource::new(create, read_config())?,
        ReadResource::new(read_config())?,
        DeleteResource::new(delete)?,
    )
    .with_update(UpdateResource::new(update, read_config())?)
    .with_importer(import_composed(ID_FIELDS, SLASH)))
}
