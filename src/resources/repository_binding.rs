//! `cp_repository_binding`: binds a repository to a sidecar's listeners.
//!
//! The resource id is composed as `sidecar_id/binding_id`.

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

use super::segment;

/// Resource type name.
pub const TYPE_NAME: &str = "cp_repository_binding";

/// Fields encoded in the composed id, in order.
pub const ID_FIELDS: &[&str] = &["sidecar_id", "binding_id"];

fn enabled_by_default() -> bool {
    true
}

/// One listener the repository is reachable through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerBinding {
    /// Listener id.
    pub listener_id: String,
    /// Node of a multi-node repository served by the listener.
    #[serde(default)]
    pub node_index: u32,
}

/// Declarative configuration of a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingState {
    /// Sidecar the repository is bound to.
    pub sidecar_id: String,
    /// Bound repository.
    pub repository_id: String,
    /// Whether traffic is accepted.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Listener bindings.
    #[serde(default)]
    pub listener_binding: Vec<ListenerBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListenerBinding {
    listener_id: String,
    #[serde(default)]
    node_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Binding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    repo_id: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    listener_bindings: Vec<WireListenerBinding>,
}

/// Request and read-response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingEnvelope {
    binding: Binding,
}

impl RequestData for BindingEnvelope {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        let binding: BindingState = state.decode()?;
        Ok(Self {
            binding: Binding {
                id: None,
                repo_id: binding.repository_id,
                enabled: binding.enabled,
                listener_bindings: binding
                    .listener_binding
                    .into_iter()
                    .map(|lb| WireListenerBinding {
                        listener_id: lb.listener_id,
                        node_index: lb.node_index,
                    })
                    .collect(),
            },
        })
    }
}

impl ResponseData for BindingEnvelope {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let listener_binding: Vec<ListenerBinding> = self
            .binding
            .listener_bindings
            .iter()
            .map(|lb| ListenerBinding {
                listener_id: lb.listener_id.clone(),
                node_index: lb.node_index,
            })
            .collect();
        state.set("repository_id", &self.binding.repo_id)?;
        state.set("enabled", self.binding.enabled)?;
        state.set("listener_binding", listener_binding)
    }
}

/// Response to a create call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingCreated {
    binding_id: String,
}

impl ResponseData for BindingCreated {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let sidecar_id = state.require_str("sidecar_id")?.to_string();
        state.set("binding_id", &self.binding_id)?;
        state.set_id(compose_id(&[sidecar_id.as_str(), self.binding_id.as_str()], SLASH));
        Ok(())
    }
}

fn bindings_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/sidecars", [segment(state, "sidecar_id"), "bindings"])
}

fn binding_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with(
        "/v1/sidecars",
        [segment(state, "sidecar_id"), "bindings", segment(state, "binding_id")],
    )
}

/// Schema of `cp_repository_binding`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Binds a repository to a sidecar")
        .with_id("Composed id: sidecar_id/binding_id")
        .with_attribute("sidecar_id", Attribute::required_string().with_force_new())
        .with_attribute("repository_id", Attribute::required_string().with_force_new())
        .with_attribute("binding_id", Attribute::computed_string())
        .with_attribute(
            "enabled",
            Attribute::optional(AttributeType::Bool).with_default(serde_json::Value::Bool(true)),
        )
        .with_attribute(
            "listener_binding",
            Attribute::required(AttributeType::list(AttributeType::object([
                ("listener_id", Attribute::required_string()),
                ("node_index", Attribute::optional(AttributeType::Int64)),
            ]))),
        )
}

fn read_config() -> OperationConfig {
    OperationConfig::new("RepositoryBindingRead", HttpMethod::Get, binding_url)
        .with_response::<BindingEnvelope>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_repository_binding` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("RepositoryBindingCreate", HttpMethod::Post, bindings_url)
        .with_request::<BindingEnvelope>()
        .with_response::<BindingCreated>();

    let update = OperationConfig::new("RepositoryBindingUpdate", HttpMethod::Put, binding_url)
        .with_request::<BindingEnvelope>();

    let delete = OperationConfig::new("RepositoryBindingDelete", HttpMethod::Delete, binding_url)
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
