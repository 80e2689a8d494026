//! `cp_sidecar_listener` data source: lists the listeners of a sidecar,
//! optionally filtered by repository type.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::ReadResource;
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, ResponseData};
use crate::resource::DataSource;
use crate::resources::sidecar_listener::{network_address_type, ListenerConfig, NetworkAddress};
use crate::resources::{segment, REPOSITORY_TYPES};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceState;

/// Data source type name.
pub const TYPE_NAME: &str = "cp_sidecar_listener";

/// One entry of `listener_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerSummary {
    /// Listener id.
    pub listener_id: String,
    /// Repository types served.
    pub repo_types: Vec<String>,
    /// Bind address.
    pub network_address: Option<NetworkAddress>,
}

/// Response of `GET /v1/sidecars/{id}/listeners`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerList {
    #[serde(default)]
    listener_configs: Vec<ListenerConfig>,
}

impl ResponseData for ListenerList {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let sidecar_id = state.require_str("sidecar_id")?.to_string();
        let repo_type = state.get_str("repo_type").map(str::to_string);

        let listeners: Vec<ListenerSummary> = self
            .listener_configs
            .iter()
            .filter(|config| match &repo_type {
                Some(wanted) => config.repo_types.iter().any(|t| t == wanted),
                None => true,
            })
            .map(|config| ListenerSummary {
                listener_id: config.id.clone().unwrap_or_default(),
                repo_types: config.repo_types.clone(),
                network_address: config.address.clone(),
            })
            .collect();

        state.set("listener_list", listeners)?;
        state.set_id(sidecar_id);
        Ok(())
    }
}

fn listeners_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/sidecars", [segment(state, "sidecar_id"), "listeners"])
}

/// Schema of the `cp_sidecar_listener` data source.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Lists the listeners of a sidecar")
        .with_id("The sidecar id")
        .with_attribute("sidecar_id", Attribute::required_string())
        .with_attribute(
            "repo_type",
            Attribute::optional_string()
                .with_description("Only list listeners serving this repository type")
                .with_allowed_values(REPOSITORY_TYPES.iter().copied()),
        )
        .with_attribute(
            "listener_list",
            Attribute::computed(AttributeType::list(AttributeType::object([
                ("listener_id", Attribute::computed_string()),
                (
                    "repo_types",
                    Attribute::computed(AttributeType::list(AttributeType::String)),
                ),
                ("network_address", Attribute::computed(network_address_type())),
            ]))),
        )
}

/// The `cp_sidecar_listener` data source definition.
pub fn data_source() -> Result<DataSource, ProviderError> {
    let read = OperationConfig::new("SidecarListenerListRead", HttpMethod::Get, listeners_url)
        .with_response::<ListenerList>();

    Ok(DataSource::new(TYPE_NAME, schema(), ReadResource::new(read)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list() -> ListenerList {
        serde_json::from_value(json!({
            "listenerConfigs": [
                {"id": "ln-1", "repoTypes": ["mysql"], "address": {"port": 3306}},
                {"id": "ln-2", "repoTypes": ["postgresql"], "address": {"host": "10.0.0.1", "port": 5432}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_flattens_all_listeners() {
        let mut state = ResourceState::from_value(json!({"sidecar_id": "sc-1"})).unwrap();
        list().write_to_state(&mut state).unwrap();
        assert_eq!(state.id(), Some("sc-1"));
        assert_eq!(
            state.get("listener_list"),
            Some(&json!([
                {"listener_id": "ln-1", "repo_types": ["mysql"], "network_address": {"port": 3306}},
                {
                    "listener_id": "ln-2",
                    "repo_types": ["postgresql"],
                    "network_address": {"host": "10.0.0.1", "port": 5432}
                }
            ]))
        );
    }

    #[test]
    fn test_filters_by_repo_type() {
        let mut state = ResourceState::from_value(json!({
            "sidecar_id": "sc-1",
            "repo_type": "postgresql"
        }))
        .unwrap();
        list().write_to_state(&mut state).unwrap();
        let listeners = state.get("listener_list").unwrap().as_array().unwrap();
        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0]["listener_id"], "ln-2");
    }

    #[test]
    fn test_empty_response() {
        let empty: ListenerList = serde_json::from_value(json!({})).unwrap();
        let mut state = ResourceState::from_value(json!({"sidecar_id": "sc-1"})).unwrap();
        empty.write_to_state(&mut state).unwrap();
        assert_eq!(state.get("listener_list"), Some(&json!([])));
    }
}
