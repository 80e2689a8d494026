//! `cp_repository`: a data repository protected by sidecars.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::{CreateResource, DeleteResource, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
use crate::policy::ErrorPolicy;
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceState;

use super::{id_segment, REPOSITORY_TYPES};

/// Resource type name.
pub const TYPE_NAME: &str = "cp_repository";

/// A repository as stored in state and sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Display name.
    pub name: String,
    /// Repository type, one of [`REPOSITORY_TYPES`].
    #[serde(rename = "type")]
    pub repo_type: String,
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Free-form labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl RequestData for Repository {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        state.decode()
    }
}

/// Read response, which wraps the repository.
#[derive(Debug, Deserialize)]
pub struct RepositoryEnvelope {
    repo: Repository,
}

impl ResponseData for RepositoryEnvelope {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.merge(&self.repo)
    }
}

/// Response to a create call.
#[derive(Debug, Deserialize)]
pub struct RepositoryCreated {
    #[serde(rename = "ID")]
    id: String,
}

impl ResponseData for RepositoryCreated {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.set_id(&self.id);
        Ok(())
    }
}

fn repository_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with("/v1/repos", [id_segment(state)])
}

/// Schema of `cp_repository`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a repository")
        .with_id("Repository identifier assigned by the control plane")
        .with_attribute("name", Attribute::required_string())
        .with_attribute(
            "type",
            Attribute::required_string()
                .with_force_new()
                .with_allowed_values(REPOSITORY_TYPES.iter().copied()),
        )
        .with_attribute("host", Attribute::required_string())
        .with_attribute("port", Attribute::required(AttributeType::Int64))
        .with_attribute(
            "labels",
            Attribute::optional(AttributeType::list(AttributeType::String)),
        )
}

fn read_config() -> OperationConfig {
    OperationConfig::new("RepositoryRead", HttpMethod::Get, repository_url)
        .with_response::<RepositoryEnvelope>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_repository` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("RepositoryCreate", HttpMethod::Post, |_, client| {
        client.endpoint("/v1/repos")
    })
    .with_request::<Repository>()
    .with_response::<RepositoryCreated>();

    let update = OperationConfig::new("RepositoryUpdate", HttpMethod::Put, repository_url)
        .with_request::<Repository>();

    let delete = OperationConfig::new("RepositoryDelete", HttpMethod::Delete, repository_url)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_request_uses_type_key() {
        let state = ResourceState::from_value(json!({
            "name": "orders",
            "type": "postgresql",
            "host": "db.internal",
            "port": 5432
        }))
        .unwrap();
        let body = serde_json::to_value(Repository::from_state(&state).unwrap()).unwrap();
        assert_eq!(body["type"], "postgresql");
        assert_eq!(body["labels"], json!([]));
    }

    #[test]
    fn test_out_of_range_port_is_structural() {
        let state = ResourceState::from_value(json!({
            "name": "orders",
            "type": "postgresql",
            "host": "db.internal",
            "port": 70000
        }))
        .unwrap();
        let err = Repository::from_state(&state).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_envelope_to_state() {
        let envelope: RepositoryEnvelope = serde_json::from_value(json!({
            "repo": {
                "name": "orders",
                "type": "postgresql",
                "host": "db.internal",
                "port": 5432,
                "labels": ["pci"]
            }
        }))
        .unwrap();
        let mut state = ResourceState::from_value(json!({"id": "r-1"})).unwrap();
        envelope.write_to_state(&mut state).unwrap();
        assert_eq!(state.get("port"), Some(&json!(5432)));
        assert_eq!(state.get("labels"), Some(&json!(["pci"])));
        assert_eq!(state.id(), Some("r-1"));
    }
}
