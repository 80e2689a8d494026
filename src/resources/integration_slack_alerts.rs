//! `cp_integration_slack_alerts`: sends control-plane alerts to a Slack
//! webhook.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crud::{CreateResource, DeleteResource, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
use crate::policy::ErrorPolicy;
use crate::resource::Resource;
use crate::schema::{Attribute, Schema};
use crate::state::ResourceState;

use super::id_segment;

/// Resource type name.
pub const TYPE_NAME: &str = "cp_integration_slack_alerts";

const BASE_PATH: &str = "/v1/integrations/notifications/slack";

/// A Slack alert integration, identical in state and on the wire.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAlerts {
    /// Integration name.
    pub name: String,
    /// Incoming webhook URL.
    pub url: String,
}

impl std::fmt::Debug for SlackAlerts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAlerts")
            .field("name", &self.name)
            .field("url", &"<redacted>")
            .finish()
    }
}

impl RequestData for SlackAlerts {
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
        state.decode()
    }
}

impl ResponseData for SlackAlerts {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.merge(self)
    }
}

/// Response to a create call.
#[derive(Debug, Deserialize)]
pub struct SlackAlertsCreated {
    id: String,
}

impl ResponseData for SlackAlertsCreated {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        state.set_id(&self.id);
        Ok(())
    }
}

fn integration_url(state: &ResourceState, client: &Client) -> String {
    client.endpoint_with(BASE_PATH, [id_segment(state)])
}

/// Schema of `cp_integration_slack_alerts`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a Slack alerts integration")
        .with_id("Integration identifier assigned by the control plane")
        .with_attribute("name", Attribute::required_string())
        .with_attribute(
            "url",
            Attribute::required_string()
                .sensitive()
                .with_description("Slack incoming webhook URL"),
        )
}

fn read_config() -> OperationConfig {
    OperationConfig::new("SlackAlertsRead", HttpMethod::Get, integration_url)
        .with_response::<SlackAlerts>()
        .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
}

/// The `cp_integration_slack_alerts` definition.
pub fn resource() -> Result<Resource, ProviderError> {
    let create = OperationConfig::new("SlackAlertsCreate", HttpMethod::Post, |_, client| {
        client.endpoint(BASE_PATH)
    })
    .with_request::<SlackAlerts>()
    .with_response::<SlackAlertsCreated>();

    let update = OperationConfig::new("SlackAlertsUpdate", HttpMethod::Put, integration_url)
        .with_request::<SlackAlerts>();

    let delete = OperationConfig::new("SlackAlertsDelete", HttpMethod::Delete, integration_url)
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
    use serde_json::json;

    #[test]
    fn test_debug_hides_webhook() {
        let alerts = SlackAlerts {
            name: "oncall".to_string(),
            url: "https://hooks.slack.com/services/T000/B000/XXXX".to_string(),
        };
        assert!(!format!("{:?}", alerts).contains("hooks.slack.com"));
    }

    #[test]
    fn test_url() {
        let client = Client::with_token("cp.example.com", "t").unwrap();
        let state = ResourceState::from_value(json!({"id": "int-1"})).unwrap();
        assert_eq!(
            integration_url(&state, &client),
            "https://cp.example.com/v1/integrations/notifications/slack/int-1"
        );
    }

    #[test]
    fn test_schema_marks_url_sensitive() {
        assert!(schema().attributes["url"].flags.sensitive);
    }
}
