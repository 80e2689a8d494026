//! Generic lifecycle executors.
//!
//! Every concrete resource is wired from the same four handlers. Each one is
//! built from [`OperationConfig`]s, validated once at construction, and then
//! invoked by the provider with an explicit [`Context`] and [`Client`].
//!
//! Handlers mutate a private copy of the state and write it back only when
//! the call succeeds, or when a not-found policy turns the failure into a
//! removal. A failed call leaves the caller's state exactly as it was.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::client::Client;
use crate::context::Context;
use crate::error::ProviderError;
use crate::operation::OperationConfig;
use crate::policy::{Operation, NEW_RESOURCE};
use crate::state::ResourceState;

/// A lifecycle handler the provider invokes for one resource type.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Run the handler against `state`.
    async fn call(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError>;
}

/// Run one configured call and fold its response into `state`.
///
/// Errors raised by the control plane go through the config's error policy.
/// Payload failures are reported as structural errors with operation context.
async fn execute(
    config: &OperationConfig,
    operation: Operation,
    ctx: &Context,
    client: &Client,
    state: &mut ResourceState,
) -> Result<(), ProviderError> {
    let resource = state.id().unwrap_or(NEW_RESOURCE).to_string();
    let url = config.url(state, client);
    let body = config
        .request_body(state)
        .map_err(|e| e.in_operation(config.name(), &resource))?;

    let bytes = match client.execute(ctx, config.method(), &url, body.as_ref()).await {
        Ok(bytes) => bytes,
        Err(err) => return config.error_policy().handle(operation, config.name(), err, state),
    };

    let Some(data) = config
        .decode_response(&bytes)
        .map_err(|e| e.in_operation(config.name(), &resource))?
    else {
        return Ok(());
    };
    debug!(operation = config.name(), response = ?data, "Decoded response");

    data.write_to_state(state)
        .map_err(|e| e.in_operation(config.name(), &resource))
}

/// Creates a remote object, then reads it back to fill computed fields.
#[derive(Debug, Clone)]
pub struct CreateResource {
    create: OperationConfig,
    read: ReadResource,
}

impl CreateResource {
    /// Build from the create call and the follow-up read.
    pub fn new(create: OperationConfig, read: OperationConfig) -> Result<Self, ProviderError> {
        create.validate()?;
        Ok(Self {
            create,
            read: ReadResource::new(read)?,
        })
    }
}

#[async_trait]
impl Handler for CreateResource {
    #[instrument(skip_all, fields(operation = %self.create.name()))]
    async fn call(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        debug!("Create started");
        let mut working = state.clone();
        execute(&self.create, Operation::Create, ctx, client, &mut working).await?;
        self.read.call(ctx, client, &mut working).await?;

        // the follow-up read must find what was just created
        if !working.exists() {
            return Err(ProviderError::NotFound(
                "resource disappeared right after it was created".to_string(),
            )
            .in_operation(self.create.name(), NEW_RESOURCE));
        }

        *state = working;
        debug!(id = state.id(), "Create finished");
        Ok(())
    }
}

/// Refreshes state from the control plane.
#[derive(Debug, Clone)]
pub struct ReadResource {
    read: OperationConfig,
}

impl ReadResource {
    /// Build from the read call.
    pub fn new(read: OperationConfig) -> Result<Self, ProviderError> {
        read.validate()?;
        Ok(Self { read })
    }
}

#[async_trait]
impl Handler for ReadResource {
    #[instrument(skip_all, fields(operation = %self.read.name(), id = state.id()))]
    async fn call(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        debug!("Read started");
        let mut working = state.clone();
        execute(&self.read, Operation::Read, ctx, client, &mut working).await?;
        *state = working;
        debug!(exists = state.exists(), "Read finished");
        Ok(())
    }
}

/// Updates a remote object in place, then reads it back.
#[derive(Debug, Clone)]
pub struct UpdateResource {
    update: OperationConfig,
    read: ReadResource,
}

impl UpdateResource {
    /// Build from the update call and the follow-up read.
    pub fn new(update: OperationConfig, read: OperationConfig) -> Result<Self, ProviderError> {
        update.validate()?;
        Ok(Self {
            update,
            read: ReadResource::new(read)?,
        })
    }
}

#[async_trait]
impl Handler for UpdateResource {
    #[instrument(skip_all, fields(operation = %self.update.name(), id = state.id()))]
    async fn call(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        debug!("Update started");
        let mut working = state.clone();
        execute(&self.update, Operation::Update, ctx, client, &mut working).await?;
        self.read.call(ctx, client, &mut working).await?;

        if !working.exists() {
            let resource = state.id().unwrap_or(NEW_RESOURCE).to_string();
            return Err(ProviderError::NotFound(
                "resource disappeared right after it was updated".to_string(),
            )
            .in_operation(self.update.name(), resource));
        }

        *state = working;
        debug!("Update finished");
        Ok(())
    }
}

/// Deletes a remote object. On success the id is cleared.
#[derive(Debug, Clone)]
pub struct DeleteResource {
    delete: OperationConfig,
}

impl DeleteResource {
    /// Build from the delete call.
    pub fn new(delete: OperationConfig) -> Result<Self, ProviderError> {
        delete.validate()?;
        Ok(Self { delete })
    }
}

#[async_trait]
impl Handler for DeleteResource {
    #[instrument(skip_all, fields(operation = %self.delete.name(), id = state.id()))]
    async fn call(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        debug!("Delete started");
        let mut working = state.clone();
        execute(&self.delete, Operation::Delete, ctx, client, &mut working).await?;
        working.clear_id();
        *state = working;
        debug!("Delete finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operation::{HttpMethod, RequestData, ResponseData};
    use crate::policy::ErrorPolicy;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Serialize)]
    struct WidgetRequest {
        name: String,
    }

    impl RequestData for WidgetRequest {
        fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
            Ok(Self {
                name: state.require_str("name")?.to_string(),
            })
        }
    }

    #[derive(Debug, Deserialize)]
    struct WidgetCreated {
        #[serde(rename = "ID")]
        id: String,
    }

    impl ResponseData for WidgetCreated {
        fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
            state.set_id(&self.id);
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Widget {
        name: String,
        size: i64,
    }

    impl ResponseData for Widget {
        fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
            state.set("name", &self.name)?;
            state.set("size", self.size)
        }
    }

    fn widget_url(state: &ResourceState, client: &Client) -> String {
        client.endpoint(&format!("/v1/widgets/{}", state.id().unwrap_or_default()))
    }

    fn create_config() -> OperationConfig {
        OperationConfig::new("WidgetCreate", HttpMethod::Post, |_, c| c.endpoint("/v1/widgets"))
            .with_request::<WidgetRequest>()
            .with_response::<WidgetCreated>()
    }

    fn read_config() -> OperationConfig {
        OperationConfig::new("WidgetRead", HttpMethod::Get, widget_url)
            .with_response::<Widget>()
            .with_error_policy(ErrorPolicy::IgnoreNotFoundOnRead)
    }

    fn update_config() -> OperationConfig {
        OperationConfig::new("WidgetUpdate", HttpMethod::Put, widget_url)
            .with_request::<WidgetRequest>()
    }

    fn delete_config() -> OperationConfig {
        OperationConfig::new("WidgetDelete", HttpMethod::Delete, widget_url)
            .with_error_policy(ErrorPolicy::IgnoreNotFoundOnDelete)
    }

    fn existing() -> ResourceState {
        ResourceState::from_value(json!({"id": "w1", "name": "gear", "size": 1})).unwrap()
    }

    async fn setup() -> (MockServer, Client) {
        let server = MockServer::start().await;
        let client = Client::with_token(&server.uri(), "token").unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_create_reads_back_computed_fields() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/v1/widgets"))
            .and(body_json(json!({"name": "gear"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ID": "w1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/widgets/w1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "gear", "size": 42})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let handler = CreateResource::new(create_config(), read_config()).unwrap();
        let mut state = ResourceState::from_value(json!({"name": "gear"})).unwrap();
        handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap();

        assert_eq!(state.id(), Some("w1"));
        assert_eq!(state.get("size"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_create_failure_leaves_state_untouched() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/v1/widgets"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate name"))
            .mount(&server)
            .await;

        let handler = CreateResource::new(create_config(), read_config()).unwrap();
        let before = ResourceState::from_value(json!({"name": "gear"})).unwrap();
        let mut state = before.clone();
        let err = handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().starts_with("WidgetCreate failed for <new>"));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_create_with_missing_payload_field_is_structural() {
        let (_server, client) = setup().await;
        let handler = CreateResource::new(create_config(), read_config()).unwrap();
        let mut state = ResourceState::new();
        let err = handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(state, ResourceState::new());
    }

    #[tokio::test]
    async fn test_create_then_not_found_on_read_fails() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ID": "w1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let handler = CreateResource::new(create_config(), read_config()).unwrap();
        let mut state = ResourceState::from_value(json!({"name": "gear"})).unwrap();
        let err = handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(state.id().is_none());
    }

    #[tokio::test]
    async fn test_update_then_not_found_on_read_fails() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/v1/widgets/w1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let handler = UpdateResource::new(update_config(), read_config()).unwrap();
        let mut state = existing();
        state.set("name", "cog").unwrap();
        let before = state.clone();
        let err = handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("WidgetUpdate failed for w1"));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_read_refreshes_state() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/v1/widgets/w1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "cog", "size": 7})),
            )
            .mount(&server)
            .await;

        let handler = ReadResource::new(read_config()).unwrap();
        let mut state = existing();
        handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap();
        assert_eq!(state.get_str("name"), Some("cog"));
        assert_eq!(state.id(), Some("w1"));
    }

    #[tokio::test]
    async fn test_read_not_found_clears_id() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/v1/widgets/w1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .mount(&server)
            .await;

        let handler = ReadResource::new(read_config()).unwrap();
        let mut state = existing();
        handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap();
        assert!(!state.exists());
        assert_eq!(state.get_str("name"), Some("gear"));
    }

    #[tokio::test]
    async fn test_server_errors_leave_state_untouched() {
        let (server, client) = setup().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let ctx = Context::background();

        let handlers: Vec<Box<dyn Handler>> = vec![
            Box::new(ReadResource::new(read_config()).unwrap()),
            Box::new(UpdateResource::new(update_config(), read_config()).unwrap()),
            Box::new(DeleteResource::new(delete_config()).unwrap()),
        ];
        for handler in handlers {
            let mut state = existing();
            let err = handler.call(&ctx, &client, &mut state).await.unwrap_err();
            assert_eq!(err.status(), Some(500));
            assert_eq!(state, existing());
        }
    }

    #[tokio::test]
    async fn test_read_decode_failure_is_structural() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": 3, "size": "x"})))
            .mount(&server)
            .await;

        let handler = ReadResource::new(read_config()).unwrap();
        let mut state = existing();
        let err = handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().starts_with("WidgetRead failed for w1"));
        assert_eq!(state, existing());
    }

    #[tokio::test]
    async fn test_update_runs_follow_up_read() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/v1/widgets/w1"))
            .and(body_json(json!({"name": "sprocket"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/widgets/w1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "sprocket", "size": 9})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let handler = UpdateResource::new(update_config(), read_config()).unwrap();
        let mut state = existing();
        state.set("name", "sprocket").unwrap();
        handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap();
        assert_eq!(state.get("size"), Some(&json!(9)));
    }

    #[tokio::test]
    async fn test_delete_clears_id() {
        let (server, client) = setup().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/widgets/w1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let handler = DeleteResource::new(delete_config()).unwrap();
        let mut state = existing();
        handler
            .call(&Context::background(), &client, &mut state)
            .await
            .unwrap();
        assert!(!state.exists());
    }

    #[tokio::test]
    async fn test_delete_not_found_is_success() {
        let (server, client) = setup().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let handler = DeleteResource::new(delete_config()).unwrap();
        let mut state = existing();
        assert!(handler
            .call(&Context::background(), &client, &mut state)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "gear", "size": 1}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let handler = ReadResource::new(read_config()).unwrap();
        let mut state = existing();
        let ctx = Context::with_timeout(Duration::from_millis(50));
        let err = handler.call(&ctx, &client, &mut state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(state, existing());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let post_without_body =
            OperationConfig::new("WidgetCreate", HttpMethod::Post, |_, c| c.endpoint("/v1/widgets"));
        let err = CreateResource::new(post_without_body, read_config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let get_with_body = read_config().with_request::<WidgetRequest>();
        assert!(ReadResource::new(get_with_body.clone()).is_err());
        assert!(UpdateResource::new(update_config(), get_with_body).is_err());
        assert!(DeleteResource::new(delete_config().with_request::<WidgetRequest>()).is_err());
    }
}
