//! The control-plane provider.
//!
//! [`ControlPlaneProvider`] implements [`ProviderService`] on top of the
//! resource and data source definitions. It owns the configured [`Client`]
//! and hands it, together with a fresh [`Context`], to every handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::Client;
use crate::config::ProviderConfig;
use crate::context::Context;
use crate::data_sources;
use crate::diagnostics::{has_errors, Diagnostic};
use crate::error::ProviderError;
use crate::resource::{DataSource, Resource};
use crate::resources;
use crate::schema::{ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::state::ResourceState;
use crate::types::ImportedResource;
use crate::validation::validate;

/// Provider for the control-plane API.
pub struct ControlPlaneProvider {
    resources: BTreeMap<String, Resource>,
    data_sources: BTreeMap<String, DataSource>,
    client: RwLock<Option<Arc<Client>>>,
}

impl ControlPlaneProvider {
    /// A provider serving every built-in resource and data source.
    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self::with_definitions(resources::all()?, data_sources::all()?))
    }

    /// A provider serving the given definitions.
    pub fn with_definitions(resources: Vec<Resource>, data_sources: Vec<DataSource>) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|r| (r.name().to_string(), r))
                .collect(),
            data_sources: data_sources
                .into_iter()
                .map(|d| (d.name().to_string(), d))
                .collect(),
            client: RwLock::new(None),
        }
    }

    /// Use `client` instead of building one in [`ProviderService::configure`].
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = RwLock::new(Some(Arc::new(client)));
        self
    }

    /// The configured client.
    pub async fn client(&self) -> Result<Arc<Client>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn resource(&self, resource_type: &str) -> Result<&Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    /// The client plus a context carrying its request timeout.
    async fn session(&self) -> Result<(Arc<Client>, Context), ProviderError> {
        let client = self.client().await?;
        let ctx = Context::from_timeout(client.request_timeout());
        Ok((client, ctx))
    }
}

/// Turn error diagnostics from schema validation into a single error.
fn check_planned(schema: &Schema, resource_type: &str, planned: &Value) -> Result<(), ProviderError> {
    let diagnostics = validate(schema, planned);
    if !has_errors(&diagnostics) {
        return Ok(());
    }
    let problems: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| match &d.detail {
            Some(detail) => format!("{}: {}", d.summary, detail),
            None => d.summary.clone(),
        })
        .collect();
    Err(ProviderError::Validation(format!(
        "{}: {}",
        resource_type,
        problems.join("; ")
    )))
}

#[async_trait::async_trait]
impl ProviderService for ControlPlaneProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: ProviderConfig::schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), r.schema().clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.clone(), d.schema().clone()))
                .collect(),
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = match ProviderConfig::from_value(config) {
            Ok(config) => config,
            Err(e) => return Ok(vec![Diagnostic::from_error(&e)]),
        };
        Ok(config.with_env_fallback().validate())
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = match ProviderConfig::from_value(config) {
            Ok(config) => config.with_env_fallback(),
            Err(e) => return Ok(vec![Diagnostic::from_error(&e)]),
        };
        let diagnostics = config.validate();
        if has_errors(&diagnostics) {
            warn!(errors = diagnostics.len(), "Provider configuration rejected");
            return Ok(diagnostics);
        }

        match Client::connect(&config).await {
            Ok(client) => {
                *self.client.write().await = Some(Arc::new(client));
                info!(control_plane = %config.control_plane, "Provider configured");
                Ok(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to the control plane");
                let mut diagnostics = diagnostics;
                diagnostics.push(Diagnostic::from_error(&e));
                Ok(diagnostics)
            }
        }
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("Provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(self.resource(resource_type)?.schema(), &config))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        check_planned(resource.schema(), resource_type, &planned_state)?;
        let (client, ctx) = self.session().await?;

        let mut state = ResourceState::from_value(planned_state)?;
        resource.create(&ctx, &client, &mut state).await?;
        info!(id = state.id(), "Resource created");
        Ok(state.into_value())
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let (client, ctx) = self.session().await?;

        let mut state = ResourceState::from_value(current_state)?;
        resource.read(&ctx, &client, &mut state).await?;
        Ok(state.exists().then(|| state.into_value()))
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        check_planned(resource.schema(), resource_type, &planned_state)?;
        let (client, ctx) = self.session().await?;

        let prior = ResourceState::from_value(prior_state)?;
        let mut state = ResourceState::from_value(planned_state)?;
        if !state.exists() {
            if let Some(id) = prior.id() {
                state.set_id(id);
            }
        }
        resource.update(&ctx, &client, &mut state).await?;
        info!(id = state.id(), "Resource updated");
        Ok(state.into_value())
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let (client, ctx) = self.session().await?;

        let mut state = ResourceState::from_value(current_state)?;
        resource.delete(&ctx, &client, &mut state).await?;
        info!("Resource deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let (client, ctx) = self.session().await?;

        let mut state = resource.import(id)?;
        resource.read(&ctx, &client, &mut state).await?;
        if !state.exists() {
            return Err(ProviderError::NotFound(format!(
                "cannot import non-existent {} '{}'",
                resource_type, id
            )));
        }
        Ok(vec![ImportedResource::new(resource_type, state.into_value())])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(self.data_source(data_source_type)?.schema(), &config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        check_planned(data_source.schema(), data_source_type, &config)?;
        let (client, ctx) = self.session().await?;

        let mut state = ResourceState::from_value(config)?;
        data_source.read(&ctx, &client, &mut state).await?;
        Ok(state.into_value())
    }
}
