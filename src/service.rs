//! The runtime-facing provider interface.
//!
//! The IaC runtime drives a provider through [`ProviderService`]. State
//! crosses this boundary as JSON; everything behind it is typed.

use serde_json::Value;

use crate::diagnostics::Diagnostic;
use crate::error::ProviderError;
use crate::schema::ProviderSchema;
use crate::types::{ImportedResource, ProviderMetadata};

/// Trait that provider implementations implement.
///
/// # Example
///
/// ```
/// use controlplane_provider::diagnostics::Diagnostic;
/// use controlplane_provider::schema::ProviderSchema;
/// use controlplane_provider::{async_trait, ProviderError, ProviderService};
/// use serde_json::Value;
///
/// struct Noop;
///
/// #[async_trait]
/// impl ProviderService for Noop {
///     fn schema(&self) -> ProviderSchema {
///         ProviderSchema::default()
///     }
///
///     async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
///         Ok(vec![])
///     }
///
///     async fn create(&self, _t: &str, planned: Value) -> Result<Value, ProviderError> {
///         Ok(planned)
///     }
///
///     async fn read(&self, _t: &str, current: Value) -> Result<Option<Value>, ProviderError> {
///         Ok(Some(current))
///     }
///
///     async fn update(&self, _t: &str, _prior: Value, planned: Value) -> Result<Value, ProviderError> {
///         Ok(planned)
///     }
///
///     async fn delete(&self, _t: &str, _current: Value) -> Result<(), ProviderError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return the served type names. By default derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Create a new resource and return its state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh a resource. `None` means it no longer exists remotely.
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Update an existing resource in place.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "import not supported for resource type: {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read a data source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let _ = config;
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}
