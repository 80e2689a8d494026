//! Harness for exercising a [`ProviderService`] in tests.
//!
//! [`ProviderTester`] wraps a provider and dereferences to it, so raw calls
//! such as `tester.read(..)` reach the provider unchanged. On top of that it
//! turns error diagnostics into `Err` and chains lifecycle steps the way the
//! runtime would.
//!
//! ```ignore
//! use controlplane_provider::testing::ProviderTester;
//! use controlplane_provider::{Client, ControlPlaneProvider};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn sidecar_round_trip() {
//!     let server = wiremock::MockServer::start().await;
//!     // mount POST /v1/sidecars and GET /v1/sidecars/{id}
//!     let client = Client::with_token(&server.uri(), "token").unwrap();
//!     let tester = ProviderTester::new(ControlPlaneProvider::new().unwrap().with_client(client));
//!
//!     let state = tester
//!         .lifecycle_create("cp_sidecar", json!({"name": "edge", "deployment_method": "docker"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["name"], "edge");
//! }
//! ```

use std::ops::Deref;

use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticSeverity};
use crate::error::ProviderError;
use crate::service::ProviderService;

/// Wraps a provider for tests.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> Deref for ProviderTester<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.provider
    }
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Resource type names the provider serves.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Data source type names the provider serves.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Configure the provider, failing on any error diagnostic.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    /// Validate a provider block, failing on any error diagnostic.
    pub async fn check_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Validate resource configuration, failing on any error diagnostic.
    pub async fn check_resource_config(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Validate data source configuration, failing on any error diagnostic.
    pub async fn check_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_data_source_config(data_source_type, config)
                .await?,
        )
    }

    /// Read `state` back, treating absence as a failure.
    async fn refresh(&self, resource_type: &str, state: Value) -> Result<Value, TestError> {
        self.provider
            .read(resource_type, state)
            .await?
            .ok_or_else(|| TestError::Missing(resource_type.to_string()))
    }

    /// Check `config`, create it, then read it back.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        self.check_resource_config(resource_type, config.clone())
            .await?;
        let created = self.provider.create(resource_type, config).await?;
        self.refresh(resource_type, created).await
    }

    /// Update from `prior_state` to `planned_state`, then read it back.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, TestError> {
        let updated = self
            .provider
            .update(resource_type, prior_state, planned_state)
            .await?;
        self.refresh(resource_type, updated).await
    }

    /// Create from `config`, apply the top-level keys of `updates`, then
    /// delete. Returns the refreshed state seen just before the delete.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        config: Value,
        updates: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, config).await?;

        let mut planned = created.clone();
        if let (Value::Object(planned), Value::Object(updates)) = (&mut planned, updates) {
            planned.extend(updates);
        }
        let updated = self
            .lifecycle_update(resource_type, created, planned)
            .await?;

        self.provider.delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
    /// A read reported the resource as gone.
    Missing(String),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
            TestError::Missing(resource_type) => {
                write!(f, "{} was not found after the operation", resource_type)
            }
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Keep only the error diagnostics, failing if there are any.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that an error diagnostic's summary or detail contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matches = |d: &Diagnostic| {
        d.summary.contains(substring)
            || d.detail.as_deref().is_some_and(|detail| detail.contains(substring))
    };

    assert!(
        diagnostics.iter().any(|d| d.is_error() && matches(d)),
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

/// Assert that an error diagnostic points at `attribute`.
///
/// # Panics
///
/// Panics if no error diagnostic has that attribute path.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error && d.attribute.as_deref() == Some(attribute)),
        "Expected an error at '{}', got errors at {:?}",
        attribute,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.attribute.as_deref())
            .collect::<Vec<_>>()
    );
}
