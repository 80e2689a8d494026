//! Read-only data source types.
//!
//! Data source reads propagate every error: a missing parent is a
//! configuration mistake, not an object deleted outside the provider.

use crate::error::ProviderError;
use crate::resource::DataSource;

pub mod sidecar_id;
pub mod sidecar_listener;

/// Every data source type served by the provider.
pub fn all() -> Result<Vec<DataSource>, ProviderError> {
    Ok(vec![sidecar_id::data_source()?, sidecar_listener::data_source()?])
}
