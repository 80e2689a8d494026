//! Managed resource types.
//!
//! Each module defines the payloads of one control-plane object and wires
//! them into the generic executors.

use crate::error::ProviderError;
use crate::resource::Resource;
use crate::state::ResourceState;

pub mod datalabel;
pub mod integration_slack_alerts;
pub mod repository;
pub mod repository_binding;
pub mod sidecar;
pub mod sidecar_listener;

/// Repository types known to the control plane.
pub const REPOSITORY_TYPES: &[&str] = &[
    "denodo",
    "dremio",
    "dynamodb",
    "mariadb",
    "mongodb",
    "mysql",
    "oracle",
    "postgresql",
    "redshift",
    "s3",
    "snowflake",
    "sqlserver",
];

/// Every resource type served by the provider.
pub fn all() -> Result<Vec<Resource>, ProviderError> {
    Ok(vec![
        sidecar::resource()?,
        sidecar_listener::resource()?,
        repository::resource()?,
        repository_binding::resource()?,
        datalabel::resource()?,
        integration_slack_alerts::resource()?,
    ])
}

/// A path segment taken from a string attribute, empty when unset.
pub(crate) fn segment<'a>(state: &'a ResourceState, key: &str) -> &'a str {
    state.get_str(key).unwrap_or_default()
}

/// The id as a path segment, empty when unset.
pub(crate) fn id_segment(state: &ResourceState) -> &str {
    state.id().unwrap_or_default()
}
