//! `cp_sidecar_id`: looks up a sidecar id by name.

use serde::Deserialize;

use crate::crud::ReadResource;
use crate::error::ProviderError;
use crate::operation::{HttpMethod, OperationConfig, ResponseData};
use crate::resource::DataSource;
use crate::schema::{Attribute, Schema};
use crate::state::ResourceState;

/// Data source type name.
pub const TYPE_NAME: &str = "cp_sidecar_id";

#[derive(Debug, Deserialize)]
struct SidecarSummary {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SidecarListEntry {
    id: String,
    sidecar: SidecarSummary,
}

/// Response of `GET /v1/sidecars`.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct SidecarList(Vec<SidecarListEntry>);

impl ResponseData for SidecarList {
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let name = state.require_str("sidecar_name")?;
        let entry = self
            .0
            .iter()
            .find(|entry| entry.sidecar.name == name)
            .ok_or_else(|| ProviderError::NotFound(format!("no sidecar named '{}'", name)))?;
        state.set_id(&entry.id);
        Ok(())
    }
}

/// Schema of `cp_sidecar_id`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Looks up the id of a sidecar by name")
        .with_id("The sidecar id")
        .with_attribute("sidecar_name", Attribute::required_string())
}

/// The `cp_sidecar_id` definition.
pub fn data_source() -> Result<DataSource, ProviderError> {
    let read = OperationConfig::new("SidecarIdRead", HttpMethod::Get, |_, client| {
        client.endpoint("/v1/sidecars")
    })
    .with_response::<SidecarList>();

    Ok(DataSource::new(TYPE_NAME, schema(), ReadResource::new(read)?))
}
