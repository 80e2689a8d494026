//! Values exchanged with the runtime besides plain state.

use serde::{Deserialize, Serialize};

/// A resource produced by an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state, as read back from the control plane.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// The type names a provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new(
            "cp_sidecar_listener",
            json!({"id": "sc-1/ln-7", "sidecar_id": "sc-1", "listener_id": "ln-7"}),
        );
        assert_eq!(imported.resource_type, "cp_sidecar_listener");
        assert_eq!(imported.state["id"], "sc-1/ln-7");
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = ProviderMetadata {
            resources: vec!["cp_sidecar".to_string()],
            data_sources: vec![],
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json, json!({"resources": ["cp_sidecar"], "data_sources": []}));
    }
}
