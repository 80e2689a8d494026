//! Resource and data source definitions.
//!
//! A [`Resource`] bundles a schema, the lifecycle handlers built from
//! [`crate::crud`] and an importer. The provider looks definitions up by type
//! name and never needs to know their payloads.

use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::context::Context;
use crate::crud::{CreateResource, DeleteResource, Handler, ReadResource, UpdateResource};
use crate::error::ProviderError;
use crate::id::decompose_id;
use crate::schema::Schema;
use crate::state::ResourceState;

/// Turns an import string into the initial state of a resource.
pub type Importer = Arc<dyn Fn(&str) -> Result<ResourceState, ProviderError> + Send + Sync>;

/// Importer that uses the import string as the id.
pub fn import_passthrough() -> Importer {
    Arc::new(|id: &str| -> Result<ResourceState, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::Validation("import id is empty".to_string()));
        }
        let mut state = ResourceState::new();
        state.set_id(id);
        Ok(state)
    })
}

/// Importer for composed ids.
///
/// The import string is split with `separator` into exactly `fields.len()`
/// parts, each stored under the matching field name. The import string itself
/// becomes the id.
pub fn import_composed(fields: &'static [&'static str], separator: &'static str) -> Importer {
    Arc::new(move |id: &str| -> Result<ResourceState, ProviderError> {
        let parts = decompose_id(id, separator, fields.len())?;
        let mut state = ResourceState::new();
        for (field, part) in fields.iter().zip(parts) {
            if part.is_empty() {
                return Err(ProviderError::Validation(format!(
                    "import id '{}' has an empty {}",
                    id, field
                )));
            }
            state.set(*field, part)?;
        }
        state.set_id(id);
        Ok(state)
    })
}

/// A managed resource type.
#[derive(Clone)]
pub struct Resource {
    name: String,
    schema: Schema,
    create: Arc<dyn Handler>,
    read: Arc<dyn Handler>,
    update: Option<Arc<dyn Handler>>,
    delete: Arc<dyn Handler>,
    importer: Importer,
}

impl Resource {
    /// Define a resource without in-place update and with the passthrough
    /// importer.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        create: CreateResource,
        read: ReadResource,
        delete: DeleteResource,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            create: Arc::new(create),
            read: Arc::new(read),
            update: None,
            delete: Arc::new(delete),
            importer: import_passthrough(),
        }
    }

    /// Support in-place update.
    pub fn with_update(mut self, update: UpdateResource) -> Self {
        self.update = Some(Arc::new(update));
        self
    }

    /// Replace the importer.
    pub fn with_importer(mut self, importer: Importer) -> Self {
        self.importer = importer;
        self
    }

    /// The type name, e.g. `cp_sidecar`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether the resource can be updated in place.
    pub fn supports_update(&self) -> bool {
        self.update.is_some()
    }

    /// Create the resource described by `state`.
    pub async fn create(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        self.create.call(ctx, client, state).await
    }

    /// Refresh `state`. A cleared id means the resource is gone.
    pub async fn read(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        self.read.call(ctx, client, state).await
    }

    /// Update the resource in place.
    pub async fn update(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        match &self.update {
            Some(update) => update.call(ctx, client, state).await,
            None => Err(ProviderError::Unimplemented(format!(
                "{} cannot be updated in place; changes require replacement",
                self.name
            ))),
        }
    }

    /// Delete the resource.
    pub async fn delete(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        self.delete.call(ctx, client, state).await
    }

    /// Build the initial state for importing `id`.
    pub fn import(&self, id: &str) -> Result<ResourceState, ProviderError> {
        (self.importer)(id)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("supports_update", &self.supports_update())
            .finish_non_exhaustive()
    }
}

/// A read-only data source type.
#[derive(Clone)]
pub struct DataSource {
    name: String,
    schema: Schema,
    read: Arc<dyn Handler>,
}

impl DataSource {
    /// Define a data source.
    pub fn new(name: impl Into<String>, schema: Schema, read: ReadResource) -> Self {
        Self {
            name: name.into(),
            schema,
            read: Arc::new(read),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data source schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read into `state`, which starts out as the data source configuration.
    pub async fn read(
        &self,
        ctx: &Context,
        client: &Client,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        self.read.call(ctx, client, state).await
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::id::SLASH;
    use crate::operation::{HttpMethod, OperationConfig, RequestData};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Empty {}

    impl RequestData for Empty {
        fn from_state(_state: &ResourceState) -> Result<Self, ProviderError> {
            Ok(Self {})
        }
    }

    fn thing() -> Resource {
        let url = |_: &ResourceState, c: &Client| c.endpoint("/v1/things");
        Resource::new(
            "cp_thing",
            Schema::v0().with_id("Thing id"),
            CreateResource::new(
                OperationConfig::new("ThingCreate", HttpMethod::Post, url).with_request::<Empty>(),
                OperationConfig::new("ThingRead", HttpMethod::Get, url),
            )
            .unwrap(),
            ReadResource::new(OperationConfig::new("ThingRead", HttpMethod::Get, url)).unwrap(),
            DeleteResource::new(OperationConfig::new("ThingDelete", HttpMethod::Delete, url))
                .unwrap(),
        )
    }

    #[test]
    fn test_import_passthrough() {
        let state = import_passthrough()("abc").unwrap();
        assert_eq!(state.id(), Some("abc"));
        assert_eq!(
            import_passthrough()("").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_import_composed() {
        let importer = import_composed(&["sidecar_id", "listener_id"], SLASH);
        let state = importer("s1/l1").unwrap();
        assert_eq!(state.get_str("sidecar_id"), Some("s1"));
        assert_eq!(state.get_str("listener_id"), Some("l1"));
        assert_eq!(state.id(), Some("s1/l1"));

        assert_eq!(importer("s1").unwrap_err().kind(), ErrorKind::Structural);
        assert_eq!(importer("s1/l1/x").unwrap_err().kind(), ErrorKind::Structural);
        assert_eq!(importer("/l1").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_update_without_handler_is_unimplemented() {
        let resource = thing();
        assert!(!resource.supports_update());

        let client = Client::with_token("cp.example.com", "t").unwrap();
        let mut state = ResourceState::new();
        let err = resource
            .update(&Context::background(), &client, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unimplemented);
        assert!(err.to_string().contains("cp_thing"));
    }

    #[test]
    fn test_accessors() {
        let resource = thing().with_importer(import_composed(&["a", "b"], SLASH));
        assert_eq!(resource.name(), "cp_thing");
        assert!(resource.schema().attributes.contains_key("id"));
        assert!(resource.import("x/y").is_ok());
        assert!(format!("{:?}", resource).contains("cp_thing"));
    }
}
