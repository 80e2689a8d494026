//! The declarative state handed to and returned from lifecycle handlers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Name of the attribute holding the resource identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// The attributes of one resource instance.
///
/// State is a JSON object. The resource identifier lives in the `id`
/// attribute; a missing, null or empty `id` means the resource does not exist
/// remotely (yet, or anymore).
///
/// Handlers should not poke at individual keys. Instead, decode the whole
/// state once into the resource's typed configuration struct with
/// [`ResourceState::decode`] and write results back with
/// [`ResourceState::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    attributes: Map<String, Value>,
}

impl ResourceState {
    /// An empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a JSON value. `null` yields an empty state.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        match value {
            Value::Object(attributes) => Ok(Self { attributes }),
            Value::Null => Ok(Self::new()),
            other => Err(ProviderError::Structural(format!(
                "resource state must be an object, got {}",
                other
            ))),
        }
    }

    /// The state as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Consume the state into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }

    /// The resource identifier, if the resource exists.
    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_ATTRIBUTE).filter(|id| !id.is_empty())
    }

    /// Whether the state refers to an existing remote resource.
    pub fn exists(&self) -> bool {
        self.id().is_some()
    }

    /// Set the resource identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.attributes
            .insert(ID_ATTRIBUTE.to_string(), Value::String(id.into()));
    }

    /// Clear the identifier, marking the resource as gone.
    pub fn clear_id(&mut self) {
        self.attributes.remove(ID_ATTRIBUTE);
    }

    /// Raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String attribute value that must be present and non-empty.
    pub fn require_str(&self, key: &str) -> Result<&str, ProviderError> {
        self.get_str(key).filter(|s| !s.is_empty()).ok_or_else(|| {
            ProviderError::Structural(format!("attribute '{}' must be a non-empty string", key))
        })
    }

    /// Set one attribute.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), ProviderError> {
        self.attributes.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Remove one attribute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Decode the whole state into a typed view.
    ///
    /// Top-level `null` attributes are treated as unset.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        let set: Map<String, Value> = self
            .attributes
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(set))?)
    }

    /// Write every field of `value` (which must serialize to an object) into
    /// the state. Fields serialized as `null` are written as `null`.
    pub fn merge<T: Serialize>(&mut self, value: &T) -> Result<(), ProviderError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => {
                self.attributes.extend(fields);
                Ok(())
            }
            other => Err(ProviderError::Structural(format!(
                "only objects can be merged into state, got {}",
                other
            ))),
        }
    }
}
