//! Declarative descriptions of a single HTTP call against the control plane.
//!
//! An [`OperationConfig`] says how to perform one lifecycle verb for one
//! resource type: which URL to hit, with which method, which payload to send
//! and how to fold the response back into state. The executors in
//! [`crate::crud`] run these descriptions; resource definitions only build
//! them.
//!
//! # Example
//!
//! ```
//! use controlplane_provider::operation::{HttpMethod, OperationConfig, RequestData, ResponseData};
//! use controlplane_provider::policy::ErrorPolicy;
//! use controlplane_provider::{ProviderError, ResourceState};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct NewWidget {
//!     name: String,
//! }
//!
//! impl RequestData for NewWidget {
//!     fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
//!         Ok(Self { name: state.require_str("name")?.to_string() })
//!     }
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Created {
//!     id: String,
//! }
//!
//! impl ResponseData for Created {
//!     fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
//!         state.set_id(&self.id);
//!         Ok(())
//!     }
//! }
//!
//! let config = OperationConfig::new("WidgetCreate", HttpMethod::Post, |_, client| {
//!     client.endpoint("/v1/widgets")
//! })
//! .with_request::<NewWidget>()
//! .with_response::<Created>()
//! .with_error_policy(ErrorPolicy::Propagate);
//!
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::Client;
use crate::error::ProviderError;
use crate::policy::ErrorPolicy;
use crate::state::ResourceState;

/// HTTP methods used against the control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// Retrieve a resource.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Remove a resource.
    Delete,
}

impl HttpMethod {
    /// Whether requests with this method carry a body.
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// The matching `reqwest` method.
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request payload that is populated from declarative state.
pub trait RequestData: Serialize + Send {
    /// Build the payload from the current state.
    fn from_state(state: &ResourceState) -> Result<Self, ProviderError>
    where
        Self: Sized;
}

/// A decoded response payload that can populate declarative state.
pub trait ResponseData: fmt::Debug + Send {
    /// Write the decoded fields into `state`.
    fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError>;
}

/// Builds the URL of an operation from state and client.
pub type UrlFactory = Arc<dyn Fn(&ResourceState, &Client) -> String + Send + Sync>;

/// Builds the JSON request body from state.
pub type RequestFactory = Arc<dyn Fn(&ResourceState) -> Result<Value, ProviderError> + Send + Sync>;

/// Decodes a response body into a state writer.
pub type ResponseFactory =
    Arc<dyn Fn(&[u8]) -> Result<Box<dyn ResponseData>, ProviderError> + Send + Sync>;

/// Describes one HTTP call for one lifecycle verb of one resource type.
#[derive(Clone)]
pub struct OperationConfig {
    name: String,
    method: HttpMethod,
    url: UrlFactory,
    request: Option<RequestFactory>,
    response: Option<ResponseFactory>,
    error_policy: ErrorPolicy,
}

impl OperationConfig {
    /// Create a config with no payloads and the [`ErrorPolicy::Propagate`]
    /// policy.
    ///
    /// `url` must be a pure function of its inputs.
    pub fn new<F>(name: impl Into<String>, method: HttpMethod, url: F) -> Self
    where
        F: Fn(&ResourceState, &Client) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            method,
            url: Arc::new(url),
            request: None,
            response: None,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Send a `T` built from state as the request body.
    pub fn with_request<T: RequestData + 'static>(mut self) -> Self {
        self.request = Some(Arc::new(
            |state: &ResourceState| -> Result<Value, ProviderError> {
                let payload = T::from_state(state)?;
                Ok(serde_json::to_value(&payload)?)
            },
        ));
        self
    }

    /// Decode the response body as a `T` and write it into state.
    ///
    /// An empty body decodes as `{}`.
    pub fn with_response<T: ResponseData + DeserializeOwned + 'static>(mut self) -> Self {
        self.response = Some(Arc::new(
            |body: &[u8]| -> Result<Box<dyn ResponseData>, ProviderError> {
                let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
                    b"{}"
                } else {
                    body
                };
                let decoded: T = serde_json::from_slice(body)?;
                Ok(Box::new(decoded))
            },
        ));
        self
    }

    /// Set the error handling policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Name used in logs and error context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The error handling policy.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Whether a request body is sent.
    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }

    /// Whether the response is decoded into state.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Check that a request payload is configured exactly when the method
    /// carries a body.
    pub fn validate(&self) -> Result<(), ProviderError> {
        match (self.method.carries_body(), self.request.is_some()) {
            (true, false) => Err(ProviderError::Validation(format!(
                "operation {} uses {} but has no request payload",
                self.name, self.method
            ))),
            (false, true) => Err(ProviderError::Validation(format!(
                "operation {} uses {} which cannot carry a request payload",
                self.name, self.method
            ))),
            _ => Ok(()),
        }
    }

    /// Build the URL for `state`.
    pub fn url(&self, state: &ResourceState, client: &Client) -> String {
        (self.url)(state, client)
    }

    /// Build the request body for `state`, if one is configured.
    pub fn request_body(&self, state: &ResourceState) -> Result<Option<Value>, ProviderError> {
        self.request.as_ref().map(|build| build(state)).transpose()
    }

    /// Decode `body`, if a response payload is configured.
    pub fn decode_response(
        &self,
        body: &[u8],
    ) -> Result<Option<Box<dyn ResponseData>>, ProviderError> {
        self.response.as_ref().map(|decode| decode(body)).transpose()
    }
}

impl fmt::Debug for OperationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationConfig")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("has_request", &self.has_request())
            .field("has_response", &self.has_response())
            .field("error_policy", &self.error_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Body {
        name: String,
    }

    impl RequestData for Body {
        fn from_state(state: &ResourceState) -> Result<Self, ProviderError> {
            Ok(Self {
                name: state.require_str("name")?.to_string(),
            })
        }
    }

    #[derive(Debug, Deserialize)]
    struct Created {
        #[serde(rename = "ID")]
        id: String,
    }

    impl ResponseData for Created {
        fn write_to_state(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
            state.set_id(&self.id);
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Nothing {}

    impl ResponseData for Nothing {
        fn write_to_state(&self, _state: &mut ResourceState) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn client() -> Client {
        Client::with_token("cp.example.com", "token").unwrap()
    }

    #[test]
    fn test_method_display_and_body() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Put.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
        assert_eq!(HttpMethod::Delete.as_reqwest(), reqwest::Method::DELETE);
    }

    #[test]
    fn test_validate_payload_presence() {
        let url = |_: &ResourceState, c: &Client| c.endpoint("/v1/things");

        assert!(OperationConfig::new("a", HttpMethod::Post, url)
            .with_request::<Body>()
            .validate()
            .is_ok());
        assert!(OperationConfig::new("b", HttpMethod::Get, url).validate().is_ok());

        let err = OperationConfig::new("c", HttpMethod::Put, url)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("has no request payload"));

        let err = OperationConfig::new("d", HttpMethod::Delete, url)
            .with_request::<Body>()
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("cannot carry"));
    }

    #[test]
    fn test_url_is_deterministic() {
        let config = OperationConfig::new("ThingRead", HttpMethod::Get, |state, client| {
            client.endpoint(&format!("/v1/things/{}", state.id().unwrap_or_default()))
        });
        let state = ResourceState::from_value(json!({"id": "t1"})).unwrap();
        let client = client();
        let first = config.url(&state, &client);
        for _ in 0..10 {
            assert_eq!(config.url(&state, &client), first);
        }
        assert_eq!(first, "https://cp.example.com/v1/things/t1");
    }

    #[test]
    fn test_request_body() {
        let config = OperationConfig::new("ThingCreate", HttpMethod::Post, |_, c| c.endpoint("/x"))
            .with_request::<Body>();
        let state = ResourceState::from_value(json!({"name": "n"})).unwrap();
        assert_eq!(config.request_body(&state).unwrap(), Some(json!({"name": "n"})));

        let err = config.request_body(&ResourceState::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        let get = OperationConfig::new("ThingRead", HttpMethod::Get, |_, c| c.endpoint("/x"));
        assert_eq!(get.request_body(&state).unwrap(), None);
    }

    #[test]
    fn test_decode_response() {
        let config = OperationConfig::new("ThingCreate", HttpMethod::Post, |_, c| c.endpoint("/x"))
            .with_response::<Created>();

        let data = config.decode_response(br#"{"ID": "t9"}"#).unwrap().unwrap();
        let mut state = ResourceState::new();
        data.write_to_state(&mut state).unwrap();
        assert_eq!(state.id(), Some("t9"));

        let err = config.decode_response(b"{\"ID\": 5}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        let err = config.decode_response(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_empty_body_decodes_as_empty_object() {
        let config = OperationConfig::new("ThingPut", HttpMethod::Get, |_, c| c.endpoint("/x"))
            .with_response::<Nothing>();
        assert!(config.decode_response(b"").unwrap().is_some());
        assert!(config.decode_response(b"  \n").unwrap().is_some());

        let none = OperationConfig::new("ThingDelete", HttpMethod::Delete, |_, c| c.endpoint("/x"));
        assert!(none.decode_response(b"garbage").unwrap().is_none());
    }
}
