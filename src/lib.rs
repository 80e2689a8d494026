//! Control-plane provider
//!
//! An infrastructure-as-code provider that manages sidecars, listeners,
//! repositories, repository bindings, data labels and integrations through
//! the control-plane REST API.
//!
//! # Overview
//!
//! Every resource type is a configuration of one small framework:
//!
//! - **Operation configs** ([`operation::OperationConfig`]): URL builder,
//!   HTTP method, request/response payloads and error policy for one call
//! - **Executors** ([`crud`]): generic create/read/update/delete handlers
//!   with a follow-up read after create and update
//! - **Payload capabilities** ([`operation::RequestData`],
//!   [`operation::ResponseData`]): state to wire, and wire to state
//! - **Composed ids** ([`id`]): `parent/child` identifiers with strict arity
//! - **Error policies** ([`policy`]): a 404 on read or delete means the
//!   object is already gone
//!
//! The runtime talks to [`ControlPlaneProvider`] through the
//! [`ProviderService`] trait, with JSON state.
//!
//! # Quick Start
//!
//! ```no_run
//! use controlplane_provider::{ControlPlaneProvider, ProviderError, ProviderService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), ProviderError> {
//! controlplane_provider::try_init_logging();
//!
//! let provider = ControlPlaneProvider::new()?;
//! provider
//!     .configure(json!({"control_plane": "cp.example.com", "token": "secret"}))
//!     .await?;
//!
//! let listener = provider
//!     .create(
//!         "cp_sidecar_listener",
//!         json!({"sidecar_id": "sc-1", "repo_types": ["mysql"]}),
//!     )
//!     .await?;
//! assert_eq!(listener["id"], "sc-1/ln-1");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod context;
pub mod crud;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod id;
pub mod logging;
pub mod operation;
pub mod policy;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod service;
pub mod state;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::Client;
pub use config::ProviderConfig;
pub use context::Context;
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use error::{ErrorKind, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::ControlPlaneProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use state::ResourceState;
pub use types::{ImportedResource, ProviderMetadata};
pub use validation::{validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
