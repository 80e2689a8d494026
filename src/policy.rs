//! Error classification for lifecycle operations.
//!
//! Control-plane objects can disappear outside of the provider, either by
//! hand or because deleting a parent cascades to its children. A missing
//! remote object must then read back as "absent" rather than fail the run.

use tracing::warn;

use crate::error::ProviderError;
use crate::state::ResourceState;

/// Identifier used in error context before the remote assigned one.
pub const NEW_RESOURCE: &str = "<new>";

/// The lifecycle verb an operation config is executed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a new resource.
    Create,
    /// Refresh an existing resource.
    Read,
    /// Update an existing resource in place.
    Update,
    /// Delete a resource.
    Delete,
}

/// How a failed call is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Wrap the error with operation context and return it.
    #[default]
    Propagate,
    /// On a read, treat "not found" as deleted outside the provider: clear
    /// the id and succeed.
    IgnoreNotFoundOnRead,
    /// On a delete, treat "not found" as already deleted and succeed.
    IgnoreNotFoundOnDelete,
}

impl ErrorPolicy {
    /// Handle `err`, raised by operation `name` while executing `operation`
    /// against `state`.
    ///
    /// Returns `Ok(())` when the error was absorbed, possibly after clearing
    /// the id in `state`.
    pub fn handle(
        self,
        operation: Operation,
        name: &str,
        err: ProviderError,
        state: &mut ResourceState,
    ) -> Result<(), ProviderError> {
        let resource = state.id().unwrap_or(NEW_RESOURCE).to_string();
        match (self, operation) {
            (Self::IgnoreNotFoundOnRead, Operation::Read) if err.is_not_found() => {
                warn!(
                    operation = name,
                    resource = %resource,
                    "Resource not found remotely, removing it from state"
                );
                state.clear_id();
                Ok(())
            }
            (Self::IgnoreNotFoundOnDelete, Operation::Delete) if err.is_not_found() => {
                warn!(
                    operation = name,
                    resource = %resource,
                    "Resource already deleted remotely"
                );
                Ok(())
            }
            _ => Err(err.in_operation(name, resource)),
        }
    }
}
