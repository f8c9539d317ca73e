//! Error types for the reconciliation engine.
//!
//! Three classes, mirroring how failures are handled: contract violations
//! ([`DiffError`], [`ProviderError::EmptyIdentifier`]) fail the run
//! immediately; transport failures ([`ProviderError::Operation`]) bubble up
//! wrapped with the phase that issued them; both abort the run without a
//! snapshot write ([`SyncError`]).

use std::fmt;

use thiserror::Error;

/// Contract violations raised by the diff kernel when a required input is
/// absent. Programmer errors: the run fails immediately.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DiffError {
    #[error("identity provider users is nil")]
    IdentityProviderUsersNil,

    #[error("scim users is nil")]
    ScimUsersNil,

    #[error("identity provider groups is nil")]
    IdentityProviderGroupsNil,

    #[error("scim groups is nil")]
    ScimGroupsNil,

    #[error("identity provider groups members is nil")]
    IdentityProviderGroupsMembersNil,

    #[error("scim groups members is nil")]
    ScimGroupsMembersNil,
}

/// Failure crossing one of the adapter ports.
///
/// Adapters wrap their internal errors into `Operation` with enough context
/// to name the failing call; retries stay inside the adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or API failure inside an adapter.
    #[error("{operation}: {message}")]
    Operation {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required identifier was empty when the adapter needed it.
    #[error("{operation}: {field} is empty")]
    EmptyIdentifier {
        operation: &'static str,
        field: &'static str,
    },
}

impl ProviderError {
    pub fn operation(operation: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Operation {
            operation,
            message: message.into(),
            source: None,
        }
    }

    pub fn operation_with_source(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProviderError::Operation {
            operation,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for adapter port operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Steps of a reconciliation run, in application order. Mutation phases are
/// strictly sequenced; a failure names the phase it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    LoadState,
    FetchProvider,
    FetchTarget,
    DeleteGroupsMembers,
    DeleteGroups,
    DeleteUsers,
    CreateUsers,
    UpdateUsers,
    CreateGroups,
    CreateGroupsMembers,
    SaveState,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::LoadState => "load state",
            SyncPhase::FetchProvider => "fetch identity provider",
            SyncPhase::FetchTarget => "fetch scim target",
            SyncPhase::DeleteGroupsMembers => "delete groups members",
            SyncPhase::DeleteGroups => "delete groups",
            SyncPhase::DeleteUsers => "delete users",
            SyncPhase::CreateUsers => "create users",
            SyncPhase::UpdateUsers => "update users",
            SyncPhase::CreateGroups => "create groups",
            SyncPhase::CreateGroupsMembers => "create groups members",
            SyncPhase::SaveState => "save state",
        };
        f.write_str(name)
    }
}

/// Failure of a reconciliation run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("{phase} failed: {source}")]
    Phase {
        phase: SyncPhase,
        #[source]
        source: ProviderError,
    },

    #[error("sync cancelled during {phase}")]
    Cancelled { phase: SyncPhase },
}

/// Result type for the sync driver.
pub type SyncResult<T> = Result<T, SyncError>;
