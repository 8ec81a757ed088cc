//! crates/lexvault_core/src/error.rs
//!
//! The error type for every operation on a `Workspace`.

use chrono::{DateTime, Utc};

use crate::ports::PortError;
use crate::workspace::{DocumentPhase, Feature};

/// Broad failure categories, used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing changed.
    Validation,
    /// Wrong credentials, restricted account, or insufficient privileges.
    Authorization,
    /// The operation does not fit the current state (wrong phase, busy, stale).
    Conflict,
    /// The generative or mail collaborator failed; the operation may be retried.
    Collaborator,
    /// The persistence substrate failed.
    Storage,
    /// A session-scoped operation was invoked with no active session.
    Misuse,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    // --- Validation ---
    #[error("This document does not contain sufficient readable information to provide a professional review.")]
    EmptyDocument,
    #[error("An account is already registered for {0}.")]
    EmailTaken(String),
    #[error("A valid email address is required.")]
    InvalidEmail,
    #[error("PIN must be 4-6 digits.")]
    InvalidPin,
    #[error("{0} cannot be empty.")]
    EmptyInput(&'static str),

    // --- Authorization ---
    #[error("Account identity not found.")]
    AccountNotFound,
    #[error("This account has been administratively restricted.")]
    AccountRestricted,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("The security code entered is invalid.")]
    InvalidCode,
    #[error("Incorrect security PIN. {remaining} attempt(s) remaining.")]
    IncorrectPin { remaining: u32 },
    #[error("Too many incorrect PIN attempts. The vault is locked until {0}.")]
    VaultLockedOut(DateTime<Utc>),
    #[error("The vault is locked.")]
    VaultLocked,
    #[error("No vault PIN has been set.")]
    PinNotSet,
    #[error("Administrative privileges are required.")]
    Forbidden,
    #[error("This operation is only available to workspace members.")]
    MemberOnly,
    #[error("The session has expired.")]
    SessionExpired,

    // --- Conflict ---
    #[error("A vault PIN is already set. Wipe the vault to choose a new one.")]
    PinAlreadySet,
    #[error("Cannot {operation} while the document is {phase}.")]
    InvalidPhase {
        operation: &'static str,
        phase: DocumentPhase,
    },
    #[error("The review produced no usable findings and cannot be approved.")]
    TotalFailure,
    #[error("A review request is already in progress.")]
    Busy,
    #[error("The workspace changed while the request was in flight; the response was discarded.")]
    Stale,
    #[error("The {0} feature is currently disabled.")]
    FeatureDisabled(Feature),
    #[error("The platform is currently undergoing maintenance. Submissions are temporarily restricted.")]
    Maintenance,

    // --- Collaborators & storage ---
    #[error("An external service could not complete the request: {0}")]
    Collaborator(#[source] PortError),
    #[error("Storage failure: {0}")]
    Storage(#[source] PortError),

    // --- Misuse ---
    #[error("No active session.")]
    NoActiveSession,
}

impl WorkspaceError {
    pub fn kind(&self) -> ErrorKind {
        use WorkspaceError::*;
        match self {
            EmptyDocument | EmailTaken(_) | InvalidEmail | InvalidPin | EmptyInput(_) => {
                ErrorKind::Validation
            }
            AccountNotFound | AccountRestricted | InvalidCredentials | InvalidCode
            | IncorrectPin { .. } | VaultLockedOut(_) | VaultLocked | PinNotSet | Forbidden
            | MemberOnly | SessionExpired => ErrorKind::Authorization,
            PinAlreadySet | InvalidPhase { .. } | TotalFailure | Busy | Stale
            | FeatureDisabled(_) | Maintenance => ErrorKind::Conflict,
            Collaborator(_) => ErrorKind::Collaborator,
            Storage(_) => ErrorKind::Storage,
            NoActiveSession => ErrorKind::Misuse,
        }
    }
}

/// Store failures are the only `PortError`s converted implicitly; collaborator failures
/// are mapped explicitly at each call site.
impl From<PortError> for WorkspaceError {
    fn from(e: PortError) -> Self {
        WorkspaceError::Storage(e)
    }
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
