use crate::model::{RequestStatus, Role};

/// Errors raised by the portal engines.
///
/// Lookup misses that callers can tolerate are modelled as `Option`, so
/// `NotFound` only appears where an operation needs the target to exist.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("request {id} is already {status} and cannot be reviewed again")]
    InvalidTransition { id: String, status: RequestStatus },

    #[error("book {book_id} is out of stock")]
    OutOfStock { book_id: String },

    #[error("book {book_id} is already borrowed by this user")]
    AlreadyBorrowed { book_id: String },

    #[error("{0}")]
    Validation(String),

    #[error("no user is logged in")]
    Unauthenticated,

    #[error("this action requires the {required} role")]
    Forbidden { required: Role },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PortalError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable error code surfaced over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::AlreadyBorrowed { .. } => "already_borrowed",
            Self::Validation(_) => "bad_params",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::Storage(_) => "storage_failed",
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;
