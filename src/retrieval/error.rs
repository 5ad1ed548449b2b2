use serde::Serialize;
use thiserror::Error;

/// Recoverable tool failure. Reported back to the planner as a failed tool turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("scope not active: {0}")]
    ScopeNotActive(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

impl ToolError {
    /// Stable code used in serialized tool turns.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ScopeNotActive(_) => "scope_not_active",
            Self::EntryNotFound(_) => "entry_not_found",
        }
    }

    pub fn payload(&self) -> ToolErrorPayload {
        ToolErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Wire shape of a [`ToolError`] inside a tool turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorPayload {
    pub code: &'static str,
    pub message: String,
}

pub type ToolResult<T> = Result<T, ToolError>;
