//! # Error Types
//!
//! Structured error types for calc_core. Every failure a calculator, the
//! shop store, or the AI gateway client can produce is one of these variants,
//! so callers can branch on them and front ends can show a short message.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_diameter(diameter_mm: f64) -> CalcResult<()> {
//!     if diameter_mm <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "diameter_mm".to_string(),
//!             value: diameter_mm.to_string(),
//!             reason: "Diameter must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation, storage and gateway operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Material not found in the reference catalog or custom rows
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// A referenced entity (machine, record, menu module, user) does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An entity with the same key already exists
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: String, key: String },

    /// Calculation produced no meaningful result
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// The acting user lacks the role needed for an operation
    #[error("Permission denied: {user_id} may not {action}")]
    PermissionDenied { user_id: String, action: String },

    /// The AI gateway answered with a non-success status
    #[error("Gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    /// The AI gateway rejected the request because of rate limiting (HTTP 429)
    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    /// The AI gateway account has run out of credits (HTTP 402)
    #[error("AI usage quota exhausted")]
    QuotaExceeded,

    /// Network failure talking to the gateway
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a Duplicate error
    pub fn duplicate(entity: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::Duplicate {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from anything displayable
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        CalcError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Create a PermissionDenied error
    pub fn permission_denied(user_id: impl Into<String>, action: impl Into<String>) -> Self {
        CalcError::PermissionDenied {
            user_id: user_id.into(),
            action: action.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry later)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::FileLocked { .. } | CalcError::RateLimited | CalcError::Network { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::Duplicate { .. } => "DUPLICATE",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::PermissionDenied { .. } => "PERMISSION_DENIED",
            CalcError::Gateway { .. } => "GATEWAY_ERROR",
            CalcError::RateLimited => "RATE_LIMITED",
            CalcError::QuotaExceeded => "QUOTA_EXCEEDED",
            CalcError::Network { .. } => "NETWORK_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Short text suitable for a notification toast.
    ///
    /// Gateway and backend failures are passed through as-is; everything
    /// else uses the full `Display` message.
    pub fn user_message(&self) -> String {
        match self {
            CalcError::RateLimited => "Too many requests. Please wait a moment and try again.".to_string(),
            CalcError::QuotaExceeded => "AI credits are used up. Please top up the workspace.".to_string(),
            CalcError::Gateway { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::serialization(e)
    }
}
