//! Wire error types
//!
//! A device rejection carries a status code and a description. The rendered
//! form, `rpc error: code = <Code> desc = <description>`, is preserved
//! verbatim into the affected device change's status message, so the
//! rendering here is part of the public contract.

use std::fmt;

use thiserror::Error;

/// Status code carried by a wire error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Cancelled,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    Internal,
    Unavailable,
    Unknown,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::Cancelled => "Canceled",
            Code::InvalidArgument => "InvalidArgument",
            Code::DeadlineExceeded => "DeadlineExceeded",
            Code::NotFound => "NotFound",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Error returned by a device session call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rpc error: code = {code} desc = {message}")]
pub struct WireError {
    pub code: Code,
    pub message: String,
}

impl WireError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        WireError {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        WireError::new(Code::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        WireError::new(Code::Unavailable, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        WireError::new(Code::DeadlineExceeded, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        WireError::new(Code::Cancelled, message)
    }
}
