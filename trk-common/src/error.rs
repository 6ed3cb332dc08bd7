//! # Envelope Error Codes
//!
//! ## Design Principles
//!
//! 1. **Stable Codes**: Each variant maps to a fixed string carried in the
//!    envelope's `errorCode` field, so clients can branch without parsing text.
//! 2. **Categorized**: Codes are grouped by who has to act (client, store, server).
//! 3. **Low Overhead**: The enum is `Copy`; the wire string is `&'static str`.
//! 4. **Round Trip**: Clients turn the wire string back into a code with
//!    [`ErrorCode::from_wire`].

use core::fmt;

/// High-level category for grouping error codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCategory {
    /// The request itself was wrong (unknown command, missing field, conflict).
    Client,
    /// The external store failed the call.
    Store,
    /// Server-side invariant failures.
    Server,
}

/// Error codes carried by failure envelopes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// The command name is not in the command table.
    UnknownCommand,
    /// The frame parsed as JSON but not as a request object.
    InvalidRequest,
    /// The payload is missing a required field or has the wrong shape.
    InvalidPayload,
    /// A record with the same natural key already exists.
    AlreadyExists,
    /// The referenced record does not exist.
    NotFound,

    /// The store call failed.
    StoreError,

    /// An internal invariant was violated.
    InternalError,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 7] = [
        Self::UnknownCommand,
        Self::InvalidRequest,
        Self::InvalidPayload,
        Self::AlreadyExists,
        Self::NotFound,
        Self::StoreError,
        Self::InternalError,
    ];

    /// Returns the stable wire representation of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownCommand => "UNKNOWN_COMMAND",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::StoreError => "STORE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the coarse category of the code.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::UnknownCommand
            | Self::InvalidRequest
            | Self::InvalidPayload
            | Self::AlreadyExists
            | Self::NotFound => ErrorCategory::Client,
            Self::StoreError => ErrorCategory::Store,
            Self::InternalError => ErrorCategory::Server,
        }
    }

    /// Converts a wire string back into a typed code.
    pub fn from_wire(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, ErrorCode};

    #[test]
    fn maps_error_categories() {
        assert_eq!(ErrorCode::UnknownCommand.category(), ErrorCategory::Client);
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::Client);
        assert_eq!(ErrorCode::StoreError.category(), ErrorCategory::Store);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::Server);
    }

    #[test]
    fn wire_strings_are_unique_and_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_wire(code.as_str()), Some(code));
            assert_eq!(code.to_string(), code.as_str());
        }
        let mut seen: Vec<_> = ErrorCode::ALL.iter().map(|c| c.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn converts_from_wire() {
        assert_eq!(ErrorCode::from_wire("NOT_FOUND"), Some(ErrorCode::NotFound));
        assert_eq!(ErrorCode::from_wire("not_found"), None);
        assert_eq!(ErrorCode::from_wire(""), None);
    }
}
