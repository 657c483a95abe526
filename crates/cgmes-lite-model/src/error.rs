// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for CGMES parsing operations

use crate::EntityId;
use thiserror::Error;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that make a document structurally unreadable
///
/// These are fatal: loading stops and the error is returned to the caller.
/// Semantic problems (duplicate ids, dangling references, ...) are never
/// reported through this type; they become [`crate::Finding`]s instead.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Input bytes are not valid UTF-8
    #[error("Invalid encoding: {0}")]
    Encoding(String),

    /// Malformed XML (mismatched tags, bad attributes, syntax errors)
    #[error("Malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// Input ended while elements were still open
    #[error("Unexpected end of document: {open} element(s) not closed, innermost <{innermost}>")]
    UnexpectedEof { open: usize, innermost: String },

    /// Document has no root element
    #[error("Document contains no root element")]
    Empty,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ParseError {
    /// Create a new XML error
    pub fn xml(position: u64, msg: impl Into<String>) -> Self {
        ParseError::Xml {
            position,
            message: msg.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ParseError::Other(msg.into())
    }
}

/// Errors raised while coercing a text field at read time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Field text is not a floating point number
    #[error("Field {field} of entity {entity} is not a number: {value:?}")]
    InvalidNumber {
        entity: EntityId,
        field: String,
        value: String,
    },

    /// Field text is not an integer
    #[error("Field {field} of entity {entity} is not an integer: {value:?}")]
    InvalidInteger {
        entity: EntityId,
        field: String,
        value: String,
    },
}

impl FieldError {
    /// Entity whose field failed to coerce
    pub fn entity(&self) -> &EntityId {
        match self {
            FieldError::InvalidNumber { entity, .. } | FieldError::InvalidInteger { entity, .. } => {
                entity
            }
        }
    }
}
