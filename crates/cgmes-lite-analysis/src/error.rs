// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for validation and queries

use cgmes_lite_model::{EntityId, FieldError};
use thiserror::Error;

/// Analysis result type
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error a validation rule may return; the validator turns it into a finding
pub type RuleError = AnalysisError;

/// Analysis errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A field needed by the computation holds unparsable text
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Rule-specific failure
    #[error("Rule {rule} failed: {message}")]
    Rule { rule: String, message: String },
}

impl AnalysisError {
    /// Create a rule error
    pub fn rule(rule: impl Into<String>, msg: impl Into<String>) -> Self {
        AnalysisError::Rule {
            rule: rule.into(),
            message: msg.into(),
        }
    }

    /// Entity the error is about, if known
    pub fn entity(&self) -> Option<&EntityId> {
        match self {
            AnalysisError::Field(e) => Some(e.entity()),
            AnalysisError::Rule { .. } => None,
        }
    }
}
