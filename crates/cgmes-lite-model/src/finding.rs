// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation findings
//!
//! Findings are how every non-fatal problem is reported, whether it was
//! noticed while loading (missing identity, dangling reference) or by a
//! validation rule. They are plain data; rendering is left to the caller.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Questionable but usable data
    Warning,
    /// Inconsistent data
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Category naming the check that produced a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingCategory {
    /// Recognised element without identifier, dropped during extraction
    MissingIdentity,
    /// Reference whose target is neither an entity nor an enumeration literal
    DanglingReference,
    /// Identifier carried by more than one element
    DuplicateIdentifier,
    /// Identifier shared by several transformer ends
    DuplicateWindingIdentifier,
    /// Temporary current limit below the permanent one
    LimitOrderingViolation,
    /// Voltage level name disagrees with its base voltage
    VoltageLevelMismatch,
    /// Equivalent injection with zero resistance and reactance
    ZeroImpedanceInjection,
    /// Unterminated header tag or misspelled tag in the raw document
    StructuralTagIntegrity,
    /// Identifier that is not a canonical UUID
    MalformedIdentifier,
    /// A rule failed internally and was skipped
    RuleExecutionFailed,
    /// No generating unit is marked as slack
    NoExplicitSlack,
}

impl FindingCategory {
    /// Get the category name
    pub fn name(&self) -> &'static str {
        match self {
            FindingCategory::MissingIdentity => "MissingIdentity",
            FindingCategory::DanglingReference => "DanglingReference",
            FindingCategory::DuplicateIdentifier => "DuplicateIdentifier",
            FindingCategory::DuplicateWindingIdentifier => "DuplicateWindingIdentifier",
            FindingCategory::LimitOrderingViolation => "LimitOrderingViolation",
            FindingCategory::VoltageLevelMismatch => "VoltageLevelMismatch",
            FindingCategory::ZeroImpedanceInjection => "ZeroImpedanceInjection",
            FindingCategory::StructuralTagIntegrity => "StructuralTagIntegrity",
            FindingCategory::MalformedIdentifier => "MalformedIdentifier",
            FindingCategory::RuleExecutionFailed => "RuleExecutionFailed",
            FindingCategory::NoExplicitSlack => "NoExplicitSlack",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One validation result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// Check that produced the finding
    pub category: FindingCategory,
    /// Human readable description
    pub message: String,
    /// Implicated entities in discovery order, without repeats
    pub entities: Vec<EntityId>,
}

impl Finding {
    /// Create a finding with no implicated entities
    pub fn new(severity: Severity, category: FindingCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            entities: Vec::new(),
        }
    }

    /// Create an error finding
    pub fn error(category: FindingCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    /// Create a warning finding
    pub fn warning(category: FindingCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    /// Add an implicated entity (repeats are ignored)
    pub fn with_entity(mut self, id: &EntityId) -> Self {
        if !self.entities.contains(id) {
            self.entities.push(id.clone());
        }
        self
    }

    /// Add several implicated entities
    pub fn with_entities<'a>(self, ids: impl IntoIterator<Item = &'a EntityId>) -> Self {
        ids.into_iter().fold(self, Finding::with_entity)
    }

    /// Check severity
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}
