// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analysis policy - every tunable used by rules and queries
//!
//! The classification heuristics (limit-type substrings, winding-side
//! threshold, slack control tokens) live here as named functions so that
//! boundary values can be tested directly.

use cgmes_lite_model::{Entity, FieldError};
use serde::{Deserialize, Serialize};

/// Side of a transformer winding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindingSide {
    High,
    Low,
}

/// Class of an operational limit, derived from its limit-type name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitClass {
    Permanent,
    Temporary,
    Other,
}

/// Classify a winding by rated voltage; strictly above the threshold is high side
pub fn classify_winding_side(rated_u: f64, threshold: f64) -> WindingSide {
    if rated_u > threshold {
        WindingSide::High
    } else {
        WindingSide::Low
    }
}

/// Classify a limit-type name by case-sensitive substring
///
/// The permanent token is checked first, so a name carrying both tokens is
/// permanent.
pub fn classify_limit_type(type_name: &str, policy: &AnalysisPolicy) -> LimitClass {
    if type_name.contains(policy.permanent_limit_token.as_str()) {
        LimitClass::Permanent
    } else if type_name.contains(policy.temporary_limit_token.as_str()) {
        LimitClass::Temporary
    } else {
        LimitClass::Other
    }
}

/// Check whether a generator control-source member marks a slack candidate
pub fn is_slack_control(member: &str, policy: &AnalysisPolicy) -> bool {
    if policy
        .slack_control_tokens
        .iter()
        .any(|token| member.contains(token.as_str()))
    {
        return true;
    }
    let lowered = member.to_lowercase();
    policy
        .slack_control_keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// Tunables for validation rules and queries
///
/// Deserializes from partial JSON; absent keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPolicy {
    /// Allowed |declared - base| voltage difference for voltage levels
    pub voltage_tolerance: f64,
    /// Rated voltage above which a winding is high side
    pub high_side_threshold: f64,
    /// Limit-type name substring marking permanent limits
    pub permanent_limit_token: String,
    /// Limit-type name substring marking temporary limits
    pub temporary_limit_token: String,
    /// Case-sensitive control-source substrings marking slack candidates
    pub slack_control_tokens: Vec<String>,
    /// Case-insensitive control-source substrings marking slack candidates
    pub slack_control_keywords: Vec<String>,
    /// Header element tags that must be closed in the raw text
    pub header_tags: Vec<String>,
    /// Known misspelled element tags and their correct spelling
    pub tag_typos: Vec<(String, String)>,
    /// Warn about identifiers that are not canonical UUIDs
    pub require_uuid_identifiers: bool,
    /// Entity types treated as generating units
    pub generating_unit_types: Vec<String>,
    /// Transformer end type checked for duplicate winding ids
    pub transformer_end_type: String,
    /// Limit set type walked by the limit ordering rule
    pub limit_set_type: String,
    /// Limit type reported by limit summaries and compared for ordering
    pub current_limit_type: String,
    /// Fields holding a limit's value, tried in order
    pub limit_value_fields: Vec<String>,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            voltage_tolerance: 1.0,
            high_side_threshold: 100.0,
            permanent_limit_token: "PATL".to_string(),
            temporary_limit_token: "TATL".to_string(),
            slack_control_tokens: vec!["onAGC".to_string()],
            slack_control_keywords: vec!["slack".to_string()],
            header_tags: vec!["md:FullModel".to_string()],
            tag_typos: vec![(
                "cim:IdentifiedObject.lname".to_string(),
                "cim:IdentifiedObject.name".to_string(),
            )],
            require_uuid_identifiers: true,
            generating_unit_types: [
                "GeneratingUnit",
                "ThermalGeneratingUnit",
                "HydroGeneratingUnit",
                "WindGeneratingUnit",
                "NuclearGeneratingUnit",
                "SolarGeneratingUnit",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            transformer_end_type: "PowerTransformerEnd".to_string(),
            limit_set_type: "OperationalLimitSet".to_string(),
            current_limit_type: "CurrentLimit".to_string(),
            limit_value_fields: vec![
                "CurrentLimit.value".to_string(),
                "CurrentLimit.normalValue".to_string(),
            ],
        }
    }
}

impl AnalysisPolicy {
    /// Create a policy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the voltage level tolerance
    pub fn with_voltage_tolerance(mut self, tolerance: f64) -> Self {
        self.voltage_tolerance = tolerance;
        self
    }

    /// Set the high-side winding threshold
    pub fn with_high_side_threshold(mut self, threshold: f64) -> Self {
        self.high_side_threshold = threshold;
        self
    }

    /// Set the permanent and temporary limit-type tokens
    pub fn with_limit_tokens(
        mut self,
        permanent: impl Into<String>,
        temporary: impl Into<String>,
    ) -> Self {
        self.permanent_limit_token = permanent.into();
        self.temporary_limit_token = temporary.into();
        self
    }

    /// Add a header tag to check for termination
    pub fn with_header_tag(mut self, tag: impl Into<String>) -> Self {
        self.header_tags.push(tag.into());
        self
    }

    /// Add a `(bad, correct)` tag typo pair
    pub fn with_tag_typo(mut self, bad: impl Into<String>, correct: impl Into<String>) -> Self {
        self.tag_typos.push((bad.into(), correct.into()));
        self
    }

    /// Enable or disable the UUID identifier check
    pub fn with_uuid_identifiers(mut self, required: bool) -> Self {
        self.require_uuid_identifiers = required;
        self
    }

    /// Add an entity type treated as a generating unit
    pub fn with_generating_unit_type(mut self, type_name: impl Into<String>) -> Self {
        self.generating_unit_types.push(type_name.into());
        self
    }

    /// Set the limit type walked by limit summaries and ordering checks
    pub fn with_current_limit_type(mut self, type_name: impl Into<String>) -> Self {
        self.current_limit_type = type_name.into();
        self
    }

    /// Check whether an entity is a limit of the configured current type
    pub fn is_current_limit(&self, limit: &Entity) -> bool {
        limit.is_type(&self.current_limit_type)
    }

    /// Check whether a type is a generating unit type
    pub fn is_generating_unit(&self, type_name: &str) -> bool {
        self.generating_unit_types.iter().any(|t| t == type_name)
    }

    /// Read a limit's value from the first configured field present,
    /// falling back to the limit's own `<Type>.value`
    pub fn limit_value(&self, limit: &Entity) -> Result<Option<f64>, FieldError> {
        for field in &self.limit_value_fields {
            if let Some(value) = limit.number(field)? {
                return Ok(Some(value));
            }
        }
        limit.number(&format!("{}.value", limit.type_name))
    }
}
