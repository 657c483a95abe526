// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CGMES-Lite Analysis (Trait-Based)
//!
//! Validation rules and topological queries for CGMES grid models. This
//! crate uses the `ModelGraph` trait from `cgmes-lite-model` for all
//! lookups, making it independent of any specific parser implementation.
//!
//! ## Overview
//!
//! - **Validation**: independent rules producing [`Finding`]s, isolated so a
//!   failing rule cannot suppress the others
//! - **Queries**: capacity, regulation mode, transformer windings, line
//!   limits and slack generator assessment as structured records
//! - **Policy**: every threshold and token the heuristics use, loadable from
//!   JSON
//!
//! ## Architecture
//!
//! - `ValidationRule`: Trait for individual checks
//! - `Validator`: Ordered rule list producing a `ValidationReport`
//! - `ModelGraph`: Trait from cgmes-lite-model for entity lookup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cgmes_lite_analysis::{winding_summary, AnalysisPolicy, Validator};
//!
//! let graph = cgmes_lite_parser::parse_file("model_EQ.xml")?;
//!
//! let report = Validator::with_default_rules().run(graph.as_ref());
//! for finding in report.errors() {
//!     println!("{}", finding);
//! }
//!
//! let policy = AnalysisPolicy::default();
//! if let Some(summary) = winding_summary(graph.as_ref(), transformer_id, &policy)? {
//!     println!("ratio {:?}", summary.voltage_ratio);
//! }
//! ```

mod cim;
pub mod error;
pub mod policy;
pub mod queries;
pub mod rules;
pub mod validator;

// Re-export main types
pub use error::{AnalysisError, Result, RuleError};
pub use policy::{
    classify_limit_type, classify_winding_side, is_slack_control, AnalysisPolicy, LimitClass,
    WindingSide,
};
pub use queries::{
    capacity_summary, limit_summary, regulation_mode, slack_assessment, winding_summary,
    CapacitySummary, LimitDuration, LimitRow, LineLimits, MachineRating, RegulationLookup,
    SlackAssessment, UnitCapacity, UnitControl, WindingEnd, WindingSummary,
};
pub use validator::{ValidationReport, ValidationRule, Validator};

// Re-export rules
pub use rules::{
    scan_source, DuplicateIdentifierRule, DuplicateWindingIdentifierRule, IdentifierFormatRule,
    LimitOrderingRule, StructuralTagRule, VoltageLevelRule, ZeroImpedanceRule,
};

// Re-export the finding types reports are made of
pub use cgmes_lite_model::{Finding, FindingCategory, Severity};
