// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validator - runs registered rules over a graph and collects findings
//!
//! Rules use the `ModelGraph` trait from cgmes-lite-model for all lookups,
//! so they are independent of any specific parser implementation.

use crate::{AnalysisPolicy, RuleError};
use cgmes_lite_model::{Finding, FindingCategory, ModelGraph};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Validation rule trait
///
/// Each rule is an independent pure function of the graph. Rules share no
/// mutable state and may run in any order or in parallel.
pub trait ValidationRule: Send + Sync {
    /// Rule name used in failure findings and logs
    fn name(&self) -> &str;

    /// Check the graph
    ///
    /// # Arguments
    /// * `graph` - The resolved entity graph
    /// * `policy` - Tunables shared by all rules
    ///
    /// # Returns
    /// The rule's findings in discovery order. An error aborts this rule
    /// only; the validator reports it as `RuleExecutionFailed`.
    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError>;
}

/// Findings of one validation run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Load diagnostics first, then each rule's findings in rule order
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Error-severity findings
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    /// Warning-severity findings
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    /// Check if any finding is an error
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    /// Findings grouped by category, each group in report order
    pub fn by_category(&self) -> BTreeMap<FindingCategory, Vec<&Finding>> {
        let mut groups: BTreeMap<FindingCategory, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            groups.entry(finding.category).or_default().push(finding);
        }
        groups
    }

    /// Number of findings in a category
    pub fn count(&self, category: FindingCategory) -> usize {
        self.findings
            .iter()
            .filter(|f| f.category == category)
            .count()
    }

    /// Total number of findings
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Check if the report is empty
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Validator - owns an ordered rule list and the policy they run with
pub struct Validator {
    /// Registered rules in execution order
    rules: Vec<Arc<dyn ValidationRule>>,
    policy: AnalysisPolicy,
}

impl Validator {
    /// Create a validator without any rules registered
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            policy: AnalysisPolicy::default(),
        }
    }

    /// Create a validator with the default rules registered
    ///
    /// Registers, in order:
    /// - `DuplicateIdentifierRule`
    /// - `DuplicateWindingIdentifierRule`
    /// - `LimitOrderingRule`
    /// - `VoltageLevelRule`
    /// - `ZeroImpedanceRule`
    /// - `StructuralTagRule`
    /// - `IdentifierFormatRule`
    pub fn with_default_rules() -> Self {
        use crate::rules::{
            DuplicateIdentifierRule, DuplicateWindingIdentifierRule, IdentifierFormatRule,
            LimitOrderingRule, StructuralTagRule, VoltageLevelRule, ZeroImpedanceRule,
        };

        let mut validator = Self::new();
        validator.register(Arc::new(DuplicateIdentifierRule));
        validator.register(Arc::new(DuplicateWindingIdentifierRule));
        validator.register(Arc::new(LimitOrderingRule));
        validator.register(Arc::new(VoltageLevelRule));
        validator.register(Arc::new(ZeroImpedanceRule));
        validator.register(Arc::new(StructuralTagRule));
        validator.register(Arc::new(IdentifierFormatRule));
        validator
    }

    /// Replace the policy
    pub fn with_policy(mut self, policy: AnalysisPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the current policy
    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    /// Register a rule at the end of the list
    pub fn register(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order on the current thread
    pub fn run(&self, graph: &dyn ModelGraph) -> ValidationReport {
        let per_rule: Vec<Vec<Finding>> = self
            .rules
            .iter()
            .map(|rule| evaluate(rule.as_ref(), graph, &self.policy))
            .collect();
        self.assemble(graph, per_rule)
    }

    /// Run the rules on the rayon pool
    ///
    /// Results are concatenated in registration order, so the report equals
    /// the one [`Validator::run`] produces.
    pub fn run_parallel(&self, graph: &dyn ModelGraph) -> ValidationReport {
        let per_rule: Vec<Vec<Finding>> = self
            .rules
            .par_iter()
            .map(|rule| evaluate(rule.as_ref(), graph, &self.policy))
            .collect();
        self.assemble(graph, per_rule)
    }

    fn assemble(&self, graph: &dyn ModelGraph, per_rule: Vec<Vec<Finding>>) -> ValidationReport {
        let mut findings = graph.diagnostics().to_vec();
        findings.extend(per_rule.into_iter().flatten());

        let report = ValidationReport { findings };
        log::info!(
            "Validation ran {} rules: {} errors, {} warnings",
            self.rules.len(),
            report.errors().count(),
            report.warnings().count()
        );
        report
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Run one rule, turning an error or panic into a `RuleExecutionFailed` finding
fn evaluate(rule: &dyn ValidationRule, graph: &dyn ModelGraph, policy: &AnalysisPolicy) -> Vec<Finding> {
    let name = rule.name();
    match panic::catch_unwind(AssertUnwindSafe(|| rule.check(graph, policy))) {
        Ok(Ok(findings)) => {
            log::debug!("Rule {} produced {} findings", name, findings.len());
            findings
        }
        Ok(Err(e)) => {
            log::warn!("Rule {} failed: {}", name, e);
            let finding = Finding::error(
                FindingCategory::RuleExecutionFailed,
                format!("Rule {} failed: {}", name, e),
            );
            vec![match e.entity() {
                Some(id) => finding.with_entity(id),
                None => finding,
            }]
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("Rule {} panicked: {}", name, message);
            vec![Finding::error(
                FindingCategory::RuleExecutionFailed,
                format!("Rule {} panicked: {}", name, message),
            )]
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
