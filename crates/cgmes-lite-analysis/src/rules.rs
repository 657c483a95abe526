// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation rules
//!
//! Each rule reads the graph through `ModelGraph` and returns its findings
//! in discovery order.

use crate::cim;
use crate::policy::{classify_limit_type, AnalysisPolicy, LimitClass};
use crate::validator::ValidationRule;
use crate::RuleError;
use cgmes_lite_model::{
    strip_identifier, Entity, EntityId, Finding, FindingCategory, ModelGraph, ModelGraphExt,
    MRID_FIELD,
};
use memchr::memmem;
use std::collections::{BTreeMap, BTreeSet};

/// `IdentifiedObject.mRID` text of an entity, stripped
fn mrid_of(entity: &Entity) -> Option<&str> {
    entity
        .text(MRID_FIELD)
        .map(strip_identifier)
        .filter(|mrid| !mrid.is_empty())
}

/// Kept entities sharing an mRID, grouped in order of first appearance
///
/// Kept entities hold distinct ids, so every group is a set of elements
/// whose `rdf:ID`s differ while their mRIDs collide.
fn shared_mrids(graph: &dyn ModelGraph) -> Vec<(&str, Vec<&Entity>)> {
    let mut groups: Vec<(&str, Vec<&Entity>)> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for entity in graph.entities() {
        let Some(mrid) = mrid_of(entity) else {
            continue;
        };
        match index.get(mrid) {
            Some(&group) => groups[group].1.push(entity),
            None => {
                index.insert(mrid, groups.len());
                groups.push((mrid, vec![entity]));
            }
        }
    }

    groups.retain(|(_, members)| members.len() >= 2);
    groups
}

// ============================================================================
// DuplicateIdentifierRule
// ============================================================================

/// Error per identifier carried by more than one source element
///
/// Reports shared `rdf:ID`s first, then mRIDs shared by elements with
/// different `rdf:ID`s.
pub struct DuplicateIdentifierRule;

impl ValidationRule for DuplicateIdentifierRule {
    fn name(&self) -> &str {
        "DuplicateIdentifier"
    }

    fn check(&self, graph: &dyn ModelGraph, _: &AnalysisPolicy) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for id in graph.seen_ids() {
            let occurrences = graph.occurrences(id.as_str());
            if occurrences.len() < 2 {
                continue;
            }

            let types: BTreeSet<&str> = occurrences.iter().map(|o| o.type_name.as_str()).collect();
            findings.push(
                Finding::error(
                    FindingCategory::DuplicateIdentifier,
                    format!(
                        "Identifier {} is carried by {} elements of type {}",
                        id,
                        occurrences.len(),
                        types.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                )
                .with_entity(id),
            );
        }

        for (mrid, members) in shared_mrids(graph) {
            let types: BTreeSet<&str> = members.iter().map(|e| e.type_name.as_str()).collect();
            findings.push(
                Finding::error(
                    FindingCategory::DuplicateIdentifier,
                    format!(
                        "mRID {} is carried by {} elements of type {}",
                        mrid,
                        members.len(),
                        types.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                )
                .with_entities(members.iter().map(|e| &e.id)),
            );
        }

        Ok(findings)
    }
}

// ============================================================================
// DuplicateWindingIdentifierRule
// ============================================================================

/// Error per identifier or mRID shared by two or more transformer ends
pub struct DuplicateWindingIdentifierRule;

impl ValidationRule for DuplicateWindingIdentifierRule {
    fn name(&self) -> &str {
        "DuplicateWindingIdentifier"
    }

    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError> {
        let end_type = policy.transformer_end_type.as_str();
        let mut findings = Vec::new();

        for id in graph.seen_ids() {
            let windings = graph
                .occurrences(id.as_str())
                .iter()
                .filter(|o| o.type_name == end_type)
                .count();

            if windings >= 2 {
                findings.push(
                    Finding::error(
                        FindingCategory::DuplicateWindingIdentifier,
                        format!("{} {} elements share identifier {}", windings, end_type, id),
                    )
                    .with_entity(id),
                );
            }
        }

        for (mrid, members) in shared_mrids(graph) {
            let windings: Vec<&EntityId> = members
                .iter()
                .filter(|e| e.type_name == end_type)
                .map(|e| &e.id)
                .collect();

            if windings.len() >= 2 {
                findings.push(
                    Finding::error(
                        FindingCategory::DuplicateWindingIdentifier,
                        format!(
                            "{} {} elements share mRID {}",
                            windings.len(),
                            end_type,
                            mrid
                        ),
                    )
                    .with_entities(windings),
                );
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// LimitOrderingRule
// ============================================================================

/// Error per temporary limit rated below its set's permanent limit
///
/// Only limits of `AnalysisPolicy::current_limit_type` are compared. The
/// first permanent limit of a set is the reference; every temporary limit
/// with a smaller value yields one finding.
pub struct LimitOrderingRule;

impl ValidationRule for LimitOrderingRule {
    fn name(&self) -> &str {
        "LimitOrdering"
    }

    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for set in graph.entities_by_type(&policy.limit_set_type) {
            let mut permanent: Option<(&Entity, f64)> = None;
            let mut temporary: Vec<(&Entity, f64)> = Vec::new();

            let limits = graph.references_to(set, cim::LIMIT_SET);
            for limit in limits.into_iter().filter(|l| policy.is_current_limit(l)) {
                let Some(type_name) = graph
                    .resolve_entity(limit, cim::LIMIT_TYPE)
                    .and_then(Entity::name)
                else {
                    continue;
                };
                let Some(value) = policy.limit_value(limit)? else {
                    continue;
                };

                match classify_limit_type(type_name, policy) {
                    LimitClass::Permanent if permanent.is_none() => permanent = Some((limit, value)),
                    LimitClass::Temporary => temporary.push((limit, value)),
                    _ => {}
                }
            }

            let Some((patl, patl_value)) = permanent else {
                continue;
            };

            for (tatl, tatl_value) in temporary {
                if tatl_value < patl_value {
                    findings.push(
                        Finding::error(
                            FindingCategory::LimitOrderingViolation,
                            format!(
                                "Limit set {}: temporary limit {} ({}) is below permanent limit {} ({})",
                                set.display_name(),
                                tatl.id,
                                tatl_value,
                                patl.id,
                                patl_value
                            ),
                        )
                        .with_entities([&set.id, &patl.id, &tatl.id]),
                    );
                }
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// VoltageLevelRule
// ============================================================================

/// Warning when a voltage level's numeric name disagrees with its base voltage
pub struct VoltageLevelRule;

impl ValidationRule for VoltageLevelRule {
    fn name(&self) -> &str {
        "VoltageLevel"
    }

    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for level in graph.entities_by_type(cim::VOLTAGE_LEVEL) {
            let Some(name) = level.name() else {
                continue;
            };
            let Ok(declared) = name.trim().parse::<f64>() else {
                log::debug!("Voltage level {} has non-numeric name {:?}", level.id, name);
                continue;
            };
            let Some(base) = graph.resolve_entity(level, cim::VOLTAGE_LEVEL_BASE_VOLTAGE) else {
                continue;
            };
            let Some(nominal) = base.number(cim::NOMINAL_VOLTAGE)? else {
                continue;
            };

            if (declared - nominal).abs() > policy.voltage_tolerance {
                findings.push(
                    Finding::warning(
                        FindingCategory::VoltageLevelMismatch,
                        format!(
                            "Voltage level {:?} declares {} kV but its base voltage {} is {} kV",
                            name, declared, base.id, nominal
                        ),
                    )
                    .with_entities([&level.id, &base.id]),
                );
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// ZeroImpedanceRule
// ============================================================================

/// Warning for equivalent injections with r = 0 and x = 0
pub struct ZeroImpedanceRule;

impl ValidationRule for ZeroImpedanceRule {
    fn name(&self) -> &str {
        "ZeroImpedance"
    }

    fn check(&self, graph: &dyn ModelGraph, _: &AnalysisPolicy) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for injection in graph.entities_by_type(cim::EQUIVALENT_INJECTION) {
            let r = injection.number(cim::INJECTION_R)?;
            let x = injection.number(cim::INJECTION_X)?;

            if let (Some(r), Some(x)) = (r, x) {
                if r == 0.0 && x == 0.0 {
                    findings.push(
                        Finding::warning(
                            FindingCategory::ZeroImpedanceInjection,
                            format!(
                                "Equivalent injection {} has zero impedance (r=0, x=0)",
                                injection.display_name()
                            ),
                        )
                        .with_entity(&injection.id),
                    );
                }
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// StructuralTagRule
// ============================================================================

/// Raw-text lint for unterminated header tags and misspelled element tags
///
/// Graphs without source text produce no findings.
pub struct StructuralTagRule;

impl ValidationRule for StructuralTagRule {
    fn name(&self) -> &str {
        "StructuralTag"
    }

    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError> {
        Ok(graph
            .source_text()
            .map(|text| scan_source(text, policy))
            .unwrap_or_default())
    }
}

/// Scan raw document text for structural tag problems
///
/// Works on text that failed to load as well, so a host can lint a
/// document the parser rejected.
pub fn scan_source(text: &str, policy: &AnalysisPolicy) -> Vec<Finding> {
    let bytes = text.as_bytes();
    let mut findings = Vec::new();

    for tag in policy.header_tags.iter().filter(|t| !t.is_empty()) {
        let openings = count_openings(bytes, tag, false);
        let closings = count_closings(bytes, tag);

        if openings > closings {
            findings.push(Finding::error(
                FindingCategory::StructuralTagIntegrity,
                format!(
                    "Header element <{}> is opened {} time(s) but closed {} time(s)",
                    tag, openings, closings
                ),
            ));
        }
    }

    for (bad, correct) in policy.tag_typos.iter().filter(|(bad, _)| !bad.is_empty()) {
        let count = count_openings(bytes, bad, true);
        if count > 0 {
            findings.push(Finding::error(
                FindingCategory::StructuralTagIntegrity,
                format!(
                    "Misspelled element <{}> found {} time(s), expected <{}>",
                    bad, count, correct
                ),
            ));
        }
    }

    findings
}

/// Byte after a tag name: `>`, `/` or whitespace
fn ends_tag_name(byte: Option<&u8>) -> bool {
    byte.is_some_and(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
}

fn count_openings(text: &[u8], tag: &str, include_self_closing: bool) -> usize {
    let needle = format!("<{}", tag);
    memmem::find_iter(text, needle.as_bytes())
        .filter(|&start| {
            let end = start + needle.len();
            ends_tag_name(text.get(end)) && (include_self_closing || !is_self_closing(&text[end..]))
        })
        .count()
}

fn count_closings(text: &[u8], tag: &str) -> usize {
    let needle = format!("</{}", tag);
    memmem::find_iter(text, needle.as_bytes())
        .filter(|&start| {
            text.get(start + needle.len())
                .is_some_and(|&b| b == b'>' || b.is_ascii_whitespace())
        })
        .count()
}

/// Check whether the tag starting at `rest` ends in `/>`
fn is_self_closing(rest: &[u8]) -> bool {
    memchr::memchr(b'>', rest).is_some_and(|gt| gt > 0 && rest[gt - 1] == b'/')
}

// ============================================================================
// IdentifierFormatRule
// ============================================================================

/// Warning for kept entities whose identifier is malformed
///
/// Catches truncated or hand-edited mRIDs: ids that are not canonical UUIDs
/// (disabled by `AnalysisPolicy::require_uuid_identifiers`) and
/// `IdentifiedObject.mRID` values that disagree with the element's id.
pub struct IdentifierFormatRule;

impl ValidationRule for IdentifierFormatRule {
    fn name(&self) -> &str {
        "IdentifierFormat"
    }

    fn check(
        &self,
        graph: &dyn ModelGraph,
        policy: &AnalysisPolicy,
    ) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for entity in graph.entities() {
            if policy.require_uuid_identifiers && !entity.id.is_uuid() {
                findings.push(
                    Finding::warning(
                        FindingCategory::MalformedIdentifier,
                        format!(
                            "{} {} does not carry a canonical UUID identifier",
                            entity.type_name, entity.id
                        ),
                    )
                    .with_entity(&entity.id),
                );
            }

            if let Some(mrid) = mrid_of(entity).filter(|&mrid| mrid != entity.id.as_str()) {
                findings.push(
                    Finding::warning(
                        FindingCategory::MalformedIdentifier,
                        format!(
                            "{} {} carries mRID {}, which differs from its identifier",
                            entity.type_name, entity.id, mrid
                        ),
                    )
                    .with_entity(&entity.id),
                );
            }
        }

        Ok(findings)
    }
}
