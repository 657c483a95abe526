// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity extractor
//!
//! Walks a loaded element tree once and turns every recognised CIM object
//! into an [`Entity`]. Classification keys off the element's namespace and
//! local name, so new classes and extension namespaces need no code changes.

use cgmes_lite_model::namespaces::{CIM100, CIM100_EUROPEAN, CIM16, ENTSOE, RDF};
use cgmes_lite_model::{
    strip_identifier, Entity, EntityId, ExtractionStats, Field, FieldValue, Finding,
    FindingCategory, Occurrence, RawElement, MRID_FIELD,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Where an element's identifier is read from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentitySource {
    /// Attribute in a namespace (`rdf:ID`, `rdf:about`)
    Attribute { namespace: String, local: String },
    /// Text of a property child in a domain or extension namespace
    ChildText { local: String },
}

impl IdentitySource {
    /// `rdf:ID`
    pub fn rdf_id() -> Self {
        IdentitySource::Attribute {
            namespace: RDF.to_string(),
            local: "ID".to_string(),
        }
    }

    /// `rdf:about`
    pub fn rdf_about() -> Self {
        IdentitySource::Attribute {
            namespace: RDF.to_string(),
            local: "about".to_string(),
        }
    }

    /// `IdentifiedObject.mRID` child
    pub fn mrid() -> Self {
        IdentitySource::ChildText {
            local: MRID_FIELD.to_string(),
        }
    }
}

/// Extractor configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Namespaces whose elements are entity classes
    pub domain_namespaces: Vec<String>,
    /// Additional namespaces whose property elements become fields
    pub extension_namespaces: Vec<String>,
    /// Identity sources tried in order
    pub identity_sources: Vec<IdentitySource>,
    /// Per-type identity sources replacing the default list
    pub identity_overrides: BTreeMap<String, Vec<IdentitySource>>,
    /// Only these types are extracted when set
    pub types: Option<BTreeSet<String>>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            domain_namespaces: vec![CIM100.to_string(), CIM16.to_string()],
            extension_namespaces: vec![CIM100_EUROPEAN.to_string(), ENTSOE.to_string()],
            identity_sources: vec![
                IdentitySource::rdf_id(),
                IdentitySource::rdf_about(),
                IdentitySource::mrid(),
            ],
            identity_overrides: BTreeMap::new(),
            types: None,
        }
    }
}

impl ExtractorConfig {
    /// Create a configuration with CGMES defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace whose elements are entity classes
    pub fn with_domain_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.domain_namespaces.push(namespace.into());
        self
    }

    /// Add a namespace whose property elements become fields
    pub fn with_extension_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.extension_namespaces.push(namespace.into());
        self
    }

    /// Replace the default identity sources
    pub fn with_identity_sources(mut self, sources: Vec<IdentitySource>) -> Self {
        self.identity_sources = sources;
        self
    }

    /// Use specific identity sources for one type
    pub fn with_identity_override(
        mut self,
        type_name: impl Into<String>,
        sources: Vec<IdentitySource>,
    ) -> Self {
        self.identity_overrides.insert(type_name.into(), sources);
        self
    }

    /// Restrict extraction to the given types
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    fn is_domain(&self, namespace: Option<&str>) -> bool {
        namespace.is_some_and(|ns| self.domain_namespaces.iter().any(|d| d == ns))
    }

    fn is_field_namespace(&self, namespace: Option<&str>) -> bool {
        self.is_domain(namespace)
            || namespace.is_some_and(|ns| self.extension_namespaces.iter().any(|e| e == ns))
    }

    /// Check whether an element is an entity class this extractor handles
    pub fn recognizes(&self, element: &RawElement) -> bool {
        let local = &element.name.local;
        // Property elements are `Class.property`, classes never contain a dot
        let class_shaped = !local.is_empty() && !local.contains('.');
        self.is_domain(element.name.namespace.as_deref())
            && class_shaped
            && self.types.as_ref().map_or(true, |types| types.contains(local))
    }

    fn identity_sources_for(&self, type_name: &str) -> &[IdentitySource] {
        self.identity_overrides
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&self.identity_sources)
    }

    /// Read the identifier of an element, if it has one
    pub fn identity_of(&self, element: &RawElement) -> Option<EntityId> {
        self.identity_sources_for(&element.name.local)
            .iter()
            .find_map(|source| {
                let raw = match source {
                    IdentitySource::Attribute { namespace, local } => {
                        element.attribute(namespace, local)
                    }
                    IdentitySource::ChildText { local } => element
                        .children
                        .iter()
                        .find(|c| {
                            c.name.local == *local
                                && self.is_field_namespace(c.name.namespace.as_deref())
                        })
                        .and_then(|c| c.text.as_deref()),
                };
                raw.map(strip_identifier)
                    .filter(|id| !id.is_empty())
                    .map(EntityId::from)
            })
    }
}

/// Flat entity table produced by one extraction pass
///
/// Keeps every extracted entity in document order. For an id carried by
/// several elements the last one wins the id slot; all occurrences are
/// recorded for duplicate detection.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: Vec<Entity>,
    slots: FxHashMap<EntityId, usize>,
    occurrences: FxHashMap<EntityId, Vec<Occurrence>>,
    seen_ids: Vec<EntityId>,
    findings: Vec<Finding>,
    stats: ExtractionStats,
}

/// Owned contents of an [`EntityTable`], consumed by the resolver
pub(crate) struct TableParts {
    pub entities: Vec<Entity>,
    pub slots: FxHashMap<EntityId, usize>,
    pub occurrences: FxHashMap<EntityId, Vec<Occurrence>>,
    pub seen_ids: Vec<EntityId>,
    pub findings: Vec<Finding>,
    pub stats: ExtractionStats,
}

impl EntityTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity; a later entity with the same id takes over the slot
    pub fn insert(&mut self, entity: Entity) {
        let slot = self.entities.len();
        let occurrence = Occurrence {
            type_name: entity.type_name.clone(),
            position: entity.position,
        };

        match self.occurrences.get_mut(&entity.id) {
            Some(previous) => {
                log::debug!(
                    "Identifier {} seen again on {} (previously {})",
                    entity.id,
                    entity.type_name,
                    previous.last().map_or("?", |o| o.type_name.as_str())
                );
                previous.push(occurrence);
                self.stats.superseded += 1;
            }
            None => {
                self.occurrences.insert(entity.id.clone(), vec![occurrence]);
                self.seen_ids.push(entity.id.clone());
            }
        }

        self.slots.insert(entity.id.clone(), slot);
        self.entities.push(entity);
        self.stats.extracted += 1;
    }

    /// Record a recognised element dropped for lack of an identifier
    pub fn record_missing_identity(&mut self, type_name: &str, position: usize) {
        log::warn!(
            "{} element at position {} has no identifier, dropped",
            type_name,
            position
        );
        self.stats.missing_identity += 1;
        self.findings.push(Finding::warning(
            FindingCategory::MissingIdentity,
            format!(
                "{} element at position {} has no identifier and was dropped",
                type_name, position
            ),
        ));
    }

    /// Get the entity currently holding an id
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.slots.get(id).map(|&slot| &self.entities[slot])
    }

    /// Check whether an id is present
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entities holding an id slot, in document order
    pub fn kept(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(slot, entity)| self.slots.get(&entity.id) == Some(slot))
            .map(|(_, entity)| entity)
    }

    /// All occurrences recorded for an id
    pub fn occurrences(&self, id: &str) -> &[Occurrence] {
        self.occurrences.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Findings raised during extraction
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Extraction counters
    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    pub(crate) fn into_parts(self) -> TableParts {
        TableParts {
            entities: self.entities,
            slots: self.slots,
            occurrences: self.occurrences,
            seen_ids: self.seen_ids,
            findings: self.findings,
            stats: self.stats,
        }
    }
}

/// Extract entities from a loaded document
///
/// Candidates are the children of `root` plus typed nodes nested inside
/// property elements. Unrecognised candidates are skipped and counted.
pub fn extract(root: &RawElement, config: &ExtractorConfig) -> EntityTable {
    let mut extractor = Extractor {
        config,
        table: EntityTable::new(),
        position: 0,
    };

    for candidate in &root.children {
        extractor.visit(candidate);
    }

    let stats = extractor.table.stats;
    log::info!(
        "Extracted {} entities from {} candidates ({} skipped, {} without identity, {} superseded)",
        stats.extracted,
        stats.candidates,
        stats.skipped,
        stats.missing_identity,
        stats.superseded
    );

    extractor.table
}

/// Helper struct for one extraction pass
struct Extractor<'a> {
    config: &'a ExtractorConfig,
    table: EntityTable,
    position: usize,
}

impl<'a> Extractor<'a> {
    fn visit(&mut self, element: &RawElement) {
        let position = self.position;
        self.position += 1;
        self.table.stats.candidates += 1;

        if !self.config.recognizes(element) {
            log::debug!("Skipping {} at position {}", element.name, position);
            self.table.stats.skipped += 1;
            return;
        }

        let type_name = element.name.local.as_str();
        let mut fields = Vec::with_capacity(element.children.len());
        let mut nested = Vec::new();

        for child in &element.children {
            if !self
                .config
                .is_field_namespace(child.name.namespace.as_deref())
            {
                continue;
            }

            let value = match child.attribute(RDF, "resource") {
                Some(token) => FieldValue::Reference(token.to_string()),
                None => match child.children.first() {
                    // Nested node description: the property points at it
                    Some(node) => {
                        nested.extend(child.children.iter());
                        match self.config.identity_of(node) {
                            Some(id) => FieldValue::Reference(format!("#{}", id)),
                            None => FieldValue::Text(String::new()),
                        }
                    }
                    None => FieldValue::Text(child.text.clone().unwrap_or_default()),
                },
            };

            fields.push(Field {
                name: child.name.local.clone(),
                value,
            });
        }

        match self.config.identity_of(element) {
            Some(id) => {
                let mut entity = Entity::new(id, type_name, position);
                entity.fields = fields;
                self.table.insert(entity);
            }
            None => self.table.record_missing_identity(type_name, position),
        }

        for node in nested {
            self.visit(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_str;

    const TEST_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:cim="http://iec.ch/TC57/CIM100#"
         xmlns:eu="http://iec.ch/TC57/CIM100-European#"
         xmlns:md="http://iec.ch/TC57/61970-552/ModelDescription/1#"
         xmlns:other="urn:other">
  <md:FullModel rdf:about="urn:uuid:model"/>
  <cim:GeneratingUnit rdf:ID="_gu1">
    <cim:IdentifiedObject.name>G1</cim:IdentifiedObject.name>
    <cim:GeneratingUnit.maxOperatingP>500</cim:GeneratingUnit.maxOperatingP>
    <cim:GeneratingUnit.genControlSource rdf:resource="http://iec.ch/TC57/CIM100#GeneratorControlSource.offAGC"/>
    <eu:IdentifiedObject.shortName>G1s</eu:IdentifiedObject.shortName>
    <other:Ignored.field>x</other:Ignored.field>
  </cim:GeneratingUnit>
  <cim:SynchronousMachine rdf:about="#_sm1">
    <cim:RotatingMachine.GeneratingUnit rdf:resource="#_gu1"/>
  </cim:SynchronousMachine>
  <cim:Terminal>
    <cim:IdentifiedObject.mRID>t1</cim:IdentifiedObject.mRID>
  </cim:Terminal>
  <cim:Terminal>
    <cim:IdentifiedObject.name>no id</cim:IdentifiedObject.name>
  </cim:Terminal>
  <other:Thing rdf:ID="_x"/>
  <cim:BaseVoltage rdf:ID="_gu1">
    <cim:BaseVoltage.nominalVoltage>400</cim:BaseVoltage.nominalVoltage>
  </cim:BaseVoltage>
</rdf:RDF>
"##;

    fn table() -> EntityTable {
        let root = load_str(TEST_XML).unwrap();
        extract(&root, &ExtractorConfig::default())
    }

    #[test]
    fn test_identity_sources() {
        let table = table();
        assert!(table.contains("sm1"));
        assert!(table.contains("t1"));
        assert_eq!(table.get("sm1").unwrap().type_name, "SynchronousMachine");
    }

    #[test]
    fn test_skipped_candidates_are_counted() {
        let table = table();
        let stats = table.stats();
        assert_eq!(stats.candidates, 7);
        // md:FullModel and other:Thing
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.missing_identity, 1);
        assert_eq!(stats.extracted, 4);
        assert_eq!(stats.superseded, 1);
    }

    #[test]
    fn test_missing_identity_is_a_warning() {
        let table = table();
        assert_eq!(table.findings().len(), 1);
        let finding = &table.findings()[0];
        assert_eq!(finding.category, FindingCategory::MissingIdentity);
        assert!(!finding.is_error());
        assert!(finding.message.contains("Terminal"));
    }

    #[test]
    fn test_last_seen_wins_and_occurrences_are_kept() {
        let table = table();
        assert_eq!(table.get("gu1").unwrap().type_name, "BaseVoltage");
        let types: Vec<_> = table
            .occurrences("gu1")
            .iter()
            .map(|o| o.type_name.as_str())
            .collect();
        assert_eq!(types, vec!["GeneratingUnit", "BaseVoltage"]);
        assert_eq!(table.len(), 3);
        let kept: Vec<_> = table.kept().map(|e| e.id.as_str()).collect();
        assert_eq!(kept, vec!["sm1", "t1", "gu1"]);
    }

    #[test]
    fn test_fields_from_domain_and_extension_namespaces() {
        let root = load_str(TEST_XML).unwrap();
        let config = ExtractorConfig::default().with_types(["GeneratingUnit"]);
        let table = extract(&root, &config);
        let unit = table.get("gu1").unwrap();

        assert_eq!(unit.name(), Some("G1"));
        assert_eq!(unit.text("IdentifiedObject.shortName"), Some("G1s"));
        assert!(unit.field("Ignored.field").is_none());
        assert_eq!(
            unit.reference_token("GeneratingUnit.genControlSource"),
            Some("http://iec.ch/TC57/CIM100#GeneratorControlSource.offAGC")
        );
        assert_eq!(unit.number("GeneratingUnit.maxOperatingP"), Ok(Some(500.0)));
    }

    #[test]
    fn test_identity_override() {
        let root = load_str(TEST_XML).unwrap();
        let config = ExtractorConfig::default()
            .with_identity_override("SynchronousMachine", vec![IdentitySource::mrid()]);
        let table = extract(&root, &config);
        assert!(!table.contains("sm1"));
        assert_eq!(table.stats().missing_identity, 2);
    }

    #[test]
    fn test_nested_node_becomes_reference() {
        let xml = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                             xmlns:cim="http://iec.ch/TC57/CIM100#">
  <cim:VoltageLevel rdf:ID="_vl">
    <cim:VoltageLevel.BaseVoltage>
      <cim:BaseVoltage rdf:ID="_bv">
        <cim:BaseVoltage.nominalVoltage>110</cim:BaseVoltage.nominalVoltage>
      </cim:BaseVoltage>
    </cim:VoltageLevel.BaseVoltage>
  </cim:VoltageLevel>
</rdf:RDF>"##;
        let root = load_str(xml).unwrap();
        let table = extract(&root, &ExtractorConfig::default());
        assert_eq!(
            table.get("vl").unwrap().reference_token("VoltageLevel.BaseVoltage"),
            Some("#bv")
        );
        assert_eq!(table.get("bv").unwrap().position, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{ "extension_namespaces": ["urn:ext"] }"#).unwrap();
        assert_eq!(config.extension_namespaces, vec!["urn:ext".to_string()]);
        assert_eq!(config.domain_namespaces.len(), 2);
        assert_eq!(config.identity_sources.len(), 3);
    }
}
