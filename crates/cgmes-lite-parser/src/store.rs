// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GraphStore - resolved, indexed entity graph implementing `ModelGraph`

use crate::extractor::EntityTable;
use crate::reference::classify;
use cgmes_lite_model::{
    Entity, EntityId, ExtractionStats, Finding, FindingCategory, ModelGraph, Occurrence,
    Reference, Resolution,
};
use rustc_hash::FxHashMap;

/// Reverse index: target id -> field name -> source entity slots
type ReverseIndex = FxHashMap<EntityId, FxHashMap<String, Vec<usize>>>;

/// Immutable in-memory graph of one document
///
/// Every index is built once in [`resolve`]; all accessors are pure reads.
#[derive(Debug)]
pub struct GraphStore {
    /// Kept entities in document order
    entities: Vec<Entity>,
    /// Entity id -> slot
    index: FxHashMap<EntityId, usize>,
    /// Type name -> slots, document order
    type_index: FxHashMap<String, Vec<usize>>,
    /// Type names in order of first appearance
    type_order: Vec<String>,
    /// Outgoing references, parallel to `entities`
    references: Vec<Vec<Reference>>,
    /// Incoming entity references
    reverse: ReverseIndex,
    /// Every occurrence of every id, including superseded elements
    occurrences: FxHashMap<EntityId, Vec<Occurrence>>,
    /// Ids in order of first appearance
    seen_ids: Vec<EntityId>,
    /// Load-time findings
    diagnostics: Vec<Finding>,
    /// Extraction counters
    stats: ExtractionStats,
    /// Raw document text
    source: Option<String>,
}

/// Resolve every reference of an entity table and build the graph store
///
/// Resolution is total: each reference field is classified as an entity
/// reference, an enumeration literal, or dangling (which also records a
/// warning finding). Targets may appear anywhere in the document.
pub fn resolve(table: EntityTable) -> GraphStore {
    let parts = table.into_parts();

    // Keep the last-seen entity of every id, in document order
    let entities: Vec<Entity> = parts
        .entities
        .into_iter()
        .enumerate()
        .filter(|(slot, entity)| parts.slots.get(&entity.id) == Some(slot))
        .map(|(_, entity)| entity)
        .collect();

    let index: FxHashMap<EntityId, usize> = entities
        .iter()
        .enumerate()
        .map(|(slot, entity)| (entity.id.clone(), slot))
        .collect();

    let mut type_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    let mut type_order = Vec::new();
    for (slot, entity) in entities.iter().enumerate() {
        let slots = type_index.entry(entity.type_name.clone()).or_insert_with(|| {
            type_order.push(entity.type_name.clone());
            Vec::new()
        });
        slots.push(slot);
    }

    let mut diagnostics = parts.findings;
    let mut references = Vec::with_capacity(entities.len());
    let mut reverse = ReverseIndex::default();
    let (mut to_entities, mut to_enums, mut dangling) = (0usize, 0usize, 0usize);

    for (slot, entity) in entities.iter().enumerate() {
        let mut outgoing = Vec::new();

        for field in entity.reference_fields() {
            let token = field.value.as_reference().unwrap_or_default();
            let target = classify(token, |id| index.contains_key(id));

            match &target {
                Resolution::Entity(target_id) => {
                    to_entities += 1;
                    reverse
                        .entry(target_id.clone())
                        .or_default()
                        .entry(field.name.clone())
                        .or_default()
                        .push(slot);
                }
                Resolution::Enum(_) => to_enums += 1,
                Resolution::Dangling(missing) => {
                    dangling += 1;
                    log::warn!(
                        "Dangling reference {}.{} -> {:?}",
                        entity.id,
                        field.name,
                        missing
                    );
                    diagnostics.push(
                        Finding::warning(
                            FindingCategory::DanglingReference,
                            format!(
                                "{} {} field {} points at {:?}, which is not in the document",
                                entity.type_name, entity.id, field.name, token
                            ),
                        )
                        .with_entity(&entity.id),
                    );
                }
            }

            outgoing.push(Reference {
                source: entity.id.clone(),
                field: field.name.clone(),
                token: token.to_string(),
                target,
            });
        }

        references.push(outgoing);
    }

    log::info!(
        "Resolved {} references ({} to entities, {} enumeration literals, {} dangling) across {} entities",
        to_entities + to_enums + dangling,
        to_entities,
        to_enums,
        dangling,
        entities.len()
    );

    GraphStore {
        entities,
        index,
        type_index,
        type_order,
        references,
        reverse,
        occurrences: parts.occurrences,
        seen_ids: parts.seen_ids,
        diagnostics,
        stats: parts.stats,
        source: None,
    }
}

impl GraphStore {
    /// Attach the raw document text the store was built from
    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    /// Count references that could not be resolved
    pub fn dangling_count(&self) -> usize {
        self.references
            .iter()
            .flatten()
            .filter(|r| r.target.is_dangling())
            .count()
    }

    /// Count all references
    pub fn reference_count(&self) -> usize {
        self.references.iter().map(Vec::len).sum()
    }
}

impl ModelGraph for GraphStore {
    fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&slot| &self.entities[slot])
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn entities_by_type(&self, type_name: &str) -> Vec<&Entity> {
        self.type_index
            .get(type_name)
            .map(|slots| slots.iter().map(|&slot| &self.entities[slot]).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, type_name: &str) -> usize {
        self.type_index.get(type_name).map(|v| v.len()).unwrap_or(0)
    }

    fn type_names(&self) -> Vec<&str> {
        self.type_order.iter().map(String::as_str).collect()
    }

    fn references_of(&self, entity: &Entity) -> &[Reference] {
        self.index
            .get(entity.id.as_str())
            .map(|&slot| self.references[slot].as_slice())
            .unwrap_or(&[])
    }

    fn references_to(&self, entity: &Entity, field: &str) -> Vec<&Entity> {
        self.reverse
            .get(entity.id.as_str())
            .and_then(|by_field| by_field.get(field))
            .map(|slots| slots.iter().map(|&slot| &self.entities[slot]).collect())
            .unwrap_or_default()
    }

    fn occurrences(&self, id: &str) -> &[Occurrence] {
        self.occurrences.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn seen_ids(&self) -> &[EntityId] {
        &self.seen_ids
    }

    fn diagnostics(&self) -> &[Finding] {
        &self.diagnostics
    }

    fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    fn source_text(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
