// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph access trait for looking up entities and following references

use crate::{
    Entity, EntityId, EnumValue, ExtractionStats, Finding, Occurrence, Reference,
};

/// Read-only access to a resolved entity graph
///
/// Implementations are built once per document and never mutated
/// afterwards, so they are `Send + Sync` and can be shared between
/// validation and query calls running on different threads.
///
/// Lookup by id is O(1). Lookup by type and reverse lookups use indices
/// precomputed at construction time.
///
/// # Example
///
/// ```ignore
/// use cgmes_lite_model::{ModelGraph, ModelGraphExt};
///
/// fn windings(graph: &dyn ModelGraph, transformer_id: &str) {
///     if let Some(transformer) = graph.get(transformer_id) {
///         for end in graph.references_to(transformer, "PowerTransformerEnd.PowerTransformer") {
///             println!("{} -> {:?}", end.id, end.number("PowerTransformerEnd.ratedU"));
///         }
///     }
/// }
/// ```
pub trait ModelGraph: Send + Sync {
    /// Get entity by id
    fn get(&self, id: &str) -> Option<&Entity>;

    /// All kept entities in document order
    fn entities(&self) -> &[Entity];

    /// Entities of one type, in document order
    fn entities_by_type(&self, type_name: &str) -> Vec<&Entity>;

    /// Count entities of one type
    fn count_by_type(&self, type_name: &str) -> usize;

    /// Entity types present, in order of first appearance
    fn type_names(&self) -> Vec<&str>;

    /// All outgoing references of an entity, in field order
    fn references_of(&self, entity: &Entity) -> &[Reference];

    /// Resolved reference held by `field` of `entity`
    ///
    /// Returns `None` when the entity has no such reference field. A field
    /// whose target is missing yields a [`crate::Resolution::Dangling`] reference.
    fn reference_from(&self, entity: &Entity, field: &str) -> Option<&Reference> {
        self.references_of(entity).iter().find(|r| r.field == field)
    }

    /// Entities whose `field` resolves to `entity` (reverse index)
    fn references_to(&self, entity: &Entity, field: &str) -> Vec<&Entity>;

    /// Every element occurrence recorded for an id (including superseded ones)
    fn occurrences(&self, id: &str) -> &[Occurrence];

    /// Every id seen during extraction, in order of first appearance
    fn seen_ids(&self) -> &[EntityId];

    /// Findings produced while loading (missing identity, dangling references)
    fn diagnostics(&self) -> &[Finding];

    /// Extraction counters
    fn stats(&self) -> &ExtractionStats;

    /// Raw document text, when the graph was built from a document
    fn source_text(&self) -> Option<&str>;

    /// Get total entity count
    fn entity_count(&self) -> usize {
        self.entities().len()
    }
}

/// Extension methods for ModelGraph
pub trait ModelGraphExt: ModelGraph {
    /// Get entity by typed id
    fn get_by_id(&self, id: &EntityId) -> Option<&Entity> {
        self.get(id.as_str())
    }

    /// Check if an entity exists
    fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Follow `field` of `entity` to the entity it points at
    fn resolve_entity(&self, entity: &Entity, field: &str) -> Option<&Entity> {
        let target = self.reference_from(entity, field)?.target.as_entity()?;
        self.get(target.as_str())
    }

    /// Read the enumeration literal held by `field` of `entity`
    fn resolve_enum(&self, entity: &Entity, field: &str) -> Option<&EnumValue> {
        self.reference_from(entity, field)?.target.as_enum()
    }

    /// Find entities of a type by `IdentifiedObject.name`
    fn find_by_name(&self, type_name: &str, name: &str) -> Vec<&Entity> {
        self.entities_by_type(type_name)
            .into_iter()
            .filter(|e| e.name() == Some(name))
            .collect()
    }
}

// Blanket implementation for all ModelGraph types
impl<T: ModelGraph + ?Sized> ModelGraphExt for T {}
