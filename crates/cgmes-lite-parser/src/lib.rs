// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CGMES-Lite Parser - CIM RDF-XML parser
//!
//! This crate turns CGMES/CIM RDF-XML documents into a resolved, indexed
//! entity graph. It implements the traits defined in `cgmes-lite-model`.
//!
//! # Pipeline
//!
//! - **Load** - `quick-xml` namespace reader builds a generic element tree
//! - **Extract** - recognised CIM classes become entities with typed fields
//! - **Resolve** - `rdf:resource` tokens are classified with `nom` as entity
//!   references, enumeration literals or dangling references
//! - **Store** - immutable graph with id, type and reverse-reference indices
//!
//! # Example
//!
//! ```ignore
//! use cgmes_lite_parser::CgmesParser;
//! use cgmes_lite_model::{ModelGraph, ModelParser};
//!
//! let parser = CgmesParser::new();
//! let graph = parser.parse(xml_bytes)?;
//!
//! let units = graph.entities_by_type("GeneratingUnit");
//! println!("Found {} generating units", units.len());
//! ```

mod extractor;
mod loader;
mod reference;
mod store;

pub use extractor::{extract, EntityTable, ExtractorConfig, IdentitySource};
pub use loader::{decode, load_bytes, load_path, load_str};
pub use reference::{classify, parse_enum_literal};
pub use store::{resolve, GraphStore};

use cgmes_lite_model::{ModelGraph, ModelParser, Result};
use std::path::Path;
use std::sync::Arc;

/// Main CGMES parser implementing `ModelParser`
///
/// Runs load, extract and resolve in sequence and keeps the document text
/// on the resulting store for raw-text checks.
#[derive(Clone, Debug, Default)]
pub struct CgmesParser {
    /// Extraction settings
    pub config: ExtractorConfig,
}

impl CgmesParser {
    /// Create a parser with CGMES defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with an explicit extractor configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Add a namespace whose elements are entity classes
    pub fn with_domain_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config = self.config.with_domain_namespace(namespace);
        self
    }

    /// Add a namespace whose property elements become fields
    pub fn with_extension_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config = self.config.with_extension_namespace(namespace);
        self
    }

    /// Restrict extraction to the given types
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_types(types);
        self
    }

    /// Parse document bytes into a concrete [`GraphStore`]
    pub fn parse_store(&self, content: &[u8]) -> Result<GraphStore> {
        let text = decode(content)?;
        let root = load_str(text)?;
        log::debug!(
            "Loaded document: {} elements under <{}>",
            root.element_count(),
            root.name
        );

        let table = extract(&root, &self.config);
        Ok(resolve(table).with_source(text))
    }

    /// Parse a document from text
    pub fn parse_str(&self, content: &str) -> Result<GraphStore> {
        self.parse_store(content.as_bytes())
    }

    /// Parse a document from a file
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<GraphStore> {
        let path = path.as_ref();
        log::info!("Parsing {}", path.display());
        let bytes = std::fs::read(path)?;
        self.parse_store(&bytes)
    }
}

impl ModelParser for CgmesParser {
    fn parse(&self, content: &[u8]) -> Result<Arc<dyn ModelGraph>> {
        self.parse_store(content)
            .map(|store| Arc::new(store) as Arc<dyn ModelGraph>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(content: &[u8]) -> Result<Arc<dyn ModelGraph>> {
    CgmesParser::new().parse(content)
}

/// Parse a document file with default settings
pub fn parse_file(path: impl AsRef<Path>) -> Result<Arc<dyn ModelGraph>> {
    CgmesParser::new()
        .parse_file(path)
        .map(|store| Arc::new(store) as Arc<dyn ModelGraph>)
}
