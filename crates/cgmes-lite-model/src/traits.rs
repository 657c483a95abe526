// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for CGMES parsing

use crate::{ModelGraph, Result};
use std::sync::Arc;

/// Main parsing interface - entry point for parsing CGMES documents
///
/// Implementations run the whole load, extract and resolve pipeline and
/// return a finished, immutable graph.
///
/// # Example
///
/// ```ignore
/// use cgmes_lite_model::ModelParser;
///
/// let parser: Box<dyn ModelParser> = get_parser();
/// let graph = parser.parse(xml_bytes)?;
/// println!("{} entities", graph.entity_count());
/// ```
pub trait ModelParser: Send + Sync {
    /// Parse a document and return the resolved graph
    ///
    /// # Arguments
    /// * `content` - Raw document bytes (UTF-8 XML)
    ///
    /// # Returns
    /// An `Arc<dyn ModelGraph>` on success, or a `ParseError` when the
    /// document is not well-formed
    fn parse(&self, content: &[u8]) -> Result<Arc<dyn ModelGraph>>;
}
