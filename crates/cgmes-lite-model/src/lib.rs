// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CGMES-Lite Model - Trait definitions and shared types for CGMES parsing
//!
//! This crate provides the core abstractions for working with CIM/CGMES grid
//! model documents. It defines the data model (raw elements, typed entities,
//! resolved references, findings) and the traits that parser backends
//! implement, so consumers such as validators and queries work against any
//! backend.
//!
//! # Architecture
//!
//! - [`ModelParser`] - Entry point for parsing a CGMES document
//! - [`ModelGraph`] - Read-only access to the resolved entity graph
//! - [`ModelGraphExt`] - Reference-hop helpers built on top of [`ModelGraph`]
//!
//! # Example
//!
//! ```ignore
//! use cgmes_lite_model::{ModelGraph, ModelGraphExt, ModelParser};
//!
//! let parser: Box<dyn ModelParser> = get_parser();
//! let graph = parser.parse(xml_bytes)?;
//!
//! for unit in graph.entities_by_type("GeneratingUnit") {
//!     println!("{} {:?}", unit.id, unit.name());
//! }
//! ```

pub mod error;
pub mod finding;
pub mod graph;
pub mod namespaces;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use finding::*;
pub use graph::*;
pub use traits::*;
pub use types::*;
