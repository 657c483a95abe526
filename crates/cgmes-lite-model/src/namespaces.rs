// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known namespace URIs of CGMES documents

/// RDF syntax namespace (`rdf:`)
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// CIM 100 namespace used by CGMES 3.0 (`cim:`)
pub const CIM100: &str = "http://iec.ch/TC57/CIM100#";

/// CIM 16 namespace used by CGMES 2.4.15 (`cim:`)
pub const CIM16: &str = "http://iec.ch/TC57/2013/CIM-schema-cim16#";

/// European extension of CIM 100 (`eu:`)
pub const CIM100_EUROPEAN: &str = "http://iec.ch/TC57/CIM100-European#";

/// ENTSO-E schema extension used with CIM 16 (`entsoe:`)
pub const ENTSOE: &str = "http://entsoe.eu/CIM/SchemaExtension/3/1#";

/// Model description header namespace (`md:`)
pub const MODEL_DESCRIPTION: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#";
