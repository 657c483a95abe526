// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference token classification using nom combinators
//!
//! CIM encodes both object links and enumeration values as `rdf:resource`
//! tokens: `#_<uuid>` for objects, `#Kind.member` (or a full namespace URI
//! ending in `#Kind.member`) for enumeration literals.

use cgmes_lite_model::{strip_identifier, EntityId, EnumValue, Resolution};
use nom::{
    bytes::complete::{take_while, take_while1, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, recognize},
    sequence::{pair, separated_pair},
    IResult, Parser,
};

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Enumeration type name: a letter followed by letters, digits or `_`
fn kind_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Enumeration member name
fn member_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

/// `Kind.member`
fn enum_literal(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(kind_name, char('.'), member_name).parse(input)
}

/// Parse a stripped token as an enumeration literal
pub fn parse_enum_literal(token: &str) -> Option<EnumValue> {
    all_consuming(enum_literal)
        .parse(token)
        .ok()
        .map(|(_, (kind, member))| EnumValue::new(kind, member))
}

/// Classify one raw reference token
///
/// The token is stripped first (see [`strip_identifier`]). An existing
/// entity id wins over the enumeration shape; anything else is dangling.
pub fn classify(token: &str, exists: impl Fn(&str) -> bool) -> Resolution {
    let stripped = strip_identifier(token);

    if exists(stripped) {
        Resolution::Entity(EntityId::from(stripped))
    } else if let Some(literal) = parse_enum_literal(stripped) {
        Resolution::Enum(literal)
    } else {
        Resolution::Dangling(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(id: &str) -> bool {
        matches!(id, "gu1" | "2184f365-8cd5-4b5d-8a28-9d68603bb6a4")
    }

    #[test]
    fn test_entity_reference() {
        assert_eq!(
            classify("#_gu1", known),
            Resolution::Entity(EntityId::new("gu1"))
        );
        assert_eq!(
            classify("#_2184f365-8cd5-4b5d-8a28-9d68603bb6a4", known),
            Resolution::Entity(EntityId::new("2184f365-8cd5-4b5d-8a28-9d68603bb6a4"))
        );
        assert_eq!(
            classify("urn:uuid:2184f365-8cd5-4b5d-8a28-9d68603bb6a4", known),
            Resolution::Entity(EntityId::new("2184f365-8cd5-4b5d-8a28-9d68603bb6a4"))
        );
    }

    #[test]
    fn test_enum_reference() {
        assert_eq!(
            classify("#RegulatingControlModeKind.voltage", known),
            Resolution::Enum(EnumValue::new("RegulatingControlModeKind", "voltage"))
        );
        assert_eq!(
            classify(
                "http://iec.ch/TC57/CIM100#GeneratorControlSource.offAGC",
                known
            ),
            Resolution::Enum(EnumValue::new("GeneratorControlSource", "offAGC"))
        );
    }

    #[test]
    fn test_dangling_reference() {
        assert_eq!(
            classify("#_missing-id", known),
            Resolution::Dangling("missing-id".to_string())
        );
        assert_eq!(classify("", known), Resolution::Dangling(String::new()));
    }

    #[test]
    fn test_enum_shape() {
        assert!(parse_enum_literal("WindingConnection.Yn").is_some());
        assert!(parse_enum_literal("UnitMultiplier.k").is_some());
        assert!(parse_enum_literal("Kind.").is_none());
        assert!(parse_enum_literal(".member").is_none());
        assert!(parse_enum_literal("Kind.member.extra").is_none());
        assert!(parse_enum_literal("1Kind.member").is_none());
        assert!(parse_enum_literal("bf2a4896-2e92").is_none());
    }

    #[test]
    fn test_entity_wins_over_enum_shape() {
        let exists = |id: &str| id == "Odd.id";
        assert_eq!(
            classify("#Odd.id", exists),
            Resolution::Entity(EntityId::new("Odd.id"))
        );
    }
}
