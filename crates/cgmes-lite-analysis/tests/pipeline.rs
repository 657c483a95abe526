// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests: parse an EQ document, validate it and query it.

use approx::assert_relative_eq;
use cgmes_lite_analysis::{
    capacity_summary, limit_summary, regulation_mode, slack_assessment, winding_summary,
    AnalysisPolicy, FindingCategory, LimitClass, Severity, ValidationReport, Validator,
    WindingSide,
};
use cgmes_lite_model::{EntityId, ModelGraph, ModelGraphExt, Resolution};
use cgmes_lite_parser::{parse, CgmesParser};

const TRANSFORMER: &str = "2184f365-8cd5-4b5d-8a28-9d68603bb6a4";
const LINE: &str = "e8acf6b6-99cb-45ad-b8dc-16c7866a4ddc";
const SHARED_ID: &str = "3c000000-0000-4000-8000-000000000001";

const EQ_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:cim="http://iec.ch/TC57/CIM100#"
         xmlns:eu="http://iec.ch/TC57/CIM100-European#"
         xmlns:md="http://iec.ch/TC57/61970-552/ModelDescription/1#"
         xmlns:vendor="urn:vendor:extension">
  <md:FullModel rdf:about="urn:uuid:0f000000-0000-4000-8000-000000000001">
    <md:Model.profile>http://iec.ch/TC57/ns/CIM/CoreEquipment-EU/3.0</md:Model.profile>
  </md:FullModel>
  <vendor:Annotation rdf:ID="_0f000000-0000-4000-8000-000000000002"/>

  <cim:HydroGeneratingUnit rdf:ID="_1a000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>G1</cim:IdentifiedObject.name>
    <cim:GeneratingUnit.maxOperatingP>250</cim:GeneratingUnit.maxOperatingP>
    <cim:GeneratingUnit.genControlSource rdf:resource="http://iec.ch/TC57/CIM100#GeneratorControlSource.offAGC"/>
  </cim:HydroGeneratingUnit>
  <cim:GeneratingUnit rdf:ID="_1a000000-0000-4000-8000-000000000002">
    <cim:IdentifiedObject.name>G2</cim:IdentifiedObject.name>
    <cim:GeneratingUnit.maxOperatingP>600</cim:GeneratingUnit.maxOperatingP>
    <cim:GeneratingUnit.genControlSource rdf:resource="http://iec.ch/TC57/CIM100#GeneratorControlSource.offAGC"/>
  </cim:GeneratingUnit>
  <cim:SynchronousMachine rdf:ID="_1b000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>NL-G1</cim:IdentifiedObject.name>
    <cim:RotatingMachine.GeneratingUnit rdf:resource="#_1a000000-0000-4000-8000-000000000001"/>
    <cim:RotatingMachine.ratedPowerFactor>0.9</cim:RotatingMachine.ratedPowerFactor>
    <cim:RegulatingCondEq.RegulatingControl rdf:resource="#_1c000000-0000-4000-8000-000000000001"/>
  </cim:SynchronousMachine>
  <cim:RegulatingControl rdf:ID="_1c000000-0000-4000-8000-000000000001">
    <cim:RegulatingControl.mode rdf:resource="http://iec.ch/TC57/CIM100#RegulatingControlModeKind.voltage"/>
  </cim:RegulatingControl>

  <cim:PowerTransformer rdf:ID="_2184f365-8cd5-4b5d-8a28-9d68603bb6a4">
    <cim:IdentifiedObject.name>NL_TR2_2</cim:IdentifiedObject.name>
  </cim:PowerTransformer>
  <cim:PowerTransformerEnd rdf:ID="_2b000000-0000-4000-8000-000000000002">
    <cim:TransformerEnd.endNumber>2</cim:TransformerEnd.endNumber>
    <cim:PowerTransformerEnd.PowerTransformer rdf:resource="#_2184f365-8cd5-4b5d-8a28-9d68603bb6a4"/>
    <cim:PowerTransformerEnd.ratedU>150</cim:PowerTransformerEnd.ratedU>
    <cim:PowerTransformerEnd.ratedS>1000</cim:PowerTransformerEnd.ratedS>
  </cim:PowerTransformerEnd>
  <cim:PowerTransformerEnd rdf:ID="_2b000000-0000-4000-8000-000000000001">
    <cim:TransformerEnd.endNumber>1</cim:TransformerEnd.endNumber>
    <cim:PowerTransformerEnd.PowerTransformer rdf:resource="#_2184f365-8cd5-4b5d-8a28-9d68603bb6a4"/>
    <cim:PowerTransformerEnd.ratedU>400</cim:PowerTransformerEnd.ratedU>
    <cim:PowerTransformerEnd.ratedS>1000</cim:PowerTransformerEnd.ratedS>
  </cim:PowerTransformerEnd>

  <cim:Substation rdf:ID="_3c000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>NL-S1</cim:IdentifiedObject.name>
  </cim:Substation>
  <cim:Breaker rdf:ID="_3c000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>BRK1</cim:IdentifiedObject.name>
  </cim:Breaker>

  <cim:ACLineSegment rdf:ID="_e8acf6b6-99cb-45ad-b8dc-16c7866a4ddc">
    <cim:IdentifiedObject.name>NL-Line_5</cim:IdentifiedObject.name>
  </cim:ACLineSegment>
  <cim:Terminal rdf:ID="_4a000000-0000-4000-8000-000000000001">
    <cim:ACDCTerminal.sequenceNumber>1</cim:ACDCTerminal.sequenceNumber>
    <cim:Terminal.ConductingEquipment rdf:resource="#_e8acf6b6-99cb-45ad-b8dc-16c7866a4ddc"/>
    <cim:Terminal.ConnectivityNode rdf:resource="#_4a000000-0000-4000-8000-0000000000ff"/>
  </cim:Terminal>
  <cim:Terminal>
    <cim:IdentifiedObject.name>orphan terminal</cim:IdentifiedObject.name>
  </cim:Terminal>
  <cim:OperationalLimitType rdf:ID="_5e000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>PATL</cim:IdentifiedObject.name>
    <cim:OperationalLimitType.isInfiniteDuration>true</cim:OperationalLimitType.isInfiniteDuration>
  </cim:OperationalLimitType>
  <cim:OperationalLimitType rdf:ID="_5e000000-0000-4000-8000-000000000002">
    <cim:IdentifiedObject.name>TATL</cim:IdentifiedObject.name>
    <cim:OperationalLimitType.acceptableDuration>600</cim:OperationalLimitType.acceptableDuration>
  </cim:OperationalLimitType>
  <cim:OperationalLimitSet rdf:ID="_4d000000-0000-4000-8000-000000000001">
    <cim:OperationalLimitSet.Terminal rdf:resource="#_4a000000-0000-4000-8000-000000000001"/>
  </cim:OperationalLimitSet>
  <cim:CurrentLimit rdf:ID="_6f000000-0000-4000-8000-000000000001">
    <cim:OperationalLimit.OperationalLimitSet rdf:resource="#_4d000000-0000-4000-8000-000000000001"/>
    <cim:OperationalLimit.OperationalLimitType rdf:resource="#_5e000000-0000-4000-8000-000000000001"/>
    <cim:CurrentLimit.value>1000</cim:CurrentLimit.value>
  </cim:CurrentLimit>
  <cim:CurrentLimit rdf:ID="_6f000000-0000-4000-8000-000000000002">
    <cim:OperationalLimit.OperationalLimitSet rdf:resource="#_4d000000-0000-4000-8000-000000000001"/>
    <cim:OperationalLimit.OperationalLimitType rdf:resource="#_5e000000-0000-4000-8000-000000000002"/>
    <cim:CurrentLimit.value>900</cim:CurrentLimit.value>
  </cim:CurrentLimit>
  <cim:OperationalLimitSet rdf:ID="_4d000000-0000-4000-8000-000000000002"/>
  <cim:CurrentLimit rdf:ID="_6f000000-0000-4000-8000-000000000003">
    <cim:OperationalLimit.OperationalLimitSet rdf:resource="#_4d000000-0000-4000-8000-000000000002"/>
    <cim:OperationalLimit.OperationalLimitType rdf:resource="#_5e000000-0000-4000-8000-000000000001"/>
    <cim:CurrentLimit.value>1000</cim:CurrentLimit.value>
  </cim:CurrentLimit>
  <cim:CurrentLimit rdf:ID="_6f000000-0000-4000-8000-000000000004">
    <cim:OperationalLimit.OperationalLimitSet rdf:resource="#_4d000000-0000-4000-8000-000000000002"/>
    <cim:OperationalLimit.OperationalLimitType rdf:resource="#_5e000000-0000-4000-8000-000000000002"/>
    <cim:CurrentLimit.value>1100</cim:CurrentLimit.value>
  </cim:CurrentLimit>

  <cim:EquivalentInjection rdf:ID="_7a000000-0000-4000-8000-000000000001">
    <cim:IdentifiedObject.name>Boundary X1</cim:IdentifiedObject.name>
    <cim:EquivalentInjection.r>0</cim:EquivalentInjection.r>
    <cim:EquivalentInjection.x>0</cim:EquivalentInjection.x>
    <eu:IdentifiedObject.shortName>X1</eu:IdentifiedObject.shortName>
  </cim:EquivalentInjection>
</rdf:RDF>
"##;

fn report(xml: &str) -> ValidationReport {
    let graph = CgmesParser::new().parse_str(xml).unwrap();
    Validator::with_default_rules().run(&graph)
}

#[test]
fn unknown_tags_are_skipped_and_counted() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    // md:FullModel, vendor:Annotation
    assert_eq!(graph.stats().skipped, 2);
    assert_eq!(graph.stats().missing_identity, 1);
    assert!(graph.get("0f000000-0000-4000-8000-000000000002").is_none());
}

#[test]
fn pipeline_is_idempotent() {
    let parser = CgmesParser::new();
    let first = parser.parse_str(EQ_XML).unwrap();
    let second = parser.parse_str(EQ_XML).unwrap();
    assert_eq!(first.entities(), second.entities());
    assert_eq!(first.diagnostics(), second.diagnostics());

    let validator = Validator::with_default_rules();
    assert_eq!(validator.run(&first), validator.run(&second));
}

#[test]
fn duplicate_identifier_reported_once_with_both_types() {
    let report = report(EQ_XML);
    let duplicates: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::DuplicateIdentifier)
        .collect();

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].severity, Severity::Error);
    assert_eq!(duplicates[0].entities, vec![EntityId::new(SHARED_ID)]);
    assert!(duplicates[0].message.contains("Breaker"));
    assert!(duplicates[0].message.contains("Substation"));
    assert_eq!(report.count(FindingCategory::DuplicateWindingIdentifier), 0);
}

#[test]
fn every_reference_is_classified() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    for entity in graph.entities() {
        let fields = entity.reference_fields().count();
        assert_eq!(graph.references_of(entity).len(), fields);
        for reference in graph.references_of(entity) {
            assert!(matches!(
                reference.target,
                Resolution::Entity(_) | Resolution::Enum(_) | Resolution::Dangling(_)
            ));
        }
    }
}

#[test]
fn load_diagnostics_lead_the_report() {
    let report = report(EQ_XML);

    let missing = &report.findings[0];
    assert_eq!(missing.category, FindingCategory::MissingIdentity);
    assert_eq!(missing.severity, Severity::Warning);

    let dangling = &report.findings[1];
    assert_eq!(dangling.category, FindingCategory::DanglingReference);
    assert_eq!(
        dangling.entities,
        vec![EntityId::new("4a000000-0000-4000-8000-000000000001")]
    );
    assert!(dangling.message.contains("Terminal.ConnectivityNode"));
    assert!(dangling.message.contains("#_4a000000-0000-4000-8000-0000000000ff"));

    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let terminal = graph.get("4a000000-0000-4000-8000-000000000001").unwrap();
    assert!(graph
        .reference_from(terminal, "Terminal.ConnectivityNode")
        .unwrap()
        .target
        .is_dangling());
    assert_eq!(graph.find_by_name("Terminal", "orphan terminal").len(), 0);
}

#[test]
fn limit_ordering_violation_cites_both_values() {
    let report = report(EQ_XML);
    let violations: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::LimitOrderingViolation)
        .collect();

    // The 1000/1100 set is consistent
    assert_eq!(violations.len(), 1);
    assert!(violations[0].message.contains("900"));
    assert!(violations[0].message.contains("1000"));
    assert_eq!(
        violations[0].entities[0],
        EntityId::new("4d000000-0000-4000-8000-000000000001")
    );
}

#[test]
fn default_rules_report_remaining_problems() {
    let report = report(EQ_XML);
    assert_eq!(report.count(FindingCategory::ZeroImpedanceInjection), 1);
    assert_eq!(report.count(FindingCategory::StructuralTagIntegrity), 0);
    assert_eq!(report.count(FindingCategory::MalformedIdentifier), 0);
    assert_eq!(report.count(FindingCategory::RuleExecutionFailed), 0);
    assert!(report.has_errors());
}

#[test]
fn winding_summary_orders_ends_and_computes_ratio() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let summary = winding_summary(graph.as_ref(), TRANSFORMER, &AnalysisPolicy::default())
        .unwrap()
        .unwrap();

    let numbers: Vec<_> = summary.ends.iter().map(|e| e.end_number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2)]);
    assert_eq!(summary.ends[0].rated_u, Some(400.0));
    assert_eq!(summary.ends[1].rated_u, Some(150.0));
    assert_eq!(summary.ends[0].rated_s, Some(1000.0));
    assert_eq!(summary.ends[0].side, Some(WindingSide::High));
    assert_eq!(summary.ends[1].side, Some(WindingSide::High));
    assert_relative_eq!(summary.voltage_ratio.unwrap(), 2.67, epsilon = 0.005);
}

#[test]
fn slack_assessment_recommends_largest_unit() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let slack = slack_assessment(graph.as_ref(), &AnalysisPolicy::default()).unwrap();

    assert!(slack.candidates.is_empty());
    assert_eq!(
        slack.fallback,
        Some(EntityId::new("1a000000-0000-4000-8000-000000000002"))
    );
    assert_eq!(slack.warnings.len(), 1);
    assert_eq!(slack.warnings[0].category, FindingCategory::NoExplicitSlack);
    assert_eq!(slack.warnings[0].severity, Severity::Warning);
}

#[test]
fn queries_follow_reference_chains() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let policy = AnalysisPolicy::default();

    let capacity = capacity_summary(graph.as_ref(), &policy).unwrap();
    assert_relative_eq!(capacity.total_capacity, 850.0);
    assert_eq!(capacity.units[0].machines[0].rated_power_factor, Some(0.9));

    let mode = regulation_mode(graph.as_ref(), "NL-G1");
    assert_eq!(mode.mode().map(|m| m.member.as_str()), Some("voltage"));

    let limits = limit_summary(graph.as_ref(), LINE, &policy).unwrap().unwrap();
    let classes: Vec<_> = limits.rows.iter().map(|r| r.class).collect();
    assert_eq!(classes, vec![LimitClass::Permanent, LimitClass::Temporary]);
}

#[test]
fn failing_rule_does_not_suppress_others() {
    let xml = EQ_XML.replace(
        "<cim:EquivalentInjection.r>0</cim:EquivalentInjection.r>",
        "<cim:EquivalentInjection.r>n/a</cim:EquivalentInjection.r>",
    );
    let report = report(&xml);

    let failures: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::RuleExecutionFailed)
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("ZeroImpedance"));
    assert_eq!(
        failures[0].entities,
        vec![EntityId::new("7a000000-0000-4000-8000-000000000001")]
    );

    assert_eq!(report.count(FindingCategory::ZeroImpedanceInjection), 0);
    assert_eq!(report.count(FindingCategory::DuplicateIdentifier), 1);
    assert_eq!(report.count(FindingCategory::LimitOrderingViolation), 1);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let validator = Validator::with_default_rules();
    assert_eq!(
        validator.run(graph.as_ref()),
        validator.run_parallel(graph.as_ref())
    );
}

#[test]
fn structural_problems_in_raw_text() {
    let xml = EQ_XML.replace(
        "<cim:IdentifiedObject.name>NL-S1</cim:IdentifiedObject.name>",
        "<cim:IdentifiedObject.lname>NL-S1</cim:IdentifiedObject.lname>",
    );
    let report = report(&xml);
    assert_eq!(report.count(FindingCategory::StructuralTagIntegrity), 1);

    // A document missing its header close tag does not load, but can still be linted
    let broken = EQ_XML.replacen("</md:FullModel>", "", 1);
    assert!(CgmesParser::new().parse_str(&broken).is_err());
    let findings = cgmes_lite_analysis::scan_source(&broken, &AnalysisPolicy::default());
    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.contains("md:FullModel"));
}

#[test]
fn report_serializes_to_json() {
    let report = report(EQ_XML);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"DuplicateIdentifier\""));
    let back: ValidationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn policy_from_partial_json() {
    let policy: AnalysisPolicy =
        serde_json::from_str(r#"{ "high_side_threshold": 200.0 }"#).unwrap();
    assert_eq!(policy.high_side_threshold, 200.0);
    assert_eq!(policy.voltage_tolerance, 1.0);

    let graph = parse(EQ_XML.as_bytes()).unwrap();
    let summary = winding_summary(graph.as_ref(), TRANSFORMER, &policy)
        .unwrap()
        .unwrap();
    assert_eq!(summary.ends[1].side, Some(WindingSide::Low));
}
