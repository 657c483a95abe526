// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmarks for the load, extract and resolve pipeline.
//!
//! Run with: cargo bench -p cgmes-lite-parser

use cgmes_lite_parser::{extract, load_str, resolve, CgmesParser, ExtractorConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

/// Build a document with `count` substations, each with a voltage level,
/// a terminal and a line pointing back at it.
fn build_document(count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:cim="http://iec.ch/TC57/CIM100#">
"#,
    );

    for i in 0..count {
        let _ = write!(
            xml,
            r##"  <cim:Substation rdf:ID="_ss{i}">
    <cim:IdentifiedObject.name>S{i}</cim:IdentifiedObject.name>
  </cim:Substation>
  <cim:VoltageLevel rdf:ID="_vl{i}">
    <cim:IdentifiedObject.name>110</cim:IdentifiedObject.name>
    <cim:VoltageLevel.Substation rdf:resource="#_ss{i}"/>
    <cim:VoltageLevel.BaseVoltage rdf:resource="#_bv"/>
  </cim:VoltageLevel>
  <cim:ACLineSegment rdf:ID="_line{i}">
    <cim:ACLineSegment.r>0.5</cim:ACLineSegment.r>
    <cim:ACLineSegment.x>1.5</cim:ACLineSegment.x>
  </cim:ACLineSegment>
  <cim:Terminal rdf:ID="_t{i}">
    <cim:Terminal.ConductingEquipment rdf:resource="#_line{i}"/>
    <cim:ACDCTerminal.sequenceNumber>1</cim:ACDCTerminal.sequenceNumber>
  </cim:Terminal>
"##
        );
    }

    xml.push_str(
        r#"  <cim:BaseVoltage rdf:ID="_bv">
    <cim:BaseVoltage.nominalVoltage>110</cim:BaseVoltage.nominalVoltage>
  </cim:BaseVoltage>
</rdf:RDF>
"#,
    );
    xml
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let config = ExtractorConfig::default();

    for count in [100, 1_000, 10_000] {
        let xml = build_document(count);
        group.throughput(Throughput::Bytes(xml.len() as u64));

        group.bench_with_input(BenchmarkId::new("load", count), &xml, |b, xml| {
            b.iter(|| black_box(load_str(black_box(xml)).map(|root| root.children.len())));
        });

        let root = match load_str(&xml) {
            Ok(root) => root,
            Err(e) => panic!("benchmark document failed to load: {e}"),
        };
        group.bench_with_input(BenchmarkId::new("extract_resolve", count), &root, |b, root| {
            b.iter(|| black_box(resolve(extract(black_box(root), &config)).dangling_count()));
        });

        group.bench_with_input(BenchmarkId::new("full_parse", count), &xml, |b, xml| {
            let parser = CgmesParser::new();
            b.iter(|| black_box(parser.parse_str(black_box(xml)).is_ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
