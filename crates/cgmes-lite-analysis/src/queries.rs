// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topological queries
//!
//! Pure functions over `ModelGraph` returning structured records. Every
//! identifier of interest is a parameter; "not found" is an explicit result.

use crate::cim;
use crate::policy::{
    classify_limit_type, classify_winding_side, is_slack_control, AnalysisPolicy, LimitClass,
    WindingSide,
};
use crate::Result;
use cgmes_lite_model::{
    strip_identifier, Entity, EntityId, EnumValue, Finding, FindingCategory, ModelGraph,
    ModelGraphExt,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// Capacity
// ============================================================================

/// Synchronous machine attached to a generating unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineRating {
    pub id: EntityId,
    pub name: Option<String>,
    pub rated_power_factor: Option<f64>,
    pub rated_s: Option<f64>,
}

/// One generating unit with its machines
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitCapacity {
    pub id: EntityId,
    pub name: Option<String>,
    pub type_name: String,
    pub max_p: Option<f64>,
    pub min_p: Option<f64>,
    pub nominal_p: Option<f64>,
    pub machines: Vec<MachineRating>,
}

/// Generation capacity of the whole model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacitySummary {
    /// Sum of `maxOperatingP` over units that declare it
    pub total_capacity: f64,
    /// Generating units in document order
    pub units: Vec<UnitCapacity>,
}

/// Join every generating unit with the synchronous machines pointing at it
pub fn capacity_summary(graph: &dyn ModelGraph, policy: &AnalysisPolicy) -> Result<CapacitySummary> {
    let mut units = Vec::new();

    for unit in generating_units(graph, policy) {
        let mut machines = Vec::new();
        for machine in graph.references_to(unit, cim::MACHINE_GENERATING_UNIT) {
            if !machine.is_type(cim::SYNCHRONOUS_MACHINE) {
                continue;
            }
            machines.push(MachineRating {
                id: machine.id.clone(),
                name: machine.name().map(str::to_string),
                rated_power_factor: machine.number(cim::RATED_POWER_FACTOR)?,
                rated_s: machine.number(cim::RATED_S)?,
            });
        }

        units.push(UnitCapacity {
            id: unit.id.clone(),
            name: unit.name().map(str::to_string),
            type_name: unit.type_name.clone(),
            max_p: unit.number(cim::MAX_OPERATING_P)?,
            min_p: unit.number(cim::MIN_OPERATING_P)?,
            nominal_p: unit.number(cim::NOMINAL_P)?,
            machines,
        });
    }

    let total_capacity: f64 = units.iter().filter_map(|u| u.max_p).sum();
    Ok(CapacitySummary {
        total_capacity,
        units,
    })
}

fn generating_units<'g>(
    graph: &'g dyn ModelGraph,
    policy: &'g AnalysisPolicy,
) -> impl Iterator<Item = &'g Entity> {
    graph
        .entities()
        .iter()
        .filter(move |e| policy.is_generating_unit(&e.type_name))
}

// ============================================================================
// Regulation
// ============================================================================

/// Outcome of a regulation-mode lookup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegulationLookup {
    /// No synchronous machine carries the name
    MachineNotFound,
    /// The machine has no resolvable regulating control
    NoRegulatingControl { machine: EntityId },
    /// The control has no mode enumeration literal
    NoMode { machine: EntityId, control: EntityId },
    /// The control's mode
    Mode {
        machine: EntityId,
        control: EntityId,
        mode: EnumValue,
    },
}

impl RegulationLookup {
    /// Get the mode, if one was found
    pub fn mode(&self) -> Option<&EnumValue> {
        match self {
            RegulationLookup::Mode { mode, .. } => Some(mode),
            _ => None,
        }
    }
}

/// Look up the regulation mode of the synchronous machine named `generator_name`
///
/// When several machines share the name, the first in document order is used.
pub fn regulation_mode(graph: &dyn ModelGraph, generator_name: &str) -> RegulationLookup {
    let Some(machine) = graph
        .find_by_name(cim::SYNCHRONOUS_MACHINE, generator_name)
        .into_iter()
        .next()
    else {
        return RegulationLookup::MachineNotFound;
    };

    let Some(control) = graph.resolve_entity(machine, cim::REGULATING_CONTROL) else {
        return RegulationLookup::NoRegulatingControl {
            machine: machine.id.clone(),
        };
    };

    match graph.resolve_enum(control, cim::REGULATING_MODE) {
        Some(mode) => RegulationLookup::Mode {
            machine: machine.id.clone(),
            control: control.id.clone(),
            mode: mode.clone(),
        },
        None => RegulationLookup::NoMode {
            machine: machine.id.clone(),
            control: control.id.clone(),
        },
    }
}

// ============================================================================
// Windings
// ============================================================================

/// One transformer end
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindingEnd {
    pub id: EntityId,
    pub name: Option<String>,
    pub end_number: Option<i64>,
    pub rated_u: Option<f64>,
    pub rated_s: Option<f64>,
    /// Member of the connection-kind enumeration (`Yn`, `D`, ...)
    pub connection: Option<String>,
    /// `None` when the end has no rated voltage
    pub side: Option<WindingSide>,
}

/// Windings of one power transformer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindingSummary {
    pub transformer: EntityId,
    pub name: Option<String>,
    /// Ends by ascending end number, unnumbered ends last
    pub ends: Vec<WindingEnd>,
    /// Largest rated voltage over the second largest
    pub voltage_ratio: Option<f64>,
}

/// Summarize the windings of the power transformer `transformer_id`
///
/// Returns `Ok(None)` when no power transformer carries the id.
pub fn winding_summary(
    graph: &dyn ModelGraph,
    transformer_id: &str,
    policy: &AnalysisPolicy,
) -> Result<Option<WindingSummary>> {
    let Some(transformer) = graph
        .get(strip_identifier(transformer_id))
        .filter(|e| e.is_type(cim::POWER_TRANSFORMER))
    else {
        return Ok(None);
    };

    let mut ends = Vec::new();
    for end in graph.references_to(transformer, cim::END_TRANSFORMER) {
        if !end.is_type(&policy.transformer_end_type) {
            continue;
        }
        let rated_u = end.number(cim::END_RATED_U)?;
        ends.push(WindingEnd {
            id: end.id.clone(),
            name: end.name().map(str::to_string),
            end_number: end.integer(cim::END_NUMBER)?,
            rated_u,
            rated_s: end.number(cim::END_RATED_S)?,
            connection: graph
                .resolve_enum(end, cim::END_CONNECTION_KIND)
                .map(|kind| kind.member.clone()),
            side: rated_u.map(|u| classify_winding_side(u, policy.high_side_threshold)),
        });
    }

    // Stable: equal end numbers keep document order
    ends.sort_by_key(|end| (end.end_number.is_none(), end.end_number));

    Ok(Some(WindingSummary {
        transformer: transformer.id.clone(),
        name: transformer.name().map(str::to_string),
        voltage_ratio: voltage_ratio(&ends),
        ends,
    }))
}

fn voltage_ratio(ends: &[WindingEnd]) -> Option<f64> {
    let mut voltages: Vec<f64> = ends.iter().filter_map(|end| end.rated_u).collect();
    if voltages.len() < 2 {
        return None;
    }
    voltages.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    (voltages[1] != 0.0).then(|| voltages[0] / voltages[1])
}

// ============================================================================
// Limits
// ============================================================================

/// How long a limit may be applied
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LimitDuration {
    /// Infinite duration flag set
    Permanent,
    /// Declared acceptable duration
    Seconds(f64),
    /// Neither flag nor duration present
    Unspecified,
}

/// One limit reached from a line terminal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitRow {
    pub terminal: EntityId,
    pub sequence_number: Option<i64>,
    pub limit_set: EntityId,
    pub limit: EntityId,
    pub value: Option<f64>,
    pub type_name: Option<String>,
    pub duration: LimitDuration,
    pub class: LimitClass,
}

/// Operational limits of one line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineLimits {
    pub line: EntityId,
    pub name: Option<String>,
    /// Terminal, limit set and limit in document order
    pub rows: Vec<LimitRow>,
}

/// Collect the operational limits of the equipment `line_id`
///
/// Walks terminal -> limit set -> limit -> limit type, keeping limits of
/// `AnalysisPolicy::current_limit_type`. Returns `Ok(None)` when no entity
/// carries the id.
pub fn limit_summary(
    graph: &dyn ModelGraph,
    line_id: &str,
    policy: &AnalysisPolicy,
) -> Result<Option<LineLimits>> {
    let Some(line) = graph.get(strip_identifier(line_id)) else {
        return Ok(None);
    };

    let mut rows = Vec::new();
    for terminal in graph.references_to(line, cim::TERMINAL_EQUIPMENT) {
        let sequence_number = terminal.integer(cim::TERMINAL_SEQUENCE)?;

        for set in graph.references_to(terminal, cim::LIMIT_SET_TERMINAL) {
            let limits = graph.references_to(set, cim::LIMIT_SET);
            for limit in limits.into_iter().filter(|l| policy.is_current_limit(l)) {
                let limit_type = graph.resolve_entity(limit, cim::LIMIT_TYPE);
                let type_name = limit_type.and_then(Entity::name);

                rows.push(LimitRow {
                    terminal: terminal.id.clone(),
                    sequence_number,
                    limit_set: set.id.clone(),
                    limit: limit.id.clone(),
                    value: policy.limit_value(limit)?,
                    type_name: type_name.map(str::to_string),
                    duration: match limit_type {
                        Some(limit_type) => limit_duration(limit_type)?,
                        None => LimitDuration::Unspecified,
                    },
                    class: type_name
                        .map(|name| classify_limit_type(name, policy))
                        .unwrap_or(LimitClass::Other),
                });
            }
        }
    }

    Ok(Some(LineLimits {
        line: line.id.clone(),
        name: line.name().map(str::to_string),
        rows,
    }))
}

fn limit_duration(limit_type: &Entity) -> Result<LimitDuration> {
    if limit_type.flag(cim::LIMIT_INFINITE_DURATION) == Some(true) {
        return Ok(LimitDuration::Permanent);
    }
    Ok(match limit_type.number(cim::LIMIT_ACCEPTABLE_DURATION)? {
        Some(seconds) => LimitDuration::Seconds(seconds),
        None => LimitDuration::Unspecified,
    })
}

// ============================================================================
// Slack
// ============================================================================

/// Control settings of one generating unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitControl {
    pub id: EntityId,
    pub name: Option<String>,
    /// Member of the generator control-source enumeration
    pub control_source: Option<String>,
    pub max_p: Option<f64>,
    pub is_candidate: bool,
}

/// Slack generator assessment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlackAssessment {
    /// Every generating unit in document order
    pub units: Vec<UnitControl>,
    /// Units whose control source marks them as slack
    pub candidates: Vec<EntityId>,
    /// Recommended unit when there is no candidate
    pub fallback: Option<EntityId>,
    /// `NoExplicitSlack` warning when there is no candidate
    pub warnings: Vec<Finding>,
}

/// Find slack candidates among generating units
///
/// Without a candidate, the unit with the largest `maxOperatingP` (missing
/// counts as 0, first wins ties) is recommended and a warning is attached.
pub fn slack_assessment(graph: &dyn ModelGraph, policy: &AnalysisPolicy) -> Result<SlackAssessment> {
    let mut units = Vec::new();
    for unit in generating_units(graph, policy) {
        let control_source = graph
            .resolve_enum(unit, cim::GEN_CONTROL_SOURCE)
            .map(|source| source.member.clone());
        let is_candidate = control_source
            .as_deref()
            .is_some_and(|member| is_slack_control(member, policy));

        units.push(UnitControl {
            id: unit.id.clone(),
            name: unit.name().map(str::to_string),
            control_source,
            max_p: unit.number(cim::MAX_OPERATING_P)?,
            is_candidate,
        });
    }

    let candidates: Vec<EntityId> = units
        .iter()
        .filter(|u| u.is_candidate)
        .map(|u| u.id.clone())
        .collect();

    let mut fallback = None;
    let mut warnings = Vec::new();

    if candidates.is_empty() {
        let largest = units.iter().fold(None, |best: Option<&UnitControl>, unit| match best {
            Some(b) if unit.max_p.unwrap_or(0.0) <= b.max_p.unwrap_or(0.0) => Some(b),
            _ => Some(unit),
        });

        let warning = match largest {
            Some(unit) => Finding::warning(
                FindingCategory::NoExplicitSlack,
                format!(
                    "No generating unit is under slack control; {} has the largest maxOperatingP ({} MW) and can act as slack",
                    unit.name.as_deref().unwrap_or(unit.id.as_str()),
                    unit.max_p.unwrap_or(0.0)
                ),
            )
            .with_entity(&unit.id),
            None => Finding::warning(
                FindingCategory::NoExplicitSlack,
                "No generating units in the model; no slack generator available",
            ),
        };

        log::debug!("{}", warning.message);
        fallback = largest.map(|unit| unit.id.clone());
        warnings.push(warning);
    }

    Ok(SlackAssessment {
        units,
        candidates,
        fallback,
        warnings,
    })
}
