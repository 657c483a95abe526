// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CIM class and property names read by rules and queries

// Classes
pub const SYNCHRONOUS_MACHINE: &str = "SynchronousMachine";
pub const POWER_TRANSFORMER: &str = "PowerTransformer";
pub const VOLTAGE_LEVEL: &str = "VoltageLevel";
pub const EQUIVALENT_INJECTION: &str = "EquivalentInjection";

// Generating units and machines
pub const MAX_OPERATING_P: &str = "GeneratingUnit.maxOperatingP";
pub const MIN_OPERATING_P: &str = "GeneratingUnit.minOperatingP";
pub const NOMINAL_P: &str = "GeneratingUnit.nominalP";
pub const GEN_CONTROL_SOURCE: &str = "GeneratingUnit.genControlSource";
pub const MACHINE_GENERATING_UNIT: &str = "RotatingMachine.GeneratingUnit";
pub const RATED_POWER_FACTOR: &str = "RotatingMachine.ratedPowerFactor";
pub const RATED_S: &str = "RotatingMachine.ratedS";
pub const REGULATING_CONTROL: &str = "RegulatingCondEq.RegulatingControl";
pub const REGULATING_MODE: &str = "RegulatingControl.mode";

// Transformers
pub const END_TRANSFORMER: &str = "PowerTransformerEnd.PowerTransformer";
pub const END_NUMBER: &str = "TransformerEnd.endNumber";
pub const END_RATED_U: &str = "PowerTransformerEnd.ratedU";
pub const END_RATED_S: &str = "PowerTransformerEnd.ratedS";
pub const END_CONNECTION_KIND: &str = "PowerTransformerEnd.connectionKind";

// Terminals and operational limits
pub const TERMINAL_EQUIPMENT: &str = "Terminal.ConductingEquipment";
pub const TERMINAL_SEQUENCE: &str = "ACDCTerminal.sequenceNumber";
pub const LIMIT_SET_TERMINAL: &str = "OperationalLimitSet.Terminal";
pub const LIMIT_SET: &str = "OperationalLimit.OperationalLimitSet";
pub const LIMIT_TYPE: &str = "OperationalLimit.OperationalLimitType";
pub const LIMIT_INFINITE_DURATION: &str = "OperationalLimitType.isInfiniteDuration";
pub const LIMIT_ACCEPTABLE_DURATION: &str = "OperationalLimitType.acceptableDuration";

// Voltage levels and injections
pub const VOLTAGE_LEVEL_BASE_VOLTAGE: &str = "VoltageLevel.BaseVoltage";
pub const NOMINAL_VOLTAGE: &str = "BaseVoltage.nominalVoltage";
pub const INJECTION_R: &str = "EquivalentInjection.r";
pub const INJECTION_X: &str = "EquivalentInjection.x";
