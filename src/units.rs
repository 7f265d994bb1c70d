// ABOUTME: Unit vocabulary, base-unit assignments and scalar conversions
// ABOUTME: Provides the ConversionTable used to normalize aggregated values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Units and Conversions
//!
//! Each canonical metric has exactly one base unit; every `MetricValue`
//! scalar and every normalized statistic is expressed in it. Native stores
//! are free to report aggregates in their own units (Health Connect returns
//! energy in joules, for example); [`ConversionTable`] bridges that gap once
//! per connector instead of on every query.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::MetricType;

/// Units a scalar health value can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Dimensionless count
    Count,
    /// Meters
    Meters,
    /// Kilometers
    Kilometers,
    /// Centimeters
    Centimeters,
    /// Statute miles
    Miles,
    /// Kilocalories
    Kilocalories,
    /// Joules
    Joules,
    /// Beats per minute
    BeatsPerMinute,
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Meters per second
    MetersPerSecond,
    /// Kilometers per hour
    KilometersPerHour,
    /// Miles per hour
    MilesPerHour,
    /// Watts
    Watts,
    /// Revolutions per minute
    RevolutionsPerMinute,
    /// Milliliters of oxygen per kilogram per minute
    MillilitersPerKilogramPerMinute,
    /// Millimeters of mercury
    MillimetersOfMercury,
    /// Breaths per minute
    BreathsPerMinute,
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
    /// Percentage (0-100)
    Percent,
    /// Millimoles per liter
    MillimolesPerLiter,
    /// Milligrams per deciliter
    MilligramsPerDeciliter,
    /// Kilograms
    Kilograms,
    /// Pounds
    Pounds,
    /// Liters
    Liters,
    /// Milliliters
    Milliliters,
    /// Grams
    Grams,
    /// Milligrams
    Milligrams,
    /// A-weighted decibels
    Decibels,
    /// Dimensionless index (UV index, BMI)
    Index,
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let symbol = match self {
            Self::Count => "count",
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Centimeters => "cm",
            Self::Miles => "mi",
            Self::Kilocalories => "kcal",
            Self::Joules => "J",
            Self::BeatsPerMinute => "bpm",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "min",
            Self::MetersPerSecond => "m/s",
            Self::KilometersPerHour => "km/h",
            Self::MilesPerHour => "mph",
            Self::Watts => "W",
            Self::RevolutionsPerMinute => "rpm",
            Self::MillilitersPerKilogramPerMinute => "mL/kg/min",
            Self::MillimetersOfMercury => "mmHg",
            Self::BreathsPerMinute => "breaths/min",
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Percent => "%",
            Self::MillimolesPerLiter => "mmol/L",
            Self::MilligramsPerDeciliter => "mg/dL",
            Self::Kilograms => "kg",
            Self::Pounds => "lb",
            Self::Liters => "L",
            Self::Milliliters => "mL",
            Self::Grams => "g",
            Self::Milligrams => "mg",
            Self::Decibels => "dB(A)",
            Self::Index => "index",
        };
        f.write_str(symbol)
    }
}

/// The base unit every canonical scalar of `metric` is expressed in.
///
/// Composite and categorical metrics report `Count`; their records have no
/// single scalar and only participate in counting aggregates.
#[must_use]
pub const fn base_unit(metric: MetricType) -> Unit {
    match metric {
        MetricType::Steps
        | MetricType::WheelchairPushes
        | MetricType::FloorsClimbed
        | MetricType::Workout
        | MetricType::Nutrition
        | MetricType::SleepSession
        | MetricType::ClinicalAllergies
        | MetricType::ClinicalConditions
        | MetricType::ClinicalImmunizations
        | MetricType::ClinicalLabResults
        | MetricType::ClinicalMedications
        | MetricType::ClinicalProcedures
        | MetricType::ClinicalVitalSigns
        | MetricType::MenstruationFlow
        | MetricType::MenstruationPeriod
        | MetricType::OvulationTest
        | MetricType::CervicalMucus
        | MetricType::SexualActivity
        | MetricType::IntermenstrualBleeding => Unit::Count,
        MetricType::Distance
        | MetricType::RunningStrideLength
        | MetricType::WalkingStepLength
        | MetricType::SixMinuteWalkDistance
        | MetricType::Height
        | MetricType::WaistCircumference => Unit::Meters,
        MetricType::ActiveCalories | MetricType::TotalCalories | MetricType::BasalCalories => {
            Unit::Kilocalories
        }
        MetricType::Speed
        | MetricType::RunningSpeed
        | MetricType::WalkingSpeed
        | MetricType::StairAscentSpeed
        | MetricType::StairDescentSpeed => Unit::MetersPerSecond,
        MetricType::Power | MetricType::RunningPower => Unit::Watts,
        MetricType::CyclingCadence => Unit::RevolutionsPerMinute,
        MetricType::Vo2Max => Unit::MillilitersPerKilogramPerMinute,
        MetricType::ExerciseTime | MetricType::TimeInDaylight => Unit::Minutes,
        MetricType::RunningVerticalOscillation => Unit::Centimeters,
        MetricType::RunningGroundContactTime | MetricType::HeartRateVariability => {
            Unit::Milliseconds
        }
        MetricType::HeartRate
        | MetricType::RestingHeartRate
        | MetricType::WalkingHeartRateAverage => Unit::BeatsPerMinute,
        MetricType::BloodPressure => Unit::MillimetersOfMercury,
        MetricType::RespiratoryRate => Unit::BreathsPerMinute,
        MetricType::BodyTemperature | MetricType::BasalBodyTemperature => Unit::Celsius,
        MetricType::OxygenSaturation
        | MetricType::BodyFat
        | MetricType::WalkingAsymmetry
        | MetricType::WalkingDoubleSupport
        | MetricType::WalkingSteadiness => Unit::Percent,
        MetricType::BloodGlucose => Unit::MillimolesPerLiter,
        MetricType::Weight | MetricType::LeanBodyMass | MetricType::BoneMass => Unit::Kilograms,
        MetricType::BodyMassIndex | MetricType::UvExposure => Unit::Index,
        MetricType::Hydration => Unit::Liters,
        MetricType::Caffeine => Unit::Milligrams,
        MetricType::EnvironmentalAudioExposure | MetricType::HeadphoneAudioExposure => {
            Unit::Decibels
        }
    }
}

const METERS_PER_MILE: f64 = 1_609.344;
const KILOGRAMS_PER_POUND: f64 = 0.453_592_37;
const JOULES_PER_KILOCALORIE: f64 = 4_184.0;
const MPS_PER_MPH: f64 = 0.447_04;
const MGDL_PER_MMOLL: f64 = 18.018_2;

/// Convert `value` from one unit to another.
///
/// # Errors
///
/// Returns `ConversionFailed` when no conversion path exists between the two
/// units. Identity conversion always succeeds.
pub fn convert(value: f64, from: Unit, to: Unit) -> ConnectorResult<f64> {
    if from == to {
        return Ok(value);
    }
    let converted = match (from, to) {
        (Unit::Kilometers, Unit::Meters) => value * 1_000.0,
        (Unit::Meters, Unit::Kilometers) => value / 1_000.0,
        (Unit::Centimeters, Unit::Meters) => value / 100.0,
        (Unit::Meters, Unit::Centimeters) => value * 100.0,
        (Unit::Miles, Unit::Meters) => value * METERS_PER_MILE,
        (Unit::Meters, Unit::Miles) => value / METERS_PER_MILE,
        (Unit::Pounds, Unit::Kilograms) => value * KILOGRAMS_PER_POUND,
        (Unit::Kilograms, Unit::Pounds) => value / KILOGRAMS_PER_POUND,
        (Unit::Grams, Unit::Kilograms) => value / 1_000.0,
        (Unit::Kilograms, Unit::Grams) => value * 1_000.0,
        (Unit::Grams, Unit::Milligrams) => value * 1_000.0,
        (Unit::Milligrams, Unit::Grams) => value / 1_000.0,
        (Unit::Joules, Unit::Kilocalories) => value / JOULES_PER_KILOCALORIE,
        (Unit::Kilocalories, Unit::Joules) => value * JOULES_PER_KILOCALORIE,
        (Unit::Fahrenheit, Unit::Celsius) => (value - 32.0) * 5.0 / 9.0,
        (Unit::Celsius, Unit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
        (Unit::KilometersPerHour, Unit::MetersPerSecond) => value / 3.6,
        (Unit::MetersPerSecond, Unit::KilometersPerHour) => value * 3.6,
        (Unit::MilesPerHour, Unit::MetersPerSecond) => value * MPS_PER_MPH,
        (Unit::MetersPerSecond, Unit::MilesPerHour) => value / MPS_PER_MPH,
        (Unit::MilligramsPerDeciliter, Unit::MillimolesPerLiter) => value / MGDL_PER_MMOLL,
        (Unit::MillimolesPerLiter, Unit::MilligramsPerDeciliter) => value * MGDL_PER_MMOLL,
        (Unit::Milliseconds, Unit::Seconds) => value / 1_000.0,
        (Unit::Seconds, Unit::Milliseconds) => value * 1_000.0,
        (Unit::Seconds, Unit::Minutes) => value / 60.0,
        (Unit::Minutes, Unit::Seconds) => value * 60.0,
        (Unit::Milliseconds, Unit::Minutes) => value / 60_000.0,
        (Unit::Minutes, Unit::Milliseconds) => value * 60_000.0,
        (Unit::Milliliters, Unit::Liters) => value / 1_000.0,
        (Unit::Liters, Unit::Milliliters) => value * 1_000.0,
        _ => return Err(ConnectorError::conversion(from, to)),
    };
    Ok(converted)
}

/// Per-metric mapping from a store's native unit to the canonical base unit.
///
/// Built once when a connector is initialized, by asking the adapter which
/// unit it reports each metric's aggregates in. Lookups after that are
/// lock-free map reads.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    native: HashMap<MetricType, Unit>,
}

impl ConversionTable {
    /// Build the table by querying `native_unit` for every canonical metric.
    pub fn new_with(mut native_unit: impl FnMut(MetricType) -> Unit) -> Self {
        let native = MetricType::ALL
            .iter()
            .map(|&metric| (metric, native_unit(metric)))
            .collect();
        Self { native }
    }

    /// A table for a store that already reports base units everywhere.
    #[must_use]
    pub fn identity() -> Self {
        Self::new_with(base_unit)
    }

    /// The unit the store natively reports `metric` in.
    #[must_use]
    pub fn native_unit(&self, metric: MetricType) -> Unit {
        self.native
            .get(&metric)
            .copied()
            .unwrap_or_else(|| base_unit(metric))
    }

    /// Convert a natively-reported `value` for `metric` into its base unit.
    ///
    /// # Errors
    ///
    /// Returns `ConversionFailed` when the store reports a unit the table has
    /// no path from.
    pub fn normalize(&self, metric: MetricType, value: f64) -> ConnectorResult<f64> {
        convert(value, self.native_unit(metric), base_unit(metric))
    }
}
