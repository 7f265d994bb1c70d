// ABOUTME: Canonical data model shared by every platform connector
// ABOUTME: Defines MetricType, DataPoint, permissions, sessions and statistics types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Canonical Data Model
//!
//! This module contains the platform-neutral types every connector speaks.
//! The native stores disagree about record shapes, units, permission
//! vocabulary and which metrics exist at all, so the canonical model
//! is deliberately closed: a fixed [`MetricType`] enumeration, one
//! [`DataPoint`] shape with a [`MetricValue`] variant per metric, and value
//! types for permissions, sessions and statistics that are comparable across
//! platforms.
//!
//! ## Design Principles
//!
//! - **Closed set**: the metric enumeration is defined once at compile time.
//!   Adapters map native records into it; nothing downstream branches on
//!   platform-specific types.
//! - **Base units**: every `MetricValue` carries its payload in the metric's
//!   base unit (meters, kilocalories, beats per minute, ...). Unit conversion
//!   happens at the adapter/aggregation boundary, never in consumer code.
//! - **Immutable data points**: a [`DataPoint`] is constructed by an adapter
//!   at read/observe time and owned by the caller once returned.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ConnectorError, ConnectorResult};

/// Opaque identifier of a live workout session.
pub type SessionId = Uuid;

/// Broad grouping of metric types, used for documentation and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Activity and exercise metrics (steps, distance, calories, ...)
    Fitness,
    /// Vital signs (heart rate, blood pressure, respiration, ...)
    Vitals,
    /// Body measurements (weight, height, body fat, ...)
    BodyMeasurement,
    /// Dietary intake (nutrition, hydration, caffeine)
    Nutrition,
    /// Sleep tracking
    Sleep,
    /// Gait and mobility measurements
    Mobility,
    /// Environmental exposure (audio, UV, daylight)
    Environmental,
    /// Clinical health records (FHIR-backed)
    Clinical,
    /// Reproductive health tracking
    ReproductiveHealth,
}

/// The closed set of canonical metric types.
///
/// One variant per kind of health measurement the connector understands.
/// Adapters translate native record types into this enumeration; the
/// capability registry answers which variants a given platform can actually
/// read or write. The set is closed on purpose; extending it
/// is a source-level change, not a runtime concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    // Fitness
    /// Step count
    Steps,
    /// Distance covered
    Distance,
    /// Active energy burned
    ActiveCalories,
    /// Total energy burned (active + basal)
    TotalCalories,
    /// Basal (resting) energy burned
    BasalCalories,
    /// Flights of stairs climbed
    FloorsClimbed,
    /// Instantaneous speed
    Speed,
    /// Instantaneous power output
    Power,
    /// Cycling pedaling cadence
    CyclingCadence,
    /// Maximal oxygen uptake estimate
    Vo2Max,
    /// Wheelchair pushes
    WheelchairPushes,
    /// Minutes of brisk activity
    ExerciseTime,
    /// A completed workout summary record
    Workout,
    /// Running stride length
    RunningStrideLength,
    /// Running vertical oscillation
    RunningVerticalOscillation,
    /// Running ground contact time
    RunningGroundContactTime,
    /// Running power output
    RunningPower,
    /// Running speed
    RunningSpeed,

    // Vitals
    /// Heart rate sample
    HeartRate,
    /// Resting heart rate
    RestingHeartRate,
    /// Average heart rate while walking
    WalkingHeartRateAverage,
    /// Heart rate variability (SDNN)
    HeartRateVariability,
    /// Blood pressure reading (systolic/diastolic)
    BloodPressure,
    /// Respiratory rate
    RespiratoryRate,
    /// Body temperature
    BodyTemperature,
    /// Basal body temperature
    BasalBodyTemperature,
    /// Blood oxygen saturation
    OxygenSaturation,
    /// Blood glucose concentration
    BloodGlucose,

    // Body measurement
    /// Body weight
    Weight,
    /// Body height
    Height,
    /// Body fat percentage
    BodyFat,
    /// Lean body mass
    LeanBodyMass,
    /// Bone mass
    BoneMass,
    /// Body mass index
    BodyMassIndex,
    /// Waist circumference
    WaistCircumference,

    // Nutrition
    /// Dietary intake record (energy and macros)
    Nutrition,
    /// Water intake
    Hydration,
    /// Caffeine intake
    Caffeine,

    // Sleep
    /// A sleep session with optional stage breakdown
    SleepSession,

    // Mobility
    /// Average walking speed
    WalkingSpeed,
    /// Average walking step length
    WalkingStepLength,
    /// Walking asymmetry percentage
    WalkingAsymmetry,
    /// Double-support percentage while walking
    WalkingDoubleSupport,
    /// Walking steadiness score
    WalkingSteadiness,
    /// Stair ascent speed
    StairAscentSpeed,
    /// Stair descent speed
    StairDescentSpeed,
    /// Six-minute walk test distance
    SixMinuteWalkDistance,

    // Environmental
    /// Environmental sound exposure
    EnvironmentalAudioExposure,
    /// Headphone sound exposure
    HeadphoneAudioExposure,
    /// Ultraviolet exposure index
    UvExposure,
    /// Time spent in daylight
    TimeInDaylight,

    // Clinical records
    /// Allergy and intolerance records
    ClinicalAllergies,
    /// Condition/diagnosis records
    ClinicalConditions,
    /// Immunization records
    ClinicalImmunizations,
    /// Laboratory result records
    ClinicalLabResults,
    /// Medication records
    ClinicalMedications,
    /// Procedure records
    ClinicalProcedures,
    /// Clinical vital-sign records
    ClinicalVitalSigns,

    // Reproductive health
    /// Menstruation flow observation
    MenstruationFlow,
    /// Menstruation period record
    MenstruationPeriod,
    /// Ovulation test result
    OvulationTest,
    /// Cervical mucus observation
    CervicalMucus,
    /// Sexual activity record
    SexualActivity,
    /// Intermenstrual bleeding (spotting) record
    IntermenstrualBleeding,
}

/// How a metric's samples combine over time, which determines the set of
/// statistic operations that are meaningful for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    /// Values accumulate (steps, distance, energy): Sum and Count apply.
    Cumulative,
    /// Values are point-in-time samples (heart rate, weight): Average,
    /// Minimum, Maximum and Count apply.
    Sampled,
    /// Discrete records without a meaningful scalar (workouts, sleep,
    /// clinical and categorical data): only Count applies.
    Recorded,
}

impl AggregationKind {
    /// Whether `op` produces a meaningful result for metrics of this kind.
    #[must_use]
    pub const fn supports(self, op: StatOp) -> bool {
        match self {
            Self::Cumulative => matches!(op, StatOp::Sum | StatOp::Count),
            Self::Sampled => matches!(
                op,
                StatOp::Average | StatOp::Minimum | StatOp::Maximum | StatOp::Count
            ),
            Self::Recorded => matches!(op, StatOp::Count),
        }
    }
}

impl MetricType {
    /// Every canonical metric type, in declaration order.
    pub const ALL: [Self; 64] = [
        Self::Steps,
        Self::Distance,
        Self::ActiveCalories,
        Self::TotalCalories,
        Self::BasalCalories,
        Self::FloorsClimbed,
        Self::Speed,
        Self::Power,
        Self::CyclingCadence,
        Self::Vo2Max,
        Self::WheelchairPushes,
        Self::ExerciseTime,
        Self::Workout,
        Self::RunningStrideLength,
        Self::RunningVerticalOscillation,
        Self::RunningGroundContactTime,
        Self::RunningPower,
        Self::RunningSpeed,
        Self::HeartRate,
        Self::RestingHeartRate,
        Self::WalkingHeartRateAverage,
        Self::HeartRateVariability,
        Self::BloodPressure,
        Self::RespiratoryRate,
        Self::BodyTemperature,
        Self::BasalBodyTemperature,
        Self::OxygenSaturation,
        Self::BloodGlucose,
        Self::Weight,
        Self::Height,
        Self::BodyFat,
        Self::LeanBodyMass,
        Self::BoneMass,
        Self::BodyMassIndex,
        Self::WaistCircumference,
        Self::Nutrition,
        Self::Hydration,
        Self::Caffeine,
        Self::SleepSession,
        Self::WalkingSpeed,
        Self::WalkingStepLength,
        Self::WalkingAsymmetry,
        Self::WalkingDoubleSupport,
        Self::WalkingSteadiness,
        Self::StairAscentSpeed,
        Self::StairDescentSpeed,
        Self::SixMinuteWalkDistance,
        Self::EnvironmentalAudioExposure,
        Self::HeadphoneAudioExposure,
        Self::UvExposure,
        Self::TimeInDaylight,
        Self::ClinicalAllergies,
        Self::ClinicalConditions,
        Self::ClinicalImmunizations,
        Self::ClinicalLabResults,
        Self::ClinicalMedications,
        Self::ClinicalProcedures,
        Self::ClinicalVitalSigns,
        Self::MenstruationFlow,
        Self::MenstruationPeriod,
        Self::OvulationTest,
        Self::CervicalMucus,
        Self::SexualActivity,
        Self::IntermenstrualBleeding,
    ];

    /// Stable snake_case name, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Distance => "distance",
            Self::ActiveCalories => "active_calories",
            Self::TotalCalories => "total_calories",
            Self::BasalCalories => "basal_calories",
            Self::FloorsClimbed => "floors_climbed",
            Self::Speed => "speed",
            Self::Power => "power",
            Self::CyclingCadence => "cycling_cadence",
            Self::Vo2Max => "vo2_max",
            Self::WheelchairPushes => "wheelchair_pushes",
            Self::ExerciseTime => "exercise_time",
            Self::Workout => "workout",
            Self::RunningStrideLength => "running_stride_length",
            Self::RunningVerticalOscillation => "running_vertical_oscillation",
            Self::RunningGroundContactTime => "running_ground_contact_time",
            Self::RunningPower => "running_power",
            Self::RunningSpeed => "running_speed",
            Self::HeartRate => "heart_rate",
            Self::RestingHeartRate => "resting_heart_rate",
            Self::WalkingHeartRateAverage => "walking_heart_rate_average",
            Self::HeartRateVariability => "heart_rate_variability",
            Self::BloodPressure => "blood_pressure",
            Self::RespiratoryRate => "respiratory_rate",
            Self::BodyTemperature => "body_temperature",
            Self::BasalBodyTemperature => "basal_body_temperature",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::BloodGlucose => "blood_glucose",
            Self::Weight => "weight",
            Self::Height => "height",
            Self::BodyFat => "body_fat",
            Self::LeanBodyMass => "lean_body_mass",
            Self::BoneMass => "bone_mass",
            Self::BodyMassIndex => "body_mass_index",
            Self::WaistCircumference => "waist_circumference",
            Self::Nutrition => "nutrition",
            Self::Hydration => "hydration",
            Self::Caffeine => "caffeine",
            Self::SleepSession => "sleep_session",
            Self::WalkingSpeed => "walking_speed",
            Self::WalkingStepLength => "walking_step_length",
            Self::WalkingAsymmetry => "walking_asymmetry",
            Self::WalkingDoubleSupport => "walking_double_support",
            Self::WalkingSteadiness => "walking_steadiness",
            Self::StairAscentSpeed => "stair_ascent_speed",
            Self::StairDescentSpeed => "stair_descent_speed",
            Self::SixMinuteWalkDistance => "six_minute_walk_distance",
            Self::EnvironmentalAudioExposure => "environmental_audio_exposure",
            Self::HeadphoneAudioExposure => "headphone_audio_exposure",
            Self::UvExposure => "uv_exposure",
            Self::TimeInDaylight => "time_in_daylight",
            Self::ClinicalAllergies => "clinical_allergies",
            Self::ClinicalConditions => "clinical_conditions",
            Self::ClinicalImmunizations => "clinical_immunizations",
            Self::ClinicalLabResults => "clinical_lab_results",
            Self::ClinicalMedications => "clinical_medications",
            Self::ClinicalProcedures => "clinical_procedures",
            Self::ClinicalVitalSigns => "clinical_vital_signs",
            Self::MenstruationFlow => "menstruation_flow",
            Self::MenstruationPeriod => "menstruation_period",
            Self::OvulationTest => "ovulation_test",
            Self::CervicalMucus => "cervical_mucus",
            Self::SexualActivity => "sexual_activity",
            Self::IntermenstrualBleeding => "intermenstrual_bleeding",
        }
    }

    /// The category this metric belongs to.
    #[must_use]
    pub const fn category(self) -> MetricCategory {
        match self {
            Self::Steps
            | Self::Distance
            | Self::ActiveCalories
            | Self::TotalCalories
            | Self::BasalCalories
            | Self::FloorsClimbed
            | Self::Speed
            | Self::Power
            | Self::CyclingCadence
            | Self::Vo2Max
            | Self::WheelchairPushes
            | Self::ExerciseTime
            | Self::Workout
            | Self::RunningStrideLength
            | Self::RunningVerticalOscillation
            | Self::RunningGroundContactTime
            | Self::RunningPower
            | Self::RunningSpeed => MetricCategory::Fitness,
            Self::HeartRate
            | Self::RestingHeartRate
            | Self::WalkingHeartRateAverage
            | Self::HeartRateVariability
            | Self::BloodPressure
            | Self::RespiratoryRate
            | Self::BodyTemperature
            | Self::BasalBodyTemperature
            | Self::OxygenSaturation
            | Self::BloodGlucose => MetricCategory::Vitals,
            Self::Weight
            | Self::Height
            | Self::BodyFat
            | Self::LeanBodyMass
            | Self::BoneMass
            | Self::BodyMassIndex
            | Self::WaistCircumference => MetricCategory::BodyMeasurement,
            Self::Nutrition | Self::Hydration | Self::Caffeine => MetricCategory::Nutrition,
            Self::SleepSession => MetricCategory::Sleep,
            Self::WalkingSpeed
            | Self::WalkingStepLength
            | Self::WalkingAsymmetry
            | Self::WalkingDoubleSupport
            | Self::WalkingSteadiness
            | Self::StairAscentSpeed
            | Self::StairDescentSpeed
            | Self::SixMinuteWalkDistance => MetricCategory::Mobility,
            Self::EnvironmentalAudioExposure
            | Self::HeadphoneAudioExposure
            | Self::UvExposure
            | Self::TimeInDaylight => MetricCategory::Environmental,
            Self::ClinicalAllergies
            | Self::ClinicalConditions
            | Self::ClinicalImmunizations
            | Self::ClinicalLabResults
            | Self::ClinicalMedications
            | Self::ClinicalProcedures
            | Self::ClinicalVitalSigns => MetricCategory::Clinical,
            Self::MenstruationFlow
            | Self::MenstruationPeriod
            | Self::OvulationTest
            | Self::CervicalMucus
            | Self::SexualActivity
            | Self::IntermenstrualBleeding => MetricCategory::ReproductiveHealth,
        }
    }

    /// How samples of this metric combine over time.
    #[must_use]
    pub const fn aggregation_kind(self) -> AggregationKind {
        match self {
            Self::Steps
            | Self::Distance
            | Self::ActiveCalories
            | Self::TotalCalories
            | Self::BasalCalories
            | Self::FloorsClimbed
            | Self::WheelchairPushes
            | Self::ExerciseTime
            | Self::Hydration
            | Self::Caffeine
            | Self::TimeInDaylight => AggregationKind::Cumulative,
            Self::Speed
            | Self::Power
            | Self::CyclingCadence
            | Self::Vo2Max
            | Self::RunningStrideLength
            | Self::RunningVerticalOscillation
            | Self::RunningGroundContactTime
            | Self::RunningPower
            | Self::RunningSpeed
            | Self::HeartRate
            | Self::RestingHeartRate
            | Self::WalkingHeartRateAverage
            | Self::HeartRateVariability
            | Self::BloodPressure
            | Self::RespiratoryRate
            | Self::BodyTemperature
            | Self::BasalBodyTemperature
            | Self::OxygenSaturation
            | Self::BloodGlucose
            | Self::Weight
            | Self::Height
            | Self::BodyFat
            | Self::LeanBodyMass
            | Self::BoneMass
            | Self::BodyMassIndex
            | Self::WaistCircumference
            | Self::WalkingSpeed
            | Self::WalkingStepLength
            | Self::WalkingAsymmetry
            | Self::WalkingDoubleSupport
            | Self::WalkingSteadiness
            | Self::StairAscentSpeed
            | Self::StairDescentSpeed
            | Self::SixMinuteWalkDistance
            | Self::EnvironmentalAudioExposure
            | Self::HeadphoneAudioExposure
            | Self::UvExposure => AggregationKind::Sampled,
            Self::Workout
            | Self::Nutrition
            | Self::SleepSession
            | Self::ClinicalAllergies
            | Self::ClinicalConditions
            | Self::ClinicalImmunizations
            | Self::ClinicalLabResults
            | Self::ClinicalMedications
            | Self::ClinicalProcedures
            | Self::ClinicalVitalSigns
            | Self::MenstruationFlow
            | Self::MenstruationPeriod
            | Self::OvulationTest
            | Self::CervicalMucus
            | Self::SexualActivity
            | Self::IntermenstrualBleeding => AggregationKind::Recorded,
        }
    }

    /// Whether this is one of the FHIR-backed clinical record types.
    #[must_use]
    pub const fn is_clinical(self) -> bool {
        matches!(self.category(), MetricCategory::Clinical)
    }
}

impl Display for MetricType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Direction of access to a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// Reading existing records
    Read,
    /// Writing new records
    Write,
}

impl Display for AccessKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// One (metric, access) pair, the unit of permission negotiation.
///
/// Permissions are plain value types; sets of them (`BTreeSet<Permission>`)
/// are what gets requested, granted and reported. The `Ord` impl keeps
/// reported sets deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    /// The metric being accessed
    pub metric: MetricType,
    /// Whether the access is read or write
    pub access: AccessKind,
}

impl Permission {
    /// Read permission for `metric`.
    #[must_use]
    pub const fn read(metric: MetricType) -> Self {
        Self {
            metric,
            access: AccessKind::Read,
        }
    }

    /// Write permission for `metric`.
    #[must_use]
    pub const fn write(metric: MetricType) -> Self {
        Self {
            metric,
            access: AccessKind::Write,
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.metric, self.access)
    }
}

/// Outcome of checking or requesting a set of permissions.
///
/// `PartiallyGranted` upholds two invariants: the granted and denied sets are
/// disjoint, and their union is exactly the requested set. Use
/// [`PermissionStatus::from_partition`] to construct statuses so the collapsed
/// forms (`Granted`/`Denied`) are produced whenever one side is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Every requested permission is granted.
    Granted,
    /// Every requested permission is denied.
    Denied,
    /// The platform has not yet decided, or the answer could not be read.
    NotDetermined,
    /// Some requested permissions are granted and the rest denied.
    PartiallyGranted {
        /// The granted subset of the requested permissions
        granted: BTreeSet<Permission>,
        /// The denied subset of the requested permissions
        denied: BTreeSet<Permission>,
    },
}

impl PermissionStatus {
    /// Build a status from a granted/denied partition of the requested set.
    ///
    /// An empty denied side collapses to `Granted`, an empty granted side to
    /// `Denied`. Both sides empty (an empty request) is vacuously `Granted`.
    #[must_use]
    pub fn from_partition(granted: BTreeSet<Permission>, denied: BTreeSet<Permission>) -> Self {
        match (granted.is_empty(), denied.is_empty()) {
            (_, true) => Self::Granted,
            (true, false) => Self::Denied,
            (false, false) => Self::PartiallyGranted { granted, denied },
        }
    }

    /// Whether every requested permission is granted.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The granted subset, if the status carries one.
    #[must_use]
    pub fn granted(&self) -> Option<&BTreeSet<Permission>> {
        match self {
            Self::PartiallyGranted { granted, .. } => Some(granted),
            _ => None,
        }
    }

    /// The denied subset, if the status carries one.
    #[must_use]
    pub fn denied(&self) -> Option<&BTreeSet<Permission>> {
        match self {
            Self::PartiallyGranted { denied, .. } => Some(denied),
            _ => None,
        }
    }
}

/// Where a data point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Recorded by a physical device (watch, scale, chest strap, ...)
    Device,
    /// Entered or synthesized by an application
    Application,
}

/// Descriptor of the device that recorded a data point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device manufacturer, when the platform reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Device model, when the platform reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The producer of a data point: a named app or device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Source name (bundle id, package name or device name)
    pub name: String,
    /// Whether the source is a device or an application
    pub origin: SourceOrigin,
    /// Device descriptor, when the origin is a device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
}

impl DataSource {
    /// A data source describing an application.
    #[must_use]
    pub fn application(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: SourceOrigin::Application,
            device: None,
        }
    }

    /// A data source describing a recording device.
    #[must_use]
    pub fn device(name: impl Into<String>, device: DeviceInfo) -> Self {
        Self {
            name: name.into(),
            origin: SourceOrigin::Device,
            device: Some(device),
        }
    }
}

/// Sleep stage classification within a sleep session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStageKind {
    /// Awake during the session
    Awake,
    /// Light sleep
    Light,
    /// Deep sleep
    Deep,
    /// REM sleep
    Rem,
}

/// One contiguous sleep stage interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStageSample {
    /// Stage classification
    pub stage: SleepStageKind,
    /// Stage start
    pub start: DateTime<Utc>,
    /// Stage end
    pub end: DateTime<Utc>,
}

/// Opaque reference to a FHIR-backed clinical record.
///
/// The connector does not parse FHIR JSON; it carries the platform's resource
/// identity and a display label so applications can fetch the full resource
/// through platform channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// FHIR resource identifier assigned by the platform
    pub fhir_resource_id: String,
    /// Human-readable record label
    pub display_name: String,
}

/// Menstruation flow intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenstruationFlowKind {
    /// Light flow
    Light,
    /// Medium flow
    Medium,
    /// Heavy flow
    Heavy,
    /// Flow recorded without an intensity
    Unspecified,
}

/// Ovulation test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvulationTestResult {
    /// Negative result
    Negative,
    /// Positive result
    Positive,
    /// Result could not be determined
    Indeterminate,
}

/// Cervical mucus quality observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CervicalMucusQuality {
    /// Dry
    Dry,
    /// Sticky
    Sticky,
    /// Creamy
    Creamy,
    /// Watery
    Watery,
    /// Egg-white consistency
    EggWhite,
}

/// Metric-specific payload of a [`DataPoint`], one variant per metric.
///
/// All scalar fields are in the metric's base unit. The serde `metric` tag
/// matches [`MetricType`]'s snake_case names, so a serialized point is
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricValue {
    /// Step count over the sample interval
    Steps {
        /// Number of steps
        count: u64,
    },
    /// Distance covered in meters
    Distance {
        /// Meters
        meters: f64,
    },
    /// Active energy burned
    ActiveCalories {
        /// Kilocalories
        kilocalories: f64,
    },
    /// Total energy burned
    TotalCalories {
        /// Kilocalories
        kilocalories: f64,
    },
    /// Basal energy burned
    BasalCalories {
        /// Kilocalories
        kilocalories: f64,
    },
    /// Flights of stairs climbed
    FloorsClimbed {
        /// Number of floors
        floors: f64,
    },
    /// Instantaneous speed
    Speed {
        /// Meters per second
        meters_per_second: f64,
    },
    /// Instantaneous power
    Power {
        /// Watts
        watts: f64,
    },
    /// Cycling pedaling cadence
    CyclingCadence {
        /// Revolutions per minute
        rpm: f64,
    },
    /// VO2 max estimate
    Vo2Max {
        /// Milliliters of oxygen per kilogram per minute
        ml_per_kg_per_min: f64,
    },
    /// Wheelchair pushes over the sample interval
    WheelchairPushes {
        /// Number of pushes
        count: u64,
    },
    /// Minutes of brisk activity
    ExerciseTime {
        /// Minutes
        minutes: f64,
    },
    /// Completed workout summary
    Workout {
        /// The kind of workout
        workout_type: WorkoutType,
        /// Elapsed duration in seconds
        duration_seconds: f64,
        /// Total active energy burned, when tracked
        total_active_calories: Option<f64>,
        /// Total distance in meters, when tracked
        total_distance_meters: Option<f64>,
        /// Lowest heart rate observed, when tracked
        min_heart_rate_bpm: Option<f64>,
        /// Highest heart rate observed, when tracked
        max_heart_rate_bpm: Option<f64>,
        /// Steps taken during the workout, when tracked
        step_count: Option<u64>,
    },
    /// Running stride length
    RunningStrideLength {
        /// Meters
        meters: f64,
    },
    /// Running vertical oscillation
    RunningVerticalOscillation {
        /// Centimeters
        centimeters: f64,
    },
    /// Running ground contact time
    RunningGroundContactTime {
        /// Milliseconds
        milliseconds: f64,
    },
    /// Running power
    RunningPower {
        /// Watts
        watts: f64,
    },
    /// Running speed
    RunningSpeed {
        /// Meters per second
        meters_per_second: f64,
    },
    /// Heart rate sample
    HeartRate {
        /// Beats per minute
        bpm: f64,
    },
    /// Resting heart rate
    RestingHeartRate {
        /// Beats per minute
        bpm: f64,
    },
    /// Walking heart rate average
    WalkingHeartRateAverage {
        /// Beats per minute
        bpm: f64,
    },
    /// Heart rate variability
    HeartRateVariability {
        /// SDNN in milliseconds
        sdnn_ms: f64,
    },
    /// Blood pressure reading
    BloodPressure {
        /// Systolic pressure in mmHg
        systolic_mmhg: f64,
        /// Diastolic pressure in mmHg
        diastolic_mmhg: f64,
    },
    /// Respiratory rate
    RespiratoryRate {
        /// Breaths per minute
        breaths_per_minute: f64,
    },
    /// Body temperature
    BodyTemperature {
        /// Degrees Celsius
        celsius: f64,
    },
    /// Basal body temperature
    BasalBodyTemperature {
        /// Degrees Celsius
        celsius: f64,
    },
    /// Blood oxygen saturation
    OxygenSaturation {
        /// Percent (0-100)
        percent: f64,
    },
    /// Blood glucose concentration
    BloodGlucose {
        /// Millimoles per liter
        mmol_per_liter: f64,
    },
    /// Body weight
    Weight {
        /// Kilograms
        kilograms: f64,
    },
    /// Body height
    Height {
        /// Meters
        meters: f64,
    },
    /// Body fat percentage
    BodyFat {
        /// Percent (0-100)
        percent: f64,
    },
    /// Lean body mass
    LeanBodyMass {
        /// Kilograms
        kilograms: f64,
    },
    /// Bone mass
    BoneMass {
        /// Kilograms
        kilograms: f64,
    },
    /// Body mass index
    BodyMassIndex {
        /// kg/m^2
        index: f64,
    },
    /// Waist circumference
    WaistCircumference {
        /// Meters
        meters: f64,
    },
    /// Dietary intake record
    Nutrition {
        /// Energy in kilocalories, when recorded
        energy_kilocalories: Option<f64>,
        /// Protein in grams, when recorded
        protein_grams: Option<f64>,
        /// Carbohydrates in grams, when recorded
        carbohydrate_grams: Option<f64>,
        /// Fat in grams, when recorded
        fat_grams: Option<f64>,
    },
    /// Water intake
    Hydration {
        /// Liters
        liters: f64,
    },
    /// Caffeine intake
    Caffeine {
        /// Milligrams
        milligrams: f64,
    },
    /// Sleep session with optional stage breakdown
    SleepSession {
        /// Total session duration in seconds
        duration_seconds: f64,
        /// Stage intervals, empty when the platform records none
        stages: Vec<SleepStageSample>,
    },
    /// Average walking speed
    WalkingSpeed {
        /// Meters per second
        meters_per_second: f64,
    },
    /// Average walking step length
    WalkingStepLength {
        /// Meters
        meters: f64,
    },
    /// Walking asymmetry
    WalkingAsymmetry {
        /// Percent (0-100)
        percent: f64,
    },
    /// Walking double-support percentage
    WalkingDoubleSupport {
        /// Percent (0-100)
        percent: f64,
    },
    /// Walking steadiness score
    WalkingSteadiness {
        /// Percent (0-100)
        percent: f64,
    },
    /// Stair ascent speed
    StairAscentSpeed {
        /// Meters per second
        meters_per_second: f64,
    },
    /// Stair descent speed
    StairDescentSpeed {
        /// Meters per second
        meters_per_second: f64,
    },
    /// Six-minute walk test distance
    SixMinuteWalkDistance {
        /// Meters
        meters: f64,
    },
    /// Environmental sound exposure
    EnvironmentalAudioExposure {
        /// A-weighted decibels
        decibels: f64,
    },
    /// Headphone sound exposure
    HeadphoneAudioExposure {
        /// A-weighted decibels
        decibels: f64,
    },
    /// Ultraviolet exposure
    UvExposure {
        /// UV index
        index: f64,
    },
    /// Time spent in daylight
    TimeInDaylight {
        /// Minutes
        minutes: f64,
    },
    /// Allergy/intolerance clinical record
    ClinicalAllergies(ClinicalRecord),
    /// Condition clinical record
    ClinicalConditions(ClinicalRecord),
    /// Immunization clinical record
    ClinicalImmunizations(ClinicalRecord),
    /// Laboratory result clinical record
    ClinicalLabResults(ClinicalRecord),
    /// Medication clinical record
    ClinicalMedications(ClinicalRecord),
    /// Procedure clinical record
    ClinicalProcedures(ClinicalRecord),
    /// Clinical vital-sign record
    ClinicalVitalSigns(ClinicalRecord),
    /// Menstruation flow observation
    MenstruationFlow {
        /// Flow intensity
        flow: MenstruationFlowKind,
    },
    /// Menstruation period record
    MenstruationPeriod {
        /// Period duration in seconds
        duration_seconds: f64,
    },
    /// Ovulation test result
    OvulationTest {
        /// Test outcome
        result: OvulationTestResult,
    },
    /// Cervical mucus observation
    CervicalMucus {
        /// Observed quality
        quality: CervicalMucusQuality,
    },
    /// Sexual activity record
    SexualActivity {
        /// Whether protection was used, when recorded
        protection_used: Option<bool>,
    },
    /// Intermenstrual bleeding record
    IntermenstrualBleeding,
}

impl MetricValue {
    /// The canonical metric type this value belongs to.
    #[must_use]
    pub const fn metric(&self) -> MetricType {
        match self {
            Self::Steps { .. } => MetricType::Steps,
            Self::Distance { .. } => MetricType::Distance,
            Self::ActiveCalories { .. } => MetricType::ActiveCalories,
            Self::TotalCalories { .. } => MetricType::TotalCalories,
            Self::BasalCalories { .. } => MetricType::BasalCalories,
            Self::FloorsClimbed { .. } => MetricType::FloorsClimbed,
            Self::Speed { .. } => MetricType::Speed,
            Self::Power { .. } => MetricType::Power,
            Self::CyclingCadence { .. } => MetricType::CyclingCadence,
            Self::Vo2Max { .. } => MetricType::Vo2Max,
            Self::WheelchairPushes { .. } => MetricType::WheelchairPushes,
            Self::ExerciseTime { .. } => MetricType::ExerciseTime,
            Self::Workout { .. } => MetricType::Workout,
            Self::RunningStrideLength { .. } => MetricType::RunningStrideLength,
            Self::RunningVerticalOscillation { .. } => MetricType::RunningVerticalOscillation,
            Self::RunningGroundContactTime { .. } => MetricType::RunningGroundContactTime,
            Self::RunningPower { .. } => MetricType::RunningPower,
            Self::RunningSpeed { .. } => MetricType::RunningSpeed,
            Self::HeartRate { .. } => MetricType::HeartRate,
            Self::RestingHeartRate { .. } => MetricType::RestingHeartRate,
            Self::WalkingHeartRateAverage { .. } => MetricType::WalkingHeartRateAverage,
            Self::HeartRateVariability { .. } => MetricType::HeartRateVariability,
            Self::BloodPressure { .. } => MetricType::BloodPressure,
            Self::RespiratoryRate { .. } => MetricType::RespiratoryRate,
            Self::BodyTemperature { .. } => MetricType::BodyTemperature,
            Self::BasalBodyTemperature { .. } => MetricType::BasalBodyTemperature,
            Self::OxygenSaturation { .. } => MetricType::OxygenSaturation,
            Self::BloodGlucose { .. } => MetricType::BloodGlucose,
            Self::Weight { .. } => MetricType::Weight,
            Self::Height { .. } => MetricType::Height,
            Self::BodyFat { .. } => MetricType::BodyFat,
            Self::LeanBodyMass { .. } => MetricType::LeanBodyMass,
            Self::BoneMass { .. } => MetricType::BoneMass,
            Self::BodyMassIndex { .. } => MetricType::BodyMassIndex,
            Self::WaistCircumference { .. } => MetricType::WaistCircumference,
            Self::Nutrition { .. } => MetricType::Nutrition,
            Self::Hydration { .. } => MetricType::Hydration,
            Self::Caffeine { .. } => MetricType::Caffeine,
            Self::SleepSession { .. } => MetricType::SleepSession,
            Self::WalkingSpeed { .. } => MetricType::WalkingSpeed,
            Self::WalkingStepLength { .. } => MetricType::WalkingStepLength,
            Self::WalkingAsymmetry { .. } => MetricType::WalkingAsymmetry,
            Self::WalkingDoubleSupport { .. } => MetricType::WalkingDoubleSupport,
            Self::WalkingSteadiness { .. } => MetricType::WalkingSteadiness,
            Self::StairAscentSpeed { .. } => MetricType::StairAscentSpeed,
            Self::StairDescentSpeed { .. } => MetricType::StairDescentSpeed,
            Self::SixMinuteWalkDistance { .. } => MetricType::SixMinuteWalkDistance,
            Self::EnvironmentalAudioExposure { .. } => MetricType::EnvironmentalAudioExposure,
            Self::HeadphoneAudioExposure { .. } => MetricType::HeadphoneAudioExposure,
            Self::UvExposure { .. } => MetricType::UvExposure,
            Self::TimeInDaylight { .. } => MetricType::TimeInDaylight,
            Self::ClinicalAllergies(_) => MetricType::ClinicalAllergies,
            Self::ClinicalConditions(_) => MetricType::ClinicalConditions,
            Self::ClinicalImmunizations(_) => MetricType::ClinicalImmunizations,
            Self::ClinicalLabResults(_) => MetricType::ClinicalLabResults,
            Self::ClinicalMedications(_) => MetricType::ClinicalMedications,
            Self::ClinicalProcedures(_) => MetricType::ClinicalProcedures,
            Self::ClinicalVitalSigns(_) => MetricType::ClinicalVitalSigns,
            Self::MenstruationFlow { .. } => MetricType::MenstruationFlow,
            Self::MenstruationPeriod { .. } => MetricType::MenstruationPeriod,
            Self::OvulationTest { .. } => MetricType::OvulationTest,
            Self::CervicalMucus { .. } => MetricType::CervicalMucus,
            Self::SexualActivity { .. } => MetricType::SexualActivity,
            Self::IntermenstrualBleeding => MetricType::IntermenstrualBleeding,
        }
    }

    /// The primary scalar of this value in its base unit, when one exists.
    ///
    /// Composite and categorical values (workouts, nutrition, sleep, clinical
    /// and reproductive records) have no single magnitude and return `None`;
    /// they participate in statistics only via Count.
    #[must_use]
    pub fn magnitude(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
        match self {
            Self::Steps { count } | Self::WheelchairPushes { count } => Some(*count as f64),
            Self::Distance { meters }
            | Self::RunningStrideLength { meters }
            | Self::WalkingStepLength { meters }
            | Self::SixMinuteWalkDistance { meters }
            | Self::Height { meters }
            | Self::WaistCircumference { meters } => Some(*meters),
            Self::ActiveCalories { kilocalories }
            | Self::TotalCalories { kilocalories }
            | Self::BasalCalories { kilocalories } => Some(*kilocalories),
            Self::FloorsClimbed { floors } => Some(*floors),
            Self::Speed { meters_per_second }
            | Self::RunningSpeed { meters_per_second }
            | Self::WalkingSpeed { meters_per_second }
            | Self::StairAscentSpeed { meters_per_second }
            | Self::StairDescentSpeed { meters_per_second } => Some(*meters_per_second),
            Self::Power { watts } | Self::RunningPower { watts } => Some(*watts),
            Self::CyclingCadence { rpm } => Some(*rpm),
            Self::Vo2Max { ml_per_kg_per_min } => Some(*ml_per_kg_per_min),
            Self::ExerciseTime { minutes } | Self::TimeInDaylight { minutes } => Some(*minutes),
            Self::RunningVerticalOscillation { centimeters } => Some(*centimeters),
            Self::RunningGroundContactTime { milliseconds } => Some(*milliseconds),
            Self::HeartRate { bpm }
            | Self::RestingHeartRate { bpm }
            | Self::WalkingHeartRateAverage { bpm } => Some(*bpm),
            Self::HeartRateVariability { sdnn_ms } => Some(*sdnn_ms),
            // By convention the systolic component is the aggregated scalar.
            Self::BloodPressure { systolic_mmhg, .. } => Some(*systolic_mmhg),
            Self::RespiratoryRate { breaths_per_minute } => Some(*breaths_per_minute),
            Self::BodyTemperature { celsius } | Self::BasalBodyTemperature { celsius } => {
                Some(*celsius)
            }
            Self::OxygenSaturation { percent }
            | Self::BodyFat { percent }
            | Self::WalkingAsymmetry { percent }
            | Self::WalkingDoubleSupport { percent }
            | Self::WalkingSteadiness { percent } => Some(*percent),
            Self::BloodGlucose { mmol_per_liter } => Some(*mmol_per_liter),
            Self::Weight { kilograms }
            | Self::LeanBodyMass { kilograms }
            | Self::BoneMass { kilograms } => Some(*kilograms),
            Self::BodyMassIndex { index } => Some(*index),
            Self::Hydration { liters } => Some(*liters),
            Self::Caffeine { milligrams } => Some(*milligrams),
            Self::EnvironmentalAudioExposure { decibels }
            | Self::HeadphoneAudioExposure { decibels } => Some(*decibels),
            Self::UvExposure { index } => Some(*index),
            Self::Workout { .. }
            | Self::Nutrition { .. }
            | Self::SleepSession { .. }
            | Self::ClinicalAllergies(_)
            | Self::ClinicalConditions(_)
            | Self::ClinicalImmunizations(_)
            | Self::ClinicalLabResults(_)
            | Self::ClinicalMedications(_)
            | Self::ClinicalProcedures(_)
            | Self::ClinicalVitalSigns(_)
            | Self::MenstruationFlow { .. }
            | Self::MenstruationPeriod { .. }
            | Self::OvulationTest { .. }
            | Self::CervicalMucus { .. }
            | Self::SexualActivity { .. }
            | Self::IntermenstrualBleeding => None,
        }
    }

    /// Validate the payload before it is written to a store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` naming the offending field when a scalar is
    /// non-finite, outside its physiological domain, or negative where only
    /// non-negative values make sense.
    pub fn validate(&self) -> ConnectorResult<()> {
        match self {
            Self::Steps { .. }
            | Self::WheelchairPushes { .. }
            | Self::ClinicalAllergies(_)
            | Self::ClinicalConditions(_)
            | Self::ClinicalImmunizations(_)
            | Self::ClinicalLabResults(_)
            | Self::ClinicalMedications(_)
            | Self::ClinicalProcedures(_)
            | Self::ClinicalVitalSigns(_)
            | Self::MenstruationFlow { .. }
            | Self::OvulationTest { .. }
            | Self::CervicalMucus { .. }
            | Self::SexualActivity { .. }
            | Self::IntermenstrualBleeding => Ok(()),
            Self::Distance { meters }
            | Self::RunningStrideLength { meters }
            | Self::WalkingStepLength { meters }
            | Self::SixMinuteWalkDistance { meters } => non_negative("meters", *meters),
            Self::ActiveCalories { kilocalories }
            | Self::TotalCalories { kilocalories }
            | Self::BasalCalories { kilocalories } => non_negative("kilocalories", *kilocalories),
            Self::FloorsClimbed { floors } => non_negative("floors", *floors),
            Self::Speed { meters_per_second }
            | Self::RunningSpeed { meters_per_second }
            | Self::WalkingSpeed { meters_per_second }
            | Self::StairAscentSpeed { meters_per_second }
            | Self::StairDescentSpeed { meters_per_second } => {
                non_negative("meters_per_second", *meters_per_second)
            }
            Self::Power { watts } | Self::RunningPower { watts } => non_negative("watts", *watts),
            Self::CyclingCadence { rpm } => non_negative("rpm", *rpm),
            Self::Vo2Max { ml_per_kg_per_min } => positive("ml_per_kg_per_min", *ml_per_kg_per_min),
            Self::ExerciseTime { minutes } | Self::TimeInDaylight { minutes } => {
                non_negative("minutes", *minutes)
            }
            Self::Workout {
                duration_seconds,
                total_active_calories,
                total_distance_meters,
                min_heart_rate_bpm,
                max_heart_rate_bpm,
                ..
            } => {
                non_negative("duration_seconds", *duration_seconds)?;
                if let Some(kcal) = total_active_calories {
                    non_negative("total_active_calories", *kcal)?;
                }
                if let Some(m) = total_distance_meters {
                    non_negative("total_distance_meters", *m)?;
                }
                if let Some(bpm) = min_heart_rate_bpm {
                    positive("min_heart_rate_bpm", *bpm)?;
                }
                if let Some(bpm) = max_heart_rate_bpm {
                    positive("max_heart_rate_bpm", *bpm)?;
                }
                Ok(())
            }
            Self::RunningVerticalOscillation { centimeters } => {
                non_negative("centimeters", *centimeters)
            }
            Self::RunningGroundContactTime { milliseconds } => {
                non_negative("milliseconds", *milliseconds)
            }
            Self::HeartRate { bpm }
            | Self::RestingHeartRate { bpm }
            | Self::WalkingHeartRateAverage { bpm } => positive("bpm", *bpm),
            Self::HeartRateVariability { sdnn_ms } => non_negative("sdnn_ms", *sdnn_ms),
            Self::BloodPressure {
                systolic_mmhg,
                diastolic_mmhg,
            } => {
                positive("systolic_mmhg", *systolic_mmhg)?;
                positive("diastolic_mmhg", *diastolic_mmhg)
            }
            Self::RespiratoryRate { breaths_per_minute } => {
                positive("breaths_per_minute", *breaths_per_minute)
            }
            Self::BodyTemperature { celsius } | Self::BasalBodyTemperature { celsius } => {
                finite("celsius", *celsius)
            }
            Self::OxygenSaturation { percent }
            | Self::BodyFat { percent }
            | Self::WalkingAsymmetry { percent }
            | Self::WalkingDoubleSupport { percent }
            | Self::WalkingSteadiness { percent } => percent_range("percent", *percent),
            Self::BloodGlucose { mmol_per_liter } => positive("mmol_per_liter", *mmol_per_liter),
            Self::Weight { kilograms }
            | Self::LeanBodyMass { kilograms }
            | Self::BoneMass { kilograms } => positive("kilograms", *kilograms),
            Self::Height { meters } | Self::WaistCircumference { meters } => {
                positive("meters", *meters)
            }
            Self::BodyMassIndex { index } => positive("index", *index),
            Self::Nutrition {
                energy_kilocalories,
                protein_grams,
                carbohydrate_grams,
                fat_grams,
            } => {
                if let Some(kcal) = energy_kilocalories {
                    non_negative("energy_kilocalories", *kcal)?;
                }
                if let Some(g) = protein_grams {
                    non_negative("protein_grams", *g)?;
                }
                if let Some(g) = carbohydrate_grams {
                    non_negative("carbohydrate_grams", *g)?;
                }
                if let Some(g) = fat_grams {
                    non_negative("fat_grams", *g)?;
                }
                Ok(())
            }
            Self::Hydration { liters } => non_negative("liters", *liters),
            Self::Caffeine { milligrams } => non_negative("milligrams", *milligrams),
            Self::SleepSession {
                duration_seconds, ..
            }
            | Self::MenstruationPeriod { duration_seconds } => {
                non_negative("duration_seconds", *duration_seconds)
            }
            Self::EnvironmentalAudioExposure { decibels }
            | Self::HeadphoneAudioExposure { decibels } => non_negative("decibels", *decibels),
            Self::UvExposure { index } => non_negative("index", *index),
        }
    }
}

fn finite(field: &'static str, value: f64) -> ConnectorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConnectorError::validation(field, "must be a finite number"))
    }
}

fn non_negative(field: &'static str, value: f64) -> ConnectorResult<()> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConnectorError::validation(field, "must not be negative"))
    }
}

fn positive(field: &'static str, value: f64) -> ConnectorResult<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConnectorError::validation(field, "must be positive"))
    }
}

fn percent_range(field: &'static str, value: f64) -> ConnectorResult<()> {
    finite(field, value)?;
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConnectorError::validation(field, "must be within 0-100"))
    }
}

/// One canonical health sample or record.
///
/// Constructed by a platform adapter at read/observe time (or by a caller
/// about to write) and immutable afterwards. `uid` carries the
/// platform-assigned record identity: present on records read back from a
/// store, `None` on freshly built points that have not been inserted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Platform-assigned record identity, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// When the measurement was taken (interval records use their start)
    pub timestamp: DateTime<Utc>,
    /// Who produced the record, when the platform reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    /// Open string-keyed metadata attached by the producer
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// The metric payload
    #[serde(flatten)]
    pub value: MetricValue,
}

impl DataPoint {
    /// Build a data point for `value` measured at `timestamp`.
    #[must_use]
    pub fn new(value: MetricValue, timestamp: DateTime<Utc>) -> Self {
        Self {
            uid: None,
            timestamp,
            source: None,
            metadata: HashMap::new(),
            value,
        }
    }

    /// Attach the platform-assigned record identity.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Attach the producing source.
    #[must_use]
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach one metadata entry.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The canonical metric type of this point.
    #[must_use]
    pub const fn metric(&self) -> MetricType {
        self.value.metric()
    }
}

/// Enumeration of workout kinds a session can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Running
    Running,
    /// Cycling
    Cycling,
    /// Walking
    Walking,
    /// Hiking
    Hiking,
    /// Swimming
    Swimming,
    /// Strength training
    StrengthTraining,
    /// Yoga
    Yoga,
    /// Pilates
    Pilates,
    /// Rowing
    Rowing,
    /// Elliptical trainer
    Elliptical,
    /// High-intensity interval training
    Hiit,
    /// Dance
    Dance,
    /// Martial arts
    MartialArts,
    /// Skiing
    Skiing,
    /// Snowboarding
    Snowboarding,
    /// Skating
    Skating,
    /// Wheelchair workout
    Wheelchair,
    /// Anything else
    Other,
}

impl Display for WorkoutType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
            Self::Walking => "walking",
            Self::Hiking => "hiking",
            Self::Swimming => "swimming",
            Self::StrengthTraining => "strength_training",
            Self::Yoga => "yoga",
            Self::Pilates => "pilates",
            Self::Rowing => "rowing",
            Self::Elliptical => "elliptical",
            Self::Hiit => "hiit",
            Self::Dance => "dance",
            Self::MartialArts => "martial_arts",
            Self::Skiing => "skiing",
            Self::Snowboarding => "snowboarding",
            Self::Skating => "skating",
            Self::Wheelchair => "wheelchair",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a workout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session allocated, subscriptions being opened
    Preparing,
    /// Session live, metric streams running
    Running,
    /// Session suspended, streams stopped
    Paused,
    /// Session completed and summarized
    Ended,
    /// Session abandoned without persisting anything
    Discarded,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Preparing => "preparing",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

/// Caller-facing snapshot of a workout session.
///
/// The session registry owns the live object; this snapshot is what lifecycle
/// operations return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Opaque session identity
    pub id: SessionId,
    /// The kind of workout being tracked
    pub workout_type: WorkoutType,
    /// Current lifecycle state
    pub state: SessionState,
    /// When the session started
    pub started_at: DateTime<Utc>,
}

/// Statistic operations a caller can request over a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatOp {
    /// Arithmetic mean of the samples
    Average,
    /// Smallest sample
    Minimum,
    /// Largest sample
    Maximum,
    /// Sum over the bucket
    Sum,
    /// Number of records in the bucket
    Count,
}

impl Display for StatOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Average => "average",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Sum => "sum",
            Self::Count => "count",
        };
        f.write_str(name)
    }
}

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` when `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ConnectorResult<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(ConnectorError::validation(
                "range",
                "start must be before end",
            ))
        }
    }

    /// The trailing range of `duration` ending at `end`.
    #[must_use]
    pub fn trailing(end: DateTime<Utc>, duration: ChronoDuration) -> Self {
        Self {
            start: end - duration,
            end,
        }
    }

    /// Whether `instant` falls inside the half-open interval.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Length of the range.
    #[must_use]
    pub fn duration(&self) -> ChronoDuration {
        self.end - self.start
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// One time bucket of a statistics query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticBucket {
    /// The bucket's sub-range
    pub range: TimeRange,
    /// Computed values per requested operation; ops that are not meaningful
    /// for the metric (or could not be computed from zero samples) are absent
    pub values: HashMap<StatOp, f64>,
}

/// Result of a statistics query: ordered, non-overlapping buckets covering
/// the requested range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    /// The queried metric
    pub metric: MetricType,
    /// The full requested range
    pub range: TimeRange,
    /// Buckets ordered by start time
    pub buckets: Vec<StatisticBucket>,
}
