// ABOUTME: Canonical-permission to native-token mapping tables per platform
// ABOUTME: Returns None for pairs the platform has no permission vocabulary for
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! Native permission vocabulary.
//!
//! Health Connect spells permissions as manifest strings
//! (`android.permission.health.READ_STEPS`), HealthKit as object type
//! identifiers (`HKQuantityTypeIdentifierStepCount`). A `(metric, access)`
//! pair with no entry here simply cannot be asked for on that platform; the
//! negotiator reports such pairs as denied without presenting any UI.

use crate::capabilities::Platform;
use crate::models::{AccessKind, MetricType};
use crate::store::NativeToken;

/// Map a canonical `(metric, access)` pair onto the platform's native token.
///
/// Returns `None` when the platform has no permission covering the pair:
/// writes to clinical records (read-only everywhere), metrics without a
/// native record type, and platform-derived metrics that apps cannot write.
#[must_use]
pub fn native_token(
    platform: Platform,
    metric: MetricType,
    access: AccessKind,
) -> Option<NativeToken> {
    match platform {
        Platform::HealthConnect => health_connect_token(metric, access),
        Platform::HealthKit => health_kit_token(metric, access),
    }
}

fn health_connect_token(metric: MetricType, access: AccessKind) -> Option<NativeToken> {
    if metric.is_clinical() && access == AccessKind::Write {
        return None;
    }
    let suffix = health_connect_suffix(metric)?;
    let verb = match access {
        AccessKind::Read => "READ",
        AccessKind::Write => "WRITE",
    };
    Some(NativeToken {
        identifier: format!("android.permission.health.{verb}_{suffix}"),
        access,
    })
}

fn health_kit_token(metric: MetricType, access: AccessKind) -> Option<NativeToken> {
    if access == AccessKind::Write && health_kit_read_only(metric) {
        return None;
    }
    let identifier = health_kit_identifier(metric)?;
    Some(NativeToken {
        identifier: identifier.to_owned(),
        access,
    })
}

/// Metrics HealthKit computes itself; apps can read but never write them.
const fn health_kit_read_only(metric: MetricType) -> bool {
    metric.is_clinical()
        || matches!(
            metric,
            MetricType::ExerciseTime
                | MetricType::WalkingHeartRateAverage
                | MetricType::WalkingSteadiness
                | MetricType::TimeInDaylight
        )
}

/// Permission suffix per metric; `None` for metrics without a Health Connect
/// record type. Menstruation flow and period share one MENSTRUATION
/// permission, mirroring the platform.
const fn health_connect_suffix(metric: MetricType) -> Option<&'static str> {
    let suffix = match metric {
        MetricType::Steps => "STEPS",
        MetricType::Distance => "DISTANCE",
        MetricType::ActiveCalories => "ACTIVE_CALORIES_BURNED",
        MetricType::TotalCalories => "TOTAL_CALORIES_BURNED",
        MetricType::BasalCalories => "BASAL_METABOLIC_RATE",
        MetricType::FloorsClimbed => "FLOORS_CLIMBED",
        MetricType::Speed => "SPEED",
        MetricType::Power => "POWER",
        MetricType::CyclingCadence => "CYCLING_PEDALING_CADENCE",
        MetricType::Vo2Max => "VO2_MAX",
        MetricType::WheelchairPushes => "WHEELCHAIR_PUSHES",
        MetricType::Workout => "EXERCISE",
        MetricType::HeartRate => "HEART_RATE",
        MetricType::RestingHeartRate => "RESTING_HEART_RATE",
        MetricType::HeartRateVariability => "HEART_RATE_VARIABILITY",
        MetricType::BloodPressure => "BLOOD_PRESSURE",
        MetricType::RespiratoryRate => "RESPIRATORY_RATE",
        MetricType::BodyTemperature => "BODY_TEMPERATURE",
        MetricType::BasalBodyTemperature => "BASAL_BODY_TEMPERATURE",
        MetricType::OxygenSaturation => "OXYGEN_SATURATION",
        MetricType::BloodGlucose => "BLOOD_GLUCOSE",
        MetricType::Weight => "WEIGHT",
        MetricType::Height => "HEIGHT",
        MetricType::BodyFat => "BODY_FAT",
        MetricType::LeanBodyMass => "LEAN_BODY_MASS",
        MetricType::BoneMass => "BONE_MASS",
        MetricType::WaistCircumference => "WAIST_CIRCUMFERENCE",
        MetricType::Nutrition => "NUTRITION",
        MetricType::Hydration => "HYDRATION",
        MetricType::SleepSession => "SLEEP",
        MetricType::MenstruationFlow | MetricType::MenstruationPeriod => "MENSTRUATION",
        MetricType::OvulationTest => "OVULATION_TEST",
        MetricType::CervicalMucus => "CERVICAL_MUCUS",
        MetricType::SexualActivity => "SEXUAL_ACTIVITY",
        MetricType::IntermenstrualBleeding => "INTERMENSTRUAL_BLEEDING",
        MetricType::ClinicalAllergies => "MEDICAL_DATA_ALLERGIES_INTOLERANCES",
        MetricType::ClinicalConditions => "MEDICAL_DATA_CONDITIONS",
        MetricType::ClinicalImmunizations => "MEDICAL_DATA_VACCINES",
        MetricType::ClinicalLabResults => "MEDICAL_DATA_LABORATORY_RESULTS",
        MetricType::ClinicalMedications => "MEDICAL_DATA_MEDICATIONS",
        MetricType::ClinicalProcedures => "MEDICAL_DATA_PROCEDURES",
        MetricType::ClinicalVitalSigns => "MEDICAL_DATA_VITAL_SIGNS",
        MetricType::ExerciseTime
        | MetricType::WalkingHeartRateAverage
        | MetricType::RunningStrideLength
        | MetricType::RunningVerticalOscillation
        | MetricType::RunningGroundContactTime
        | MetricType::RunningPower
        | MetricType::RunningSpeed
        | MetricType::WalkingSpeed
        | MetricType::WalkingStepLength
        | MetricType::WalkingAsymmetry
        | MetricType::WalkingDoubleSupport
        | MetricType::WalkingSteadiness
        | MetricType::StairAscentSpeed
        | MetricType::StairDescentSpeed
        | MetricType::SixMinuteWalkDistance
        | MetricType::EnvironmentalAudioExposure
        | MetricType::HeadphoneAudioExposure
        | MetricType::UvExposure
        | MetricType::TimeInDaylight
        | MetricType::BodyMassIndex
        | MetricType::Caffeine => return None,
    };
    Some(suffix)
}

/// Object type identifier per metric; `None` for metrics HealthKit does not
/// model at all.
const fn health_kit_identifier(metric: MetricType) -> Option<&'static str> {
    let identifier = match metric {
        MetricType::Steps => "HKQuantityTypeIdentifierStepCount",
        MetricType::Distance => "HKQuantityTypeIdentifierDistanceWalkingRunning",
        MetricType::ActiveCalories => "HKQuantityTypeIdentifierActiveEnergyBurned",
        MetricType::TotalCalories => "HKQuantityTypeIdentifierTotalEnergyBurned",
        MetricType::BasalCalories => "HKQuantityTypeIdentifierBasalEnergyBurned",
        MetricType::FloorsClimbed => "HKQuantityTypeIdentifierFlightsClimbed",
        MetricType::Speed => "HKQuantityTypeIdentifierSpeed",
        MetricType::Power => "HKQuantityTypeIdentifierCyclingPower",
        MetricType::CyclingCadence => "HKQuantityTypeIdentifierCyclingCadence",
        MetricType::Vo2Max => "HKQuantityTypeIdentifierVO2Max",
        MetricType::WheelchairPushes => "HKQuantityTypeIdentifierPushCount",
        MetricType::ExerciseTime => "HKQuantityTypeIdentifierAppleExerciseTime",
        MetricType::Workout => "HKWorkoutTypeIdentifier",
        MetricType::RunningStrideLength => "HKQuantityTypeIdentifierRunningStrideLength",
        MetricType::RunningVerticalOscillation => {
            "HKQuantityTypeIdentifierRunningVerticalOscillation"
        }
        MetricType::RunningGroundContactTime => {
            "HKQuantityTypeIdentifierRunningGroundContactTime"
        }
        MetricType::RunningPower => "HKQuantityTypeIdentifierRunningPower",
        MetricType::RunningSpeed => "HKQuantityTypeIdentifierRunningSpeed",
        MetricType::HeartRate => "HKQuantityTypeIdentifierHeartRate",
        MetricType::RestingHeartRate => "HKQuantityTypeIdentifierRestingHeartRate",
        MetricType::WalkingHeartRateAverage => "HKQuantityTypeIdentifierWalkingHeartRateAverage",
        MetricType::HeartRateVariability => "HKQuantityTypeIdentifierHeartRateVariabilitySDNN",
        MetricType::BloodPressure => "HKCorrelationTypeIdentifierBloodPressure",
        MetricType::RespiratoryRate => "HKQuantityTypeIdentifierRespiratoryRate",
        MetricType::BodyTemperature => "HKQuantityTypeIdentifierBodyTemperature",
        MetricType::BasalBodyTemperature => "HKQuantityTypeIdentifierBasalBodyTemperature",
        MetricType::OxygenSaturation => "HKQuantityTypeIdentifierOxygenSaturation",
        MetricType::BloodGlucose => "HKQuantityTypeIdentifierBloodGlucose",
        MetricType::Weight => "HKQuantityTypeIdentifierBodyMass",
        MetricType::Height => "HKQuantityTypeIdentifierHeight",
        MetricType::BodyFat => "HKQuantityTypeIdentifierBodyFatPercentage",
        MetricType::LeanBodyMass => "HKQuantityTypeIdentifierLeanBodyMass",
        MetricType::BodyMassIndex => "HKQuantityTypeIdentifierBodyMassIndex",
        MetricType::WaistCircumference => "HKQuantityTypeIdentifierWaistCircumference",
        MetricType::Nutrition => "HKQuantityTypeIdentifierDietaryEnergyConsumed",
        MetricType::Hydration => "HKQuantityTypeIdentifierDietaryWater",
        MetricType::Caffeine => "HKQuantityTypeIdentifierDietaryCaffeine",
        MetricType::SleepSession => "HKCategoryTypeIdentifierSleepAnalysis",
        MetricType::WalkingSpeed => "HKQuantityTypeIdentifierWalkingSpeed",
        MetricType::WalkingStepLength => "HKQuantityTypeIdentifierWalkingStepLength",
        MetricType::WalkingAsymmetry => "HKQuantityTypeIdentifierWalkingAsymmetryPercentage",
        MetricType::WalkingDoubleSupport => {
            "HKQuantityTypeIdentifierWalkingDoubleSupportPercentage"
        }
        MetricType::WalkingSteadiness => "HKQuantityTypeIdentifierAppleWalkingSteadiness",
        MetricType::StairAscentSpeed => "HKQuantityTypeIdentifierStairAscentSpeed",
        MetricType::StairDescentSpeed => "HKQuantityTypeIdentifierStairDescentSpeed",
        MetricType::SixMinuteWalkDistance => "HKQuantityTypeIdentifierSixMinuteWalkTestDistance",
        MetricType::EnvironmentalAudioExposure => {
            "HKQuantityTypeIdentifierEnvironmentalAudioExposure"
        }
        MetricType::HeadphoneAudioExposure => "HKQuantityTypeIdentifierHeadphoneAudioExposure",
        MetricType::UvExposure => "HKQuantityTypeIdentifierUVExposure",
        MetricType::TimeInDaylight => "HKQuantityTypeIdentifierTimeInDaylight",
        MetricType::ClinicalAllergies => "HKClinicalTypeIdentifierAllergyRecord",
        MetricType::ClinicalConditions => "HKClinicalTypeIdentifierConditionRecord",
        MetricType::ClinicalImmunizations => "HKClinicalTypeIdentifierImmunizationRecord",
        MetricType::ClinicalLabResults => "HKClinicalTypeIdentifierLabResultRecord",
        MetricType::ClinicalMedications => "HKClinicalTypeIdentifierMedicationRecord",
        MetricType::ClinicalProcedures => "HKClinicalTypeIdentifierProcedureRecord",
        MetricType::ClinicalVitalSigns => "HKClinicalTypeIdentifierVitalSignRecord",
        MetricType::MenstruationFlow | MetricType::MenstruationPeriod => {
            "HKCategoryTypeIdentifierMenstrualFlow"
        }
        MetricType::OvulationTest => "HKCategoryTypeIdentifierOvulationTestResult",
        MetricType::CervicalMucus => "HKCategoryTypeIdentifierCervicalMucusQuality",
        MetricType::SexualActivity => "HKCategoryTypeIdentifierSexualActivity",
        MetricType::IntermenstrualBleeding => "HKCategoryTypeIdentifierIntermenstrualBleeding",
        MetricType::BoneMass => return None,
    };
    Some(identifier)
}
