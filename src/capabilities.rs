// ABOUTME: Per-platform capability registry with version-gated support tables
// ABOUTME: Answers which metrics can be read or written on a given platform release
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Capability Registry
//!
//! The two native stores support overlapping but different slices of the
//! canonical metric set, and several metrics only appear from a specific OS
//! release. The registry captures all of that in one table, built once at
//! connector initialization, so callers can probe support without touching
//! the platform and reads can be rejected with `MetricUnavailable` before any
//! native call is attempted.
//!
//! The table is data, not behavior: each entry is a [`CapabilityDescriptor`]
//! with read/write flags and an optional human-readable note explaining a
//! platform quirk.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::models::{MetricCategory, MetricType};

/// The native health stores a connector can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Apple HealthKit
    HealthKit,
    /// Android Health Connect
    HealthConnect,
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::HealthKit => f.write_str("HealthKit"),
            Self::HealthConnect => f.write_str("Health Connect"),
        }
    }
}

/// An OS release, ordered lexicographically by (major, minor).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlatformVersion {
    /// Major release number
    pub major: u32,
    /// Minor release number
    pub minor: u32,
}

impl PlatformVersion {
    /// Build a version literal.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Display for PlatformVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// HealthKit release that introduced walking steadiness.
pub const HEALTHKIT_WALKING_STEADINESS_MIN: PlatformVersion = PlatformVersion::new(15, 0);
/// HealthKit release that introduced the advanced running metrics.
pub const HEALTHKIT_ADVANCED_RUNNING_MIN: PlatformVersion = PlatformVersion::new(16, 0);
/// HealthKit release that introduced time-in-daylight tracking.
pub const HEALTHKIT_TIME_IN_DAYLIGHT_MIN: PlatformVersion = PlatformVersion::new(17, 0);
/// HealthKit release that introduced clinical health records.
pub const HEALTHKIT_CLINICAL_MIN: PlatformVersion = PlatformVersion::new(12, 0);
/// Health Connect (Android API level) release that introduced medical records.
pub const HEALTH_CONNECT_CLINICAL_MIN: PlatformVersion = PlatformVersion::new(36, 0);

/// Support flags for one metric on one platform release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// The metric this entry describes
    pub metric: MetricType,
    /// Whether records of this metric can be read
    pub can_read: bool,
    /// Whether records of this metric can be written
    pub can_write: bool,
    /// Platform quirk worth surfacing to callers, when there is one
    pub platform_note: Option<&'static str>,
}

impl CapabilityDescriptor {
    /// Fully supported metric.
    #[must_use]
    pub const fn read_write(metric: MetricType) -> Self {
        Self {
            metric,
            can_read: true,
            can_write: true,
            platform_note: None,
        }
    }

    /// Metric that can be read but never written.
    #[must_use]
    pub const fn read_only(metric: MetricType, note: &'static str) -> Self {
        Self {
            metric,
            can_read: true,
            can_write: false,
            platform_note: Some(note),
        }
    }

    /// Metric absent from the platform.
    #[must_use]
    pub const fn unsupported(metric: MetricType, note: &'static str) -> Self {
        Self {
            metric,
            can_read: false,
            can_write: false,
            platform_note: Some(note),
        }
    }

    /// Whether the metric is supported in at least one direction.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.can_read || self.can_write
    }
}

/// Build-once capability table for one (platform, version) pair.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    platform: Platform,
    version: PlatformVersion,
    table: HashMap<MetricType, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    /// Build the table for every canonical metric on the given release.
    #[must_use]
    pub fn new(platform: Platform, version: PlatformVersion) -> Self {
        let table = MetricType::ALL
            .iter()
            .map(|&metric| {
                let entry = match platform {
                    Platform::HealthKit => health_kit_entry(metric, version),
                    Platform::HealthConnect => health_connect_entry(metric, version),
                };
                (metric, entry)
            })
            .collect();
        Self {
            platform,
            version,
            table,
        }
    }

    /// The platform this table was built for.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// The platform release this table was built for.
    #[must_use]
    pub const fn version(&self) -> PlatformVersion {
        self.version
    }

    /// Support flags for one metric.
    ///
    /// Metrics absent from the override table default to fully supported, so
    /// adding a canonical metric never silently bricks a platform.
    #[must_use]
    pub fn capabilities_of(&self, metric: MetricType) -> CapabilityDescriptor {
        self.table
            .get(&metric)
            .copied()
            .unwrap_or_else(|| CapabilityDescriptor::read_write(metric))
    }

    /// Whether `metric` can be read on this platform release.
    #[must_use]
    pub fn readable(&self, metric: MetricType) -> bool {
        self.capabilities_of(metric).can_read
    }

    /// Whether `metric` can be written on this platform release.
    #[must_use]
    pub fn writable(&self, metric: MetricType) -> bool {
        self.capabilities_of(metric).can_write
    }

    /// Every descriptor, ordered by metric for stable output.
    #[must_use]
    pub fn all(&self) -> Vec<CapabilityDescriptor> {
        let mut entries: Vec<_> = self.table.values().copied().collect();
        entries.sort_by_key(|entry| entry.metric);
        entries
    }
}

fn health_kit_entry(metric: MetricType, version: PlatformVersion) -> CapabilityDescriptor {
    if metric.category() == MetricCategory::Clinical {
        return if version >= HEALTHKIT_CLINICAL_MIN {
            CapabilityDescriptor::read_only(metric, "clinical records are read-only")
        } else {
            CapabilityDescriptor::unsupported(metric, "clinical records require version 12.0")
        };
    }
    match metric {
        MetricType::BoneMass => {
            CapabilityDescriptor::unsupported(metric, "no native sample type")
        }
        MetricType::RunningStrideLength
        | MetricType::RunningVerticalOscillation
        | MetricType::RunningGroundContactTime
        | MetricType::RunningPower
        | MetricType::RunningSpeed => {
            if version >= HEALTHKIT_ADVANCED_RUNNING_MIN {
                CapabilityDescriptor::read_write(metric)
            } else {
                CapabilityDescriptor::unsupported(
                    metric,
                    "advanced running metrics require version 16.0",
                )
            }
        }
        MetricType::WalkingSteadiness => {
            if version >= HEALTHKIT_WALKING_STEADINESS_MIN {
                CapabilityDescriptor::read_only(metric, "derived by the platform")
            } else {
                CapabilityDescriptor::unsupported(
                    metric,
                    "walking steadiness requires version 15.0",
                )
            }
        }
        MetricType::TimeInDaylight => {
            if version >= HEALTHKIT_TIME_IN_DAYLIGHT_MIN {
                CapabilityDescriptor::read_only(metric, "derived by the platform")
            } else {
                CapabilityDescriptor::unsupported(metric, "time in daylight requires version 17.0")
            }
        }
        MetricType::ExerciseTime | MetricType::WalkingHeartRateAverage => {
            CapabilityDescriptor::read_only(metric, "derived by the platform")
        }
        other => CapabilityDescriptor::read_write(other),
    }
}

fn health_connect_entry(metric: MetricType, version: PlatformVersion) -> CapabilityDescriptor {
    if metric.category() == MetricCategory::Clinical {
        return if version >= HEALTH_CONNECT_CLINICAL_MIN {
            CapabilityDescriptor::read_only(metric, "clinical records are read-only")
        } else {
            CapabilityDescriptor::unsupported(
                metric,
                "medical records require version 36.0",
            )
        };
    }
    match metric {
        MetricType::BodyMassIndex => CapabilityDescriptor::unsupported(
            metric,
            "computed from weight and height, not stored",
        ),
        MetricType::Caffeine => {
            CapabilityDescriptor::unsupported(metric, "tracked as part of nutrition records")
        }
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
        | MetricType::TimeInDaylight => {
            CapabilityDescriptor::unsupported(metric, "no native record type")
        }
        other => CapabilityDescriptor::read_write(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinical_reads_are_version_gated_on_health_connect() {
        let below = CapabilityRegistry::new(Platform::HealthConnect, PlatformVersion::new(35, 0));
        let entry = below.capabilities_of(MetricType::ClinicalLabResults);
        assert!(!entry.can_read);
        assert!(!entry.can_write);

        let at = CapabilityRegistry::new(Platform::HealthConnect, PlatformVersion::new(36, 0));
        let entry = at.capabilities_of(MetricType::ClinicalLabResults);
        assert!(entry.can_read);
        assert!(!entry.can_write, "clinical records must stay read-only");
    }

    #[test]
    fn test_clinical_writes_are_never_offered() {
        let hk = CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(17, 0));
        let hc = CapabilityRegistry::new(Platform::HealthConnect, PlatformVersion::new(36, 0));
        for metric in MetricType::ALL {
            if metric.is_clinical() {
                assert!(!hk.writable(metric), "{metric} writable on HealthKit");
                assert!(!hc.writable(metric), "{metric} writable on Health Connect");
            }
        }
    }

    #[test]
    fn test_advanced_running_metrics_appear_at_sixteen() {
        let fifteen = CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(15, 4));
        assert!(!fifteen.readable(MetricType::RunningPower));

        let sixteen = CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(16, 0));
        assert!(sixteen.readable(MetricType::RunningPower));
        assert!(sixteen.writable(MetricType::RunningPower));
    }

    #[test]
    fn test_platform_gaps_are_asymmetric() {
        let hk = CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(17, 0));
        let hc = CapabilityRegistry::new(Platform::HealthConnect, PlatformVersion::new(34, 0));

        // Bone mass exists on Health Connect only.
        assert!(!hk.capabilities_of(MetricType::BoneMass).is_supported());
        assert!(hc.readable(MetricType::BoneMass));

        // BMI and the mobility suite exist on HealthKit only.
        assert!(hk.readable(MetricType::BodyMassIndex));
        assert!(!hc.capabilities_of(MetricType::BodyMassIndex).is_supported());
        assert!(hk.readable(MetricType::WalkingAsymmetry));
        assert!(!hc.readable(MetricType::WalkingAsymmetry));
    }

    #[test]
    fn test_common_metrics_default_to_full_support() {
        for registry in [
            CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(16, 0)),
            CapabilityRegistry::new(Platform::HealthConnect, PlatformVersion::new(34, 0)),
        ] {
            for metric in [
                MetricType::Steps,
                MetricType::HeartRate,
                MetricType::Weight,
                MetricType::SleepSession,
                MetricType::Hydration,
            ] {
                let entry = registry.capabilities_of(metric);
                assert!(entry.can_read, "{metric} unreadable on {}", registry.platform());
                assert!(entry.can_write, "{metric} unwritable on {}", registry.platform());
            }
        }
    }

    #[test]
    fn test_table_lists_every_metric_exactly_once() {
        let registry = CapabilityRegistry::new(Platform::HealthKit, PlatformVersion::new(17, 0));
        let all = registry.all();
        assert_eq!(all.len(), MetricType::ALL.len());
        assert!(all.windows(2).all(|w| w[0].metric < w[1].metric));
    }

    #[test]
    fn test_versions_order_lexicographically() {
        assert!(PlatformVersion::new(16, 0) > PlatformVersion::new(15, 9));
        assert!(PlatformVersion::new(16, 1) > PlatformVersion::new(16, 0));
        assert_eq!(PlatformVersion::new(17, 2).to_string(), "17.2");
    }
}
