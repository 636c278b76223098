//! Mission Store Library
//!
//! Immutable operational data store for the air-medical analytics engine:
//! historical transport missions, base and demand-point reference data, and
//! demographic regressor series. Loaded once at startup, never mutated.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod bases;
pub mod demand;
pub mod demographics;
pub mod history;

pub use bases::{Base, BaseKind, BaseRegistry};
pub use demand::{load_demand_points, DemandPoint};
pub use demographics::{DemographicCatalog, DemographicSeries};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Base not found: {0}")]
    BaseNotFound(String),
    #[error("Demand point not found: {0}")]
    DemandPointNotFound(String),
    #[error("Demographic series not found: {0}")]
    SeriesNotFound(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Asset class of a base or responding unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Air,
    Ground,
}

/// Recorded reason a mission was not flown by the primary asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayReason {
    Weather,
    AircraftUnavailable,
    CrewTimeout,
    MaintenanceHold,
}

/// One historical transport event. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionRecord {
    pub timestamp: DateTime<Utc>,
    /// Demand-point (city) the request originated from.
    pub origin: String,
    pub asset_type: AssetType,
    pub dispatch_time: DateTime<Utc>,
    pub enroute_time: DateTime<Utc>,
    /// Response time in minutes (enroute - dispatch), non-negative.
    pub response_minutes: f64,
    /// Whether the appropriate asset responded without delay.
    pub transport_by_primary: bool,
    /// Base that should have responded given geography.
    pub appropriate_base: String,
    /// Base that actually responded.
    pub responding_base: String,
    pub delay_reason: Option<DelayReason>,
}

/// Owns the full historical mission collection for the process lifetime.
///
/// The store is read-only after construction; every consumer shares it via
/// `Arc` with no locking.
pub struct MissionStore {
    missions: Vec<MissionRecord>,
}

impl MissionStore {
    pub fn new(missions: Vec<MissionRecord>) -> Self {
        Self { missions }
    }

    /// Build the store from the operator's reference network, synthesizing
    /// the 36-month mission log from per-city annual counts.
    pub fn with_reference_history(registry: &BaseRegistry, demand: &[DemandPoint]) -> Self {
        let missions = history::synthesize_history(registry, demand);
        tracing::info!(
            "Loaded {} historical missions across {} demand points",
            missions.len(),
            demand.len()
        );
        Self { missions }
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissionRecord> {
        self.missions.iter()
    }

    /// Missions with a timestamp in `[end - months, end)`.
    pub fn missions_in_window(&self, end: NaiveDate, months: u32) -> usize {
        let start = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        self.missions
            .iter()
            .filter(|m| {
                let d = m.timestamp.date_naive();
                d >= start && d < end
            })
            .count()
    }

    /// Missions in the most recent complete 12-month window before
    /// `reference_date`.
    pub fn annual_missions(&self, reference_date: NaiveDate) -> usize {
        self.missions_in_window(reference_date, 12)
    }

    /// Monthly mission counts keyed on the first of each month, ascending.
    /// This is the series the demand forecaster consumes; the displayed data
    /// never forecasts below month resolution.
    pub fn monthly_counts(&self) -> Vec<(NaiveDate, f64)> {
        let mut by_month: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for m in &self.missions {
            let d = m.timestamp.date_naive();
            let key = NaiveDate::from_ymd_opt(d.year(), d.month(), 1)
                .unwrap_or(d);
            *by_month.entry(key).or_insert(0.0) += 1.0;
        }
        by_month.into_iter().collect()
    }

    /// Fraction of missions flown by the appropriate asset without delay.
    pub fn primary_transport_rate(&self) -> f64 {
        if self.missions.is_empty() {
            return 0.0;
        }
        let primary = self.missions.iter().filter(|m| m.transport_by_primary).count();
        primary as f64 / self.missions.len() as f64
    }

    /// Mission counts per recorded delay reason.
    pub fn delay_breakdown(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.missions {
            if let Some(reason) = m.delay_reason {
                let key = match reason {
                    DelayReason::Weather => "weather",
                    DelayReason::AircraftUnavailable => "aircraft_unavailable",
                    DelayReason::CrewTimeout => "crew_timeout",
                    DelayReason::MaintenanceHold => "maintenance_hold",
                };
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Average recorded response time in minutes over all missions.
    pub fn avg_response_minutes(&self) -> f64 {
        if self.missions.is_empty() {
            return 0.0;
        }
        let total: f64 = self.missions.iter().map(|m| m.response_minutes).sum();
        total / self.missions.len() as f64
    }
}
