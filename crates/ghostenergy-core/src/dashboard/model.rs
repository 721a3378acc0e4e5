//! Dashboard domain models.
//!
//! Field names are English; serde renames map them onto the Spanish wire
//! format of the analytics API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Aggregate indicators for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub total_kwh: f64,
    #[serde(rename = "anomalías_criticas", alias = "critical_anomalies", default)]
    pub critical_anomalies: u64,
    #[serde(rename = "eficiencia")]
    pub efficiency: f64,
    #[serde(rename = "meta_eficiencia")]
    pub efficiency_target: f64,
}

/// One day of total consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    pub timestamp: String,
    #[serde(rename = "energia_total_kwh")]
    pub total_kwh: f64,
}

/// Consumption of one sector at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConsumption {
    pub timestamp: String,
    pub sector: String,
    #[serde(rename = "kWh")]
    pub kwh: f64,
}

/// A detected consumption anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub timestamp: String,
    #[serde(rename = "energia_total_kwh", default)]
    pub total_kwh: f64,
    #[serde(rename = "ocupacion_pct", default)]
    pub occupancy_pct: f64,
    /// 1 when the anomaly is flagged critical
    #[serde(rename = "anomaly_critical", default)]
    pub critical: i64,
    #[serde(rename = "sede", default)]
    pub site: String,
}

impl Anomaly {
    pub fn is_critical(&self) -> bool {
        self.critical != 0
    }
}

/// A prioritized saving recommendation. Every column is optional on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_occupancy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_kwh: Option<f64>,
    #[serde(rename = "sede", default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

/// Response wrapper `{message, data}` used by some endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Unwraps an optional envelope, defaulting when either the envelope or
/// its `data` field is missing.
pub fn unwrap_envelope<T: Default>(envelope: Option<Envelope<T>>) -> T {
    envelope.and_then(|e| e.data).unwrap_or_default()
}

/// Model quality metrics. The shape is owned by the ML service, so it is
/// kept as an open map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MlMetrics {
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

/// One forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

/// Answer of the API root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl HealthStatus {
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case("online")
    }
}

/// What to do with the results of a site load that was overtaken by a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleLoadPolicy {
    /// Apply every load as it settles; the last one to settle wins.
    #[default]
    LastWriteWins,
    /// Only the most recently started load may touch the snapshot.
    DiscardStale,
}

/// The five resources that make up one site's dashboard, already unwrapped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteData {
    pub kpis: Option<Kpi>,
    pub daily_consumption: Vec<DailyConsumption>,
    pub sector_consumption: Vec<SectorConsumption>,
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<Recommendation>,
}

/// The complete dashboard state for the currently displayed site.
///
/// Data fields always belong to `site_id` as a group: they are replaced
/// together by [`apply`](SiteSnapshot::apply) and never individually.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteSnapshot {
    pub site_id: String,
    pub kpis: Option<Kpi>,
    pub daily_consumption: Vec<DailyConsumption>,
    pub sector_consumption: Vec<SectorConsumption>,
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<Recommendation>,
    pub is_loading: bool,
    pub error_message: String,
}

impl SiteSnapshot {
    /// Marks a load as started. Data fields are left untouched.
    pub fn begin_load(&mut self) {
        self.is_loading = true;
        self.error_message.clear();
    }

    /// Replaces every data field at once and clears loading/error.
    pub fn apply(&mut self, site_id: &str, data: SiteData) {
        self.site_id = site_id.to_string();
        self.kpis = data.kpis;
        self.daily_consumption = data.daily_consumption;
        self.sector_consumption = data.sector_consumption;
        self.anomalies = data.anomalies;
        self.recommendations = data.recommendations;
        self.is_loading = false;
        self.error_message.clear();
    }

    /// Records a failed load. Data fields are left untouched.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.is_loading = false;
        self.error_message = message.into();
    }

    /// The data fields as a group, for comparisons.
    pub fn data(&self) -> SiteData {
        SiteData {
            kpis: self.kpis.clone(),
            daily_consumption: self.daily_consumption.clone(),
            sector_consumption: self.sector_consumption.clone(),
            anomalies: self.anomalies.clone(),
            recommendations: self.recommendations.clone(),
        }
    }

    pub fn critical_anomaly_count(&self) -> usize {
        self.anomalies.iter().filter(|a| a.is_critical()).count()
    }
}
