//! Dashboard domain module.
//!
//! - `model`: per-site analytics resources and the [`SiteSnapshot`] view state
//! - `DashboardApi`: port to the analytics API

mod model;

pub use model::{
    Anomaly, DailyConsumption, Envelope, ForecastPoint, HealthStatus, Kpi, MlMetrics,
    Recommendation, SectorConsumption, SiteData, SiteSnapshot, StaleLoadPolicy, unwrap_envelope,
};

use crate::error::Result;
use async_trait::async_trait;

/// Read-only analytics endpoints, parameterized by site identifier.
///
/// Enveloped endpoints return `Ok(None)` when the body carries no envelope
/// at all (e.g. JSON `null`); callers unwrap with [`unwrap_envelope`].
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_sites(&self) -> Result<Vec<String>>;

    async fn kpis(&self, site_id: &str) -> Result<Kpi>;

    async fn daily_consumption(&self, site_id: &str) -> Result<Vec<DailyConsumption>>;

    async fn sector_consumption(&self, site_id: &str) -> Result<Vec<SectorConsumption>>;

    async fn anomalies(&self, site_id: &str) -> Result<Option<Envelope<Vec<Anomaly>>>>;

    async fn recommendations(&self, site_id: &str)
    -> Result<Option<Envelope<Vec<Recommendation>>>>;

    async fn ml_metrics(&self, site_id: &str) -> Result<MlMetrics>;

    async fn forecast(&self, site_id: &str) -> Result<Option<Envelope<Vec<ForecastPoint>>>>;

    async fn health(&self) -> Result<HealthStatus>;
}
