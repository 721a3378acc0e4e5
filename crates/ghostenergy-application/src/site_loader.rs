//! Per-site dashboard loading.

use ghostenergy_core::dashboard::{
    DashboardApi, ForecastPoint, HealthStatus, MlMetrics, SiteData, SiteSnapshot, StaleLoadPolicy,
    unwrap_envelope,
};
use ghostenergy_core::error::{GhostError, Result};
use ghostenergy_core::state::StateCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// How a [`SiteDataLoader::load_site`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// All five resources arrived and replaced the snapshot data
    Applied,
    /// At least one fetch failed; the snapshot data is unchanged
    Failed(String),
    /// A newer load started meanwhile and the results were dropped
    Discarded,
}

/// Loads the dashboard data of the selected site.
///
/// Every load fans out five requests and waits for all of them. The
/// snapshot's data fields are then replaced together, or not at all when any
/// request failed.
pub struct SiteDataLoader {
    api: Arc<dyn DashboardApi>,
    policy: StaleLoadPolicy,
    sites: StateCell<Vec<String>>,
    selected: StateCell<Option<String>>,
    snapshot: StateCell<SiteSnapshot>,
    generation: AtomicU64,
}

impl SiteDataLoader {
    pub fn new(api: Arc<dyn DashboardApi>, policy: StaleLoadPolicy) -> Self {
        Self {
            api,
            policy,
            sites: StateCell::new(Vec::new()),
            selected: StateCell::new(None),
            snapshot: StateCell::new(SiteSnapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Fetches and publishes the available site identifiers.
    ///
    /// A failure is published on the snapshot and returned.
    pub async fn list_sites(&self) -> Result<Vec<String>> {
        match self.api.list_sites().await {
            Ok(sites) => {
                tracing::debug!("Loaded {} sites", sites.len());
                self.sites.set(sites.clone());
                Ok(sites)
            }
            Err(e) => {
                let message = format!("Error loading sedes: {}", e.user_message());
                tracing::error!("{}", message);
                self.snapshot.update(|snapshot| snapshot.fail(message));
                Err(e)
            }
        }
    }

    /// Start-up sequence: list sites, select the first one and load it.
    pub async fn load_initial(&self) -> Result<Option<LoadOutcome>> {
        let sites = self.list_sites().await?;
        match sites.first() {
            Some(first) => Ok(Some(self.select_site(first).await)),
            None => {
                tracing::warn!("No sites available");
                self.selected.set(None);
                Ok(None)
            }
        }
    }

    /// Makes `site_id` the selection and loads it.
    pub async fn select_site(&self, site_id: &str) -> LoadOutcome {
        tracing::info!("Selected site '{}'", site_id);
        self.selected.set(Some(site_id.to_string()));
        self.load_site(site_id).await
    }

    /// Loads the five dashboard resources of `site_id`.
    ///
    /// `site_id` is expected to be one of the identifiers returned by
    /// [`list_sites`](Self::list_sites). While the load runs the snapshot
    /// keeps showing the previous data with `is_loading` set.
    pub async fn load_site(&self, site_id: &str) -> LoadOutcome {
        if site_id.trim().is_empty() {
            let message = format!(
                "Error loading data: {}",
                GhostError::validation("site identifier is empty").user_message()
            );
            self.snapshot.update(|snapshot| snapshot.fail(message.clone()));
            return LoadOutcome::Failed(message);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.update(SiteSnapshot::begin_load);
        tracing::debug!("Loading site '{}' (generation {})", site_id, generation);

        let result = self.fetch_all(site_id).await;

        if self.policy == StaleLoadPolicy::DiscardStale
            && self.generation.load(Ordering::SeqCst) != generation
        {
            tracing::debug!("Dropping stale results for '{}' (generation {})", site_id, generation);
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(data) => {
                self.snapshot.update(|snapshot| snapshot.apply(site_id, data));
                tracing::debug!("Applied data for site '{}'", site_id);
                LoadOutcome::Applied
            }
            Err(e) => {
                let message = format!("Error loading data: {}", e.user_message());
                tracing::error!("Loading site '{}' failed: {}", site_id, e);
                self.snapshot.update(|snapshot| snapshot.fail(message.clone()));
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Awaits all five fetches, then reports the first failure in field order.
    async fn fetch_all(&self, site_id: &str) -> Result<SiteData> {
        let (kpis, daily, sector, anomalies, recommendations) = tokio::join!(
            self.api.kpis(site_id),
            self.api.daily_consumption(site_id),
            self.api.sector_consumption(site_id),
            self.api.anomalies(site_id),
            self.api.recommendations(site_id),
        );

        Ok(SiteData {
            kpis: Some(kpis?),
            daily_consumption: daily?,
            sector_consumption: sector?,
            anomalies: unwrap_envelope(anomalies?),
            recommendations: unwrap_envelope(recommendations?),
        })
    }

    pub async fn ml_metrics(&self, site_id: &str) -> Result<MlMetrics> {
        self.api.ml_metrics(site_id).await
    }

    /// Forecast samples for `site_id`, empty when the service sends none.
    pub async fn forecast(&self, site_id: &str) -> Result<Vec<ForecastPoint>> {
        Ok(unwrap_envelope(self.api.forecast(site_id).await?))
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.api.health().await
    }

    /// Drops the site list, the selection and the snapshot.
    ///
    /// Also starts a new generation, so under
    /// [`StaleLoadPolicy::DiscardStale`] loads still in flight are dropped.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.sites.set(Vec::new());
        self.selected.set(None);
        self.snapshot.set(SiteSnapshot::default());
        tracing::debug!("Cleared site data");
    }

    pub fn policy(&self) -> StaleLoadPolicy {
        self.policy
    }

    pub fn sites(&self) -> Vec<String> {
        self.sites.get()
    }

    pub fn selected_site(&self) -> Option<String> {
        self.selected.get()
    }

    pub fn snapshot(&self) -> SiteSnapshot {
        self.snapshot.get()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<SiteSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_sites(&self) -> watch::Receiver<Vec<String>> {
        self.sites.subscribe()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<String>> {
        self.selected.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghostenergy_core::dashboard::{
        Anomaly, DailyConsumption, Envelope, Kpi, Recommendation, SectorConsumption,
    };
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Per-site canned data; endpoints listed in `failing` answer with an error.
    #[derive(Default)]
    struct ScriptedApi {
        sites: Vec<String>,
        data: HashMap<String, SiteData>,
        failing: HashSet<&'static str>,
        empty_envelopes: bool,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
    }

    impl ScriptedApi {
        fn site(&self, site_id: &str) -> SiteData {
            self.data.get(site_id).cloned().unwrap_or_default()
        }

        fn check(&self, endpoint: &'static str) -> Result<()> {
            if self.failing.contains(endpoint) {
                Err(GhostError::api(500, Some(format!("{} unavailable", endpoint))))
            } else {
                Ok(())
            }
        }

        fn gate(&self, site_id: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(site_id.to_string(), notify.clone());
            notify
        }

        async fn wait_gate(&self, site_id: &str) {
            let gate = self.gates.lock().unwrap().get(site_id).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl DashboardApi for ScriptedApi {
        async fn list_sites(&self) -> Result<Vec<String>> {
            self.check("sedes")?;
            Ok(self.sites.clone())
        }

        async fn kpis(&self, site_id: &str) -> Result<Kpi> {
            self.wait_gate(site_id).await;
            self.check("kpis")?;
            self.site(site_id)
                .kpis
                .ok_or_else(|| GhostError::not_found("kpis", site_id))
        }

        async fn daily_consumption(&self, site_id: &str) -> Result<Vec<DailyConsumption>> {
            self.check("daily")?;
            Ok(self.site(site_id).daily_consumption)
        }

        async fn sector_consumption(&self, site_id: &str) -> Result<Vec<SectorConsumption>> {
            self.check("sector")?;
            Ok(self.site(site_id).sector_consumption)
        }

        async fn anomalies(&self, site_id: &str) -> Result<Option<Envelope<Vec<Anomaly>>>> {
            self.check("anomalies")?;
            if self.empty_envelopes {
                return Ok(None);
            }
            Ok(Some(Envelope::new("ok", self.site(site_id).anomalies)))
        }

        async fn recommendations(
            &self,
            site_id: &str,
        ) -> Result<Option<Envelope<Vec<Recommendation>>>> {
            self.check("recommendations")?;
            if self.empty_envelopes {
                return Ok(Some(Envelope {
                    message: "no data".into(),
                    data: None,
                }));
            }
            Ok(Some(Envelope::new("ok", self.site(site_id).recommendations)))
        }

        async fn ml_metrics(&self, _site_id: &str) -> Result<MlMetrics> {
            Ok(MlMetrics::default())
        }

        async fn forecast(&self, _site_id: &str) -> Result<Option<Envelope<Vec<ForecastPoint>>>> {
            Ok(None)
        }

        async fn health(&self) -> Result<HealthStatus> {
            Ok(HealthStatus {
                message: "up".into(),
                status: "online".into(),
            })
        }
    }

    fn fixture(total_kwh: f64, sector: &str) -> SiteData {
        SiteData {
            kpis: Some(Kpi {
                total_kwh,
                critical_anomalies: 1,
                efficiency: 88.0,
                efficiency_target: 90.0,
            }),
            daily_consumption: vec![DailyConsumption {
                timestamp: "2024-05-01".into(),
                total_kwh,
            }],
            sector_consumption: vec![SectorConsumption {
                timestamp: "2024-05-01T10:00:00".into(),
                sector: sector.into(),
                kwh: total_kwh / 2.0,
            }],
            anomalies: vec![Anomaly {
                timestamp: "2024-05-01T03:00:00".into(),
                total_kwh: 40.0,
                occupancy_pct: 0.0,
                critical: 1,
                site: sector.into(),
            }],
            recommendations: vec![Recommendation {
                category: Some(sector.into()),
                ai_recommendation: Some("Apagar HVAC".into()),
                ..Recommendation::default()
            }],
        }
    }

    fn api_with_sites() -> ScriptedApi {
        ScriptedApi {
            sites: vec!["HQ".into(), "Lab".into()],
            data: HashMap::from([
                ("HQ".to_string(), fixture(1520.0, "HVAC")),
                ("Lab".to_string(), fixture(310.0, "Servers")),
            ]),
            ..ScriptedApi::default()
        }
    }

    #[tokio::test]
    async fn test_successful_load_applies_all_five() {
        let loader = SiteDataLoader::new(Arc::new(api_with_sites()), StaleLoadPolicy::default());

        let outcome = loader.load_site("HQ").await;

        assert_eq!(outcome, LoadOutcome::Applied);
        let snapshot = loader.snapshot();
        assert_eq!(snapshot.site_id, "HQ");
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error_message, "");
        assert_eq!(snapshot.data(), fixture(1520.0, "HVAC"));
    }

    #[tokio::test]
    async fn test_any_failure_keeps_previous_data() {
        for endpoint in ["kpis", "daily", "sector", "anomalies", "recommendations"] {
            let mut api = api_with_sites();
            let loader_ok = SiteDataLoader::new(Arc::new(api_with_sites()), StaleLoadPolicy::default());
            loader_ok.load_site("HQ").await;
            let before = loader_ok.snapshot().data();

            api.failing.insert(endpoint);
            let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());
            loader.snapshot.set(loader_ok.snapshot());

            let outcome = loader.load_site("Lab").await;

            let snapshot = loader.snapshot();
            assert!(matches!(outcome, LoadOutcome::Failed(_)), "{endpoint}");
            assert_eq!(snapshot.data(), before, "{endpoint}");
            assert_eq!(snapshot.site_id, "HQ");
            assert!(!snapshot.is_loading);
            assert!(snapshot.error_message.starts_with("Error loading data: "));
            assert!(snapshot.error_message.ends_with("unavailable"));
        }
    }

    #[tokio::test]
    async fn test_first_failure_in_field_order_wins() {
        let mut api = api_with_sites();
        api.failing.insert("recommendations");
        api.failing.insert("daily");
        let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());

        let outcome = loader.load_site("HQ").await;

        assert_eq!(
            outcome,
            LoadOutcome::Failed("Error loading data: daily unavailable".into())
        );
    }

    #[tokio::test]
    async fn test_missing_envelopes_default_to_empty() {
        let api = ScriptedApi {
            empty_envelopes: true,
            ..api_with_sites()
        };
        let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());

        assert_eq!(loader.load_site("HQ").await, LoadOutcome::Applied);

        let snapshot = loader.snapshot();
        assert!(snapshot.anomalies.is_empty());
        assert!(snapshot.recommendations.is_empty());
        assert_eq!(snapshot.daily_consumption.len(), 1);
    }

    #[tokio::test]
    async fn test_load_initial_selects_first_site() {
        let loader = SiteDataLoader::new(Arc::new(api_with_sites()), StaleLoadPolicy::default());

        let outcome = loader.load_initial().await.unwrap();

        assert_eq!(outcome, Some(LoadOutcome::Applied));
        assert_eq!(loader.sites(), vec!["HQ", "Lab"]);
        assert_eq!(loader.selected_site().as_deref(), Some("HQ"));
        assert_eq!(loader.snapshot().site_id, "HQ");
    }

    #[tokio::test]
    async fn test_load_initial_with_no_sites() {
        let api = ScriptedApi::default();
        let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());

        assert_eq!(loader.load_initial().await.unwrap(), None);
        assert_eq!(loader.selected_site(), None);
    }

    #[tokio::test]
    async fn test_site_list_failure_is_published() {
        let mut api = api_with_sites();
        api.failing.insert("sedes");
        let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());

        assert!(loader.load_initial().await.is_err());
        assert_eq!(
            loader.snapshot().error_message,
            "Error loading sedes: sedes unavailable"
        );
        assert!(loader.sites().is_empty());
    }

    #[tokio::test]
    async fn test_empty_site_id_fails_without_fetching() {
        let mut api = api_with_sites();
        api.failing.insert("kpis");
        let loader = SiteDataLoader::new(Arc::new(api), StaleLoadPolicy::default());

        let outcome = loader.load_site("  ").await;

        assert!(matches!(outcome, LoadOutcome::Failed(ref m) if m.contains("empty")));
    }

    #[tokio::test]
    async fn test_loading_flag_is_published_while_in_flight() {
        let api = Arc::new(api_with_sites());
        let gate = api.gate("HQ");
        let loader = Arc::new(SiteDataLoader::new(api, StaleLoadPolicy::default()));
        let mut rx = loader.subscribe_snapshot();

        let task = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load_site("HQ").await }
        });

        rx.wait_for(|s| s.is_loading).await.unwrap();
        assert!(loader.snapshot().data().kpis.is_none());

        gate.notify_one();
        assert_eq!(task.await.unwrap(), LoadOutcome::Applied);
        assert!(!loader.snapshot().is_loading);
    }

    async fn overtaken_load(policy: StaleLoadPolicy) -> (LoadOutcome, SiteSnapshot) {
        let api = Arc::new(api_with_sites());
        let gate = api.gate("HQ");
        let loader = Arc::new(SiteDataLoader::new(api, policy));
        let mut rx = loader.subscribe_snapshot();

        let slow = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load_site("HQ").await }
        });
        rx.wait_for(|s| s.is_loading).await.unwrap();

        assert_eq!(loader.load_site("Lab").await, LoadOutcome::Applied);

        gate.notify_one();
        let outcome = slow.await.unwrap();
        (outcome, loader.snapshot())
    }

    #[tokio::test]
    async fn test_last_write_wins_lets_slow_load_overwrite() {
        let (outcome, snapshot) = overtaken_load(StaleLoadPolicy::LastWriteWins).await;
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(snapshot.site_id, "HQ");
    }

    #[tokio::test]
    async fn test_discard_stale_drops_overtaken_load() {
        let (outcome, snapshot) = overtaken_load(StaleLoadPolicy::DiscardStale).await;
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(snapshot.site_id, "Lab");
        assert_eq!(snapshot.data(), fixture(310.0, "Servers"));
    }

    #[tokio::test]
    async fn test_reset_clears_everything_and_drops_pending_load() {
        let api = Arc::new(api_with_sites());
        let gate = api.gate("Lab");
        let loader = Arc::new(SiteDataLoader::new(api, StaleLoadPolicy::DiscardStale));
        loader.load_initial().await.unwrap();
        let mut rx = loader.subscribe_snapshot();

        let pending = tokio::spawn({
            let loader = loader.clone();
            async move { loader.select_site("Lab").await }
        });
        rx.wait_for(|s| s.is_loading).await.unwrap();

        loader.reset();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), LoadOutcome::Discarded);
        assert!(loader.sites().is_empty());
        assert_eq!(loader.selected_site(), None);
        assert_eq!(loader.snapshot(), SiteSnapshot::default());
    }

    #[tokio::test]
    async fn test_pass_through_reads() {
        let loader = SiteDataLoader::new(Arc::new(api_with_sites()), StaleLoadPolicy::default());

        assert!(loader.forecast("HQ").await.unwrap().is_empty());
        assert!(loader.ml_metrics("HQ").await.unwrap().values.is_empty());
        assert!(loader.health().await.unwrap().is_online());
    }
}
