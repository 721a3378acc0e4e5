//! HTTP adapters for the GhostEnergy analytics and authentication services.
//!
//! One [`HttpApiClient`] implements every remote port ([`AuthApi`],
//! [`DashboardApi`], [`AssistantApi`]). Site identifiers are appended as
//! single path segments and therefore percent-encoded.

use crate::config::ClientConfig;
use async_trait::async_trait;
use ghostenergy_core::auth::{AuthApi, LoginRequest, LoginResponse};
use ghostenergy_core::chat::{AssistantApi, ChatRequest, ChatResponse};
use ghostenergy_core::dashboard::{
    Anomaly, DailyConsumption, DashboardApi, Envelope, ForecastPoint, HealthStatus, Kpi,
    MlMetrics, Recommendation, SectorConsumption,
};
use ghostenergy_core::error::{GhostError, Result};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
struct SitesResponse {
    #[serde(rename = "sedes", default)]
    sites: Vec<String>,
}

/// Error body shapes the services answer with.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_detail(self) -> Option<String> {
        let detail = match self.detail {
            Some(serde_json::Value::String(text)) => Some(text),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        detail
            .or(self.message)
            .filter(|text| !text.trim().is_empty())
    }
}

/// reqwest-backed client for the analytics API and the auth service.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    api_base: Url,
    auth_base: Url,
}

impl HttpApiClient {
    /// Builds a client from the configured base URLs and timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GhostError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: parse_base(&config.api_base_url)?,
            auth_base: parse_base(&config.auth_base_url)?,
        })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// The API host root: the analytics base with a trailing `/api` removed.
    pub fn api_root(&self) -> Url {
        let mut root = self.api_base.clone();
        let ends_with_api = root
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .is_some_and(|last| last == "api");
        if let Ok(mut segments) = root.path_segments_mut() {
            segments.pop_if_empty();
            if ends_with_api {
                segments.pop();
            }
        }
        root
    }

    fn endpoint(&self, base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| GhostError::config(format!("Base URL cannot take a path: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GhostError::transport(e.to_string()))?;
        decode(response).await
    }

    async fn site_resource<T: DeserializeOwned>(&self, resource: &str, site_id: &str) -> Result<T> {
        let url = self.endpoint(&self.api_base, &[resource, site_id])?;
        self.get_json(url).await
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| GhostError::config(format!("Invalid base URL '{}': {}", raw, e)))
}

/// Maps a response to `T`, or to [`GhostError::Api`] for non-success statuses.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_detail);
        tracing::warn!("Request failed with status {}", status);
        return Err(GhostError::api(status.as_u16(), detail));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GhostError::transport(format!("Failed to decode response: {}", e)))
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = self.endpoint(&self.auth_base, &["auth", "login"])?;
        tracing::debug!("POST {} for '{}'", url, request.username);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| GhostError::transport(e.to_string()))?;
        decode(response).await
    }
}

#[async_trait]
impl DashboardApi for HttpApiClient {
    async fn list_sites(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&self.api_base, &["sedes"])?;
        let body: SitesResponse = self.get_json(url).await?;
        Ok(body.sites)
    }

    async fn kpis(&self, site_id: &str) -> Result<Kpi> {
        self.site_resource("kpis", site_id).await
    }

    async fn daily_consumption(&self, site_id: &str) -> Result<Vec<DailyConsumption>> {
        self.site_resource("consumo-diario", site_id).await
    }

    async fn sector_consumption(&self, site_id: &str) -> Result<Vec<SectorConsumption>> {
        self.site_resource("consumo-sector", site_id).await
    }

    async fn anomalies(&self, site_id: &str) -> Result<Option<Envelope<Vec<Anomaly>>>> {
        self.site_resource("anomalias", site_id).await
    }

    async fn recommendations(
        &self,
        site_id: &str,
    ) -> Result<Option<Envelope<Vec<Recommendation>>>> {
        self.site_resource("recomendaciones", site_id).await
    }

    async fn ml_metrics(&self, site_id: &str) -> Result<MlMetrics> {
        let url = self.endpoint(&self.api_base, &["ml", "metrics", site_id])?;
        self.get_json(url).await
    }

    async fn forecast(&self, site_id: &str) -> Result<Option<Envelope<Vec<ForecastPoint>>>> {
        let url = self.endpoint(&self.api_base, &["ml", "forecast", site_id])?;
        self.get_json(url).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.get_json(self.api_root()).await
    }
}

#[async_trait]
impl AssistantApi for HttpApiClient {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(&self.api_base, &["chat"])?;
        tracing::debug!("POST {} (site '{}')", url, request.site_id);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| GhostError::transport(e.to_string()))?;
        decode(response).await
    }
}
