//! Typed access to the backend's JSON API.
//!
//! `ApiClient` speaks to the gateway (or the backend directly), keeps the
//! session cookie in a small jar the way a browser with
//! `credentials: "include"` would, and decodes every answer into the records
//! of [`crate::client::schema`].

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use url::Url;

use crate::client::schema::{
    Ack, ApiError, AuthResponse, Credentials, DashboardStats, DashboardStatsResponse, DietPlan,
    HealthStatus, ProfileIntake, ProfileResponse, ProfileSaved, ProgressData, ProgressResponse,
    Registration, WorkoutCustomization, WorkoutPlan, WorkoutPlanResponse, decode,
};
use crate::http::headers::Headers;
use crate::http::request::Method;
use crate::proxy::upstream::{self, UpstreamRequest};

/// Session cookies received from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one `Set-Cookie` header value.
    ///
    /// Attributes other than `Max-Age` are ignored. An empty value or a
    /// non-positive `Max-Age` deletes the cookie.
    pub fn store(&mut self, set_cookie: &str) {
        let mut parts = set_cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return;
        }

        let expired = parts.any(|attr| {
            attr.split_once('=').is_some_and(|(key, v)| {
                key.trim().eq_ignore_ascii_case("max-age")
                    && v.trim().parse::<i64>().is_ok_and(|age| age <= 0)
            })
        });

        self.cookies.retain(|(n, _)| n != name);
        if !expired && !value.is_empty() {
            self.cookies.push((name.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// The `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug)]
pub struct ApiClient {
    base: Url,
    jar: Mutex<CookieJar>,
}

impl ApiClient {
    /// `base` is the origin serving `/api/*`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base).with_context(|| format!("Invalid API base URL {:?}", base))?;
        if base.scheme() != "http" {
            anyhow::bail!("API base URL must use http, got {:?}", base.scheme());
        }
        Ok(Self {
            base,
            jar: Mutex::new(CookieJar::new()),
        })
    }

    /// A copy of the cookies currently held.
    pub async fn cookies(&self) -> CookieJar {
        self.jar.lock().await.clone()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body).map_err(ApiError::Schema)?;
        self.call(Method::POST, path, Some(body)).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("Invalid API path {:?}", path))?;

        let mut headers = Headers::new();
        headers.append("Accept", "application/json");
        if body.is_some() {
            headers.append("Content-Type", "application/json");
        }
        {
            let jar = self.jar.lock().await;
            if !jar.is_empty() {
                headers.append("Cookie", jar.header_value());
            }
        }

        let request = UpstreamRequest {
            method,
            url: &url,
            headers,
            body: body.as_deref(),
        };
        let response = upstream::send(&request).await?;

        {
            let mut jar = self.jar.lock().await;
            for cookie in response.headers.get_all("Set-Cookie") {
                jar.store(cookie);
            }
        }

        tracing::debug!(
            %method,
            path = %url.path(),
            status = response.status.as_u16(),
            "API call"
        );

        decode(response.status, &response.body)
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/api/health").await
    }

    pub async fn profile(&self) -> Result<ProfileResponse, ApiError> {
        self.get("/api/profile").await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/api/login", &credentials).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let registration = Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/api/register", &registration).await
    }

    pub async fn logout(&self) -> Result<Ack, ApiError> {
        self.call(Method::POST, "/api/logout", None).await
    }

    pub async fn save_profile(&self, intake: &ProfileIntake) -> Result<ProfileSaved, ApiError> {
        self.post("/api/profile", intake).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let response: DashboardStatsResponse = self.get("/api/dashboard-stats").await?;
        Ok(response.stats)
    }

    /// Today's stats, or [`DashboardStats::fallback`] if they cannot be fetched.
    pub async fn dashboard_stats_or_fallback(&self) -> DashboardStats {
        match self.dashboard_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "Using fallback dashboard stats");
                DashboardStats::fallback()
            }
        }
    }

    pub async fn diet_plan(&self) -> Result<DietPlan, ApiError> {
        self.get("/api/diet-plan").await
    }

    pub async fn workout_plan(&self) -> Result<WorkoutPlan, ApiError> {
        let response: WorkoutPlanResponse = self.get("/api/workout-plan").await?;
        Ok(response.workout)
    }

    pub async fn generate_workout(
        &self,
        customization: &WorkoutCustomization,
    ) -> Result<WorkoutPlan, ApiError> {
        let response: WorkoutPlanResponse = self.post("/api/workout-plan", customization).await?;
        Ok(response.workout)
    }

    pub async fn progress_data(&self, days: u32) -> Result<ProgressData, ApiError> {
        let response: ProgressResponse = self
            .get(&format!("/api/progress-data?days={}", days))
            .await?;
        Ok(response.data)
    }
}
