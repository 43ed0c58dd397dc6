use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};
use tracing::warn;

use super::state::AppState;

/// Pass-through client for the external backend
///
/// Each route forwards the inbound JSON to a fixed path suffix and returns
/// the backend's JSON and status verbatim. Network failure yields a fixed
/// error envelope with HTTP 500. No retry, no circuit breaking.
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Value,
        error_message: &str,
    ) -> (StatusCode, Json<Value>) {
        let url = format!("{}{}", self.base_url, path);
        let result = self
            .client
            .post(&url)
            .query(query)
            .json(&body)
            .send()
            .await;
        self.relay(result, error_message).await
    }

    pub async fn get(&self, path: &str, error_message: &str) -> (StatusCode, Json<Value>) {
        let url = format!("{}{}", self.base_url, path);
        let result = self.client.get(&url).send().await;
        self.relay(result, error_message).await
    }

    async fn relay(
        &self,
        result: reqwest::Result<reqwest::Response>,
        error_message: &str,
    ) -> (StatusCode, Json<Value>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Backend unreachable: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error_message })),
                );
            }
        };

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match response.json::<Value>().await {
            Ok(body) => (status, Json(body)),
            Err(e) => {
                warn!("Backend returned a non-JSON body: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error_message })),
                )
            }
        }
    }
}

fn user_id_from(headers: &HeaderMap) -> String {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("1")
        .to_string()
}

/// POST /api/behavioral/finish
/// Relay a finished behavioral session to the backend for server-side persistence
pub async fn finish_behavioral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let user_id = user_id_from(&headers);
    state
        .proxy
        .post(
            "/behavioral/finish",
            &[("user_id", user_id.as_str())],
            body,
            "Failed to persist behavioral session",
        )
        .await
}

/// GET /api/dashboard/stats
pub async fn dashboard_stats(State(state): State<AppState>) -> impl IntoResponse {
    state
        .proxy
        .get("/dashboard/stats", "Failed to fetch dashboard stats")
        .await
}

/// GET /api/dashboard/progress
pub async fn dashboard_progress(State(state): State<AppState>) -> impl IntoResponse {
    state
        .proxy
        .get("/dashboard/progress", "Failed to fetch progress data")
        .await
}

/// GET /api/dashboard/activity
pub async fn dashboard_activity(State(state): State<AppState>) -> impl IntoResponse {
    state
        .proxy
        .get("/dashboard/activity", "Failed to fetch activity data")
        .await
}

/// GET /api/dashboard/categories
pub async fn dashboard_categories(State(state): State<AppState>) -> impl IntoResponse {
    state
        .proxy
        .get("/dashboard/categories", "Failed to fetch category data")
        .await
}

/// GET /api/dashboard/behavioral
pub async fn dashboard_behavioral(State(state): State<AppState>) -> impl IntoResponse {
    state
        .proxy
        .get("/dashboard/behavioral", "Failed to fetch behavioral summaries")
        .await
}
