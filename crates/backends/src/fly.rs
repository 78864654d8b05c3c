use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::{BackendError, ExecutionBackend, LaunchSpec};

const MACHINES_API: &str = "https://api.machines.dev";

/// Fly.io Machines backend. Machines are created with `auto_destroy`, so the
/// control plane reclaims them after the agent process exits.
pub struct FlyBackend {
    client: reqwest::Client,
    api_token: String,
    app: String,
    region: String,
    base_url: String,
}

impl FlyBackend {
    pub fn new(app: &str, api_token: &str, region: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: api_token.to_string(),
            app: app.to_string(),
            region: region.to_string(),
            base_url: MACHINES_API.to_string(),
        }
    }

    fn machines_url(&self) -> String {
        format!("{}/v1/apps/{}/machines", self.base_url, self.app)
    }

    fn api_message(payload: &Value, status: StatusCode) -> String {
        payload
            .get("error")
            .or_else(|| payload.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("machines api returned {status}"))
    }
}

#[async_trait::async_trait]
impl ExecutionBackend for FlyBackend {
    async fn launch(&self, spec: &LaunchSpec) -> Result<String, BackendError> {
        let body = json!({
            "name": spec.name,
            "region": self.region,
            "config": {
                "image": spec.image,
                "env": spec.env,
                "init": { "cmd": spec.cmd },
                "auto_destroy": true,
            },
        });

        let response = self
            .client
            .post(self.machines_url())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            return Err(BackendError::Unavailable(Self::api_message(
                &payload, status,
            )));
        }

        payload
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::Unavailable("machine response missing id".to_string()))
    }

    async fn fetch_logs(&self, _handle: &str) -> Result<String, BackendError> {
        // The Machines API has no log endpoint; callers fall back to the
        // output persisted by the completion callback.
        Err(BackendError::LogsUnsupported)
    }

    async fn is_active(&self, handle: &str) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(format!("{}/{}", self.machines_url(), handle))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(handle.to_string()));
        }
        let payload: Value = response.json().await?;
        if !status.is_success() {
            return Err(BackendError::Unavailable(Self::api_message(
                &payload, status,
            )));
        }

        let state = payload.get("state").and_then(Value::as_str).unwrap_or("");
        Ok(matches!(
            state,
            "created" | "starting" | "started" | "replacing"
        ))
    }
}
