use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::{BackendError, ExecutionBackend, LaunchSpec, logs::demux_log_stream};

/// Client-certificate material for a daemon exposed over mutual TLS, PEM
/// encoded (the deployment stores these base64-encoded in the environment;
/// decoding happens in the config layer).
#[derive(Clone)]
pub struct DockerTls {
    pub ca_pem: Vec<u8>,
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Docker Engine API backend. Covers both the local daemon (plain HTTP over
/// TCP) and a remote daemon guarded by mutual TLS.
pub struct DockerBackend {
    client: reqwest::Client,
    base_url: String,
}

impl DockerBackend {
    pub fn new(host: &str, tls: Option<&DockerTls>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(tls) = tls {
            let ca = reqwest::Certificate::from_pem(&tls.ca_pem)?;
            let mut identity_pem = tls.cert_pem.clone();
            identity_pem.extend_from_slice(&tls.key_pem);
            let identity = reqwest::Identity::from_pem(&identity_pem)?;
            builder = builder.add_root_certificate(ca).identity(identity);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct CreateContainerBody<'a> {
    #[serde(rename = "Image")]
    image: &'a str,
    #[serde(rename = "Env")]
    env: Vec<String>,
    #[serde(rename = "Cmd")]
    cmd: &'a [String],
    #[serde(rename = "HostConfig")]
    host_config: HostConfig,
}

#[derive(Serialize)]
struct HostConfig {
    #[serde(rename = "RestartPolicy")]
    restart_policy: RestartPolicy,
}

#[derive(Serialize)]
struct RestartPolicy {
    #[serde(rename = "Name")]
    name: &'static str,
}

/// Pull the daemon's error message out of a `{"message": "..."}` body.
fn daemon_message(body: &Value, status: StatusCode) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("daemon returned {status}"))
}

#[async_trait::async_trait]
impl ExecutionBackend for DockerBackend {
    async fn launch(&self, spec: &LaunchSpec) -> Result<String, BackendError> {
        let body = CreateContainerBody {
            image: &spec.image,
            env: spec
                .env
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect(),
            cmd: &spec.cmd,
            host_config: HostConfig {
                restart_policy: RestartPolicy { name: "no" },
            },
        };

        let response = self
            .client
            .post(format!("{}/containers/create", self.base_url))
            .query(&[("name", spec.name.as_str())])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            return Err(BackendError::Unavailable(daemon_message(&payload, status)));
        }
        let id = payload
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BackendError::Unavailable("create response missing container id".to_string())
            })?
            .to_string();

        let response = self
            .client
            .post(format!("{}/containers/{}/start", self.base_url, id))
            .send()
            .await?;
        let status = response.status();
        // 304: container was already started, which is fine.
        if !status.is_success() && status != StatusCode::NOT_MODIFIED {
            let payload: Value = response.json().await.unwrap_or(Value::Null);
            return Err(BackendError::Unavailable(daemon_message(&payload, status)));
        }

        Ok(id)
    }

    async fn fetch_logs(&self, handle: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .get(format!("{}/containers/{}/logs", self.base_url, handle))
            .query(&[("stdout", "true"), ("stderr", "true")])
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(handle.to_string()));
        }
        if !status.is_success() {
            let payload: Value = response.json().await.unwrap_or(Value::Null);
            return Err(BackendError::Unavailable(daemon_message(&payload, status)));
        }

        let raw = response.bytes().await?;
        Ok(demux_log_stream(&raw))
    }

    async fn is_active(&self, handle: &str) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(format!("{}/containers/{}/json", self.base_url, handle))
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(handle.to_string()));
        }
        let payload: Value = response.json().await?;
        if !status.is_success() {
            return Err(BackendError::Unavailable(daemon_message(&payload, status)));
        }

        Ok(payload
            .pointer("/State/Running")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }
}
