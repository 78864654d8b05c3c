use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod docker;
pub mod fly;
pub mod logs;

pub use docker::{DockerBackend, DockerTls};
pub use fly::FlyBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("execution backend unavailable: {0}")]
    Unavailable(String),
    #[error("execution environment not found: {0}")]
    NotFound(String),
    #[error("this backend does not expose logs")]
    LogsUnsupported,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Everything a backend needs to provision one isolated agent environment.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Runner image to boot.
    pub image: String,
    /// Deterministic environment name, used for later lookups.
    pub name: String,
    /// Environment variables for the agent process.
    pub env: HashMap<String, String>,
    /// Command-line arguments the agent expects:
    /// `[repo_url, prompt, branch, callback_url, run_id]`.
    pub cmd: Vec<String>,
}

/// Uniform contract over the interchangeable execution backends (local or
/// mutual-TLS Docker daemon, Fly.io Machines). One backend is active per
/// deployment, chosen by configuration; callers never sniff which one.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Create the environment and start it immediately. Returns an opaque
    /// handle for later log/liveness lookups. Does not wait for completion.
    async fn launch(&self, spec: &LaunchSpec) -> Result<String, BackendError>;

    /// Combined stdout/stderr for a handle, wire framing stripped.
    async fn fetch_logs(&self, handle: &str) -> Result<String, BackendError>;

    /// Whether the environment is still running.
    async fn is_active(&self, handle: &str) -> Result<bool, BackendError>;
}
