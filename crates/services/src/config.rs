use backends::DockerTls;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_RUNNER_IMAGE: &str = "ghcr.io/antho1404/claude-runner:latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Process-wide configuration, resolved once at startup from the
/// environment and passed by reference into the components that need it.
pub struct Config {
    pub base_app_url: String,
    pub runner_image: String,
    pub anthropic_api_key: SecretString,
    pub backend: BackendConfig,
    pub github: GitHubAppConfig,
    pub monthly_run_limit: Option<u32>,
    pub default_pr_base: Option<String>,
}

/// Which execution backend this deployment talks to. Exactly one is active;
/// the choice is configuration-time, not per-run.
pub enum BackendConfig {
    Docker {
        host: String,
        tls: Option<DockerTls>,
    },
    Fly {
        app: String,
        api_token: SecretString,
        region: String,
    },
}

pub struct GitHubAppConfig {
    pub app_id: u64,
    pub private_key_pem: Vec<u8>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match optional("EXECUTION_BACKEND").as_deref() {
            None | Some("docker") => BackendConfig::Docker {
                host: require("DOCKER_HOST")?,
                tls: docker_tls_from_env()?,
            },
            Some("fly") => BackendConfig::Fly {
                app: require("FLY_APP")?,
                api_token: SecretString::from(require("FLY_API_TOKEN")?),
                region: optional("FLY_REGION").unwrap_or_else(|| "sin".to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "EXECUTION_BACKEND",
                    message: format!("unknown backend '{other}' (expected 'docker' or 'fly')"),
                });
            }
        };

        Ok(Config {
            base_app_url: require("BASE_APP_URL")?,
            runner_image: optional("RUNNER_IMAGE")
                .unwrap_or_else(|| DEFAULT_RUNNER_IMAGE.to_string()),
            anthropic_api_key: SecretString::from(require("ANTHROPIC_API_KEY")?),
            backend,
            github: GitHubAppConfig {
                app_id: parse("GITHUB_APP_ID", require("GITHUB_APP_ID")?)?,
                private_key_pem: decode_b64("GITHUB_APP_PRIVATE_KEY", &require("GITHUB_APP_PRIVATE_KEY")?)?,
            },
            monthly_run_limit: optional("MONTHLY_RUN_LIMIT")
                .map(|raw| parse("MONTHLY_RUN_LIMIT", raw))
                .transpose()?,
            default_pr_base: optional("DEFAULT_PR_BASE"),
        })
    }

    /// Endpoint the agent process reports its result to.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/runner/webhook",
            self.base_app_url.trim_end_matches('/')
        )
    }
}

/// The three mutual-TLS variables are all-or-none; a partially configured
/// daemon identity is a deployment mistake worth failing loudly on.
fn docker_tls_from_env() -> Result<Option<DockerTls>, ConfigError> {
    let ca = optional("DOCKER_CA");
    let cert = optional("DOCKER_CERT");
    let key = optional("DOCKER_KEY");

    match (ca, cert, key) {
        (None, None, None) => Ok(None),
        (Some(ca), Some(cert), Some(key)) => Ok(Some(DockerTls {
            ca_pem: decode_b64("DOCKER_CA", &ca)?,
            cert_pem: decode_b64("DOCKER_CERT", &cert)?,
            key_pem: decode_b64("DOCKER_KEY", &key)?,
        })),
        _ => Err(ConfigError::Invalid {
            var: "DOCKER_CA",
            message: "DOCKER_CA, DOCKER_CERT and DOCKER_KEY must be set together".to_string(),
        }),
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse<T: std::str::FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        var,
        message: err.to_string(),
    })
}

fn decode_b64(var: &'static str, raw: &str) -> Result<Vec<u8>, ConfigError> {
    BASE64.decode(raw).map_err(|err| ConfigError::Invalid {
        var,
        message: format!("expected base64: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_app_url: &str) -> Config {
        Config {
            base_app_url: base_app_url.to_string(),
            runner_image: DEFAULT_RUNNER_IMAGE.to_string(),
            anthropic_api_key: SecretString::from("sk-test".to_string()),
            backend: BackendConfig::Docker {
                host: "http://localhost:2375".to_string(),
                tls: None,
            },
            github: GitHubAppConfig {
                app_id: 1,
                private_key_pem: Vec::new(),
            },
            monthly_run_limit: None,
            default_pr_base: None,
        }
    }

    #[test]
    fn callback_url_handles_trailing_slash() {
        assert_eq!(
            test_config("https://anthony.run/").callback_url(),
            "https://anthony.run/api/runner/webhook"
        );
        assert_eq!(
            test_config("https://anthony.run").callback_url(),
            "https://anthony.run/api/runner/webhook"
        );
    }
}
