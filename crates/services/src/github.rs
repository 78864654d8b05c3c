use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use octocrab::{
    Octocrab,
    models::{AppId, InstallationId},
};
use thiserror::Error;
use utils::text::pr_title_from_branch;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("invalid GitHub App private key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
    #[error("invalid installation id: {0}")]
    InvalidInstallation(i64),
    #[error(transparent)]
    GitHub(#[from] octocrab::Error),
}

#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub repo_owner: String,
    pub repo_name: String,
    pub branch: String,
    pub issue_number: Option<i64>,
    pub run_id: Uuid,
    pub installation_id: i64,
    /// Agent result text, embedded verbatim in the PR body.
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FinalizedPr {
    pub number: u64,
    pub url: Option<String>,
}

/// Turns a successful run into a pull request. Behind a trait so the
/// completion path can be exercised without talking to GitHub.
#[async_trait]
pub trait RunFinalizer: Send + Sync {
    async fn finalize(&self, request: &FinalizeRequest) -> Result<FinalizedPr, FinalizeError>;
}

/// GitHub App backed finalizer. All calls are authenticated as the app
/// installation that owns the repository, never as the end user, so the PR
/// is attributable to the bot identity.
pub struct GithubService {
    app_id: AppId,
    key: EncodingKey,
    base_app_url: String,
    default_pr_base: Option<String>,
}

impl GithubService {
    pub fn new(config: &Config) -> Result<Self, FinalizeError> {
        Ok(Self {
            app_id: AppId(config.github.app_id),
            key: EncodingKey::from_rsa_pem(&config.github.private_key_pem)?,
            base_app_url: config.base_app_url.clone(),
            default_pr_base: config.default_pr_base.clone(),
        })
    }

    fn installation_client(&self, installation_id: i64) -> Result<Octocrab, FinalizeError> {
        let client = Octocrab::builder()
            .app(self.app_id, self.key.clone())
            .build()?;
        Ok(client.installation(installation(installation_id)?)?)
    }

    /// Configured base, else the repository's default branch, else `main`.
    async fn base_branch(&self, client: &Octocrab, owner: &str, repo: &str) -> String {
        if let Some(base) = self.default_pr_base.as_ref() {
            return base.clone();
        }
        match client.repos(owner, repo).get().await {
            Ok(repository) => repository
                .default_branch
                .unwrap_or_else(|| "main".to_string()),
            Err(err) => {
                tracing::warn!("failed to resolve default branch for {owner}/{repo}: {err}");
                "main".to_string()
            }
        }
    }
}

/// GitHub installation ids are unsigned; a negative value from a client
/// payload must not wrap into a real installation.
fn installation(installation_id: i64) -> Result<InstallationId, FinalizeError> {
    u64::try_from(installation_id)
        .map(InstallationId)
        .map_err(|_| FinalizeError::InvalidInstallation(installation_id))
}

pub(crate) fn pr_body(
    content: &str,
    base_app_url: &str,
    run_id: Uuid,
    issue_number: Option<i64>,
) -> String {
    let base = base_app_url.trim_end_matches('/');
    let mut body = format!(
        "{content}\n\n## Result\nView the execution result: {base}/dashboard/runs/{run_id}\n"
    );
    if let Some(number) = issue_number {
        body.push_str(&format!("\nCloses #{number}\n"));
    }
    body
}

#[async_trait]
impl RunFinalizer for GithubService {
    async fn finalize(&self, request: &FinalizeRequest) -> Result<FinalizedPr, FinalizeError> {
        let client = self.installation_client(request.installation_id)?;
        let base = self
            .base_branch(&client, &request.repo_owner, &request.repo_name)
            .await;

        let title = pr_title_from_branch(&request.branch, request.issue_number);
        let body = pr_body(
            &request.content,
            &self.base_app_url,
            request.run_id,
            request.issue_number,
        );

        let pr = client
            .pulls(&request.repo_owner, &request.repo_name)
            .create(&title, &request.branch, &base)
            .body(&body)
            .maintainer_can_modify(true)
            .send()
            .await?;

        // GitHub permission quirks make assignment unreliable; a failed
        // assignment must not fail the finalize call.
        if let Err(err) = client
            .issues(&request.repo_owner, &request.repo_name)
            .add_assignees(pr.number, &[request.repo_owner.as_str()])
            .await
        {
            tracing::warn!(
                "failed to assign pull request #{} to {}: {err}",
                pr.number,
                request.repo_owner
            );
        }

        Ok(FinalizedPr {
            number: pr.number,
            url: pr.html_url.map(|url| url.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_embeds_content_run_link_and_closes_directive() {
        let run_id = Uuid::parse_str("12345678-1234-1234-1234-123456789abc").unwrap();
        let body = pr_body("diff applied", "https://anthony.run/", run_id, Some(42));

        assert!(body.starts_with("diff applied\n\n## Result\n"));
        assert!(body.contains(&format!(
            "View the execution result: https://anthony.run/dashboard/runs/{run_id}"
        )));
        assert!(body.contains("Closes #42"));
    }

    #[test]
    fn negative_installation_id_is_rejected() {
        assert!(matches!(
            installation(-1),
            Err(FinalizeError::InvalidInstallation(-1))
        ));
        assert_eq!(installation(1234).unwrap(), InstallationId(1234));
    }

    #[test]
    fn body_omits_closes_directive_without_issue() {
        let body = pr_body("done", "https://anthony.run", Uuid::new_v4(), None);

        assert!(!body.contains("Closes #"));
    }
}
