use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::app::{CrosstableError, Result};
use crate::domain::PlayerId;
use crate::trigger::config::TriggerConfig;
use crate::trigger::{WorkflowApi, WorkflowRun};

const API_VERSION: &str = "2022-11-28";

/// GitHub Actions REST client for one workflow
pub struct GithubApi {
    client: Client,
    config: TriggerConfig,
}

#[derive(Deserialize)]
struct RunList {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

impl GithubApi {
    /// Build a client using the token from `config.token_env`.
    ///
    /// A missing or empty token is an [`CrosstableError::Auth`] error; no
    /// request is made.
    pub fn from_env(config: TriggerConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CrosstableError::Auth(format!(
                    "{} environment variable is not set",
                    config.token_env
                ))
            })?;
        Self::with_token(config, &token)
    }

    pub fn with_token(config: TriggerConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| CrosstableError::Auth("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("crosstable/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    fn workflow_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/actions/workflows/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.config.workflow,
            suffix
        )
    }

    fn run_url(&self, id: u64) -> String {
        format!(
            "{}/repos/{}/{}/actions/runs/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            id
        )
    }
}

/// Map auth and missing-resource responses to their own errors.
async fn check(response: Response, what: &str) -> Result<Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let body = response.text().await.unwrap_or_default();
            Err(CrosstableError::Auth(format!("{} rejected: {}", what, body.trim())))
        }
        StatusCode::NOT_FOUND => Err(CrosstableError::NotFound(what.to_string())),
        _ => Ok(response.error_for_status()?),
    }
}

#[async_trait]
impl WorkflowApi for GithubApi {
    async fn dispatch(&self, player: &PlayerId) -> Result<()> {
        let url = self.workflow_url("dispatches");
        let body = json!({
            "ref": self.config.git_ref,
            "inputs": { "player_id": player.as_str() },
        });

        debug!(%url, "dispatching workflow");
        let response = self.client.post(&url).json(&body).send().await?;
        check(response, &format!("workflow {}", self.config.workflow)).await?;
        Ok(())
    }

    async fn recent_runs(&self) -> Result<Vec<WorkflowRun>> {
        let url = self.workflow_url("runs");
        let response = self
            .client
            .get(&url)
            .query(&[("event", "workflow_dispatch"), ("per_page", "10")])
            .send()
            .await?;
        let list: RunList = check(response, &format!("runs of {}", self.config.workflow))
            .await?
            .json()
            .await?;
        Ok(list.workflow_runs)
    }

    async fn run(&self, id: u64) -> Result<WorkflowRun> {
        let url = self.run_url(id);
        let response = self.client.get(&url).send().await?;
        Ok(check(response, &format!("run {}", id)).await?.json().await?)
    }
}
