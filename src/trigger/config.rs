use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the scraper workflow lives and how patiently to wait for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// GitHub REST API root (default: https://api.github.com)
    pub api_base: String,

    pub owner: String,

    pub repo: String,

    /// Workflow file name under .github/workflows
    pub workflow: String,

    /// Branch or tag the workflow runs on (default: main)
    pub git_ref: String,

    /// Environment variable holding the API token (default: GITHUB_TOKEN)
    pub token_env: String,

    /// Seconds between status checks (default: 5)
    pub poll_interval_secs: u64,

    /// Status checks before giving up on a running workflow (default: 120)
    pub max_poll_attempts: u32,

    /// Attempts to find the run created by a dispatch (default: 12)
    pub discovery_attempts: u32,

    /// Retries for a request that failed at the network level (default: 3)
    pub network_retries: u32,

    /// Pause between dispatching and the first lookup, in seconds (default: 3)
    pub startup_delay_secs: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: "chughjug".to_string(),
            repo: "msm".to_string(),
            workflow: "run_chess_scraper.yml".to_string(),
            git_ref: "main".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            poll_interval_secs: 5,
            max_poll_attempts: 120,
            discovery_attempts: 12,
            network_retries: 3,
            startup_delay_secs: 3,
        }
    }
}

impl TriggerConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_poll_attempts,
            discovery_attempts: self.discovery_attempts,
            network_retries: self.network_retries,
            startup_delay: Duration::from_secs(self.startup_delay_secs),
        }
    }
}

/// Bounds for every wait the trigger performs, so it always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub discovery_attempts: u32,
    pub network_retries: u32,
    pub startup_delay: Duration,
}

impl PollPolicy {
    /// Upper bound on time spent polling a run, ignoring request latency.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}
