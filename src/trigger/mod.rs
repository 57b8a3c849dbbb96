//! Remote trigger for the CI workflow that runs the scraper.
//!
//! The trigger dispatches the workflow for a player, finds the run the
//! dispatch created and can then poll it to completion. It never sees the
//! scrape output; results are retrieved from the run's artifacts.

mod config;
mod github;

pub use config::{PollPolicy, TriggerConfig};
pub use github::GithubApi;

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::{CrosstableError, Result};
use crate::domain::PlayerId;

/// Allowance for clock skew between this machine and the API server when
/// matching a dispatch to the run it created.
const CLOCK_SKEW_SECS: i64 = 30;

/// A workflow run as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub html_url: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub event: String,
}

impl WorkflowRun {
    pub fn status(&self) -> RunStatus {
        match self.status.as_deref() {
            Some("completed") => RunStatus::Completed {
                conclusion: self.conclusion.clone().unwrap_or_default(),
            },
            Some("queued") | Some("waiting") | Some("pending") | Some("requested") => {
                RunStatus::Queued
            }
            Some("in_progress") => RunStatus::InProgress,
            Some(other) => RunStatus::Other(other.to_string()),
            None => RunStatus::Other(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed { conclusion: String },
    Other(String),
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { conclusion } if conclusion == "success")
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::InProgress => f.write_str("in_progress"),
            Self::Completed { conclusion } => write!(f, "completed ({})", conclusion),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// Identifies the run started by a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: u64,
    pub url: String,
}

/// The CI operations the trigger needs
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Start the workflow for a player
    async fn dispatch(&self, player: &PlayerId) -> Result<()>;

    /// Most recent runs of the workflow, newest first
    async fn recent_runs(&self) -> Result<Vec<WorkflowRun>>;

    /// Current state of one run
    async fn run(&self, id: u64) -> Result<WorkflowRun>;
}

pub struct WorkflowTrigger<A: WorkflowApi> {
    api: A,
    policy: PollPolicy,
}

impl<A: WorkflowApi> WorkflowTrigger<A> {
    pub fn new(api: A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Dispatch the workflow and locate the run it created.
    ///
    /// Fails with [`CrosstableError::NotFound`] if no matching run shows up
    /// within `discovery_attempts` lookups.
    pub async fn trigger(&self, player: &PlayerId) -> Result<RunHandle> {
        let dispatched_at = Utc::now() - TimeDelta::seconds(CLOCK_SKEW_SECS);

        info!("Triggering workflow for player ID: {}...", player);
        self.with_retries("dispatch", || self.api.dispatch(player))
            .await?;

        tokio::time::sleep(self.policy.startup_delay).await;

        for attempt in 1..=self.policy.discovery_attempts {
            let runs = self
                .with_retries("list runs", || self.api.recent_runs())
                .await?;

            if let Some(run) = newest_since(&runs, dispatched_at) {
                info!(run_id = run.id, "Workflow run started: {}", run.html_url);
                return Ok(RunHandle {
                    id: run.id,
                    url: run.html_url.clone(),
                });
            }

            info!(
                "Waiting for workflow run to appear (attempt {}/{})",
                attempt, self.policy.discovery_attempts
            );
            tokio::time::sleep(self.policy.interval).await;
        }

        Err(CrosstableError::NotFound(format!(
            "no workflow run appeared after {} lookups",
            self.policy.discovery_attempts
        )))
    }

    /// Poll a run until it completes.
    ///
    /// Returns the terminal status, or [`CrosstableError::Timeout`] once
    /// `max_attempts` checks have passed without completion.
    pub async fn poll(&self, handle: &RunHandle) -> Result<RunStatus> {
        for attempt in 1..=self.policy.max_attempts {
            let run = self
                .with_retries("get run", || self.api.run(handle.id))
                .await?;
            let status = run.status();

            if status.is_terminal() {
                if status.is_success() {
                    info!("Workflow completed successfully!");
                } else {
                    warn!("Workflow finished: {}", status);
                }
                return Ok(status);
            }

            let elapsed = self.policy.interval * (attempt - 1);
            info!("Workflow {}... ({}s elapsed)", status, elapsed.as_secs());
            tokio::time::sleep(self.policy.interval).await;
        }

        Err(CrosstableError::Timeout(format!(
            "run {} still not complete after {:?}",
            handle.id,
            self.policy.max_wait()
        )))
    }

    async fn with_retries<T, F, Fut>(&self, what: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.network_retries => {
                    attempt += 1;
                    warn!(
                        "{} failed ({}), retrying {}/{}",
                        what, e, attempt, self.policy.network_retries
                    );
                    tokio::time::sleep(self.policy.interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Newest `workflow_dispatch` run created at or after `since`.
fn newest_since(runs: &[WorkflowRun], since: DateTime<Utc>) -> Option<&WorkflowRun> {
    runs.iter()
        .filter(|run| run.event.is_empty() || run.event == "workflow_dispatch")
        .filter(|run| run.created_at >= since)
        .max_by_key(|run| run.created_at)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Replays scripted responses in order.
    #[derive(Default)]
    struct ScriptedApi {
        dispatches: Mutex<VecDeque<Result<()>>>,
        listings: Mutex<VecDeque<Result<Vec<WorkflowRun>>>>,
        runs: Mutex<VecDeque<Result<WorkflowRun>>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkflowApi for ScriptedApi {
        async fn dispatch(&self, _player: &PlayerId) -> Result<()> {
            self.record("dispatch");
            self.dispatches.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn recent_runs(&self) -> Result<Vec<WorkflowRun>> {
            self.record("recent_runs");
            self.listings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn run(&self, _id: u64) -> Result<WorkflowRun> {
            self.record("run");
            self.runs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CrosstableError::NotFound("script exhausted".into())))
        }
    }

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts: 4,
            discovery_attempts: 3,
            network_retries: 2,
            startup_delay: Duration::ZERO,
        }
    }

    fn run(id: u64, status: &str, conclusion: Option<&str>, created_at: DateTime<Utc>) -> WorkflowRun {
        WorkflowRun {
            id,
            html_url: format!("https://github.com/o/r/actions/runs/{}", id),
            status: Some(status.to_string()),
            conclusion: conclusion.map(String::from),
            created_at,
            event: "workflow_dispatch".to_string(),
        }
    }

    fn player() -> PlayerId {
        PlayerId::parse("31979530").unwrap()
    }

    #[tokio::test]
    async fn test_trigger_finds_new_run() {
        let api = ScriptedApi::default();
        let old = run(1, "completed", Some("success"), Utc::now() - TimeDelta::hours(2));
        api.listings.lock().unwrap().push_back(Ok(vec![old.clone()]));
        api.listings
            .lock()
            .unwrap()
            .push_back(Ok(vec![run(2, "queued", None, Utc::now()), old]));

        let trigger = WorkflowTrigger::new(api, policy());
        let handle = trigger.trigger(&player()).await.unwrap();

        assert_eq!(handle.id, 2);
        assert_eq!(handle.url, "https://github.com/o/r/actions/runs/2");
        assert_eq!(
            trigger.api.calls(),
            vec!["dispatch", "recent_runs", "recent_runs"]
        );
    }

    #[tokio::test]
    async fn test_trigger_gives_up_when_run_never_appears() {
        let trigger = WorkflowTrigger::new(ScriptedApi::default(), policy());
        let err = trigger.trigger(&player()).await.unwrap_err();

        assert!(matches!(err, CrosstableError::NotFound(_)));
        assert_eq!(trigger.api.calls().len(), 1 + 3);
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let api = ScriptedApi::default();
        api.dispatches
            .lock()
            .unwrap()
            .push_back(Err(CrosstableError::Auth("bad credentials".into())));

        let trigger = WorkflowTrigger::new(api, policy());
        let err = trigger.trigger(&player()).await.unwrap_err();

        assert!(matches!(err, CrosstableError::Auth(_)));
        assert_eq!(trigger.api.calls(), vec!["dispatch"]);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_then_surface() {
        let api = ScriptedApi::default();
        for _ in 0..3 {
            api.dispatches
                .lock()
                .unwrap()
                .push_back(Err(CrosstableError::Timeout("network".into())));
        }

        let trigger = WorkflowTrigger::new(api, policy());
        let err = trigger.trigger(&player()).await.unwrap_err();

        assert!(matches!(err, CrosstableError::Timeout(_)));
        assert_eq!(trigger.api.calls(), vec!["dispatch"; 3]);
    }

    #[tokio::test]
    async fn test_transient_error_recovers() {
        let api = ScriptedApi::default();
        api.dispatches
            .lock()
            .unwrap()
            .push_back(Err(CrosstableError::Timeout("network".into())));
        api.listings
            .lock()
            .unwrap()
            .push_back(Ok(vec![run(5, "queued", None, Utc::now())]));

        let trigger = WorkflowTrigger::new(api, policy());
        assert_eq!(trigger.trigger(&player()).await.unwrap().id, 5);
    }

    #[tokio::test]
    async fn test_poll_until_completed() {
        let api = ScriptedApi::default();
        let now = Utc::now();
        for (status, conclusion) in [("queued", None), ("in_progress", None), ("completed", Some("failure"))] {
            api.runs.lock().unwrap().push_back(Ok(run(9, status, conclusion, now)));
        }

        let trigger = WorkflowTrigger::new(api, policy());
        let handle = RunHandle { id: 9, url: String::new() };
        let status = trigger.poll(&handle).await.unwrap();

        assert_eq!(status, RunStatus::Completed { conclusion: "failure".into() });
        assert!(!status.is_success());
        assert_eq!(trigger.api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_poll_is_bounded() {
        let api = ScriptedApi::default();
        for _ in 0..10 {
            api.runs
                .lock()
                .unwrap()
                .push_back(Ok(run(9, "in_progress", None, Utc::now())));
        }

        let trigger = WorkflowTrigger::new(api, policy());
        let handle = RunHandle { id: 9, url: String::new() };
        let err = trigger.poll(&handle).await.unwrap_err();

        assert!(matches!(err, CrosstableError::Timeout(_)));
        assert_eq!(trigger.api.calls().len(), 4);
    }

    #[test]
    fn test_newest_since_ignores_other_events() {
        let now = Utc::now();
        let mut push = run(3, "queued", None, now + TimeDelta::seconds(5));
        push.event = "push".into();
        let runs = vec![push, run(4, "queued", None, now)];

        let found = newest_since(&runs, now - TimeDelta::seconds(1)).unwrap();
        assert_eq!(found.id, 4);
        assert!(newest_since(&runs, now + TimeDelta::seconds(60)).is_none());
    }

    #[test]
    fn test_status_mapping() {
        let now = Utc::now();
        assert_eq!(run(1, "queued", None, now).status(), RunStatus::Queued);
        assert_eq!(run(1, "in_progress", None, now).status(), RunStatus::InProgress);
        assert!(run(1, "completed", Some("success"), now).status().is_success());
        assert_eq!(
            run(1, "action_required", None, now).status().to_string(),
            "action_required"
        );
    }
}
