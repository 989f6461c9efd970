//! Bakery distribuida: envía el job a un runner remoto y espera su estado.
//!
//! Protocolo:
//! - `POST {endpoint}/v1/jobs` con `{job_name, recipe_id, runner_version, region, pipeline, storage}` -> `{job_id}`
//! - `GET {endpoint}/v1/jobs/{job_id}` -> `{state, message?, outputs?}`
//! - `POST {endpoint}/v1/jobs/{job_id}/cancel` (best effort, sin esperar)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use forge_core::constants::RUNNER_VERSION;
use forge_core::{EventSink, RunnerError};

use crate::config::DistributedBakeryConfig;
use crate::registry::DISTRIBUTED;
use crate::{BakeJob, BakeOutcome, Bakery};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RemoteState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: RemoteState,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    outputs: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct DistributedBakery {
    config: DistributedBakeryConfig,
    endpoint: String,
    client: Client,
}

impl DistributedBakery {
    pub fn new(config: DistributedBakeryConfig) -> Result<Self, RunnerError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(RunnerError::Config(format!("{DISTRIBUTED}: endpoint is empty")));
        }
        if config.poll_interval_ms == 0 {
            return Err(RunnerError::Config(format!("{DISTRIBUTED}: poll_interval_ms must be positive")));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT)
                                      .build()
                                      .map_err(|e| RunnerError::Config(format!("{DISTRIBUTED}: http client: {e}")))?;
        Ok(Self { config,
                  endpoint,
                  client })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn submit(&self, job: &BakeJob) -> Result<String, RunnerError> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let payload = json!({
            "job_name": job.job_name,
            "recipe_id": job.recipe_id,
            "runner_version": RUNNER_VERSION,
            "region": self.config.region,
            "pipeline": job.graph.describe(),
            "storage": job.storage,
        });
        let resp = self.authed(self.client.post(&url))
                       .json(&payload)
                       .send()
                       .await
                       .map_err(|e| RunnerError::BackendSubmission(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RunnerError::BackendSubmission(format!("{url} returned {status}: {}", body.trim())));
        }
        let body: SubmitResponse =
            resp.json().await.map_err(|e| RunnerError::BackendSubmission(format!("malformed response from {url}: {e}")))?;
        if body.job_id.trim().is_empty() {
            return Err(RunnerError::BackendSubmission(format!("{url} returned an empty job_id")));
        }
        Ok(body.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<StatusResponse, String> {
        let url = format!("{}/v1/jobs/{job_id}", self.endpoint);
        let resp = self.authed(self.client.get(&url)).send().await.map_err(|e| e.to_string())?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("{url} returned {status}"));
        }
        resp.json::<StatusResponse>().await.map_err(|e| format!("malformed status from {url}: {e}"))
    }

    /// Pide la cancelación remota sin esperar confirmación.
    fn request_cancel(&self, job_id: &str) {
        let url = format!("{}/v1/jobs/{job_id}/cancel", self.endpoint);
        let req = self.authed(self.client.post(&url));
        tokio::spawn(async move {
            if let Err(e) = req.send().await {
                log::warn!("cancel request to {url} failed: {e}");
            }
        });
    }

    /// Abandona la espera: pide la cancelación remota y devuelve el error.
    fn abandon(&self, job_name: &str, job_id: &str, cause: String) -> RunnerError {
        self.request_cancel(job_id);
        RunnerError::execution(job_name, cause)
    }

    /// Espera el estado terminal. El token y el timeout interrumpen tanto la
    /// pausa entre polls como un poll en vuelo.
    async fn wait(&self, job: &BakeJob, job_id: &str, cancel: &CancellationToken) -> Result<StatusResponse, RunnerError> {
        let job_name = job.job_name.as_str();
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let deadline = self.config.timeout_secs.map(|s| Instant::now() + Duration::from_secs(s));
        let timeout = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);
        let cancelled = || format!("cancelled while waiting for remote job {job_id}");
        let timed_out = || format!("timed out waiting for remote job {job_id}");
        let mut poll_errors = 0u32;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => return Err(self.abandon(job_name, job_id, cancelled())),
                _ = &mut timeout => return Err(self.abandon(job_name, job_id, timed_out())),
                polled = self.poll(job_id) => polled,
            };
            match polled {
                Ok(status) => {
                    poll_errors = 0;
                    match status.state {
                        RemoteState::Pending | RemoteState::Running => {
                            log::debug!("remote job {job_id} is {:?}", status.state);
                        }
                        RemoteState::Succeeded => return Ok(status),
                        RemoteState::Failed => {
                            let cause = status.message.unwrap_or_else(|| format!("remote job {job_id} failed"));
                            return Err(RunnerError::execution(job_name, cause));
                        }
                        RemoteState::Cancelled => {
                            return Err(RunnerError::execution(job_name, format!("remote job {job_id} was cancelled")));
                        }
                    }
                }
                Err(e) => {
                    poll_errors += 1;
                    log::warn!("polling remote job {job_id} failed ({poll_errors}/{}): {e}", self.config.max_poll_errors);
                    if poll_errors > self.config.max_poll_errors {
                        return Err(RunnerError::execution(job_name, format!("lost contact with remote job {job_id}: {e}")));
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(self.abandon(job_name, job_id, cancelled())),
                _ = &mut timeout => return Err(self.abandon(job_name, job_id, timed_out())),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[async_trait]
impl Bakery for DistributedBakery {
    fn name(&self) -> &'static str {
        DISTRIBUTED
    }

    async fn bake(&self, job: &BakeJob, _sink: &dyn EventSink, cancel: CancellationToken) -> Result<BakeOutcome, RunnerError> {
        if cancel.is_cancelled() {
            return Err(RunnerError::execution(job.job_name.as_str(), "cancelled before submission"));
        }
        let job_id = self.submit(job).await?;
        log::info!("submitted {} as remote job {job_id} to {}", job.job_name, self.endpoint);

        let status = self.wait(job, &job_id, &cancel).await?;
        let mut outcome = BakeOutcome::for_job(job);
        outcome.outputs = status.outputs.unwrap_or_else(|| job.graph.output_locations(&job.storage));
        outcome.items_run = job.graph.plan().len();
        outcome.job_id = Some(job_id);
        Ok(outcome)
    }
}
