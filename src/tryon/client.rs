use std::pin::pin;

use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tokio::time::Instant;

use crate::auth::Signer;
use crate::config::Config;
use crate::polling::{PollPolicy, Wait};
use crate::tryon::types::SubmitBody;
use crate::tryon::{PollOutcome, TaskHandle, TaskStatus, TryOnRequest};
use crate::{ApiResponse, Result};

pub const SUBMIT_ENDPOINT: &str = "/ai/virtual/tryon-pro";
pub const RESULTS_ENDPOINT: &str = "/ai/virtual/tryon-results";

/// Submits try-on jobs and polls them to completion.
///
/// Every call is signed afresh; nothing about a previous call is reused.
#[derive(Clone, Debug)]
pub struct TryOnClient {
    signer: Signer,
    poll: PollPolicy,
    client: ReqwestClient,
}

impl TryOnClient {
    /// Creates a client with an HTTP client honoring `config.request_timeout`.
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Self::with_client(config, builder.build()?)
    }

    /// Creates a client on top of a caller-provided HTTP client.
    pub fn with_client(config: Config, client: ReqwestClient) -> Result<Self> {
        let host = config.host.base_url()?;

        Ok(Self {
            signer: Signer::new(host, config.credentials, config.use_trial),
            poll: config.poll,
            client,
        })
    }

    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    #[must_use]
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Submits `requests` and returns the raw submit response.
    pub async fn submit_raw(&self, requests: &[TryOnRequest]) -> Result<ApiResponse> {
        self.call(
            SUBMIT_ENDPOINT,
            &SubmitBody {
                request_params: requests,
            },
        )
        .await
    }

    /// Submits `requests` and extracts the task handle.
    pub async fn submit(&self, requests: &[TryOnRequest]) -> Result<TaskHandle> {
        let response = self.submit_raw(requests).await?;
        let handle = TaskHandle::from_submit(&response)?;

        #[cfg(feature = "tracing")]
        match handle.task_id() {
            Some(task_id) => tracing::info!(task_id, "try-on task submitted"),
            None => tracing::warn!(
                body = response.body(),
                "submit response carried no task id"
            ),
        }

        Ok(handle)
    }

    /// Issues one status query for `handle`.
    pub async fn query(&self, handle: &TaskHandle) -> Result<ApiResponse> {
        self.call(RESULTS_ENDPOINT, handle).await
    }

    /// Polls until the task finishes, `interrupt` resolves, or a poll bound is hit.
    ///
    /// `interrupt` is watched both during queries and while waiting; when it
    /// fires the last response seen is returned. Transport and decoding
    /// errors end the loop with an error.
    pub async fn wait_for_result<W, I>(
        &self,
        handle: &TaskHandle,
        wait: &W,
        interrupt: I,
    ) -> Result<PollOutcome>
    where
        W: Wait + ?Sized,
        I: Future<Output = ()>,
    {
        let mut interrupt = pin!(interrupt);
        let started = Instant::now();
        let mut last: Option<ApiResponse> = None;
        let mut attempts: u32 = 0;

        loop {
            let response = tokio::select! {
                biased;
                () = &mut interrupt => return Ok(PollOutcome::Interrupted(last)),
                response = self.query(handle) => response?,
            };
            attempts = attempts.saturating_add(1);

            let status = TaskStatus::from_query(&response)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(task_id = handle.task_id(), attempts, %status, "task status");

            if status.is_finished() {
                return Ok(PollOutcome::Finished(response));
            }
            last = Some(response);

            if self.poll.attempts_exhausted(attempts) || self.poll.timed_out(started.elapsed()) {
                #[cfg(feature = "tracing")]
                tracing::warn!(task_id = handle.task_id(), attempts, "poll bound reached");

                return Ok(PollOutcome::Exhausted(last));
            }

            tokio::select! {
                biased;
                () = &mut interrupt => return Ok(PollOutcome::Interrupted(last)),
                () = wait.wait(attempts) => {}
            }
        }
    }

    /// Submits `requests`, then polls the resulting task.
    pub async fn submit_and_wait<W, I>(
        &self,
        requests: &[TryOnRequest],
        wait: &W,
        interrupt: I,
    ) -> Result<PollOutcome>
    where
        W: Wait + ?Sized,
        I: Future<Output = ()>,
    {
        let handle = self.submit(requests).await?;
        self.wait_for_result(&handle, wait, interrupt).await
    }

    /// Submits and polls with the configured interval, stopping early on Ctrl-C.
    pub async fn run(&self, requests: &[TryOnRequest]) -> Result<PollOutcome> {
        let wait = self.poll.wait();
        self.submit_and_wait(requests, &wait, ctrl_c()).await
    }

    async fn call<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<ApiResponse> {
        let body = serde_json::to_vec(body)?;
        let request = self.signer.sign(endpoint, body)?.into_request(&self.client)?;

        crate::request(&self.client, request).await
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            tracing::info!("interrupt received, stopping poll loop");
        }
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "unable to listen for ctrl-c");
            #[cfg(not(feature = "tracing"))]
            drop(e);

            std::future::pending::<()>().await;
        }
    }
}
