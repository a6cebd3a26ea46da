//! REST API client for the Jenkins HTTP endpoints.
//!
//! Wraps the four endpoints the tracker needs (trigger, queue item,
//! progressive console, build result) using [`reqwest`], and defines the
//! [`JobServer`] seam the tracker is written against.

use async_trait::async_trait;
use jenkins_queue_core::parameters::JobParameters;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;

use crate::messages::{
    parse_job_result, parse_queue_entry, ConsoleChunk, JobResult, QueueEntry, HEADER_MORE_DATA,
    HEADER_TEXT_SIZE,
};
use crate::session::{Credentials, Session};

/// Suffix appended to queue and build URLs to reach their JSON view.
pub const API_JSON_SUFFIX: &str = "api/json";

/// Errors from the Jenkins REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum JenkinsApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Jenkins answered with a status other than the one the phase expects.
    #[error(
        "{context}\nHttpResponse.statusCode={status}\nHttpResponse.statusMessage={reason}\nHttpResponse=\n{response}"
    )]
    UnexpectedStatus {
        /// What the request was trying to do.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
        /// Status line, headers and body, for diagnosis.
        response: String,
    },

    /// The response had the right status but could not be interpreted.
    #[error("Malformed response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },
}

/// The requests the tracker issues, one at a time.
///
/// [`JenkinsApi`] is the production implementation; tests script their own.
#[async_trait]
pub trait JobServer: Send + Sync {
    /// Queue a build and return the queue item's JSON URL.
    async fn trigger(
        &self,
        job_name: &str,
        parameters: Option<&JobParameters>,
    ) -> Result<String, JenkinsApiError>;

    /// Read the queue item at `queue_url`.
    async fn queue_entry(&self, queue_url: &str) -> Result<QueueEntry, JenkinsApiError>;

    /// Read console text of the build at `executable_url` from `offset`.
    async fn console_chunk(
        &self,
        executable_url: &str,
        offset: u64,
    ) -> Result<ConsoleChunk, JenkinsApiError>;

    /// Read the build's result.
    async fn job_result(&self, executable_url: &str) -> Result<JobResult, JenkinsApiError>;
}

/// Build the trigger URL for a job.
///
/// `delay=0sec` skips the job's configured quiet period.
pub fn trigger_url(server_url: &str, job_name: &str, parameterized: bool) -> String {
    let endpoint = if parameterized {
        "buildWithParameters"
    } else {
        "build"
    };
    format!(
        "{}/job/{job_name}/{endpoint}?delay=0sec",
        server_url.trim_end_matches('/')
    )
}

/// Progressive console URL for a build starting at `offset`.
pub fn console_url(executable_url: &str, offset: u64) -> String {
    format!(
        "{}/logText/progressiveText/?start={offset}",
        executable_url.trim_end_matches('/')
    )
}

/// JSON view of a queue item or build, given its absolute URL.
///
/// Jenkins hands out these URLs with a trailing slash; one is inserted if
/// it is missing.
pub fn api_json_url(url: &str) -> String {
    if url.ends_with('/') {
        format!("{url}{API_JSON_SUFFIX}")
    } else {
        format!("{url}/{API_JSON_SUFFIX}")
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// HTTP client for a single Jenkins server.
pub struct JenkinsApi {
    client: reqwest::Client,
    server_url: String,
    credentials: Credentials,
}

impl JenkinsApi {
    /// Create an API client for the server and credentials of `session`.
    pub fn for_session(session: &Session) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: session.server_url().to_string(),
            credentials: session.credentials().clone(),
        }
    }

    // ---- private helpers ----

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).basic_auth(
            &self.credentials.username,
            Some(&self.credentials.password),
        )
    }

    /// Return the response unchanged when its status is `expected`,
    /// otherwise an [`JenkinsApiError::UnexpectedStatus`] carrying the
    /// full response.
    async fn expect_status(
        response: reqwest::Response,
        expected: StatusCode,
        context: &'static str,
    ) -> Result<reqwest::Response, JenkinsApiError> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }

        let mut dump = format!("{:?} {status}\n", response.version());
        for (name, value) in response.headers() {
            dump.push_str(&format!(
                "{name}: {}\n",
                value.to_str().unwrap_or("<non-ascii>")
            ));
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        dump.push('\n');
        dump.push_str(&body);

        Err(JenkinsApiError::UnexpectedStatus {
            context,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            response: dump,
        })
    }

    /// GET `url` and require 200.
    async fn get_ok(
        &self,
        url: &str,
        context: &'static str,
    ) -> Result<reqwest::Response, JenkinsApiError> {
        let response = self.get(url).send().await?;
        Self::expect_status(response, StatusCode::OK, context).await
    }
}

#[async_trait]
impl JobServer for JenkinsApi {
    async fn trigger(
        &self,
        job_name: &str,
        parameters: Option<&JobParameters>,
    ) -> Result<String, JenkinsApiError> {
        let url = trigger_url(&self.server_url, job_name, parameters.is_some());
        tracing::debug!(url = %url, "Queueing Jenkins job");

        let mut request = self.client.post(&url).basic_auth(
            &self.credentials.username,
            Some(&self.credentials.password),
        );
        if let Some(parameters) = parameters {
            tracing::debug!(count = parameters.len(), "Sending job parameters");
            request = request.form(parameters.as_pairs());
        }

        let response = request.send().await?;
        let response =
            Self::expect_status(response, StatusCode::CREATED, "Job creation failed.").await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| JenkinsApiError::MalformedResponse {
                url: url.clone(),
                detail: "201 response without a Location header".into(),
            })?;

        Ok(api_json_url(location))
    }

    async fn queue_entry(&self, queue_url: &str) -> Result<QueueEntry, JenkinsApiError> {
        let body = self
            .get_ok(queue_url, "Job progress tracking failed to read job queue")
            .await?
            .text()
            .await?;
        parse_queue_entry(&body).map_err(|e| JenkinsApiError::MalformedResponse {
            url: queue_url.to_string(),
            detail: e.to_string(),
        })
    }

    async fn console_chunk(
        &self,
        executable_url: &str,
        offset: u64,
    ) -> Result<ConsoleChunk, JenkinsApiError> {
        let url = console_url(executable_url, offset);
        let response = self
            .get_ok(&url, "Job progress tracking failed to read job progress")
            .await?;
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        ConsoleChunk::from_parts(
            &body,
            header_str(&headers, HEADER_MORE_DATA),
            header_str(&headers, HEADER_TEXT_SIZE),
        )
        .map_err(|detail| JenkinsApiError::MalformedResponse { url, detail })
    }

    async fn job_result(&self, executable_url: &str) -> Result<JobResult, JenkinsApiError> {
        let url = api_json_url(executable_url);
        let body = self
            .get_ok(&url, "Job progress tracking failed to read job result")
            .await?
            .text()
            .await?;
        tracing::debug!(url = %url, body = %body, "Job result payload");
        parse_job_result(&body).map_err(|e| JenkinsApiError::MalformedResponse {
            url,
            detail: e.to_string(),
        })
    }
}
