//! Job tracking state machine.
//!
//! ```text
//!  Submitting ──► Tracking ──(no console)──────────────► Done
//!                  │ ▲ waiting                            ▲
//!                  │ └──┘                                 │
//!                  ▼                                      │
//!              Streaming ──(x-more-data != "true")──► Resolving
//!                │ ▲ more data                          │ ▲ no result yet
//!                └─┘                                    └─┘
//! ```
//!
//! [`JobTracker::run`] advances one state per request. A state that has
//! to ask again sleeps one poll interval and returns itself, so exactly
//! one request is outstanding at any time and no phase is re-entered once
//! left. Every path ends in exactly one [`Outcome`] reported to the host.

use jenkins_queue_core::link::{link_file_name, markdown_link, summary_title};
use jenkins_queue_core::outcome::Outcome;
use jenkins_queue_core::types::ExecutableRef;
use tokio_util::sync::CancellationToken;

use crate::api::{JenkinsApiError, JobServer};
use crate::host::TaskHost;
use crate::messages::QueueState;
use crate::poll::{PollInterrupted, Poller};
use crate::session::Session;

/// Position of a session in the tracking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// The trigger request has not been sent yet.
    Submitting,
    /// Waiting for the queue item at `queue_url` to become a build.
    Tracking { queue_url: String },
    /// Relaying console text from `offset`.
    Streaming {
        executable: ExecutableRef,
        offset: u64,
    },
    /// Waiting for the build result.
    Resolving { executable: ExecutableRef },
    /// Terminal. The outcome has been through the finish step if a build
    /// was ever identified.
    Done(Outcome),
}

impl TrackerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitting => "submitting",
            Self::Tracking { .. } => "tracking",
            Self::Streaming { .. } => "streaming",
            Self::Resolving { .. } => "resolving",
            Self::Done(_) => "done",
        }
    }
}

/// Everything that ends a session before a build result is known.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Api(#[from] JenkinsApiError),

    #[error("Jenkins job canceled.")]
    Canceled,

    #[error(transparent)]
    Interrupted(#[from] PollInterrupted),
}

impl TrackError {
    pub fn into_outcome(self) -> Outcome {
        match self {
            Self::Canceled => Outcome::canceled(),
            other => Outcome::failed(other.to_string()),
        }
    }
}

/// Drives a single [`Session`] against a [`JobServer`], reporting to a
/// [`TaskHost`].
pub struct JobTracker<S, H> {
    session: Session,
    server: S,
    host: H,
    poller: Poller,
}

impl<S: JobServer, H: TaskHost> JobTracker<S, H> {
    pub fn new(session: Session, server: S, host: H) -> Self {
        Self::with_cancellation(session, server, host, CancellationToken::new())
    }

    /// Like [`new`](Self::new), stopping early once `cancel` fires.
    pub fn with_cancellation(
        session: Session,
        server: S,
        host: H,
        cancel: CancellationToken,
    ) -> Self {
        let poller = Poller::new(*session.poll(), cancel);
        Self {
            session,
            server,
            host,
            poller,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run the session to completion and report its outcome to the host.
    pub async fn run(&self) -> Outcome {
        let mut state = TrackerState::Submitting;
        loop {
            state = match self.step(state).await {
                Ok(TrackerState::Done(outcome)) => {
                    tracing::info!(
                        job = %self.session.job_name(),
                        status = %outcome.status,
                        label = %outcome.label,
                        "Jenkins job tracking finished",
                    );
                    self.host.set_result(&outcome);
                    return outcome;
                }
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(
                        job = %self.session.job_name(),
                        error = %e,
                        "Jenkins job tracking failed",
                    );
                    let outcome = e.into_outcome();
                    self.host.set_result(&outcome);
                    return outcome;
                }
            };
        }
    }

    /// Perform the single request belonging to `state` and return the
    /// state that follows it.
    pub async fn step(&self, state: TrackerState) -> Result<TrackerState, TrackError> {
        tracing::trace!(state = state.name(), "Tracker step");
        match state {
            TrackerState::Submitting => self.submit().await,
            TrackerState::Tracking { queue_url } => self.track_queue(queue_url).await,
            TrackerState::Streaming { executable, offset } => {
                self.stream_console(executable, offset).await
            }
            TrackerState::Resolving { executable } => self.resolve_result(executable).await,
            TrackerState::Done(outcome) => Ok(TrackerState::Done(outcome)),
        }
    }

    // ---- phases ----

    async fn submit(&self) -> Result<TrackerState, TrackError> {
        let queue_url = self
            .poller
            .guard(
                self.server
                    .trigger(self.session.job_name(), self.session.parameters()),
            )
            .await??;

        tracing::info!(
            job = %self.session.job_name(),
            queue_url = %queue_url,
            "Jenkins job queued",
        );
        self.host.write_console("Jenkins job queued\n");
        Ok(TrackerState::Tracking { queue_url })
    }

    async fn track_queue(&self, queue_url: String) -> Result<TrackerState, TrackError> {
        tracing::debug!(url = %queue_url, "Tracking progress of job queue");
        let entry = self
            .poller
            .guard(self.server.queue_entry(&queue_url))
            .await??;

        let state = entry
            .state()
            .map_err(|detail| JenkinsApiError::MalformedResponse {
                url: queue_url.clone(),
                detail,
            })?;

        match state {
            QueueState::Cancelled => Err(TrackError::Canceled),
            QueueState::Waiting => {
                self.poller.wait().await?;
                Ok(TrackerState::Tracking { queue_url })
            }
            QueueState::Dequeued(executable) => {
                tracing::info!(
                    task = %executable.task_name,
                    number = executable.number,
                    url = %executable.url,
                    "Jenkins job started",
                );
                self.host
                    .write_console(&format!("Jenkins job started: {}\n", executable.url));

                if self.session.capture_console() {
                    Ok(TrackerState::Streaming {
                        executable,
                        offset: 0,
                    })
                } else {
                    let outcome = Outcome::queued(&executable.url);
                    Ok(self.finish(&executable, outcome).await)
                }
            }
        }
    }

    async fn stream_console(
        &self,
        executable: ExecutableRef,
        offset: u64,
    ) -> Result<TrackerState, TrackError> {
        tracing::debug!(url = %executable.url, offset, "Reading job console");
        let chunk = self
            .poller
            .guard(self.server.console_chunk(&executable.url, offset))
            .await??;

        if !chunk.text.is_empty() {
            self.host.write_console(&chunk.text);
        }

        match (chunk.has_more, chunk.next_offset) {
            (true, Some(next_offset)) => {
                self.poller.wait().await?;
                Ok(TrackerState::Streaming {
                    executable,
                    offset: next_offset,
                })
            }
            _ => Ok(TrackerState::Resolving { executable }),
        }
    }

    async fn resolve_result(&self, executable: ExecutableRef) -> Result<TrackerState, TrackError> {
        tracing::debug!(url = %executable.url, "Tracking completion status of job");
        let result = self
            .poller
            .guard(self.server.job_result(&executable.url))
            .await??;

        let Some(code) = result.code() else {
            self.poller.wait().await?;
            return Ok(TrackerState::Resolving { executable });
        };

        let outcome = Outcome::from_result(code, self.session.job_name(), &executable.url);
        tracing::debug!(
            url = %executable.url,
            result_code = %code,
            label = %outcome.label,
            "Jenkins job result resolved",
        );
        Ok(self.finish(&executable, outcome).await)
    }

    /// Write the link file and attach it. A failed write is logged and
    /// leaves the outcome untouched.
    async fn finish(&self, executable: &ExecutableRef, outcome: Outcome) -> TrackerState {
        let path = self
            .session
            .artifact_dir()
            .join(link_file_name(executable));
        let title = summary_title(executable, &outcome.label);
        tracing::debug!(path = %path.display(), title = %title, "Writing Jenkins link");

        match tokio::fs::write(&path, markdown_link(&executable.url)).await {
            Ok(()) => self.host.add_attachment(&title, &path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write Jenkins link");
                self.host
                    .write_console(&format!("Error creating link to Jenkins job: {e}\n"));
            }
        }

        TrackerState::Done(outcome)
    }
}
