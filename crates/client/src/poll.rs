//! Fixed-interval polling with cancellation and an optional deadline.
//!
//! Every tracking phase re-polls on the same interval until Jenkins
//! reports a terminal state. There is no backoff. By default there is no
//! deadline either; a [`PollConfig::timeout`] bounds the whole session and
//! a [`CancellationToken`] lets the caller stop it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Interval used by the Jenkins web UI for progressive console updates.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Tunable polling parameters shared by all phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two polls of the same endpoint.
    pub interval: Duration,
    /// Upper bound on the whole session, `None` polls forever.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Why a suspension point gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PollInterrupted {
    #[error("Job tracking was cancelled")]
    Cancelled,

    #[error("Job tracking timed out after {0:?}")]
    TimedOut(Duration),
}

/// Guards every suspension point of a session.
///
/// The deadline is fixed when the poller is created, so it covers time
/// spent waiting on responses as well as time spent sleeping.
pub struct Poller {
    config: PollConfig,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            // A timeout past the clock's range never fires.
            deadline: config.timeout.and_then(|t| Instant::now().checked_add(t)),
            config,
            cancel,
        }
    }

    /// Drive `fut` to completion unless the session is cancelled or its
    /// deadline passes first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, PollInterrupted> {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PollInterrupted::Cancelled),
            _ = deadline => Err(PollInterrupted::TimedOut(self.config.timeout.unwrap_or_default())),
            output = fut => Ok(output),
        }
    }

    /// Wait one interval before the next poll.
    pub async fn wait(&self) -> Result<(), PollInterrupted> {
        tracing::trace!(
            interval_ms = self.config.interval.as_millis() as u64,
            "Waiting before next poll",
        );
        self.guard(tokio::time::sleep(self.config.interval)).await
    }
}
