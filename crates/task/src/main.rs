//! `jenkins-queue` -- queue a Jenkins job and track it to completion.
//!
//! Reads its inputs from the environment (see
//! [`TaskConfig`](jenkins_queue_task::config::TaskConfig)), relays the
//! job's console to stdout, and reports the outcome with Azure Pipelines
//! logging commands. Exits non-zero when the task failed.

use std::process::ExitCode;

use anyhow::Context;
use jenkins_queue_client::api::JenkinsApi;
use jenkins_queue_client::host::{TaskHost, VsoHost};
use jenkins_queue_client::session::Session;
use jenkins_queue_client::tracker::JobTracker;
use jenkins_queue_core::outcome::Outcome;
use jenkins_queue_task::config::TaskConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn load_session() -> anyhow::Result<Session> {
    let config = TaskConfig::from_env().context("Invalid task configuration")?;
    tracing::debug!(
        server_url = %config.server_url,
        job = %config.job_name,
        parameterized = config.parameterized,
        capture_console = config.capture_console,
        "Task configuration loaded",
    );
    let session = config.session()?;
    Ok(session)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jenkins_queue=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let host = VsoHost::stdout();

    let session = match load_session() {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Cannot start Jenkins job");
            host.set_result(&Outcome::failed(format!("{e:#}")));
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping job tracking");
            ctrl_c.cancel();
        }
    });

    let api = JenkinsApi::for_session(&session);
    let tracker = JobTracker::with_cancellation(session, api, host, cancel);
    let outcome = tracker.run().await;

    if outcome.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
