//! Immutable per-run settings shared by every tracking phase.

use std::fmt;
use std::path::{Path, PathBuf};

use jenkins_queue_core::error::CoreError;
use jenkins_queue_core::parameters::JobParameters;

use crate::poll::PollConfig;

/// Basic authentication pair for the Jenkins server.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    /// Password or API token.
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the tracker needs to know before the first request.
///
/// `parameters` doubles as the parameterization flag: `Some` selects the
/// `buildWithParameters` endpoint even when the set is empty.
#[derive(Debug, Clone)]
pub struct Session {
    server_url: String,
    credentials: Credentials,
    job_name: String,
    parameters: Option<JobParameters>,
    capture_console: bool,
    poll: PollConfig,
    artifact_dir: PathBuf,
}

impl Session {
    /// Create an unparameterized session with console capture enabled,
    /// the default poll interval, and the OS temp dir for artifacts.
    pub fn new(
        server_url: impl Into<String>,
        credentials: Credentials,
        job_name: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let server_url = server_url.into();
        let job_name = job_name.into();

        if server_url.trim().is_empty() {
            return Err(CoreError::Validation("server URL must not be empty".into()));
        }
        if job_name.trim().is_empty() {
            return Err(CoreError::Validation("job name must not be empty".into()));
        }

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            credentials,
            job_name,
            parameters: None,
            capture_console: true,
            poll: PollConfig::default(),
            artifact_dir: std::env::temp_dir(),
        })
    }

    pub fn with_parameters(mut self, parameters: JobParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_console(mut self, capture_console: bool) -> Self {
        self.capture_console = capture_console;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Base URL without a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn parameters(&self) -> Option<&JobParameters> {
        self.parameters.as_ref()
    }

    pub fn is_parameterized(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn capture_console(&self) -> bool {
        self.capture_console
    }

    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}
