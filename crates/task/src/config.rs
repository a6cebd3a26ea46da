use std::path::PathBuf;
use std::time::Duration;

use jenkins_queue_client::poll::{PollConfig, DEFAULT_POLL_INTERVAL};
use jenkins_queue_client::session::{Credentials, Session};
use jenkins_queue_core::error::CoreError;
use jenkins_queue_core::parameters::parse_job_parameters;

pub const ENV_URL: &str = "JENKINS_URL";
pub const ENV_USERNAME: &str = "JENKINS_USERNAME";
pub const ENV_PASSWORD: &str = "JENKINS_PASSWORD";
pub const ENV_JOB_NAME: &str = "JENKINS_JOB_NAME";
pub const ENV_CAPTURE_CONSOLE: &str = "JENKINS_CAPTURE_CONSOLE";
pub const ENV_PARAMETERIZED_JOB: &str = "JENKINS_PARAMETERIZED_JOB";
pub const ENV_JOB_PARAMETERS: &str = "JENKINS_JOB_PARAMETERS";
pub const ENV_POLL_INTERVAL_MS: &str = "JENKINS_POLL_INTERVAL_MS";
pub const ENV_POLL_TIMEOUT_SECS: &str = "JENKINS_POLL_TIMEOUT_SECS";
pub const ENV_ARTIFACT_DIR: &str = "JENKINS_ARTIFACT_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Task inputs loaded from environment variables.
///
/// | Env Var                     | Required | Default       |
/// |-----------------------------|----------|---------------|
/// | `JENKINS_URL`               | yes      | --            |
/// | `JENKINS_USERNAME`          | yes      | --            |
/// | `JENKINS_PASSWORD`          | yes      | --            |
/// | `JENKINS_JOB_NAME`          | yes      | --            |
/// | `JENKINS_CAPTURE_CONSOLE`   | no       | `true`        |
/// | `JENKINS_PARAMETERIZED_JOB` | no       | `false`       |
/// | `JENKINS_JOB_PARAMETERS`    | no       | empty         |
/// | `JENKINS_POLL_INTERVAL_MS`  | no       | `5000`, > 0   |
/// | `JENKINS_POLL_TIMEOUT_SECS` | no       | unbounded     |
/// | `JENKINS_ARTIFACT_DIR`      | no       | OS temp dir   |
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub server_url: String,
    pub credentials: Credentials,
    pub job_name: String,
    pub capture_console: bool,
    pub parameterized: bool,
    /// Raw newline-delimited `name=value` lines.
    pub job_parameters: String,
    pub poll: PollConfig,
    pub artifact_dir: Option<PathBuf>,
}

impl TaskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let capture_console = match get(ENV_CAPTURE_CONSOLE) {
            Some(v) => parse_bool(ENV_CAPTURE_CONSOLE, &v)?,
            None => true,
        };
        let parameterized = match get(ENV_PARAMETERIZED_JOB) {
            Some(v) => parse_bool(ENV_PARAMETERIZED_JOB, &v)?,
            None => false,
        };

        let interval = match get(ENV_POLL_INTERVAL_MS) {
            Some(v) => match parse_number(ENV_POLL_INTERVAL_MS, &v)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        var: ENV_POLL_INTERVAL_MS,
                        value: v,
                        reason: "must be greater than zero".into(),
                    })
                }
                ms => Duration::from_millis(ms),
            },
            None => DEFAULT_POLL_INTERVAL,
        };
        let timeout = get(ENV_POLL_TIMEOUT_SECS)
            .map(|v| parse_number(ENV_POLL_TIMEOUT_SECS, &v).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            server_url: required(ENV_URL)?,
            credentials: Credentials::new(required(ENV_USERNAME)?, required(ENV_PASSWORD)?),
            job_name: required(ENV_JOB_NAME)?,
            capture_console,
            parameterized,
            job_parameters: get(ENV_JOB_PARAMETERS).unwrap_or_default(),
            poll: PollConfig { interval, timeout },
            artifact_dir: get(ENV_ARTIFACT_DIR).map(PathBuf::from),
        })
    }

    /// Build the tracking session. Parameter lines are parsed here, so a
    /// malformed line fails before any request is made.
    pub fn session(&self) -> Result<Session, CoreError> {
        let mut session = Session::new(
            self.server_url.clone(),
            self.credentials.clone(),
            self.job_name.clone(),
        )?
        .with_console(self.capture_console)
        .with_poll(self.poll);

        if self.parameterized {
            session = session.with_parameters(parse_job_parameters(&self.job_parameters)?);
        }
        if let Some(dir) = &self.artifact_dir {
            session = session.with_artifact_dir(dir);
        }
        Ok(session)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
