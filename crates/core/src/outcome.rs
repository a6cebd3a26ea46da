//! Terminal outcome of a tracking session.

use std::fmt;

use crate::result_code::ResultCode;

/// Overall task status reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label used when a session ends before a build result is known.
pub const LABEL_FAILED: &str = "Failed";

/// Label used when Jenkins cancels the queue item.
pub const LABEL_CANCELED: &str = "Canceled";

/// Label used when console capture is off and the job was only queued.
pub const LABEL_QUEUED: &str = "Queued";

/// The single result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: TaskStatus,
    /// Short job status shown in the summary title.
    pub label: String,
    /// Message handed to the host together with the status.
    pub message: String,
}

impl Outcome {
    /// The job left the queue and console capture is disabled.
    pub fn queued(executable_url: &str) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            label: LABEL_QUEUED.to_string(),
            message: format!("Jenkins job successfully queued: {executable_url}"),
        }
    }

    /// Jenkins reported a terminal result for the build.
    pub fn from_result(raw_code: &str, job_name: &str, executable_url: &str) -> Self {
        let code = ResultCode::parse(raw_code);
        Self {
            status: code.status(),
            label: code.label().to_string(),
            message: format!(
                "Jenkins job: {} {job_name} {executable_url}",
                raw_code.to_uppercase()
            ),
        }
    }

    /// Jenkins cancelled the queue item before it ran.
    pub fn canceled() -> Self {
        Self {
            status: TaskStatus::Failed,
            label: LABEL_CANCELED.to_string(),
            message: "Jenkins job canceled.".to_string(),
        }
    }

    /// Any fatal error: input, transport or unexpected response.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            label: LABEL_FAILED.to_string(),
            message: message.into(),
        }
    }
}
