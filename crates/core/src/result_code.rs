//! Jenkins build result codes.
//!
//! Codes mirror the fields of `hudson.model.Result`. Unknown codes are
//! passed through untouched so a newer Jenkins never breaks resolution.

use crate::outcome::TaskStatus;

/// A terminal build result as reported by `<build>/api/json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    /// Any code outside the known vocabulary, kept exactly as received.
    Other(String),
}

impl ResultCode {
    /// Classify a raw code. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "UNSTABLE" => Self::Unstable,
            "FAILURE" => Self::Failure,
            "NOT_BUILT" => Self::NotBuilt,
            "ABORTED" => Self::Aborted,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Human-readable label used in the summary title.
    pub fn label(&self) -> &str {
        match self {
            Self::Success => "Success",
            Self::Unstable => "Unstable",
            Self::Failure => "Failure",
            Self::NotBuilt => "Not built",
            Self::Aborted => "Aborted",
            Self::Other(code) => code,
        }
    }

    /// `SUCCESS` and `UNSTABLE` count as a succeeded task; everything
    /// else fails it.
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Success | Self::Unstable => TaskStatus::Succeeded,
            _ => TaskStatus::Failed,
        }
    }
}
