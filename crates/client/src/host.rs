//! Interface to the task runner hosting the tracker.
//!
//! The tracker never prints or exits on its own. Console text, the link
//! attachment and the final status all go through [`TaskHost`].
//! [`VsoHost`] speaks the Azure Pipelines logging-command protocol on a
//! writer (stdout in production).

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use jenkins_queue_core::outcome::Outcome;

/// Attachment type Azure Pipelines renders on the build summary page.
pub const SUMMARY_ATTACHMENT_TYPE: &str = "Distributedtask.Core.Summary";

/// Where the tracker's user-visible side effects go.
pub trait TaskHost: Send + Sync {
    /// Relay text to the caller's output stream, unchanged and in order.
    fn write_console(&self, text: &str);

    /// Surface a file as a titled attachment.
    fn add_attachment(&self, title: &str, path: &Path);

    /// Report the session's single terminal status and message.
    fn set_result(&self, outcome: &Outcome);
}

/// [`TaskHost`] emitting `##vso[...]` logging commands.
pub struct VsoHost<W: Write + Send> {
    out: Mutex<W>,
}

impl VsoHost<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> VsoHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer, e.g. to inspect what was emitted.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to write to task output");
        }
    }
}

impl<W: Write + Send> TaskHost for VsoHost<W> {
    fn write_console(&self, text: &str) {
        self.emit(text);
    }

    fn add_attachment(&self, title: &str, path: &Path) {
        self.emit(&format!(
            "##vso[task.addattachment type={SUMMARY_ATTACHMENT_TYPE};name={};]{}\n",
            escape_property(title),
            escape_data(&path.display().to_string()),
        ));
    }

    fn set_result(&self, outcome: &Outcome) {
        self.emit(&format!(
            "##vso[task.complete result={};]{}\n",
            outcome.status,
            escape_data(&outcome.message),
        ));
    }
}

/// Escape a logging-command message so it stays on one line.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a logging-command property value.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(';', "%3B").replace(']', "%5D")
}
