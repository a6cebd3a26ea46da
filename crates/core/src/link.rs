//! Naming and content of the build link attachment.

use crate::types::ExecutableRef;

/// Deterministic file name: `JenkinsJob_<task>_<number>.md`.
pub fn link_file_name(executable: &ExecutableRef) -> String {
    format!(
        "JenkinsJob_{}_{}.md",
        executable.task_name, executable.number
    )
}

/// Summary title: `Jenkins <task> - <number> - <jobStatus>`.
pub fn summary_title(executable: &ExecutableRef, job_status: &str) -> String {
    format!(
        "Jenkins {} - {} - {job_status}",
        executable.task_name, executable.number
    )
}

/// Markdown link whose text and target are both the build URL.
pub fn markdown_link(url: &str) -> String {
    format!("[{url}]({url})")
}
