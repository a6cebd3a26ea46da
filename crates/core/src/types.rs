/// Identity of a dequeued, executing Jenkins build.
///
/// Captured once, from the first queue poll that reports an executable,
/// and read by every later phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableRef {
    /// Name of the queued task (usually the job name).
    pub task_name: String,
    /// Build number assigned by Jenkins.
    pub number: u64,
    /// Absolute build URL, e.g. `http://host/job/x/12/`.
    pub url: String,
}
