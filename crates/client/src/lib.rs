//! Jenkins REST client and job tracking state machine.
//!
//! [`tracker::JobTracker`] drives one job from trigger to terminal
//! outcome: submit, wait for the queue item to become a build, optionally
//! stream the console, resolve the build result and hand the outcome plus
//! a link attachment to the [`host::TaskHost`].

pub mod api;
pub mod host;
pub mod messages;
pub mod poll;
pub mod session;
pub mod tracker;
