//! Domain logic for queueing and tracking Jenkins jobs.
//!
//! Everything in this crate is pure: parameter parsing, result code
//! mapping, outcome construction and link naming. Network and file I/O
//! live in `jenkins-queue-client`.

pub mod error;
pub mod link;
pub mod outcome;
pub mod parameters;
pub mod result_code;
pub mod types;
