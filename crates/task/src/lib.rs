//! `jenkins-queue` library crate.
//!
//! Exposes configuration loading for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
