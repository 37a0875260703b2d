//! Change Feed End-to-End Tests
//!
//! Exercises the public service against the in-memory backend:
//! - scenarios: fixed watermark layouts and their derived states
//! - versions: dispatch, rolling upgrades and version-specific contracts
//! - failures: cancellation, unavailable storage, bad configuration

#[path = "../common/mod.rs"]
mod common;

mod failures;
mod scenarios;
mod versions;
