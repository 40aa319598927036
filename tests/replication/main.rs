//! Replication integration tests.
//!
//! Everything runs through the in-memory broker; no network.

mod support;
mod scenarios;
mod verification;
