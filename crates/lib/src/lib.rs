//! Atypica inbound client library — settings, wire types, the gateway HTTP client,
//! and console reporting used by the `atypica-inbound` binary.

pub mod client;
pub mod config;
pub mod protocol;
pub mod report;
pub mod run;
