//! # drydock-gerrit
//!
//! Review-server client. The engine depends only on the [`GerritClient`]
//! trait so reconciliation logic is testable against a fake; [`SshClient`]
//! is the production implementation driving the server's SSH command
//! interface.

pub mod client;
pub mod error;

pub use client::{GerritClient, SshClient};
pub use error::GerritError;
