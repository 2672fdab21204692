//! Reconciliation core and resource adapters for an AWS infrastructure-as-code
//! provider.
//!
//! - [`reconcile`] - ID codec, state waiter, XML diff suppression, tag reconciler
//! - [`aws`] - async seams for the remote service clients
//! - [`provider`] - typed resource adapters and the registry they live in
//! - [`config`] - persisted provider settings

pub mod aws;
pub mod config;
pub mod error;
pub mod provider;
pub mod reconcile;

pub use error::{Error, Result};
