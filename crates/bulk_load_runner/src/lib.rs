//! AWS-oriented adapters and orchestration handlers for asset hierarchy
//! provisioning and historical bulk loads.
//!
//! Handlers are synchronous and talk to the remote services only through the
//! ports in [`adapters`], so every step can be exercised with in-memory fakes.
//! The `sitewise_bulk` binary wires the ports to the AWS SDK.

pub mod adapters;
pub mod error;
pub mod handlers;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
