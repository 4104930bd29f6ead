//! Plumbing for the GitHub REST API.
//!
//! The [`Client`] is the transport: it attaches the GitHub headers to every request, reads the
//! whole response, and applies the rate-limit policy before handing the response back. The retry
//! policy ([`Client::send_with_retry`]) and the [`Paginator`] are built on top of it, and every
//! resource operation in [`crate::ops`] goes through one of those two.

mod auth;
mod client;
mod client_builder;
mod config;
mod disposition;
mod error;
pub mod models;
mod paginator;
mod rate_limit;
mod request;
mod result;
mod retry;

pub use auth::Auth;
pub use client::Client;
pub use client_builder::ClientBuilder;
pub use config::ClientConfig;
pub use disposition::Disposition;
pub use error::Error;
pub use paginator::{Collected, Paginator};
pub use rate_limit::RateLimitState;
pub use request::{ApiRequest, ApiResponse};
pub use result::Result;

/// Build a single-threaded async runtime for driving the client.
///
/// Everything this tool does is strictly sequential, so a current-thread runtime is all that is
/// needed; blocking on it is the intended back-pressure mechanism when rate limits kick in.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    use anyhow::Context;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to initialize async runtime")
}
