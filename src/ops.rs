//! Resource operations: one typed function per thing this tool does through the REST API.
//!
//! Every operation goes through [`Client::send_with_retry`](crate::github::Client::send_with_retry)
//! or a [`Paginator`](crate::github::Paginator), and takes validated names, so nothing here is
//! reached with a name that could escape its URL path segment.
//!
//! Failures come back as `github::Error` values. Callers that process many repositories turn those
//! into per-repository outcomes instead of stopping.

pub mod actions;
pub mod alerts;
pub mod code_security;
pub mod features;
pub mod issues;
pub mod repositories;
pub mod roles;
pub mod teams;
