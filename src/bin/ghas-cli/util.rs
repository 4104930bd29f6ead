use anyhow::{Context, Result};
use std::future::Future;
use tracing::debug;

use ghas::github::{self, Client, ClientBuilder};

use crate::args::GlobalArgs;

/// Build a GitHub client from the global options.
pub fn client(global_args: &GlobalArgs) -> Result<Client> {
    let github = &global_args.github;
    let mut builder = ClientBuilder::new()
        .base_url(github.github_api_url.clone())
        .context("Failed to set GitHub API URL")?
        .config(github.client_config())
        .ignore_certs(github.ignore_certs);

    match &github.token {
        Some(token) => {
            debug!("Using GitHub token from the command line or environment");
            builder = builder.token(token.clone());
        }
        None => debug!("No GitHub token provided; using unauthenticated API access"),
    }

    builder.build().context("Failed to initialize GitHub client")
}

/// Drive `future` to completion on a fresh single-threaded runtime.
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = github::runtime()?;
    runtime.block_on(future)
}
