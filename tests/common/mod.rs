//! Integration Test Utilities and Common Code

#![allow(dead_code)]

pub use assert_cmd::prelude::*;
pub use assert_fs::prelude::*;
pub use assert_fs::{fixture::ChildPath, TempDir};
pub use predicates::prelude::*;
pub use predicates::str::RegexPredicate;
pub use pretty_assertions::{assert_eq, assert_ne};
pub use serde_json::json;
pub use std::path::Path;
pub use std::process::Command;
pub use wiremock::matchers::{body_partial_json, method, path, query_param};
pub use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a `Command` for the `ghas-cli` crate binary with variadic command-line arguments.
///
/// The arguments can be anything that is allowed by `Command::arg`.
#[macro_export]
macro_rules! ghas_cli {
    ( $( $arg:expr ),* ) => {
        {
            let mut cmd = ghas_cli_cmd();
            $(
                cmd.arg($arg);
            )*
            cmd
        }
    }
}

/// Build an `assert_cmd::assert::Assert` by calling `ghas_cli!(args).assert().success()`.
#[macro_export]
macro_rules! ghas_cli_success {
    ( $( $arg:expr ),* ) => { ghas_cli!($( $arg ),*).assert().success() }
}

/// Build an `assert_cmd::assert::Assert` by calling `ghas_cli!(args).assert().failure()`.
#[macro_export]
macro_rules! ghas_cli_failure {
    ( $( $arg:expr ),* ) => { ghas_cli!($( $arg ),*).assert().failure() }
}

// make macros easily visible to other modules
pub use {ghas_cli, ghas_cli_failure, ghas_cli_success};

/// An address nothing listens on; any request sent there fails.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9/";

/// Build a `Command` for the `ghas-cli` crate binary.
///
/// The environment is scrubbed of anything that would change its behavior, and no delays are
/// configured so that runs against a mock server are quick.
pub fn ghas_cli_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ghas-cli").expect("ghas-cli should be executable");
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GHAS_LOG")
        .env("NO_COLOR", "1")
        .args(["--progress=never", "--request-delay-ms=0", "--rate-limit-fallback-secs=0"]);
    cmd
}

/// Build a `Command` pointed at a mock GitHub API.
pub fn ghas_cli_against(server: &MockServer) -> Command {
    let mut cmd = ghas_cli_cmd();
    cmd.args(["--github-api-url", &server.uri(), "--token", "t0ken"]);
    cmd
}

/// Create a `RegexPredicate` from the given pattern.
pub fn is_match(pat: &str) -> RegexPredicate {
    predicates::str::is_match(pat).expect("pattern should compile")
}

/// Run `cmd` to completion off the async runtime, so the mock server keeps answering.
pub async fn run_blocking(mut cmd: Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("ghas-cli should run"))
        .await
        .expect("blocking task should complete")
}
