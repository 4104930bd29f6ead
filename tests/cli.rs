//! Tests for the `ghas-cli` command-line surface that need no network

mod common;
use common::*;

#[test]
fn no_args() {
    ghas_cli!().assert().failure().code(2);
}

#[test]
fn help() {
    ghas_cli_success!("--help")
        .stdout(predicate::str::contains("repositories"))
        .stdout(predicate::str::contains("security-configs"));
}

#[test]
fn version() {
    ghas_cli_success!("--version").stdout(is_match(r"^ghas-cli \d+\.\d+\.\d+"));
}

#[test]
fn mass_help_lists_steps() {
    ghas_cli_success!("mass", "--help")
        .stdout(predicate::str::contains("close-mend-issues"))
        .stdout(predicate::str::contains("dependency-export"));
}

#[test]
fn repository_path_traversal_is_rejected() {
    for name in ["../etc", "/etc/passwd"] {
        ghas_cli_failure!(
            "--github-api-url",
            UNREACHABLE_API,
            "repositories",
            "details",
            "--org",
            "Acme",
            format!("--repository={name}")
        )
        .code(2)
        .stderr(predicate::str::contains("path traversal sequences are not allowed"));
    }
}

#[test]
fn organization_hyphens_are_rejected() {
    for name in ["-bad-", "bad-"] {
        ghas_cli_failure!(
            "--github-api-url",
            UNREACHABLE_API,
            "repositories",
            "list",
            format!("--org={name}")
        )
        .code(2)
        .stderr(predicate::str::contains("cannot start or end with a hyphen"));
    }
}

#[test]
fn team_slug_traversal_is_rejected() {
    ghas_cli_failure!(
        "--github-api-url",
        UNREACHABLE_API,
        "teams",
        "repositories",
        "--org",
        "Acme",
        "--team=.."
    )
    .stderr(predicate::str::contains("path traversal"));
}

#[test]
fn unknown_step_is_rejected() {
    let input = TempDir::new().unwrap();
    let list = input.child("repos.txt");
    list.write_str("demo\n").unwrap();

    ghas_cli_failure!("mass", "--org", "Acme", "--input", list.path(), "everything")
        .code(2)
        .stderr(predicate::str::contains("unknown step"));
}

#[test]
fn mass_with_empty_list() {
    let input = TempDir::new().unwrap();
    let list = input.child("repos.txt");
    list.write_str("# nothing here\n\n").unwrap();

    ghas_cli_failure!(
        "--github-api-url",
        UNREACHABLE_API,
        "mass",
        "--org",
        "Acme",
        "--input",
        list.path(),
        "archive"
    )
    .code(2)
    .stderr(predicate::str::contains("No repositories listed"));
}

#[test]
fn mass_with_missing_list() {
    let input = TempDir::new().unwrap();
    ghas_cli_failure!(
        "mass",
        "--org",
        "Acme",
        "--input",
        input.child("missing.txt").path(),
        "archive"
    )
    .stderr(predicate::str::contains("Failed to open repository list"));
}

#[test]
fn unreachable_api_is_reported() {
    ghas_cli_failure!(
        "--github-api-url",
        UNREACHABLE_API,
        "--retries=1",
        "repositories",
        "topics",
        "--org",
        "Acme",
        "--repository",
        "demo"
    )
    .code(2)
    .stderr(predicate::str::contains("Failed to list topics of Acme/demo"));
}

#[test]
fn code_scanning_needs_repositories_or_all() {
    ghas_cli_failure!("alerts", "code-scanning", "--org", "Acme")
        .code(2)
        .stderr(predicate::str::contains("--repository"));

    ghas_cli_failure!("alerts", "code-scanning", "--org", "Acme", "-r", "web", "--all")
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}
