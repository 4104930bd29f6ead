//! The branch, commit, and pull request sequence used to roll out workflow files.
//!
//! A run goes through these stages, in order, and stops at the first one that fails:
//!
//! 1. `ResolveDefaultBranch`: read the repository's default branch.
//! 2. `CreateBranch`: find the commit the default branch points at and create the target branch
//!    there. A 422 means the branch exists already; the run carries on, framed as an update.
//! 3. `ResolveExistingFile`: for each file, look up its blob SHA on the target branch. A 404 just
//!    means the file is new.
//! 4. `CommitFile`: put each file on the target branch, passing the SHA when updating.
//! 5. `OpenPullRequest`: open a pull request from the target branch to the default branch.
//!
//! Nothing is rolled back on failure; a branch created by a failed run stays behind.

use base64::Engine;
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info};

use crate::github::models::{ContentFile, GitRef, PullRequest};
use crate::github::{self, ApiRequest, Client};
use crate::ops::repositories::{self, LanguageSelection};
use crate::templates;
use crate::validation::{BranchName, OrgName, RepoName};

pub const CODEQL_BRANCH: &str = "appsec-ghas-codeql_enable";
pub const DEPENDENCY_REVIEW_BRANCH: &str = "appsec-ghas-dep-enforcement-enable";

// -------------------------------------------------------------------------------------------------
// Stage
// -------------------------------------------------------------------------------------------------
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    ResolveDefaultBranch,
    CreateBranch,
    ResolveExistingFile,
    CommitFile,
    OpenPullRequest,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::ResolveDefaultBranch => "resolving the default branch",
            Stage::CreateBranch => "creating the branch",
            Stage::ResolveExistingFile => "looking up an existing file",
            Stage::CommitFile => "committing a file",
            Stage::OpenPullRequest => "opening the pull request",
        };
        write!(f, "{s}")
    }
}

// -------------------------------------------------------------------------------------------------
// WorkflowError
// -------------------------------------------------------------------------------------------------
#[derive(Debug)]
pub struct WorkflowError {
    pub stage: Stage,
    pub source: github::Error,
}

impl WorkflowError {
    fn at(stage: Stage) -> impl FnOnce(github::Error) -> Self {
        move |source| WorkflowError { stage, source }
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed {}: {}", self.stage, self.source)
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

// -------------------------------------------------------------------------------------------------
// BranchState
// -------------------------------------------------------------------------------------------------
/// How the target branch came to be; decides whether the pull request is framed as new or updated
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchState {
    Created,
    AlreadyExisted,
}

// -------------------------------------------------------------------------------------------------
// ChangeSet
// -------------------------------------------------------------------------------------------------
/// One file to put on the target branch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChange {
    /// Path within the repository, e.g., `.github/workflows/codeql.yml`
    pub path: String,
    pub content: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestText {
    pub title: String,
    pub body: String,
}

/// The files a workflow run commits, and how its pull request reads
pub trait ChangeSet {
    fn files(&self, default_branch: &str) -> Vec<FileChange>;

    fn pull_request(&self, org: &OrgName, repo: &RepoName, branch: BranchState) -> PullRequestText;
}

/// CodeQL workflow and configuration files, one pair per language
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeQlChangeSet {
    pub languages: Vec<String>,
}

impl ChangeSet for CodeQlChangeSet {
    fn files(&self, default_branch: &str) -> Vec<FileChange> {
        let mut files = Vec::new();
        let mut seen = std::collections::BTreeSet::new();
        for language in &self.languages {
            let workflow = templates::codeql_workflow(language, default_branch);
            if !seen.insert(workflow.language.clone()) {
                continue;
            }
            let config = templates::codeql_config(language);
            files.push(FileChange {
                path: format!(".github/workflows/codeql-analysis-{}.yml", workflow.language),
                content: workflow.content,
                message: format!("Enable CodeQL analysis for {language}"),
            });
            files.push(FileChange {
                path: format!(".github/codeql/codeql-config-{}.yml", config.language),
                content: config.content,
                message: format!("Enable CodeQL config file for {language}"),
            });
        }
        files
    }

    fn pull_request(&self, org: &OrgName, repo: &RepoName, branch: BranchState) -> PullRequestText {
        let languages = self.languages.join(", ");
        let lead = match branch {
            BranchState::Created => format!(
                "This PR creates the Security scanning (CodeQL) configuration files for your \
                 repository languages ({languages})."
            ),
            BranchState::AlreadyExisted => format!(
                "This PR updates the Security scanning (CodeQL) configuration files for your \
                 repository languages ({languages})."
            ),
        };
        PullRequestText {
            title: "Security Code Scanning - configuration files".to_string(),
            body: format!(
                "{lead}\n\nWe also opened an informative issue in this repository with more \
                 context. In most cases you will be able to merge this PR as is and start \
                 benefiting from security scanning right away, as a check in each PR and in the \
                 [Security tab](https://github.com/{org}/{repo}/security/code-scanning) of this \
                 repository.\n\nWe encourage you to review the configuration files and reach out \
                 to the Application Security team with any questions."
            ),
        }
    }
}

/// The dependency review workflow
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyReviewChangeSet;

impl ChangeSet for DependencyReviewChangeSet {
    fn files(&self, _default_branch: &str) -> Vec<FileChange> {
        vec![FileChange {
            path: ".github/workflows/dependency_enforcement.yml".to_string(),
            content: templates::dependency_enforcement_workflow().to_string(),
            message: "Enable Dependency reviewer".to_string(),
        }]
    }

    fn pull_request(&self, _org: &OrgName, _repo: &RepoName, branch: BranchState) -> PullRequestText {
        let lead = match branch {
            BranchState::Created => "This PR enables the Dependency Reviewer in your repository.",
            BranchState::AlreadyExisted => {
                "This PR updates the Dependency Reviewer workflow of your repository."
            }
        };
        PullRequestText {
            title: "Dependency reviewer".to_string(),
            body: format!(
                "{lead} It prevents vulnerable dependencies from reaching your codebase. In most \
                 cases you will be able to merge this PR as is and start benefiting from it right \
                 away, as a check in each PR.\n\nReach out to the Application Security team with \
                 any questions."
            ),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// PullRequestWorkflow
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestOutcome {
    pub url: String,
    pub number: i64,
    pub default_branch: String,
    pub branch: BranchState,
}

pub struct PullRequestWorkflow<'c> {
    client: &'c Client,
}

impl<'c> PullRequestWorkflow<'c> {
    pub fn new(client: &'c Client) -> Self {
        PullRequestWorkflow { client }
    }

    pub async fn run(
        &self,
        org: &OrgName,
        repo: &RepoName,
        target: &BranchName,
        changes: &dyn ChangeSet,
    ) -> Result<PullRequestOutcome> {
        let default_branch = repositories::get_default_branch(self.client, org, repo)
            .await
            .map_err(WorkflowError::at(Stage::ResolveDefaultBranch))?;

        let branch = self
            .create_branch(org, repo, &default_branch, target)
            .await
            .map_err(WorkflowError::at(Stage::CreateBranch))?;

        for file in changes.files(&default_branch) {
            let sha = self
                .existing_file_sha(org, repo, target, &file.path)
                .await
                .map_err(WorkflowError::at(Stage::ResolveExistingFile))?;
            self.commit_file(org, repo, target, &file, sha)
                .await
                .map_err(WorkflowError::at(Stage::CommitFile))?;
        }

        let text = changes.pull_request(org, repo, branch);
        let request = ApiRequest::post(&["repos", org.as_str(), repo.as_str(), "pulls"]).json(json!({
            "title": text.title,
            "body": text.body,
            "head": target.as_str(),
            "base": default_branch,
        }));
        let pr: PullRequest = self
            .client
            .send_with_retry(&request, &[StatusCode::CREATED])
            .await
            .and_then(|r| r.json())
            .map_err(WorkflowError::at(Stage::OpenPullRequest))?;
        info!("Opened pull request on {org}/{repo}: {}", pr.html_url);

        Ok(PullRequestOutcome {
            url: pr.html_url,
            number: pr.number,
            default_branch,
            branch,
        })
    }

    async fn create_branch(
        &self,
        org: &OrgName,
        repo: &RepoName,
        default_branch: &str,
        target: &BranchName,
    ) -> github::Result<BranchState> {
        let wanted = format!("refs/heads/{default_branch}");
        if default_branch
            .split('/')
            .any(|s| s.is_empty() || s == "." || s == "..")
        {
            return Err(github::Error::UnexpectedResponse(format!(
                "{org}/{repo} reports an unusable default branch {default_branch:?}"
            )));
        }
        let mut ref_path = vec!["repos", org.as_str(), repo.as_str(), "git", "ref", "heads"];
        ref_path.extend(default_branch.split('/'));
        let request = ApiRequest::get(&ref_path);
        let sha = match self.client.send_with_retry(&request, &[StatusCode::OK]).await {
            Ok(response) => response.json::<GitRef>()?.object.sha,
            Err(e) if e.is_not_found() => {
                return Err(github::Error::UnexpectedResponse(format!(
                    "{org}/{repo} has no ref {wanted}"
                )))
            }
            Err(e) => return Err(e),
        };

        let request = ApiRequest::post(&["repos", org.as_str(), repo.as_str(), "git", "refs"])
            .json(json!({ "ref": format!("refs/heads/{target}"), "sha": sha }));
        match self.client.send_with_retry(&request, &[StatusCode::CREATED]).await {
            Ok(_) => {
                debug!("Created branch {target} on {org}/{repo} at {sha}");
                Ok(BranchState::Created)
            }
            Err(e) if e.status() == Some(StatusCode::UNPROCESSABLE_ENTITY) => {
                info!("Branch {target} already exists on {org}/{repo}; updating it");
                Ok(BranchState::AlreadyExisted)
            }
            Err(e) => Err(e),
        }
    }

    async fn existing_file_sha(
        &self,
        org: &OrgName,
        repo: &RepoName,
        target: &BranchName,
        path: &str,
    ) -> github::Result<Option<String>> {
        let request = ApiRequest::get(&contents_path(org, repo, path)).param("ref", target);
        match self.client.send_with_retry(&request, &[StatusCode::OK]).await {
            Ok(response) => {
                let file: ContentFile = response.json()?;
                Ok(Some(file.sha))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn commit_file(
        &self,
        org: &OrgName,
        repo: &RepoName,
        target: &BranchName,
        file: &FileChange,
        sha: Option<String>,
    ) -> github::Result<()> {
        let mut body = json!({
            "message": file.message,
            "content": base64::engine::general_purpose::STANDARD.encode(&file.content),
            "branch": target.as_str(),
        });
        if let Some(sha) = &sha {
            body["sha"] = json!(sha);
        }
        let request = ApiRequest::put(&contents_path(org, repo, &file.path)).json(body);
        self.client
            .send_with_retry(&request, &[StatusCode::CREATED, StatusCode::OK])
            .await?;
        debug!(
            "{} {} on {org}/{repo}@{target}",
            if sha.is_some() { "Updated" } else { "Created" },
            file.path
        );
        Ok(())
    }
}

fn contents_path(org: &OrgName, repo: &RepoName, path: &str) -> Vec<String> {
    let mut parts: Vec<String> = ["repos", org.as_str(), repo.as_str(), "contents"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    parts.extend(path.split('/').map(str::to_string));
    parts
}

// -------------------------------------------------------------------------------------------------
// rollouts
// -------------------------------------------------------------------------------------------------
/// Open a pull request adding CodeQL scanning for the repository's CodeQL languages.
pub async fn enable_codeql(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    target: &BranchName,
) -> Result<PullRequestOutcome> {
    let languages = repositories::get_languages(client, org, repo, LanguageSelection::CodeQl).await;
    let changes = CodeQlChangeSet { languages };
    PullRequestWorkflow::new(client).run(org, repo, target, &changes).await
}

/// Open a pull request adding the dependency review workflow.
pub async fn enable_dependency_review(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    target: &BranchName,
) -> Result<PullRequestOutcome> {
    PullRequestWorkflow::new(client)
        .run(org, repo, target, &DependencyReviewChangeSet)
        .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::testing::{acme, demo, mock_client};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WORKFLOW_FILE: &str = "/repos/Acme/demo/contents/.github/workflows/dependency_enforcement.yml";

    fn target() -> BranchName {
        BranchName::new(DEPENDENCY_REVIEW_BRANCH).unwrap()
    }

    async fn mount_repository(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "demo",
                "default_branch": "develop"
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/git/ref/heads/develop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(
                {"ref": "refs/heads/develop", "object": {"sha": "aa11", "type": "commit"}}
            )))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_branch_creation(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/git/refs"))
            .and(body_partial_json(json!({
                "ref": "refs/heads/appsec-ghas-dep-enforcement-enable",
                "sha": "aa11"
            })))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_pull_request(server: &MockServer, body_start: &str) {
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/pulls"))
            .and(body_partial_json(json!({
                "head": "appsec-ghas-dep-enforcement-enable",
                "base": "develop"
            })))
            .and(BodyStartsWith(body_start.to_string()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 5,
                "html_url": "https://github.com/Acme/demo/pull/5"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    /// Matches pull request creations whose `body` field starts with the given text
    struct BodyStartsWith(String);

    impl wiremock::Match for BodyStartsWith {
        fn matches(&self, request: &wiremock::Request) -> bool {
            serde_json::from_slice::<serde_json::Value>(&request.body)
                .ok()
                .and_then(|v| v["body"].as_str().map(|b| b.starts_with(&self.0)))
                .unwrap_or(false)
        }
    }

    #[tokio::test]
    async fn fresh_branch() {
        let server = MockServer::start().await;
        mount_repository(&server).await;
        mount_branch_creation(&server, 201).await;
        Mock::given(method("GET"))
            .and(path(WORKFLOW_FILE))
            .and(query_param("ref", DEPENDENCY_REVIEW_BRANCH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(WORKFLOW_FILE))
            .and(body_partial_json(json!({
                "message": "Enable Dependency reviewer",
                "branch": DEPENDENCY_REVIEW_BRANCH
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        mount_pull_request(&server, "This PR enables").await;

        let client = mock_client(&server);
        let outcome = enable_dependency_review(&client, &acme(), &demo(), &target())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            PullRequestOutcome {
                url: "https://github.com/Acme/demo/pull/5".to_string(),
                number: 5,
                default_branch: "develop".to_string(),
                branch: BranchState::Created,
            }
        );
    }

    #[tokio::test]
    async fn existing_branch_is_updated() {
        let server = MockServer::start().await;
        mount_repository(&server).await;
        mount_branch_creation(&server, 422).await;
        Mock::given(method("GET"))
            .and(path(WORKFLOW_FILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "cc33",
                "path": ".github/workflows/dependency_enforcement.yml"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(WORKFLOW_FILE))
            .and(body_partial_json(json!({"sha": "cc33"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        mount_pull_request(&server, "This PR updates").await;

        let client = mock_client(&server);
        let outcome = enable_dependency_review(&client, &acme(), &demo(), &target())
            .await
            .unwrap();
        assert_eq!(outcome.branch, BranchState::AlreadyExisted);
    }

    #[tokio::test]
    async fn failed_commit_opens_no_pull_request() {
        let server = MockServer::start().await;
        mount_repository(&server).await;
        mount_branch_creation(&server, 201).await;
        Mock::given(method("GET"))
            .and(path(WORKFLOW_FILE))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(WORKFLOW_FILE))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/pulls"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = enable_dependency_review(&client, &acme(), &demo(), &target())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::CommitFile);
        assert_eq!(err.source.status(), Some(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn missing_default_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "trunk"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/git/ref/heads/trunk"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = enable_dependency_review(&client, &acme(), &demo(), &target())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::CreateBranch);
    }

    #[tokio::test]
    async fn default_branch_with_slashes_is_looked_up_directly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"default_branch": "release/2024"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/git/ref/heads/release/2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(
                {"ref": "refs/heads/release/2024", "object": {"sha": "cc33", "type": "commit"}}
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/git/refs"))
            .and(body_partial_json(json!({"sha": "cc33"})))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "stop"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = enable_dependency_review(&client, &acme(), &demo(), &target())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::CreateBranch);
        assert_eq!(err.source.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn codeql_files() {
        let changes = CodeQlChangeSet {
            languages: vec!["javascript".to_string(), "python".to_string()],
        };
        let paths: Vec<_> = changes.files("develop").into_iter().map(|f| f.path).collect();
        assert_eq!(
            paths,
            vec![
                ".github/workflows/codeql-analysis-javascript.yml",
                ".github/codeql/codeql-config-javascript.yml",
                ".github/workflows/codeql-analysis-python.yml",
                ".github/codeql/codeql-config-python.yml",
            ]
        );

        let fallback = CodeQlChangeSet {
            languages: vec!["default".to_string()],
        };
        let files = fallback.files("main");
        assert_eq!(files.len(), 2);
        assert!(files[0].content.contains("branches: ['main']"));
    }
}
