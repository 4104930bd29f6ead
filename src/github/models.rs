//! Typed views of the GitHub REST API objects this tool reads.
//!
//! Only the fields that are actually used are modeled; everything else in a payload is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// -------------------------------------------------------------------------------------------------
// ClientError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct ClientError {
    pub message: String,
    pub documentation_url: Option<String>,
    pub errors: Option<Vec<serde_json::Value>>,
}

// -------------------------------------------------------------------------------------------------
// Repository
// Defined as in: https://docs.github.com/en/rest/repos/repos?apiVersion=2022-11-28#get-a-repository
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Repository {
    pub id: Option<i64>,
    pub name: String,
    pub full_name: Option<String>,
    pub owner: Owner,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    pub license: Option<License>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    pub updated_at: Option<String>,
    pub security_and_analysis: Option<SecurityAndAnalysis>,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(rename = "type")]
    pub owner_type: String,
}

#[derive(Debug, Deserialize)]
pub struct License {
    pub spdx_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SecurityAndAnalysis {
    pub advanced_security: Option<FeatureStatus>,
    pub secret_scanning: Option<FeatureStatus>,
    pub secret_scanning_push_protection: Option<FeatureStatus>,
    pub dependabot_security_updates: Option<FeatureStatus>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureStatus {
    pub status: String,
}

impl FeatureStatus {
    pub fn is_enabled(status: &Option<FeatureStatus>) -> bool {
        matches!(status, Some(s) if s.status == "enabled")
    }
}

// -------------------------------------------------------------------------------------------------
// Git refs and contents
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

#[derive(Debug, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentFile {
    pub sha: String,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub number: i64,
    pub html_url: String,
}

// -------------------------------------------------------------------------------------------------
// Issues
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub html_url: String,
    pub title: Option<String>,
    /// Present only when the "issue" is actually a pull request
    pub pull_request: Option<serde_json::Value>,
}

// -------------------------------------------------------------------------------------------------
// Teams
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Team {
    pub slug: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TeamRepoPermission {
    pub permissions: BTreeMap<String, bool>,
    pub role_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Topics {
    pub names: Vec<String>,
}

// -------------------------------------------------------------------------------------------------
// Alerts
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct SecretScanningAlert {
    pub state: String,
    pub resolution: Option<String>,
    pub resolved_at: Option<String>,
    pub repository: AlertRepository,
    pub url: String,
    pub secret_type: String,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertRepository {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeScanningAlert {
    pub number: u64,
    pub created_at: String,
    pub state: String,
    pub rule: CodeScanningRule,
}

#[derive(Debug, Deserialize)]
pub struct CodeScanningRule {
    pub severity: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// Actions
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub path: Option<String>,
    pub html_url: Option<String>,
    pub created_at: Option<String>,
    pub conclusion: Option<String>,
    pub actor: Option<Actor>,
    pub head_commit: Option<HeadCommit>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HeadCommit {
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
}
