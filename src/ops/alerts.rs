use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::github::models::{CodeScanningAlert, SecretScanningAlert};
use crate::github::{ApiRequest, Client, Collected, Error, Paginator, Result};
use crate::ops::repositories::{self, RepoType};
use crate::repository::RepoFilter;
use crate::validation::{OrgName, RepoName};

// -------------------------------------------------------------------------------------------------
// Secret scanning
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecretAlertSummary {
    pub state: String,
    pub resolution: Option<String>,
    pub resolved_at: Option<String>,
    pub repository_full_name: String,
    pub url: String,
    pub secret_type: String,
    pub secret: Option<String>,
}

impl From<SecretScanningAlert> for SecretAlertSummary {
    fn from(a: SecretScanningAlert) -> Self {
        SecretAlertSummary {
            state: a.state,
            resolution: a.resolution,
            resolved_at: a.resolved_at,
            repository_full_name: a.repository.full_name,
            url: a.url,
            secret_type: a.secret_type,
            secret: a.secret,
        }
    }
}

/// Secret scanning alerts of an organization in the given state.
///
/// With a `secret_type`, only alerts of that type are kept.
pub async fn list_secret_alerts(
    client: &Client,
    org: &OrgName,
    state: &str,
    secret_type: Option<&str>,
) -> Result<Collected<SecretAlertSummary>> {
    let request = ApiRequest::get(&["orgs", org.as_str(), "secret-scanning", "alerts"])
        .param("state", state);
    let alerts: Collected<SecretScanningAlert> = Paginator::new(client, request).collect_as().await?;
    Ok(Collected {
        items: alerts
            .items
            .into_iter()
            .filter(|a| secret_type.map_or(true, |t| a.secret_type == t))
            .map(SecretAlertSummary::from)
            .collect(),
        complete: alerts.complete,
    })
}

// -------------------------------------------------------------------------------------------------
// Code scanning
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CodeScanningAlertSummary {
    pub number: u64,
    pub created_at: String,
    pub state: String,
    pub severity: Option<String>,
}

impl From<CodeScanningAlert> for CodeScanningAlertSummary {
    fn from(a: CodeScanningAlert) -> Self {
        CodeScanningAlertSummary {
            number: a.number,
            created_at: a.created_at,
            state: a.state,
            severity: a.rule.severity,
        }
    }
}

/// Code scanning alerts of one repository in the given state.
pub async fn list_code_scanning_alerts(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    state: &str,
) -> Result<Collected<CodeScanningAlertSummary>> {
    let request =
        ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "code-scanning", "alerts"])
            .param("state", state);
    let alerts: Collected<CodeScanningAlert> = Paginator::new(client, request).collect_as().await?;
    Ok(Collected {
        items: alerts.items.into_iter().map(Into::into).collect(),
        complete: alerts.complete,
    })
}

/// Which repositories of an organization to read alerts from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepoSelection {
    /// Every active repository of the organization
    All,
    Named(Vec<RepoName>),
}

/// The code scanning alerts of one repository
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepositoryAlerts {
    pub repository: String,
    pub alerts: Vec<CodeScanningAlertSummary>,

    /// False when listing this repository's alerts stopped early on an error
    pub complete: bool,
}

/// Code scanning alerts in the given state, grouped by repository.
///
/// A repository whose alerts cannot be read gets an empty, incomplete entry and the walk moves on;
/// only `Error::Unauthorized` stops it. With `RepoSelection::All`, the outer `complete` is false if
/// the repository listing itself was cut short.
pub async fn list_code_scanning_alerts_by_repository(
    client: &Client,
    org: &OrgName,
    selection: &RepoSelection,
    state: &str,
) -> Result<Collected<RepositoryAlerts>> {
    let (repos, listed_all) = match selection {
        RepoSelection::Named(repos) => (repos.clone(), true),
        RepoSelection::All => {
            let listing = repositories::list_org_repositories(
                client,
                org,
                RepoType::All,
                &RepoFilter::default(),
            )
            .await?;
            let mut repos = Vec::with_capacity(listing.items.len());
            for repo in listing.items {
                match RepoName::new(&repo.name) {
                    Ok(name) => repos.push(name),
                    Err(e) => warn!("Skipping repository {:?}: {e}", repo.name),
                }
            }
            (repos, listing.complete)
        }
    };

    let mut items = Vec::with_capacity(repos.len());
    for repo in &repos {
        debug!("Listing code scanning alerts of {org}/{repo}");
        let entry = match list_code_scanning_alerts(client, org, repo, state).await {
            Ok(alerts) => RepositoryAlerts {
                repository: repo.to_string(),
                alerts: alerts.items,
                complete: alerts.complete,
            },
            Err(e @ Error::Unauthorized { .. }) => return Err(e),
            Err(e) => {
                warn!("Failed to list code scanning alerts of {org}/{repo}: {e}");
                RepositoryAlerts {
                    repository: repo.to_string(),
                    alerts: Vec::new(),
                    complete: false,
                }
            }
        };
        items.push(entry);
    }

    Ok(Collected {
        items,
        complete: listed_all,
    })
}

// -------------------------------------------------------------------------------------------------
// Dependabot
// -------------------------------------------------------------------------------------------------
/// Dependabot alerts of one repository in the given state, as returned by the API.
pub async fn list_dependabot_alerts(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    state: &str,
) -> Result<Collected<Value>> {
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "dependabot", "alerts"])
        .param("state", state);
    let alerts = Paginator::new(client, request).collect().await?;
    Ok(Collected {
        items: alerts.items.into_iter().filter(|a| !a.is_null()).collect(),
        complete: alerts.complete,
    })
}
