use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::github::{ApiRequest, Client, Collected, Error, Paginator, Result};
use crate::repository::{RepoFilter, Repository};
use crate::validation::{OrgName, RepoName};

// -------------------------------------------------------------------------------------------------
// RepoType
// -------------------------------------------------------------------------------------------------
/// The `type` parameter of the organization repository listing
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RepoType {
    #[default]
    All,
    Public,
    Private,
    Forks,
    Sources,
    Member,
    Internal,
}

impl RepoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::All => "all",
            RepoType::Public => "public",
            RepoType::Private => "private",
            RepoType::Forks => "forks",
            RepoType::Sources => "sources",
            RepoType::Member => "member",
            RepoType::Internal => "internal",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Languages
// -------------------------------------------------------------------------------------------------
/// Which of a repository's languages to report
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LanguageSelection {
    /// Every language GitHub detected
    All,

    /// Only the interpreted languages CodeQL can analyze without a build
    Interpreted,

    /// Like `Interpreted`, but with aliases folded in, e.g., TypeScript is analyzed as JavaScript
    CodeQl,
}

const INTERPRETED_LANGUAGES: &[&str] = &["javascript", "python", "ruby"];

/// The language used when nothing more specific is known
pub const DEFAULT_LANGUAGE: &str = "default";

fn select_language(language: &str, selection: LanguageSelection) -> Option<String> {
    let language = language.to_lowercase();
    match selection {
        LanguageSelection::All => Some(language),
        _ if INTERPRETED_LANGUAGES.contains(&language.as_str()) => Some(language),
        LanguageSelection::CodeQl if language == "typescript" => Some("javascript".to_string()),
        _ => None,
    }
}

// -------------------------------------------------------------------------------------------------
// operations
// -------------------------------------------------------------------------------------------------
/// List an organization's repositories, keeping those that pass `filter`.
///
/// Filtering happens after each page is decoded, so the number of requests made does not depend
/// on the filter.
pub async fn list_org_repositories(
    client: &Client,
    org: &OrgName,
    repo_type: RepoType,
    filter: &RepoFilter,
) -> Result<Collected<Repository>> {
    let request = ApiRequest::get(&["orgs", org.as_str(), "repos"])
        .param("type", repo_type.as_str())
        .param("sort", "full_name");
    let mut pages = Paginator::new(client, request);

    let mut repos = Vec::new();
    let mut decoded_all = true;
    while let Some(page) = pages.next_page().await? {
        for item in page {
            let repo = match Repository::load_json(&item) {
                Ok(repo) => repo,
                Err(e) => {
                    warn!("Skipping repository that failed to decode: {e}");
                    decoded_all = false;
                    continue;
                }
            };
            if let Some(reason) = filter.rejection(&repo) {
                debug!("{} ignored because of {reason}", repo.name);
                continue;
            }
            repos.push(repo);
        }
    }

    Ok(Collected {
        items: repos,
        complete: decoded_all && pages.is_complete(),
    })
}

/// Fetch one repository as a descriptor.
pub async fn get_repository(client: &Client, org: &OrgName, repo: &RepoName) -> Result<Repository> {
    let obj = get_repository_details(client, org, repo).await?;
    Ok(Repository::load_json(&obj)?)
}

/// Fetch one repository as the raw API object, which includes its numeric `id`.
pub async fn get_repository_details(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
) -> Result<Value> {
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str()]);
    let response = client.send_with_retry(&request, &[StatusCode::OK]).await?;
    Ok(response.json_value())
}

pub async fn get_default_branch(client: &Client, org: &OrgName, repo: &RepoName) -> Result<String> {
    let obj = get_repository_details(client, org, repo).await?;
    match obj.get("default_branch").and_then(Value::as_str) {
        Some(branch) => Ok(branch.to_string()),
        None => Err(Error::UnexpectedResponse(format!(
            "repository {org}/{repo} has no default branch"
        ))),
    }
}

/// The lowercased languages of a repository, sorted.
///
/// Gives `["default"]` when nothing is selected or the languages cannot be fetched; that name picks
/// the generic templates downstream.
pub async fn get_languages(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    selection: LanguageSelection,
) -> Vec<String> {
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "languages"]);
    let languages = match client.send_with_retry(&request, &[StatusCode::OK]).await {
        Ok(response) => response.json_value(),
        Err(e) => {
            warn!("Failed to get languages of {org}/{repo}: {e}");
            Value::Null
        }
    };

    let selected: BTreeSet<String> = languages
        .as_object()
        .into_iter()
        .flat_map(|langs| langs.keys())
        .filter_map(|l| select_language(l, selection))
        .collect();

    if selected.is_empty() {
        vec![DEFAULT_LANGUAGE.to_string()]
    } else {
        selected.into_iter().collect()
    }
}

/// Are Dependabot vulnerability alerts enabled?
pub async fn dependabot_alerts_enabled(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
) -> Result<bool> {
    let request =
        ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "vulnerability-alerts"]);
    match client.send_with_retry(&request, &[StatusCode::NO_CONTENT]).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// A copy of the descriptor with its languages and Dependabot alert status filled in.
pub async fn enrich(client: &Client, repo: Repository) -> Repository {
    let (org, name) = match (OrgName::new(&repo.orga), RepoName::new(&repo.name)) {
        (Ok(org), Ok(name)) => (org, name),
        _ => {
            debug!("Not enriching {}: not an organization repository", repo.name);
            return repo;
        }
    };

    let languages = get_languages(client, &org, &name, LanguageSelection::All).await;
    let dependabot_alerts = match dependabot_alerts_enabled(client, &org, &name).await {
        Ok(enabled) => enabled,
        Err(e) => {
            warn!("Failed to check Dependabot alerts of {org}/{name}: {e}");
            false
        }
    };

    Repository {
        languages,
        dependabot_alerts,
        ..repo
    }
}

/// Archive or unarchive a repository.
pub async fn set_archived(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    archived: bool,
) -> Result<()> {
    let request = ApiRequest::patch(&["repos", org.as_str(), repo.as_str()])
        .json(json!({ "archived": archived }));
    client.send_with_retry(&request, &[StatusCode::OK]).await?;
    Ok(())
}

pub async fn list_topics(client: &Client, org: &OrgName, repo: &RepoName) -> Result<Vec<String>> {
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "topics"]);
    let response = client.send_with_retry(&request, &[StatusCode::OK]).await?;
    let topics: crate::github::models::Topics = response.json()?;
    Ok(topics.names)
}

/// The repository's dependencies as an SPDX SBOM document.
pub async fn export_sbom(client: &Client, org: &OrgName, repo: &RepoName) -> Result<Value> {
    let request = ApiRequest::get(&[
        "repos",
        org.as_str(),
        repo.as_str(),
        "dependency-graph",
        "sbom",
    ]);
    let response = client.send_with_retry(&request, &[StatusCode::OK]).await?;
    Ok(response.json_value())
}
