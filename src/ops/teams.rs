use reqwest::header::{self, HeaderValue};
use reqwest::StatusCode;
use tracing::warn;

use crate::github::models::{Team, TeamRepoPermission};
use crate::github::{ApiRequest, Client, Collected, Paginator, Result};
use crate::repository::Repository;
use crate::validation::{OrgName, RepoName, TeamSlug};

/// The slugs of an organization's teams.
pub async fn list_teams(client: &Client, org: &OrgName) -> Result<Collected<String>> {
    let request = ApiRequest::get(&["orgs", org.as_str(), "teams"]);
    let teams: Collected<Team> = Paginator::new(client, request).collect_as().await?;
    Ok(Collected {
        items: teams.items.into_iter().map(|t| t.slug).collect(),
        complete: teams.complete,
    })
}

/// The repositories a team has access to.
pub async fn list_team_repositories(
    client: &Client,
    org: &OrgName,
    team: &TeamSlug,
) -> Result<Collected<Repository>> {
    let request = ApiRequest::get(&["orgs", org.as_str(), "teams", team.as_str(), "repos"]);
    let raw = Paginator::new(client, request).collect().await?;

    let mut complete = raw.complete;
    let mut repos = Vec::with_capacity(raw.items.len());
    for item in raw.items {
        match Repository::load_json(&item) {
            Ok(repo) => repos.push(repo),
            Err(e) => {
                warn!("Skipping repository of team {team} that failed to decode: {e}");
                complete = false;
            }
        }
    }
    Ok(Collected {
        items: repos,
        complete,
    })
}

/// A team's permissions and role on a repository, or `None` if the team has no access to it.
pub async fn get_team_permission(
    client: &Client,
    org: &OrgName,
    team: &TeamSlug,
    repo: &RepoName,
) -> Result<Option<TeamRepoPermission>> {
    let request = ApiRequest::get(&[
        "orgs",
        org.as_str(),
        "teams",
        team.as_str(),
        "repos",
        org.as_str(),
        repo.as_str(),
    ])
    .header(
        header::ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3.repository+json"),
    );
    match client.send_with_retry(&request, &[StatusCode::OK]).await {
        Ok(response) => Ok(Some(response.json()?)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
