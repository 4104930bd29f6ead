use anyhow::{Context, Result as AnyResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::github::{ApiRequest, Client, Result};
use crate::ops::teams;
use crate::validation::{OrgName, RepoName, TeamSlug};

// -------------------------------------------------------------------------------------------------
// CustomRole
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomRole {
    pub name: String,
    pub description: String,

    /// The built-in role this one extends, e.g., `read` or `write`
    pub base_role: String,

    /// Fine-grained permissions added on top of the base role
    pub permissions: Vec<String>,
}

/// Create a custom repository role in an organization.
pub async fn create_role(client: &Client, org: &OrgName, role: &CustomRole) -> Result<()> {
    let request = ApiRequest::post(&["orgs", org.as_str(), "custom_roles"]).json(json!(role));
    client.send_with_retry(&request, &[StatusCode::CREATED]).await?;
    info!("Created role {} in {org}", role.name);
    Ok(())
}

/// Give a team the given role (built-in or custom) on a repository.
pub async fn assign_role(
    client: &Client,
    org: &OrgName,
    team: &TeamSlug,
    repo: &RepoName,
    role: &str,
) -> Result<()> {
    let request = ApiRequest::put(&[
        "orgs",
        org.as_str(),
        "teams",
        team.as_str(),
        "repos",
        org.as_str(),
        repo.as_str(),
    ])
    .json(json!({ "permission": role }));
    client.send_with_retry(&request, &[StatusCode::NO_CONTENT]).await?;
    debug!("Assigned role {role} to team {team} on {org}/{repo}");
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Checkpoint
// -------------------------------------------------------------------------------------------------
/// The role a team holds on a repository, as recorded during classification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub team: String,
    pub repository: String,
    pub permission: String,
}

/// A CSV file of `team,repository,permission` rows, appended to as pairs are classified.
///
/// Re-opening an existing checkpoint loads its rows, so an interrupted classification picks up
/// where it left off.
pub struct Checkpoint {
    path: PathBuf,
    records: Vec<PermissionRecord>,
    seen: HashSet<(String, String)>,
}

impl Checkpoint {
    pub fn open(path: &Path) -> AnyResult<Self> {
        let mut records = Vec::new();
        if path.exists() {
            let mut reader = csv::Reader::from_path(path)
                .with_context(|| format!("Failed to open checkpoint {}", path.display()))?;
            for record in reader.deserialize() {
                let record: PermissionRecord = record
                    .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
                records.push(record);
            }
            info!("Loaded {} classified pairs from {}", records.len(), path.display());
        }
        let seen = records
            .iter()
            .map(|r| (r.team.clone(), r.repository.clone()))
            .collect();
        Ok(Checkpoint {
            path: path.to_owned(),
            records,
            seen,
        })
    }

    pub fn contains(&self, team: &str, repository: &str) -> bool {
        self.seen.contains(&(team.to_string(), repository.to_string()))
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    /// Append one row to the file and to the in-memory set.
    pub fn record(&mut self, record: PermissionRecord) -> AnyResult<()> {
        let is_new = !self.path.exists()
            || std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open checkpoint {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        self.seen.insert((record.team.clone(), record.repository.clone()));
        self.records.push(record);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// reassignment
// -------------------------------------------------------------------------------------------------
/// What a role reassignment did
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReassignSummary {
    /// Pairs classified during this run
    pub classified: usize,

    /// Pairs already in the checkpoint when the run started
    pub resumed: usize,

    /// Pairs holding the source role
    pub matching: usize,

    pub assigned: usize,
    pub failed: usize,
}

/// Give every team that holds `from_role` on a repository `to_role` instead.
///
/// Phase one records the role of every (team, repository) pair of the organization in the
/// checkpoint, skipping pairs it already holds. Phase two reassigns the matching pairs.
pub async fn reassign_role(
    client: &Client,
    org: &OrgName,
    from_role: &str,
    to_role: &str,
    checkpoint: &mut Checkpoint,
) -> AnyResult<ReassignSummary> {
    let mut summary = ReassignSummary {
        resumed: checkpoint.records().len(),
        ..Default::default()
    };

    let team_slugs = teams::list_teams(client, org).await?;
    if !team_slugs.complete {
        warn!("Listing teams of {org} was cut short; classifying the {} found", team_slugs.len());
    }

    for slug in team_slugs.items {
        let team = match TeamSlug::new(&slug) {
            Ok(team) => team,
            Err(e) => {
                warn!("Skipping team: {e}");
                continue;
            }
        };
        let repos = teams::list_team_repositories(client, org, &team).await?;
        for repo in repos.items {
            if checkpoint.contains(team.as_str(), &repo.name) {
                continue;
            }
            let name = match RepoName::new(&repo.name) {
                Ok(name) => name,
                Err(e) => {
                    warn!("Skipping repository of team {team}: {e}");
                    continue;
                }
            };
            let permission = match teams::get_team_permission(client, org, &team, &name).await {
                Ok(Some(p)) => p.role_name,
                Ok(None) => "none".to_string(),
                Err(e) => {
                    warn!("Failed to classify team {team} on {org}/{name}: {e}");
                    continue;
                }
            };
            checkpoint.record(PermissionRecord {
                team: team.to_string(),
                repository: name.to_string(),
                permission,
            })?;
            summary.classified += 1;
        }
    }

    let matching: Vec<PermissionRecord> = checkpoint
        .records()
        .iter()
        .filter(|r| r.permission == from_role)
        .cloned()
        .collect();
    summary.matching = matching.len();

    for record in matching {
        let (team, repo) = match (TeamSlug::new(&record.team), RepoName::new(&record.repository)) {
            (Ok(team), Ok(repo)) => (team, repo),
            _ => {
                warn!("Skipping invalid checkpoint row {record:?}");
                summary.failed += 1;
                continue;
            }
        };
        match assign_role(client, org, &team, &repo, to_role).await {
            Ok(()) => summary.assigned += 1,
            Err(e) => {
                warn!("Failed to assign {to_role} to team {team} on {org}/{repo}: {e}");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::testing::{acme, mock_client};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_obj(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "owner": {"login": "Acme", "type": "Organization"},
            "html_url": format!("https://github.com/Acme/{name}"),
            "default_branch": "main"
        })
    }

    async fn mount_pages(server: &MockServer, url_path: &str, items: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(url_path))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }

    async fn mount_role(server: &MockServer, team: &str, repo: &str, role: &str, calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/orgs/Acme/teams/{team}/repos/Acme/{repo}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "permissions": {"pull": true},
                "role_name": role
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn assign() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/orgs/Acme/teams/platform/repos/Acme/demo"))
            .and(body_json(json!({"permission": "security-reader"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let team = TeamSlug::new("platform").unwrap();
        let repo = RepoName::new("demo").unwrap();
        assign_role(&client, &acme(), &team, &repo, "security-reader").await.unwrap();
    }

    #[tokio::test]
    async fn reassign_resumes_from_checkpoint() {
        let dir = assert_fs::TempDir::new().unwrap();
        let checkpoint_path = dir.path().join("checkpoint.csv");
        std::fs::write(&checkpoint_path, "team,repository,permission\nplatform,api,write\n").unwrap();

        let server = MockServer::start().await;
        mount_pages(&server, "/orgs/Acme/teams", json!([{"slug": "platform"}])).await;
        mount_pages(&server, "/orgs/Acme/teams/platform/repos", json!([repo_obj("api"), repo_obj("web")]))
            .await;
        // api is already classified, so only web is looked up
        mount_role(&server, "platform", "api", "write", 0).await;
        mount_role(&server, "platform", "web", "read", 1).await;
        Mock::given(method("PUT"))
            .and(path("/orgs/Acme/teams/platform/repos/Acme/api"))
            .and(body_json(json!({"permission": "maintain"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let mut checkpoint = Checkpoint::open(&checkpoint_path).unwrap();
        let summary = reassign_role(&client, &acme(), "write", "maintain", &mut checkpoint)
            .await
            .unwrap();
        assert_eq!(
            summary,
            ReassignSummary {
                classified: 1,
                resumed: 1,
                matching: 1,
                assigned: 1,
                failed: 0,
            }
        );

        let contents = std::fs::read_to_string(&checkpoint_path).unwrap();
        assert_eq!(contents, "team,repository,permission\nplatform,api,write\nplatform,web,read\n");
    }

    #[test]
    fn fresh_checkpoint_gets_header() {
        let dir = assert_fs::TempDir::new().unwrap();
        let checkpoint_path = dir.path().join("checkpoint.csv");
        let mut checkpoint = Checkpoint::open(&checkpoint_path).unwrap();
        assert!(checkpoint.records().is_empty());
        checkpoint
            .record(PermissionRecord {
                team: "platform".to_string(),
                repository: "demo".to_string(),
                permission: "admin".to_string(),
            })
            .unwrap();
        assert!(checkpoint.contains("platform", "demo"));

        let contents = std::fs::read_to_string(&checkpoint_path).unwrap();
        assert_eq!(contents, "team,repository,permission\nplatform,demo,admin\n");
    }
}
