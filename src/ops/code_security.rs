//! Organization and enterprise code security configurations.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::github::{ApiRequest, Client, Error, Result};
use crate::ops::repositories;
use crate::validation::{OrgName, RepoName};

/// Statuses that mean an attachment was accepted
const ATTACH_OK: &[StatusCode] = &[
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];

// -------------------------------------------------------------------------------------------------
// AttachScope
// -------------------------------------------------------------------------------------------------
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachScope {
    All,
    AllWithoutConfigurations,
    Public,
    PrivateOrInternal,
    Selected,
}

impl AttachScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachScope::All => "all",
            AttachScope::AllWithoutConfigurations => "all_without_configurations",
            AttachScope::Public => "public",
            AttachScope::PrivateOrInternal => "private_or_internal",
            AttachScope::Selected => "selected",
        }
    }
}

/// The configurations of an organization, as returned by the API.
pub async fn list_org_configurations(client: &Client, org: &OrgName) -> Result<Vec<Value>> {
    let request = ApiRequest::get(&["orgs", org.as_str(), "code-security", "configurations"]);
    client.send_with_retry(&request, &[StatusCode::OK]).await?.json()
}

/// The configurations of an enterprise, as returned by the API.
pub async fn list_enterprise_configurations(
    client: &Client,
    enterprise: &OrgName,
) -> Result<Vec<Value>> {
    let request =
        ApiRequest::get(&["enterprises", enterprise.as_str(), "code-security", "configurations"]);
    client.send_with_retry(&request, &[StatusCode::OK]).await?.json()
}

pub async fn get_org_configuration(client: &Client, org: &OrgName, id: u64) -> Result<Value> {
    let id = id.to_string();
    let request = ApiRequest::get(&[
        "orgs",
        org.as_str(),
        "code-security",
        "configurations",
        id.as_str(),
    ]);
    match client.send_with_retry(&request, &[StatusCode::OK]).await {
        Ok(response) => Ok(response.json_value()),
        Err(e) => {
            if e.is_not_found() {
                error!("Configuration {id} not found in organization {org}");
            }
            Err(e)
        }
    }
}

/// Attach a configuration to an organization's repositories by repository id.
pub async fn attach_configuration(
    client: &Client,
    org: &OrgName,
    id: u64,
    scope: AttachScope,
    repository_ids: &[u64],
) -> Result<()> {
    let mut body = json!({ "scope": scope.as_str() });
    if scope == AttachScope::Selected {
        body["selected_repository_ids"] = json!(repository_ids);
    }
    let id = id.to_string();
    let request = ApiRequest::post(&[
        "orgs",
        org.as_str(),
        "code-security",
        "configurations",
        id.as_str(),
        "attach",
    ])
    .json(body);
    let response = client.send_with_retry(&request, ATTACH_OK).await?;
    info!("Attached configuration {id} in {org} ({})", response.status);
    Ok(())
}

/// What attaching by repository name did
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttachReport {
    pub attached: Vec<String>,

    /// Names that could not be resolved to a repository id
    pub unresolved: Vec<String>,
}

/// Attach a configuration to the named repositories.
///
/// Each name is resolved to a repository id first. Names that fail to resolve are reported and
/// left out; the attachment is only abandoned if none resolve.
pub async fn attach_configuration_by_names(
    client: &Client,
    org: &OrgName,
    id: u64,
    scope: AttachScope,
    names: &[RepoName],
) -> Result<AttachReport> {
    if scope == AttachScope::Selected && names.is_empty() {
        return Err(Error::UnexpectedResponse(
            "repository names are required when the scope is `selected`".to_string(),
        ));
    }

    let mut report = AttachReport::default();
    let mut ids = Vec::new();
    for name in names {
        let details = repositories::get_repository_details(client, org, name).await;
        match details.as_ref().ok().and_then(|d| d.get("id")).and_then(Value::as_u64) {
            Some(repo_id) => {
                info!("Found repository {name} with id {repo_id}");
                ids.push(repo_id);
                report.attached.push(name.to_string());
            }
            None => {
                match details {
                    Err(e) => error!("Failed to get details of repository {name}: {e}"),
                    Ok(_) => error!("Details of repository {name} have no id"),
                }
                report.unresolved.push(name.to_string());
            }
        }
    }

    if !names.is_empty() && ids.is_empty() {
        return Err(Error::UnexpectedResponse(format!(
            "none of the repositories could be resolved: {}",
            report.unresolved.join(", ")
        )));
    }

    attach_configuration(client, org, id, scope, &ids).await?;
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::testing::{acme, mock_client};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn attach_by_names_skips_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 17, "name": "api"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/orgs/Acme/code-security/configurations/9/attach"))
            .and(body_json(json!({"scope": "selected", "selected_repository_ids": [17]})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let names = vec![RepoName::new("api").unwrap(), RepoName::new("gone").unwrap()];
        let report = attach_configuration_by_names(&client, &acme(), 9, AttachScope::Selected, &names)
            .await
            .unwrap();
        assert_eq!(report.attached, vec!["api"]);
        assert_eq!(report.unresolved, vec!["gone"]);
    }

    #[tokio::test]
    async fn attach_by_names_aborts_when_nothing_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let names = vec![RepoName::new("gone").unwrap()];
        let res = attach_configuration_by_names(&client, &acme(), 9, AttachScope::Selected, &names).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn enterprise_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/enterprises/acme-corp/code-security/configurations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "GitHub recommended"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let enterprise = OrgName::new("acme-corp").unwrap();
        let configs = list_enterprise_configurations(&client, &enterprise).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0]["name"], "GitHub recommended");
    }
}
