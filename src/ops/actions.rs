use chrono::{Duration, Utc};

use crate::github::models::WorkflowRun;
use crate::github::{ApiRequest, Client, Collected, Paginator, Result};
use crate::validation::{OrgName, RepoName};

/// Bots whose workflow runs belong to GHAS
pub const GHAS_ACTORS: &[&str] = &["github-advanced-security[bot]", "dependabot[bot]"];

/// Is this run triggered by, or committed by, one of the GHAS bots?
pub fn is_ghas_related(run: &WorkflowRun) -> bool {
    let actor = run.actor.as_ref().map(|a| a.login.as_str());
    let author = run
        .head_commit
        .as_ref()
        .and_then(|c| c.author.as_ref())
        .and_then(|a| a.name.as_deref());
    [actor, author]
        .into_iter()
        .flatten()
        .any(|who| GHAS_ACTORS.contains(&who))
}

/// The GHAS-related workflow runs of a repository created in the last `days` days.
pub async fn list_ghas_workflow_runs(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    days: u32,
) -> Result<Collected<WorkflowRun>> {
    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "actions", "runs"])
        .param("created", format!(">={}", cutoff.format("%Y-%m-%d")));
    let runs: Collected<WorkflowRun> = Paginator::new(client, request)
        .item_key("workflow_runs")
        .collect_as()
        .await?;
    Ok(Collected {
        items: runs.items.into_iter().filter(is_ghas_related).collect(),
        complete: runs.complete,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::testing::{acme, demo, mock_client};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run(id: u64, actor: &str, author: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "CodeQL",
            "actor": {"login": actor},
            "head_commit": {"author": {"name": author}}
        })
    }

    #[test]
    fn ghas_related() {
        let by_actor: WorkflowRun =
            serde_json::from_value(run(1, "dependabot[bot]", "alice")).unwrap();
        assert!(is_ghas_related(&by_actor));

        let by_author: WorkflowRun =
            serde_json::from_value(run(2, "alice", "github-advanced-security[bot]")).unwrap();
        assert!(is_ghas_related(&by_author));

        let unrelated: WorkflowRun = serde_json::from_value(run(3, "alice", "bob")).unwrap();
        assert!(!is_ghas_related(&unrelated));

        let bare: WorkflowRun = serde_json::from_value(json!({"id": 4})).unwrap();
        assert!(!is_ghas_related(&bare));
    }

    #[tokio::test]
    async fn runs_are_filtered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/actions/runs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 2,
                "workflow_runs": [run(1, "dependabot[bot]", "x"), run(2, "alice", "alice")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/actions/runs"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflow_runs": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let runs = list_ghas_workflow_runs(&client, &acme(), &demo(), 3).await.unwrap();
        assert_eq!(runs.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }
}
