use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::github::models::Issue;
use crate::github::{ApiRequest, Client, Collected, Paginator, Result};
use crate::validation::{OrgName, RepoName};

/// Labels put on every issue this tool opens
pub const ISSUE_LABELS: &[&str] = &["info", "security"];

/// The login of the Mend bot, whose issues can be closed in bulk
pub const MEND_BOT: &str = "mend-for-github-com[bot]";

/// Open an issue, returning its URL.
pub async fn create_issue(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    title: &str,
    body: &str,
) -> Result<String> {
    let request = ApiRequest::post(&["repos", org.as_str(), repo.as_str(), "issues"]).json(json!({
        "title": title,
        "body": body,
        "assignee": null,
        "milestone": null,
        "labels": ISSUE_LABELS,
    }));
    let response = client.send_with_retry(&request, &[StatusCode::CREATED]).await?;
    let issue: Issue = response.json()?;
    info!("Opened issue {:?} on {org}/{repo}: {}", title, issue.html_url);
    Ok(issue.html_url)
}

/// The numbers of the open issues opened by `creator`; pull requests are left out.
pub async fn list_issue_numbers_by_creator(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    creator: &str,
) -> Result<Collected<u64>> {
    let request = ApiRequest::get(&["repos", org.as_str(), repo.as_str(), "issues"])
        .param("state", "open")
        .param("creator", creator);
    let issues: Collected<Issue> = Paginator::new(client, request).collect_as().await?;
    Ok(Collected {
        items: issues
            .items
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| i.number)
            .collect(),
        complete: issues.complete,
    })
}

/// Close an issue as not planned.
pub async fn close_issue(client: &Client, org: &OrgName, repo: &RepoName, number: u64) -> Result<()> {
    let number = number.to_string();
    let request = ApiRequest::patch(&["repos", org.as_str(), repo.as_str(), "issues", number.as_str()])
        .json(json!({"state": "closed", "state_reason": "not_planned"}));
    client.send_with_retry(&request, &[StatusCode::OK]).await?;
    debug!("Closed issue #{number} on {org}/{repo}");
    Ok(())
}

/// Close each of the given issues, returning how many were closed.
pub async fn close_issues(client: &Client, org: &OrgName, repo: &RepoName, numbers: &[u64]) -> usize {
    let mut closed = 0;
    for &number in numbers {
        match close_issue(client, org, repo, number).await {
            Ok(()) => closed += 1,
            Err(e) => warn!("Failed to close issue #{number} on {org}/{repo}: {e}"),
        }
    }
    closed
}

/// Close every open issue opened by `creator`, returning how many were closed.
pub async fn close_issues_by_creator(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    creator: &str,
) -> Result<usize> {
    let numbers = list_issue_numbers_by_creator(client, org, repo, creator).await?;
    if !numbers.complete {
        warn!("Listing issues of {org}/{repo} was cut short; closing the {} found", numbers.len());
    }
    Ok(close_issues(client, org, repo, &numbers.items).await)
}
