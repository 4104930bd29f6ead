use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::info;

use crate::github::{ApiRequest, Client, Result};
use crate::validation::{OrgName, RepoName};

// -------------------------------------------------------------------------------------------------
// AllowedActions
// -------------------------------------------------------------------------------------------------
/// Which GitHub Actions a repository may run
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedActions {
    #[default]
    All,
    LocalOnly,
    Selected,
}

impl AllowedActions {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowedActions::All => "all",
            AllowedActions::LocalOnly => "local_only",
            AllowedActions::Selected => "selected",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Feature
// -------------------------------------------------------------------------------------------------
/// A per-repository setting that is switched on with one or more fixed-payload calls
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Feature {
    SecretScanning,
    PushProtection,
    Dependabot,
    Actions {
        enabled: bool,
        allowed: AllowedActions,
    },
}

/// One call needed to enable a feature: method, path below `repos/{org}/{repo}`, payload, and
/// the status that means it worked.
struct Call {
    method: Method,
    suffix: &'static [&'static str],
    body: Option<Value>,
    expected: StatusCode,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::SecretScanning => "secret scanning",
            Feature::PushProtection => "secret scanning push protection",
            Feature::Dependabot => "Dependabot",
            Feature::Actions { .. } => "Actions permissions",
        }
    }

    fn calls(&self) -> Vec<Call> {
        match self {
            Feature::SecretScanning => vec![Call {
                method: Method::PATCH,
                suffix: &[],
                body: Some(json!({
                    "security_and_analysis": {
                        "advanced_security": {"status": "enabled"},
                        "secret_scanning": {"status": "enabled"},
                    }
                })),
                expected: StatusCode::OK,
            }],

            Feature::PushProtection => vec![Call {
                method: Method::PATCH,
                suffix: &[],
                body: Some(json!({
                    "security_and_analysis": {
                        "advanced_security": {"status": "enabled"},
                        "secret_scanning": {"status": "enabled"},
                        "secret_scanning_push_protection": {"status": "enabled"},
                    }
                })),
                expected: StatusCode::OK,
            }],

            Feature::Dependabot => vec![
                Call {
                    method: Method::PUT,
                    suffix: &["vulnerability-alerts"],
                    body: None,
                    expected: StatusCode::NO_CONTENT,
                },
                Call {
                    method: Method::PUT,
                    suffix: &["automated-security-fixes"],
                    body: None,
                    expected: StatusCode::NO_CONTENT,
                },
            ],

            Feature::Actions { enabled, allowed } => vec![Call {
                method: Method::PUT,
                suffix: &["actions", "permissions"],
                body: Some(json!({
                    "enabled": enabled,
                    "allowed_actions": allowed.as_str(),
                })),
                expected: StatusCode::NO_CONTENT,
            }],
        }
    }
}

/// Enable `feature` on a repository.
///
/// Succeeds only if every call the feature needs succeeds; the first failing call ends the
/// operation.
pub async fn enable(client: &Client, org: &OrgName, repo: &RepoName, feature: Feature) -> Result<()> {
    for call in feature.calls() {
        let mut path = vec!["repos", org.as_str(), repo.as_str()];
        path.extend_from_slice(call.suffix);

        let mut request = ApiRequest::new(call.method, &path);
        if let Some(body) = call.body {
            request = request.json(body);
        }
        client.send_with_retry(&request, &[call.expected]).await?;
    }
    info!("Enabled {} on {org}/{repo}", feature.name());
    Ok(())
}
