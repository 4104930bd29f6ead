//! The repository descriptor: a flat, immutable summary of one repository and its GHAS status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::github::models::{self, FeatureStatus};

// -------------------------------------------------------------------------------------------------
// Repository
// -------------------------------------------------------------------------------------------------
/// One repository, as listed by the REST API, flattened for reporting.
///
/// A descriptor is never updated in place; when fresher status is needed, the repository is
/// fetched again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    /// The owning organization, or empty if the owner is a user
    pub orga: String,

    pub owner: String,
    pub url: String,
    pub description: Option<String>,
    pub main_language: Option<String>,
    pub languages: Vec<String>,
    pub default_branch: String,

    /// SPDX id of the license, if there is one
    pub license: Option<String>,

    pub archived: bool,
    pub disabled: bool,
    pub updated_at: Option<String>,

    pub ghas: bool,
    pub secret_scanner: bool,
    pub secret_push_prot: bool,
    pub dependabot: bool,
    pub dependabot_alerts: bool,
    pub codeql: bool,
}

impl Default for Repository {
    fn default() -> Self {
        Repository {
            name: String::new(),
            orga: String::new(),
            owner: String::new(),
            url: String::new(),
            description: None,
            main_language: None,
            languages: Vec::new(),
            default_branch: "main".to_string(),
            license: None,
            archived: false,
            disabled: false,
            updated_at: None,
            ghas: false,
            secret_scanner: false,
            secret_push_prot: false,
            dependabot: false,
            dependabot_alerts: false,
            codeql: false,
        }
    }
}

impl Repository {
    /// Build a descriptor from one repository object of the REST API.
    ///
    /// Languages and Dependabot alert status are not part of that object; they start out empty and
    /// false, and are filled in by [`crate::ops::repositories::enrich`] when asked for.
    pub fn load_json(obj: &Value) -> serde_json::Result<Self> {
        let repo: models::Repository = serde_json::from_value(obj.clone())?;
        Ok(Self::from(repo))
    }

    /// The descriptor as a flat JSON object, keyed by field name.
    pub fn to_json(&self) -> Value {
        // serializing a struct of strings, bools, and vectors cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The inverse of [`Repository::to_json`].
    pub fn from_json(obj: &Value) -> serde_json::Result<Self> {
        serde_json::from_value(obj.clone())
    }

    /// `orga/name`, as shown while working through a listing.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.orga, self.name)
    }
}

impl From<models::Repository> for Repository {
    fn from(repo: models::Repository) -> Self {
        let orga = if repo.owner.owner_type == "Organization" {
            repo.owner.login.clone()
        } else {
            String::new()
        };
        let security = repo.security_and_analysis.unwrap_or_default();

        Repository {
            name: repo.name,
            orga,
            owner: repo.owner.login,
            url: repo.html_url,
            description: repo.description,
            main_language: repo.language,
            languages: Vec::new(),
            default_branch: repo.default_branch,
            license: repo.license.and_then(|l| l.spdx_id),
            archived: repo.archived,
            disabled: repo.disabled,
            updated_at: repo.updated_at,
            ghas: FeatureStatus::is_enabled(&security.advanced_security),
            secret_scanner: FeatureStatus::is_enabled(&security.secret_scanning),
            secret_push_prot: FeatureStatus::is_enabled(&security.secret_scanning_push_protection),
            dependabot: FeatureStatus::is_enabled(&security.dependabot_security_updates),
            dependabot_alerts: false,
            codeql: false,
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        writeln!(f, "[{}]", self.name)?;
        writeln!(f, "    * Organization: {}", self.orga)?;
        writeln!(f, "    * Owner: {}", self.owner)?;
        writeln!(f, "    * Url: {}", self.url)?;
        writeln!(f, "    * Description: {}", opt(&self.description))?;
        writeln!(f, "    * Main language: {}", opt(&self.main_language))?;
        writeln!(f, "    * All languages: {}", self.languages.join(", "))?;
        writeln!(f, "    * Default branch: {}", self.default_branch)?;
        writeln!(f, "    * License: {}", opt(&self.license))?;
        writeln!(f, "    * Archived: {}", self.archived)?;
        writeln!(f, "    * Disabled: {}", self.disabled)?;
        writeln!(f, "    * Last updated at: {}", opt(&self.updated_at))?;
        writeln!(f, "    * GHAS: {}", self.ghas)?;
        writeln!(f, "    * Secret Scanner: {}", self.secret_scanner)?;
        writeln!(f, "    * Secret Scanner Push Protection: {}", self.secret_push_prot)?;
        writeln!(f, "    * Dependabot: {}", self.dependabot)?;
        writeln!(f, "    * Dependabot alerts: {}", self.dependabot_alerts)?;
        write!(f, "    * CodeQL: {}", self.codeql)
    }
}

// -------------------------------------------------------------------------------------------------
// RepoFilter
// -------------------------------------------------------------------------------------------------
/// Client-side criteria for repository listings, applied after each page is decoded.
///
/// Empty string criteria match anything. `archived` and `disabled` must match exactly, so the
/// default filter keeps only active repositories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoFilter {
    pub language: Option<String>,
    pub default_branch: Option<String>,
    pub license: Option<String>,
    pub archived: bool,
    pub disabled: bool,
}

impl RepoFilter {
    /// Why `repo` does not pass this filter, or `None` if it does.
    pub fn rejection(&self, repo: &Repository) -> Option<String> {
        if let Some(language) = &self.language {
            if repo.main_language.as_deref() != Some(language.as_str()) {
                return Some(format!(
                    "language: {language} vs. {}",
                    repo.main_language.as_deref().unwrap_or("-")
                ));
            }
        }
        if let Some(branch) = &self.default_branch {
            if &repo.default_branch != branch {
                return Some(format!("default branch: {branch} vs. {}", repo.default_branch));
            }
        }
        if let Some(license) = &self.license {
            if repo.license.as_deref() != Some(license.as_str()) {
                return Some(format!(
                    "license: {license} vs. {}",
                    repo.license.as_deref().unwrap_or("-")
                ));
            }
        }
        if repo.archived != self.archived {
            return Some(format!("archived: {} vs. {}", self.archived, repo.archived));
        }
        if repo.disabled != self.disabled {
            return Some(format!("disabled: {} vs. {}", self.disabled, repo.disabled));
        }
        None
    }

    pub fn matches(&self, repo: &Repository) -> bool {
        self.rejection(repo).is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn api_object() -> Value {
        json!({
            "id": 1296269,
            "name": "demo",
            "full_name": "Acme/demo",
            "owner": {"login": "Acme", "type": "Organization"},
            "html_url": "https://github.com/Acme/demo",
            "description": "A demo repository",
            "language": "Python",
            "default_branch": "develop",
            "license": {"key": "mit", "spdx_id": "MIT"},
            "archived": false,
            "disabled": false,
            "updated_at": "2023-11-14T22:13:20Z",
            "security_and_analysis": {
                "advanced_security": {"status": "enabled"},
                "secret_scanning": {"status": "enabled"},
                "secret_scanning_push_protection": {"status": "disabled"}
            }
        })
    }

    #[test]
    fn load_json() {
        let repo = Repository::load_json(&api_object()).unwrap();
        assert_eq!(repo.name, "demo");
        assert_eq!(repo.orga, "Acme");
        assert_eq!(repo.default_branch, "develop");
        assert_eq!(repo.license.as_deref(), Some("MIT"));
        assert!(repo.ghas);
        assert!(repo.secret_scanner);
        assert!(!repo.secret_push_prot);
        assert!(!repo.dependabot);
        assert_eq!(repo.full_name(), "Acme/demo");
    }

    #[test]
    fn user_owned_has_no_organization() {
        let mut obj = api_object();
        obj["owner"] = json!({"login": "alice", "type": "User"});
        let repo = Repository::load_json(&obj).unwrap();
        assert_eq!(repo.orga, "");
        assert_eq!(repo.owner, "alice");
    }

    #[test]
    fn round_trip() {
        let repo = Repository::load_json(&api_object()).unwrap();
        let json = repo.to_json();
        assert_eq!(json["main_language"], "Python");
        assert_eq!(json["secret_push_prot"], false);
        assert_eq!(Repository::from_json(&json).unwrap(), repo);
    }

    #[test]
    fn round_trip_without_license() {
        let mut obj = api_object();
        obj.as_object_mut().unwrap().remove("license");
        let repo = Repository::load_json(&obj).unwrap();
        assert_eq!(repo.license, None);

        let json = repo.to_json();
        assert_eq!(json["license"], Value::Null);
        assert_eq!(Repository::from_json(&json).unwrap(), repo);

        obj["license"] = Value::Null;
        assert_eq!(Repository::load_json(&obj).unwrap().license, None);
    }

    #[test]
    fn filter() {
        let repo = Repository::load_json(&api_object()).unwrap();

        assert!(RepoFilter::default().matches(&repo));

        let by_language = |l: &str| RepoFilter {
            language: Some(l.to_string()),
            ..Default::default()
        };
        assert!(by_language("Python").matches(&repo));
        assert_eq!(
            by_language("Go").rejection(&repo).as_deref(),
            Some("language: Go vs. Python")
        );

        let archived = RepoFilter {
            archived: true,
            ..Default::default()
        };
        assert!(!archived.matches(&repo));

        let license = RepoFilter {
            license: Some("Apache-2.0".to_string()),
            ..Default::default()
        };
        assert!(!license.matches(&repo));
    }
}
