//! Validation of names that get interpolated into API URLs and file paths.
//!
//! Every organization, repository, and branch name coming from the command line or from an input
//! list passes through here before any request is built. The newtypes below can only be
//! constructed through validation, so an operation that takes a `&RepoName` never sees a
//! malformed or malicious string.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 1-39 characters, alphanumerics or hyphens, no leading or trailing hyphen
    static ref ORGANIZATION_NAME_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,37}[a-zA-Z0-9])?$")
            .expect("organization name regex should compile");

    static ref REPOSITORY_NAME_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._-]{1,100}$")
            .expect("repository name regex should compile");

    static ref TEAM_SLUG_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9_-]{1,255}$")
            .expect("team slug regex should compile");

    static ref BRANCH_NAME_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._/-]{1,255}$")
            .expect("branch name regex should compile");
}

// -------------------------------------------------------------------------------------------------
// NameKind
// -------------------------------------------------------------------------------------------------
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameKind {
    Organization,
    Repository,
    Team,
    Branch,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NameKind::Organization => "organization",
            NameKind::Repository => "repository",
            NameKind::Team => "team",
            NameKind::Branch => "branch",
        };
        write!(f, "{s}")
    }
}

// -------------------------------------------------------------------------------------------------
// ValidationError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty(NameKind),
    PathTraversal { kind: NameKind, name: String },
    LeadingOrTrailingHyphen { kind: NameKind, name: String },
    InvalidFormat { kind: NameKind, name: String },
}

impl ValidationError {
    pub fn kind(&self) -> NameKind {
        match self {
            ValidationError::Empty(kind) => *kind,
            ValidationError::PathTraversal { kind, .. } => *kind,
            ValidationError::LeadingOrTrailingHyphen { kind, .. } => *kind,
            ValidationError::InvalidFormat { kind, .. } => *kind,
        }
    }

    pub fn is_path_traversal(&self) -> bool {
        matches!(self, ValidationError::PathTraversal { .. })
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty(kind) => write!(f, "{kind} name cannot be empty"),
            ValidationError::PathTraversal { kind, name } => write!(
                f,
                "invalid {kind} name {name:?}: path traversal sequences are not allowed"
            ),
            ValidationError::LeadingOrTrailingHyphen { kind, name } => write!(
                f,
                "invalid {kind} name {name:?}: cannot start or end with a hyphen"
            ),
            ValidationError::InvalidFormat { kind, name } => {
                let rule = match kind {
                    NameKind::Organization => {
                        "must be 1-39 characters of alphanumerics or hyphens"
                    }
                    NameKind::Repository => {
                        "must be 1-100 characters of alphanumerics, hyphens, underscores, or periods"
                    }
                    NameKind::Team => {
                        "must be 1-255 characters of alphanumerics, hyphens, or underscores"
                    }
                    NameKind::Branch => {
                        "must be 1-255 characters of alphanumerics, hyphens, underscores, periods, or slashes"
                    }
                };
                write!(f, "invalid {kind} name {name:?}: {rule}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type Result<T> = std::result::Result<T, ValidationError>;

// -------------------------------------------------------------------------------------------------
// validation functions
// -------------------------------------------------------------------------------------------------
pub fn validate_organization_name(name: &str) -> Result<&str> {
    let kind = NameKind::Organization;
    if name.is_empty() {
        return Err(ValidationError::Empty(kind));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(ValidationError::LeadingOrTrailingHyphen {
            kind,
            name: name.to_string(),
        });
    }
    if !ORGANIZATION_NAME_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidFormat {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name)
}

pub fn validate_repository_name(name: &str) -> Result<&str> {
    let kind = NameKind::Repository;
    if name.is_empty() {
        return Err(ValidationError::Empty(kind));
    }
    if name == "." || name.contains("..") || name.starts_with('/') || name.starts_with('\\') {
        return Err(ValidationError::PathTraversal {
            kind,
            name: name.to_string(),
        });
    }
    if !REPOSITORY_NAME_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidFormat {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name)
}

/// Team slugs are lowercased names with spaces replaced by hyphens.
pub fn validate_team_slug(name: &str) -> Result<&str> {
    let kind = NameKind::Team;
    if name.is_empty() {
        return Err(ValidationError::Empty(kind));
    }
    if name.contains("..") || name.starts_with('/') {
        return Err(ValidationError::PathTraversal {
            kind,
            name: name.to_string(),
        });
    }
    if !TEAM_SLUG_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidFormat {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name)
}

pub fn validate_branch_name(name: &str) -> Result<&str> {
    let kind = NameKind::Branch;
    if name.is_empty() {
        return Err(ValidationError::Empty(kind));
    }
    if name.contains("..") || name.starts_with('/') || name.ends_with('/') {
        return Err(ValidationError::PathTraversal {
            kind,
            name: name.to_string(),
        });
    }
    if !BRANCH_NAME_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidFormat {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name)
}

// -------------------------------------------------------------------------------------------------
// validated names
// -------------------------------------------------------------------------------------------------
macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident, $validate:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: &str) -> Result<Self> {
                $validate(name).map(|n| Self(n.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_name!(
    /// A GitHub organization (or enterprise) login that has passed validation
    OrgName,
    validate_organization_name
);

validated_name!(
    /// A repository name that has passed validation
    RepoName,
    validate_repository_name
);

validated_name!(
    /// A team slug that has passed validation
    TeamSlug,
    validate_team_slug
);

validated_name!(
    /// A Git branch name that has passed validation
    BranchName,
    validate_branch_name
);

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn repository_traversal_01() {
        let err = validate_repository_name("../etc").unwrap_err();
        assert!(err.is_path_traversal());
        assert_eq!(err.kind(), NameKind::Repository);
    }

    #[test]
    fn repository_traversal_02() {
        assert!(validate_repository_name("/etc/passwd")
            .unwrap_err()
            .is_path_traversal());
    }

    #[test]
    fn repository_traversal_03() {
        assert!(validate_repository_name("\\windows").unwrap_err().is_path_traversal());
    }

    #[test]
    fn repository_ok() {
        assert_eq!(validate_repository_name("my-repo_1.0"), Ok("my-repo_1.0"));
        assert_eq!(validate_repository_name(".github"), Ok(".github"));
    }

    #[test]
    fn repository_bad_chars() {
        assert_eq!(
            validate_repository_name("my repo"),
            Err(ValidationError::InvalidFormat {
                kind: NameKind::Repository,
                name: "my repo".to_string()
            })
        );
        assert!(validate_repository_name(&"a".repeat(101)).is_err());
        assert!(validate_repository_name("").is_err());
    }

    #[test]
    fn organization_hyphens() {
        assert_eq!(
            validate_organization_name("-bad-"),
            Err(ValidationError::LeadingOrTrailingHyphen {
                kind: NameKind::Organization,
                name: "-bad-".to_string()
            })
        );
        assert!(matches!(
            validate_organization_name("bad-"),
            Err(ValidationError::LeadingOrTrailingHyphen { .. })
        ));
    }

    #[test]
    fn organization_ok() {
        assert_eq!(validate_organization_name("Acme"), Ok("Acme"));
        assert_eq!(validate_organization_name("a"), Ok("a"));
        assert_eq!(validate_organization_name("acme-corp-2"), Ok("acme-corp-2"));
    }

    #[test]
    fn organization_too_long() {
        assert!(validate_organization_name(&"a".repeat(39)).is_ok());
        assert!(validate_organization_name(&"a".repeat(40)).is_err());
    }

    #[test]
    fn organization_bad_chars() {
        assert!(validate_organization_name("acme_corp").is_err());
        assert!(validate_organization_name("acme/corp").is_err());
        assert_eq!(validate_organization_name(""), Err(ValidationError::Empty(NameKind::Organization)));
    }

    #[test]
    fn branch_names() {
        assert_eq!(validate_branch_name("feature/ghas-rollout"), Ok("feature/ghas-rollout"));
        assert!(validate_branch_name("feature/../main").unwrap_err().is_path_traversal());
        assert!(validate_branch_name("/main").unwrap_err().is_path_traversal());
        assert!(validate_branch_name("main/").unwrap_err().is_path_traversal());
        assert!(validate_branch_name("main branch").is_err());
    }

    #[test]
    fn team_slugs() {
        assert_eq!(validate_team_slug("security-appsec"), Ok("security-appsec"));
        assert!(validate_team_slug("..").unwrap_err().is_path_traversal());
        assert!(validate_team_slug("a/b").is_err());
        assert!(validate_repository_name(".").unwrap_err().is_path_traversal());
    }

    #[test]
    fn newtype_from_str() {
        let repo: RepoName = "demo".parse().unwrap();
        assert_eq!(repo.as_str(), "demo");
        assert!("../demo".parse::<RepoName>().is_err());
        assert!("-acme".parse::<OrgName>().is_err());
    }

    proptest! {
        #[test]
        fn repository_names_with_dotdot_rejected(prefix in "[a-z]{0,10}", suffix in "[a-z]{0,10}") {
            let name = format!("{prefix}..{suffix}");
            prop_assert!(validate_repository_name(&name).unwrap_err().is_path_traversal());
        }

        #[test]
        fn accepted_repository_names_never_contain_slashes(name in "\\PC{1,30}") {
            if validate_repository_name(&name).is_ok() {
                prop_assert!(!name.contains('/'));
                prop_assert!(!name.contains('\\'));
            }
        }
    }
}
