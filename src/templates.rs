//! Files committed to repositories and issue bodies, embedded at build time.

use include_dir::{include_dir, Dir};

use crate::ops::repositories::DEFAULT_LANGUAGE;

// NOTE: `include_dir` does not always notice new files under incremental builds; touch this file
// after adding a template.
pub static TEMPLATES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// The line of the CodeQL workflow templates that names the branch to scan
const BRANCHES_LINE: &str = r#"    branches: ["main"]"#;

/// The contents of an embedded template, if there is one by that name.
pub fn get(name: &str) -> Option<&'static str> {
    TEMPLATES_DIR.get_file(name).and_then(|f| f.contents_utf8())
}

/// A template selected for a language, after falling back to the generic one if needed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    /// The language whose template was used, i.e., `default` after a fallback
    pub language: String,
    pub content: String,
}

fn for_language(prefix: &str, language: &str) -> (String, &'static str) {
    let language = language.to_lowercase();
    if let Some(content) = get(&format!("{prefix}-{language}.yml")) {
        return (language, content);
    }
    let content = get(&format!("{prefix}-{DEFAULT_LANGUAGE}.yml")).unwrap_or_default();
    (DEFAULT_LANGUAGE.to_string(), content)
}

/// The CodeQL workflow for `language`, set to scan `default_branch`.
pub fn codeql_workflow(language: &str, default_branch: &str) -> Rendered {
    let (language, template) = for_language("codeql-analysis", language);
    let replacement = format!("    branches: ['{default_branch}']");
    let content = template
        .split_inclusive('\n')
        .map(|line| match line.strip_suffix('\n') {
            Some(BRANCHES_LINE) => format!("{replacement}\n"),
            None if line == BRANCHES_LINE => replacement.clone(),
            _ => line.to_string(),
        })
        .collect();
    Rendered { language, content }
}

/// The CodeQL configuration file for `language`.
pub fn codeql_config(language: &str) -> Rendered {
    let (language, content) = for_language("codeql-config", language);
    Rendered {
        language,
        content: content.to_string(),
    }
}

pub fn dependency_enforcement_workflow() -> &'static str {
    get("dependency_enforcement.yml").unwrap_or_default()
}

// -------------------------------------------------------------------------------------------------
// IssueTemplate
// -------------------------------------------------------------------------------------------------
/// The explanatory issue opened after a feature is rolled out to a repository
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IssueTemplate {
    SecretScanning,
    PushProtection,
    Dependabot,
    CodeQl,
    DependencyReview,
}

impl IssueTemplate {
    pub fn title(&self) -> &'static str {
        match self {
            IssueTemplate::SecretScanning => "About Secret Scanner",
            IssueTemplate::PushProtection => "About Secret Scanner Push Protection",
            IssueTemplate::Dependabot => "About Dependabot",
            IssueTemplate::CodeQl => "About CodeQL",
            IssueTemplate::DependencyReview => "About Dependency Review",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            IssueTemplate::SecretScanning => "secret_scanner.md",
            IssueTemplate::PushProtection => "secret_scanner_push_protection.md",
            IssueTemplate::Dependabot => "dependabot.md",
            IssueTemplate::CodeQl => "codeql.md",
            IssueTemplate::DependencyReview => "dependency_reviewer.md",
        }
    }

    /// The Markdown body, with the organization and repository filled in.
    pub fn body(&self, organization: &str, repository: &str) -> String {
        get(self.file_name())
            .unwrap_or_default()
            .replace("{organization}", organization)
            .replace("{repository}", repository)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const ISSUES: [IssueTemplate; 5] = [
        IssueTemplate::SecretScanning,
        IssueTemplate::PushProtection,
        IssueTemplate::Dependabot,
        IssueTemplate::CodeQl,
        IssueTemplate::DependencyReview,
    ];

    #[test]
    fn everything_is_embedded() {
        for name in ["codeql-analysis-default.yml", "codeql-config-default.yml", "dependency_enforcement.yml"] {
            assert!(get(name).is_some(), "{name} is missing");
        }
        for issue in ISSUES {
            assert!(get(issue.file_name()).is_some(), "{} is missing", issue.file_name());
        }
    }

    #[test]
    fn workflow_default_branch() {
        let rendered = codeql_workflow("Python", "develop");
        assert_eq!(rendered.language, "python");
        assert!(rendered.content.contains("    branches: ['develop']\n"));
        assert!(!rendered.content.contains(BRANCHES_LINE));
    }

    #[test]
    fn workflow_fallback() {
        let rendered = codeql_workflow("cobol", "main");
        assert_eq!(rendered.language, "default");
        assert_eq!(
            rendered.content.lines().count(),
            get("codeql-analysis-default.yml").unwrap().lines().count()
        );

        let config = codeql_config("cobol");
        assert_eq!(config.language, "default");
        assert_eq!(config.content, get("codeql-config-default.yml").unwrap());
    }

    #[test]
    fn issue_bodies() {
        let body = IssueTemplate::SecretScanning.body("Acme", "demo");
        assert!(body.contains("`Acme/demo`"));
        assert!(!body.contains("{organization}"));
        assert_eq!(IssueTemplate::SecretScanning.title(), "About Secret Scanner");
    }
}
