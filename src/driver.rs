//! Applying a fixed sequence of steps to every repository in a list.
//!
//! Repositories are processed one at a time in input order, and the steps for each repository run
//! in the order [`Step`] declares them. A failing step never stops later steps or later
//! repositories; it only shows up in that repository's [`ResultRow`].

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::github::Client;
use crate::ops::features::{self, AllowedActions, Feature};
use crate::ops::{issues, repositories};
use crate::progress::Progress;
use crate::templates::IssueTemplate;
use crate::validation::{BranchName, OrgName, RepoName};
use crate::workflow::{self, CODEQL_BRANCH, DEPENDENCY_REVIEW_BRANCH};

// -------------------------------------------------------------------------------------------------
// Step
// -------------------------------------------------------------------------------------------------
/// One thing that can be done to each repository of a run.
///
/// The declaration order is the execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Actions,
    SecretScanning,
    PushProtection,
    Dependabot,
    CodeQl,
    DependencyReview,
    CloseMendIssues,
    Archive,
    Unarchive,
    Topics,
    DependencyExport,
}

impl Step {
    pub const ALL: [Step; 11] = [
        Step::Actions,
        Step::SecretScanning,
        Step::PushProtection,
        Step::Dependabot,
        Step::CodeQl,
        Step::DependencyReview,
        Step::CloseMendIssues,
        Step::Archive,
        Step::Unarchive,
        Step::Topics,
        Step::DependencyExport,
    ];

    /// The column name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Actions => "actions",
            Step::SecretScanning => "secret_scanning",
            Step::PushProtection => "push_protection",
            Step::Dependabot => "dependabot",
            Step::CodeQl => "codeql",
            Step::DependencyReview => "dependency_review",
            Step::CloseMendIssues => "close_mend_issues",
            Step::Archive => "archive",
            Step::Unarchive => "unarchive",
            Step::Topics => "topics",
            Step::DependencyExport => "dependency_export",
        }
    }

    /// The explanatory issue opened after this step succeeds, if any.
    pub fn issue(&self) -> Option<IssueTemplate> {
        match self {
            Step::SecretScanning => Some(IssueTemplate::SecretScanning),
            Step::PushProtection => Some(IssueTemplate::PushProtection),
            Step::Dependabot => Some(IssueTemplate::Dependabot),
            Step::CodeQl => Some(IssueTemplate::CodeQl),
            Step::DependencyReview => Some(IssueTemplate::DependencyReview),
            _ => None,
        }
    }

    /// Deduplicate `steps` and put them in execution order.
    pub fn plan(steps: &[Step]) -> Vec<Step> {
        let mut steps = steps.to_vec();
        steps.sort();
        steps.dedup();
        steps
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    /// Accepts the report column name, with either `_` or `-` as separator.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Step::ALL
            .into_iter()
            .find(|step| step.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Step::ALL.iter().map(Step::as_str).collect();
                format!("unknown step {s:?}; expected one of {}", names.join(", "))
            })
    }
}

// -------------------------------------------------------------------------------------------------
// StepOutcome
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure(String),
    Skipped(String),
    #[default]
    NotAttempted,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failure(_))
    }

    fn from_result<T, E: std::fmt::Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => StepOutcome::Success,
            Err(e) => StepOutcome::Failure(format!("{e:#}")),
        }
    }

    /// The short form used in the per-repository line and the CSV report.
    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Success => "success",
            StepOutcome::Failure(_) => "failure",
            StepOutcome::Skipped(_) => "skipped",
            StepOutcome::NotAttempted => "",
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Failure(reason) | StepOutcome::Skipped(reason) => {
                write!(f, "{}: {reason}", self.label())
            }
            StepOutcome::Success => write!(f, "success"),
            StepOutcome::NotAttempted => write!(f, "not attempted"),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// ResultRow
// -------------------------------------------------------------------------------------------------
/// What happened to one repository.
///
/// Every row of a run has the same steps in the same order, so rows can be written as a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub organization: String,
    pub repository: String,
    pub steps: Vec<(Step, StepOutcome)>,

    /// Explanatory issues, for the steps that have one, when issues were requested
    pub issues: Vec<(Step, StepOutcome)>,

    /// Present when closing Mend issues was requested and the listing worked
    pub mend_issues_closed: Option<usize>,
}

impl ResultRow {
    fn new(organization: &str, repository: &str, steps: &[Step], open_issues: bool) -> Self {
        let issues = if open_issues {
            steps
                .iter()
                .filter(|s| s.issue().is_some())
                .map(|s| (*s, StepOutcome::NotAttempted))
                .collect()
        } else {
            Vec::new()
        };
        ResultRow {
            organization: organization.to_string(),
            repository: repository.to_string(),
            steps: steps.iter().map(|s| (*s, StepOutcome::NotAttempted)).collect(),
            issues,
            mend_issues_closed: None,
        }
    }

    fn set_step(&mut self, step: Step, outcome: StepOutcome) {
        if let Some(entry) = self.steps.iter_mut().find(|(s, _)| *s == step) {
            entry.1 = outcome;
        }
    }

    fn set_issue(&mut self, step: Step, outcome: StepOutcome) {
        if let Some(entry) = self.issues.iter_mut().find(|(s, _)| *s == step) {
            entry.1 = outcome;
        }
    }

    fn skip_all(&mut self, reason: &str) {
        for (_, outcome) in self.steps.iter_mut().chain(self.issues.iter_mut()) {
            *outcome = StepOutcome::Skipped(reason.to_string());
        }
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    pub fn issue_outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.issues.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    pub fn has_failure(&self) -> bool {
        self.steps
            .iter()
            .chain(self.issues.iter())
            .any(|(_, o)| o.is_failure())
    }

    /// Column names for rows shaped like this one.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["organization".to_string(), "repository".to_string()];
        header.extend(self.steps.iter().map(|(s, _)| s.to_string()));
        header.extend(self.issues.iter().map(|(s, _)| format!("{s}_issue")));
        if self.outcome(Step::CloseMendIssues).is_some() {
            header.push("mend_issues_closed".to_string());
        }
        header
    }

    /// Cell values, in the order of [`ResultRow::header`].
    pub fn record(&self) -> Vec<String> {
        let mut record = vec![self.organization.clone(), self.repository.clone()];
        record.extend(self.steps.iter().map(|(_, o)| o.label().to_string()));
        record.extend(self.issues.iter().map(|(_, o)| o.label().to_string()));
        if self.outcome(Step::CloseMendIssues).is_some() {
            record.push(
                self.mend_issues_closed
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            );
        }
        record
    }

    /// A one-line summary, e.g., `Acme/demo: secret_scanning=success archive=failure`.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{}/{}:", self.organization, self.repository);
        for (step, outcome) in &self.steps {
            line.push_str(&format!(" {step}={}", outcome.label()));
        }
        for (step, outcome) in &self.issues {
            line.push_str(&format!(" {step}_issue={}", outcome.label()));
        }
        if let Some(n) = self.mend_issues_closed {
            line.push_str(&format!(" mend_issues_closed={n}"));
        }
        line
    }
}

// -------------------------------------------------------------------------------------------------
// ResultSink
// -------------------------------------------------------------------------------------------------
/// Where the rows of a run go
pub trait ResultSink {
    fn write_row(&mut self, row: &ResultRow) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ResultSink for Vec<ResultRow> {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

/// Writes rows as CSV, with a header taken from the first row
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    wrote_header: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(writer),
            wrote_header: false,
        }
    }
}

impl CsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        if !self.wrote_header {
            self.writer.write_record(row.header())?;
            self.wrote_header = true;
        }
        self.writer.write_record(row.record())?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// DriverOptions
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug)]
pub struct DriverOptions {
    /// Open the explanatory issue after each successful step that has one
    pub open_issues: bool,

    /// Login whose open issues `CloseMendIssues` closes
    pub mend_creator: String,

    /// Where `DependencyExport` writes SBOM documents
    pub sbom_dir: PathBuf,

    pub codeql_branch: BranchName,
    pub dependency_review_branch: BranchName,
    pub allowed_actions: AllowedActions,

    /// Print a line per repository on stdout
    pub echo: bool,

    /// Show a progress bar on stderr
    pub progress: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            open_issues: false,
            mend_creator: issues::MEND_BOT.to_string(),
            sbom_dir: PathBuf::from("."),
            codeql_branch: BranchName::new(CODEQL_BRANCH)
                .expect("default CodeQL branch name should be valid"),
            dependency_review_branch: BranchName::new(DEPENDENCY_REVIEW_BRANCH)
                .expect("default dependency review branch name should be valid"),
            allowed_actions: AllowedActions::default(),
            echo: false,
            progress: false,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// RunSummary
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,

    /// Rows whose name was rejected before any call was made
    pub invalid_names: usize,

    /// Rows with at least one failed step or issue
    pub rows_with_failures: usize,

    pub sink_errors: usize,
}

// -------------------------------------------------------------------------------------------------
// MassDriver
// -------------------------------------------------------------------------------------------------
pub struct MassDriver<'c> {
    client: &'c Client,
    org: OrgName,
    steps: Vec<Step>,
    options: DriverOptions,
}

impl<'c> MassDriver<'c> {
    pub fn new(client: &'c Client, org: OrgName, steps: &[Step], options: DriverOptions) -> Self {
        MassDriver {
            client,
            org,
            steps: Step::plan(steps),
            options,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Process every repository of `names` in order, handing each row to `sink`.
    pub async fn run<S: AsRef<str>>(&self, names: &[S], sink: &mut dyn ResultSink) -> RunSummary {
        let progress = Progress::new_bar(
            names.len() as u64,
            format!("Processing {}", self.org),
            self.options.progress,
        );
        let mut summary = RunSummary::default();

        for name in names {
            let name = name.as_ref();
            progress.set_current(name.to_string());
            let row = self.process(name).await;

            summary.repositories += 1;
            if row.has_failure() {
                summary.rows_with_failures += 1;
            }
            if matches!(row.steps.first(), Some((_, StepOutcome::Skipped(_)))) {
                summary.invalid_names += 1;
            }
            if self.options.echo {
                let line = row.summary_line();
                progress.suspend(|| println!("{line}"));
            }
            if let Err(e) = sink.write_row(&row) {
                error!("Failed to write result row for {}/{name}: {e:#}", self.org);
                summary.sink_errors += 1;
            }
            progress.inc(1);
        }

        if let Err(e) = sink.finish() {
            error!("Failed to finish writing results: {e:#}");
            summary.sink_errors += 1;
        }
        progress.finish_with_message(format!(
            "Processed {} repositories in {}; {} with failures",
            summary.repositories, self.org, summary.rows_with_failures
        ));
        summary
    }

    /// Run every step on one repository.
    pub async fn process(&self, name: &str) -> ResultRow {
        let mut row = ResultRow::new(self.org.as_str(), name, &self.steps, self.options.open_issues);

        let repo = match RepoName::new(name) {
            Ok(repo) => repo,
            Err(e) => {
                warn!("Skipping {name:?}: {e}");
                row.skip_all(&e.to_string());
                return row;
            }
        };

        for &step in &self.steps {
            debug!("Running {step} on {}/{repo}", self.org);
            let outcome = self.run_step(step, &repo, &mut row).await;
            if let StepOutcome::Failure(reason) = &outcome {
                warn!("{step} failed on {}/{repo}: {reason}", self.org);
            }

            if self.options.open_issues {
                if let Some(template) = step.issue() {
                    let issue = if outcome.is_success() {
                        self.open_issue(&repo, template).await
                    } else {
                        StepOutcome::NotAttempted
                    };
                    row.set_issue(step, issue);
                }
            }
            row.set_step(step, outcome);
        }
        row
    }

    async fn run_step(&self, step: Step, repo: &RepoName, row: &mut ResultRow) -> StepOutcome {
        let (client, org) = (self.client, &self.org);
        match step {
            Step::Actions => {
                let feature = Feature::Actions {
                    enabled: true,
                    allowed: self.options.allowed_actions,
                };
                StepOutcome::from_result(features::enable(client, org, repo, feature).await)
            }
            Step::SecretScanning => StepOutcome::from_result(
                features::enable(client, org, repo, Feature::SecretScanning).await,
            ),
            Step::PushProtection => StepOutcome::from_result(
                features::enable(client, org, repo, Feature::PushProtection).await,
            ),
            Step::Dependabot => StepOutcome::from_result(
                features::enable(client, org, repo, Feature::Dependabot).await,
            ),
            Step::CodeQl => StepOutcome::from_result(
                workflow::enable_codeql(client, org, repo, &self.options.codeql_branch).await,
            ),
            Step::DependencyReview => StepOutcome::from_result(
                workflow::enable_dependency_review(
                    client,
                    org,
                    repo,
                    &self.options.dependency_review_branch,
                )
                .await,
            ),
            Step::CloseMendIssues => {
                let creator = &self.options.mend_creator;
                match issues::close_issues_by_creator(client, org, repo, creator).await {
                    Ok(closed) => {
                        row.mend_issues_closed = Some(closed);
                        StepOutcome::Success
                    }
                    Err(e) => StepOutcome::Failure(e.to_string()),
                }
            }
            Step::Archive => StepOutcome::from_result(
                repositories::set_archived(client, org, repo, true).await,
            ),
            Step::Unarchive => StepOutcome::from_result(
                repositories::set_archived(client, org, repo, false).await,
            ),
            Step::Topics => match repositories::list_topics(client, org, repo).await {
                Ok(topics) => {
                    info!("Topics of {org}/{repo}: {}", topics.join(", "));
                    StepOutcome::Success
                }
                Err(e) => StepOutcome::Failure(e.to_string()),
            },
            Step::DependencyExport => StepOutcome::from_result(self.export_sbom(repo).await),
        }
    }

    async fn open_issue(&self, repo: &RepoName, template: IssueTemplate) -> StepOutcome {
        let body = template.body(self.org.as_str(), repo.as_str());
        let result =
            issues::create_issue(self.client, &self.org, repo, template.title(), &body).await;
        if let Err(e) = &result {
            warn!("Failed to open issue {:?} on {}/{repo}: {e}", template.title(), self.org);
        }
        StepOutcome::from_result(result)
    }

    async fn export_sbom(&self, repo: &RepoName) -> Result<PathBuf> {
        let sbom = repositories::export_sbom(self.client, &self.org, repo).await?;
        let path = sbom_path(&self.options.sbom_dir, &self.org, repo);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &sbom)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer.flush()?;
        info!("Wrote SBOM of {}/{repo} to {}", self.org, path.display());
        Ok(path)
    }
}

/// Where the SBOM of a repository is written.
pub fn sbom_path(dir: &Path, org: &OrgName, repo: &RepoName) -> PathBuf {
    dir.join(format!("{org}_{repo}_sbom.json"))
}

/// Read a list of repository names, one per line.
///
/// Surrounding whitespace is dropped, as are blank lines and `#` comments. Names are not validated
/// here; the driver rejects bad ones row by row.
pub fn read_repository_list(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open repository list {}", path.display()))?;
    let mut names = Vec::new();
    for line in BufReader::new(file).lines() {
        let line =
            line.with_context(|| format!("Failed to read repository list {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        names.push(line.to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::testing::{acme, mock_client};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(open_issues: bool) -> DriverOptions {
        DriverOptions {
            open_issues,
            ..Default::default()
        }
    }

    #[test]
    fn plan_is_ordered_and_deduplicated() {
        let plan = Step::plan(&[Step::Topics, Step::SecretScanning, Step::Actions, Step::Topics]);
        assert_eq!(plan, vec![Step::Actions, Step::SecretScanning, Step::Topics]);
    }

    #[test]
    fn step_names() {
        assert_eq!("secret-scanning".parse::<Step>(), Ok(Step::SecretScanning));
        assert_eq!("dependency_export".parse::<Step>(), Ok(Step::DependencyExport));
        assert_eq!("CodeQL".parse::<Step>(), Ok(Step::CodeQl));
        assert!("everything".parse::<Step>().is_err());
        for step in Step::ALL {
            assert_eq!(step.as_str().parse::<Step>(), Ok(step));
        }
    }

    #[tokio::test]
    async fn enable_then_issue() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/Acme/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "demo"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/issues"))
            .and(body_partial_json(json!({"title": "About Secret Scanner"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 1,
                "html_url": "https://github.com/Acme/demo/issues/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let driver = MassDriver::new(&client, acme(), &[Step::SecretScanning], options(true));
        let row = driver.process("demo").await;
        assert_eq!(row.outcome(Step::SecretScanning), Some(&StepOutcome::Success));
        assert_eq!(row.issue_outcome(Step::SecretScanning), Some(&StepOutcome::Success));
    }

    #[tokio::test]
    async fn failed_enable_opens_no_issue() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/Acme/demo"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/issues"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let driver = MassDriver::new(&client, acme(), &[Step::SecretScanning], options(true));
        let row = driver.process("demo").await;
        assert!(row.outcome(Step::SecretScanning).unwrap().is_failure());
        assert_eq!(row.issue_outcome(Step::SecretScanning), Some(&StepOutcome::NotAttempted));
    }

    #[tokio::test]
    async fn mass_archive_continues_past_failure() {
        let server = MockServer::start().await;
        for (name, status) in [("one", 200), ("two", 422), ("three", 200)] {
            Mock::given(method("PATCH"))
                .and(path(format!("/repos/Acme/{name}")))
                .and(body_partial_json(json!({"archived": true})))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({"name": name})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = mock_client(&server);
        let driver = MassDriver::new(&client, acme(), &[Step::Archive], options(false));
        let mut rows: Vec<ResultRow> = Vec::new();
        let summary = driver.run(&["one", "two", "three"], &mut rows).await;

        assert_eq!(summary.repositories, 3);
        assert_eq!(summary.rows_with_failures, 1);
        let outcomes: Vec<(&str, bool)> = rows
            .iter()
            .map(|r| (r.repository.as_str(), r.outcome(Step::Archive).unwrap().is_success()))
            .collect();
        assert_eq!(outcomes, vec![("one", true), ("two", false), ("three", true)]);
    }

    #[tokio::test]
    async fn invalid_names_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let driver =
            MassDriver::new(&client, acme(), &[Step::Archive, Step::SecretScanning], options(true));
        let mut rows: Vec<ResultRow> = Vec::new();
        let summary = driver.run(&["../etc"], &mut rows).await;

        assert_eq!(summary.invalid_names, 1);
        let row = &rows[0];
        assert!(row
            .steps
            .iter()
            .chain(row.issues.iter())
            .all(|(_, o)| matches!(o, StepOutcome::Skipped(_))));
    }

    #[tokio::test]
    async fn csv_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/Acme/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/Acme/demo/issues"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let steps = [Step::CloseMendIssues, Step::SecretScanning];
        let driver = MassDriver::new(&client, acme(), &steps, options(true));
        let mut sink = CsvSink::new(Vec::new());
        let summary = driver.run(&["demo"], &mut sink).await;
        assert_eq!(summary.sink_errors, 0);

        let output = String::from_utf8(sink.writer.get_ref().clone()).unwrap();
        assert_eq!(
            output,
            "organization,repository,secret_scanning,close_mend_issues,secret_scanning_issue,mend_issues_closed\n\
             Acme,demo,success,success,failure,0\n"
        );
    }

    struct BrokenSink;

    impl ResultSink for BrokenSink {
        fn write_row(&mut self, _row: &ResultRow) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn sink_errors_are_counted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"names": ["rust"]})))
            .expect(2)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let driver = MassDriver::new(&client, acme(), &[Step::Topics], options(false));
        let summary = driver.run(&["demo", "demo"], &mut BrokenSink).await;
        assert_eq!(summary.repositories, 2);
        assert_eq!(summary.sink_errors, 2);
    }

    #[test]
    fn repository_list() {
        use assert_fs::prelude::*;

        let dir = assert_fs::TempDir::new().unwrap();
        let list = dir.child("repos.txt");
        list.write_str("demo\n\n  api  \n# retired\nweb\n").unwrap();
        assert_eq!(read_repository_list(list.path()).unwrap(), vec!["demo", "api", "web"]);
        assert!(read_repository_list(&dir.path().join("missing.txt")).is_err());
    }

    #[tokio::test]
    async fn sbom_export() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/dependency-graph/sbom"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sbom": {"spdxVersion": "SPDX-2.3"}})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = assert_fs::TempDir::new().unwrap();
        let client = mock_client(&server);
        let options = DriverOptions {
            sbom_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let driver = MassDriver::new(&client, acme(), &[Step::DependencyExport], options);
        let row = driver.process("demo").await;
        assert_eq!(row.outcome(Step::DependencyExport), Some(&StepOutcome::Success));

        let written = std::fs::read_to_string(dir.path().join("Acme_demo_sbom.json")).unwrap();
        let written: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(written["sbom"]["spdxVersion"], "SPDX-2.3");
    }
}
