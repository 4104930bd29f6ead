use anyhow::{Context, Result};
use clap::{crate_description, crate_version, ArgAction, Args, Parser, Subcommand, ValueEnum};
use indoc::indoc;
use std::path::PathBuf;
use std::time::Duration;

use ghas::driver::Step;
use ghas::ops::alerts::RepoSelection;
use ghas::github::ClientConfig;
use ghas::ops::code_security::AttachScope;
use ghas::ops::features::AllowedActions;
use ghas::ops::issues::MEND_BOT;
use ghas::ops::repositories::RepoType;
use ghas::templates::IssueTemplate;
use ghas::validation::{BranchName, OrgName, RepoName, TeamSlug};
use ghas::workflow::{CODEQL_BRANCH, DEPENDENCY_REVIEW_BRANCH};

// -----------------------------------------------------------------------------
// command-line args
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,

    long_version = concat!(
        crate_version!(),
    ),

    long_about = concat!(
        crate_description!(),
    ),
)]
#[deny(missing_docs)]
/// Roll out and audit GitHub Advanced Security across an organization
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let mut s = Self::parse();

        // If `NO_COLOR` is set in the environment, disable colored output
        //
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            s.global_args.color = Mode::Never
        }

        s
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and change individual repositories
    #[command(display_order = 1, subcommand)]
    Repositories(RepositoriesCommand),

    /// Apply steps to every repository of a list
    ///
    /// Repositories are processed one at a time, in the order of the input file, and every
    /// selected step runs on each of them in a fixed order regardless of the order given here.
    /// A failing step does not stop later steps or later repositories.
    ///
    /// One CSV row per repository is written to the output file, if one is given.
    #[command(display_order = 2)]
    Mass(MassArgs),

    /// Open explanatory issues and close bot issues
    #[command(display_order = 3, subcommand)]
    Issues(IssuesCommand),

    /// Inspect organization teams
    #[command(display_order = 4, subcommand)]
    Teams(TeamsCommand),

    /// Create and assign custom repository roles
    #[command(display_order = 5, subcommand)]
    Roles(RolesCommand),

    /// List security alerts
    #[command(display_order = 6, subcommand)]
    Alerts(AlertsCommand),

    /// Configure GitHub Actions and inspect GHAS workflow runs
    #[command(display_order = 7, subcommand)]
    Actions(ActionsCommand),

    /// Inspect and attach code security configurations
    #[command(display_order = 8, subcommand, name = "security-configs")]
    SecurityConfigs(SecurityConfigsCommand),
}

// -----------------------------------------------------------------------------
// global options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output
    ///
    /// This can be repeated up to 3 times to enable successively more output.
    #[arg(global=true, long, short, action=ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log messages
    ///
    /// This overrides any occurrences of the `--verbose` option.
    #[arg(global = true, long, short)]
    pub quiet: bool,

    /// Enable or disable colored output
    ///
    /// When this is "auto", colors are enabled when stdout is a tty.
    ///
    /// If the `NO_COLOR` environment variable is set, it takes precedence and is equivalent to `--color=never`.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub color: Mode,

    /// Enable or disable progress bars
    ///
    /// When this is "auto", progress bars are enabled when stderr is a tty.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub progress: Mode,

    #[command(flatten)]
    pub github: GitHubArgs,
}

impl GlobalArgs {
    pub fn use_color(&self) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => console::user_attended(),
        }
    }

    pub fn use_progress(&self) -> bool {
        match self.progress {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => console::user_attended_stderr(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    Auto,
    Never,
    Always,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Never => "never",
            Mode::Always => "always",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// GitHub connection options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "GitHub Options")]
pub struct GitHubArgs {
    /// Authenticate to GitHub with this token
    #[arg(global = true, long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Use the specified URL for GitHub API access
    ///
    /// If accessing a GitHub Enterprise Server instance, this value should be the entire base URL
    /// including the `api/v3` portion, e.g., `https://github.example.com/api/v3`.
    #[arg(
        global = true,
        long,
        value_name = "URL",
        default_value = "https://api.github.com/",
        value_hint = clap::ValueHint::Url,
    )]
    pub github_api_url: url::Url,

    /// Ignore validation of TLS certificates
    #[arg(global = true, long)]
    pub ignore_certs: bool,

    /// Attempts per API operation before giving up
    #[arg(global = true, long, value_name = "N", default_value_t = ClientConfig::DEFAULT_RETRIES,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    /// Delay after each API request, in milliseconds
    #[arg(global = true, long, value_name = "MS", default_value_t = 1000)]
    pub request_delay_ms: u64,

    /// How long to wait on primary rate limiting when the reset time is unknown, in seconds
    #[arg(global = true, long, value_name = "SECONDS", default_value_t = 60)]
    pub rate_limit_fallback_secs: u64,
}

impl GitHubArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .retries(self.retries)
            .request_delay(Duration::from_millis(self.request_delay_ms))
            .rate_limit_fallback(Duration::from_secs(self.rate_limit_fallback_secs))
    }
}

// -----------------------------------------------------------------------------
// common arguments
// -----------------------------------------------------------------------------
#[derive(Args, Debug, Clone)]
pub struct OrgArgs {
    /// The organization that owns the repositories
    #[arg(long, short = 'O', visible_alias = "org", value_name = "NAME")]
    pub organization: OrgName,
}

#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The repository name, without the organization
    #[arg(long, short = 'r', value_name = "NAME")]
    pub repository: RepoName,
}

// -----------------------------------------------------------------------------
// `repositories` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum RepositoriesCommand {
    /// List the repositories of an organization
    List(RepositoriesListArgs),

    /// Show the descriptor of one repository
    Details(RepositoryOutputArgs),

    /// Enable a security feature on a repository
    Enable(RepositoriesEnableArgs),

    /// Archive or unarchive a repository
    Archive(RepositoriesArchiveArgs),

    /// List the topics of a repository
    Topics(RepositoryOutputArgs),

    /// Export the SBOM of a repository
    Sbom(RepositoriesSbomArgs),

    /// Open a pull request adding CodeQL analysis workflows
    #[command(name = "codeql")]
    CodeQl(RepositoriesWorkflowArgs),

    /// Open a pull request adding the dependency review workflow
    DependencyReview(RepositoriesWorkflowArgs),
}

#[derive(Args, Debug)]
pub struct RepositoriesListArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// Which repositories to list
    #[arg(long = "type", value_name = "TYPE", default_value_t = RepoTypeArg::All)]
    pub repo_type: RepoTypeArg,

    /// Keep only repositories whose main language is this one
    #[arg(long, value_name = "LANGUAGE")]
    pub language: Option<String>,

    /// Keep only repositories whose default branch is this one
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,

    /// Keep only repositories with this license (SPDX id)
    #[arg(long, value_name = "SPDX")]
    pub license: Option<String>,

    /// Include archived repositories
    #[arg(long)]
    pub archived: bool,

    /// Include disabled repositories
    #[arg(long)]
    pub disabled: bool,

    /// Fetch languages and Dependabot alert status for each listed repository
    ///
    /// This costs two more requests per repository.
    #[arg(long)]
    pub details: bool,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RepoTypeArg {
    All,
    Public,
    Private,
    Forks,
    Sources,
    Member,
    Internal,
}

impl std::fmt::Display for RepoTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", RepoType::from(self).as_str())
    }
}

impl From<&RepoTypeArg> for RepoType {
    fn from(arg: &RepoTypeArg) -> Self {
        match arg {
            RepoTypeArg::All => RepoType::All,
            RepoTypeArg::Public => RepoType::Public,
            RepoTypeArg::Private => RepoType::Private,
            RepoTypeArg::Forks => RepoType::Forks,
            RepoTypeArg::Sources => RepoType::Sources,
            RepoTypeArg::Member => RepoType::Member,
            RepoTypeArg::Internal => RepoType::Internal,
        }
    }
}

#[derive(Args, Debug)]
pub struct RepositoryOutputArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct RepositoriesEnableArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// The feature to enable
    #[arg(value_name = "FEATURE")]
    pub feature: FeatureArg,

    /// Also open the explanatory issue once the feature is enabled
    #[arg(long)]
    pub issue: bool,

    #[command(flatten)]
    pub actions_args: ActionsPolicyArgs,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeatureArg {
    SecretScanning,
    PushProtection,
    Dependabot,
    Actions,
}

#[derive(Args, Debug, Clone)]
pub struct ActionsPolicyArgs {
    /// Which actions repositories may run, when enabling Actions
    #[arg(long, value_name = "POLICY", default_value_t = AllowedActionsArg::All)]
    pub allowed_actions: AllowedActionsArg,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AllowedActionsArg {
    All,
    LocalOnly,
    Selected,
}

impl std::fmt::Display for AllowedActionsArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AllowedActions::from(self).as_str().replace('_', "-"))
    }
}

impl From<&AllowedActionsArg> for AllowedActions {
    fn from(arg: &AllowedActionsArg) -> Self {
        match arg {
            AllowedActionsArg::All => AllowedActions::All,
            AllowedActionsArg::LocalOnly => AllowedActions::LocalOnly,
            AllowedActionsArg::Selected => AllowedActions::Selected,
        }
    }
}

#[derive(Args, Debug)]
pub struct RepositoriesArchiveArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Unarchive instead of archiving
    #[arg(long)]
    pub unarchive: bool,
}

#[derive(Args, Debug)]
pub struct RepositoriesSbomArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Write the SBOM to the specified path
    ///
    /// If this argument is not provided, stdout will be used.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RepositoriesWorkflowArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// The branch to commit to; defaults to a fixed name per workflow
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<BranchName>,

    /// Also open the explanatory issue once the pull request is open
    #[arg(long)]
    pub issue: bool,
}

// -----------------------------------------------------------------------------
// `mass` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct MassArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The steps to apply to each repository
    #[arg(
        value_name = "STEP",
        required = true,
        num_args = 1..,
        long_help = indoc! {"
            The steps to apply to each repository

            One or more of: actions, secret-scanning, push-protection, dependabot, codeql,
            dependency-review, close-mend-issues, archive, unarchive, topics, dependency-export.
            They always run in that order."},
    )]
    pub steps: Vec<Step>,

    /// File with one repository name per line
    ///
    /// Blank lines and lines starting with `#` are ignored.
    #[arg(long, short, value_name = "FILE")]
    pub input: PathBuf,

    /// Write one CSV row per repository to the specified path
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Open the explanatory issue after each successful step that has one
    #[arg(long)]
    pub issues: bool,

    /// The login whose open issues `close-mend-issues` closes
    #[arg(long, value_name = "LOGIN", default_value = MEND_BOT)]
    pub mend_creator: String,

    /// Directory `dependency-export` writes SBOM documents to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub sbom_dir: PathBuf,

    /// Branch used by the `codeql` step
    #[arg(long, value_name = "BRANCH", default_value = CODEQL_BRANCH)]
    pub codeql_branch: BranchName,

    /// Branch used by the `dependency-review` step
    #[arg(long, value_name = "BRANCH", default_value = DEPENDENCY_REVIEW_BRANCH)]
    pub dependency_review_branch: BranchName,

    #[command(flatten)]
    pub actions_args: ActionsPolicyArgs,
}

// -----------------------------------------------------------------------------
// `issues` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum IssuesCommand {
    /// Open an explanatory issue
    Create(IssuesCreateArgs),

    /// Close the open issues opened by the Mend bot
    CloseMend(IssuesCloseMendArgs),
}

#[derive(Args, Debug)]
pub struct IssuesCreateArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Which explanatory issue to open
    #[arg(value_name = "TEMPLATE")]
    pub template: IssueTemplateArg,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum IssueTemplateArg {
    SecretScanning,
    PushProtection,
    Dependabot,
    #[value(name = "codeql")]
    CodeQl,
    DependencyReview,
}

impl From<&IssueTemplateArg> for IssueTemplate {
    fn from(arg: &IssueTemplateArg) -> Self {
        match arg {
            IssueTemplateArg::SecretScanning => IssueTemplate::SecretScanning,
            IssueTemplateArg::PushProtection => IssueTemplate::PushProtection,
            IssueTemplateArg::Dependabot => IssueTemplate::Dependabot,
            IssueTemplateArg::CodeQl => IssueTemplate::CodeQl,
            IssueTemplateArg::DependencyReview => IssueTemplate::DependencyReview,
        }
    }
}

#[derive(Args, Debug)]
pub struct IssuesCloseMendArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Close the issues opened by this login instead
    #[arg(long, value_name = "LOGIN", default_value = MEND_BOT)]
    pub creator: String,
}

// -----------------------------------------------------------------------------
// `teams` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum TeamsCommand {
    /// List the team slugs of an organization
    List(TeamsListArgs),

    /// List the repositories a team has access to
    Repositories(TeamArgs),

    /// Show a team's permission on a repository
    Permission(TeamsPermissionArgs),
}

#[derive(Args, Debug)]
pub struct TeamsListArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The team slug
    #[arg(long, short = 't', value_name = "SLUG")]
    pub team: TeamSlug,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct TeamsPermissionArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// The team slug
    #[arg(long, short = 't', value_name = "SLUG")]
    pub team: TeamSlug,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `roles` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// Create a custom repository role
    Create(RolesCreateArgs),

    /// Give a team a role on a repository
    Assign(RolesAssignArgs),

    /// Move every team holding one role on a repository to another role
    ///
    /// Every (team, repository) pair of the organization is classified first, and each
    /// classification is appended to the checkpoint file as it is made. Running the command
    /// again with the same checkpoint file skips the pairs already classified.
    Reassign(RolesReassignArgs),
}

#[derive(Args, Debug)]
pub struct RolesCreateArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The role name
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// The role description
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,

    /// The built-in role this one extends
    #[arg(long, value_name = "ROLE", default_value = "read")]
    pub base_role: String,

    /// A fine-grained permission to add; can be repeated
    #[arg(long = "permission", value_name = "PERMISSION")]
    pub permissions: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RolesAssignArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// The team slug
    #[arg(long, short = 't', value_name = "SLUG")]
    pub team: TeamSlug,

    /// The role to give
    #[arg(long, value_name = "ROLE")]
    pub role: String,
}

#[derive(Args, Debug)]
pub struct RolesReassignArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The role to move teams away from
    #[arg(long, value_name = "ROLE")]
    pub from: String,

    /// The role to give instead
    #[arg(long, value_name = "ROLE")]
    pub to: String,

    /// CSV file recording classified (team, repository, permission) rows
    #[arg(long, value_name = "FILE", default_value = "role_reassignment.csv")]
    pub checkpoint: PathBuf,
}

// -----------------------------------------------------------------------------
// `alerts` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List the secret scanning alerts of an organization
    Secrets(AlertsSecretsArgs),

    /// List the code scanning alerts of some or all repositories of an organization
    CodeScanning(AlertsCodeScanningArgs),

    /// List the Dependabot alerts of a repository
    Dependabot(AlertsRepositoryArgs),
}

#[derive(Args, Debug)]
pub struct AlertsRepositoryArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Only list alerts in this state
    #[arg(long, value_name = "STATE", default_value = "open")]
    pub state: String,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct AlertsCodeScanningArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// A repository to list alerts of, without the organization
    ///
    /// This option can be repeated.
    #[arg(
        long = "repository",
        short = 'r',
        value_name = "NAME",
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub repositories: Vec<RepoName>,

    /// List alerts of every active repository of the organization
    #[arg(long)]
    pub all: bool,

    /// Only list alerts in this state
    #[arg(long, value_name = "STATE", default_value = "open")]
    pub state: String,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

impl AlertsSecretsArgs {
    /// The secret type to filter on, if any.
    pub fn secret_type_filter(&self) -> Option<&str> {
        self.secret_type.as_deref().filter(|t| !t.eq_ignore_ascii_case("all"))
    }
}

impl AlertsCodeScanningArgs {
    pub fn selection(&self) -> RepoSelection {
        if self.all {
            RepoSelection::All
        } else {
            RepoSelection::Named(self.repositories.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct AlertsSecretsArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// Only list alerts in this state
    #[arg(long, value_name = "STATE", default_value = "open")]
    pub state: String,

    /// Only list alerts for this secret type
    ///
    /// The value `all` is the same as leaving this out.
    #[arg(long, value_name = "TYPE")]
    pub secret_type: Option<String>,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `actions` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum ActionsCommand {
    /// Set the Actions permissions of a repository
    Permissions(ActionsPermissionsArgs),

    /// List recent workflow runs triggered by GHAS bots
    GhasRuns(ActionsGhasRunsArgs),
}

#[derive(Args, Debug)]
pub struct ActionsPermissionsArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Disable Actions instead of enabling them
    #[arg(long)]
    pub disable: bool,

    #[command(flatten)]
    pub actions_args: ActionsPolicyArgs,
}

#[derive(Args, Debug)]
pub struct ActionsGhasRunsArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// How many days back to look
    #[arg(long, value_name = "DAYS", default_value_t = 7)]
    pub days: u32,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `security-configs` command
// -----------------------------------------------------------------------------
#[derive(Subcommand, Debug)]
pub enum SecurityConfigsCommand {
    /// List the code security configurations of an organization or enterprise
    List(SecurityConfigsListArgs),

    /// Show one code security configuration of an organization
    Show(SecurityConfigsShowArgs),

    /// Attach a code security configuration to repositories
    Attach(SecurityConfigsAttachArgs),
}

#[derive(Args, Debug)]
pub struct SecurityConfigsListArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// Treat the name as an enterprise rather than an organization
    #[arg(long)]
    pub enterprise: bool,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct SecurityConfigsShowArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The configuration id
    #[arg(long, value_name = "ID")]
    pub id: u64,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

#[derive(Args, Debug)]
pub struct SecurityConfigsAttachArgs {
    #[command(flatten)]
    pub org: OrgArgs,

    /// The configuration id
    #[arg(long, value_name = "ID")]
    pub id: u64,

    /// Which repositories to attach to
    #[arg(long, value_name = "SCOPE", default_value_t = AttachScopeArg::Selected)]
    pub scope: AttachScopeArg,

    /// A repository to attach to, when the scope is `selected`; can be repeated
    #[arg(long = "repository", short = 'r', value_name = "NAME")]
    pub repositories: Vec<RepoName>,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AttachScopeArg {
    All,
    AllWithoutConfigurations,
    Public,
    PrivateOrInternal,
    Selected,
}

impl std::fmt::Display for AttachScopeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AttachScope::from(self).as_str().replace('_', "-"))
    }
}

impl From<&AttachScopeArg> for AttachScope {
    fn from(arg: &AttachScopeArg) -> Self {
        match arg {
            AttachScopeArg::All => AttachScope::All,
            AttachScopeArg::AllWithoutConfigurations => AttachScope::AllWithoutConfigurations,
            AttachScopeArg::Public => AttachScope::Public,
            AttachScopeArg::PrivateOrInternal => AttachScope::PrivateOrInternal,
            AttachScopeArg::Selected => AttachScope::Selected,
        }
    }
}

// -----------------------------------------------------------------------------
// output options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    /// Write output to the specified path
    ///
    /// If this argument is not provided, stdout will be used.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write output in the specified format
    #[arg(long, short, value_name="FORMAT", default_value_t=OutputFormat::Human)]
    pub format: OutputFormat,
}

impl OutputArgs {
    /// Get a writer for the specified output destination.
    pub fn get_writer(&self) -> std::io::Result<Box<dyn std::io::Write>> {
        use std::fs::File;
        use std::io::BufWriter;

        match &self.output {
            None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
            Some(p) => {
                let f = File::create(p)?;
                Ok(Box::new(BufWriter::new(f)))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// output format
// -----------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// A text-based format designed for humans
    Human,

    /// Pretty-printed JSON format
    Json,

    /// JSON Lines format
    ///
    /// This is a sequence of JSON objects, one per line.
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// report writer
// -----------------------------------------------------------------------------
pub trait Reportable {
    fn human_format<W: std::io::Write>(&self, writer: W) -> Result<()>;
    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()>;
    fn jsonl_format<W: std::io::Write>(&self, writer: W) -> Result<()>;

    fn report(&self, output_args: &OutputArgs) -> Result<()> {
        let writer = output_args
            .get_writer()
            .context("Failed to open output destination for writing")?;

        let result = match &output_args.format {
            OutputFormat::Human => self.human_format(writer),
            OutputFormat::Json => self.json_format(writer),
            OutputFormat::Jsonl => self.jsonl_format(writer),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                // Ignore SIGPIPE errors, like those that can come from piping to `head`
                Some(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                _ => Err(e)?,
            },
        }
    }
}
