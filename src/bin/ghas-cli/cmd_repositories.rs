use anyhow::{Context, Result};
use std::io::Write;
use tracing::warn;

use ghas::github::Client;
use ghas::ops::features::{self, Feature};
use ghas::ops::{issues, repositories};
use ghas::progress::Progress;
use ghas::repository::{RepoFilter, Repository};
use ghas::templates::IssueTemplate;
use ghas::validation::{BranchName, OrgName, RepoName};
use ghas::workflow::{self, CODEQL_BRANCH, DEPENDENCY_REVIEW_BRANCH};

use crate::args::{
    FeatureArg, GlobalArgs, RepositoriesArchiveArgs, RepositoriesCommand, RepositoriesEnableArgs,
    RepositoriesListArgs, RepositoriesSbomArgs, RepositoriesWorkflowArgs, RepositoryOutputArgs,
    Reportable,
};
use crate::reportable::{ObjectReporter, TableReporter};
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &RepositoriesCommand) -> Result<()> {
    use RepositoriesCommand::*;
    match args {
        List(args) => list(global_args, args),
        Details(args) => details(global_args, args),
        Enable(args) => enable(global_args, args),
        Archive(args) => archive(global_args, args),
        Topics(args) => topics(global_args, args),
        Sbom(args) => sbom(global_args, args),
        CodeQl(args) => codeql(global_args, args),
        DependencyReview(args) => dependency_review(global_args, args),
    }
}

fn list(global_args: &GlobalArgs, args: &RepositoriesListArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let filter = RepoFilter {
        language: args.language.clone(),
        default_branch: args.default_branch.clone(),
        license: args.license.clone(),
        archived: args.archived,
        disabled: args.disabled,
    };

    let progress =
        Progress::new_spinner(format!("Listing repositories of {org}"), global_args.use_progress());
    let listing = util::block_on(async {
        let mut listing =
            repositories::list_org_repositories(&client, org, (&args.repo_type).into(), &filter)
                .await
                .with_context(|| format!("Failed to list repositories of {org}"))?;
        if args.details {
            let mut enriched = Vec::with_capacity(listing.items.len());
            for repo in listing.items {
                progress.set_message(format!("Reading details of {}", repo.full_name()));
                enriched.push(repositories::enrich(&client, repo).await);
            }
            listing.items = enriched;
        }
        Ok::<_, anyhow::Error>(listing)
    })?;
    progress.finish_with_message(format!(
        "Listed {} repositories of {org}",
        listing.items.len()
    ));

    TableReporter {
        items: listing.items,
        complete: listing.complete,
        titles: &["Repository", "Language", "Default branch", "License", "Archived", "GHAS"],
        row: |r: &Repository| {
            vec![
                r.name.clone(),
                r.main_language.clone().unwrap_or_default(),
                r.default_branch.clone(),
                r.license.clone().unwrap_or_default(),
                r.archived.to_string(),
                r.ghas.to_string(),
            ]
        },
    }
    .report(&args.output_args)
}

fn details(global_args: &GlobalArgs, args: &RepositoryOutputArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let repository = util::block_on(async {
        let repository = repositories::get_repository(&client, org, repo)
            .await
            .with_context(|| format!("Failed to get repository {org}/{repo}"))?;
        Ok::<_, anyhow::Error>(repositories::enrich(&client, repository).await)
    })?;
    ObjectReporter(repository).report(&args.output_args)
}

/// Open the explanatory issue for a step that just succeeded.
async fn open_issue(
    client: &Client,
    org: &OrgName,
    repo: &RepoName,
    template: IssueTemplate,
) -> Result<()> {
    let body = template.body(org.as_str(), repo.as_str());
    let url = issues::create_issue(client, org, repo, template.title(), &body)
        .await
        .with_context(|| format!("Failed to open issue {:?} on {org}/{repo}", template.title()))?;
    println!("Opened issue {url}");
    Ok(())
}

fn enable(global_args: &GlobalArgs, args: &RepositoriesEnableArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let (feature, template) = match args.feature {
        FeatureArg::SecretScanning => {
            (Feature::SecretScanning, Some(IssueTemplate::SecretScanning))
        }
        FeatureArg::PushProtection => {
            (Feature::PushProtection, Some(IssueTemplate::PushProtection))
        }
        FeatureArg::Dependabot => (Feature::Dependabot, Some(IssueTemplate::Dependabot)),
        FeatureArg::Actions => (
            Feature::Actions {
                enabled: true,
                allowed: (&args.actions_args.allowed_actions).into(),
            },
            None,
        ),
    };

    util::block_on(async {
        features::enable(&client, org, repo, feature)
            .await
            .with_context(|| format!("Failed to enable {} on {org}/{repo}", feature.name()))?;
        println!("Enabled {} on {org}/{repo}", feature.name());

        if args.issue {
            match template {
                Some(template) => open_issue(&client, org, repo, template).await?,
                None => warn!("There is no explanatory issue for {}", feature.name()),
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn archive(global_args: &GlobalArgs, args: &RepositoriesArchiveArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let archived = !args.unarchive;
    let verb = if archived { "archive" } else { "unarchive" };
    util::block_on(async {
        repositories::set_archived(&client, org, repo, archived)
            .await
            .with_context(|| format!("Failed to {verb} {org}/{repo}"))
    })?;
    println!("{org}/{repo}: {verb}d");
    Ok(())
}

fn topics(global_args: &GlobalArgs, args: &RepositoryOutputArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let topics = util::block_on(async {
        repositories::list_topics(&client, org, repo)
            .await
            .with_context(|| format!("Failed to list topics of {org}/{repo}"))
    })?;
    TableReporter {
        items: topics,
        complete: true,
        titles: &["Topic"],
        row: |t: &String| vec![t.clone()],
    }
    .report(&args.output_args)
}

fn sbom(global_args: &GlobalArgs, args: &RepositoriesSbomArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let sbom = util::block_on(async {
        repositories::export_sbom(&client, org, repo)
            .await
            .with_context(|| format!("Failed to export the SBOM of {org}/{repo}"))
    })?;

    let mut writer: Box<dyn Write> = match &args.output {
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
    };
    serde_json::to_writer_pretty(&mut writer, &sbom)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn target_branch(branch: &Option<BranchName>, default: &str) -> Result<BranchName> {
    match branch {
        Some(branch) => Ok(branch.clone()),
        None => Ok(BranchName::new(default)?),
    }
}

fn codeql(global_args: &GlobalArgs, args: &RepositoriesWorkflowArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let branch = target_branch(&args.branch, CODEQL_BRANCH)?;
    util::block_on(async {
        let pr = workflow::enable_codeql(&client, org, repo, &branch)
            .await
            .with_context(|| format!("Failed to enable CodeQL on {org}/{repo}"))?;
        println!("Opened pull request {}", pr.url);
        if args.issue {
            open_issue(&client, org, repo, IssueTemplate::CodeQl).await?;
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn dependency_review(global_args: &GlobalArgs, args: &RepositoriesWorkflowArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let branch = target_branch(&args.branch, DEPENDENCY_REVIEW_BRANCH)?;
    util::block_on(async {
        let pr = workflow::enable_dependency_review(&client, org, repo, &branch)
            .await
            .with_context(|| format!("Failed to enable dependency review on {org}/{repo}"))?;
        println!("Opened pull request {}", pr.url);
        if args.issue {
            open_issue(&client, org, repo, IssueTemplate::DependencyReview).await?;
        }
        Ok::<(), anyhow::Error>(())
    })
}
