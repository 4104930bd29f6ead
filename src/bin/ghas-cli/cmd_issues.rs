use anyhow::{Context, Result};

use ghas::ops::issues;
use ghas::templates::IssueTemplate;

use crate::args::{GlobalArgs, IssuesCloseMendArgs, IssuesCommand, IssuesCreateArgs};
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &IssuesCommand) -> Result<()> {
    match args {
        IssuesCommand::Create(args) => create(global_args, args),
        IssuesCommand::CloseMend(args) => close_mend(global_args, args),
    }
}

fn create(global_args: &GlobalArgs, args: &IssuesCreateArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let template = IssueTemplate::from(&args.template);
    let body = template.body(org.as_str(), repo.as_str());
    let url = util::block_on(async {
        issues::create_issue(&client, org, repo, template.title(), &body)
            .await
            .with_context(|| format!("Failed to open issue {:?} on {org}/{repo}", template.title()))
    })?;
    println!("{url}");
    Ok(())
}

fn close_mend(global_args: &GlobalArgs, args: &IssuesCloseMendArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let closed = util::block_on(async {
        issues::close_issues_by_creator(&client, org, repo, &args.creator)
            .await
            .with_context(|| format!("Failed to list issues of {org}/{repo}"))
    })?;
    println!("Closed {closed} issues opened by {} on {org}/{repo}", args.creator);
    Ok(())
}
