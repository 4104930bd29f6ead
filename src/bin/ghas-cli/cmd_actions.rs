use anyhow::{Context, Result};

use ghas::github::models::WorkflowRun;
use ghas::ops::actions;
use ghas::ops::features::{self, Feature};

use crate::args::{
    ActionsCommand, ActionsGhasRunsArgs, ActionsPermissionsArgs, GlobalArgs, Reportable,
};
use crate::reportable::TableReporter;
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &ActionsCommand) -> Result<()> {
    match args {
        ActionsCommand::Permissions(args) => permissions(global_args, args),
        ActionsCommand::GhasRuns(args) => ghas_runs(global_args, args),
    }
}

fn permissions(global_args: &GlobalArgs, args: &ActionsPermissionsArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let feature = Feature::Actions {
        enabled: !args.disable,
        allowed: (&args.actions_args.allowed_actions).into(),
    };
    util::block_on(async {
        features::enable(&client, org, repo, feature)
            .await
            .with_context(|| format!("Failed to set Actions permissions of {org}/{repo}"))
    })?;
    if args.disable {
        println!("Disabled Actions on {org}/{repo}");
    } else {
        println!("Enabled Actions on {org}/{repo} ({})", args.actions_args.allowed_actions);
    }
    Ok(())
}

fn ghas_runs(global_args: &GlobalArgs, args: &ActionsGhasRunsArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let runs = util::block_on(async {
        actions::list_ghas_workflow_runs(&client, org, repo, args.days)
            .await
            .with_context(|| format!("Failed to list workflow runs of {org}/{repo}"))
    })?;
    TableReporter {
        items: runs.items,
        complete: runs.complete,
        titles: &["Id", "Workflow", "Created", "Conclusion", "Actor"],
        row: |r: &WorkflowRun| {
            vec![
                r.id.to_string(),
                r.name.clone().unwrap_or_default(),
                r.created_at.clone().unwrap_or_default(),
                r.conclusion.clone().unwrap_or_default(),
                r.actor.as_ref().map(|a| a.login.clone()).unwrap_or_default(),
            ]
        },
    }
    .report(&args.output_args)
}
