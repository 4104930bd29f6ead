use anyhow::{Context, Result};

use ghas::ops::roles::{self, Checkpoint, CustomRole};

use crate::args::{GlobalArgs, RolesAssignArgs, RolesCommand, RolesCreateArgs, RolesReassignArgs};
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &RolesCommand) -> Result<()> {
    match args {
        RolesCommand::Create(args) => create(global_args, args),
        RolesCommand::Assign(args) => assign(global_args, args),
        RolesCommand::Reassign(args) => reassign(global_args, args),
    }
}

fn create(global_args: &GlobalArgs, args: &RolesCreateArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let role = CustomRole {
        name: args.name.clone(),
        description: args.description.clone(),
        base_role: args.base_role.clone(),
        permissions: args.permissions.clone(),
    };
    util::block_on(async {
        roles::create_role(&client, org, &role)
            .await
            .with_context(|| format!("Failed to create role {} in {org}", role.name))
    })?;
    println!("Created role {} in {org}", role.name);
    Ok(())
}

fn assign(global_args: &GlobalArgs, args: &RolesAssignArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo, team) = (&args.repo.org.organization, &args.repo.repository, &args.team);
    util::block_on(async {
        roles::assign_role(&client, org, team, repo, &args.role)
            .await
            .with_context(|| {
                format!("Failed to give team {team} role {} on {org}/{repo}", args.role)
            })
    })?;
    println!("Gave team {team} role {} on {org}/{repo}", args.role);
    Ok(())
}

fn reassign(global_args: &GlobalArgs, args: &RolesReassignArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let mut checkpoint = Checkpoint::open(&args.checkpoint)?;
    let summary = util::block_on(async {
        roles::reassign_role(&client, org, &args.from, &args.to, &mut checkpoint)
            .await
            .with_context(|| format!("Failed to reassign role {} in {org}", args.from))
    })?;
    println!(
        "Classified {} pairs ({} from {}); {} held {}: {} reassigned to {}, {} failed",
        summary.classified,
        summary.resumed,
        args.checkpoint.display(),
        summary.matching,
        args.from,
        summary.assigned,
        args.to,
        summary.failed,
    );
    Ok(())
}
