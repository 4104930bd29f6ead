use anyhow::{Context, Result};
use serde::Serialize;

use ghas::ops::teams;
use ghas::repository::Repository;

use crate::args::{
    GlobalArgs, Reportable, TeamArgs, TeamsCommand, TeamsListArgs, TeamsPermissionArgs,
};
use crate::reportable::{ObjectReporter, TableReporter};
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &TeamsCommand) -> Result<()> {
    match args {
        TeamsCommand::List(args) => list(global_args, args),
        TeamsCommand::Repositories(args) => repositories(global_args, args),
        TeamsCommand::Permission(args) => permission(global_args, args),
    }
}

fn list(global_args: &GlobalArgs, args: &TeamsListArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let slugs = util::block_on(async {
        teams::list_teams(&client, org)
            .await
            .with_context(|| format!("Failed to list teams of {org}"))
    })?;
    TableReporter {
        items: slugs.items,
        complete: slugs.complete,
        titles: &["Team"],
        row: |slug: &String| vec![slug.clone()],
    }
    .report(&args.output_args)
}

fn repositories(global_args: &GlobalArgs, args: &TeamArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, team) = (&args.org.organization, &args.team);
    let repos = util::block_on(async {
        teams::list_team_repositories(&client, org, team)
            .await
            .with_context(|| format!("Failed to list repositories of team {team} in {org}"))
    })?;
    TableReporter {
        items: repos.items,
        complete: repos.complete,
        titles: &["Repository", "Archived"],
        row: |r: &Repository| vec![r.name.clone(), r.archived.to_string()],
    }
    .report(&args.output_args)
}

#[derive(Serialize)]
struct Permission {
    team: String,
    repository: String,
    role_name: Option<String>,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.role_name {
            Some(role) => write!(f, "{} on {}: {role}", self.team, self.repository),
            None => write!(f, "{} has no access to {}", self.team, self.repository),
        }
    }
}

fn permission(global_args: &GlobalArgs, args: &TeamsPermissionArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo, team) = (&args.repo.org.organization, &args.repo.repository, &args.team);
    let permission = util::block_on(async {
        teams::get_team_permission(&client, org, team, repo)
            .await
            .with_context(|| format!("Failed to get permission of team {team} on {org}/{repo}"))
    })?;
    ObjectReporter(Permission {
        team: team.to_string(),
        repository: format!("{org}/{repo}"),
        role_name: permission.map(|p| p.role_name),
    })
    .report(&args.output_args)
}
