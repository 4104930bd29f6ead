use anyhow::{Context, Result};
use serde_json::Value;

use ghas::ops::code_security::{self, AttachScope};

use crate::args::{
    GlobalArgs, Reportable, SecurityConfigsAttachArgs, SecurityConfigsCommand,
    SecurityConfigsListArgs, SecurityConfigsShowArgs,
};
use crate::reportable::{JsonReporter, TableReporter};
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &SecurityConfigsCommand) -> Result<()> {
    match args {
        SecurityConfigsCommand::List(args) => list(global_args, args),
        SecurityConfigsCommand::Show(args) => show(global_args, args),
        SecurityConfigsCommand::Attach(args) => attach(global_args, args),
    }
}

fn list(global_args: &GlobalArgs, args: &SecurityConfigsListArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let name = &args.org.organization;
    let configs = util::block_on(async {
        if args.enterprise {
            code_security::list_enterprise_configurations(&client, name)
                .await
                .with_context(|| format!("Failed to list configurations of enterprise {name}"))
        } else {
            code_security::list_org_configurations(&client, name)
                .await
                .with_context(|| format!("Failed to list configurations of {name}"))
        }
    })?;
    TableReporter {
        items: configs,
        complete: true,
        titles: &["Id", "Name", "Target", "Description"],
        row: |c: &Value| {
            let text = |v: &Value| v.as_str().unwrap_or_default().to_string();
            vec![
                c["id"].to_string(),
                text(&c["name"]),
                text(&c["target_type"]),
                text(&c["description"]),
            ]
        },
    }
    .report(&args.output_args)
}

fn show(global_args: &GlobalArgs, args: &SecurityConfigsShowArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let config = util::block_on(async {
        code_security::get_org_configuration(&client, org, args.id)
            .await
            .with_context(|| format!("Failed to get configuration {} of {org}", args.id))
    })?;
    JsonReporter(config).report(&args.output_args)
}

fn attach(global_args: &GlobalArgs, args: &SecurityConfigsAttachArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let scope = AttachScope::from(&args.scope);
    util::block_on(async {
        let context = || format!("Failed to attach configuration {} in {org}", args.id);
        if scope == AttachScope::Selected {
            let report = code_security::attach_configuration_by_names(
                &client,
                org,
                args.id,
                scope,
                &args.repositories,
            )
            .await
            .with_context(context)?;
            println!("Attached configuration {} to {}", args.id, report.attached.join(", "));
            if !report.unresolved.is_empty() {
                println!("Could not resolve: {}", report.unresolved.join(", "));
            }
        } else {
            code_security::attach_configuration(&client, org, args.id, scope, &[])
                .await
                .with_context(context)?;
            println!("Attached configuration {} to scope {}", args.id, args.scope);
        }
        Ok::<(), anyhow::Error>(())
    })
}
