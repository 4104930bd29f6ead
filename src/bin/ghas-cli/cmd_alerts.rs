use anyhow::{Context, Result};
use serde_json::Value;

use ghas::github::Collected;
use ghas::ops::alerts::{self, RepositoryAlerts, SecretAlertSummary};

use crate::args::{
    AlertsCodeScanningArgs, AlertsCommand, AlertsRepositoryArgs, AlertsSecretsArgs, GlobalArgs,
    Reportable,
};
use crate::reportable::TableReporter;
use crate::util;

pub fn run(global_args: &GlobalArgs, args: &AlertsCommand) -> Result<()> {
    match args {
        AlertsCommand::Secrets(args) => secrets(global_args, args),
        AlertsCommand::CodeScanning(args) => code_scanning(global_args, args),
        AlertsCommand::Dependabot(args) => dependabot(global_args, args),
    }
}

fn secrets(global_args: &GlobalArgs, args: &AlertsSecretsArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let alerts = util::block_on(async {
        alerts::list_secret_alerts(&client, org, &args.state, args.secret_type_filter())
            .await
            .with_context(|| format!("Failed to list secret scanning alerts of {org}"))
    })?;
    TableReporter {
        items: alerts.items,
        complete: alerts.complete,
        titles: &["Repository", "Secret type", "State", "Resolution", "URL"],
        row: |a: &SecretAlertSummary| {
            vec![
                a.repository_full_name.clone(),
                a.secret_type.clone(),
                a.state.clone(),
                a.resolution.clone().unwrap_or_default(),
                a.url.clone(),
            ]
        },
    }
    .report(&args.output_args)
}

fn code_scanning(global_args: &GlobalArgs, args: &AlertsCodeScanningArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let org = &args.org.organization;
    let selection = args.selection();
    let by_repo = util::block_on(async {
        alerts::list_code_scanning_alerts_by_repository(&client, org, &selection, &args.state)
            .await
            .with_context(|| format!("Failed to list code scanning alerts of {org}"))
    })?;
    AlertsByRepository(by_repo).report(&args.output_args)
}

/// Code scanning alerts grouped by repository; humans get one table per repository
struct AlertsByRepository(Collected<RepositoryAlerts>);

impl Reportable for AlertsByRepository {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
        use prettytable::{row, Table};

        let f = FormatBuilder::new()
            .column_separator(' ')
            .separators(&[LinePosition::Title], LineSeparator::new('─', '─', '─', '─'))
            .padding(1, 1)
            .build();

        for repo in &self.0.items {
            writeln!(writer)?;
            write!(writer, "{}: {} alerts", repo.repository, repo.alerts.len())?;
            if !repo.complete {
                write!(writer, " (incomplete)")?;
            }
            writeln!(writer)?;
            if repo.alerts.is_empty() {
                continue;
            }

            let mut table = Table::new();
            table.set_format(f);
            table.set_titles(row![lb => "Number", "Created", "State", "Severity"]);
            for a in &repo.alerts {
                table.add_row(row![
                    a.number,
                    a.created_at,
                    a.state,
                    a.severity.as_deref().unwrap_or_default()
                ]);
            }
            table.print(&mut writer)?;
        }

        writeln!(writer)?;
        writeln!(writer, "{} repositories", self.0.items.len())?;
        if !self.0.complete {
            writeln!(
                writer,
                "Repository listing incomplete: it stopped early because of an error"
            )?;
        }
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.0.items)?;
        Ok(())
    }

    fn jsonl_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        for repo in &self.0.items {
            serde_json::to_writer(&mut writer, repo)?;
            writeln!(&mut writer)?;
        }
        Ok(())
    }
}

fn dependabot(global_args: &GlobalArgs, args: &AlertsRepositoryArgs) -> Result<()> {
    let client = util::client(global_args)?;
    let (org, repo) = (&args.repo.org.organization, &args.repo.repository);
    let alerts = util::block_on(async {
        alerts::list_dependabot_alerts(&client, org, repo, &args.state)
            .await
            .with_context(|| format!("Failed to list Dependabot alerts of {org}/{repo}"))
    })?;
    TableReporter {
        items: alerts.items,
        complete: alerts.complete,
        titles: &["Number", "Package", "Severity", "State"],
        row: |a: &Value| {
            let text = |v: &Value| v.as_str().unwrap_or_default().to_string();
            vec![
                a["number"].to_string(),
                text(&a["dependency"]["package"]["name"]),
                text(&a["security_advisory"]["severity"]),
                text(&a["state"]),
            ]
        },
    }
    .report(&args.output_args)
}
