use anyhow::{bail, Result};
use tracing::warn;

use ghas::driver::{self, CsvSink, DriverOptions, MassDriver, ResultRow, ResultSink};

use crate::args::{GlobalArgs, MassArgs};
use crate::util;

/// Where rows go when no output file was given; the per-repository lines on stdout are the
/// report then.
struct Discard;

impl ResultSink for Discard {
    fn write_row(&mut self, _row: &ResultRow) -> Result<()> {
        Ok(())
    }
}

pub fn run(global_args: &GlobalArgs, args: &MassArgs) -> Result<()> {
    let names = driver::read_repository_list(&args.input)?;
    if names.is_empty() {
        bail!("No repositories listed in {}", args.input.display());
    }

    let client = util::client(global_args)?;
    let options = DriverOptions {
        open_issues: args.issues,
        mend_creator: args.mend_creator.clone(),
        sbom_dir: args.sbom_dir.clone(),
        codeql_branch: args.codeql_branch.clone(),
        dependency_review_branch: args.dependency_review_branch.clone(),
        allowed_actions: (&args.actions_args.allowed_actions).into(),
        echo: true,
        progress: global_args.use_progress(),
    };
    let driver = MassDriver::new(&client, args.org.organization.clone(), &args.steps, options);

    let mut sink: Box<dyn ResultSink> = match &args.output {
        Some(path) => Box::new(CsvSink::create(path)?),
        None => Box::new(Discard),
    };

    let summary = util::block_on(async {
        Ok::<_, anyhow::Error>(driver.run(&names, sink.as_mut()).await)
    })?;

    println!(
        "Processed {} repositories: {} with failures, {} skipped for invalid names",
        summary.repositories, summary.rows_with_failures, summary.invalid_names
    );
    if summary.sink_errors > 0 {
        warn!("{} result rows could not be written", summary.sink_errors);
    }
    Ok(())
}
