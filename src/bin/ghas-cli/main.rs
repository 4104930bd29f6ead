use anyhow::{Context, Result};

mod args;
mod cmd_actions;
mod cmd_alerts;
mod cmd_issues;
mod cmd_mass;
mod cmd_repositories;
mod cmd_roles;
mod cmd_security_configs;
mod cmd_teams;
mod reportable;
mod util;

/// Environment variable holding an `EnvFilter` directive that overrides `-q` and `-v`
const LOG_ENV_VAR: &str = "GHAS_LOG";

fn configure_tracing(global_args: &args::GlobalArgs) -> Result<()> {
    use tracing_log::{AsLog, LogTracer};
    use tracing_subscriber::filter::{EnvFilter, LevelFilter};

    let level = if global_args.quiet {
        LevelFilter::ERROR
    } else {
        match global_args.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let (filter, max_level) = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) => {
            let filter = EnvFilter::try_new(&directives)
                .with_context(|| format!("Failed to parse {LOG_ENV_VAR}={directives:?}"))?;
            (filter, LevelFilter::TRACE)
        }
        Err(_) => (EnvFilter::default().add_directive(level.into()), level),
    };

    LogTracer::builder()
        .with_max_level(max_level.as_log())
        .init()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(global_args.use_color())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn try_main(args: &args::CommandLineArgs) -> Result<()> {
    let global_args = &args.global_args;

    let use_color = global_args.use_color();
    console::set_colors_enabled(use_color);
    console::set_colors_enabled_stderr(use_color);

    configure_tracing(global_args).context("Failed to initialize logging")?;

    match &args.command {
        args::Command::Repositories(args) => cmd_repositories::run(global_args, args),
        args::Command::Mass(args) => cmd_mass::run(global_args, args),
        args::Command::Issues(args) => cmd_issues::run(global_args, args),
        args::Command::Teams(args) => cmd_teams::run(global_args, args),
        args::Command::Roles(args) => cmd_roles::run(global_args, args),
        args::Command::Alerts(args) => cmd_alerts::run(global_args, args),
        args::Command::Actions(args) => cmd_actions::run(global_args, args),
        args::Command::SecurityConfigs(args) => cmd_security_configs::run(global_args, args),
    }
}

fn main() {
    let args = args::CommandLineArgs::parse_args();
    if let Err(e) = try_main(&args) {
        if args.global_args.verbose >= 2 {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(2);
    }
}
