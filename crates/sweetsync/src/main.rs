mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sweetsync_core::InventorySession;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sweetsync", &mut std::io::stdout());
            Ok(())
        }

        Command::Login(args) => {
            let cfg = config::load_config_or_default();
            commands::auth::login(args, &cli.global, &cfg).await
        }

        Command::Register(args) => {
            let cfg = config::load_config_or_default();
            commands::auth::register(args, &cli.global, &cfg).await
        }

        // Everything else runs inside a connected session
        cmd => {
            let cfg = config::load_config_or_default();
            let mut session_config = config::resolve_session_config(&cli.global, &cfg)?;
            // Only `watch` needs the push channel.
            session_config.push_enabled = matches!(cmd, Command::Watch(_));

            let session = InventorySession::new(session_config);
            let spinner = commands::util::spinner(
                format!("Connecting to {}", session.config().url),
                cli.global.quiet,
            );
            let connected = session.connect().await;
            spinner.finish_and_clear();
            connected?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &session, &cli.global).await;
            session.teardown().await;
            result
        }
    }
}
