mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, generate_to};
use tracing_subscriber::EnvFilter;

use f5os_api::F5osClient;

use crate::cli::{Cli, Command, CompletionsArgs};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_json);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => write_completions(&args),

        cmd => {
            let client_config = config::build_client_config(&cli.global)?;
            let client = F5osClient::connect(client_config).await?;

            // Ctrl-C ends any wait in progress; the handler reports it as cancelled.
            let interrupt = client.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, cancelling");
                    interrupt.shutdown();
                }
            });

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

fn write_completions(args: &CompletionsArgs) -> Result<(), CliError> {
    let mut cmd = Cli::command();
    match args.dir {
        Some(ref dir) => {
            let path = generate_to(args.shell, &mut cmd, "f5os", dir)?;
            eprintln!("Wrote {}", path.display());
        }
        None => generate(args.shell, &mut cmd, "f5os", &mut std::io::stdout()),
    }
    Ok(())
}
