use std::process::ExitCode;

use clap::Parser;
use nestegg::api::{AppState, run_http_server};
use nestegg::cli::{Cli, Command, ProjectArgs, ServeArgs, run_project};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Project(args) => project(&args),
    }
}

async fn serve(args: ServeArgs) -> ExitCode {
    if let Err(msg) = args.advisor.validate() {
        eprintln!("Error: {msg}");
        return ExitCode::from(2);
    }
    let session = match args.advisor.build_session() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to configure advisor: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run_http_server(args.addr(), AppState::new(session)).await {
        eprintln!("Server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn project(args: &ProjectArgs) -> ExitCode {
    match run_project(args) {
        Ok(output) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            };
            match json {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to serialize projection: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(errors) => {
            for (field, msg) in errors.iter() {
                eprintln!("{field}: {msg}");
            }
            ExitCode::from(2)
        }
    }
}
