use clap::Parser;
use sqlcrud::config::{load_config, Args, Config};
use sqlcrud::core::db::Session;
use sqlcrud::shell::Shell;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => Config::default(),
    };

    // Logs go to stderr so they never interleave with prompts on stdout.
    // The level was validated when the config was loaded.
    let level = config.logging.level().unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let session = Session::new(config.server.clone());
    info!("Starting sqlcrud against server {}", session.config().server);
    let stdin = io::stdin();
    let mut shell = Shell::new(
        session,
        stdin.lock(),
        io::stdout(),
        config.shell.invalid_row_count,
    );
    match shell.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("sqlcrud stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
