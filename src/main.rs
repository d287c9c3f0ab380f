use clap::Parser;
use licfinder::cli::Cli;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::from(70);
        }
    };

    let result = runtime.block_on(cli.execute());
    // Timed-out analyses may still hold blocking threads
    runtime.shutdown_background();

    match result {
        Ok(summary) => {
            tracing::debug!("{:?}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Logs go to stderr; stdout carries only JSON records
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,licfinder=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}
