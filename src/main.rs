use clap::Parser;
use tracing::{debug, error, trace};

use ocdc::cli::{execute_command, get_log_level, Cli};
use ocdc::OcdcError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(get_log_level(cli.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(cli.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(cli.verbose >= 3) // Show line numbers for -vvv
        .init();

    debug!("ocdc started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = execute_command(cli.command, cli.config.as_deref()).await;

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        if let Some(hint) = e.chain().find_map(|cause| {
            cause
                .downcast_ref::<OcdcError>()
                .and_then(OcdcError::user_hint)
        }) {
            eprintln!("Hint: {hint}");
        }
        std::process::exit(1);
    }
}
