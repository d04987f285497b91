use gsd_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr-only if
    // the state dir is unusable.
    let _guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("gsd: file logging unavailable: {:#}", err);
            logging::init_logging_stderr();
            None
        }
    };

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("gsd error: {:#}", err);
        std::process::exit(1);
    }
}
