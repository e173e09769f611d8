use newsfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // File logging under the state dir, stderr if that is unavailable.
    logging::init();

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("newsfetch error: {:#}", err);
        std::process::exit(1);
    }
}
