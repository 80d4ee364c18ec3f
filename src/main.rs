// src/main.rs

use actionflow::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("actionflow: failed to initialise logging: {err:?}");
    }

    match run(args).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(err) => {
            eprintln!("actionflow error: {err}");
            std::process::exit(2);
        }
    }
}
