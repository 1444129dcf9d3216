use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use bulls_backend::cli::{self, CliOptions};
use bulls_backend::store::MemoryStore;
use bulls_backend::telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    telemetry::init_with_default("warn");

    let args: Vec<String> = std::env::args().collect();
    let options = match CliOptions::from_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let manager = options.session_manager(Arc::new(MemoryStore::new()));
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    match cli::run(&manager, stdin.lock(), &mut stdout, options.max_games).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
