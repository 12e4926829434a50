//! # Dukaan Entry Point
//!
//! Voice ledger intake: reads intent lines on stdin, writes outcomes on stdout.
//! The actual setup is in lib.rs for testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match dukaan_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = ?err.code(), error = %err, "Dukaan stopped");
            eprintln!("dukaan: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
