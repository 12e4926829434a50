//! # Dukaan Binary Library
//!
//! Wires configuration, logging, the ledger and its persistence into a
//! line-oriented intake loop.
//!
//! ## Module Organization
//! ```text
//! dukaan_lib/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── config.rs       ◄─── ShopConfig: file, env and defaults
//! ├── session.rs      ◄─── Ledger + sync, per-line cycle
//! └── error.rs        ◄─── Top-level error type
//! ```
//!
//! ## Streams
//! - **stdin**: one JSON `IntentBatch` (or bare intent record) per line
//! - **stdout**: one JSON `BatchOutcome` per input line
//! - **stderr**: logs

pub mod config;
pub mod error;
pub mod session;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ShopConfig;
use error::AppResult;
use session::Session;

/// Runs the intake loop until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults ► dukaan.toml ► DUKAAN_* environment                     │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │     • Restore inventory and today's records                             │
/// │                                                                         │
/// │  4. Intake Loop ──────────────────────────────────────────────────────► │
/// │     • Apply each line, write its outcome, sync                          │
/// │     • Final sync at EOF                                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> AppResult<()> {
    init_tracing();

    let config = ShopConfig::load(None)?;
    info!(shopkeeper = %config.address(), "Starting Dukaan ledger");

    let mut session = Session::open(config).await?;
    let result = session
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;

    session.close().await;
    info!("Ledger closed");
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=dukaan=trace` - Show trace for dukaan crates only
/// - Default: INFO, DEBUG for dukaan crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dukaan=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
