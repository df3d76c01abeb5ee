use cardbank::application::auth::PinHasher;
use cardbank::application::bank::Bank;
use cardbank::config::{BankConfig, DEFAULT_IIN, DEFAULT_MAX_GENERATE_ATTEMPTS, DEFAULT_STORE_TIMEOUT};
use cardbank::domain::ports::{CardStore, CardStoreBox, SharedCardStore};
use cardbank::infrastructure::in_memory::InMemoryCardStore;
#[cfg(feature = "storage-rocksdb")]
use cardbank::infrastructure::rocksdb::RocksDBStore;
use cardbank::infrastructure::timeout::TimeoutStore;
use cardbank::interfaces::console::Console;
use cardbank::interfaces::csv::card_writer::CardWriter;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
#[cfg(not(feature = "storage-rocksdb"))]
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "CARDBANK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Issuer identification number every new card starts with.
    #[arg(long, env = "CARDBANK_IIN", default_value = DEFAULT_IIN)]
    iin: String,

    /// Number draws before card creation gives up.
    #[arg(long, default_value_t = DEFAULT_MAX_GENERATE_ATTEMPTS)]
    max_attempts: u32,

    /// Bound on each storage call in milliseconds; 0 waits indefinitely.
    #[arg(long, default_value_t = DEFAULT_STORE_TIMEOUT.as_millis() as u64)]
    store_timeout_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Interactive banking session on stdin/stdout (default).
    #[default]
    Run,
    /// Print every card as `number,balance` CSV.
    Export,
}

impl Cli {
    fn config(&self) -> BankConfig {
        BankConfig {
            iin: self.iin.clone(),
            max_generate_attempts: self.max_attempts,
            store_timeout: (self.store_timeout_ms > 0)
                .then(|| Duration::from_millis(self.store_timeout_ms)),
        }
    }
}

fn open_store(db_path: Option<PathBuf>) -> Result<CardStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryCardStore::new()))
        }
        None => Ok(Box::new(InMemoryCardStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().into_diagnostic()?;

    let store: SharedCardStore = Arc::new(TimeoutStore::new(
        open_store(cli.db_path.clone())?,
        config.store_timeout,
    ));

    match cli.command.unwrap_or_default() {
        Command::Run => {
            let mut bank = Bank::new(store, &config, PinHasher::default()).into_diagnostic()?;
            let stdin = io::stdin();
            let mut console = Console::new(stdin.lock(), io::stdout());
            console.run(&mut bank).await.into_diagnostic()?;
        }
        Command::Export => {
            let cards = store.all_cards().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = CardWriter::new(stdout.lock());
            writer.write_cards(&cards).into_diagnostic()?;
        }
    }

    Ok(())
}
