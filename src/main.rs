use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use ledger_engine::ingest::CsvRunner;
use ledger_engine::types::format_monetary;
use ledger_engine::{AccountStore, EngineConfig, LedgerEngine, MemoryStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: ledger-engine [instructions].csv [log_level:optional] > [accounts].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let config = EngineConfig::from_env()?;
    let storage = Arc::new(MemoryStorage::new());
    let engine = Arc::new(LedgerEngine::new(storage.clone()).with_config(config));
    let runner = CsvRunner::new(engine);

    let timer = Instant::now();
    let summary = runner.run(path).await?;
    let duration = timer.elapsed();

    info!("Applied {} instructions, rejected {}, skipped {} malformed rows in: {duration:?}", summary.applied, summary.rejected, summary.malformed);

    write_results_to_stdout(&storage)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the account report, so logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(storage: &MemoryStorage) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "account,owner,number,type,balance,status")?;

    for account in storage.all() {
        writeln!(
            output,
            "{},{},{},{},{},{}",
            account.account_id,
            account.owner_id,
            account.account_number,
            account.account_type,
            format_monetary(account.balance()),
            account.status()
        )?;
    }

    output.flush()?;

    Ok(())
}
