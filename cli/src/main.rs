//! chainbalance CLI: bulk token balance lookups from the terminal.
//!
//! Usage:
//! ```bash
//! # Paste addresses on stdin, finish with an empty line
//! chainbalance --rpc-url https://rpc.example.com
//!
//! # Read addresses from a file and keep a list of failed lookups
//! chainbalance --rpc-url https://rpc.example.com --input addrs.txt --failed-out failed.txt
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use chainbalance_core::{
    normalize_address, Backoff, BalanceScan, DecimalBalance, Progress, QueryTarget,
    ResultExporter, RetryConfig, ScanConfig, ScanError,
};
use chainbalance_http::{HttpBalanceClient, HttpClientConfig};

mod input;
mod logging;

/// Exit status of the empty-input early exit.
const EXIT_NO_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "chainbalance",
    about = "Bulk token balance lookup through a balance reader contract",
    long_about = "
Reads account addresses (one per line, terminated by an empty line), queries
their balances in concurrent batches through the reader's getTokenBalances
method and writes two files: addresses with a balance and addresses without.

ENVIRONMENT VARIABLES:
  CHAINBALANCE_RPC_URL     JSON-RPC endpoint URL
  CHAINBALANCE_CONTRACT    Balance reader contract address
  CHAINBALANCE_TOKEN       Token contract address
  CHAINBALANCE_TOKEN_ID    Token id
  RUST_LOG                 Log filter (overrides --verbose)
",
    version
)]
struct Cli {
    /// JSON-RPC endpoint URL
    #[arg(long, env = "CHAINBALANCE_RPC_URL")]
    rpc_url: String,

    /// Balance reader contract exposing getTokenBalances
    #[arg(
        long,
        env = "CHAINBALANCE_CONTRACT",
        default_value = "0xA9E028DC3FaCdE03596608316d132778CFbcf8Dd"
    )]
    contract: String,

    /// Token contract address
    #[arg(
        long,
        env = "CHAINBALANCE_TOKEN",
        default_value = "0x000000000000000000000000000000000000bEEF"
    )]
    token: String,

    /// Token id (decimal)
    #[arg(long, env = "CHAINBALANCE_TOKEN_ID", default_value = "1234567890987654321")]
    token_id: String,

    /// Addresses per contract call
    #[arg(long, default_value_t = 50)]
    batch_size: usize,

    /// Maximum concurrent contract calls
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Attempts per batch before giving up
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Fixed pause between attempts, in seconds
    #[arg(long, default_value_t = 5)]
    retry_delay_secs: u64,

    /// HTTP timeout per call, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Read addresses from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for addresses with a balance
    #[arg(long, default_value = "with_balance.txt")]
    with_out: PathBuf,

    /// Output file for addresses without a balance
    #[arg(long, default_value = "without_balance.txt")]
    without_out: PathBuf,

    /// Also write addresses whose batch failed to this file
    #[arg(long)]
    failed_out: Option<PathBuf>,

    /// Token symbol shown next to balances in logs
    #[arg(long, default_value = "MON")]
    symbol: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(&logging::LogConfig {
        level: if cli.verbose { "debug" } else { "info" }.into(),
        json: cli.json_logs,
    });

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let addresses = match &cli.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            input::read_addresses(BufReader::new(file))?
        }
        None => {
            eprintln!("Enter addresses, one per line; finish with an empty line:");
            input::read_addresses(io::stdin().lock())?
        }
    };
    if addresses.is_empty() {
        eprintln!("No input addresses, exiting");
        return Ok(ExitCode::from(EXIT_NO_INPUT));
    }
    println!("Read {} addresses", addresses.len());

    let target = QueryTarget {
        contract: normalize_address(&cli.contract).context("--contract")?,
        token: normalize_address(&cli.token).context("--token")?,
        token_id: U256::from_str(&cli.token_id)
            .map_err(|e| anyhow!("--token-id '{}': {e}", cli.token_id))?,
    };
    let config = ScanConfig {
        batch_size: cli.batch_size,
        concurrency: cli.concurrency,
        retry: RetryConfig {
            max_attempts: cli.retries,
            backoff: Backoff::fixed(Duration::from_secs(cli.retry_delay_secs)),
        },
    };
    let client = HttpBalanceClient::new(
        cli.rpc_url.as_str(),
        HttpClientConfig {
            request_timeout: Duration::from_secs(cli.timeout_secs),
            ..Default::default()
        },
    )?;

    let scan = BalanceScan::new(Arc::new(client), target, config)?;
    let progress = spawn_progress_logger(scan.subscribe());
    let result = scan.scan(&addresses).await;
    progress.abort();

    let mut exporter = ResultExporter::new(&cli.with_out, &cli.without_out);
    if let Some(path) = &cli.failed_out {
        exporter = exporter.with_failed_path(path);
    }

    let report = match result {
        Ok(report) => report,
        Err(ScanError::AllBatchesFailed { batches, failed }) => {
            eprintln!(
                "Query failed for all {batches} batches; check the RPC endpoint and parameters"
            );
            if let Some(path) = exporter
                .export_failed(&failed)
                .context("exporting failed addresses")?
            {
                eprintln!("Failed addresses written to {}", path.display());
            }
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    let results = &report.results;
    for (address, balance) in results.with_balance.iter().chain(&results.without_balance) {
        info!("{}", balance_line(address, balance, &cli.symbol));
    }

    let artifacts = exporter.export(results).context("exporting results")?;

    println!();
    println!("Query complete");
    println!("  With balance:     {}", results.with_balance.len());
    println!("  Without balance:  {}", results.without_balance.len());
    if report.is_partial() {
        println!(
            "  Failed batches:   {} of {} ({} addresses skipped)",
            report.failed_batches,
            report.batches,
            results.failed.len()
        );
    }
    println!("  Elapsed:          {:.2}s", report.elapsed.as_secs_f64());
    println!(
        "Results written to {} and {}",
        artifacts.with_balance.display(),
        artifacts.without_balance.display()
    );
    if let Some(failed) = &artifacts.failed {
        println!("Failed addresses written to {}", failed.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Per-address output line: `<address>, <balance> <symbol>`.
fn balance_line(address: &str, balance: &DecimalBalance, symbol: &str) -> String {
    format!("{address}, {balance} {symbol}")
}

fn spawn_progress_logger(mut rx: watch::Receiver<Progress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = *rx.borrow_and_update();
            if p.completed > 0 {
                info!(
                    completed = p.completed,
                    total = p.total,
                    failed = p.failed,
                    "progress"
                );
            }
        }
    })
}
