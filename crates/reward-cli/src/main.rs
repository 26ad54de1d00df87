//! reward-cli - DecisionEngine を手元で動かすためのバイナリ
//!
//! 設定は環境変数（`Settings::from_env`）、ログは `RUST_LOG`（デフォルト `info`）。
//! 出力は stdout に JSON、ログとエラーは stderr。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use reward_core::{DecisionEngine, EngineBuilder, RewardError, Settings, TransactionRequest};

#[derive(Debug, Parser)]
#[command(name = "reward-cli", version, about = "Deterministic reward decisions for transactions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decide the reward for one transaction
    Decide {
        #[arg(long)]
        txn_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        merchant_id: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = TransactionRequest::DEFAULT_TXN_TYPE)]
        txn_type: String,
        /// Unix seconds of the transaction
        #[arg(long)]
        ts: Option<i64>,
    },
    /// Decide every request in a JSON-lines file (stdin when omitted) with one engine
    Replay { path: Option<PathBuf> },
    /// Print the active policy snapshot
    Policy,
    /// Print service health
    Health,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Decide {
            txn_id,
            user_id,
            merchant_id,
            amount,
            txn_type,
            ts,
        } => {
            let engine = build_engine().await?;
            let mut request =
                TransactionRequest::new(txn_id, user_id, merchant_id, amount).with_txn_type(txn_type);
            request.timestamp = ts;
            match engine.decide(&request).await {
                Ok(decision) => print_json(&decision)?,
                Err(error) => {
                    report(&error);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Replay { path } => {
            let engine = build_engine().await?;
            let failures = match path {
                Some(path) => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    replay(&engine, BufReader::new(file)).await?
                }
                None => replay(&engine, BufReader::new(tokio::io::stdin())).await?,
            };
            if failures > 0 {
                tracing::warn!(failures, "replay finished with failures");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Policy => print_json(&build_engine().await?.policy_snapshot())?,
        Command::Health => print_json(&Health {
            status: "healthy",
            service: "reward-decision-service",
            version: env!("CARGO_PKG_VERSION"),
        })?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn build_engine() -> anyhow::Result<DecisionEngine> {
    let settings = Settings::from_env()?;
    let engine = EngineBuilder::from_settings(&settings).await?.build()?;
    Ok(engine)
}

/// 1 行 1 リクエスト。失敗した行は報告して続行し、失敗数を返す
async fn replay<R>(engine: &DecisionEngine, reader: R) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut failures = 0;
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("failed to read requests")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let request: TransactionRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                report(&RewardError::Validation(format!("line {line_no}: {e}")));
                failures += 1;
                continue;
            }
        };
        match engine.decide(&request).await {
            Ok(decision) => print_json(&decision)?,
            Err(error) => {
                report(&error);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

fn report(error: &RewardError) {
    tracing::debug!(%error, client_error = error.is_client_error(), "decision failed");
    eprintln!("Error processing reward decision: {error}");
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
