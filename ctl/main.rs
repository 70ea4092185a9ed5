#![forbid(unsafe_code)]

//! `trace-collector-ctl` — command-line client for a running collector.
//!
//! Probes the collector, runs a capture window and prints its events, or
//! submits a hand-written batch.

use clap::{Parser, Subcommand};
use reqwest::StatusCode;

#[derive(Debug, Parser)]
#[command(
    name = "trace-collector-ctl",
    about = "Client for the trace-collector server",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the collector.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report whether a capture window is open.
    Ping,

    /// Run one capture window and print the collected events.
    Capture,

    /// Submit one batch of events.
    Submit {
        /// Instrument name the batch is tagged with.
        #[arg(long)]
        instrument: String,
        /// Events as a JSON array, e.g. `'[{"name":"load"}]'`.
        events: String,
    },
}

type CtlResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(&args)) {
        eprintln!("Error: {err}");
        eprintln!("Is trace-collector listening on {}?", args.url);
        std::process::exit(1);
    }
}

async fn run(args: &Cli) -> CtlResult<()> {
    let client = reqwest::Client::new();
    let base = args.url.trim_end_matches('/');

    match &args.command {
        Command::Ping => {
            let resp = client.get(format!("{base}/ping")).send().await?;
            match resp.status() {
                StatusCode::OK => println!("idle"),
                StatusCode::NOT_IMPLEMENTED => println!("collecting"),
                other => return Err(format!("unexpected status {other}").into()),
            }
        }
        Command::Capture => {
            let resp = client
                .get(format!("{base}/"))
                .send()
                .await?
                .error_for_status()?;
            let events: Vec<serde_json::Value> = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Command::Submit { instrument, events } => {
            let parsed: serde_json::Value = serde_json::from_str(events)?;
            if !parsed.is_array() {
                return Err("events must be a JSON array".into());
            }
            client
                .post(format!("{base}/collect"))
                .query(&[("instrument", instrument.as_str())])
                .body(parsed.to_string())
                .send()
                .await?
                .error_for_status()?;
            println!("OK");
        }
    }

    Ok(())
}
