//! Receiver binary.
//!
//! # Usage
//!
//! ```bash
//! llt-rx /dev/ttyS1 --baud 38400 --retries 3 --timeout-s 3 --stats received.pdf
//! ```

use std::{fs::File, time::Duration};

use clap::Parser;
use linklayer_core::{LinkSession, Role};
use linklayer_serial::{RealSerialPort, SystemClock};
use linklayer_xfer::receive_file;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Receives a file over a serial link using the stop-and-wait protocol.
#[derive(Parser, Debug)]
#[command(name = "llt-rx")]
#[command(about = "Link-layer receiver: receives a file over a serial port")]
#[command(version)]
struct Args {
    /// Serial device to open, e.g. /dev/ttyS0 or COM3.
    serial_port: String,

    /// Path to write the received file to. The sender's announced
    /// filename is logged but this path is authoritative, so the caller
    /// always knows where the output lands.
    filename: String,

    /// Baud rate.
    #[arg(long, default_value = "9600")]
    baud: u32,

    /// Retransmission budget per connection or teardown attempt.
    #[arg(long, default_value = "3")]
    retries: u32,

    /// Per-retry timeout, in seconds.
    #[arg(long, default_value = "3")]
    timeout_s: u64,

    /// Print a statistics summary when the session closes.
    #[arg(long)]
    stats: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match run(&args) {
        Ok(bytes_written) => {
            tracing::info!(bytes_written, filename = args.filename, "transfer complete");
            std::process::ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!(error = %err, "transfer failed");
            std::process::ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<u64, linklayer_cli::CliError> {
    let port = RealSerialPort::open(&args.serial_port, args.baud)?;
    let timeout = Duration::from_secs(args.timeout_s);
    let mut session = LinkSession::open(port, SystemClock, Role::Receiver, args.retries, timeout)?;

    let output_path = args.filename.clone();
    let summary = receive_file(&mut session, |announced_name, announced_size| {
        tracing::info!(announced_name, announced_size, path = %output_path, "opening output file");
        File::create(&output_path)
    });
    let closed = session.close(args.stats);

    let summary = summary?;
    closed?;
    Ok(summary.bytes_written)
}
