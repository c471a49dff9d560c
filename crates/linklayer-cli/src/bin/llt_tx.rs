//! Transmitter binary.
//!
//! # Usage
//!
//! ```bash
//! llt-tx /dev/ttyS0 --baud 38400 --retries 3 --timeout-s 3 --stats report.pdf
//! ```

use std::{fs::File, time::Duration};

use clap::Parser;
use linklayer_core::{LinkSession, Role};
use linklayer_serial::{RealSerialPort, SystemClock};
use linklayer_xfer::send_file;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sends a file over a serial link using the stop-and-wait protocol.
#[derive(Parser, Debug)]
#[command(name = "llt-tx")]
#[command(about = "Link-layer transmitter: sends a file over a serial port")]
#[command(version)]
struct Args {
    /// Serial device to open, e.g. /dev/ttyS0 or COM3.
    serial_port: String,

    /// File to send.
    filename: String,

    /// Baud rate.
    #[arg(long, default_value = "9600")]
    baud: u32,

    /// Retransmission budget per frame or connection attempt.
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
        Ok(sent) => {
            tracing::info!(bytes_sent = sent, filename = args.filename, "transfer complete");
            std::process::ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!(error = %err, "transfer failed");
            std::process::ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<u64, linklayer_cli::CliError> {
    let mut file = File::open(&args.filename)?;
    let file_size = file.metadata()?.len();

    let port = RealSerialPort::open(&args.serial_port, args.baud)?;
    let timeout = Duration::from_secs(args.timeout_s);
    let mut session =
        LinkSession::open(port, SystemClock, Role::Transmitter, args.retries, timeout)?;

    let sent = send_file(&mut session, &args.filename, file_size, &mut file);
    let closed = session.close(args.stats);

    let sent = sent?;
    closed?;
    Ok(sent)
}
