// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use clap::Parser;
use serialport::{DataBits, Parity, StopBits};
use std::path::PathBuf;
use std::sync::PoisonError;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ymodem_rx::DirectorySink;
use ymodem_rx::receiver::{self, ReceiverFsm};
use ymodem_rx::serial::RealSerialPort;

#[derive(Parser)]
#[command(name = "ymodem-rx")]
#[command(about = "Receive a file over a serial line with the YMODEM protocol", long_about = None)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Data bits (5, 6, 7, or 8)
    #[arg(long, default_value = "8", value_name="BITS")]
    data_bits: u8,

    /// Parity (none, odd, or even)
    #[arg(long, default_value = "none")]
    parity: String,

    /// Stop bits (1 or 2)
    #[arg(long, default_value = "1", value_name="BITS")]
    stop_bits: u8,

    /// Directory to save the received file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Reject files announced larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,

    /// Seconds to wait for each byte from the sender
    #[arg(long, default_value = "3", value_name = "SECS")]
    timeout: u64,

    /// Start requests, or consecutive timeouts during a transfer, before giving up
    #[arg(long, default_value = "10")]
    retries: u32,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn parse_data_bits(bits: u8) -> Result<DataBits, String> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(format!("Invalid data bits: {}. Must be 5, 6, 7, or 8", bits)),
    }
}

fn parse_parity(parity: &str) -> Result<Parity, String> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        _ => Err(format!("Invalid parity: {}. Must be 'none', 'odd', or 'even'", parity)),
    }
}

fn parse_stop_bits(bits: u8) -> Result<StopBits, String> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(format!("Invalid stop bits: {}. Must be 1 or 2", bits)),
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let settings = parse_data_bits(cli.data_bits).and_then(|data_bits| {
        Ok((data_bits, parse_parity(&cli.parity)?, parse_stop_bits(cli.stop_bits)?))
    });
    let (data_bits, parity, stop_bits) = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !cli.output_dir.is_dir() {
        eprintln!("Output directory not found: {}", cli.output_dir.display());
        std::process::exit(1);
    }

    tracing::info!("Opening serial port: {}", cli.port);
    tracing::info!("Settings: {} baud, {:?}, {:?}, {:?}", cli.baud, data_bits, parity, stop_bits);

    let serial_port = match RealSerialPort::open(&cli.port, cli.baud, data_bits, parity, stop_bits) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Failed to open serial port: {}", e);
            std::process::exit(1);
        }
    };

    println!("Receiving to: {}", cli.output_dir.display());
    let sink = DirectorySink::new(cli.output_dir, cli.max_size);
    let completed = sink.completed_handle();
    let fsm = ReceiverFsm::new(
        Box::new(serial_port),
        sink,
        Duration::from_secs(cli.timeout),
        cli.retries,
    );

    if let Err(e) = receiver::run_receiver(fsm) {
        eprintln!("Receive failed: {}", e);
        std::process::exit(1);
    }

    let completed = completed.lock().unwrap_or_else(PoisonError::into_inner);
    if completed.is_empty() {
        eprintln!("Receive failed: file could not be saved");
        std::process::exit(1);
    }
    for path in completed.iter() {
        println!("Saved {}", path.display());
    }
    println!("File received successfully!");
}
