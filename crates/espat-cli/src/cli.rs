//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Talk to an ESP8266 module over a serial port.
#[derive(Parser, Debug)]
#[command(name = "espat")]
#[command(about = "Drive an ESP8266 AT-command modem over a serial port")]
#[command(version)]
pub struct Cli {
    /// Serial device, overrides the config file.
    #[arg(long, short)]
    pub port: Option<String>,

    /// Baud rate, overrides the config file.
    #[arg(long, short)]
    pub baud: Option<u32>,

    /// JSON file with serial, session and driver settings.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Initialize the module and print its firmware version.
    Probe,

    /// List stations attached to the soft-AP.
    Clients,

    /// Print the station and soft-AP addresses.
    Ip,

    /// Open a UDP listener and print incoming datagrams.
    Listen {
        /// Local UDP port.
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Link id used for the listener (0-4).
        #[arg(long, default_value_t = 0)]
        link: u8,

        /// Wait per datagram, in milliseconds.
        #[arg(long, default_value_t = 10_000)]
        timeout: u64,

        /// Stop after this many datagrams. Runs until a wait expires if unset.
        #[arg(long)]
        count: Option<usize>,
    },
}
