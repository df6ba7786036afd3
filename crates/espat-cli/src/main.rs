//! `espat`: drive an ESP8266 module from the command line.
//!
//! ```text
//! espat --port /dev/ttyUSB0 probe
//! espat --config espat.json clients
//! RUST_LOG=espat_protocol=trace espat ip
//! espat listen --port 5000 --count 10
//! ```

mod cli;
mod config;

use crate::cli::{Cli, Command};
use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::Parser;
use espat_core::{AtError, LinkId};
use espat_driver::{DriverError, EspDriver};
use espat_hardware::{SerialTransport, Transport};
use espat_protocol::InboundOutcome;
use std::io::Write;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?.with_overrides(cli.port, cli.baud);
    let transport = SerialTransport::open(&config.serial)
        .with_context(|| format!("opening {}", config.serial.path))?;
    info!(
        "Opened {} at {} baud",
        config.serial.path, config.serial.baud_rate
    );

    let mut driver = EspDriver::with_config(transport, config.session, config.driver)?;
    let stdout = std::io::stdout();
    execute(&mut driver, &cli.command, &mut stdout.lock())
}

/// Run one subcommand against `driver`, printing results to `out`.
fn execute<T: Transport>(
    driver: &mut EspDriver<T>,
    command: &Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Probe => {
            let version = driver.init()?;
            writeln!(out, "firmware {version}")?;
        }
        Command::Clients => {
            let table = driver.connected_clients()?;
            for (index, address) in table.iter().enumerate() {
                writeln!(out, "{index}: {address}")?;
            }
            if table.is_overflowed() {
                writeln!(out, "({} more not shown)", table.dropped())?;
            }
            if table.overlong() > 0 {
                writeln!(out, "({} unreadable entries skipped)", table.overlong())?;
            }
        }
        Command::Ip => {
            match driver.station_ip() {
                Ok(ip) => writeln!(out, "station {ip}")?,
                Err(err) => writeln!(out, "station unavailable: {err}")?,
            }
            match driver.soft_ap_ip() {
                Ok(ip) => writeln!(out, "soft-ap {ip}")?,
                Err(err) => writeln!(out, "soft-ap unavailable: {err}")?,
            }
        }
        Command::Listen {
            port,
            link,
            timeout,
            count,
        } => {
            let link = LinkId::new(*link)?;
            driver.start_udp(link, "0.0.0.0", *port, *port)?;
            info!("Listening on UDP port {} (link {})", port, link);
            listen(driver, *timeout, *count, out)?;
        }
    }
    Ok(())
}

fn listen<T: Transport>(
    driver: &mut EspDriver<T>,
    timeout_ms: u64,
    count: Option<usize>,
    out: &mut impl Write,
) -> Result<()> {
    let mut buf = [0u8; 2048];
    let mut received = 0;
    while count.is_none_or(|limit| received < limit) {
        let outcome = match driver.wait_for_data(timeout_ms, &mut buf) {
            Ok(outcome) => outcome,
            Err(DriverError::At(AtError::MalformedHeader { message })) => {
                warn!("Skipping notification with bad header: {}", message);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        match outcome {
            InboundOutcome::Received(data) | InboundOutcome::Partial(data) => {
                received += 1;
                writeln!(
                    out,
                    "{} link {}: {}",
                    data.header.remote,
                    data.header.link,
                    String::from_utf8_lossy(&buf[..data.stored]).escape_debug()
                )?;
            }
            InboundOutcome::NoData => {
                info!("No data within {}ms, stopping", timeout_ms);
                break;
            }
            InboundOutcome::HeaderTimedOut => continue,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use espat_hardware::mock::MockTransport;

    fn driver(replies: &[(&str, &str)]) -> EspDriver<MockTransport> {
        let mut link = MockTransport::new();
        for (trigger, reply) in replies {
            link.reply_to(trigger, reply);
        }
        EspDriver::new(link).unwrap()
    }

    fn output(driver: &mut EspDriver<MockTransport>, command: Command) -> String {
        let mut out = Vec::new();
        execute(driver, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_clients_output() {
        let mut driver = driver(&[("AT+CWLIF", "192.168.4.2,aa\r\n192.168.4.3,bb\r\n\r\nOK\r\n")]);
        assert_eq!(
            output(&mut driver, Command::Clients),
            "0: 192.168.4.2\n1: 192.168.4.3\n"
        );
    }

    #[test]
    fn test_ip_output_reports_missing_address() {
        let mut driver = driver(&[
            ("AT+CIFSR", "+CIFSR:STAIP,\"0.0.0.0\"\r\n\r\nOK\r\n"),
            ("AT+CIPAP?", "\r\nERROR\r\n"),
        ]);
        let text = output(&mut driver, Command::Ip);
        assert!(text.starts_with("station 0.0.0.0\n"));
        assert!(text.contains("soft-ap unavailable"));
    }

    #[test]
    fn test_listen_stops_after_count() {
        let mut driver = driver(&[("AT+CIPSTART=1,\"UDP\"", "1,CONNECT\r\n\r\nOK\r\n")]);
        let link = driver.session_mut().transport_mut();
        link.push_rx_at(50, "+IPD,1,2,10.0.0.5,6000:hi");
        link.push_rx_at(100, "+IPD,1,3,10.0.0.6,6000:a\nb");

        let text = output(
            &mut driver,
            Command::Listen {
                port: 5000,
                link: 1,
                timeout: 1000,
                count: Some(2),
            },
        );
        assert_eq!(
            text,
            "10.0.0.5:6000 link 1: hi\n10.0.0.6:6000 link 1: a\\nb\n"
        );
    }

    #[test]
    fn test_listen_skips_malformed_header() {
        let mut driver = driver(&[("AT+CIPSTART=1,\"UDP\"", "1,CONNECT\r\n\r\nOK\r\n")]);
        let link = driver.session_mut().transport_mut();
        link.push_rx_at(50, "+IPD,1,zz,10.0.0.5,6000:junk");
        link.push_rx_at(100, "+IPD,1,2,10.0.0.6,6000:ok");

        let text = output(
            &mut driver,
            Command::Listen {
                port: 5000,
                link: 1,
                timeout: 1000,
                count: Some(1),
            },
        );
        assert_eq!(text, "10.0.0.6:6000 link 1: ok\n");
    }

    #[test]
    fn test_listen_rejects_bad_link() {
        let mut driver = driver(&[]);
        let mut out = Vec::new();
        let command = Command::Listen {
            port: 5000,
            link: 9,
            timeout: 10,
            count: None,
        };
        assert!(execute(&mut driver, &command, &mut out).is_err());
        assert!(driver.session().transport().written().is_empty());
    }
}
