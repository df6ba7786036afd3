//! ESP8266 operations.
//!
//! Every method here is a short script over the engine: build a command,
//! run one or more read-until exchanges, branch on the outcomes. Outcomes
//! other than the one an operation needs become [`DriverError::Rejected`]
//! with the command line attached.
//!
//! # Initialization Sequence
//!
//! ```text
//! ATE0 ──> AT ──OK──> pause, flush ──> ATE0, AT+CWMODE=1*, AT+CIPMUX=1,
//!          │ ▲        AT+CIPDINFO=1, AT+CWAUTOCONN=0, AT+CWDHCP=1,1* ──> AT+GMR
//!          └─┘
//!       retry after
//!       probe interval                 * followed by a settle pause
//! ```

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use espat_core::constants::{TAG_SEND_PROMPT, TAG_WIFI_GOT_IP};
use espat_core::{AtError, Encryption, EspMode, LinkId, LinkProtocol, Outcome, Terminator};
use espat_hardware::Transport;
use espat_protocol::{
    AtCommand, AtSession, ClientTable, ExtractOutcome, InboundOutcome, SessionConfig,
};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Highest `AT+RFPOWER` value (0.25 dBm steps).
pub const MAX_TX_POWER: u8 = 82;

/// Commands sent after a successful probe to put the module in a known state:
/// echo off, station mode, multiple connections, remote address in `+IPD`,
/// no auto-connect at boot, station DHCP on. The flag marks commands the
/// module needs a pause after.
const RESET_SEQUENCE: [(&str, bool); 6] = [
    ("ATE0", false),
    ("AT+CWMODE=1", true),
    ("AT+CIPMUX=1", false),
    ("AT+CIPDINFO=1", false),
    ("AT+CWAUTOCONN=0", false),
    ("AT+CWDHCP=1,1", true),
];

const FIRMWARE_CAPACITY: usize = 32;
const ADDRESS_CAPACITY: usize = 16;
const AP_INFO_CAPACITY: usize = 200;

/// Driver for one ESP8266 module running AT firmware.
#[derive(Debug)]
pub struct EspDriver<T: Transport> {
    session: AtSession<T>,
    config: DriverConfig,
}

impl<T: Transport> EspDriver<T> {
    /// Create a driver with default session and driver settings.
    ///
    /// # Errors
    ///
    /// Only fails if the default session configuration is invalid.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, SessionConfig::default(), DriverConfig::default())
    }

    /// Create a driver with custom settings.
    ///
    /// # Errors
    ///
    /// Returns the session configuration error, if any.
    pub fn with_config(
        transport: T,
        session_config: SessionConfig,
        config: DriverConfig,
    ) -> Result<Self> {
        let session = AtSession::with_config(transport, session_config)?;
        Ok(Self { session, config })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The underlying engine, for exchanges this driver does not wrap.
    pub fn session(&self) -> &AtSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AtSession<T> {
        &mut self.session
    }

    /// Consume the driver and return the transport.
    pub fn into_inner(self) -> T {
        self.session.into_inner()
    }

    /// Bring the module to a known state.
    ///
    /// Turns echo off, probes with `AT` until it answers `OK`, runs the reset
    /// sequence and reads the firmware version. A firmware outside the 1.x
    /// line is logged but accepted.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotResponding` if no probe succeeds.
    pub fn init(&mut self) -> Result<String> {
        let timeout = self.config.command_timeout_ms;
        self.session.send_command(&AtCommand::new("ATE0"), timeout)?;

        let attempts = self.config.init_attempts.max(1);
        let mut alive = false;
        for attempt in 1..=attempts {
            let outcome = self.session.send_command(&AtCommand::new("AT"), timeout)?;
            if outcome.is_ok() {
                alive = true;
                break;
            }
            debug!("Probe {}/{} answered {}", attempt, attempts, outcome);
            if attempt < attempts {
                let interval = self.config.probe_interval_ms;
                self.session.transport_mut().delay_ms(interval);
            }
        }
        if !alive {
            warn!("Module not responding after {} probes", attempts);
            return Err(DriverError::NotResponding { attempts });
        }

        self.reset()?;

        let version = self.firmware_version()?;
        if version.starts_with("1.") {
            info!("Module ready, firmware {}", version);
        } else {
            warn!("Unsupported firmware {}", version);
        }
        Ok(version)
    }

    /// Run the reset sequence.
    ///
    /// Waits, drops whatever the module printed meanwhile (boot banner, late
    /// echoes), then sends the sequence. A command the module refuses is
    /// logged and the sequence continues.
    pub fn reset(&mut self) -> Result<()> {
        let DriverConfig {
            command_timeout_ms: timeout,
            reset_delay_ms,
            reset_settle_ms,
            ..
        } = self.config;

        let transport = self.session.transport_mut();
        transport.delay_ms(reset_delay_ms);
        let stale = transport.drain_input()?;
        if stale > 0 {
            debug!("Dropped {} stale bytes before reset", stale);
        }

        for (line, settle) in RESET_SEQUENCE {
            let outcome = self.session.send_command(&AtCommand::from(line), timeout)?;
            if let Err(err) = outcome.expect(Outcome::Terminator(Terminator::Ok)) {
                warn!("{} during reset: {}", line, err);
            }
            if settle {
                self.session.transport_mut().delay_ms(reset_settle_ms);
            }
        }
        Ok(())
    }

    /// SDK version reported by `AT+GMR`, e.g. `1.5.4(baaeaebb)`.
    pub fn firmware_version(&mut self) -> Result<String> {
        self.extract_value(
            AtCommand::new("AT+GMR"),
            b"SDK version:",
            b"\r\n",
            FIRMWARE_CAPACITY,
        )
    }

    pub fn set_mode(&mut self, mode: EspMode) -> Result<()> {
        self.require_ok(AtCommand::new("AT+CWMODE").arg(mode.to_u8()))
    }

    /// Set RF transmit power in 0.25 dBm steps, 0 to [`MAX_TX_POWER`].
    pub fn set_tx_power(&mut self, power: u8) -> Result<()> {
        if power > MAX_TX_POWER {
            return Err(DriverError::invalid_argument(format!(
                "tx power must be 0-{MAX_TX_POWER}, got {power}"
            )));
        }
        self.require_ok(AtCommand::new("AT+RFPOWER").arg(power))
    }

    /// Enable or disable DHCP for `mode`, persisted in flash.
    pub fn set_dhcp(&mut self, mode: EspMode, enabled: bool) -> Result<()> {
        self.require_ok(
            AtCommand::new("AT+CWDHCP_DEF")
                .arg(mode.dhcp_code())
                .arg(u8::from(enabled)),
        )
    }

    /// Address range the soft-AP leases to stations.
    pub fn set_dhcp_range(&mut self, start: Ipv4Addr, end: Ipv4Addr) -> Result<()> {
        self.require_ok(
            AtCommand::new("AT+CWDHCPS_DEF")
                .arg(1)
                .arg(self.config.dhcp_lease_minutes)
                .quoted(&start.to_string())
                .quoted(&end.to_string()),
        )
    }

    /// Soft-AP address, also used as its gateway, on a /24 network.
    pub fn set_soft_ap_ip(&mut self, ip: Ipv4Addr) -> Result<()> {
        let ip = ip.to_string();
        self.require_ok(
            AtCommand::new("AT+CIPAP_DEF")
                .quoted(&ip)
                .quoted(&ip)
                .quoted("255.255.255.0"),
        )
    }

    /// Station address from `AT+CIFSR`.
    pub fn station_ip(&mut self) -> Result<Ipv4Addr> {
        let text = self.extract_value(
            AtCommand::new("AT+CIFSR"),
            b":STAIP,\"",
            b"\"\r\n",
            ADDRESS_CAPACITY,
        )?;
        parse_address(&text)
    }

    /// Soft-AP address from `AT+CIPAP?`.
    pub fn soft_ap_ip(&mut self) -> Result<Ipv4Addr> {
        let text = self.extract_value(
            AtCommand::query("AT+CIPAP"),
            b"+CIPAP:ip:\"",
            b"\"\r\n",
            ADDRESS_CAPACITY,
        )?;
        parse_address(&text)
    }

    /// Join an access point for this boot only.
    ///
    /// Waits for `WIFI CONNECTED`, then `WIFI GOT IP`, then the closing `OK`.
    /// A missing `WIFI GOT IP` is logged; the `OK` decides success.
    pub fn join(&mut self, ssid: &str, passphrase: &str) -> Result<()> {
        let cmd = AtCommand::new("AT+CWJAP_CUR").quoted(ssid).secret(passphrase);
        let outcome = self.session.send_command(&cmd, self.config.join_timeout_ms)?;
        if outcome != Outcome::Terminator(Terminator::WifiConnected) {
            warn!("Not connected to {}: {}", ssid, outcome);
            self.settle()?;
            return Err(DriverError::rejected(cmd.name(), outcome));
        }

        let followup = self.config.join_followup_timeout_ms;
        if self
            .session
            .read_until(followup, Some(TAG_WIFI_GOT_IP), false)?
            .is_tag()
        {
            debug!("Got address from {}", ssid);
        } else {
            warn!("No address from {} within {}ms", ssid, followup);
        }

        let outcome = self.session.read_until(followup, None, true)?;
        if !outcome.is_ok() {
            warn!("Join of {} did not complete: {}", ssid, outcome);
            self.settle()?;
            return Err(DriverError::rejected(cmd.name(), outcome));
        }
        info!("Connected to {}", ssid);
        Ok(())
    }

    /// SSID of the access point currently joined, `None` if not joined.
    pub fn connected_ap(&mut self) -> Result<Option<String>> {
        let cmd = AtCommand::query("AT+CWJAP_CUR");
        let (outcome, text) =
            self.session
                .extract_text(Some(&cmd), b"+CWJAP_CUR:", b"\r\n", AP_INFO_CAPACITY)?;
        let Some(text) = text else {
            return match outcome {
                ExtractOutcome::StartTagNotFound(Terminator::Ok) => Ok(None),
                other => Err(DriverError::no_value(cmd.to_string(), other)),
            };
        };
        quoted_field(&text).map(Some).ok_or_else(|| {
            DriverError::At(AtError::unexpected("quoted SSID", text.as_str()))
        })
    }

    /// Start the soft-AP, persisted in flash. Up to four stations may join.
    pub fn start_ap(
        &mut self,
        ssid: &str,
        passphrase: &str,
        channel: u8,
        encryption: Encryption,
        hidden: bool,
    ) -> Result<()> {
        let cmd = AtCommand::new("AT+CWSAP_DEF")
            .quoted(ssid)
            .secret(passphrase)
            .arg(channel)
            .arg(encryption.to_u8())
            .arg(4)
            .arg(u8::from(hidden));
        let outcome = self
            .session
            .send_command(&cmd, self.config.start_ap_timeout_ms)?;
        if !outcome.is_ok() {
            warn!("Failed to start AP {}: {}", ssid, outcome);
            return Err(DriverError::rejected(cmd.name(), outcome));
        }
        info!("Started AP {}", ssid);
        Ok(())
    }

    /// Open a TCP connection on `link`.
    ///
    /// A link that is already connected counts as success.
    pub fn start_tcp(&mut self, link: LinkId, host: &str, port: u16) -> Result<()> {
        let cmd = AtCommand::new("AT+CIPSTART")
            .arg(link)
            .quoted(LinkProtocol::Tcp.as_str())
            .quoted(host)
            .arg(port);
        self.open_link(cmd)
    }

    /// Open a UDP link that accepts datagrams from any peer on
    /// `local_port`.
    pub fn start_udp(
        &mut self,
        link: LinkId,
        host: &str,
        remote_port: u16,
        local_port: u16,
    ) -> Result<()> {
        let cmd = AtCommand::new("AT+CIPSTART")
            .arg(link)
            .quoted(LinkProtocol::Udp.as_str())
            .quoted(host)
            .arg(remote_port)
            .arg(local_port)
            .arg(2);
        self.open_link(cmd)
    }

    /// Send `data` on an open link.
    pub fn send(&mut self, link: LinkId, data: &[u8]) -> Result<()> {
        let cmd = AtCommand::new("AT+CIPSEND").arg(link).arg(data.len());
        self.send_payload(cmd, data, self.config.send_timeout_ms)
    }

    /// Send a datagram to `dest:port` on a UDP link.
    pub fn send_to(&mut self, link: LinkId, data: &[u8], dest: Ipv4Addr, port: u16) -> Result<()> {
        let cmd = AtCommand::new("AT+CIPSEND")
            .arg(link)
            .arg(data.len())
            .quoted(&dest.to_string())
            .arg(port);
        self.send_payload(cmd, data, self.config.send_to_timeout_ms)
    }

    pub fn close(&mut self, link: LinkId) -> Result<()> {
        self.require_ok(AtCommand::new("AT+CIPCLOSE").arg(link))
    }

    /// Wait for one `+IPD` notification and read its payload into `out`.
    pub fn wait_for_data(&mut self, timeout_ms: u64, out: &mut [u8]) -> Result<InboundOutcome> {
        Ok(self.session.wait_for_data(timeout_ms, out)?)
    }

    /// Addresses of the stations attached to the soft-AP.
    pub fn connected_clients(&mut self) -> Result<ClientTable> {
        Ok(self.session.connected_clients()?)
    }

    fn require_ok(&mut self, cmd: AtCommand) -> Result<()> {
        let outcome = self
            .session
            .send_command(&cmd, self.config.command_timeout_ms)?;
        if outcome.is_ok() {
            Ok(())
        } else {
            warn!("{} answered {}", cmd, outcome);
            Err(DriverError::rejected(cmd.to_string(), outcome))
        }
    }

    fn extract_value(
        &mut self,
        cmd: AtCommand,
        start_tag: &[u8],
        end_tag: &[u8],
        capacity: usize,
    ) -> Result<String> {
        let (outcome, text) = self
            .session
            .extract_text(Some(&cmd), start_tag, end_tag, capacity)?;
        text.ok_or_else(|| DriverError::no_value(cmd.to_string(), outcome))
    }

    fn open_link(&mut self, cmd: AtCommand) -> Result<()> {
        let outcome = self
            .session
            .send_command(&cmd, self.config.command_timeout_ms)?;
        match outcome {
            Outcome::Terminator(Terminator::Ok) => {
                info!("{} opened", cmd);
                Ok(())
            }
            Outcome::Terminator(Terminator::AlreadyConnected) => {
                // The module follows ALREADY CONNECTED with ERROR.
                let rest = self
                    .session
                    .read_until(self.config.settle_timeout_ms, None, true)?;
                debug!("{} already open, trailing reply {}", cmd, rest);
                Ok(())
            }
            other => {
                warn!("{} answered {}", cmd, other);
                Err(DriverError::rejected(cmd.to_string(), other))
            }
        }
    }

    fn send_payload(&mut self, cmd: AtCommand, data: &[u8], timeout_ms: u64) -> Result<()> {
        self.session.write_command(&cmd)?;
        let prompt = self
            .session
            .read_until(timeout_ms, Some(TAG_SEND_PROMPT), false)?;
        if !prompt.is_tag() {
            warn!("No send prompt after {}: {}", cmd, prompt);
            return Err(DriverError::rejected(cmd.to_string(), prompt));
        }

        self.session.send_raw(data)?;
        let outcome = self.session.read_until(timeout_ms, None, true)?;
        if outcome != Outcome::Terminator(Terminator::SendOk) {
            warn!("Payload of {} bytes not sent: {}", data.len(), outcome);
            return Err(DriverError::rejected(cmd.to_string(), outcome));
        }
        debug!("Sent {} bytes", data.len());
        Ok(())
    }

    /// Let unsolicited messages after a failed join arrive, then drop them.
    fn settle(&mut self) -> Result<()> {
        let interval = self.config.probe_interval_ms;
        let transport = self.session.transport_mut();
        transport.delay_ms(interval);
        transport.drain_input()?;
        Ok(())
    }
}

fn parse_address(text: &str) -> Result<Ipv4Addr> {
    text.parse()
        .map_err(|_| DriverError::At(AtError::unexpected("IPv4 address", text)))
}

/// Content of the leading double-quoted field of `text`.
fn quoted_field(text: &str) -> Option<String> {
    let rest = text.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}
