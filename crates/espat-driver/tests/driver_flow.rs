//! Driver operations against a scripted module.

mod common;

use espat_core::{LinkId, Outcome, Terminator};
use espat_driver::{DriverConfig, DriverError};
use espat_hardware::Transport;
use espat_protocol::InboundOutcome;
use std::net::Ipv4Addr;

fn link(id: u8) -> LinkId {
    LinkId::new(id).unwrap()
}

#[test]
fn test_init_healthy_module() {
    let mut driver = common::driver(&common::healthy_init());
    let version = driver.init().unwrap();

    assert_eq!(version, "1.5.4.1(39cb9a32)");
    assert_eq!(
        common::written(&driver),
        "ATE0\r\nAT\r\nATE0\r\nAT+CWMODE=1\r\nAT+CIPMUX=1\r\nAT+CIPDINFO=1\r\n\
         AT+CWAUTOCONN=0\r\nAT+CWDHCP=1,1\r\nAT+GMR\r\n"
    );
    assert_eq!(driver.session().transport().unused_replies(), 0);
    assert_eq!(driver.session().transport().pending(), 0);

    // Same exchange without the reset pauses: the clocks differ by exactly
    // the leading pause and the two settle pauses.
    let quick = DriverConfig {
        reset_delay_ms: 0,
        reset_settle_ms: 0,
        ..Default::default()
    };
    let mut fast = common::driver_with(quick, &common::healthy_init());
    fast.init().unwrap();
    let elapsed = driver.session().transport().now_ms();
    let elapsed_fast = fast.session().transport().now_ms();
    assert_eq!(elapsed - elapsed_fast, 1000 + 2 * 200);
}

#[test]
fn test_reset_discards_stale_output() {
    let replies = common::healthy_init();
    let mut driver = common::driver(&replies[2..8]);
    driver
        .session_mut()
        .transport_mut()
        .push_rx("\r\nERROR\r\nready\r\n");

    driver.reset().unwrap();
    assert_eq!(
        common::written(&driver),
        "ATE0\r\nAT+CWMODE=1\r\nAT+CIPMUX=1\r\nAT+CIPDINFO=1\r\n\
         AT+CWAUTOCONN=0\r\nAT+CWDHCP=1,1\r\n"
    );
    assert_eq!(driver.session().transport().unused_replies(), 0);
    assert_eq!(driver.session().transport().pending(), 0);
}

#[test]
fn test_init_retries_probe() {
    let mut replies = common::healthy_init();
    replies.insert(1, ("AT\r\n", "\r\nERROR\r\n"));
    replies.insert(1, ("AT\r\n", "\r\nERROR\r\n"));
    let mut driver = common::driver(&replies);

    driver.init().unwrap();
    let probes = common::written(&driver).matches("AT\r\n").count();
    assert_eq!(probes, 3);
}

#[test]
fn test_init_gives_up() {
    let mut driver = common::driver(&[]);
    let err = driver.init().unwrap_err();

    assert!(matches!(err, DriverError::NotResponding { attempts: 5 }));
    assert!(err.is_timeout());
    // Echo-off deadline, five probe deadlines and four pauses between them.
    assert_eq!(driver.session().transport().now_ms(), 10_000);
}

#[test]
fn test_init_accepts_unknown_firmware() {
    let mut replies = common::healthy_init();
    replies.pop();
    replies.push(("AT+GMR", "SDK version:2.2.1(6ab97e9)\r\n\r\nOK\r\n"));
    let mut driver = common::driver(&replies);
    assert_eq!(driver.init().unwrap(), "2.2.1(6ab97e9)");
}

#[test]
fn test_join_access_point() {
    let mut driver = common::driver(&[(
        "AT+CWJAP_CUR",
        "WIFI DISCONNECT\r\nWIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n",
    )]);
    driver.join("home", "pa\"ss").unwrap();
    assert_eq!(
        common::written(&driver),
        "AT+CWJAP_CUR=\"home\",\"pa\\\"ss\"\r\n"
    );
}

#[test]
fn test_join_wrong_password() {
    let mut driver = common::driver(&[("AT+CWJAP_CUR", "+CWJAP:1\r\n\r\nFAIL\r\n")]);
    let err = driver.join("home", "wrong").unwrap_err();

    assert!(matches!(
        err,
        DriverError::Rejected {
            outcome: Outcome::Terminator(Terminator::Fail),
            ..
        }
    ));
    assert!(!err.to_string().contains("wrong"));
}

#[test]
fn test_start_tcp_already_connected() {
    let mut driver = common::driver(&[(
        "AT+CIPSTART=0,\"TCP\"",
        "ALREADY CONNECTED\r\n\r\nERROR\r\n",
    )]);
    driver.start_tcp(link(0), "10.0.0.1", 80).unwrap();

    assert_eq!(
        common::written(&driver),
        "AT+CIPSTART=0,\"TCP\",\"10.0.0.1\",80\r\n"
    );
    assert_eq!(driver.session().transport().pending(), 0);
}

#[test]
fn test_start_udp() {
    let mut driver = common::driver(&[("AT+CIPSTART=4,\"UDP\"", "4,CONNECT\r\n\r\nOK\r\n")]);
    driver.start_udp(link(4), "0.0.0.0", 5000, 5001).unwrap();
    assert_eq!(
        common::written(&driver),
        "AT+CIPSTART=4,\"UDP\",\"0.0.0.0\",5000,5001,2\r\n"
    );
}

#[test]
fn test_start_tcp_refused() {
    let mut driver = common::driver(&[("AT+CIPSTART", "\r\nERROR\r\nCLOSED\r\n")]);
    let err = driver.start_tcp(link(1), "10.0.0.1", 81).unwrap_err();
    assert!(matches!(
        err,
        DriverError::Rejected {
            outcome: Outcome::Terminator(Terminator::Error),
            ..
        }
    ));
}

#[test]
fn test_send_payload() {
    let mut driver = common::driver(&[
        ("AT+CIPSEND=0,5\r\n", "\r\nOK\r\n> "),
        ("hello", "\r\nRecv 5 bytes\r\n\r\nSEND OK\r\n"),
    ]);
    driver.send(link(0), b"hello").unwrap();
    assert_eq!(common::written(&driver), "AT+CIPSEND=0,5\r\nhello");
}

#[test]
fn test_send_to_destination() {
    let mut driver = common::driver(&[
        ("AT+CIPSEND=1,3,", "\r\nOK\r\n> "),
        ("abc", "\r\nRecv 3 bytes\r\n\r\nSEND OK\r\n"),
    ]);
    driver
        .send_to(link(1), b"abc", Ipv4Addr::new(10, 0, 0, 9), 5000)
        .unwrap();
    assert_eq!(
        common::written(&driver),
        "AT+CIPSEND=1,3,\"10.0.0.9\",5000\r\nabc"
    );
}

#[test]
fn test_send_without_prompt_keeps_payload() {
    let mut driver = common::driver(&[("AT+CIPSEND", "link is not valid\r\n\r\nERROR\r\n")]);
    let err = driver.send(link(2), b"data").unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(common::written(&driver), "AT+CIPSEND=2,4\r\n");
    assert_eq!(driver.session().transport().now_ms(), 2000);
}

#[test]
fn test_send_not_acknowledged() {
    let mut driver = common::driver(&[
        ("AT+CIPSEND", "\r\nOK\r\n> "),
        ("data", "\r\nSEND FAIL\r\n\r\nERROR\r\n"),
    ]);
    let err = driver.send(link(0), b"data").unwrap_err();
    assert!(matches!(
        err,
        DriverError::Rejected {
            outcome: Outcome::Terminator(Terminator::Error),
            ..
        }
    ));
}

#[test]
fn test_station_ip() {
    let mut driver = common::driver(&[(
        "AT+CIFSR",
        "+CIFSR:STAIP,\"192.168.1.40\"\r\n+CIFSR:STAMAC,\"5c:cf:7f:00:00:01\"\r\n\r\nOK\r\n",
    )]);
    assert_eq!(driver.station_ip().unwrap(), Ipv4Addr::new(192, 168, 1, 40));
}

#[test]
fn test_station_ip_missing() {
    let mut driver = common::driver(&[("AT+CIFSR", "\r\nERROR\r\n")]);
    let err = driver.station_ip().unwrap_err();
    assert!(matches!(err, DriverError::NoValue { .. }));
    assert!(!err.is_timeout());
}

#[test]
fn test_wait_for_data_and_clients() {
    let mut driver = common::driver(&[(
        "AT+CWLIF",
        "192.168.4.2,bc:dd:c2:11:22:33\r\n\r\nOK\r\n",
    )]);
    driver
        .session_mut()
        .transport_mut()
        .push_rx("+IPD,3,4,192.168.4.2,4000:ping");

    let mut out = [0u8; 8];
    let outcome = driver.wait_for_data(500, &mut out).unwrap();
    assert!(matches!(outcome, InboundOutcome::Received(d) if d.header.link == link(3)));
    assert_eq!(&out[..4], b"ping");

    let clients = driver.connected_clients().unwrap();
    assert_eq!(clients.records(), ["192.168.4.2"]);
}

#[test]
fn test_custom_deadlines() {
    let config = DriverConfig {
        command_timeout_ms: 50,
        ..Default::default()
    };
    let mut driver = common::driver_with(config, &[]);
    let err = driver.close(link(0)).unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(driver.session().transport().now_ms(), 50);
}
