//! Bus liveness probe and transaction behavior over a scripted port

use std::sync::Arc;
use zaberkit_communication::mock::ScriptedPort;
use zaberkit_communication::Bus;
use zaberkit_core::{ConnectionError, Error};

#[test]
fn probe_accepts_a_chain_of_one_device() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    let bus = Bus::attach(Box::new(port.clone()), "scripted").unwrap();

    assert_eq!(bus.port_name(), "scripted");
    assert_eq!(port.writes(), vec![b"/\n".to_vec()]);
    assert_eq!(port.unread_len(), 0, "probe must drain every pending line");
}

#[test]
fn probe_accepts_a_chain_of_many_devices() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    port.push_reply(b"@02 0 OK  -- IDLE\r\n");
    port.push_reply(b"@03 0 OK  -- BUSY\r\n");
    assert!(Bus::attach(Box::new(port), "scripted").is_ok());
}

#[test]
fn probe_rejects_a_port_that_talks_garbage() {
    let port = ScriptedPort::new();
    port.push_reply(b"garbage\r\n");
    let err = Bus::attach(Box::new(port), "scripted").unwrap_err();
    match err {
        Error::Connection(ConnectionError::NotADevice { port }) => {
            assert_eq!(port, "scripted");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn probe_rejects_a_silent_port() {
    // Nothing answers: the reads time out and no frame ever arrives.
    let port = ScriptedPort::new();
    let err = Bus::attach(Box::new(port), "scripted").unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::NotADevice { .. })
    ));
}

#[test]
fn probe_rejects_a_chain_with_one_garbled_talker() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    port.push_reply(b"noise\r\n");
    assert!(Bus::attach(Box::new(port), "scripted").is_err());
}

#[test]
fn transact_returns_the_raw_reply_line() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    let bus = Bus::attach(Box::new(port.clone()), "scripted").unwrap();
    port.clear_writes();

    port.push_reply(b"@01 0 OK IDLE -- 2\r\n");
    let line = bus.transact(b"/01 0 get system.axiscount\n").unwrap();
    assert_eq!(line, b"@01 0 OK IDLE -- 2\r\n");
    assert_eq!(port.writes(), vec![b"/01 0 get system.axiscount\n".to_vec()]);
}

#[test]
fn transact_on_a_silent_device_yields_an_empty_line() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    let bus = Bus::attach(Box::new(port), "scripted").unwrap();

    // No reply queued: the read times out. The empty line is the caller's
    // signal; the frame parser rejects it as malformed.
    let line = bus.transact(b"/01 0 get pos\n").unwrap();
    assert!(line.is_empty());
}

#[test]
fn bus_lock_is_reentrant_within_one_caller() {
    let port = ScriptedPort::new();
    port.push_reply(b"@01 0 OK  -- IDLE\r\n");
    let bus = Arc::new(Bus::attach(Box::new(port.clone()), "scripted").unwrap());

    // Holding the bus and then transacting from the same thread must not
    // deadlock: a multi-step command composes transactions under one hold.
    let _hold = bus.hold();
    port.push_reply(b"@01 0 OK IDLE -- 1\r\n");
    let line = bus.transact(b"/01 0 get limit.home.triggered\n").unwrap();
    assert_eq!(line, b"@01 0 OK IDLE -- 1\r\n");
}
