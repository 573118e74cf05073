//! Dispatcher → ports integration tests.
//!
//! Drive raw JSON envelopes through `CommandDispatcher::handle` and
//! assert on the exact sequence of pin, timer and bus calls.

use embedded_hal::digital::PinState;
use hwbridge::app::dispatcher::CommandDispatcher;
use hwbridge::app::events::{ErrorCode, Reply};
use hwbridge::app::ports::{AckStatus, BusDirection, BusPort, Edge, EdgeWatch, Pull};
use hwbridge::config::GatewayConfig;

use crate::mock_hw::{BusCall, MockBus, MockHw, PinCall, TimerCall};

fn dispatcher() -> CommandDispatcher {
    CommandDispatcher::new(&GatewayConfig::default())
}

fn run(d: &mut CommandDispatcher, hw: &mut MockHw, bus: &mut MockBus, raw: &str) -> Reply {
    d.handle(raw.as_bytes(), 0, hw, Some(bus as &mut dyn BusPort))
}

// ── gpio ──────────────────────────────────────────────────────

#[test]
fn gpio_sets_output_writes_and_arms_reversion() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();

    let reply = d.handle(br#"{"gpio":{"pin":5,"state":0}}"#, 1_000, &mut hw, None);

    assert_eq!(reply, Reply::pin_set(5, PinState::Low));
    assert_eq!(hw.pins, [PinCall::SetOutput(5), PinCall::Write(5, PinState::Low)]);
    assert_eq!(hw.timers, [TimerCall::Schedule { id: 1, delay_ms: 2000 }]);
    let p = d.reverter().pending(5).unwrap();
    assert_eq!((p.initial, p.target, p.deadline_ms), (PinState::Low, PinState::High, 3_000));
}

#[test]
fn reversion_fires_complement() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    d.handle(br#"{"gpio":{"pin":2,"state":1}}"#, 0, &mut hw, None);
    let id = hw.last_scheduled().unwrap();

    assert_eq!(d.on_timer_fired(id, &mut hw), Some(2));
    assert_eq!(hw.writes_to(2), [PinState::High, PinState::Low]);
    assert!(hw.live_timers().is_empty(), "fired timer must be released");
}

#[test]
fn second_gpio_replaces_pending_reversion() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    d.handle(br#"{"gpio":{"pin":2,"state":1}}"#, 0, &mut hw, None);
    let first = hw.last_scheduled().unwrap();
    d.handle(br#"{"gpio":{"pin":2,"state":0}}"#, 500, &mut hw, None);
    let second = hw.last_scheduled().unwrap();

    assert!(hw.timers.contains(&TimerCall::Cancel(first)));
    assert_eq!(hw.live_timers(), [second]);

    // Even if the first timer's expiry was already queued, only the
    // second reversion writes.
    assert_eq!(d.on_timer_fired(first, &mut hw), None);
    assert_eq!(d.on_timer_fired(second, &mut hw), Some(2));
    assert_eq!(hw.writes_to(2), [PinState::High, PinState::Low, PinState::High]);
}

// ── button ────────────────────────────────────────────────────

#[test]
fn button_arms_pull_up_rising_edge_watch() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let reply = d.handle(br#"{"button":{"pin":0}}"#, 0, &mut hw, None);

    assert_eq!(reply, Reply::watch(0));
    assert_eq!(
        hw.pins,
        [PinCall::Watch(0, EdgeWatch { pull: Pull::Up, edge: Edge::Rising, debounce_ms: 50 })]
    );
}

#[test]
fn debounce_suppresses_edge_at_100ms_but_not_250ms() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    d.handle(br#"{"button":{"pin":0}}"#, 0, &mut hw, None);

    assert_eq!(d.on_edge(0, 0), Some(Reply::click(0)));
    assert_eq!(d.on_edge(0, 100), None);

    let mut d = dispatcher();
    d.handle(br#"{"button":{"pin":0}}"#, 0, &mut hw, None);
    assert!(d.on_edge(0, 0).is_some());
    assert!(d.on_edge(0, 250).is_some());
}

// ── i2c_read ──────────────────────────────────────────────────

#[test]
fn read_issues_single_start_read_stop() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_read":{"addr":80,"len":3}}"#);

    assert_eq!(reply, Reply::bus_read(AckStatus::Ack, "5a5a5a".into()));
    assert_eq!(
        bus.calls,
        [BusCall::Start(80, BusDirection::Read), BusCall::Read(3), BusCall::Stop]
    );
}

#[test]
fn read_with_nacked_start_returns_empty_data_and_still_stops() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::nacking_start();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_read":{"addr":9,"len":4}}"#);

    assert_eq!(reply, Reply::bus_read(AckStatus::Nack, String::new()));
    assert_eq!(bus.calls, [BusCall::Start(9, BusDirection::Read), BusCall::Stop]);
}

#[test]
fn read_length_out_of_range_never_touches_bus() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();
    for len in [0, -1, 101, 10_000] {
        let raw = format!(r#"{{"i2c_read":{{"addr":80,"len":{len}}}}}"#);
        let reply = run(&mut d, &mut hw, &mut bus, &raw);
        assert_eq!(reply, Reply::error(ErrorCode::ReadLimitExceeded), "len={len}");
    }
    assert!(bus.calls.is_empty());
}

#[test]
fn read_length_past_integer_range_is_over_limit() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();
    for len in ["9223372036854775808", "18446744073709551616", "-18446744073709551616"] {
        let raw = format!(r#"{{"i2c_read":{{"addr":80,"len":{len}}}}}"#);
        let reply = run(&mut d, &mut hw, &mut bus, &raw);
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"error":{"code":-3,"message":"Too long read"}}"#,
            "len={len}"
        );
    }
    assert!(bus.calls.is_empty());
}

#[test]
fn configured_read_limit_above_buffer_is_capped() {
    let config = GatewayConfig {
        read_limit: 150,
        ..GatewayConfig::default()
    };
    let mut d = CommandDispatcher::new(&config);
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_read":{"addr":80,"len":150}}"#);

    assert_eq!(reply, Reply::error(ErrorCode::ReadLimitExceeded));
    assert!(bus.calls.is_empty());
}

#[test]
fn read_at_limit_is_accepted() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();
    match run(&mut d, &mut hw, &mut bus, r#"{"i2c_read":{"addr":80,"len":100}}"#) {
        Reply::BusReadResult { status, data } => {
            assert_eq!(status, AckStatus::Ack);
            assert_eq!(data.len(), 200);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn read_without_bus_is_not_configured() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let reply = d.handle(br#"{"i2c_read":{"addr":80,"len":1}}"#, 0, &mut hw, None);
    assert_eq!(
        serde_json::to_string(&reply).unwrap(),
        r#"{"error":{"code":-2,"message":"I2C is not enabled"}}"#
    );
}

// ── i2c_write ─────────────────────────────────────────────────

#[test]
fn write_example_sends_four_bytes_to_0x50() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50deadbeef"}}"#);

    assert_eq!(
        serde_json::to_string(&reply).unwrap(),
        r#"{"type":"i2c_write","status":0}"#
    );
    assert_eq!(
        bus.calls,
        [
            BusCall::Start(0x50, BusDirection::Write),
            BusCall::Send(0xde),
            BusCall::Send(0xad),
            BusCall::Send(0xbe),
            BusCall::Send(0xef),
            BusCall::Stop,
        ]
    );
}

#[test]
fn write_stops_at_first_nack_and_reports_it() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::nacking_send(1);

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50deadbeef"}}"#);

    assert_eq!(reply, Reply::bus_write(AckStatus::Nack));
    assert_eq!(bus.sends(), 2);
    assert_eq!(bus.stops(), 1);
    assert_eq!(bus.calls.last(), Some(&BusCall::Stop));
}

#[test]
fn write_with_nacked_start_sends_nothing() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::nacking_start();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50dead"}}"#);

    assert_eq!(reply, Reply::bus_write(AckStatus::Nack));
    assert_eq!(bus.calls, [BusCall::Start(0x50, BusDirection::Write), BusCall::Stop]);
}

#[test]
fn write_of_address_only_reports_start_status() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50"}}"#);

    assert_eq!(reply, Reply::bus_write(AckStatus::Ack));
    assert_eq!(bus.calls, [BusCall::Start(0x50, BusDirection::Write), BusCall::Stop]);
}

#[test]
fn write_accepts_uppercase_and_ignores_trailing_digit() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50DEa"}}"#);

    assert_eq!(
        bus.calls,
        [BusCall::Start(0x50, BusDirection::Write), BusCall::Send(0xde), BusCall::Stop]
    );
}

#[test]
fn write_with_non_hex_payload_is_rejected() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();

    let reply = run(&mut d, &mut hw, &mut bus, r#"{"i2c_write":{"data":"50zz"}}"#);

    assert_eq!(
        serde_json::to_string(&reply).unwrap(),
        r#"{"error":{"code":-4,"message":"invalid hex data"}}"#
    );
    assert!(bus.calls.is_empty());
}

// ── unknown ───────────────────────────────────────────────────

#[test]
fn unknown_command_example() {
    let mut d = dispatcher();
    let mut hw = MockHw::new();
    let reply = d.handle(br#"{"unknown":{}}"#, 0, &mut hw, None);
    assert_eq!(
        serde_json::to_string(&reply).unwrap(),
        r#"{"error":{"code":-1,"message":"unknown command"}}"#
    );
    assert!(hw.pins.is_empty());
    assert!(hw.timers.is_empty());
}
