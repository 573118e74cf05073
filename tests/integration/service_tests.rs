//! GatewayService end-to-end tests: envelope in, JSON out.

use embedded_hal::digital::PinState;
use hwbridge::app::ports::BusPort;
use hwbridge::app::service::GatewayService;
use hwbridge::config::GatewayConfig;
use hwbridge::error::{ConfigError, Error};
use hwbridge::events::HwEvent;

use crate::mock_hw::{MockBus, MockHw, MockTransport};

fn service() -> GatewayService {
    GatewayService::new(GatewayConfig::default())
}

#[test]
fn connect_subscribes_to_command_topic() {
    let mut svc = service();
    let mut link = MockTransport::connected();
    svc.on_connected(&mut link).unwrap();
    assert_eq!(link.subscriptions, ["hwbridge/request"]);
}

#[test]
fn missing_topic_is_reported_and_nothing_subscribed() {
    let config = GatewayConfig {
        sub_topic: String::new(),
        ..GatewayConfig::default()
    };
    let mut svc = GatewayService::new(config);
    let mut link = MockTransport::connected();
    assert_eq!(svc.on_connected(&mut link), Err(Error::Config(ConfigError::MissingTopic)));
    assert!(link.subscriptions.is_empty());
}

#[test]
fn every_command_publishes_one_reply_on_response_topic() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut bus = MockBus::new();
    let mut link = MockTransport::connected();

    let inputs: [&[u8]; 5] = [
        br#"{"gpio":{"pin":2,"state":1}}"#,
        br#"{"button":{"pin":0}}"#,
        br#"{"i2c_read":{"addr":80,"len":2}}"#,
        br#"{"i2c_write":{"data":"50deadbeef"}}"#,
        b"garbage",
    ];
    for raw in inputs {
        svc.handle_message(raw, 0, &mut hw, Some(&mut bus as &mut dyn BusPort), &mut link);
    }

    assert_eq!(svc.handled_count(), 5);
    assert!(link.published.iter().all(|(topic, _)| topic == "hwbridge/response"));
    assert_eq!(
        link.payloads(),
        [
            r#"{"type":"gpio","pin":2,"state":1}"#,
            r#"{"type":"button","pin":0}"#,
            r#"{"type":"i2c_read","status":0,"data":"5a5a"}"#,
            r#"{"type":"i2c_write","status":0}"#,
            r#"{"error":{"code":-1,"message":"unknown command"}}"#,
        ]
    );
}

#[test]
fn reply_is_returned_even_when_publish_fails() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut link = MockTransport::disconnected();
    let reply = svc.handle_message(br#"{"button":{"pin":3}}"#, 0, &mut hw, None, &mut link);
    assert_eq!(reply.kind(), Some("button"));
    assert!(link.published.is_empty());
}

#[test]
fn accepted_edges_publish_click_notifications() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut link = MockTransport::connected();
    svc.handle_message(br#"{"button":{"pin":0}}"#, 0, &mut hw, None, &mut link);
    link.published.clear();

    for at_ms in [1_000, 1_100, 1_250] {
        svc.on_hw_event(HwEvent::Edge { pin: 0, at_ms }, &mut hw, &mut link);
    }

    assert_eq!(
        link.payloads(),
        [r#"{"type":"click","pin":0}"#, r#"{"type":"click","pin":0}"#]
    );
}

#[test]
fn clicks_are_dropped_while_disconnected() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut link = MockTransport::connected();
    svc.handle_message(br#"{"button":{"pin":4}}"#, 0, &mut hw, None, &mut link);
    link.published.clear();
    link.connected = false;

    svc.on_hw_event(HwEvent::Edge { pin: 4, at_ms: 10 }, &mut hw, &mut link);
    link.connected = true;
    // The dropped click still counted as accepted: 100 ms later is suppressed.
    svc.on_hw_event(HwEvent::Edge { pin: 4, at_ms: 110 }, &mut hw, &mut link);

    assert!(link.published.is_empty());
}

#[test]
fn edges_on_unwatched_pins_are_ignored() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut link = MockTransport::connected();
    svc.on_hw_event(HwEvent::Edge { pin: 9, at_ms: 0 }, &mut hw, &mut link);
    assert!(link.published.is_empty());
}

#[test]
fn timer_event_reverts_pin() {
    let mut svc = service();
    let mut hw = MockHw::new();
    let mut link = MockTransport::connected();
    svc.handle_message(br#"{"gpio":{"pin":7,"state":true}}"#, 0, &mut hw, None, &mut link);
    let id = hw.last_scheduled().unwrap();

    svc.on_hw_event(HwEvent::TimerFired(id), &mut hw, &mut link);

    assert_eq!(hw.writes_to(7), [PinState::High, PinState::Low]);
    assert!(svc.dispatcher().reverter().pending(7).is_none());
    // Reversions are silent on the wire.
    assert_eq!(link.published.len(), 1);
}
