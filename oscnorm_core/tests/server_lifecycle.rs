//! Listener thread and start/stop lifecycle.
//!
//! Verifies that:
//! - Messages from the source are routed on the pumping thread
//! - Start/stop publish ServerStarted/ServerStopped and are idempotent
//! - The source survives a stop and listening can resume
//! - Idle time follows the injected clock

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use oscnorm_core::mocks::{FailingSource, RecordingSink, ScriptedSource};
use oscnorm_core::{ChannelConfig, ListenerCfg, MessageRouter, OscServer, ServerBuilder};
use oscnorm_traits::clock::test_clock::TestClock;
use oscnorm_traits::{MessageSource, OscMessage};

fn router(sink: &RecordingSink) -> MessageRouter {
    MessageRouter::builder()
        .with_channel(ChannelConfig::new(
            "Volume", "/vol/data", "/vol/min", "/vol/max", 0.0, 100.0,
        ))
        .with_sink(sink.clone())
        .build()
        .unwrap()
}

fn listener(autoplay: bool) -> ListenerCfg {
    ListenerCfg {
        recv_timeout_ms: 10,
        queue_depth: 4,
        autoplay,
    }
}

fn pump_until<T: MessageSource + Send + 'static>(server: &mut OscServer<T>, n: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut total = 0;
    while total < n && Instant::now() < deadline {
        total += server.pump(Duration::from_millis(20));
    }
    total
}

#[test]
fn autoplay_routes_scripted_messages() {
    let sink = RecordingSink::new();
    let msgs: Vec<_> = (0..10).map(|_| OscMessage::with_int("/vol/data", 2048)).collect();
    let mut server = ServerBuilder::new()
        .with_source(ScriptedSource::new(msgs))
        .with_router(router(&sink))
        .with_listener(listener(true))
        .with_name("test")
        .build()
        .unwrap();

    assert!(server.is_listening());
    assert_eq!(server.name(), "test");
    assert_eq!(pump_until(&mut server, 10), 10);
    assert_eq!(server.received(), 10);
    assert_eq!(server.router().get_normalized_computed_data("Volume"), 50.0);

    server.stop_listening();
    assert!(!server.is_listening());
    let kinds = sink.kinds();
    assert_eq!(kinds.first(), Some(&"ServerStarted"));
    assert_eq!(kinds.last(), Some(&"ServerStopped"));
    assert_eq!(kinds.iter().filter(|k| **k == "DataUpdate").count(), 10);
}

#[test]
fn start_and_stop_are_idempotent_and_restartable() {
    let sink = RecordingSink::new();
    let mut server = ServerBuilder::new()
        .with_source(ScriptedSource::new([OscMessage::with_int("/vol/data", 1)]))
        .with_router(router(&sink))
        .with_listener(listener(false))
        .build()
        .unwrap();
    assert!(!server.is_listening());
    assert_eq!(server.pump(Duration::from_millis(1)), 0);

    server.stop_listening();
    server.start_listening().unwrap();
    server.start_listening().unwrap();
    server.stop_listening();
    server.stop_listening();
    server.start_listening().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while server.router().get_computed_data("Volume") == 0.0 && Instant::now() < deadline {
        server.pump(Duration::from_millis(20));
    }
    server.stop_listening();

    assert_eq!(
        sink.kinds()
            .into_iter()
            .filter(|k| *k != "DataUpdate")
            .collect::<Vec<_>>(),
        vec!["ServerStarted", "ServerStopped", "ServerStarted", "ServerStopped"]
    );
    // The single scripted message was routed exactly once across both sessions.
    assert_eq!(server.router().get_computed_data("Volume"), 1.0);
}

#[test]
fn run_until_stops_when_flag_is_set() {
    let sink = RecordingSink::new();
    let mut server = ServerBuilder::new()
        .with_source(ScriptedSource::new([
            OscMessage::with_int("/vol/data", 4096),
            OscMessage::with_int("/vol/max", 0),
        ]))
        .with_router(router(&sink))
        .with_listener(listener(true))
        .build()
        .unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    let setter = flag.clone();
    let t = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        setter.store(true, std::sync::atomic::Ordering::Relaxed);
    });
    server.run_until(&flag);
    t.join().unwrap();

    assert!(!server.is_listening());
    assert_eq!(server.router().get_max_value("Volume"), 4096.0);
    assert_eq!(sink.kinds().last(), Some(&"ServerStopped"));
}

#[test]
fn idle_time_follows_injected_clock() {
    let sink = RecordingSink::new();
    let clock = TestClock::new();
    let mut server = ServerBuilder::new()
        .with_source(ScriptedSource::new([OscMessage::with_int("/vol/data", 5)]))
        .with_router(router(&sink))
        .with_listener(listener(true))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    assert_eq!(pump_until(&mut server, 1), 1);
    assert_eq!(server.idle_for(), Some(0));
    clock.advance(Duration::from_millis(250));
    assert_eq!(server.idle_for(), Some(250));

    server.stop_listening();
    assert_eq!(server.idle_for(), None);
}

#[test]
fn failing_source_does_not_stop_the_listener() {
    let sink = RecordingSink::new();
    let mut server = ServerBuilder::new()
        .with_source(FailingSource)
        .with_router(router(&sink))
        .with_listener(listener(true))
        .build()
        .unwrap();
    assert_eq!(server.pump(Duration::from_millis(30)), 0);
    assert!(server.is_listening());
    assert_eq!(server.idle_for(), None);
    server.stop_listening();
    assert_eq!(sink.kinds(), vec!["ServerStarted", "ServerStopped"]);
}

#[test]
fn dropping_a_listening_server_joins_the_thread() {
    for _ in 0..5 {
        let server = ServerBuilder::new()
            .with_source(ScriptedSource::new([]))
            .with_listener(listener(true))
            .build()
            .unwrap();
        drop(server);
    }
}
