//! Integration tests for vitalis-terminal.
//!
//! The WebSocket tests run a real tungstenite server on a local port; the app
//! tests run the whole frame loop against a scripted terminal.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;
use vitalis_core::{
    CognitiveState, Engine, EngineConfig, EngineEvent, LoopbackDialer, LoopbackHandle,
};
use vitalis_terminal::{
    run, App, CellBuffer, ColorMode, DemoFeed, GenericTerminal, RunOptions, ScriptedTerminal,
    TestableBackend, WsDialer,
};

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

// =============================================================================
// WebSocket link
// =============================================================================

#[test]
fn test_ws_round_trip_with_local_server() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let (tx, rx) = mpsc::channel::<String>();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut socket = tungstenite::accept(stream).expect("handshake");
        socket
            .send(Message::text(
                r#"{"type":"connection_established","session_id":"s1","current_state":"DEEP_FOCUS"}"#,
            ))
            .expect("send handshake ack");
        socket
            .send(Message::text(
                r#"{"type":"biometric_update","heartRate":72,"hrv":48,"state":"DEEP_FOCUS"}"#,
            ))
            .expect("send biometric");
        loop {
            match socket.read() {
                Ok(Message::Text(text)) => {
                    let text = text.as_str().to_owned();
                    let done = text.contains("mock_state");
                    let _ = tx.send(text);
                    if done {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        let _ = socket.close(None);
        let _ = socket.flush();
    });

    let config = EngineConfig {
        url: format!("ws://127.0.0.1:{port}/ws"),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, WsDialer::default());
    let start = Instant::now();
    let events = engine.init(0);
    assert!(events.contains(&EngineEvent::Connected));

    let mut sample = None;
    while sample.is_none() && start.elapsed() < Duration::from_secs(5) {
        for event in engine.pump(elapsed_ms(start)) {
            if let EngineEvent::SampleUpdated(s) = event {
                sample = Some(s);
            }
        }
        thread::sleep(Duration::from_millis(5));
    }
    let sample = sample.expect("biometric update arrives");
    assert_eq!(sample.heart_rate, 72.0);
    assert_eq!(engine.model().state(), CognitiveState::DeepFocus);

    assert!(engine.mock_state(CognitiveState::Wired));
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut received = None;
    while received.is_none() && Instant::now() < deadline {
        // Reads flush anything the non-blocking write left queued.
        engine.pump(elapsed_ms(start));
        if let Ok(text) = rx.recv_timeout(Duration::from_millis(20)) {
            if text.contains("mock_state") {
                received = Some(text);
            }
        }
    }
    let received: serde_json::Value =
        serde_json::from_str(&received.expect("server got mock_state")).expect("json");
    assert_eq!(received["state"], 5);

    engine.shutdown();
    server.join().expect("server thread");
}

#[test]
fn test_ws_dial_failure_schedules_reconnect() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = EngineConfig {
        url: format!("ws://127.0.0.1:{port}/ws"),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, WsDialer::default());
    engine.init(0);
    assert!(!engine.model().is_connected());
    assert!(!engine.mock_state(CognitiveState::Relaxed));
}

// =============================================================================
// Frame loop on a scripted terminal
// =============================================================================

fn offline_app(width: u16, height: u16) -> (App<LoopbackDialer>, LoopbackHandle) {
    let (dialer, handle) = LoopbackDialer::new();
    let engine = Engine::new(EngineConfig::default(), dialer);
    let app = App::new(engine, width, height, Some(42))
        .with_demo_feed(DemoFeed::new(handle.clone()));
    (app, handle)
}

fn scripted(events: Vec<Event>) -> ScriptedTerminal<Vec<u8>> {
    GenericTerminal::new(TestableBackend::new(Vec::new(), 80, 24).with_events(events))
}

fn options(max_frames: u64) -> RunOptions {
    RunOptions {
        frame: Duration::ZERO,
        max_frames: Some(max_frames),
        color_mode: ColorMode::TrueColor,
    }
}

#[test]
fn test_run_applies_keys_and_restores_terminal() {
    let (mut app, handle) = offline_app(80, 24);
    let mut terminal = scripted(vec![key(KeyCode::Tab), key(KeyCode::Char('2'))]);

    let frames = run(&mut app, &mut terminal, options(5)).expect("run");

    assert_eq!(frames, 5);
    assert_eq!(app.engine().model().state(), CognitiveState::Stressed);
    assert!(handle
        .sent_json()
        .iter()
        .any(|m| m["type"] == "mock_state" && m["state"] == 2));

    let backend = terminal.backend();
    assert!(!backend.is_raw_mode());
    assert!(!backend.is_alternate_screen());
    assert!(!backend.writer().is_empty());
    // Shutdown closes every presenter and the link.
    assert_eq!(app.frames().active_count(), 0);
    assert!(!handle.is_open());
}

#[test]
fn test_quit_key_stops_before_first_frame() {
    let (mut app, _) = offline_app(80, 24);
    let mut terminal = scripted(vec![key(KeyCode::Char('q'))]);
    let frames = run(&mut app, &mut terminal, options(100)).expect("run");
    assert_eq!(frames, 0);
    assert!(app.should_quit());
}

#[test]
fn test_render_reflects_demo_state() {
    let (mut app, _) = offline_app(100, 30);
    app.start(0);
    for frame in 1..=10 {
        app.tick(frame * 16);
    }
    let mut buffer = CellBuffer::new(100, 30);
    app.render(&mut buffer, 160);
    assert!(buffer.contains_text("RELAXED"));
    assert!(buffer.contains_text("LIVE"));

    app.handle_command(vitalis_terminal::Command::MockState(CognitiveState::Wired), 170);
    app.tick(176);
    app.render(&mut buffer, 176);
    assert!(buffer.contains_text("WIRED"));
}

#[test]
fn test_terminal_resize_follows_backend() {
    let (mut app, _) = offline_app(80, 24);
    let mut terminal = scripted(Vec::new());
    terminal.backend_mut().set_size(120, 40);
    run(&mut app, &mut terminal, options(2)).expect("run");
    assert_eq!(app.size(), (120, 40));
}
