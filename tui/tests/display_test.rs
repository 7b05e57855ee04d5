//! Terminal display tests
//!
//! Drive the app without a terminal: key events go in through
//! `handle_terminal_event`, the kiosk is turned on paused time, and frames
//! are checked through `compose`.

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use tokio::time::Instant;

use kiosk_core::{KioskConfig, Wake};
use polar_kiosk::views::{HEADER, WELCOME_TITLE};
use polar_kiosk::{App, Layout, Snowfall};

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fish_data.json")
}

fn config() -> KioskConfig {
    let mut config = KioskConfig::default();
    config.display.display_duration_secs = 2.0;
    config.display.debug_key = Some('f');
    config.scanner.catalog_path = Some(catalog_path());
    config.window.fullscreen_on_start = false;
    config
}

fn text(buf: &Buffer) -> String {
    let area = buf.area;
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn press(app: &mut App, c: char) {
    app.handle_terminal_event(Event::Key(KeyEvent::new(
        KeyCode::Char(c),
        KeyModifiers::NONE,
    )));
}

/// Turn the kiosk until a payload lands or `limit` passes
async fn turn_until_payload(app: &mut App, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        match tokio::time::timeout_at(deadline, app.turn()).await {
            Ok(Wake::Payload) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    false
}

#[tokio::test(start_paused = true)]
async fn test_idle_frame_shows_welcome() {
    let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, 100, 30)).await;
    app.start(None);

    let frame = text(app.compose(Instant::now()));
    assert!(frame.contains(HEADER));
    assert!(frame.contains(WELCOME_TITLE));
    assert!(frame.contains("Esc to quit"));
}

#[tokio::test(start_paused = true)]
async fn test_debug_key_shows_specimen_then_expires() {
    let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, 100, 30)).await;
    app.start(None);

    press(&mut app, 'f');
    assert!(turn_until_payload(&mut app, Duration::from_secs(1)).await);
    app.process_messages();

    let shown = app
        .kiosk()
        .current_specimen()
        .map(|s| s.name.clone())
        .unwrap();
    assert_eq!(app.display().scans_seen, 1);

    // Let the pop-in finish before reading the card
    tokio::time::advance(Duration::from_millis(500)).await;
    let frame = text(app.compose(Instant::now()));
    assert!(frame.contains(&shown));
    assert!(!frame.contains(WELCOME_TITLE));

    let deadline = Instant::now() + Duration::from_secs(5);
    while app.kiosk().current_specimen().is_some() && Instant::now() < deadline {
        let _ = tokio::time::timeout_at(deadline, app.turn()).await;
    }
    app.process_messages();

    assert!(app.kiosk().current_specimen().is_none());
    assert!(app.display().current.is_none());
    assert!(text(app.compose(Instant::now())).contains(WELCOME_TITLE));
}

#[tokio::test(start_paused = true)]
async fn test_bus_payload_reaches_compact_view() {
    let mut app = App::new(config(), Layout::Compact, Rect::new(0, 0, 50, 20)).await;
    app.start(None);

    app.bus().emit(
        "fishData",
        serde_json::json!({
            "id": 77,
            "name": "Polar Eelpout",
            "endangered_status": "Data Deficient"
        }),
    );
    assert!(turn_until_payload(&mut app, Duration::from_secs(1)).await);
    app.process_messages();

    let frame = text(app.compose(Instant::now()));
    assert!(frame.contains("Polar Eelpout"));
    assert!(frame.contains("Data Deficient"));
}

#[tokio::test(start_paused = true)]
async fn test_escape_stops_the_kiosk() {
    let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, 80, 24)).await;
    app.start(None);
    assert!(app.is_running());

    app.handle_terminal_event(Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));

    assert!(!app.is_running());
    assert!(!app.kiosk().is_running());
}

#[tokio::test(start_paused = true)]
async fn test_resize_relayouts_layers() {
    let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, 80, 24)).await;
    app.start(None);

    app.handle_terminal_event(Event::Resize(120, 40));
    let frame = app.compose(Instant::now());
    assert_eq!(frame.area, Rect::new(0, 0, 120, 40));
    assert!(text(frame).contains(HEADER));
}

#[tokio::test(start_paused = true)]
async fn test_snow_falls_behind_the_card() {
    let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, 120, 40)).await;
    app.start(None);

    let until = Instant::now() + Duration::from_secs(30);
    while Instant::now() < until {
        let _ = tokio::time::timeout_at(until, app.turn()).await;
    }
    assert!(!app.kiosk().particles().is_empty());

    let area = Rect::new(0, 0, 120, 40);
    let mut buf = Buffer::empty(area);
    Snowfall::new(
        app.kiosk().particles(),
        Instant::now(),
        app.kiosk().config().particles.size,
    )
    .render(area, &mut buf);
    let snow = text(&buf);
    assert!(snow.contains('·') || snow.contains('*') || snow.contains('❄'));

    // The composed frame still has the card on top
    assert!(text(app.compose(Instant::now())).contains(HEADER));
}

#[tokio::test(start_paused = true)]
async fn test_missing_catalog_is_reported_not_fatal() {
    let mut config = config();
    config.scanner.catalog_path = Some(PathBuf::from("/nonexistent/fish.json"));
    let mut app = App::new(config, Layout::Card, Rect::new(0, 0, 80, 24)).await;
    app.start(None);

    assert!(app.display().notification.is_some());
    assert!(app.kiosk().is_running());
}

#[tokio::test(start_paused = true)]
async fn test_scan_on_small_terminals_renders_through_pop_in() {
    for (width, height) in [(40, 8), (12, 8), (30, 5), (20, 12)] {
        let mut app = App::new(config(), Layout::Card, Rect::new(0, 0, width, height)).await;
        app.start(None);

        app.bus().emit(
            "fishData",
            serde_json::json!({
                "id": 2,
                "name": "Greenland Shark",
                "habitat": "Deep, cold waters of the North Atlantic and Arctic",
                "endangered_status": "Vulnerable",
                "fun_fact": "It is the longest-lived vertebrate known to science."
            }),
        );
        assert!(turn_until_payload(&mut app, Duration::from_secs(1)).await);
        app.process_messages();

        for _ in 0..6 {
            let frame = app.compose(Instant::now());
            assert_eq!(frame.area, Rect::new(0, 0, width, height));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
    }
}
