//! Main Application
//!
//! The App is a thin display client over the headless kiosk:
//! 1. Converts terminal events to `SurfaceEvent`s
//! 2. Turns the kiosk alongside input and the frame tick
//! 3. Folds `KioskMessage`s into the display state
//! 4. Renders snowfall, the specimen card and the status bar as layers
//!
//! Scans reach the kiosk over the event bus from the catalog service, which
//! runs as its own task reading the scanner feed and debug requests.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use ratatui::Terminal;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use kiosk_core::{
    BackendCommand, Catalog, CatalogService, EventBus, Kiosk, KioskConfig, KioskMessage,
    NotifyLevel, ScanFeed, SurfaceEvent, Wake, WindowHandle,
};

use crate::compositor::{Compositor, LayerId};
use crate::display::DisplayState;
use crate::snowfall::Snowfall;
use crate::theme::{notify_color, DRIFT_GRAY, POLAR_NIGHT};
use crate::views::{view_for, Layout, SpecimenView};

/// Frame interval for snowfall and pop-in
const FRAME: Duration = Duration::from_millis(100);

/// Largest card, in cells
const CARD_MAX: (u16, u16) = (84, 24);

/// Card size at the start of the pop-in, as a fraction of full size
const POP_IN_FROM: f32 = 0.6;

/// Layer IDs for UI regions
struct AppLayers {
    snowfall: LayerId,
    card: LayerId,
    status: LayerId,
}

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,

    // === Kiosk Integration ===
    /// The headless kiosk
    kiosk: Kiosk,
    /// Bus shared with the catalog service
    bus: EventBus,
    /// Catalog service task
    backend: Option<JoinHandle<()>>,
    /// Messages from the kiosk
    messages: mpsc::Receiver<KioskMessage>,
    /// Display state derived from kiosk messages
    display: DisplayState,

    // === UI Components ===
    /// The layered compositor
    compositor: Compositor,
    /// Layer assignments
    layers: AppLayers,
    /// Specimen renderer
    view: Box<dyn SpecimenView>,
}

impl App {
    /// Build the kiosk, its catalog service and the layers for `area`.
    ///
    /// Must be called inside a tokio runtime; the catalog service is spawned
    /// immediately.
    pub async fn new(config: KioskConfig, layout: Layout, area: Rect) -> Self {
        let bus = EventBus::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<BackendCommand>();
        let (msg_tx, messages) = mpsc::channel::<KioskMessage>(64);
        let mut display = DisplayState::new();

        let catalog = match &config.scanner.catalog_path {
            Some(path) => Catalog::load_from_path(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "catalog unavailable");
                display.apply_message(
                    KioskMessage::notify(NotifyLevel::Warning, format!("{e}")),
                    Instant::now().into_std(),
                );
                Catalog::default()
            }),
            None => {
                tracing::info!("no catalog configured");
                Catalog::default()
            }
        };
        tracing::info!(entries = catalog.len(), "catalog ready");

        let feed = match &config.scanner.feed_path {
            Some(path) => match tokio::fs::File::open(path).await {
                Ok(file) => {
                    tracing::info!(path = %path.display(), "reading scans from feed");
                    Some(ScanFeed::new(BufReader::new(file)))
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "feed unavailable");
                    display.apply_message(
                        KioskMessage::notify(
                            NotifyLevel::Warning,
                            format!("scanner feed unavailable: {e}"),
                        ),
                        Instant::now().into_std(),
                    );
                    None
                }
            },
            None => None,
        };

        let service = CatalogService::new(catalog, bus.clone(), &config.scanner.event);
        let backend = tokio::spawn(service.run(cmd_rx, feed));

        let kiosk = Kiosk::new(config, bus.clone(), Some(cmd_tx), msg_tx);
        let view = view_for(layout);
        tracing::debug!(view = view.name(), "view selected");

        let mut compositor = Compositor::new(area);
        let snowfall = compositor.create_layer(area, 0);
        let card = compositor.create_opaque_layer(card_rect(area, 1.0), 10);
        let status = compositor.create_opaque_layer(status_rect(area), 20);

        Self {
            running: true,
            kiosk,
            bus,
            backend: Some(backend),
            messages,
            display,
            compositor,
            layers: AppLayers {
                snowfall,
                card,
                status,
            },
            view,
        }
    }

    /// Start the kiosk, handing it the window to go fullscreen in
    pub fn start(&mut self, window: Option<Box<dyn WindowHandle>>) {
        self.kiosk.start(window, Instant::now());
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut frames = tokio::time::interval(FRAME);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event),
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "terminal input failed");
                        self.quit();
                    }
                    None => self.quit(),
                },

                _ = self.turn() => {}

                _ = frames.tick() => {}
            }

            self.process_messages();
            self.render(terminal)?;
        }

        self.shutdown();
        Ok(())
    }

    /// Wait for the kiosk's next payload or deadline. Cancel safe.
    pub async fn turn(&mut self) -> Wake {
        let wake = self.kiosk.turn().await;
        if let Wake::Timers(outcome) = &wake {
            if let Some(cleared) = &outcome.cleared {
                tracing::debug!(id = cleared.id, "display expired");
            }
        }
        wake
    }

    /// Route one terminal event
    pub fn handle_terminal_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(w, h) => self.handle_resize(w, h),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            KeyCode::Char(c) => {
                self.kiosk
                    .handle_event(SurfaceEvent::KeyPressed { key: c }, Instant::now());
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        self.compositor.resize(area);
        self.compositor.set_bounds(self.layers.snowfall, area);
        self.compositor.set_bounds(self.layers.status, status_rect(area));
        self.compositor.set_bounds(self.layers.card, card_rect(area, 1.0));

        self.kiosk.handle_event(
            SurfaceEvent::Resized {
                width: u32::from(width),
                height: u32::from(height),
            },
            Instant::now(),
        );
    }

    fn quit(&mut self) {
        self.kiosk
            .handle_event(SurfaceEvent::QuitRequested, Instant::now());
        self.running = false;
    }

    /// Fold pending kiosk messages into the display state
    pub fn process_messages(&mut self) {
        let now = Instant::now().into_std();
        while let Ok(msg) = self.messages.try_recv() {
            self.display.apply_message(msg, now);
        }
        self.display.update(now);
    }

    /// Draw every layer for `now` and return the composited frame
    pub fn compose(&mut self, now: Instant) -> &Buffer {
        let area = self.compositor.area();
        let pop_in = self.display.pop_in(now.into_std());
        self.compositor
            .set_bounds(self.layers.card, card_rect(area, pop_in));

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.snowfall) {
            buf.reset();
            let buf_area = buf.area;
            Snowfall::new(
                self.kiosk.particles(),
                now,
                self.kiosk.config().particles.size,
            )
            .render(buf_area, buf);
        }

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.card) {
            buf.reset();
            let buf_area = buf.area;
            self.view
                .render(self.kiosk.current_specimen(), buf_area, buf);
        }

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.status) {
            buf.reset();
            let buf_area = buf.area;
            render_status(&self.display, self.kiosk.particles().len(), buf_area, buf);
        }

        self.compositor.composite()
    }

    fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let now = Instant::now();
        terminal.draw(|frame| {
            let output = self.compose(now);
            let area = frame.area();
            let buf = frame.buffer_mut();
            buf.set_style(area, Style::default().bg(POLAR_NIGHT));

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    let cell = &output[(x, y)];
                    if cell.symbol() != " " || cell.bg != ratatui::style::Color::Reset {
                        buf[(x, y)] = cell.clone();
                    }
                }
            }
        })?;

        Ok(())
    }

    /// Stop the kiosk and the catalog service. Idempotent.
    pub fn shutdown(&mut self) {
        self.kiosk.shutdown();
        self.bus.close();
        if let Some(backend) = self.backend.take() {
            backend.abort();
        }
    }

    /// Whether the loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The kiosk behind the display
    pub fn kiosk(&self) -> &Kiosk {
        &self.kiosk
    }

    /// Bus the catalog service publishes on
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Surface-side display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Card rectangle centered in `area`, scaled by `scale` for the pop-in
pub fn card_rect(area: Rect, scale: f32) -> Rect {
    let usable = area.height.saturating_sub(1);
    let full_w = area.width.saturating_sub(4).min(CARD_MAX.0);
    let full_h = usable.saturating_sub(2).min(CARD_MAX.1);

    let factor = POP_IN_FROM + (1.0 - POP_IN_FROM) * scale.clamp(0.0, 1.0);
    let w = (f32::from(full_w) * factor).round() as u16;
    let h = (f32::from(full_h) * factor).round() as u16;

    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (usable - h) / 2,
        w,
        h,
    )
}

/// Bottom row of `area`
pub fn status_rect(area: Rect) -> Rect {
    Rect::new(
        area.x,
        area.y + area.height.saturating_sub(1),
        area.width,
        1_u16.min(area.height),
    )
}

fn render_status(display: &DisplayState, flakes: usize, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    buf.set_style(area, Style::default().bg(POLAR_NIGHT));

    let hint = " Esc to quit ";
    let hint_width = hint.len() as u16;
    let left_width = area.width.saturating_sub(hint_width) as usize;

    let (text, color) = match &display.notification {
        Some(notice) => (format!(" {}", notice.message), notify_color(notice.level)),
        None => {
            let last = display
                .last_scan_label()
                .map_or_else(String::new, |at| format!(" | last scan {at}"));
            (
                format!(" ❄ {flakes} | scans {}{last}", display.scans_seen),
                DRIFT_GRAY,
            )
        }
    };
    buf.set_stringn(area.x, area.y, text, left_width, Style::default().fg(color));

    if area.width > hint_width {
        buf.set_string(
            area.x + area.width - hint_width,
            area.y,
            hint,
            Style::default().fg(DRIFT_GRAY),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_card_rect_centered_and_capped() {
        let area = Rect::new(0, 0, 200, 60);
        let card = card_rect(area, 1.0);
        assert_eq!((card.width, card.height), CARD_MAX);
        assert_eq!(card.x, (200 - CARD_MAX.0) / 2);
    }

    #[test]
    fn test_card_rect_grows_during_pop_in() {
        let area = Rect::new(0, 0, 100, 30);
        let small = card_rect(area, 0.0);
        let full = card_rect(area, 1.0);
        assert!(small.width < full.width);
        assert!(small.height < full.height);
        assert!(full.x + full.width <= area.width);
        assert!(full.y + full.height < area.height);
    }

    #[test]
    fn test_card_rect_in_tiny_area() {
        let card = card_rect(Rect::new(0, 0, 2, 1), 1.0);
        assert_eq!((card.width, card.height), (0, 0));
    }

    #[test]
    fn test_status_rect_is_bottom_row() {
        assert_eq!(
            status_rect(Rect::new(0, 0, 80, 24)),
            Rect::new(0, 23, 80, 1)
        );
    }

    #[test]
    fn test_status_shows_notice_over_counters() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        let mut display = DisplayState::new();
        display.apply_message(
            KioskMessage::notify(NotifyLevel::Warning, "scanner disconnected"),
            std::time::Instant::now(),
        );

        render_status(&display, 3, area, &mut buf);
        let row: String = buf.content.iter().map(|c| c.symbol()).collect();
        assert!(row.contains("scanner disconnected"));
        assert!(row.contains("Esc to quit"));
    }
}
