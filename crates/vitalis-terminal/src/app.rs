//! The frame loop: input, engine pump, presenter animation, paint, flush.

use crate::color::ColorMode;
use crate::demo::DemoFeed;
use crate::direct::{CellBuffer, DiffRenderer, TerminalCanvas};
use crate::error::TerminalError;
use crate::input::{Command, InputHandler};
use crate::terminal::Terminal;
use crossterm::event::Event;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vitalis_core::{
    Canvas, Color, Dialer, Engine, EngineEvent, FrameScheduler, FrameTick, Rect, FRAME_MS,
};
use vitalis_widgets::{
    bubble, AtmospherePresenter, DashboardPresenter, HudPresenter, Presenter, Scene,
};

/// HUD size in cells (columns, rows).
pub const HUD_SIZE: (u16, u16) = (34, 12);

/// Target frame interval (~60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Loop settings.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Time budget per frame; the loop sleeps off what is left
    pub frame: Duration,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    /// Output color depth
    pub color_mode: ColorMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frame: FRAME_INTERVAL,
            max_frames: None,
            color_mode: ColorMode::detect(),
        }
    }
}

fn full_bounds(width: u16, height: u16) -> Rect {
    Rect::new(0.0, 0.0, f32::from(width), f32::from(height))
}

fn hud_bounds(width: u16, height: u16) -> Rect {
    let w = HUD_SIZE.0.min(width);
    let h = HUD_SIZE.1.min(height);
    Rect::new(f32::from(width - w), 0.0, f32::from(w), f32::from(h))
}

/// Engine plus the three presenters.
pub struct App<D: Dialer> {
    engine: Engine<D>,
    frames: FrameScheduler,
    input: InputHandler,
    hud: HudPresenter,
    dashboard: DashboardPresenter,
    atmosphere: AtmospherePresenter,
    feed: Option<DemoFeed>,
    size: (u16, u16),
    dashboard_visible: bool,
    should_quit: bool,
    last_frame_ms: Option<u64>,
}

impl<D: Dialer> App<D> {
    /// App for a `width` x `height` terminal. A seed makes particles and
    /// jitter reproducible.
    pub fn new(engine: Engine<D>, width: u16, height: u16, seed: Option<u64>) -> Self {
        let full = full_bounds(width, height);
        let clock_period = engine.config().timing.clock_period_ms;
        let (dashboard, atmosphere) = match seed {
            Some(seed) => (
                DashboardPresenter::with_seed(full, clock_period, seed),
                AtmospherePresenter::with_seed(full, seed.wrapping_add(1)),
            ),
            None => (
                DashboardPresenter::new(full, clock_period),
                AtmospherePresenter::new(full),
            ),
        };
        Self {
            engine,
            frames: FrameScheduler::new(),
            input: InputHandler::new(),
            hud: HudPresenter::new(hud_bounds(width, height)),
            dashboard,
            atmosphere,
            feed: None,
            size: (width, height),
            dashboard_visible: false,
            should_quit: false,
            last_frame_ms: None,
        }
    }

    /// Drive an offline demo feed from the frame loop.
    #[must_use]
    pub fn with_demo_feed(mut self, feed: DemoFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Replace the dashboard (e.g. to inject a clock source).
    #[must_use]
    pub fn with_dashboard(mut self, dashboard: DashboardPresenter) -> Self {
        self.dashboard = dashboard;
        self
    }

    pub const fn engine(&self) -> &Engine<D> {
        &self.engine
    }

    pub const fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    pub const fn dashboard(&self) -> &DashboardPresenter {
        &self.dashboard
    }

    pub const fn is_dashboard_visible(&self) -> bool {
        self.dashboard_visible
    }

    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub const fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Connect and open the always-on presenters.
    pub fn start(&mut self, now_ms: u64) {
        self.hud.open(&mut self.frames, now_ms);
        self.atmosphere.open(&mut self.frames, now_ms);
        let events = self.engine.init(now_ms);
        self.dispatch(&events, now_ms);
        self.last_frame_ms = Some(now_ms);
    }

    /// Route one terminal event.
    pub fn handle_event(&mut self, event: &Event, now_ms: u64) {
        match event {
            Event::Key(key) => {
                if let Some(command) = self.input.command_for(key) {
                    self.handle_command(command, now_ms);
                }
            }
            Event::Resize(width, height) => self.resize(*width, *height),
            _ => {}
        }
    }

    /// Execute a command.
    pub fn handle_command(&mut self, command: Command, now_ms: u64) {
        debug!(?command, "command");
        match command {
            Command::MockState(state) => {
                if !self.engine.mock_state(state) {
                    warn!(state = state.as_str(), "mock state not sent");
                }
            }
            Command::ToggleDashboard => self.set_dashboard_visible(!self.dashboard_visible, now_ms),
            Command::Escape => {
                if let Some(event) = self.engine.dismiss_bubble() {
                    self.dispatch(&[event], now_ms);
                } else if self.dashboard_visible {
                    self.set_dashboard_visible(false, now_ms);
                }
            }
            Command::PressButton(index) => {
                if let Some(event) = self.engine.press_button(index) {
                    self.dispatch(&[event], now_ms);
                }
            }
            Command::Quit => self.should_quit = true,
        }
    }

    fn set_dashboard_visible(&mut self, visible: bool, now_ms: u64) {
        if visible == self.dashboard_visible {
            return;
        }
        self.dashboard_visible = visible;
        if visible {
            self.dashboard.open(&mut self.frames, now_ms);
        } else {
            self.dashboard.close(&mut self.frames);
        }
    }

    fn dispatch(&mut self, events: &[EngineEvent], now_ms: u64) {
        let scene = Scene::from_engine(&self.engine, now_ms);
        for event in events {
            self.hud.on_event(event, &scene);
            self.atmosphere.on_event(event, &scene);
            if self.dashboard_visible {
                self.dashboard.on_event(event, &scene);
            }
        }
    }

    /// One frame of model and animation work.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(feed) = self.feed.as_mut() {
            feed.step(now_ms);
        }
        let events = self.engine.pump(now_ms);
        self.dispatch(&events, now_ms);

        let dt = self
            .last_frame_ms
            .map_or(FRAME_MS, |last| now_ms.saturating_sub(last) as f64);
        self.last_frame_ms = Some(now_ms);
        let tick = FrameTick::new(now_ms, dt);
        self.engine.advance_frame(tick);

        let scene = Scene::from_engine(&self.engine, now_ms);
        if self.hud.is_open(&self.frames) {
            self.hud.advance(tick, &scene);
        }
        if self.atmosphere.is_open(&self.frames) {
            self.atmosphere.advance(tick, &scene);
        }
        if self.dashboard.is_open(&self.frames) {
            self.dashboard.advance(tick, &scene);
        }
    }

    /// Paint the whole frame.
    pub fn paint(&self, canvas: &mut dyn Canvas, now_ms: u64) {
        let scene = Scene::from_engine(&self.engine, now_ms);
        self.atmosphere.paint(canvas, &scene);
        if self.dashboard_visible {
            self.dashboard.paint(canvas, &scene);
            if let Some(intervention) = scene.bubble {
                let (width, height) = self.size;
                bubble::paint(
                    canvas,
                    intervention,
                    full_bounds(width, height),
                    self.atmosphere.companion_anchor(),
                );
            }
        } else {
            self.hud.paint(canvas, &scene);
        }
    }

    /// Clear `buffer` and paint into it.
    pub fn render(&self, buffer: &mut CellBuffer, now_ms: u64) {
        buffer.clear(Color::BLACK);
        let mut canvas = TerminalCanvas::new(buffer);
        self.paint(&mut canvas, now_ms);
    }

    /// New terminal size. Waveform history survives.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == self.size {
            return;
        }
        debug!(width, height, "resize");
        self.size = (width, height);
        let full = full_bounds(width, height);
        self.atmosphere.resize(full);
        self.dashboard.resize(full);
        self.hud.resize(hud_bounds(width, height));
    }

    /// Close presenters and the connection.
    pub fn shutdown(&mut self) {
        self.hud.close(&mut self.frames);
        self.atmosphere.close(&mut self.frames);
        self.dashboard.close(&mut self.frames);
        self.dashboard_visible = false;
        self.engine.shutdown();
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Run `app` on `terminal` until quit (or `max_frames`), restoring the
/// terminal afterwards even when the loop fails.
pub fn run<D: Dialer, T: Terminal>(
    app: &mut App<D>,
    terminal: &mut T,
    options: RunOptions,
) -> Result<u64, TerminalError> {
    terminal.enter()?;
    let result = run_loop(app, terminal, options);
    app.shutdown();
    terminal.leave()?;
    if let Ok(frames) = &result {
        info!(frames, "frame loop finished");
    }
    result
}

fn run_loop<D: Dialer, T: Terminal>(
    app: &mut App<D>,
    terminal: &mut T,
    options: RunOptions,
) -> Result<u64, TerminalError> {
    let start = Instant::now();
    let (width, height) = terminal.size()?;
    let mut buffer = CellBuffer::new(width, height);
    let mut renderer = DiffRenderer::new(options.color_mode);
    app.resize(width, height);
    app.start(0);

    let mut frames = 0u64;
    loop {
        let frame_start = Instant::now();
        let now = elapsed_ms(start);

        while let Some(event) = terminal.poll_event(Duration::ZERO)? {
            app.handle_event(&event, now);
        }
        if app.should_quit() || options.max_frames.is_some_and(|max| frames >= max) {
            break;
        }

        let (width, height) = terminal.size()?;
        if (width, height) != (buffer.width(), buffer.height()) {
            buffer.resize(width, height);
            renderer.reset();
            app.resize(width, height);
        }

        app.tick(now);
        app.render(&mut buffer, now);
        terminal.flush(&mut buffer, &mut renderer)?;
        frames += 1;

        if let Some(rest) = options.frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    Ok(frames)
}
