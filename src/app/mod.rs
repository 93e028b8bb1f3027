//! Event loop, component clocks and app state.

mod handlers;
mod render;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::layout::Rect;
use reqwest::Client;
use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    cursor::CursorOverlay,
    dial::Dial,
    events::{SequenceAction, UiState, View},
    guestboard::{
        board::Board,
        flag::SignedFlag,
        geocode::{ConfiguredLocator, Locator, NominatimGeocoder},
        store::FirestoreStore,
    },
    links::LinkShuffler,
    reveal::{RevealSequencer, RevealSignal},
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, handle_mouse, is_ctrl_c};
use render::{draw, entrance_cursor_areas};

/// One frame of the component clocks.
const FRAME: Duration = Duration::from_millis(16);

/// State shared by input handling and rendering.
pub struct App {
    pub cfg: Config,
    pub ui: UiState,
    pub shortcuts: Shortcuts,
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// Time since start; every component deadline is measured on it.
    pub clock: Duration,
    /// Whole terminal area of the last drawn frame.
    pub screen: Rect,
    pub reveal: RevealSequencer,
    pub dial: Dial,
    /// Last pointer row while dragging the dial.
    pub drag_row: Option<u16>,
    /// Row the current dial press started on.
    pub press_row: Option<u16>,
    pub links: LinkShuffler,
    /// Link highlighted for keyboard activation.
    pub link_focus: usize,
    pub board: Board,
    pub locator: Box<dyn Locator>,
    pub cursor: CursorOverlay,
    pub quit: bool,
}

impl App {
    /// Apply a routing action and run the entry hooks of the new view.
    pub async fn dispatch(&mut self, action: SequenceAction) -> Result<()> {
        if !self.ui.sequence.apply(action) {
            return Ok(());
        }
        let view = self.ui.view();
        self.ui.status = view.name().into();
        // Entry hooks of the new view.
        match view {
            View::Intro => {
                self.reveal = RevealSequencer::new(&self.cfg.intro.lines, self.cfg.reveal);
                self.reveal.start(self.clock);
            }
            View::Guestboard => self.enter_guestboard().await?,
            _ => {}
        }
        // The custom cursor only exists on the entrance page.
        if view != View::Entrance {
            self.cursor.hide();
        }
        Ok(())
    }

    /// Fetch the notes and, for a visitor who has not signed yet, their city.
    async fn enter_guestboard(&mut self) -> Result<()> {
        self.board.begin_loading();
        self.worker_tx.send(WorkerCmd::LoadNotes).await?;
        // The city is only needed to place a note.
        if self.board.refresh_signed(Utc::now())
            && !self.board.is_placing()
            && let Some(at) = self.locator.locate()
        {
            self.worker_tx.send(WorkerCmd::ResolveCity(at)).await?;
        }
        Ok(())
    }

    /// Advance every component by one frame.
    async fn tick(&mut self, now: Duration) -> Result<()> {
        let dt = now.saturating_sub(self.clock);
        self.clock = now;

        // Intro reveal; a finished run moves on to the entrance.
        if let Some(signal) = self.reveal.tick(now) {
            tracing::info!("intro {signal:?}");
            if self.ui.view() == View::Intro {
                self.dispatch(SequenceAction::CompleteIntro).await?;
            }
        }
        // Dial spring and settle notifications.
        if let Some(sel) = self.dial.tick(dt) {
            let label = self
                .dial
                .items()
                .get(sel.index)
                .map(|i| i.label.as_str())
                .unwrap_or_default();
            tracing::info!("selected item {}: {label}", sel.index);
            self.ui.status = format!("Selected {label}");
        }
        self.links.tick(now);
        self.board.tick(now);

        // Link positions move while shuffling, so the hover areas follow them.
        if self.ui.view() == View::Entrance {
            let areas = entrance_cursor_areas(self);
            self.cursor.set_areas(areas);
        }
        Ok(())
    }

    /// Skip the intro on the first request.
    async fn skip_intro(&mut self) -> Result<()> {
        if self.reveal.skip() == Some(RevealSignal::Skipped) {
            tracing::info!("intro skipped");
            self.dispatch(SequenceAction::CompleteIntro).await?;
        }
        Ok(())
    }
}

/// Run the main TUI loop until the user quits.
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    let cfg = Config::load_or_default(&PathBuf::from("config.toml"))?;
    let shortcuts = Shortcuts::load_or_default(PathBuf::from("shortcuts.toml"))?;

    // Guestboard collaborators share one HTTP client.
    let http = Client::builder()
        .user_agent(cfg.guestboard.user_agent.clone())
        .build()?;
    // An unusable store configuration is fatal.
    let store = FirestoreStore::new(http.clone(), &cfg.guestboard)?;
    let geocoder = NominatimGeocoder::new(http, cfg.guestboard.geocode_url.clone());

    // Background worker for all network I/O.
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(
        rx_cmd,
        tx_ev,
        Arc::new(store),
        Arc::new(geocoder),
    ));

    let flag = SignedFlag::new(
        cfg.guestboard.flag_path.clone(),
        cfg.guestboard.flag_expiry_days,
    );
    let mut app = App {
        reveal: RevealSequencer::new(&cfg.intro.lines, cfg.reveal),
        dial: Dial::new(cfg.dial.items.clone(), cfg.dial.settings.clone()),
        drag_row: None,
        press_row: None,
        links: LinkShuffler::new(cfg.entrance.links.clone(), StdRng::from_os_rng()),
        link_focus: 0,
        board: Board::new(
            flag,
            Duration::from_millis(cfg.guestboard.load_reveal_ms),
            StdRng::from_os_rng(),
        ),
        locator: Box::new(ConfiguredLocator(cfg.guestboard.location)),
        cursor: CursorOverlay::new(),
        ui: UiState::new(),
        shortcuts,
        worker_tx: tx_cmd,
        worker_rx: rx_ev,
        clock: Duration::ZERO,
        screen: Rect::default(),
        quit: false,
        cfg,
    };

    let started = Instant::now();
    app.reveal.start(Duration::ZERO);

    while !app.quit {
        // Draw, remembering the area for hit-testing.
        let frame = terminal.draw(|f| draw(f, &app))?;
        app.screen = frame.area;

        // Apply worker results without blocking.
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // Input; the poll timeout paces the frame clock.
        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(k) if is_ctrl_c(&k) => break,
                Event::Key(k) => handle_key(&mut app, k).await?,
                Event::Mouse(m) => handle_mouse(&mut app, m).await?,
                Event::Resize(w, h) => {
                    tracing::debug!("resized to {w}x{h}");
                    app.links.reshuffle();
                }
                _ => {}
            }
        }

        app.tick(started.elapsed()).await?;
    }
    Ok(())
}

/// Apply a worker event to the UI state.
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::NotesLoaded(Some(notes)) => {
            app.ui.status = format!("Loaded {} notes", notes.len());
            app.board.notes_loaded(notes, app.clock);
        }
        WorkerEvent::NotesLoaded(None) => {
            app.board.load_failed();
            app.ui.error = Some("Could not load notes".into());
        }
        WorkerEvent::NoteAdded(id) => {
            if id.is_none() {
                app.ui.error = Some("Could not save note".into());
            }
            app.board.note_saved(id);
        }
        WorkerEvent::CityResolved(city) => app.board.city_resolved(city),
        WorkerEvent::Log(s) => app.ui.push_log(s),
    }
}
