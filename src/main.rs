//! Packet Drop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement, PointerEvent};

    use packet_drop::audio::{AudioManager, SoundEffect};
    use packet_drop::consts::*;
    use packet_drop::leaderboard::{HttpBackend, fetch_or_empty, submit_and_refresh};
    use packet_drop::session::{LeaderboardTicket, LoopId};
    use packet_drop::{GameConfig, GameSession, SessionEvent, View};

    /// View containers toggled by the session view
    const VIEW_IDS: [(&str, &str); 5] = [
        ("name", "view-name"),
        ("countdown", "view-countdown"),
        ("game", "view-game"),
        ("gameover", "view-gameover"),
        ("leaderboard", "view-leaderboard"),
    ];

    /// Game instance holding all state
    struct App {
        session: GameSession,
        config: GameConfig,
        backend: HttpBackend,
        audio: AudioManager,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        last_time: f64,
        raf_handle: Option<i32>,
    }

    impl App {
        /// Match the canvas backing store to its CSS size and tell the session
        fn resize(&mut self) {
            let w = self.canvas.client_width().max(0) as u32;
            let h = self.canvas.client_height().max(0) as u32;
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            self.session.resize(w as f32, h as f32);
            self.draw();
        }

        /// Draw the floor and the current packet snapshot
        fn draw(&self) {
            let ctx = &self.ctx;
            let geometry = self.session.geometry();
            ctx.clear_rect(0.0, 0.0, geometry.width as f64, geometry.height as f64);
            if !geometry.is_playable() {
                return;
            }

            ctx.set_fill_style_str("#263238");
            ctx.fill_rect(
                0.0,
                geometry.floor_top() as f64,
                geometry.width as f64,
                FLOOR_THICKNESS as f64,
            );

            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            for packet in self.session.visible_packets() {
                let rect = packet.drawn_rect();
                let (x, y) = (rect.min.x as f64, rect.min.y as f64);
                let (w, h) = (rect.size.x as f64, rect.size.y as f64);
                match packet.sprite {
                    Some(sprite) => {
                        ctx.set_fill_style_str(sprite.color());
                        ctx.fill_rect(x, y, w, h);
                        ctx.set_fill_style_str("#102027");
                        ctx.set_font("bold 14px sans-serif");
                        let _ = ctx.fill_text(sprite.label(), x + w / 2.0, y + h / 2.0);
                    }
                    None => {
                        ctx.set_fill_style_str("#e53935");
                        ctx.fill_rect(x, y, w, h);
                        ctx.set_fill_style_str("#ffffff");
                        ctx.set_font("bold 22px monospace");
                        let _ = ctx.fill_text("✖", x + w / 2.0, y + h / 2.0);
                    }
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("hud-score") {
                el.set_text_content(Some(&self.session.score().to_string()));
            }

            if let Some(el) = document.get_element_by_id("countdown-value") {
                let secs = self.session.view().countdown_secs();
                el.set_text_content(Some(&secs.max(1).to_string()));
            }

            if let Some(el) = document.get_element_by_id("final-score") {
                let score = self.session.last_result().map(|r| r.score).unwrap_or(0);
                el.set_text_content(Some(&score.to_string()));
            }
        }

        /// Show the container for the current view, hide the rest
        fn update_views(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let current = self.session.view().as_str();
            for (view, id) in VIEW_IDS {
                if let Some(el) = document.get_element_by_id(id) {
                    let class = if view == current {
                        "view"
                    } else {
                        "view hidden"
                    };
                    let _ = el.set_attribute("class", class);
                }
            }

            if self.session.view() == View::Name {
                if let Some(input) = document
                    .get_element_by_id("name-input")
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                {
                    if input.value().is_empty() {
                        input.set_value(&self.config.default_name);
                    }
                }
            }
            self.update_hud();
        }

        /// Rebuild the leaderboard list
        fn render_leaderboard(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            for list_id in ["leaderboard-rows", "gameover-rows"] {
                let Some(list) = document.get_element_by_id(list_id) else {
                    continue;
                };
                list.set_inner_html("");
                for row in self.session.leaderboard().rows() {
                    let Ok(item) = document.create_element("li") else {
                        continue;
                    };
                    let text = format!("{}. {}  {}", row.rank, row.name, row.score);
                    item.set_text_content(Some(&text));
                    let _ = list.append_child(&item);
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Packet Drop starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        // Embedded JSON config, then URL overrides
        let config = document
            .get_element_by_id("packet-drop-config")
            .and_then(|el| el.text_content())
            .and_then(|json| match GameConfig::from_json(&json) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring malformed config: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        let config = config.with_query(&window.location().search().unwrap_or_default());

        let Some(canvas) = document
            .get_element_by_id("board")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #board canvas");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let mut audio = AudioManager::new();
        audio.set_muted(config.muted);
        let app = Rc::new(RefCell::new(App {
            session: GameSession::from_config(&config, seed),
            backend: HttpBackend::new(config.backend_url.clone()),
            config,
            audio,
            canvas: canvas.clone(),
            ctx,
            last_time: 0.0,
            raf_handle: None,
        }));

        log::info!("Session initialized with seed: {}", seed);

        {
            let mut a = app.borrow_mut();
            a.resize();
            a.update_views();
            a.render_leaderboard();
        }

        setup_input_handlers(&canvas, app.clone());
        setup_buttons(app.clone());
        setup_resize(app);

        log::info!("Packet Drop running!");
    }

    /// Carry out the side effects the session asked for
    fn dispatch(app: &Rc<RefCell<App>>, events: Vec<SessionEvent>) {
        for event in events {
            if let Some(effect) = SoundEffect::for_event(&event) {
                app.borrow().audio.play(effect);
            }

            match event {
                SessionEvent::LoopStarted(id) => {
                    app.borrow_mut().last_time = 0.0;
                    request_animation_frame(app.clone(), id);
                }
                SessionEvent::LoopCancelled(_) => {
                    let handle = app.borrow_mut().raf_handle.take();
                    if let (Some(handle), Some(window)) = (handle, web_sys::window()) {
                        let _ = window.cancel_animation_frame(handle);
                    }
                }
                SessionEvent::ViewChanged(_) => app.borrow().update_views(),
                SessionEvent::RoundOver { submission, ticket } => {
                    let app = app.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let (backend, limit) = {
                            let a = app.borrow();
                            (a.backend.clone(), a.config.leaderboard_limit)
                        };
                        let board = submit_and_refresh(&backend, &submission, limit).await;
                        apply_board(&app, ticket, board);
                    });
                }
                SessionEvent::LeaderboardRequested(ticket) => {
                    let app = app.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let (backend, limit) = {
                            let a = app.borrow();
                            (a.backend.clone(), a.config.leaderboard_limit)
                        };
                        let board = fetch_or_empty(&backend, limit).await;
                        apply_board(&app, ticket, board);
                    });
                }
                SessionEvent::RoundStarted { .. } | SessionEvent::Game(_) => {}
            }
        }
    }

    fn apply_board(
        app: &Rc<RefCell<App>>,
        ticket: LeaderboardTicket,
        board: packet_drop::Leaderboard,
    ) {
        let mut a = app.borrow_mut();
        if a.session.apply_leaderboard(ticket, board) {
            a.render_leaderboard();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>, id: LoopId) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback_app = app.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(callback_app, id, time);
        });
        if let Ok(handle) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            app.borrow_mut().raf_handle = Some(handle);
        }
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, id: LoopId, time: f64) {
        let events = {
            let mut a = app.borrow_mut();
            a.raf_handle = None;
            if !a.session.is_loop_active(id) {
                return;
            }

            // Calculate delta time
            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                NOMINAL_DT
            };
            a.last_time = time;

            let events = a.session.tick(dt);
            a.draw();
            a.update_hud();
            events
        };

        dispatch(&app, events);

        if app.borrow().session.is_loop_active(id) {
            request_animation_frame(app, id);
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Pointer down on the board
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let events = {
                    let mut a = app.borrow_mut();
                    a.audio.resume();
                    let events = a
                        .session
                        .on_pointer_down(event.offset_x() as f32, event.offset_y() as f32);
                    a.draw();
                    a.update_hud();
                    events
                };
                dispatch(&app, events);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let view = app.borrow().session.view();
                match (event.key().as_str(), view) {
                    ("Enter", View::Name) => start_from_name(&app),
                    ("Enter" | " " | "r" | "R", View::GameOver | View::Leaderboard) => {
                        let events = app.borrow_mut().session.replay();
                        dispatch(&app, events);
                    }
                    ("m" | "M", _) => {
                        let mut a = app.borrow_mut();
                        let muted = !a.audio.is_muted();
                        a.audio.set_muted(muted);
                        log::info!("Muted: {}", muted);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Read the name input and leave the name screen
    fn start_from_name(app: &Rc<RefCell<App>>) {
        let name = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("name-input"))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default();
        let events = {
            let mut a = app.borrow_mut();
            a.audio.resume();
            a.session.submit_name(&name)
        };
        dispatch(app, events);
    }

    fn on_click(id: &str, app: Rc<RefCell<App>>, action: fn(&Rc<RefCell<App>>)) {
        let Some(btn) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&app);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        on_click("start-btn", app.clone(), start_from_name);
        for id in ["replay-btn", "leaderboard-replay-btn"] {
            on_click(id, app.clone(), |app| {
                let events = app.borrow_mut().session.replay();
                dispatch(app, events);
            });
        }
        on_click("leaderboard-btn", app.clone(), |app| {
            let events = app.borrow_mut().session.show_leaderboard();
            dispatch(app, events);
        });
        on_click("exit-btn", app, |app| {
            let events = app.borrow_mut().session.exit_to_name();
            dispatch(app, events);
        });
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Packet Drop (native) starting...");
    log::info!(
        "Native mode runs a headless demo round - run with `trunk serve` for the web version"
    );

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a scripted player catches valid packets until a stray
/// click lands on a corrupted one, then the score goes to the in-memory board.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use packet_drop::consts::*;
    use packet_drop::leaderboard::MemoryBackend;
    use packet_drop::{GameConfig, GameSession, Leaderboard, SessionEvent, View};

    /// Frames between scripted clicks
    const CLICK_EVERY: u32 = 12;
    /// Every Nth click is aimed at a corrupted packet
    const BLUNDER_EVERY: u32 = 40;
    /// Give up after this many frames (two minutes)
    const MAX_FRAMES: u32 = 60 * 120;

    pub fn run() {
        let config = GameConfig::default()
            .with_query(&std::env::args().nth(1).unwrap_or_default());
        let mut session = GameSession::from_config(&config, 2026);
        session.resize(480.0, 560.0);
        session.submit_name("demo");

        let backend = MemoryBackend::new();
        let mut clicks = 0;
        for frame in 0..MAX_FRAMES {
            let mut events = session.tick(NOMINAL_DT);

            if session.view() == View::Game && frame % CLICK_EVERY == 0 {
                clicks += 1;
                let blunder = clicks % BLUNDER_EVERY == 0;
                let target = session
                    .packets()
                    .iter()
                    .rev()
                    .find(|p| p.valid != blunder)
                    .map(|p| p.drawn_rect());
                if let Some(rect) = target {
                    let center = rect.min + rect.size * 0.5;
                    events.extend(session.on_pointer_down(center.x, center.y));
                }
            }

            for event in events {
                if let SessionEvent::RoundOver { submission, .. } = event {
                    let rank = backend.record(&submission);
                    log::info!(
                        "Recorded {} with {} (rank {:?})",
                        submission.name,
                        submission.score,
                        rank
                    );
                }
            }
            if session.view() == View::GameOver {
                break;
            }
        }

        let board = Leaderboard::from_entries(backend.top_entries(config.leaderboard_limit));
        log::info!("Final score: {}", session.score());
        for row in board.rows() {
            log::info!("{:>2}. {:<20} {:>6}", row.rank, row.name, row.score);
        }
    }
}
