//! Snake Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlInputElement, KeyboardEvent};

    use snake_rush::Tuning;
    use snake_rush::ads::AdGateway;
    use snake_rush::analytics::AnalyticsEvent;
    use snake_rush::audio::AudioManager;
    use snake_rush::consts::{COUNTDOWN_TICK_MS, TICK_MS};
    use snake_rush::persistence::LocalStorage;
    use snake_rush::platform::{BrowserPlatform, Platform};
    use snake_rush::session::{Cue, Session};
    use snake_rush::shared::Shared;
    use snake_rush::sim::{Direction, GameMode, GamePhase};
    use snake_rush::web::PokiGateway;

    // Drawing lives in the page; it receives one JSON snapshot per frame
    #[wasm_bindgen(inline_js = "
        export function present_frame(json) {
            const render = globalThis.renderSnake;
            if (typeof render === 'function') {
                render(JSON.parse(json));
            }
        }

        export function tuning_overrides() {
            const t = globalThis.SNAKE_TUNING;
            return t ? JSON.stringify(t) : undefined;
        }
    ")]
    extern "C" {
        fn present_frame(json: &str);
        fn tuning_overrides() -> Option<String>;
    }

    type WebSession = Session<PokiGateway, BrowserPlatform, LocalStorage>;

    /// Shared handles. SDK init and ad breaks hold the session across
    /// awaits; gameplay input is dropped meanwhile, preference changes are
    /// queued until the session is released.
    #[derive(Clone)]
    struct Game {
        session: Shared<WebSession>,
        audio: Rc<RefCell<AudioManager>>,
        started_ms: u64,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning) -> Self {
            let session = Session::new(PokiGateway, BrowserPlatform, LocalStorage, tuning, seed);
            Self {
                session: Shared::new(session),
                audio: Rc::new(RefCell::new(AudioManager::new())),
                started_ms: BrowserPlatform.now_ms(),
            }
        }

        fn with_session<R>(&self, f: impl FnOnce(&mut WebSession) -> R) -> Option<R> {
            let Some((result, cues)) = self.session.try_with(|s| {
                let result = f(s);
                (result, s.drain_cues())
            }) else {
                log::debug!("Session busy (ad in progress), input ignored");
                return None;
            };
            self.play_cues(cues);
            Some(result)
        }

        /// Applied now, or as soon as the in-flight ad releases the session
        fn with_session_or_defer(&self, f: impl FnOnce(&mut WebSession) + 'static) {
            if !self.session.with_or_defer(f) {
                log::debug!("Session busy, action queued");
                return;
            }
            self.settle();
        }

        /// Replay queued actions and play any cues they raised
        fn settle(&self) {
            self.with_session(|_| ());
        }

        fn play_cues(&self, cues: Vec<Cue>) {
            let Ok(mut audio) = self.audio.try_borrow_mut() else {
                return;
            };
            for cue in cues {
                match cue {
                    Cue::Sound { effect } => audio.play(effect),
                    Cue::Music { track } => audio.set_music(track),
                }
            }
        }

        /// One simulation tick; a game over or level end awaits its ad here
        #[allow(clippy::await_holding_refcell_ref)]
        fn step(&self) {
            let game = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let Some(mut session) = game.session.try_hold() else {
                    return;
                };
                session.step().await;
                drop(session);
                game.settle();
            });
        }

        #[allow(clippy::await_holding_refcell_ref)]
        fn continue_with_ad(&self) {
            let game = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let Some(mut session) = game.session.try_hold() else {
                    return;
                };
                session.continue_with_ad().await;
                drop(session);
                game.settle();
            });
        }

        /// Enter / R / overlay button: whatever the end screen offers
        fn primary_action(&self) {
            self.with_session(|s| match (s.phase(), s.state().mode) {
                (GamePhase::GameOver, GameMode::Campaign) => {
                    s.start_level();
                }
                (GamePhase::GameOver | GamePhase::TimeUp, GameMode::TimeAttack) => {
                    s.start_time_attack();
                }
                (GamePhase::LevelComplete, _) => {
                    s.next_level();
                }
                (GamePhase::Victory, _) => {
                    s.start_campaign();
                }
                _ => {}
            });
        }

        fn toggle_pause(&self) {
            self.with_session(|s| match s.phase() {
                GamePhase::Running => s.pause(),
                GamePhase::Paused => s.resume(),
                _ => {}
            });
        }

        /// Page is going away. If an ad holds the session the end of the
        /// session is reported straight to the SDK.
        fn shutdown(&self) {
            if self.with_session(|s| s.shutdown()).is_some() {
                return;
            }
            let now = BrowserPlatform.now_ms();
            let event = AnalyticsEvent::SessionEnd {
                duration_secs: now.saturating_sub(self.started_ms) / 1000,
                timestamp: now,
            };
            if let Err(e) = PokiGateway.custom_event(event.name(), &event.payload()) {
                log::warn!("Could not report session end: {}", e);
            }
        }

        fn present(&self) {
            let json = self.with_session(|s| serde_json::to_string(&s.snapshot()));
            match json {
                Some(Ok(json)) => present_frame(&json),
                Some(Err(e)) => log::error!("Failed to encode snapshot: {}", e),
                None => {}
            }
            if let Ok(mut audio) = self.audio.try_borrow_mut() {
                audio.pump_music();
            }
        }
    }

    fn load_tuning() -> Tuning {
        let Some(json) = tuning_overrides() else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring invalid tuning overrides: {}", e);
                Tuning::default()
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Snake Rush starting...");

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(seed, load_tuning());

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_toggles(game.clone());
        setup_auto_pause(game.clone());
        setup_timers(game.clone());
        request_animation_frame(game.clone());

        // Holds the session while the SDK comes up; toggles queue meanwhile
        let ready = {
            let Some(mut session) = game.session.try_hold() else {
                return;
            };
            #[allow(clippy::await_holding_refcell_ref)]
            let ready = session.boot().await;
            drop(session);
            game.settle();
            ready
        };
        log::info!("Ready (ads {})", if ready { "on" } else { "off" });
    }

    fn on(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(game: Game) {
        let Some(window) = web_sys::window() else {
            return;
        };
        on(&window, "keydown", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let key = event.key().to_lowercase();
            let dir = match key.as_str() {
                "arrowup" | "w" => Some(Direction::Up),
                "arrowdown" | "s" => Some(Direction::Down),
                "arrowleft" | "a" => Some(Direction::Left),
                "arrowright" | "d" => Some(Direction::Right),
                _ => None,
            };
            if dir.is_some() || key == " " {
                event.prevent_default();
            }
            if let Some(dir) = dir {
                game.with_session(|s| s.set_direction(dir));
                return;
            }
            match key.as_str() {
                "escape" | "p" => game.toggle_pause(),
                "enter" | "r" => game.primary_action(),
                _ => {}
            }
        });
    }

    fn bind(document: &web_sys::Document, id: &str, game: &Game, action: impl Fn(&Game) + 'static) {
        if let Some(el) = document.get_element_by_id(id) {
            let game = game.clone();
            on(&el, "click", move |_| action(&game));
        }
    }

    fn setup_buttons(game: Game) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        bind(&document, "campaign-btn", &game, |g| {
            g.with_session(|s| s.start_campaign());
        });
        bind(&document, "time-attack-btn", &game, |g| {
            g.with_session(|s| s.start_time_attack());
        });
        bind(&document, "start-btn", &game, Game::primary_action);
        bind(&document, "continue-ad-btn", &game, Game::continue_with_ad);
        bind(&document, "pause-btn", &game, |g| {
            g.with_session(|s| s.pause());
        });
        bind(&document, "resume-btn", &game, |g| {
            g.with_session(|s| s.resume());
        });
        bind(&document, "restart-btn", &game, |g| {
            g.with_session(|s| s.restart());
        });
        bind(&document, "quit-btn", &game, |g| {
            g.with_session(|s| s.quit_to_menu());
        });
        for screen in ["how-to-play", "settings"] {
            bind(&document, &format!("{}-btn", screen), &game, move |g| {
                g.with_session(|s| s.show_screen(screen));
            });
        }
    }

    fn setup_toggles(game: Game) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let settings = game.with_session(|s| s.settings()).unwrap_or_default();
        let toggles: [(&str, bool, fn(&mut WebSession, bool)); 3] = [
            ("sound-toggle", settings.sound_enabled, |s, enabled| {
                s.set_sound_enabled(enabled)
            }),
            ("music-toggle", settings.music_enabled, |s, enabled| {
                s.set_music_enabled(enabled)
            }),
            ("reduced-particles-toggle", settings.reduced_particles, |s, enabled| {
                s.set_reduced_particles(enabled)
            }),
        ];
        for (id, initial, apply) in toggles {
            let Some(input) = document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                continue;
            };
            input.set_checked(initial);
            let game = game.clone();
            let source = input.clone();
            on(&input, "change", move |_| {
                let checked = source.checked();
                game.with_session_or_defer(move |s| apply(s, checked));
            });
        }
    }

    fn setup_auto_pause(game: Game) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(document) = window.document() {
            let game = game.clone();
            let doc = document.clone();
            on(&document, "visibilitychange", move |_| {
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.with_session(|s| s.pause());
                    log::info!("Auto-paused (tab hidden)");
                }
            });
        }
        on(&window, "beforeunload", move |_| game.shutdown());
    }

    /// The session decides whether each timer is armed; these just fire
    fn setup_timers(game: Game) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let sim = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || sim.step());
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TICK_MS as i32,
        );
        closure.forget();

        let closure = Closure::<dyn FnMut()>::new(move || {
            game.with_session(|s| s.countdown_tick());
        });
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            COUNTDOWN_TICK_MS as i32,
        );
        closure.forget();
    }

    fn request_animation_frame(game: Game) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game.present();
            request_animation_frame(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless demo: an autopilot plays a campaign and a time-attack run,
/// with ads and analytics going to the log. Runs on a virtual clock, or
/// paced by the wall clock with `--realtime`.
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use futures::executor::block_on;

    use snake_rush::Tuning;
    use snake_rush::ads::LogGateway;
    use snake_rush::consts::{COUNTDOWN_TICK_MS, TICK_MS};
    use snake_rush::persistence::MemoryStorage;
    use snake_rush::platform::{Platform, SystemClock, VirtualClock};
    use snake_rush::session::Session;
    use snake_rush::sim::grid::{self, Direction};
    use snake_rush::sim::{GamePhase, GameState};

    type HeadlessSession<P> = Session<LogGateway, P, MemoryStorage>;

    /// Step limit per run
    const MAX_TICKS: u32 = 5_000;

    /// Greedy: the safe non-reversing turn that gets closest to the food
    fn autopilot(state: &GameState) -> Option<Direction> {
        let head = state.snake.head();
        let reverse = state.snake.direction.opposite();
        Direction::ALL
            .into_iter()
            .filter(|&d| d != reverse)
            .filter_map(|d| {
                let next = head + d.delta();
                let next = if state.wrap_disabled() {
                    grid::in_bounds(next).then_some(next)?
                } else {
                    grid::wrap(next)
                };
                (!state.is_occupied(next)).then_some((d, grid::manhattan(next, state.food)))
            })
            .min_by_key(|&(_, dist)| dist)
            .map(|(d, _)| d)
    }

    fn play<P: Platform>(session: &mut HeadlessSession<P>, clock: &P) -> GamePhase {
        let ticks_per_second = (COUNTDOWN_TICK_MS / TICK_MS) as u32;
        for n in 1..=MAX_TICKS {
            if let Some(dir) = autopilot(session.state()) {
                session.set_direction(dir);
            }
            block_on(clock.sleep_ms(TICK_MS as u32));
            let phase = block_on(session.step());
            if n % ticks_per_second == 0 {
                session.countdown_tick();
            }

            match session.phase() {
                GamePhase::LevelComplete => {
                    log::info!("Level {} cleared", session.state().level_index + 1);
                    session.next_level();
                }
                GamePhase::GameOver => {
                    if !block_on(session.continue_with_ad()) {
                        return phase;
                    }
                }
                GamePhase::Running => {}
                other => return other,
            }
        }
        session.phase()
    }

    pub fn run(seed: u64, realtime: bool) {
        if realtime {
            play_both(SystemClock, seed);
        } else {
            play_both(VirtualClock::new(0), seed);
        }
    }

    fn play_both<P: Platform + Clone>(clock: P, seed: u64) {
        let gateway = LogGateway { reward: true };
        let mut session = Session::new(
            gateway,
            clock.clone(),
            MemoryStorage::new(),
            Tuning::default(),
            seed,
        );
        block_on(session.boot());

        session.start_campaign();
        let phase = play(&mut session, &clock);
        log::info!(
            "Campaign ended {:?} on level {} with score {}",
            phase,
            session.state().level_index + 1,
            session.state().score
        );

        session.start_time_attack();
        let phase = play(&mut session, &clock);
        log::info!(
            "Time attack ended {:?} with score {}",
            phase,
            session.state().score
        );

        session.quit_to_menu();
        session.shutdown();
        log::info!("Best score this session: {}", session.high_score());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Snake Rush (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let realtime = args.iter().any(|a| a == "--realtime");
    let seed = args
        .iter()
        .find_map(|a| a.parse().ok())
        .unwrap_or(0x5EED);
    headless::run(seed, realtime);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
