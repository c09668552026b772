//! Session / loop controller
//!
//! Owns one player's session: the simulation state, the two timers that
//! drive it, the guarded ad service, persistence and the feedback queue.
//! The host (browser bindings or the native runner) calls `step` every
//! 100 ms and `countdown_tick` every second while the matching timer is
//! armed.
//!
//! Ad breaks are awaited inside the session. Both timers are cleared before
//! an ad request is issued, so no tick can run while an ad is in flight.

use serde::Serialize;

use crate::ads::{AdGateway, AdService};
use crate::analytics::AnalyticsEvent;
use crate::audio::{MusicTrack, SoundEffect};
use crate::highscores::HighScore;
use crate::persistence::Storage;
use crate::platform::Platform;
use crate::settings::Settings;
use crate::sim::{
    Direction, GameEvent, GameMode, GamePhase, GameState, Snapshot, TickInput, tick,
};
use crate::tuning::Tuning;

/// Which host timers should be firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Timers {
    /// 100 ms simulation tick
    pub simulation: bool,
    /// 1 s time-attack countdown
    pub countdown: bool,
}

/// Feedback for the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    Sound { effect: SoundEffect },
    /// `None` stops the music
    Music { track: Option<MusicTrack> },
}

pub struct Session<G: AdGateway, P: Platform, S: Storage> {
    state: GameState,
    ads: AdService<G>,
    platform: P,
    storage: S,
    settings: Settings,
    high_score: HighScore,
    timers: Timers,
    input: TickInput,
    music: Option<MusicTrack>,
    cues: Vec<Cue>,
}

impl<G: AdGateway, P: Platform, S: Storage> Session<G, P, S> {
    pub fn new(gateway: G, platform: P, storage: S, tuning: Tuning, seed: u64) -> Self {
        let settings = Settings::load(&storage);
        let high_score = HighScore::load(&storage);
        let ads = AdService::new(gateway, tuning.ad_cooldown_ms);
        let mut state = GameState::new(seed, tuning, high_score.best);
        state.particles.set_reduced(settings.reduced_particles);

        Self {
            state,
            ads,
            platform,
            storage,
            settings,
            high_score,
            timers: Timers::default(),
            input: TickInput::default(),
            music: None,
            cues: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best
    }

    pub fn ads(&self) -> &AdService<G> {
        &self.ads
    }

    fn now(&self) -> u64 {
        self.platform.now_ms()
    }

    // === Lifecycle ===

    /// Start the analytics session and bring up the ad SDK.
    /// Returns whether the SDK is ready.
    pub async fn boot(&mut self) -> bool {
        let now = self.now();
        let referrer = self.platform.referrer();
        self.ads.track_session_start(now, referrer);

        let attempts = self.state.tuning.sdk_init_attempts;
        let backoff = self.state.tuning.sdk_init_backoff_ms;
        let ready = self.ads.initialize(&self.platform, attempts, backoff).await;

        self.show_screen("main_menu");
        self.set_music(Some(MusicTrack::Menu));
        ready
    }

    /// Page is going away
    pub fn shutdown(&mut self) {
        self.clear_timers();
        let now = self.now();
        self.ads.track_session_end(now);
        self.set_music(None);
    }

    /// Menu navigation, for analytics
    pub fn show_screen(&mut self, screen: &str) {
        self.ads.track(AnalyticsEvent::ScreenView {
            screen: screen.to_owned(),
        });
    }

    pub fn start_campaign(&mut self) -> bool {
        self.begin_mode(GameMode::Campaign)
    }

    pub fn start_time_attack(&mut self) -> bool {
        self.begin_mode(GameMode::TimeAttack)
    }

    fn begin_mode(&mut self, mode: GameMode) -> bool {
        self.clear_timers();
        self.ads.track(AnalyticsEvent::ModeSelected { mode });
        self.ads.track(AnalyticsEvent::GameStart { mode });
        self.load_level(mode, 0)
    }

    /// Retry the current level. Ignored while the simulation timer runs.
    pub fn start_level(&mut self) -> bool {
        if self.timers.simulation {
            return false;
        }
        self.load_level(self.state.mode, self.state.level_index)
    }

    /// Advance after a completed campaign level; past the last level the
    /// campaign is won.
    pub fn next_level(&mut self) -> bool {
        if self.state.phase != GamePhase::LevelComplete {
            return false;
        }
        self.load_level(GameMode::Campaign, self.state.level_index + 1)
    }

    fn load_level(&mut self, mode: GameMode, index: usize) -> bool {
        self.input = TickInput::default();
        if !self.state.start_level(mode, index) {
            self.clear_timers();
            self.state.complete_campaign();
            self.process_events();
            return false;
        }

        self.timers.simulation = true;
        self.timers.countdown = self.state.countdown.is_some();
        self.ads.gameplay_start();
        self.set_music(Some(MusicTrack::Game));
        self.process_events();
        true
    }

    pub fn pause(&mut self) {
        if self.state.phase == GamePhase::Running {
            self.state.set_paused(true);
            self.ads.gameplay_stop();
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == GamePhase::Paused {
            self.state.set_paused(false);
            self.ads.gameplay_start();
            log::info!("Resumed");
        }
    }

    /// Tear the run down and start it again: time-attack from a fresh
    /// countdown, campaign at the current level.
    pub fn restart(&mut self) {
        self.clear_timers();
        self.set_music(None);
        match self.state.mode {
            GameMode::TimeAttack => {
                self.start_time_attack();
            }
            GameMode::Campaign => {
                self.start_level();
            }
        }
    }

    pub fn quit_to_menu(&mut self) {
        self.clear_timers();
        if self.state.phase == GamePhase::Running || self.state.phase == GamePhase::Paused {
            self.ads.gameplay_stop();
        }
        self.state.phase = GamePhase::Idle;
        self.show_screen("main_menu");
        self.set_music(Some(MusicTrack::Menu));
    }

    fn clear_timers(&mut self) {
        self.timers = Timers::default();
        self.input = TickInput::default();
    }

    // === Play ===

    /// Buffer a turn for the next tick
    pub fn set_direction(&mut self, dir: Direction) {
        if self.state.phase == GamePhase::Running {
            self.input.turn = Some(dir);
        }
    }

    /// One simulation tick. Terminal outcomes are fully handled (timers
    /// cleared, ads awaited) before this returns.
    pub async fn step(&mut self) -> GamePhase {
        if !self.timers.simulation {
            return self.state.phase;
        }

        let input = std::mem::take(&mut self.input);
        let now = self.now();
        tick(&mut self.state, &input, now);
        self.process_events();

        match self.state.phase {
            GamePhase::GameOver => self.game_over().await,
            GamePhase::LevelComplete => self.level_complete().await,
            _ => {}
        }
        self.state.phase
    }

    /// One countdown second. Returns true on the tick that ends the run.
    pub fn countdown_tick(&mut self) -> bool {
        if !self.timers.countdown {
            return false;
        }
        if !self.state.countdown_tick() {
            return false;
        }
        self.clear_timers();
        self.ads.gameplay_stop();
        self.process_events();
        true
    }

    async fn game_over(&mut self) {
        self.clear_timers();
        self.ads.gameplay_stop();
        self.set_music(None);
        let now = self.now();
        self.ads.commercial_break(now).await;
    }

    async fn level_complete(&mut self) {
        self.clear_timers();
        self.ads.gameplay_stop();
        // Every second level only
        if self.state.level_index % 2 == 1 {
            let now = self.now();
            self.ads.commercial_break(now).await;
        }
    }

    /// Offer a rewarded ad after a crash. A watched ad revives the snake
    /// and resumes the run; the offer is good once per run.
    pub async fn continue_with_ad(&mut self) -> bool {
        if !self.state.continue_available() {
            return false;
        }
        let now = self.now();
        if !self.ads.rewarded_break(now).await {
            log::info!("Continue declined");
            return false;
        }

        let now = self.now();
        self.state.revive(now);
        self.timers.simulation = true;
        self.timers.countdown = self.state.countdown.is_some_and(|c| !c.is_finished());
        self.set_music(Some(MusicTrack::Game));
        self.process_events();
        true
    }

    // === Presentation ===

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.now())
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        self.settings.save(&mut self.storage);
    }

    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.settings.music_enabled = enabled;
        self.settings.save(&mut self.storage);
        if !enabled {
            self.set_music(None);
        }
    }

    /// Swap the particle budget; cosmetic only, gameplay RNG is untouched
    pub fn set_reduced_particles(&mut self, reduced: bool) {
        self.settings.reduced_particles = reduced;
        self.state.particles.set_reduced(reduced);
    }

    fn play(&mut self, effect: SoundEffect) {
        if self.settings.sound_enabled {
            self.cues.push(Cue::Sound { effect });
        }
    }

    fn set_music(&mut self, track: Option<MusicTrack>) {
        let track = track.filter(|_| self.settings.music_enabled);
        if self.music == track {
            return;
        }
        self.music = track;
        self.cues.push(Cue::Music { track });
    }

    /// Turn simulation events into sounds, analytics and saves
    fn process_events(&mut self) {
        let mode = self.state.mode;
        for event in self.state.drain_events() {
            match event {
                GameEvent::LevelStarted { level, mode } => {
                    self.ads.track(AnalyticsEvent::LevelStart { level, mode });
                }
                GameEvent::FoodEaten { .. } => self.play(SoundEffect::Eat),
                GameEvent::ComboAchievement { combo } => {
                    self.ads.track(AnalyticsEvent::ComboAchievement { combo });
                }
                GameEvent::PowerUpCollected { kind, score, .. } => {
                    self.ads
                        .track(AnalyticsEvent::PowerUpCollected { kind, score });
                    self.play(SoundEffect::PowerUp);
                }
                GameEvent::ShieldAbsorbed { .. } | GameEvent::Revived => {
                    self.play(SoundEffect::PowerUp);
                }
                GameEvent::Crashed { .. } => {
                    self.ads.track(AnalyticsEvent::GameOver {
                        score: self.state.score,
                        mode,
                    });
                    self.play(SoundEffect::Die);
                }
                GameEvent::LevelComplete {
                    level,
                    score,
                    target,
                } => {
                    self.ads.track(AnalyticsEvent::LevelComplete {
                        level,
                        score,
                        target,
                    });
                    self.play(SoundEffect::Victory);
                }
                GameEvent::Victory { score } => {
                    self.ads.track(AnalyticsEvent::CampaignComplete {
                        total_score: score,
                        high_score: self.high_score.best,
                    });
                    self.play(SoundEffect::Victory);
                    self.set_music(None);
                }
                GameEvent::TimeUp { score } => {
                    self.ads.track(AnalyticsEvent::TimeAttackScore {
                        score,
                        time_remaining: 0,
                    });
                    self.ads.track(AnalyticsEvent::GameOver {
                        score,
                        mode: GameMode::TimeAttack,
                    });
                    self.play(SoundEffect::Victory);
                    self.set_music(None);
                }
                GameEvent::HighScore { score, previous } => {
                    self.high_score.submit(score, &mut self.storage);
                    self.ads
                        .track(AnalyticsEvent::HighScore { score, previous });
                }
                GameEvent::Milestone { score, milestone } => {
                    self.ads
                        .track(AnalyticsEvent::ScoreMilestone { score, milestone });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use glam::IVec2;

    use super::*;
    use crate::ads::fake::FakeGateway;
    use crate::persistence::{HIGH_SCORE_KEY, MUSIC_ENABLED_KEY, MemoryStorage};
    use crate::platform::VirtualClock;
    use crate::sim::PowerUpKind;

    type TestSession = Session<FakeGateway, VirtualClock, MemoryStorage>;

    fn booted(gateway: FakeGateway) -> (TestSession, VirtualClock) {
        let clock = VirtualClock::new(1_000_000);
        let mut session = Session::new(
            gateway,
            clock.clone(),
            MemoryStorage::new(),
            Tuning {
                powerup_spawn_chance: 0.0,
                ..Tuning::default()
            },
            42,
        );
        block_on(session.boot());
        (session, clock)
    }

    fn events(session: &TestSession) -> Vec<String> {
        session
            .ads()
            .gateway()
            .event_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Put food (or a wall) right where the head goes next
    fn cell_ahead(session: &TestSession) -> IVec2 {
        let snake = &session.state.snake;
        snake.head() + snake.next_direction.delta()
    }

    fn crash_next_tick(session: &mut TestSession) {
        let ahead = cell_ahead(session);
        session.state.walls.push(ahead);
    }

    fn eat_next_tick(session: &mut TestSession) {
        session.state.food = cell_ahead(session);
    }

    #[test]
    fn test_boot_flushes_session_start_first() {
        let (session, _) = booted(FakeGateway::ready());
        assert_eq!(
            events(&session)[..3],
            ["session_start", "sdk_initialized", "screen_view"]
        );
        assert_eq!(
            session.cues,
            vec![Cue::Music {
                track: Some(MusicTrack::Menu)
            }]
        );
    }

    #[test]
    fn test_campaign_start_arms_simulation_only() {
        let (mut session, _) = booted(FakeGateway::ready());
        assert!(session.start_campaign());
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(
            session.timers(),
            Timers {
                simulation: true,
                countdown: false
            }
        );
        let names = events(&session);
        assert!(names.ends_with(&[
            "mode_selected".to_owned(),
            "game_start".to_owned(),
            "level_start".to_owned()
        ]));
        assert_eq!(session.ads().gateway().gameplay, vec!["start"]);

        // Retry is refused while the loop runs
        assert!(!session.start_level());
    }

    #[test]
    fn test_time_up_fires_once_and_clears_timers() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_time_attack();
        assert!(session.timers().countdown);
        session.state.score = 70;
        if let Some(c) = session.state.countdown.as_mut() {
            c.remaining = 2;
        }

        assert!(!session.countdown_tick());
        assert!(session.countdown_tick());
        assert_eq!(session.phase(), GamePhase::TimeUp);
        assert_eq!(session.timers(), Timers::default());
        assert!(!session.countdown_tick());
        assert_eq!(session.state.countdown.map(|c| c.remaining), Some(0));

        let gateway = session.ads().gateway();
        let reports: Vec<_> = gateway
            .events
            .iter()
            .filter(|(name, _)| name == "time_attack_score")
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1["score"], 70);
        assert_eq!(reports[0].1["timeRemaining"], 0);

        // No continue after time up, and the loop stays stopped
        assert!(!block_on(session.continue_with_ad()));
        assert_eq!(block_on(session.step()), GamePhase::TimeUp);
        assert_eq!(session.state.score, 70);
    }

    #[test]
    fn test_pause_holds_the_countdown() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_time_attack();
        let head = session.state.snake.head();

        session.pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        assert!(!session.countdown_tick());
        assert_eq!(block_on(session.step()), GamePhase::Paused);
        assert_eq!(session.state.snake.head(), head);
        assert_eq!(session.state.countdown.map(|c| c.remaining), Some(60));

        session.resume();
        assert!(!session.countdown_tick());
        assert_eq!(session.state.countdown.map(|c| c.remaining), Some(59));
        assert_eq!(
            session.ads().gateway().gameplay,
            vec!["start", "stop", "start"]
        );
    }

    #[test]
    fn test_game_over_awaits_commercial_break_with_loop_stopped() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_campaign();
        crash_next_tick(&mut session);

        assert_eq!(block_on(session.step()), GamePhase::GameOver);
        assert_eq!(session.timers(), Timers::default());
        assert_eq!(session.ads().gateway().commercial_calls, 1);
        assert!(events(&session).contains(&"game_over".to_owned()));
        assert!(session.drain_cues().contains(&Cue::Sound {
            effect: SoundEffect::Die
        }));
        // Nothing to save with a zero score
        assert!(!session.state.continue_available());
    }

    #[test]
    fn test_continue_granted_once_per_run() {
        let (mut session, clock) = booted(FakeGateway::ready());
        session.start_campaign();
        session.state.score = 20;
        crash_next_tick(&mut session);
        block_on(session.step());
        assert!(session.state.continue_available());

        assert!(block_on(session.continue_with_ad()));
        assert_eq!(session.phase(), GamePhase::Running);
        assert!(session.timers().simulation);
        assert_eq!(session.state.score, 20);
        assert_eq!(session.state.snake.head(), IVec2::new(10, 10));
        let now = clock.now_ms();
        assert!(session.state.effects.is_active(PowerUpKind::Shield, now));

        // Let the grace shield run out, then crash again
        clock.advance(3_001);
        crash_next_tick(&mut session);
        assert_eq!(block_on(session.step()), GamePhase::GameOver);
        assert!(!session.state.continue_available());
        assert!(!block_on(session.continue_with_ad()));
        assert_eq!(session.ads().gateway().rewarded_calls, 1);
        // Second break falls inside the cooldown
        assert_eq!(session.ads().gateway().commercial_calls, 1);
    }

    #[test]
    fn test_declined_ad_keeps_the_offer() {
        let mut gateway = FakeGateway::ready();
        gateway.rewarded.push_back(Ok(false));
        let (mut session, _) = booted(gateway);
        session.start_campaign();
        session.state.score = 10;
        crash_next_tick(&mut session);
        block_on(session.step());

        assert!(!block_on(session.continue_with_ad()));
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.state.continue_available());
        assert!(block_on(session.continue_with_ad()));
    }

    #[test]
    fn test_time_attack_continue_resumes_countdown() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_time_attack();
        session.countdown_tick();
        session.state.score = 30;
        crash_next_tick(&mut session);
        block_on(session.step());
        assert!(!session.timers().countdown);

        assert!(block_on(session.continue_with_ad()));
        assert!(session.timers().countdown);
        assert_eq!(session.state.countdown.map(|c| c.remaining), Some(59));
    }

    #[test]
    fn test_level_complete_ad_every_second_level() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_campaign();
        session.state.score = 45;
        eat_next_tick(&mut session);
        assert_eq!(block_on(session.step()), GamePhase::LevelComplete);
        assert_eq!(session.timers(), Timers::default());
        assert_eq!(session.ads().gateway().commercial_calls, 0);

        assert!(session.next_level());
        assert_eq!(session.state.level_index, 1);
        assert_eq!(session.state.score, 0);
        session.state.score = 95;
        eat_next_tick(&mut session);
        assert_eq!(block_on(session.step()), GamePhase::LevelComplete);
        assert_eq!(session.ads().gateway().commercial_calls, 1);

        let names = events(&session);
        assert_eq!(
            names.iter().filter(|n| *n == "level_complete").count(),
            2
        );
    }

    #[test]
    fn test_running_past_the_last_level_is_victory() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_campaign();
        session.state.level_index = crate::sim::LEVELS.len() - 1;
        session.state.phase = GamePhase::LevelComplete;
        session.clear_timers();

        assert!(!session.next_level());
        assert_eq!(session.phase(), GamePhase::Victory);
        assert_eq!(session.timers(), Timers::default());
        assert!(events(&session).contains(&"campaign_complete".to_owned()));
    }

    #[test]
    fn test_offline_gateway_never_blocks_play() {
        let (mut session, _) = booted(FakeGateway::offline());
        assert!(!session.ads().is_ready());
        session.start_campaign();
        session.state.score = 40;
        crash_next_tick(&mut session);

        assert_eq!(block_on(session.step()), GamePhase::GameOver);
        assert!(!block_on(session.continue_with_ad()));
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.ads().gateway().events.is_empty());
        assert!(session.ads().queued() > 0);

        // Retry still works
        assert!(session.start_level());
        assert_eq!(session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_restart_time_attack_resets_countdown() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_time_attack();
        for _ in 0..5 {
            session.countdown_tick();
        }
        session.restart();
        assert_eq!(session.state.countdown.map(|c| c.remaining), Some(60));
        assert_eq!(
            session.timers(),
            Timers {
                simulation: true,
                countdown: true
            }
        );
        let names = events(&session);
        assert_eq!(names.iter().filter(|n| *n == "mode_selected").count(), 2);
    }

    #[test]
    fn test_quit_to_menu_stops_everything() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_campaign();
        session.quit_to_menu();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.timers(), Timers::default());
        assert_eq!(block_on(session.step()), GamePhase::Idle);
        assert_eq!(session.ads().gateway().gameplay, vec!["start", "stop"]);
    }

    #[test]
    fn test_turns_only_while_running() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.set_direction(Direction::Up);
        assert_eq!(session.input.turn, None);

        session.start_campaign();
        session.set_direction(Direction::Up);
        block_on(session.step());
        assert_eq!(session.state.snake.direction, Direction::Up);
        assert_eq!(session.state.snake.head(), IVec2::new(10, 9));
    }

    #[test]
    fn test_eating_saves_high_score_and_cues_sound() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_campaign();
        session.drain_cues();
        eat_next_tick(&mut session);
        block_on(session.step());

        assert_eq!(session.state.score, 10);
        assert_eq!(session.high_score(), 10);
        assert_eq!(session.storage.get_item(HIGH_SCORE_KEY).as_deref(), Some("10"));
        assert_eq!(
            session.drain_cues(),
            vec![Cue::Sound {
                effect: SoundEffect::Eat
            }]
        );
        assert!(events(&session).contains(&"high_score".to_owned()));
    }

    #[test]
    fn test_preferences_gate_cues_and_persist() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.set_sound_enabled(false);
        session.set_music_enabled(false);
        assert_eq!(
            session.storage.get_item(MUSIC_ENABLED_KEY).as_deref(),
            Some("false")
        );
        session.drain_cues();

        session.start_campaign();
        eat_next_tick(&mut session);
        block_on(session.step());
        assert!(session.drain_cues().is_empty());

        // A new session picks the stored preferences up
        let restored = Settings::load(&session.storage);
        assert!(!restored.sound_enabled);
        assert!(!restored.music_enabled);
    }

    #[test]
    fn test_session_end_tracked_on_shutdown() {
        let (mut session, clock) = booted(FakeGateway::ready());
        clock.advance(90_000);
        session.shutdown();
        let gateway = session.ads().gateway();
        let (name, payload) = gateway.events.last().unwrap();
        assert_eq!(name, "session_end");
        assert_eq!(payload["duration"], 90);
    }

    #[test]
    fn test_snapshot_reflects_session() {
        let (mut session, _) = booted(FakeGateway::ready());
        session.start_time_attack();
        let snap = session.snapshot();
        assert_eq!(snap.phase, GamePhase::Running);
        assert_eq!(snap.time_remaining, Some(60));
        assert_eq!(snap.snake.len(), 3);
    }
}
