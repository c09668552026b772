//! Audio cues
//!
//! Procedurally generated sound effects and chiptune loops - no external
//! files needed. The cue tables are plain data so the session can decide
//! what to play on any target; `AudioManager` renders them with the Web
//! Audio API in the browser.

use serde::Serialize;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    /// Food eaten
    Eat,
    /// Power-up collected or revive
    PowerUp,
    /// Snake crashed
    Die,
    /// Level complete, victory or time up
    Victory,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// One oscillator blip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub wave: Waveform,
    /// Length in seconds
    pub duration: f64,
    /// Exponential slide target over the tone's length
    pub slide_to: Option<f32>,
    /// Start offset from the trigger
    pub delay_ms: u32,
}

const fn tone(freq: f32, wave: Waveform, duration: f64, slide_to: Option<f32>, delay_ms: u32) -> Tone {
    Tone {
        freq,
        wave,
        duration,
        slide_to,
        delay_ms,
    }
}

const EAT: [Tone; 1] = [tone(600.0, Waveform::Sine, 0.1, Some(800.0), 0)];
const POWER_UP: [Tone; 2] = [
    tone(400.0, Waveform::Square, 0.1, Some(600.0), 0),
    tone(600.0, Waveform::Square, 0.2, Some(1200.0), 100),
];
const DIE: [Tone; 1] = [tone(200.0, Waveform::Sawtooth, 0.3, Some(50.0), 0)];
const VICTORY: [Tone; 4] = [
    tone(440.0, Waveform::Square, 0.2, None, 0),
    tone(554.0, Waveform::Square, 0.2, None, 150),
    tone(659.0, Waveform::Square, 0.2, None, 300),
    tone(880.0, Waveform::Square, 0.2, None, 450),
];

impl SoundEffect {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            SoundEffect::Eat => &EAT,
            SoundEffect::PowerUp => &POWER_UP,
            SoundEffect::Die => &DIE,
            SoundEffect::Victory => &VICTORY,
        }
    }
}

/// Background loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicTrack {
    Menu,
    Game,
}

// Pentatonic-ish scales
const MENU_NOTES: [f32; 8] = [262.0, 294.0, 330.0, 392.0, 440.0, 523.0, 587.0, 659.0];
const GAME_NOTES: [f32; 8] = [330.0, 392.0, 440.0, 523.0, 587.0, 659.0, 784.0, 880.0];
const GAME_PATTERN: [usize; 8] = [0, 2, 4, 2, 0, 4, 2, 5];

impl MusicTrack {
    /// Beats per minute
    pub fn tempo(self) -> f64 {
        match self {
            MusicTrack::Menu => 100.0,
            MusicTrack::Game => 140.0,
        }
    }

    fn beat_secs(self) -> f64 {
        60.0 / self.tempo()
    }

    /// Frequency of the `index`-th note of the loop
    pub fn note(self, index: usize) -> f32 {
        match self {
            MusicTrack::Menu => MENU_NOTES[index % MENU_NOTES.len()],
            MusicTrack::Game => GAME_NOTES[GAME_PATTERN[index % GAME_PATTERN.len()]],
        }
    }

    /// How long each note sounds, in seconds
    pub fn note_secs(self) -> f64 {
        match self {
            MusicTrack::Menu => self.beat_secs() * 0.8,
            MusicTrack::Game => self.beat_secs() * 0.5,
        }
    }

    /// Gap between note starts, in seconds (game music runs at eighths)
    pub fn step_secs(self) -> f64 {
        match self {
            MusicTrack::Menu => self.beat_secs(),
            MusicTrack::Game => self.beat_secs() * 0.5,
        }
    }
}

/// Walks a track note by note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sequencer {
    pub track: MusicTrack,
    index: usize,
}

impl Sequencer {
    pub fn new(track: MusicTrack) -> Self {
        Self { track, index: 0 }
    }

    /// Next (frequency, duration) pair
    pub fn next_note(&mut self) -> (f32, f64) {
        let note = (self.track.note(self.index), self.track.note_secs());
        self.index += 1;
        note
    }
}

#[cfg(target_arch = "wasm32")]
pub use web_audio::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web_audio {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{MusicTrack, Sequencer, SoundEffect, Tone, Waveform};

    const SFX_VOLUME: f32 = 0.3;
    const MUSIC_VOLUME: f32 = 0.15;
    /// How far ahead music notes are queued on the audio clock
    const LOOKAHEAD_SECS: f64 = 0.3;

    /// Plays cues through a single AudioContext
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        music: Option<Sequencer>,
        next_note_at: f64,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                music: None,
                next_note_at: 0.0,
            }
        }

        /// Resume audio context (required after user gesture)
        fn wake(ctx: &AudioContext) {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }

        pub fn play(&self, effect: SoundEffect) {
            let Some(ctx) = &self.ctx else { return };
            Self::wake(ctx);
            for tone in effect.tones() {
                Self::play_tone(ctx, tone);
            }
        }

        /// Switch loops; `None` stops the music
        pub fn set_music(&mut self, track: Option<MusicTrack>) {
            self.music = track.map(Sequencer::new);
            if let Some(ctx) = &self.ctx {
                self.next_note_at = ctx.current_time();
            }
        }

        /// Queue upcoming music notes. Call every frame.
        pub fn pump_music(&mut self) {
            let (Some(ctx), Some(seq)) = (&self.ctx, self.music.as_mut()) else {
                return;
            };
            Self::wake(ctx);
            let now = ctx.current_time();
            if self.next_note_at < now {
                self.next_note_at = now;
            }
            while self.next_note_at < now + LOOKAHEAD_SECS {
                let (freq, duration) = seq.next_note();
                Self::play_note(ctx, freq, duration, self.next_note_at);
                self.next_note_at += seq.track.step_secs();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(ctx: &AudioContext, tone: &Tone) {
            let osc_type = match tone.wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            };
            let Some((osc, gain)) = Self::create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + f64::from(tone.delay_ms) / 1000.0;

            osc.frequency().set_value_at_time(tone.freq, t).ok();
            if let Some(slide) = tone.slide_to {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(slide, t + tone.duration)
                    .ok();
            }
            gain.gain().set_value_at_time(SFX_VOLUME, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + tone.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration).ok();
        }

        /// Soft sine note with attack and release
        fn play_note(ctx: &AudioContext, freq: f32, duration: f64, t: f64) {
            let Some((osc, gain)) = Self::create_osc(ctx, freq, OscillatorType::Sine) else {
                return;
            };
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(MUSIC_VOLUME, t + 0.05)
                .ok();
            gain.gain()
                .linear_ramp_to_value_at_time(MUSIC_VOLUME * 0.7, t + duration * 0.5)
                .ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.0, t + duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + duration).ok();
        }
    }
}
