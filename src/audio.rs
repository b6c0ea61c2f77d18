//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!

use crate::session::{SessionEvent, View};
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Valid packet clicked
    Catch,
    /// Valid packet reached the floor
    Miss,
    /// Corrupted packet clicked
    Corrupted,
    /// Countdown started
    Countdown,
    /// Round started
    Go,
    /// Round over
    GameOver,
}

impl SoundEffect {
    /// Effect to play for a session event, if any
    pub fn for_event(event: &SessionEvent) -> Option<Self> {
        match event {
            SessionEvent::Game(GameEvent::Caught { .. }) => Some(SoundEffect::Catch),
            SessionEvent::Game(GameEvent::Landed { valid: true, .. }) => Some(SoundEffect::Miss),
            SessionEvent::Game(GameEvent::Corrupted { .. }) => Some(SoundEffect::Corrupted),
            SessionEvent::ViewChanged(View::Countdown { .. }) => Some(SoundEffect::Countdown),
            SessionEvent::RoundStarted { .. } => Some(SoundEffect::Go),
            SessionEvent::RoundOver { .. } => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use manager::AudioManager;

#[cfg(target_arch = "wasm32")]
mod manager {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        pub fn is_muted(&self) -> bool {
            self.muted
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Catch => self.play_catch(ctx, vol),
                SoundEffect::Miss => self.play_miss(ctx, vol),
                SoundEffect::Corrupted => self.play_corrupted(ctx, vol),
                SoundEffect::Countdown => self.play_countdown(ctx, vol),
                SoundEffect::Go => self.play_go(ctx, vol),
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
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

        /// Short decaying note starting `delay` seconds from now
        fn note(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
            level: f32,
            delay: f64,
            len: f64,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        /// Catch - bright two-note ding
        fn play_catch(&self, ctx: &AudioContext, vol: f32) {
            self.note(ctx, 880.0, OscillatorType::Sine, vol * 0.3, 0.0, 0.08);
            self.note(ctx, 1320.0, OscillatorType::Sine, vol * 0.25, 0.05, 0.12);
        }

        /// Miss - dull thump
        fn play_miss(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(70.0, t + 0.15)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.2).ok();
        }

        /// Corrupted - harsh buzz
        fn play_corrupted(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                .ok();
            osc.frequency().set_value_at_time(120.0, t).ok();
            osc.frequency().set_value_at_time(90.0, t + 0.1).ok();
            osc.frequency().set_value_at_time(60.0, t + 0.2).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.4).ok();
        }

        /// Countdown - three beeps, one per second
        fn play_countdown(&self, ctx: &AudioContext, vol: f32) {
            for i in 0..3 {
                self.note(ctx, 440.0, OscillatorType::Square, vol * 0.15, i as f64, 0.12);
            }
        }

        /// Go - rising chirp
        fn play_go(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 440.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency().set_value_at_time(440.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(880.0, t + 0.2)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Game over - sad descending
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                self.note(ctx, *freq, OscillatorType::Sine, vol * 0.3, 0.3 + i as f64 * 0.2, 0.3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{EndReason, ScoreSubmission};
    use crate::session::LeaderboardTicket;

    #[test]
    fn test_event_sounds() {
        let caught = SessionEvent::Game(GameEvent::Caught { id: 1, lane: 0 });
        assert_eq!(SoundEffect::for_event(&caught), Some(SoundEffect::Catch));

        let missed = SessionEvent::Game(GameEvent::Landed {
            id: 1,
            lane: 0,
            valid: true,
            y: 400.0,
        });
        assert_eq!(SoundEffect::for_event(&missed), Some(SoundEffect::Miss));

        let over = SessionEvent::RoundOver {
            submission: ScoreSubmission::new("Ada", 10, EndReason::ClickedRed),
            ticket: LeaderboardTicket(1),
        };
        assert_eq!(SoundEffect::for_event(&over), Some(SoundEffect::GameOver));
    }

    #[test]
    fn test_silent_events() {
        let discarded = SessionEvent::Game(GameEvent::Landed {
            id: 1,
            lane: 0,
            valid: false,
            y: 400.0,
        });
        assert_eq!(SoundEffect::for_event(&discarded), None);
        assert_eq!(SoundEffect::for_event(&SessionEvent::ViewChanged(View::Name)), None);
    }
}
