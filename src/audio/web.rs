//! Web Audio backend
//!
//! Procedurally generated cues and drones, no sample files. Every cue is a
//! handful of oscillators with exponential gain envelopes routed through a
//! music or effects bus.

use std::collections::HashMap;

use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

use super::{AmbientTrack, AudioSink, SoundCue};

/// A partial of a looping drone: frequency, waveform, level
type Partial = (f32, OscillatorType, f32);

struct Voice {
    osc: OscillatorNode,
    gain: GainNode,
}

pub struct WebAudio {
    ctx: Option<AudioContext>,
    music_bus: Option<GainNode>,
    sfx_bus: Option<GainNode>,
    music_volume: f32,
    sfx_volume: f32,
    loops: HashMap<AmbientTrack, Vec<Voice>>,
}

impl Default for WebAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudio {
    pub fn new() -> Self {
        // Fails outside secure contexts
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let music_bus = ctx.as_ref().and_then(|c| Self::create_bus(c, 0.6));
        let sfx_bus = ctx.as_ref().and_then(|c| Self::create_bus(c, 0.8));
        Self {
            ctx,
            music_bus,
            sfx_bus,
            music_volume: 0.6,
            sfx_volume: 0.8,
            loops: HashMap::new(),
        }
    }

    fn create_bus(ctx: &AudioContext, volume: f32) -> Option<GainNode> {
        let bus = ctx.create_gain().ok()?;
        bus.gain().set_value(volume);
        bus.connect_with_audio_node(&ctx.destination()).ok()?;
        Some(bus)
    }

    /// Resume the context (browsers require a user gesture first)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx
            && ctx.state() == web_sys::AudioContextState::Suspended
        {
            let _ = ctx.resume();
        }
    }

    fn create_osc(
        ctx: &AudioContext,
        bus: &AudioNode,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;
        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(bus).ok()?;
        Some((osc, gain))
    }

    /// Single enveloped tone, optionally sweeping to `end_freq`
    #[allow(clippy::too_many_arguments)]
    fn tone(
        ctx: &AudioContext,
        bus: &AudioNode,
        freq: f32,
        end_freq: Option<f32>,
        osc_type: OscillatorType,
        level: f32,
        delay: f64,
        length: f64,
    ) {
        let Some((osc, gain)) = Self::create_osc(ctx, bus, freq, osc_type) else {
            log::debug!("Oscillator creation failed");
            return;
        };
        let t = ctx.current_time() + delay;
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + length)
            .ok();
        if let Some(end) = end_freq {
            osc.frequency().set_value_at_time(freq, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(end, t + length)
                .ok();
        }
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + length + 0.05).ok();
    }

    fn play_cue(ctx: &AudioContext, bus: &AudioNode, cue: SoundCue) {
        use OscillatorType::{Sawtooth, Sine, Square, Triangle};
        match cue {
            SoundCue::WeaponFire => {
                Self::tone(ctx, bus, 900.0, Some(120.0), Sawtooth, 0.3, 0.0, 0.12);
                Self::tone(ctx, bus, 80.0, None, Sine, 0.3, 0.0, 0.08);
            }
            SoundCue::LaserImpactEcho => {
                Self::tone(ctx, bus, 1400.0, Some(300.0), Square, 0.12, 0.0, 0.1);
                Self::tone(ctx, bus, 1400.0, Some(300.0), Square, 0.05, 0.12, 0.1);
            }
            SoundCue::EnemyDeath => {
                Self::tone(ctx, bus, 300.0, Some(30.0), Sawtooth, 0.4, 0.0, 0.5);
                Self::tone(ctx, bus, 2000.0, Some(200.0), Square, 0.1, 0.0, 0.2);
            }
            SoundCue::Dash => {
                Self::tone(ctx, bus, 200.0, Some(800.0), Triangle, 0.3, 0.0, 0.15);
            }
            SoundCue::MemoryRecovered => {
                for (i, freq) in [600.0, 800.0, 1000.0].into_iter().enumerate() {
                    Self::tone(ctx, bus, freq, None, Sine, 0.25, i as f64 * 0.08, 0.15);
                }
            }
            SoundCue::CoreDeactivated => {
                Self::tone(ctx, bus, 400.0, Some(40.0), Sine, 0.5, 0.0, 1.2);
                Self::tone(ctx, bus, 60.0, None, Sawtooth, 0.2, 0.0, 0.8);
            }
            SoundCue::WallRunStart => {
                Self::tone(ctx, bus, 150.0, Some(300.0), Square, 0.15, 0.0, 0.2);
            }
            SoundCue::WallJump => {
                Self::tone(ctx, bus, 250.0, Some(700.0), Triangle, 0.3, 0.0, 0.2);
            }
            SoundCue::TimeSlowActivated => {
                Self::tone(ctx, bus, 800.0, Some(100.0), Sine, 0.4, 0.0, 0.9);
                Self::tone(ctx, bus, 804.0, Some(98.0), Sine, 0.3, 0.0, 0.9);
            }
            SoundCue::LevelComplete => {
                for (i, freq) in [400.0, 500.0, 600.0, 800.0].into_iter().enumerate() {
                    Self::tone(ctx, bus, freq, None, Triangle, 0.3, i as f64 * 0.1, 0.4);
                }
            }
            SoundCue::GravityHookAcquired => {
                for (i, freq) in [300.0, 450.0, 675.0].into_iter().enumerate() {
                    Self::tone(ctx, bus, freq, None, Square, 0.15, i as f64 * 0.1, 0.3);
                }
            }
        }
    }

    fn partials(track: AmbientTrack) -> &'static [Partial] {
        use OscillatorType::{Sawtooth, Sine, Square, Triangle};
        match track {
            AmbientTrack::MenuSuspense => &[(55.0, Sine, 0.3), (82.4, Triangle, 0.1)],
            AmbientTrack::Level1Background => &[(65.4, Sine, 0.25), (98.0, Triangle, 0.1)],
            AmbientTrack::IndustrialMetal => &[(41.2, Sawtooth, 0.12), (61.7, Square, 0.05)],
            AmbientTrack::BinaryChants => &[(220.0, Triangle, 0.04), (330.0, Sine, 0.03)],
            AmbientTrack::ServerHum => &[(60.0, Sawtooth, 0.05), (120.0, Sine, 0.03)],
            AmbientTrack::DigitalWhispers => &[(1760.0, Sine, 0.01)],
            AmbientTrack::BrokenNeonBuzz => &[(120.0, Square, 0.03)],
            AmbientTrack::DistantScreams => &[(440.0, Sine, 0.01), (466.2, Sine, 0.01)],
            AmbientTrack::TrainRumble => &[(32.7, Sawtooth, 0.1)],
        }
    }

    fn bus_for(&self, track: AmbientTrack) -> Option<&GainNode> {
        if track.is_music() {
            self.music_bus.as_ref()
        } else {
            self.sfx_bus.as_ref()
        }
    }
}

impl AudioSink for WebAudio {
    fn play(&mut self, cue: SoundCue) {
        if self.sfx_volume <= 0.0 {
            return;
        }
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.sfx_bus) else {
            return;
        };
        self.resume();
        Self::play_cue(ctx, bus, cue);
    }

    fn play_loop(&mut self, track: AmbientTrack) {
        if self.loops.contains_key(&track) {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        let Some(bus) = self.bus_for(track).cloned() else {
            return;
        };
        self.resume();

        let t = ctx.current_time();
        let mut voices = Vec::new();
        for &(freq, osc_type, level) in Self::partials(track) {
            let Some((osc, gain)) = Self::create_osc(&ctx, &bus, freq, osc_type) else {
                log::debug!("Loop voice for {:?} failed", track);
                continue;
            };
            // Fade in
            gain.gain().set_value_at_time(0.001, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(level, t + 1.5)
                .ok();
            osc.start().ok();
            voices.push(Voice { osc, gain });
        }
        log::debug!("Loop {:?} started", track);
        self.loops.insert(track, voices);
    }

    fn stop_loop(&mut self, track: AmbientTrack) {
        let Some(voices) = self.loops.remove(&track) else {
            return;
        };
        let t = self.ctx.as_ref().map(|c| c.current_time()).unwrap_or(0.0);
        for voice in voices {
            voice.gain.gain().set_value_at_time(voice.gain.gain().value(), t).ok();
            voice.gain
                .gain()
                .exponential_ramp_to_value_at_time(0.001, t + 0.3)
                .ok();
            voice.osc.stop_with_when(t + 0.35).ok();
        }
    }

    fn stop_all_loops(&mut self) {
        let tracks: Vec<AmbientTrack> = self.loops.keys().copied().collect();
        for track in tracks {
            self.stop_loop(track);
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if let Some(bus) = &self.music_bus {
            bus.gain().set_value(self.music_volume);
        }
    }

    fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
        if let Some(bus) = &self.sfx_bus {
            bus.gain().set_value(self.sfx_volume);
        }
    }
}
