//! Audio triggers
//!
//! The simulation only names what should be heard. An [`AudioSink`] turns
//! the names into sound; it must never fail outward or block.

use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

/// One-shot sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    WeaponFire,
    /// Projectile hit a wall
    LaserImpactEcho,
    EnemyDeath,
    Dash,
    MemoryRecovered,
    /// Sacred core shut down or a scripted door opened
    CoreDeactivated,
    WallRunStart,
    WallJump,
    TimeSlowActivated,
    LevelComplete,
    GravityHookAcquired,
}

/// Looping music and ambience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientTrack {
    MenuSuspense,
    Level1Background,
    IndustrialMetal,
    BinaryChants,
    ServerHum,
    DigitalWhispers,
    BrokenNeonBuzz,
    DistantScreams,
    TrainRumble,
}

impl AmbientTrack {
    /// Music follows the music volume, everything else the effects volume
    pub fn is_music(self) -> bool {
        matches!(
            self,
            AmbientTrack::MenuSuspense | AmbientTrack::Level1Background | AmbientTrack::IndustrialMetal
        )
    }
}

/// Fire-and-forget audio collaborator
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    /// Start a loop; a loop that is already playing keeps playing
    fn play_loop(&mut self, track: AmbientTrack);
    fn stop_loop(&mut self, track: AmbientTrack);
    fn stop_all_loops(&mut self);
    /// 0.0 - 1.0
    fn set_music_volume(&mut self, volume: f32);
    /// 0.0 - 1.0
    fn set_sfx_volume(&mut self, volume: f32);
}

/// Silent sink for headless runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
    fn play_loop(&mut self, _track: AmbientTrack) {}
    fn stop_loop(&mut self, _track: AmbientTrack) {}
    fn stop_all_loops(&mut self) {}
    fn set_music_volume(&mut self, _volume: f32) {}
    fn set_sfx_volume(&mut self, _volume: f32) {}
}
