//! Silicon Requiem - a first-person raycasting shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (levels, AI, combat, particles, tick)
//! - `renderer`: Raycasting rasterizer and WebGPU presentation
//! - `game`: Mode state machine driving update/render each frame
//! - `input`: Polled input buffer fed by host events
//! - `audio`: Audio trigger interface and the Web Audio backend

pub mod audio;
pub mod error;
pub mod game;
pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{AssetError, LevelError, SetupError};
pub use game::{Game, GameMode, Snapshot};
pub use settings::{QualityPreset, Settings};

use serde::{Deserialize, Serialize};

/// Game configuration constants
///
/// Time is in milliseconds, distance in grid units.
pub mod consts {
    use std::f32::consts::PI;

    /// Longest frame the orchestrator will simulate in one step
    pub const MAX_FRAME_MS: f32 = 100.0;
    /// Delay before level-complete advances to the next level
    pub const LEVEL_COMPLETE_DELAY_MS: f32 = 3000.0;
    /// Delay before menu music (re)starts
    pub const MENU_MUSIC_DELAY_MS: f32 = 100.0;

    /// Player defaults
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_START_SOUL: f32 = 50.0;
    pub const PLAYER_MAX_SOUL: f32 = 100.0;
    pub const MAX_MEMORY_FRAGMENTS: u32 = 3;
    pub const GROUND_HEIGHT: f32 = 0.5;

    /// Movement (units/ms)
    pub const MOVE_SPEED: f32 = 0.005;
    pub const WALL_RUN_SPEED: f32 = 0.008;
    /// Radians of yaw per pixel of mouse movement
    pub const MOUSE_YAW_PER_PIXEL: f32 = 0.003;
    pub const GRAVITY: f32 = 0.0005;
    pub const JUMP_VELOCITY: f32 = 0.01;
    pub const WALL_JUMP_VELOCITY: f32 = 0.015;

    /// Dash
    pub const DASH_DISTANCE: f32 = 0.8;
    pub const DASH_DISTANCE_HOOKED: f32 = 1.2;
    pub const DASH_COOLDOWN_MS: f32 = 1000.0;
    pub const DASH_COOLDOWN_HOOKED_MS: f32 = 800.0;

    /// Wall-run
    pub const WALL_RUN_PROBE: f32 = 0.6;
    pub const MAX_WALL_RUN_MS: f32 = 3000.0;

    /// Time slow ability
    pub const TIME_SLOW_COST: f32 = 30.0;
    pub const TIME_SLOW_COOLDOWN_MS: f32 = 5000.0;
    pub const TIME_SLOW_DURATION_MS: f32 = 3000.0;
    pub const TIME_SLOW_FACTOR: f32 = 0.5;

    /// Soul energy regeneration per ms
    pub const SOUL_REGEN_PER_MS: f32 = 0.01;

    /// Weapon view model frame duration
    pub const WEAPON_FRAME_MS: f32 = 60.0;
    pub const WEAPON_ANIM_FRAMES: u8 = 4;

    /// Interaction ranges
    pub const PICKUP_RANGE: f32 = 2.0;
    pub const PICKUP_AIM_CONE: f32 = 0.2;
    pub const PROXIMITY_RANGE: f32 = 1.2;

    /// Enemy AI
    pub const VIEW_DISTANCE: f32 = 8.0;
    pub const ATTACK_DISTANCE: f32 = 2.0;
    pub const ATTACK_EXIT_FACTOR: f32 = 1.5;
    pub const PATROL_SPEED: f32 = 0.001;
    pub const CHASE_SPEED: f32 = 0.003;
    pub const PATROL_ARRIVE_RADIUS: f32 = 0.5;
    pub const LOST_SIGHT_MS: f64 = 3000.0;
    pub const ATTACK_COOLDOWN_MS: f32 = 1000.0;
    pub const PATROL_START_CHANCE: f32 = 0.001;
    pub const CHANT_CHANCE_PER_MS: f32 = 0.0005;

    /// Combat
    pub const HIT_RADIUS: f32 = 0.5;
    pub const MELEE_RANGE: f32 = 1.0;
    pub const OBJECTIVE_SCORE: u64 = 500;
    pub const ARTIFACT_SECRET_SCORE: u64 = 250;
    pub const WEAPON_UPGRADE_BONUS: f32 = 0.1;
    pub const GRAVITY_PULL_DISTANCE: f32 = 1.0;

    /// Raycaster
    pub const FOV: f32 = PI / 3.0;
    pub const RAY_COUNT: usize = 320;
    pub const RAY_STEP: f32 = 0.02;
    pub const MAX_RENDER_DISTANCE: f32 = 20.0;
    pub const MIN_CORRECTED_DISTANCE: f32 = 1e-3;
    pub const BRIGHTNESS_FALLOFF: f32 = 15.0;
    pub const MIN_BRIGHTNESS: f32 = 0.2;
    pub const PARTICLE_DRAW_DISTANCE: f32 = 10.0;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// 8-bit RGB colour shared by particles, lights and the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::hex(0xffffff);
    pub const BLACK: Rgb = Rgb::hex(0x000000);

    /// Build from a 0xRRGGBB literal
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Multiply each channel by `factor` (clamped to 0..=1)
    pub fn scale(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
        }
    }

    /// Linear blend toward `other` by `t` (0 = self, 1 = other)
    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    /// Saturating add, used for light tints
    pub fn add(self, other: Rgb) -> Self {
        Self {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_range() {
        assert!((normalize_angle(PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-4);
        assert!((normalize_angle(0.5 + 4.0 * PI) - 0.5).abs() < 1e-4);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_rgb_hex_and_scale() {
        let c = Rgb::hex(0x9932cc);
        assert_eq!((c.r, c.g, c.b), (0x99, 0x32, 0xcc));
        assert_eq!(Rgb::WHITE.scale(0.0), Rgb::BLACK);
        assert_eq!(Rgb::WHITE.scale(2.0), Rgb::WHITE);
    }
}
