//! Rendering
//!
//! A software raycaster draws each frame into a [`Framebuffer`]; on the web
//! the [`FramePresenter`] uploads it to a wgpu texture and blits it to the
//! canvas. Rendering only ever reads the game state.

pub mod assets;
pub mod framebuffer;
pub mod hud;
pub mod present;
pub mod raycast;
pub mod sprites;

pub use assets::{AssetRegistry, AssetRequest, SpriteId};
pub use framebuffer::Framebuffer;
pub use present::FramePresenter;

use crate::consts::RAY_COUNT;
use crate::settings::Settings;
use crate::sim::{GameMode, GameState};

/// Per-frame render pass over a read-only game state
#[derive(Debug)]
pub struct Renderer {
    /// Corrected wall distance per ray, rebuilt every frame
    depth: Vec<f32>,
    pub assets: AssetRegistry,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            depth: vec![f32::INFINITY; RAY_COUNT],
            assets: AssetRegistry::new(),
        }
    }

    /// Draw one frame. `time` is the host clock in ms and only drives animation.
    pub fn render(&mut self, state: &GameState, fb: &mut Framebuffer, time: f64, settings: &Settings) {
        if state.mode == GameMode::Menu {
            hud::draw_menu_background(fb, time);
            return;
        }

        let pos = state.player_pos();
        let dir = state.player.dir;
        raycast::draw_ceiling(fb);
        raycast::draw_floor(fb, &state.level, pos, dir);
        raycast::draw_walls(fb, &state.level, pos, dir, time, &mut self.depth);

        sprites::draw_pickups(fb, state, &self.depth, time);
        sprites::draw_enemies(fb, state, &self.depth, &self.assets, time);
        sprites::draw_projectiles(fb, state, &self.depth);
        sprites::draw_particles(fb, state, &self.depth, settings.quality.max_particles());

        hud::draw_status(fb, state);
        if settings.show_minimap {
            hud::draw_minimap(fb, state);
        }
        hud::draw_weapon(fb, state, &self.assets);
        hud::draw_mode_tint(fb, state.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Campaign;
    use crate::sim::LevelProvider;

    fn playing_state() -> GameState {
        let mut state = GameState::new(9);
        state.load_level(Campaign.load(1).unwrap());
        state.mode = GameMode::Playing;
        state
    }

    #[test]
    fn test_render_does_not_mutate_state() {
        let state = playing_state();
        let before = state.clone();
        let mut renderer = Renderer::new();
        let mut fb = Framebuffer::new(160, 120);
        renderer.render(&state, &mut fb, 1234.0, &Settings::default());
        assert_eq!(state.player, before.player);
        assert_eq!(state.enemies, before.enemies);
        assert_eq!(state.particles.len(), before.particles.len());
    }

    #[test]
    fn test_playing_frame_is_drawn() {
        let state = playing_state();
        let mut renderer = Renderer::new();
        renderer.assets.install_fallbacks();
        let mut fb = Framebuffer::new(160, 120);
        renderer.render(&state, &mut fb, 0.0, &Settings::default());
        let distinct: std::collections::HashSet<u32> = fb.pixels.iter().copied().collect();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn test_pause_darkens_frame() {
        let mut state = playing_state();
        let mut renderer = Renderer::new();
        let settings = Settings {
            show_minimap: false,
            ..Settings::default()
        };
        let mut playing = Framebuffer::new(80, 60);
        renderer.render(&state, &mut playing, 0.0, &settings);
        state.mode = GameMode::Paused;
        let mut paused = Framebuffer::new(80, 60);
        renderer.render(&state, &mut paused, 0.0, &settings);

        let sum = |fb: &Framebuffer| -> u64 {
            fb.pixels
                .iter()
                .map(|&p| {
                    let c = framebuffer::unpack(p);
                    c.r as u64 + c.g as u64 + c.b as u64
                })
                .sum()
        };
        assert!(sum(&paused) < sum(&playing));
    }

    #[test]
    fn test_menu_draws_background_only() {
        let state = GameState::new(1);
        let mut renderer = Renderer::new();
        let mut fb = Framebuffer::new(64, 48);
        renderer.render(&state, &mut fb, 0.0, &Settings::default());
        // Centre of the radial gradient
        assert_eq!(fb.get(32, 24).map(|c| c.b > c.r), Some(true));
    }
}
