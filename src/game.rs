//! Game orchestrator
//!
//! Owns the one `GameState`, turns polled input into ticks, runs the mode
//! state machine and renders every frame:
//!
//! ```text
//! Menu -> Playing <-> Paused
//!            |-> Dead -> (restart) Playing
//!            '-> LevelComplete -(3 s)-> Playing (next level)
//! ```
//!
//! Delayed transitions are countdown fields advanced by `frame`, so dropping
//! or shutting down the orchestrator cancels them.

use std::ops::Deref;
use std::sync::Arc;

use crate::audio::{AmbientTrack, AudioSink};
use crate::consts::*;
use crate::input::{InputSnapshot, Key};
use crate::renderer::{Framebuffer, Renderer};
use crate::settings::Settings;
use crate::sim::{GameState, LevelProvider, TickInput, tick};

pub use crate::sim::GameMode;

/// Initial framebuffer size before the host reports a viewport
const DEFAULT_VIEW: (u32, u32) = (320, 200);

/// Immutable view of the game state handed to the UI layer
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<GameState>);

impl Deref for Snapshot {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        &self.0
    }
}

pub struct Game {
    state: GameState,
    provider: Box<dyn LevelProvider>,
    audio: Box<dyn AudioSink>,
    pub renderer: Renderer,
    framebuffer: Framebuffer,
    pub settings: Settings,
    /// Remaining ms before the next level loads
    level_complete_timer: Option<f32>,
    /// Remaining ms before menu music starts
    menu_music_timer: Option<f32>,
    /// Host clock for animation, advanced by the clamped frame time
    clock: f64,
    alive: bool,
    campaign_complete: bool,
}

impl Game {
    pub fn new(provider: Box<dyn LevelProvider>, audio: Box<dyn AudioSink>, seed: u64) -> Self {
        log::info!("Game created with seed {}", seed);
        Self {
            state: GameState::new(seed),
            provider,
            audio,
            renderer: Renderer::new(),
            framebuffer: Framebuffer::new(DEFAULT_VIEW.0, DEFAULT_VIEW.1),
            settings: Settings::default(),
            level_complete_timer: None,
            menu_music_timer: Some(MENU_MUSIC_DELAY_MS),
            clock: 0.0,
            alive: true,
            campaign_complete: false,
        }
    }

    /// Apply settings and push the volumes to the audio sink
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.audio
            .set_music_volume(self.settings.effective_music_volume());
        self.audio.set_sfx_volume(self.settings.sfx_volume);
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_campaign_complete(&self) -> bool {
        self.campaign_complete
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Resize the raster for a viewport in device pixels, honouring the
    /// quality preset's render scale
    pub fn resize(&mut self, width: u32, height: u32) {
        let scale = self.settings.quality.render_scale().max(1);
        if self.framebuffer.resize(width / scale, height / scale) {
            log::debug!(
                "Framebuffer {}x{} for {}x{} viewport",
                self.framebuffer.width,
                self.framebuffer.height,
                width,
                height
            );
        }
    }

    /// Leave the menu and load level 1
    pub fn start(&mut self) {
        if !self.alive {
            return;
        }
        self.menu_music_timer = None;
        self.campaign_complete = false;
        if !self.enter_level(1) {
            log::error!("Campaign has no first level");
        }
    }

    /// Throw the run away and start again from level 1 with a fresh seed
    pub fn restart(&mut self) {
        if !self.alive {
            return;
        }
        let seed = self.state.seed.wrapping_add(1);
        log::info!("Restarting with seed {}", seed);
        self.state = GameState::new(seed);
        self.level_complete_timer = None;
        self.start();
    }

    /// Mark the orchestrator torn down; later calls do nothing
    pub fn shutdown(&mut self) {
        self.alive = false;
        self.level_complete_timer = None;
        self.menu_music_timer = None;
        self.audio.stop_all_loops();
        log::info!("Game shut down");
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.settings.music_volume = volume.clamp(0.0, 1.0);
        self.audio
            .set_music_volume(self.settings.effective_music_volume());
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.settings.sfx_volume = volume.clamp(0.0, 1.0);
        self.audio.set_sfx_volume(self.settings.sfx_volume);
    }

    /// Read-only copy of the current state for the UI layer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::new(self.state.clone()))
    }

    /// One host frame: handle mode keys, tick if playing, run countdowns,
    /// then render
    pub fn frame(&mut self, dt: f32, input: &InputSnapshot) {
        if !self.alive {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.clock += dt as f64;

        if let Some(remaining) = self.menu_music_timer.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.menu_music_timer = None;
                if self.state.mode == GameMode::Menu {
                    self.audio.play_loop(AmbientTrack::MenuSuspense);
                }
            }
        }

        if input.just_pressed(Key::Escape) {
            self.toggle_pause();
        }
        if input.just_pressed(Key::R) && self.state.mode == GameMode::Dead {
            self.restart();
        }

        if self.state.mode == GameMode::Playing {
            let before = self.state.mode;
            let commands = self.tick_input(input);
            tick(&mut self.state, &commands, dt, self.audio.as_mut());
            if self.state.mode != before {
                self.on_mode_change(self.state.mode);
            }
        }

        if self.state.mode == GameMode::LevelComplete
            && let Some(remaining) = self.level_complete_timer.as_mut()
        {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.level_complete_timer = None;
                let next = self.state.current_level + 1;
                if !self.enter_level(next) {
                    self.campaign_complete = true;
                    log::info!("Campaign complete, final score {}", self.state.score);
                }
            }
        }

        self.renderer.render(
            &self.state,
            &mut self.framebuffer,
            self.clock,
            &self.settings,
        );
    }

    fn toggle_pause(&mut self) {
        match self.state.mode {
            GameMode::Playing => {
                self.state.mode = GameMode::Paused;
                log::info!("Paused");
            }
            GameMode::Paused => {
                self.state.mode = GameMode::Playing;
                log::info!("Resumed");
            }
            _ => {}
        }
    }

    /// Pause from outside (tab hidden, window blur)
    pub fn pause(&mut self) {
        if self.state.mode == GameMode::Playing {
            self.toggle_pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state.mode == GameMode::Paused {
            self.toggle_pause();
        }
    }

    fn tick_input(&self, input: &InputSnapshot) -> TickInput {
        TickInput {
            forward: input.held(Key::W),
            back: input.held(Key::S),
            strafe_left: input.held(Key::A),
            strafe_right: input.held(Key::D),
            dash: input.held(Key::ShiftLeft),
            jump: input.held(Key::Space),
            fire: input.mouse_left,
            interact: input.just_pressed(Key::E),
            time_slow: input.just_pressed(Key::Q),
            select_weapon: input.weapon_slot(),
            yaw_delta: input.mouse_delta.x * self.settings.mouse_sensitivity,
        }
    }

    fn on_mode_change(&mut self, mode: GameMode) {
        log::info!("Mode changed to {:?}", mode);
        match mode {
            GameMode::Dead => self.audio.stop_all_loops(),
            GameMode::LevelComplete => {
                self.audio.stop_all_loops();
                self.level_complete_timer = Some(LEVEL_COMPLETE_DELAY_MS);
            }
            _ => {}
        }
    }

    /// Load level `number` and start its music. Returns false if the
    /// provider has no such level; the current mode is left as it was.
    fn enter_level(&mut self, number: u32) -> bool {
        let data = match self.provider.load(number) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Cannot enter level {}: {}", number, e);
                return false;
            }
        };
        self.state.load_level(data);
        self.level_complete_timer = None;

        self.audio.stop_all_loops();
        if let Some(music) = self.state.level.music {
            self.audio.play_loop(music);
        }
        for &track in &self.state.level.ambient {
            self.audio.play_loop(track);
        }
        true
    }
}
