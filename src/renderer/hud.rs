//! HUD overlays drawn into the framebuffer
//!
//! Text (score, level, objective descriptions) lives in the DOM; this module
//! only draws shapes: bars, pips, the crosshair, the minimap, the weapon view
//! model and the per-mode screen tints.

use glam::Vec2;

use super::assets::{AssetRegistry, SpriteId};
use super::framebuffer::{Framebuffer, unpack};
use crate::Rgb;
use crate::consts::*;
use crate::sim::level::InteractableKind;
use crate::sim::{GameMode, GameState};

const HEALTH_COLOR: Rgb = Rgb::hex(0xff0000);
const SOUL_COLOR: Rgb = Rgb::hex(0x9932cc);
const ACCENT: Rgb = Rgb::hex(0x00ffff);
const MINIMAP_SIZE: f32 = 150.0;

/// HUD pixel sizes are authored for a 600 px tall view
fn ui_scale(fb: &Framebuffer) -> f32 {
    (fb.height as f32 / 600.0).max(0.25)
}

fn px(value: f32, scale: f32) -> i32 {
    (value * scale).round() as i32
}

/// Filled bar with translucent backing and a one-pixel border
fn bar(fb: &mut Framebuffer, x: i32, y: i32, w: i32, h: i32, fraction: f32, color: Rgb) {
    fb.blend_rect(x, y, w, h, Rgb::BLACK, 0.5);
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    fb.fill_rect(x, y, (w as f32 * fraction) as i32, h, color);
    fb.stroke_rect(x, y, w, h, color);
}

/// Bars, pips, crosshair and cooldown indicators
pub fn draw_status(fb: &mut Framebuffer, state: &GameState) {
    let s = ui_scale(fb);
    let player = &state.player;
    let (w, h) = (fb.width as i32, fb.height as i32);

    bar(
        fb,
        px(20.0, s),
        px(20.0, s),
        px(200.0, s),
        px(20.0, s).max(2),
        player.health / player.max_health.max(1.0),
        HEALTH_COLOR,
    );
    bar(
        fb,
        px(20.0, s),
        px(50.0, s),
        px(200.0, s),
        px(20.0, s).max(2),
        player.soul_energy / player.max_soul_energy.max(1.0),
        SOUL_COLOR,
    );

    // Memory fragment pips
    let pip = px(12.0, s).max(2);
    for i in 0..player.max_memory_fragments {
        let x = px(20.0, s) + i as i32 * (pip + px(6.0, s));
        let y = px(84.0, s);
        if i < player.memory_fragments {
            fb.fill_rect(x, y, pip, pip, Rgb::hex(0x00ff00));
        } else {
            fb.stroke_rect(x, y, pip, pip, Rgb::hex(0x00ff00));
        }
    }

    // Objective pips down the right edge
    for (i, objective) in state.objectives.iter().enumerate() {
        let y = px(100.0, s) + i as i32 * px(14.0, s).max(3);
        let x = w - px(120.0, s);
        let color = if objective.completed {
            Rgb::hex(0x00ff00)
        } else {
            Rgb::WHITE
        };
        fb.stroke_rect(x, y, pip, pip, color);
        let fill = (pip as f32 * objective.fraction()) as i32;
        fb.fill_rect(x, y + pip - fill, pip, fill, color);
    }

    if player.dash_cooldown > 0.0 {
        let remaining = (player.dash_cooldown / DASH_COOLDOWN_MS).clamp(0.0, 1.0);
        let width = px(100.0, s);
        fb.blend_rect(
            w / 2 - width / 2,
            h - px(100.0, s),
            (width as f32 * (1.0 - remaining)) as i32,
            px(5.0, s).max(1),
            Rgb::hex(0xffff00),
            remaining.max(0.3),
        );
    }

    if player.time_slow_remaining > 0.0 {
        // Blue vignette bars top and bottom while enemies are slowed
        let t = (player.time_slow_remaining / TIME_SLOW_DURATION_MS).clamp(0.0, 1.0);
        let band = px(12.0, s).max(1);
        fb.blend_rect(0, 0, w, band, Rgb::hex(0x2060ff), 0.4 * t);
        fb.blend_rect(0, h - band, w, band, Rgb::hex(0x2060ff), 0.4 * t);
    }

    crosshair(fb, s);
}

fn crosshair(fb: &mut Framebuffer, s: f32) {
    let (cx, cy) = (fb.width as i32 / 2, fb.height as i32 / 2);
    let size = px(10.0, s).max(3);
    fb.line(cx - size, cy, cx + size, cy, ACCENT);
    fb.line(cx, cy - size, cx, cy + size, ACCENT);
    fb.fill_circle(cx as f32 + 0.5, cy as f32 + 0.5, (2.0 * s).max(1.0), ACCENT, 1.0);
}

/// First-person weapon, frame chosen by the fire animation
pub fn draw_weapon(fb: &mut Framebuffer, state: &GameState, assets: &AssetRegistry) {
    let (w, h) = (fb.width as f32, fb.height as f32);
    let frame = state.player.weapon_anim_frame.min(4) as u32;
    let draw_w = (w * 0.16).floor().max(1.0);

    let Some(sheet) = assets.sheet(SpriteId::Pistol) else {
        let draw_h = (draw_w * 0.75) as i32;
        let x = (w * 0.6 - draw_w / 2.0) as i32;
        let y = (h - draw_h as f32 * 0.7) as i32;
        fb.fill_rect(x, y, draw_w as i32, draw_h, SpriteId::Pistol.placeholder_color());
        return;
    };

    let (fw, fh) = sheet.frame_size();
    let draw_h = (draw_w * fh as f32 / fw.max(1) as f32).floor();
    let x0 = (w * 0.6 - draw_w / 2.0).floor() as i32;
    let y0 = (h - draw_h + draw_h * 0.3).round() as i32;
    for y in y0.max(0)..(y0 + draw_h as i32).min(fb.height as i32) {
        let v = (y - y0) as f32 / draw_h;
        for x in x0.max(0)..(x0 + draw_w as i32).min(fb.width as i32) {
            let u = (x - x0) as f32 / draw_w;
            if let Some(texel) = sheet.sample(frame, 0, u, v) {
                fb.set(x, y, unpack(texel));
            }
        }
    }
}

fn minimap_floor(tile: u8) -> Rgb {
    match tile {
        2 => Rgb::hex(0xcbbf9a),
        6 => Rgb::hex(0xb6fcb6),
        7 => Rgb::hex(0x80ffff),
        9 => Rgb::hex(0xffeeb3),
        _ => Rgb::hex(0xeaeaea),
    }
}

fn minimap_wall(tile: u8) -> Rgb {
    match tile {
        1 => Rgb::hex(0x338c33),
        2 => Rgb::hex(0x00ffff),
        3 => Rgb::hex(0x888888),
        4 => Rgb::hex(0xffe066),
        5 => Rgb::hex(0x993399),
        8 => Rgb::hex(0x7a3f00),
        _ => Rgb::hex(0xeaeaea),
    }
}

/// Top-down map in the lower left corner
pub fn draw_minimap(fb: &mut Framebuffer, state: &GameState) {
    let level = &state.level;
    let cols = level.walls.width().max(1);
    let s = ui_scale(fb);
    let size = MINIMAP_SIZE * s;
    let cell = size / cols as f32;
    let origin = Vec2::new(20.0 * s, fb.height as f32 - size - 20.0 * s);
    let border = px(4.0, s);

    fb.blend_rect(
        origin.x as i32 - border,
        origin.y as i32 - border,
        size as i32 + 2 * border,
        size as i32 + 2 * border,
        Rgb::hex(0x181818),
        0.85,
    );

    for (y, row) in level.walls.rows().enumerate() {
        for (x, &wall) in row.iter().enumerate() {
            let color = if wall != 0 {
                minimap_wall(wall)
            } else {
                minimap_floor(level.floors.get(x as i32, y as i32).unwrap_or(0))
            };
            let x0 = (origin.x + x as f32 * cell) as i32;
            let y0 = (origin.y + y as f32 * cell) as i32;
            let x1 = (origin.x + (x + 1) as f32 * cell) as i32;
            let y1 = (origin.y + (y + 1) as f32 * cell) as i32;
            fb.fill_rect(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1), color);
        }
    }

    let to_map = |p: Vec2| origin + p * cell;

    for enemy in state.enemies.iter().filter(|e| !e.is_dead()) {
        let p = to_map(enemy.pos.truncate());
        fb.fill_circle(p.x, p.y, (cell * 0.3).max(1.0), Rgb::hex(0xff2222), 1.0);
    }

    for reward in level
        .interactables
        .iter()
        .filter(|i| i.kind == InteractableKind::BossReward && !i.activated)
    {
        let p = to_map(reward.world_pos());
        fb.fill_circle(p.x, p.y, (cell * 0.35).max(1.0), Rgb::hex(0xffe066), 1.0);
        fb.fill_circle(p.x, p.y, (cell * 0.18).max(0.5), Rgb::hex(0x00eaff), 1.0);
    }

    let p = to_map(state.player_pos());
    let tip = p + state.player.facing() * (cell * 0.7).max(3.0);
    fb.fill_circle(p.x, p.y, (cell * 0.35).max(1.0), Rgb::hex(0x00ff00), 1.0);
    fb.line(p.x as i32, p.y as i32, tip.x as i32, tip.y as i32, Rgb::hex(0x00ff00));
}

/// Radial gradient with drifting motes behind the DOM menu
pub fn draw_menu_background(fb: &mut Framebuffer, time: f64) {
    let (w, h) = (fb.width as f32, fb.height as f32);
    let centre = Vec2::new(w / 2.0, h / 2.0);
    let reach = w.max(h);
    let (inner, mid, outer) = (Rgb::hex(0x2d1b69), Rgb::hex(0x1a0d2e), Rgb::hex(0x0f0f23));
    for y in 0..fb.height {
        for x in 0..fb.width {
            let t = Vec2::new(x as f32, y as f32).distance(centre) / reach;
            let color = if t < 0.5 {
                inner.lerp(mid, t * 2.0)
            } else {
                mid.lerp(outer, (t - 0.5) * 2.0)
            };
            fb.set(x as i32, y as i32, color);
        }
    }

    let drift = (time * 0.00002) as f32;
    for i in 0..50u32 {
        let hx = i.wrapping_mul(0x9e37_79b9) ^ 0x85eb_ca6b;
        let hy = i.wrapping_mul(0xc2b2_ae35) ^ 0x27d4_eb2f;
        let x = ((hx % 1000) as f32 / 1000.0 + drift).fract() * w;
        let y = ((hy % 1000) as f32 / 1000.0 + drift * 0.5).fract() * h;
        let r = 1.0 + (i % 3) as f32;
        fb.fill_circle(x, y, r, ACCENT, 0.1);
    }
}

/// Full-screen tint for the non-playing modes
pub fn draw_mode_tint(fb: &mut Framebuffer, mode: GameMode) {
    let (w, h) = (fb.width as i32, fb.height as i32);
    match mode {
        GameMode::Paused => fb.blend_rect(0, 0, w, h, Rgb::BLACK, 0.5),
        GameMode::Dead => fb.blend_rect(0, 0, w, h, Rgb::hex(0x800000), 0.8),
        GameMode::LevelComplete => fb.blend_rect(0, 0, w, h, Rgb::hex(0x008000), 0.8),
        GameMode::Menu | GameMode::Playing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Level;

    fn state() -> GameState {
        let mut state = GameState::new(3);
        state.level = Level::empty(10, 10);
        state.player.pos = glam::Vec3::new(5.5, 5.5, 0.5);
        state
    }

    #[test]
    fn test_health_bar_tracks_health() {
        let mut state = state();
        state.player.health = state.player.max_health / 2.0;
        let mut fb = Framebuffer::new(800, 600);
        draw_status(&mut fb, &state);
        // Inside the filled half, and past it
        assert_eq!(fb.get(60, 30), Some(HEALTH_COLOR));
        assert_ne!(fb.get(180, 30), Some(HEALTH_COLOR));
    }

    #[test]
    fn test_fragment_pips_fill() {
        let mut state = state();
        state.player.memory_fragments = 1;
        let mut fb = Framebuffer::new(800, 600);
        draw_status(&mut fb, &state);
        assert_eq!(fb.get(25, 89), Some(Rgb::hex(0x00ff00)));
        // Second pip is only outlined
        assert_eq!(fb.get(43, 89), Some(Rgb::BLACK));
    }

    #[test]
    fn test_crosshair_centre() {
        let mut fb = Framebuffer::new(200, 100);
        crosshair(&mut fb, ui_scale(&Framebuffer::new(200, 100)));
        assert_eq!(fb.get(100, 50), Some(ACCENT));
    }

    #[test]
    fn test_mode_tints() {
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Rgb::WHITE);
        draw_mode_tint(&mut fb, GameMode::Playing);
        assert_eq!(fb.get(0, 0), Some(Rgb::WHITE));
        draw_mode_tint(&mut fb, GameMode::Paused);
        let c = fb.get(0, 0).unwrap();
        assert!(c.r < 200 && c.r == c.g);
    }

    #[test]
    fn test_minimap_marks_player() {
        let state = state();
        let mut fb = Framebuffer::new(800, 600);
        draw_minimap(&mut fb, &state);
        // 150 px map, 15 px cells, origin (20, 430)
        assert_eq!(fb.get(20 + 82, 430 + 82), Some(Rgb::hex(0x00ff00)));
    }

    #[test]
    fn test_weapon_uses_animation_frame() {
        let mut assets = AssetRegistry::new();
        assets.install_fallbacks();
        let mut state = state();
        let mut idle = Framebuffer::new(400, 300);
        draw_weapon(&mut idle, &state, &assets);
        state.player.weapon_anim_frame = 1;
        let mut firing = Framebuffer::new(400, 300);
        draw_weapon(&mut firing, &state, &assets);
        assert_ne!(idle.pixels, firing.pixels);
    }
}
