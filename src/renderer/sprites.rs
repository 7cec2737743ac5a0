//! Billboards and particles
//!
//! Everything here is a camera-facing rectangle scaled by inverse distance,
//! clipped per column against the wall depth buffer.

use glam::{Vec2, Vec3Swizzles};

use super::assets::{AssetRegistry, SpriteId};
use super::framebuffer::{Framebuffer, unpack};
use super::raycast::brightness;
use crate::consts::*;
use crate::sim::collision::line_of_sight;
use crate::sim::level::InteractableKind;
use crate::sim::{EnemyState, GameState, Owner};
use crate::{Rgb, normalize_angle};

/// Reference viewport height the pixel sizes below were tuned for
const REFERENCE_HEIGHT: f32 = 600.0;
/// Billboards closer than this are skipped
const NEAR_CLIP: f32 = 0.1;
const SIGHT_SAMPLES: f32 = 8.0;

/// A world point mapped onto the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub screen_x: f32,
    /// Straight-line distance from the eye
    pub distance: f32,
    /// Distance along the view direction, comparable with the depth buffer
    pub depth: f32,
    /// Angle from the view centre
    pub bearing: f32,
}

/// Project `target` for a viewer at `eye` facing `dir`. `None` when too
/// close or outside the field of view.
pub fn project(eye: Vec2, dir: f32, target: Vec2, screen_width: f32) -> Option<Billboard> {
    let delta = target - eye;
    let distance = delta.length();
    if !distance.is_finite() || distance <= NEAR_CLIP {
        return None;
    }
    let bearing = normalize_angle(delta.y.atan2(delta.x) - dir);
    if bearing.abs() >= FOV / 2.0 {
        return None;
    }
    Some(Billboard {
        screen_x: (bearing + FOV / 2.0) / FOV * screen_width,
        distance,
        depth: distance * bearing.cos(),
        bearing,
    })
}

/// Per-column occlusion test against the wall depth buffer
struct Occlusion<'a> {
    depth: &'a [f32],
    width: u32,
    at: f32,
}

impl Occlusion<'_> {
    fn visible(&self, x: i32) -> bool {
        if x < 0 || x >= self.width as i32 || self.depth.is_empty() {
            return false;
        }
        let ray = (x as usize * self.depth.len()) / self.width as usize;
        self.depth.get(ray).is_none_or(|&wall| self.at < wall)
    }

    fn fill_rect(&self, fb: &mut Framebuffer, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        for cx in x..x + w {
            if self.visible(cx) {
                fb.vline(cx, y, y + h, color);
            }
        }
    }

    fn fill_circle(&self, fb: &mut Framebuffer, cx: f32, cy: f32, r: f32, color: Rgb, opacity: f32) {
        let r2 = r * r;
        for x in (cx - r).floor() as i32..=(cx + r).ceil() as i32 {
            if !self.visible(x) {
                continue;
            }
            for y in (cy - r).floor() as i32..=(cy + r).ceil() as i32 {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= r2 {
                    fb.blend(x, y, color, opacity);
                }
            }
        }
    }
}

fn view_scale(fb: &Framebuffer) -> f32 {
    fb.height as f32 / REFERENCE_HEIGHT
}

/// Enemies, far to near, with animation frames and health bars
pub fn draw_enemies(fb: &mut Framebuffer, state: &GameState, depth: &[f32], assets: &AssetRegistry, time: f64) {
    let eye = state.player_pos();
    let dir = state.player.dir;
    let scale = view_scale(fb);
    let h = fb.height as f32;

    let mut visible: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| !e.is_dead())
        .filter_map(|e| project(eye, dir, e.pos.xy(), fb.width as f32).map(|b| (e, b)))
        .filter(|(e, _)| line_of_sight(&state.level.walls, eye, e.pos.xy(), SIGHT_SAMPLES))
        .collect();
    visible.sort_by(|a, b| b.1.distance.total_cmp(&a.1.distance));

    for (enemy, bb) in visible {
        let id = SpriteId::for_enemy(enemy.kind);
        let size = (340.0 / bb.distance).max(32.0) * scale;
        let sheet = assets.sheet(id);
        let aspect = sheet
            .map(|s| {
                let (fw, fh) = s.frame_size();
                fh as f32 / fw.max(1) as f32
            })
            .unwrap_or(1.5);
        let (draw_w, draw_h) = (size, size * aspect);
        let floor_y = h / 2.0 + (220.0 / (bb.distance + 0.2)).min(180.0) * scale;
        let x0 = (bb.screen_x - draw_w / 2.0).round() as i32;
        let y0 = (floor_y - draw_h + 1.0).round() as i32;
        let occlusion = Occlusion {
            depth,
            width: fb.width,
            at: bb.depth,
        };
        let shade = brightness(bb.distance);

        match sheet {
            Some(sheet) => {
                let row = if enemy.state == EnemyState::Attacking { 1 } else { 0 };
                let fps = if row == 0 { 8.0 } else { 6.0 };
                let frame = ((time / (1000.0 / fps)) as u64 % sheet.cols.max(1) as u64) as u32;
                for x in x0..x0 + draw_w as i32 {
                    if !occlusion.visible(x) {
                        continue;
                    }
                    let u = (x - x0) as f32 / draw_w;
                    for y in y0.max(0)..(y0 + draw_h as i32).min(fb.height as i32) {
                        let v = (y - y0) as f32 / draw_h;
                        if let Some(texel) = sheet.sample(frame, row, u, v) {
                            fb.set(x, y, unpack(texel).scale(shade));
                        }
                    }
                }
            }
            None => occlusion.fill_rect(
                fb,
                x0,
                y0,
                draw_w as i32,
                draw_h as i32,
                id.placeholder_color().scale(shade),
            ),
        }

        if occlusion.visible(bb.screen_x as i32) {
            let bar_w = (draw_w * 0.8) as i32;
            let bar_h = (6.0 * scale).max(2.0) as i32;
            let bar_x = x0 + (draw_w as i32 - bar_w) / 2;
            let bar_y = y0 - bar_h - (6.0 * scale) as i32;
            fb.fill_rect(bar_x, bar_y, bar_w, bar_h, Rgb::hex(0x440000));
            let filled = (bar_w as f32 * enemy.health_fraction()) as i32;
            fb.fill_rect(bar_x, bar_y, filled, bar_h, Rgb::hex(0xff2222));
            fb.stroke_rect(bar_x, bar_y, bar_w, bar_h, Rgb::hex(0xaa0000));
        }
    }
}

/// Reliquaries, rewards, panels, the sacred core and loose artifacts
pub fn draw_pickups(fb: &mut Framebuffer, state: &GameState, depth: &[f32], time: f64) {
    let eye = state.player_pos();
    let dir = state.player.dir;
    let scale = view_scale(fb);
    let h = fb.height as f32;
    let pulse = 0.5 + 0.5 * ((time * 0.004) as f32).sin();

    let items = state
        .level
        .interactables
        .iter()
        .filter(|i| !i.activated)
        .map(|i| (Some(i.kind), i.world_pos()))
        .chain(
            state
                .artifacts
                .iter()
                .filter(|a| !a.collected)
                .map(|a| (None, a.world_pos())),
        );

    for (kind, pos) in items {
        if matches!(kind, Some(k) if k.is_door() || k == InteractableKind::GravityRail) {
            continue;
        }
        let Some(bb) = project(eye, dir, pos, fb.width as f32) else {
            continue;
        };
        if !line_of_sight(&state.level.walls, eye, pos, SIGHT_SAMPLES) {
            continue;
        }
        let occ = Occlusion {
            depth,
            width: fb.width,
            at: bb.depth,
        };
        let size = (120.0 / bb.distance).max(32.0) * scale;
        let cx = bb.screen_x;
        let cy = h / 2.0 + size * 0.6;

        match kind {
            Some(InteractableKind::DataReliquary) => {
                // Circuit card
                let (w, ch) = (size as i32, (size * 1.2) as i32);
                let (x, y) = (cx as i32 - w / 2, cy as i32 - ch / 2);
                occ.fill_rect(fb, x, y, w, ch, Rgb::hex(0x00ffcc));
                occ.fill_rect(fb, x + 2, y + 2, w - 4, ch - 4, Rgb::hex(0x101c1c));
                for i in 0..4 {
                    let lx = x + 4 + i * w / 5;
                    occ.fill_rect(fb, lx, y + 4, 1, ch - 8, Rgb::hex(0x00ffe7));
                }
                let chip = (size * 0.25) as i32;
                occ.fill_rect(fb, cx as i32 - chip / 2, cy as i32 - chip / 2, chip, chip, Rgb::hex(0x00ffcc));
            }
            Some(InteractableKind::BossReward) => {
                occ.fill_circle(fb, cx, cy, size * 0.5, Rgb::hex(0xffe066), 1.0);
                occ.fill_circle(fb, cx, cy, size * 0.28, Rgb::hex(0x00eaff), 1.0);
                occ.fill_circle(fb, cx, cy, size * 0.13, Rgb::hex(0xfff7b2), 1.0);
            }
            Some(InteractableKind::SecretPanel) => {
                let (w, ph) = (size as i32, (size * 0.8) as i32);
                occ.fill_rect(fb, cx as i32 - w / 2, cy as i32 - ph / 2, w, ph, Rgb::hex(0xe6e7e9));
                for i in 0..3 {
                    let color = if i == 1 {
                        Rgb::hex(0x00cfff)
                    } else {
                        Rgb::hex(0xb0b0b0)
                    };
                    let bx = cx - size / 4.0 + i as f32 * size / 4.0;
                    occ.fill_circle(fb, bx, cy + size * 0.18, size * 0.09, color, 1.0);
                }
            }
            Some(InteractableKind::SacredCore) => {
                let glow = Rgb::hex(0xffe066).lerp(Rgb::WHITE, pulse * 0.3);
                occ.fill_circle(fb, cx, cy, size * 0.45, glow, 0.6 + 0.4 * pulse);
            }
            Some(InteractableKind::MemoryTerminal) => {
                let (w, th) = (size as i32 / 2, size as i32);
                occ.fill_rect(fb, cx as i32 - w / 2, cy as i32 - th / 2, w, th, Rgb::hex(0x1f2a44));
                occ.fill_rect(fb, cx as i32 - w / 3, cy as i32 - th / 3, w * 2 / 3, th / 3, Rgb::hex(0x39ff14));
            }
            None => {
                // Artifact: spinning diamond
                let r = size * 0.3 * (0.6 + 0.4 * pulse);
                let color = Rgb::hex(0xff00ff).lerp(Rgb::hex(0x00ffff), pulse);
                for dy in -(r as i32)..=(r as i32) {
                    let half = r - (dy as f32).abs();
                    occ.fill_rect(fb, (cx - half) as i32, cy as i32 + dy, (half * 2.0) as i32, 1, color);
                }
            }
            Some(_) => {}
        }
    }
}

/// Projectiles in flight as small glowing dots
pub fn draw_projectiles(fb: &mut Framebuffer, state: &GameState, depth: &[f32]) {
    let eye = state.player_pos();
    let scale = view_scale(fb);
    let h = fb.height as f32;
    for projectile in state.projectiles.iter().filter(|p| p.is_live()) {
        let Some(bb) = project(eye, state.player.dir, projectile.pos.xy(), fb.width as f32) else {
            continue;
        };
        let occ = Occlusion {
            depth,
            width: fb.width,
            at: bb.depth,
        };
        let y = h / 2.0 - (projectile.pos.z - state.player.pos.z) * (h / 2.0) / bb.depth;
        let color = match projectile.owner {
            Owner::Player => Rgb::hex(0xffff66),
            Owner::Enemy => Rgb::hex(0xff3355),
        };
        occ.fill_circle(fb, bb.screen_x, y, (6.0 / (bb.distance + 1.0)) * scale, color, 0.9);
    }
}

/// Particles within draw distance, at most `max` of them
pub fn draw_particles(fb: &mut Framebuffer, state: &GameState, depth: &[f32], max: usize) {
    let eye = state.player_pos();
    let scale = view_scale(fb);
    let h = fb.height as f32;
    for particle in state.particles.iter().take(max) {
        let Some(bb) = project(eye, state.player.dir, particle.pos.xy(), fb.width as f32) else {
            continue;
        };
        if bb.distance >= PARTICLE_DRAW_DISTANCE {
            continue;
        }
        let occ = Occlusion {
            depth,
            width: fb.width,
            at: bb.depth,
        };
        let y = h / 2.0 - (particle.pos.z - state.player.pos.z) * (h / 2.0) / bb.depth;
        let radius = (particle.size / (bb.distance + 1.0) * scale).max(0.5);
        occ.fill_circle(fb, bb.screen_x, y, radius, particle.color, particle.life_fraction());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Enemy, EnemyKind, Level};
    use glam::Vec3;

    #[test]
    fn test_project_centre_and_edges() {
        let bb = project(Vec2::ZERO, 0.0, Vec2::new(5.0, 0.0), 320.0).unwrap();
        assert!((bb.screen_x - 160.0).abs() < 1e-3);
        assert!((bb.depth - 5.0).abs() < 1e-5);

        // Behind, outside the FOV, and too close
        assert!(project(Vec2::ZERO, 0.0, Vec2::new(-5.0, 0.0), 320.0).is_none());
        assert!(project(Vec2::ZERO, 0.0, Vec2::new(1.0, 1.0), 320.0).is_none());
        assert!(project(Vec2::ZERO, 0.0, Vec2::new(0.05, 0.0), 320.0).is_none());
    }

    #[test]
    fn test_occlusion_uses_depth_columns() {
        let depth = vec![1.0, 10.0];
        let occ = Occlusion {
            depth: &depth,
            width: 100,
            at: 5.0,
        };
        assert!(!occ.visible(10));
        assert!(occ.visible(60));
        assert!(!occ.visible(-1));
        assert!(!occ.visible(100));
    }

    #[test]
    fn test_enemy_placeholder_drawn_when_sheet_missing() {
        let mut state = GameState::new(1);
        state.level = Level::empty(20, 20);
        state.player.pos = Vec3::new(2.5, 10.5, 0.5);
        state.player.dir = 0.0;
        state.enemies.push(Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(6.5, 10.5, 0.5), 50.0));

        let mut fb = Framebuffer::new(160, 120);
        let depth = vec![f32::INFINITY; RAY_COUNT];
        draw_enemies(&mut fb, &state, &depth, &AssetRegistry::new(), 0.0);
        let centre = fb.get(80, 70).unwrap();
        assert_ne!(centre, Rgb::BLACK);
    }

    #[test]
    fn test_walls_hide_enemies() {
        let mut state = GameState::new(1);
        state.level = Level::empty(20, 20);
        state.level.walls.set(4, 10, 1);
        state.player.pos = Vec3::new(2.5, 10.5, 0.5);
        state.enemies.push(Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(6.5, 10.5, 0.5), 50.0));

        let mut fb = Framebuffer::new(160, 120);
        let depth = vec![f32::INFINITY; RAY_COUNT];
        draw_enemies(&mut fb, &state, &depth, &AssetRegistry::new(), 0.0);
        assert!(fb.pixels.iter().all(|&p| unpack(p) == Rgb::BLACK));
    }
}
