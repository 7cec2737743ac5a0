//! Column ray marching, walls and floor
//!
//! One ray per screen column, marched in fixed steps until it enters a
//! nonzero tile. The corrected distance drives both slice height and
//! brightness and is written to the depth buffer for sprite occlusion.

use glam::Vec2;

use super::framebuffer::Framebuffer;
use crate::Rgb;
use crate::consts::*;
use crate::sim::level::{Level, LightSource, TileGrid};

/// Radius within which a light tints wall hits
const LIGHT_RADIUS: f32 = 3.0;
/// Extra slice height per elevation tier, as a fraction of the half-height
const ELEVATION_LIFT: f32 = 0.25;
const FLOOR_FALLOFF: f32 = 12.0;
const FLOOR_MIN_SHADE: f32 = 0.3;

/// Where a ray stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray (uncorrected)
    pub distance: f32,
    pub tile: u8,
    pub point: Vec2,
    /// Horizontal texture coordinate in [0, 1)
    pub texture_u: f32,
}

/// Angle of ray `column` out of `count`, spanning the field of view
pub fn ray_angle(dir: f32, column: usize, count: usize) -> f32 {
    dir - FOV / 2.0 + (column as f32 / count.max(1) as f32) * FOV
}

/// March from `origin` along `angle`. Samples outside the grid are open.
pub fn cast_ray(walls: &TileGrid, origin: Vec2, angle: f32) -> Option<RayHit> {
    let step = Vec2::from_angle(angle);
    let steps = (MAX_RENDER_DISTANCE / RAY_STEP) as usize;
    for i in 0..steps {
        let distance = i as f32 * RAY_STEP;
        let point = origin + step * distance;
        match walls.at(point) {
            Some(tile) if tile != 0 => {
                return Some(RayHit {
                    distance,
                    tile,
                    point,
                    texture_u: (point.x.rem_euclid(1.0) + point.y.rem_euclid(1.0)).fract(),
                });
            }
            _ => {}
        }
    }
    None
}

/// Remove fisheye: project the hit onto the view direction
pub fn corrected_distance(distance: f32, relative_angle: f32) -> f32 {
    (distance * relative_angle.cos()).max(MIN_CORRECTED_DISTANCE)
}

/// Half the on-screen height of a wall at this corrected distance
pub fn wall_slice_half_height(screen_height: f32, corrected: f32) -> f32 {
    (screen_height / 2.0) / corrected.max(MIN_CORRECTED_DISTANCE)
}

/// Linear distance falloff with a floor
pub fn brightness(distance: f32) -> f32 {
    (1.0 - distance / BRIGHTNESS_FALLOFF).max(MIN_BRIGHTNESS)
}

fn texture_color(name: &str) -> Option<Rgb> {
    let hex = match name {
        "motherboard_wall" => 0x338c33,
        "led_stained_glass" => 0x00c8d8,
        "server_rack_pillar" => 0x888888,
        "sacred_core_wall" => 0xffe066,
        "biomechanical_wall" => 0x993399,
        "organic_floor" => 0x5a8a4a,
        "holographic_floor" => 0x80ffff,
        "rusted_metal" => 0x7a3f00,
        "boss_door" => 0xb01030,
        "secret_wall" => 0x3a3a48,
        "secret_floor" => 0x44405a,
        "secret_door" => 0x4a4a5c,
        "gothic_spiral_column" => 0x4a5568,
        "neon_graffiti_wall" => 0xff2fa0,
        "bone_steel_door" => 0xd8d0c0,
        _ => return None,
    };
    Some(Rgb::hex(hex))
}

/// Base colour for a wall tile: by texture name, then by raw code
pub fn wall_color(level: &Level, tile: u8) -> Rgb {
    level
        .texture_name(tile)
        .and_then(texture_color)
        .unwrap_or(match tile {
            1 => Rgb::hex(0x4a5568),
            2 => Rgb::hex(0x00ffff),
            _ => Rgb::hex(0x2d3142),
        })
}

/// Additive tint from nearby lights
pub fn light_tint(lights: &[LightSource], point: Vec2, time: f64) -> Rgb {
    let mut tint = Rgb::BLACK;
    for light in lights {
        let d = light.pos.truncate().distance(point);
        if d >= LIGHT_RADIUS {
            continue;
        }
        let flicker = if light.flickering {
            0.75 + 0.25 * ((time * 0.02) as f32 + light.pos.x * 7.0).sin()
        } else {
            1.0
        };
        let strength = light.intensity * (1.0 - d / LIGHT_RADIUS) * 0.35 * flicker;
        tint = tint.add(light.color.scale(strength));
    }
    tint
}

/// Small deterministic hash for procedural texture noise
fn hash2(x: i32, y: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343) ^ (y as u32).wrapping_mul(0xd816_3841);
    h ^= h >> 13;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^ (h >> 16)
}

fn floor_base(tile: Option<u8>) -> Rgb {
    match tile {
        Some(2) => Rgb::hex(0x6b6450),
        Some(6) => Rgb::hex(0x4d6a4d),
        Some(7) => Rgb::hex(0x3f7a80),
        Some(9) => Rgb::hex(0x7a7058),
        _ => Rgb::hex(0x5a5a5f),
    }
}

/// Sky gradient on the upper half
pub fn draw_ceiling(fb: &mut Framebuffer) {
    let horizon = fb.height as i32 / 2;
    fb.vertical_gradient(0, horizon, Rgb::hex(0x1a0d2e), Rgb::hex(0x16213e));
}

/// Inverse-perspective floor with procedural cracks and puddles
pub fn draw_floor(fb: &mut Framebuffer, level: &Level, pos: Vec2, dir: f32) {
    let h = fb.height as f32;
    let w = fb.width as f32;
    let horizon = fb.height / 2;
    let facing = Vec2::from_angle(dir);
    let plane = facing.perp() * (FOV / 2.0).tan();
    let (left, right) = (facing - plane, facing + plane);

    for y in horizon + 1..fb.height {
        let row_distance = (h / 2.0) / (y as f32 - h / 2.0);
        let shade = (1.0 - row_distance / FLOOR_FALLOFF).max(FLOOR_MIN_SHADE);
        for x in 0..fb.width {
            let world = pos + left.lerp(right, x as f32 / w) * row_distance;
            let cell = (world * 4.0).floor();
            let noise = (hash2(cell.x as i32, cell.y as i32) & 0x7) as u8;
            let mut color = floor_base(level.floors.at(world));
            color = color.add(Rgb {
                r: noise,
                g: noise,
                b: noise,
            });
            if (world.x * 2.2 + world.y * 3.1).sin().abs() > 0.98
                || (world.x * 1.7 - world.y * 2.3).cos().abs() > 0.985
            {
                color = Rgb::hex(0x282828);
            } else if (world.x * 1.3 + world.y * 2.7).sin() > 0.97 {
                color = Rgb::hex(0x466ea0);
            }
            fb.set(x as i32, y as i32, color.scale(shade));
        }
    }
}

/// Cast every column, draw wall slices and fill `depth` (one entry per ray)
pub fn draw_walls(
    fb: &mut Framebuffer,
    level: &Level,
    pos: Vec2,
    dir: f32,
    time: f64,
    depth: &mut Vec<f32>,
) {
    depth.clear();
    depth.resize(RAY_COUNT, f32::INFINITY);
    let h = fb.height as f32;
    let horizon = h / 2.0;
    let column_width = fb.width as f32 / RAY_COUNT as f32;

    for i in 0..RAY_COUNT {
        let angle = ray_angle(dir, i, RAY_COUNT);
        let Some(hit) = cast_ray(&level.walls, pos, angle) else {
            continue;
        };
        let corrected = corrected_distance(hit.distance, angle - dir);
        depth[i] = corrected;

        let half = wall_slice_half_height(h, corrected);
        let tier = TileGrid::cell_of(hit.point)
            .and_then(|c| level.elevation.get(c.x, c.y))
            .unwrap_or(0);
        let top = horizon - half * (1.0 + tier as f32 * ELEVATION_LIFT);
        let bottom = horizon + half;

        let mut base = wall_color(level, hit.tile).scale(brightness(corrected));
        base = base.add(light_tint(&level.lights, hit.point, time));
        // Panel seams every quarter texel
        if (hit.texture_u * 4.0).fract() < 0.08 {
            base = base.scale(0.85);
        }

        let x0 = (i as f32 * column_width) as i32;
        let x1 = (((i + 1) as f32) * column_width).ceil() as i32;
        let y0 = top.max(0.0) as i32;
        let y1 = bottom.min(h) as i32;
        let slice = (bottom - top).max(1.0);
        for y in y0..y1 {
            let v = (y as f32 - top) / slice;
            let band = (0.2..0.3).contains(&v) || (0.7..0.8).contains(&v);
            let color = if band {
                base.lerp(Rgb::hex(0x8b4513), 0.3)
            } else {
                base
            };
            fb.fill_rect(x0, y, x1 - x0, 1, color);
        }
    }
}
