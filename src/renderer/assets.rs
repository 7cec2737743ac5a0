//! Sprite asset registry
//!
//! The host asks for `preload()` requests, fetches and decodes the images,
//! then reports back through `complete_load` or `fail_load`. Anything that
//! never arrives can be replaced with `install_fallbacks()`. Readiness is a
//! plain synchronous query, so the renderer never waits on a load.

use std::collections::{HashMap, HashSet};

use super::framebuffer::pack;
use crate::Rgb;
use crate::error::AssetError;
use crate::sim::EnemyKind;

/// Every sprite sheet the renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    ArmoredEnemy,
    DemonEnemy,
    BossEnemy,
    /// First-person weapon view model
    Pistol,
}

impl SpriteId {
    pub const ALL: [SpriteId; 4] = [
        SpriteId::ArmoredEnemy,
        SpriteId::DemonEnemy,
        SpriteId::BossEnemy,
        SpriteId::Pistol,
    ];

    pub fn path(self) -> &'static str {
        match self {
            SpriteId::ArmoredEnemy => "assets/enemy-armored.png",
            SpriteId::DemonEnemy => "assets/enemy-demon.png",
            SpriteId::BossEnemy => "assets/enemy-boss.png",
            SpriteId::Pistol => "assets/pistol.png",
        }
    }

    /// Sheet layout as (columns, rows)
    pub fn grid(self) -> (u32, u32) {
        match self {
            SpriteId::Pistol => (5, 1),
            _ => (6, 3),
        }
    }

    pub fn for_enemy(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::ArchbishopNull => SpriteId::BossEnemy,
            EnemyKind::NeuralAssassin | EnemyKind::BiomechDog | EnemyKind::CerebralKamikaze => {
                SpriteId::DemonEnemy
            }
            _ => SpriteId::ArmoredEnemy,
        }
    }

    /// Colour of the flat placeholder drawn before the sheet is ready
    pub fn placeholder_color(self) -> Rgb {
        match self {
            SpriteId::ArmoredEnemy => Rgb::hex(0x6c7a89),
            SpriteId::DemonEnemy => Rgb::hex(0x9b1d3a),
            SpriteId::BossEnemy => Rgb::hex(0xd4af37),
            SpriteId::Pistol => Rgb::hex(0x404048),
        }
    }
}

/// A decoded sheet of equally sized frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSheet {
    pub width: u32,
    pub height: u32,
    pub cols: u32,
    pub rows: u32,
    /// Packed RGBA, alpha 0 is transparent
    pub pixels: Vec<u32>,
}

impl SpriteSheet {
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width / self.cols.max(1), self.height / self.rows.max(1))
    }

    /// Texel of frame `(col, row)` at normalized `(u, v)`, `None` if transparent
    pub fn sample(&self, col: u32, row: u32, u: f32, v: f32) -> Option<u32> {
        let (fw, fh) = self.frame_size();
        if fw == 0 || fh == 0 {
            return None;
        }
        let tx = (u.clamp(0.0, 0.999) * fw as f32) as u32 + (col % self.cols.max(1)) * fw;
        let ty = (v.clamp(0.0, 0.999) * fh as f32) as u32 + (row % self.rows.max(1)) * fh;
        let texel = *self.pixels.get((ty * self.width + tx) as usize)?;
        (super::framebuffer::alpha(texel) > 0).then_some(texel)
    }
}

/// A sheet the host should fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub id: SpriteId,
    pub path: &'static str,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    sheets: HashMap<SpriteId, SpriteSheet>,
    pending: HashSet<SpriteId>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests for every sheet not yet loaded or in flight
    pub fn preload(&mut self) -> Vec<AssetRequest> {
        let mut requests = Vec::new();
        for id in SpriteId::ALL {
            if self.sheets.contains_key(&id) || !self.pending.insert(id) {
                continue;
            }
            requests.push(AssetRequest { id, path: id.path() });
        }
        requests
    }

    /// Install decoded RGBA bytes. A payload that doesn't match the declared
    /// size or grid gets the fallback instead.
    pub fn complete_load(
        &mut self,
        id: SpriteId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), AssetError> {
        self.pending.remove(&id);
        let (cols, rows) = id.grid();
        let expected = width as usize * height as usize * 4;
        let reason = if rgba.len() != expected {
            Some(format!("expected {} bytes, got {}", expected, rgba.len()))
        } else if width < cols || height < rows {
            Some(format!("{}x{} is smaller than its {}x{} grid", width, height, cols, rows))
        } else {
            None
        };
        if let Some(reason) = reason {
            log::warn!("Sprite {:?} rejected ({}), using fallback", id, reason);
            self.sheets.insert(id, fallback(id));
            return Err(AssetError::Decode { id, reason });
        }

        let pixels = rgba
            .chunks_exact(4)
            .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
            .collect();
        self.sheets.insert(
            id,
            SpriteSheet {
                width,
                height,
                cols,
                rows,
                pixels,
            },
        );
        log::info!("Sprite {:?} loaded ({}x{})", id, width, height);
        Ok(())
    }

    /// The host could not fetch the sheet
    pub fn fail_load(&mut self, id: SpriteId) {
        self.pending.remove(&id);
        log::warn!("Sprite {:?} failed to load, using fallback", id);
        self.sheets.insert(id, fallback(id));
    }

    /// Fill every missing sheet with its procedural version
    pub fn install_fallbacks(&mut self) -> usize {
        let missing: Vec<SpriteId> = SpriteId::ALL
            .into_iter()
            .filter(|id| !self.sheets.contains_key(id))
            .collect();
        for &id in &missing {
            self.pending.remove(&id);
            self.sheets.insert(id, fallback(id));
        }
        if !missing.is_empty() {
            log::warn!("Installed {} fallback sprites", missing.len());
        }
        missing.len()
    }

    pub fn is_ready(&self, id: SpriteId) -> bool {
        self.sheets.contains_key(&id)
    }

    pub fn is_pending(&self, id: SpriteId) -> bool {
        self.pending.contains(&id)
    }

    pub fn sheet(&self, id: SpriteId) -> Option<&SpriteSheet> {
        self.sheets.get(&id)
    }
}

const ENEMY_FRAME: (u32, u32) = (16, 24);
const PISTOL_FRAME: (u32, u32) = (32, 24);

/// Procedural stand-in sheet with the same grid as the real one
fn fallback(id: SpriteId) -> SpriteSheet {
    let (cols, rows) = id.grid();
    let (fw, fh) = if id == SpriteId::Pistol {
        PISTOL_FRAME
    } else {
        ENEMY_FRAME
    };
    let (width, height) = (fw * cols, fh * rows);
    let mut pixels = vec![0u32; (width * height) as usize];
    let base = id.placeholder_color();

    for row in 0..rows {
        for col in 0..cols {
            let ox = col * fw;
            let oy = row * fh;
            let mut put = |x: u32, y: u32, c: Rgb| {
                if x < fw && y < fh {
                    pixels[((oy + y) * width + ox + x) as usize] = pack(c);
                }
            };
            if id == SpriteId::Pistol {
                // Barrel and grip; frames 1-3 carry a shrinking muzzle flash
                for y in 10..16 {
                    for x in 8..30 {
                        put(x, y, base);
                    }
                }
                for y in 16..24 {
                    for x in 20..28 {
                        put(x, y, base.scale(0.7));
                    }
                }
                let flash = match col {
                    1 => 6,
                    2 => 4,
                    3 => 2,
                    _ => 0,
                };
                for y in 13u32.saturating_sub(flash)..13 + flash {
                    for x in 8u32.saturating_sub(flash)..8 {
                        put(x, y, Rgb::hex(0xffd040));
                    }
                }
            } else {
                // Bobbing silhouette; the attack row is tinted red
                let bob = col % 2;
                let body = if row == 1 {
                    base.lerp(Rgb::hex(0xff2020), 0.5)
                } else {
                    base
                };
                for y in 4 + bob..8 + bob {
                    for x in 6..10 {
                        put(x, y, body.scale(1.2));
                    }
                }
                for y in 8 + bob..22 {
                    for x in 3..13 {
                        put(x, y, body);
                    }
                }
                put(7, 5 + bob, Rgb::hex(0x00ffff));
                put(8, 5 + bob, Rgb::hex(0x00ffff));
            }
        }
    }

    SpriteSheet {
        width,
        height,
        cols,
        rows,
        pixels,
    }
}
