//! Grid level model
//!
//! A level is a set of same-sized tile grids plus the scripted data that
//! drives doors, rewards and objectives. Tile codes are opaque: 0 is open,
//! anything else blocks movement and rays. Doors are wall cells with reserved
//! codes that triggers overwrite with 0.

use std::collections::BTreeMap;

use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::{EnemyKind, EnemyState};
use crate::Rgb;
use crate::audio::AmbientTrack;

/// Row-major grid of tile codes with bounds-checked access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl TileGrid {
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Tile at integer cell, `None` outside the grid
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Write a tile; out-of-range writes are ignored and return false
    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Integer cell containing a world position (rejects NaN/inf)
    pub fn cell_of(pos: Vec2) -> Option<IVec2> {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return None;
        }
        // `as` saturates, so huge values land far outside any grid
        Some(IVec2::new(pos.x.floor() as i32, pos.y.floor() as i32))
    }

    /// Tile under a world position, `None` outside the grid
    pub fn at(&self, pos: Vec2) -> Option<u8> {
        let cell = Self::cell_of(pos)?;
        self.get(cell.x, cell.y)
    }

    /// True only for in-bounds nonzero tiles. Outside the grid counts as open.
    pub fn is_blocked(&self, pos: Vec2) -> bool {
        matches!(self.at(pos), Some(tile) if tile != 0)
    }

    pub fn is_open_cell(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(0)
    }

    /// Rows from top (y = 0) to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.width.max(1))
    }
}

/// Interactable object categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractableKind {
    DataReliquary,
    SacredCore,
    BossDoor,
    SecretDoor,
    BiometricDoor,
    GravityRail,
    MemoryTerminal,
    BossReward,
    SecretPanel,
}

impl InteractableKind {
    /// Doors open through triggers, never through the interact key
    pub fn is_door(self) -> bool {
        matches!(
            self,
            InteractableKind::BossDoor | InteractableKind::SecretDoor | InteractableKind::BiometricDoor
        )
    }

    /// Picked by standing next to it rather than aiming at it
    pub fn is_proximity(self) -> bool {
        matches!(
            self,
            InteractableKind::SacredCore
                | InteractableKind::GravityRail
                | InteractableKind::MemoryTerminal
                | InteractableKind::BossReward
                | InteractableKind::SecretPanel
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    pub id: String,
    /// Grid cell
    pub pos: IVec2,
    pub kind: InteractableKind,
    /// One-way flag
    pub activated: bool,
    pub required_item: Option<String>,
}

impl Interactable {
    pub fn new(id: &str, x: i32, y: i32, kind: InteractableKind) -> Self {
        Self {
            id: id.to_string(),
            pos: IVec2::new(x, y),
            kind,
            activated: false,
            required_item: None,
        }
    }

    pub fn requiring(mut self, item: &str) -> Self {
        self.required_item = Some(item.to_string());
        self
    }

    /// Centre of the cell in world units
    pub fn world_pos(&self) -> Vec2 {
        self.pos.as_vec2() + Vec2::splat(0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    LedStainedGlass,
    ServerGlow,
    Neon,
    SacredCore,
    BrokenNeon,
    BiomechGlow,
    ArenaLight,
}

/// Decorative point light (tints nearby wall hits)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub pos: Vec3,
    pub color: Rgb,
    pub intensity: f32,
    pub flickering: bool,
    pub kind: LightKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretReward {
    MemoryFragment,
    WeaponUpgrade,
    Artifact,
    SoulEnergy,
}

/// Axis-aligned cell rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CellBounds {
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.x as f32
            && pos.x < (self.x + self.width) as f32
            && pos.y >= self.y as f32
            && pos.y < (self.y + self.height) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub bounds: CellBounds,
    pub discovered: bool,
    pub reward: SecretReward,
}

/// What advances an objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveGoal {
    /// Memory fragments from reliquaries and secrets
    CollectFragments,
    /// Sacred core or its secret panel
    ActivateCore,
    /// Picking up the boss reward, which carries this artifact
    ClaimReward { artifact: String },
    Defeat(EnemyKind),
    /// Interacting with a loose artifact
    Extract { artifact: String },
    /// Milliseconds spent alive while playing
    Survive,
    WallRuns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub goal: ObjectiveGoal,
    pub progress: f32,
    pub max_progress: f32,
    pub completed: bool,
}

impl Objective {
    pub fn new(id: &str, description: &str, goal: ObjectiveGoal, max_progress: f32) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            goal,
            progress: 0.0,
            max_progress,
            completed: false,
        }
    }

    /// Add progress. Returns true only on the tick the objective completes.
    ///
    /// Progress never decreases and is capped at `max_progress`.
    pub fn advance(&mut self, amount: f32) -> bool {
        if self.completed || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.progress = (self.progress + amount).min(self.max_progress);
        if self.progress >= self.max_progress {
            self.completed = true;
            return true;
        }
        false
    }

    pub fn fraction(&self) -> f32 {
        if self.max_progress <= 0.0 {
            1.0
        } else {
            (self.progress / self.max_progress).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pos: IVec2,
    pub collected: bool,
    pub effect: String,
}

impl Artifact {
    pub fn new(id: &str, name: &str, description: &str, x: i32, y: i32, effect: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            pos: IVec2::new(x, y),
            collected: false,
            effect: effect.to_string(),
        }
    }

    pub fn world_pos(&self) -> Vec2 {
        self.pos.as_vec2() + Vec2::splat(0.5)
    }
}

/// When a door trigger is evaluated within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerStage {
    /// Right after the clock advances
    Opening,
    /// After level completion is evaluated
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCondition {
    FragmentsAtLeast(u32),
    /// Every objective except this one is complete, and this one is not
    AllObjectivesExcept(String),
}

/// Scripted door: when the condition holds, the cell becomes open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorTrigger {
    /// Interactable id flagged activated once the door opens
    pub door: String,
    pub cell: IVec2,
    pub stage: TriggerStage,
    pub condition: TriggerCondition,
}

/// Interactable spawned at runtime by a scripted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedSpawn {
    pub id: String,
    pub kind: InteractableKind,
    pub pos: IVec2,
}

impl ScriptedSpawn {
    pub fn to_interactable(&self) -> Interactable {
        Interactable::new(&self.id, self.pos.x, self.pos.y, self.kind)
    }
}

/// Static enemy manifest entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub id: String,
    pub kind: EnemyKind,
    /// Desired cell; the nearest free cell is used
    pub cell: IVec2,
    pub z: f32,
    pub dir: f32,
    pub health: f32,
    pub state: EnemyState,
    /// Empty means "patrol around the spawn cell"
    pub patrol: Vec<Vec2>,
    pub ability: Option<String>,
    pub faction: Option<String>,
}

/// A playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub walls: TileGrid,
    pub floors: TileGrid,
    pub ceilings: TileGrid,
    /// Visual only
    pub elevation: TileGrid,
    pub spawn_points: Vec<IVec2>,
    pub interactables: Vec<Interactable>,
    pub lights: Vec<LightSource>,
    pub ambient: Vec<AmbientTrack>,
    pub music: Option<AmbientTrack>,
    pub secrets: Vec<Secret>,
    /// Tile code -> texture name
    pub textures: BTreeMap<u8, String>,
    pub triggers: Vec<DoorTrigger>,
    /// Spawned when the boss dies
    pub boss_reward: Option<ScriptedSpawn>,
    /// Spawned when the boss reward is claimed
    pub reward_panel: Option<ScriptedSpawn>,
}

impl Level {
    /// Open level with no walls (menu backdrop)
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            id: "empty".to_string(),
            name: String::new(),
            width,
            height,
            walls: TileGrid::filled(width, height, 0),
            floors: TileGrid::filled(width, height, 1),
            ceilings: TileGrid::filled(width, height, 1),
            elevation: TileGrid::filled(width, height, 0),
            spawn_points: vec![IVec2::new(width as i32 / 2, height as i32 / 2)],
            interactables: Vec::new(),
            lights: Vec::new(),
            ambient: Vec::new(),
            music: None,
            secrets: Vec::new(),
            textures: BTreeMap::new(),
            triggers: Vec::new(),
            boss_reward: None,
            reward_panel: None,
        }
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<u8> {
        self.walls.get(x, y)
    }

    pub fn is_blocked(&self, pos: Vec2) -> bool {
        self.walls.is_blocked(pos)
    }

    pub fn texture_name(&self, tile: u8) -> Option<&str> {
        self.textures.get(&tile).map(String::as_str)
    }

    pub fn interactable(&self, id: &str) -> Option<&Interactable> {
        self.interactables.iter().find(|i| i.id == id)
    }

    /// Add a scripted interactable unless one with the same id exists
    pub fn spawn_once(&mut self, spawn: &ScriptedSpawn) -> bool {
        if self.interactable(&spawn.id).is_some() {
            return false;
        }
        self.interactables.push(spawn.to_interactable());
        true
    }

    /// Nearest open cell to `(x, y)` searching rings of radius < 5, falling
    /// back to the grid centre
    pub fn find_free_cell_near(&self, x: i32, y: i32) -> IVec2 {
        let max_x = self.width.saturating_sub(1) as i32;
        let max_y = self.height.saturating_sub(1) as i32;
        let x = x.clamp(0, max_x);
        let y = y.clamp(0, max_y);
        if self.walls.is_open_cell(x, y) {
            return IVec2::new(x, y);
        }
        for r in 1..5 {
            for dx in -r..=r {
                for dy in -r..=r {
                    let nx = (x + dx).clamp(0, max_x);
                    let ny = (y + dy).clamp(0, max_y);
                    if self.walls.is_open_cell(nx, ny) {
                        return IVec2::new(nx, ny);
                    }
                }
            }
        }
        IVec2::new(self.width as i32 / 2, self.height as i32 / 2)
    }
}

/// Everything a level provider hands the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub number: u32,
    pub level: Level,
    pub objectives: Vec<Objective>,
    pub artifacts: Vec<Artifact>,
    pub enemies: Vec<EnemySpawn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rejects_out_of_bounds() {
        let mut grid = TileGrid::filled(4, 3, 1);
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.get(3, 2), Some(1));
        assert!(!grid.set(5, 5, 0));
        assert!(grid.set(1, 1, 0));
        assert_eq!(grid.get(1, 1), Some(0));
    }

    #[test]
    fn test_outside_grid_is_open() {
        let grid = TileGrid::filled(2, 2, 7);
        assert!(grid.is_blocked(Vec2::new(0.5, 0.5)));
        assert!(!grid.is_blocked(Vec2::new(-0.5, 0.5)));
        assert!(!grid.is_blocked(Vec2::new(2.0, 0.5)));
        assert!(!grid.is_blocked(Vec2::new(f32::NAN, 0.5)));
        assert!(!grid.is_blocked(Vec2::new(1e30, 1e30)));
    }

    #[test]
    fn test_objective_completes_once() {
        let mut obj = Objective::new("o", "", ObjectiveGoal::CollectFragments, 3.0);
        assert!(!obj.advance(1.0));
        assert!(!obj.advance(-5.0));
        assert_eq!(obj.progress, 1.0);
        assert!(!obj.advance(1.0));
        assert!(obj.advance(4.0));
        assert_eq!(obj.progress, 3.0);
        assert!(obj.completed);
        assert!(!obj.advance(1.0));
        assert!(obj.completed);
    }

    #[test]
    fn test_spawn_once_is_idempotent() {
        let mut level = Level::empty(10, 10);
        let spawn = ScriptedSpawn {
            id: "reward".into(),
            kind: InteractableKind::BossReward,
            pos: IVec2::new(3, 3),
        };
        assert!(level.spawn_once(&spawn));
        assert!(!level.spawn_once(&spawn));
        assert_eq!(level.interactables.len(), 1);
    }

    #[test]
    fn test_find_free_cell_near_skips_walls() {
        let mut level = Level::empty(6, 6);
        level.walls.set(2, 2, 3);
        assert_eq!(level.find_free_cell_near(1, 1), IVec2::new(1, 1));
        let cell = level.find_free_cell_near(2, 2);
        assert!(level.walls.is_open_cell(cell.x, cell.y));
        assert_eq!(level.find_free_cell_near(-10, 50), IVec2::new(0, 5));
    }
}
