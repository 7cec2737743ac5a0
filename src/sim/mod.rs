//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Time comes from the caller as `dt`; timestamps use `game_time`
//! - Seeded RNG only
//! - Stable iteration order (entity vectors, never hash maps)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod level;
pub mod levels;
pub mod particles;
pub mod state;
pub mod tick;
pub mod weapons;

pub use collision::{
    CollisionResult, line_of_sight, move_point, resolve_wall_collision, wall_beside,
};
pub use level::{
    Artifact, DoorTrigger, EnemySpawn, Interactable, InteractableKind, Level, LevelData,
    LightSource, Objective, ObjectiveGoal, TileGrid,
};
pub use levels::{Campaign, LevelProvider};
pub use state::{
    Enemy, EnemyKind, EnemyState, GameMode, GameState, Owner, Particle, ParticleKind, Player,
    Projectile, ProjectileKind,
};
pub use tick::{TickInput, tick};
pub use weapons::{Arsenal, WeaponKind};
