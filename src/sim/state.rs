//! Game state and core simulation types
//!
//! `GameState` is the single authoritative aggregate. The orchestrator owns it;
//! everything else borrows it for one call.

use glam::{Vec2, Vec3, Vec3Swizzles};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::level::{Artifact, Level, LevelData, Objective, ObjectiveGoal};
use super::weapons::{Arsenal, WeaponKind};
use crate::Rgb;
use crate::consts::*;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Menu,
    Playing,
    Paused,
    Dead,
    LevelComplete,
}

/// The player avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// z is eye height (0.5 on the ground)
    pub pos: Vec3,
    /// Facing angle, kept in (-π, π]
    pub dir: f32,
    pub velocity: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub soul_energy: f32,
    pub max_soul_energy: f32,
    pub active_weapon: WeaponKind,
    pub on_ground: bool,
    pub wall_running: bool,
    /// Counts up from the start of a run until the player lands or lets go
    /// of the lateral key, across any wall jumps in between
    pub wall_run_time: f32,
    pub max_wall_run_time: f32,
    /// Set on landing or release; the next run to start counts as a new one
    pub wall_run_armed: bool,
    pub dash_cooldown: f32,
    pub time_slow_cooldown: f32,
    /// Remaining slowed-enemy time
    pub time_slow_remaining: f32,
    pub memory_fragments: u32,
    pub max_memory_fragments: u32,
    pub has_gravity_hook: bool,
    /// Secret weapon upgrades collected
    pub weapon_upgrades: u32,
    pub weapon_anim_frame: u8,
    pub weapon_anim_time: f32,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: Vec3::new(spawn.x, spawn.y, GROUND_HEIGHT),
            dir: 0.0,
            velocity: Vec3::ZERO,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            soul_energy: PLAYER_START_SOUL,
            max_soul_energy: PLAYER_MAX_SOUL,
            active_weapon: WeaponKind::BiomechRifle,
            on_ground: true,
            wall_running: false,
            wall_run_time: 0.0,
            max_wall_run_time: MAX_WALL_RUN_MS,
            wall_run_armed: true,
            dash_cooldown: 0.0,
            time_slow_cooldown: 0.0,
            time_slow_remaining: 0.0,
            memory_fragments: 0,
            max_memory_fragments: MAX_MEMORY_FRAGMENTS,
            has_gravity_hook: false,
            weapon_upgrades: 0,
            weapon_anim_frame: 0,
            weapon_anim_time: 0.0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Unit vector along the facing direction
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.dir)
    }

    pub fn damage_multiplier(&self) -> f32 {
        1.0 + self.weapon_upgrades as f32 * WEAPON_UPGRADE_BONUS
    }
}

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    CyberMonk,
    FloatingGuardian,
    EucharisticDrone,
    IncenseTurret,
    NeuralAssassin,
    BiomechDog,
    CerebralKamikaze,
    ArchbishopNull,
}

impl EnemyKind {
    /// Contact damage dealt every tick while attacking in melee range
    pub fn melee_damage(self) -> f32 {
        match self {
            EnemyKind::CyberMonk => 15.0,
            EnemyKind::FloatingGuardian => 20.0,
            EnemyKind::EucharisticDrone => 10.0,
            EnemyKind::IncenseTurret => 25.0,
            EnemyKind::NeuralAssassin => 30.0,
            EnemyKind::BiomechDog => 18.0,
            EnemyKind::CerebralKamikaze => 50.0,
            EnemyKind::ArchbishopNull => 40.0,
        }
    }

    pub fn score(self) -> u64 {
        match self {
            EnemyKind::CyberMonk => 150,
            EnemyKind::FloatingGuardian => 200,
            EnemyKind::EucharisticDrone => 100,
            EnemyKind::IncenseTurret => 250,
            EnemyKind::NeuralAssassin => 180,
            EnemyKind::BiomechDog => 120,
            EnemyKind::CerebralKamikaze => 80,
            EnemyKind::ArchbishopNull => 1000,
        }
    }

    pub fn is_boss(self) -> bool {
        matches!(self, EnemyKind::ArchbishopNull)
    }

    /// Emits binary chant particles while alive
    pub fn chants(self) -> bool {
        matches!(self, EnemyKind::EucharisticDrone)
    }
}

/// Enemy behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    Idle,
    Patrolling,
    Chasing,
    Attacking,
    Dead,
    /// Reserved: no behaviour yet
    Levitating,
    /// Reserved: no behaviour yet
    Charging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: String,
    pub kind: EnemyKind,
    pub pos: Vec3,
    pub dir: f32,
    pub health: f32,
    pub max_health: f32,
    pub state: EnemyState,
    pub attack_cooldown: f32,
    /// `game_time` when the player was last seen
    pub last_seen_player: f64,
    pub patrol_points: Vec<Vec2>,
    pub current_patrol_index: usize,
    pub special_ability: Option<String>,
    pub faction: Option<String>,
}

impl Enemy {
    pub fn new(id: &str, kind: EnemyKind, pos: Vec3, health: f32) -> Self {
        Self {
            id: id.to_string(),
            kind,
            pos,
            dir: 0.0,
            health,
            max_health: health,
            state: EnemyState::Idle,
            attack_cooldown: 0.0,
            last_seen_player: 0.0,
            patrol_points: Vec::new(),
            current_patrol_index: 0,
            special_ability: None,
            faction: None,
        }
    }

    /// Realize a manifest entry at the nearest free cell centre
    pub fn from_spawn(spawn: &super::level::EnemySpawn, level: &Level) -> Self {
        let cell = level.find_free_cell_near(spawn.cell.x, spawn.cell.y);
        let centre = cell.as_vec2() + Vec2::splat(0.5);
        let patrol_points = if spawn.patrol.is_empty() {
            vec![centre]
        } else {
            spawn.patrol.clone()
        };
        Self {
            dir: spawn.dir,
            state: spawn.state,
            patrol_points,
            special_ability: spawn.ability.clone(),
            faction: spawn.faction.clone(),
            ..Self::new(&spawn.id, spawn.kind, centre.extend(spawn.z), spawn.health)
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Plasma,
    SoulBolt,
    IonicBlast,
    GravityHook,
    NeuralSpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialEffect {
    DataPurification,
    GravityPull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec3,
    /// Units per ms
    pub velocity: Vec3,
    pub damage: f32,
    pub kind: ProjectileKind,
    /// Remaining ms; expired at <= 0
    pub lifetime: f32,
    pub owner: Owner,
    pub effect: Option<SpecialEffect>,
}

impl Projectile {
    pub fn is_live(&self) -> bool {
        self.lifetime > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    SoulFragment,
    Spark,
    Blood,
    DigitalDecay,
    BinaryChant,
    NeonGlitch,
    MemoryFragment,
}

impl ParticleKind {
    /// Affected by particle gravity
    pub fn is_heavy(self) -> bool {
        matches!(self, ParticleKind::Spark | ParticleKind::Blood)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec3,
    pub velocity: Vec3,
    pub color: Rgb,
    pub size: f32,
    /// Size at spawn, before fade-out shrinking
    pub base_size: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn life_fraction(&self) -> f32 {
        if self.max_lifetime <= 0.0 {
            0.0
        } else {
            (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Source of every stochastic effect
    pub rng: Pcg32,
    pub level: Level,
    /// 0 while on the menu backdrop
    pub current_level: u32,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    /// Visual only
    pub particles: Vec<Particle>,
    pub objectives: Vec<Objective>,
    pub artifacts: Vec<Artifact>,
    pub arsenal: Arsenal,
    /// Simulation clock in ms
    pub game_time: f64,
    pub score: u64,
    pub mode: GameMode,
}

impl GameState {
    /// Create a new game state on the menu backdrop
    pub fn new(seed: u64) -> Self {
        let level = Level::empty(10, 10);
        let spawn = level.spawn_points[0].as_vec2() + Vec2::splat(0.5);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level,
            current_level: 0,
            player: Player::new(spawn),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            objectives: Vec::new(),
            artifacts: Vec::new(),
            arsenal: Arsenal::default(),
            game_time: 0.0,
            score: 0,
            mode: GameMode::Menu,
        }
    }

    /// Install a level and reset everything that belongs to it.
    /// Score and the clock carry over.
    pub fn load_level(&mut self, data: LevelData) {
        let LevelData {
            number,
            level,
            objectives,
            artifacts,
            enemies,
        } = data;

        let spawn = level
            .spawn_points
            .first()
            .map(|p| {
                if level.walls.is_open_cell(p.x, p.y) {
                    p.as_vec2()
                } else {
                    level.find_free_cell_near(p.x, p.y).as_vec2() + Vec2::splat(0.5)
                }
            })
            .unwrap_or_else(|| Vec2::new(level.width as f32, level.height as f32) * 0.5);

        self.enemies = enemies.iter().map(|s| Enemy::from_spawn(s, &level)).collect();
        log::info!(
            "Level {} '{}' loaded ({}x{}, {} enemies)",
            number,
            level.name,
            level.width,
            level.height,
            self.enemies.len()
        );

        self.current_level = number;
        self.level = level;
        self.player = Player::new(spawn);
        self.projectiles.clear();
        self.particles.clear();
        self.objectives = objectives;
        self.artifacts = artifacts;
        self.mode = GameMode::Playing;
    }

    /// Advance every objective whose goal matches. Completion awards score once.
    pub fn advance_objectives(&mut self, matches: impl Fn(&ObjectiveGoal) -> bool, amount: f32) {
        for objective in self.objectives.iter_mut().filter(|o| matches(&o.goal)) {
            if objective.advance(amount) {
                self.score += OBJECTIVE_SCORE;
                log::info!("Objective '{}' completed", objective.id);
            }
        }
    }

    pub fn objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn all_objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    pub fn player_pos(&self) -> Vec2 {
        self.player.pos.xy()
    }
}
