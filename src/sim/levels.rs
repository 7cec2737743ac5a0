//! Built-in campaign content
//!
//! Levels are built in code from a few layout rules each, so the same level
//! number always yields an identical initial layout.

use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, PI};

use glam::{IVec2, Vec2, Vec3};

use super::level::{
    Artifact, CellBounds, DoorTrigger, EnemySpawn, Interactable, InteractableKind, Level,
    LevelData, LightKind, LightSource, Objective, ObjectiveGoal, ScriptedSpawn, Secret,
    SecretReward, TriggerCondition, TriggerStage,
};
use super::state::{EnemyKind, EnemyState};
use crate::Rgb;
use crate::audio::AmbientTrack;
use crate::error::LevelError;

/// Source of level content for the orchestrator
pub trait LevelProvider {
    fn load(&self, number: u32) -> Result<LevelData, LevelError>;
}

/// The two-level campaign shipped with the game
#[derive(Debug, Default, Clone, Copy)]
pub struct Campaign;

impl LevelProvider for Campaign {
    fn load(&self, number: u32) -> Result<LevelData, LevelError> {
        match number {
            1 => Ok(silicon_cathedral()),
            2 => Ok(neon_underworld()),
            n => Err(LevelError::NotFound(n)),
        }
    }
}

/// Level 1 closed door codes
pub const BOSS_DOOR_TILE: u8 = 9;
pub const SECRET_DOOR_TILE: u8 = 12;

fn textures(names: &[&str]) -> BTreeMap<u8, String> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (i as u8 + 1, name.to_string()))
        .collect()
}

fn light(x: f32, y: f32, z: f32, color: u32, intensity: f32, flickering: bool, kind: LightKind) -> LightSource {
    LightSource {
        pos: Vec3::new(x, y, z),
        color: Rgb::hex(color),
        intensity,
        flickering,
        kind,
    }
}

fn secret(x: i32, y: i32, width: i32, height: i32, reward: SecretReward) -> Secret {
    Secret {
        bounds: CellBounds { x, y, width, height },
        discovered: false,
        reward,
    }
}

fn square_patrol(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(x0, y0),
        Vec2::new(x1, y0),
        Vec2::new(x1, y1),
        Vec2::new(x0, y1),
    ]
}

#[allow(clippy::too_many_arguments)]
fn enemy(
    id: &str,
    kind: EnemyKind,
    cell: (i32, i32),
    z: f32,
    dir: f32,
    health: f32,
    state: EnemyState,
    patrol: Vec<Vec2>,
    ability: &str,
    faction: Option<&str>,
) -> EnemySpawn {
    EnemySpawn {
        id: id.to_string(),
        kind,
        cell: IVec2::new(cell.0, cell.1),
        z,
        dir,
        health,
        state,
        patrol,
        ability: Some(ability.to_string()),
        faction: faction.map(str::to_string),
    }
}

/// Paint a rectangular room: `wall` on the perimeter, open inside, `floor`
/// across the whole footprint
fn room(level: &mut Level, (x0, y0): (i32, i32), (x1, y1): (i32, i32), wall: u8, floor: u8) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            let edge = x == x0 || x == x1 || y == y0 || y == y1;
            level.walls.set(x, y, if edge { wall } else { 0 });
            level.floors.set(x, y, floor);
        }
    }
}

/// The floating cathedral: a 30 x 30 nave plus an eastern annex of solid
/// rock holding the secret room and the panel room
pub fn silicon_cathedral() -> LevelData {
    const CATHEDRAL: i32 = 29;
    let (width, height) = (38usize, 30usize);
    let (w, h) = (width as i32, height as i32);

    let mut level = Level {
        id: "silicon_cathedral".to_string(),
        name: "Catedral de Silicio".to_string(),
        ..Level::empty(width, height)
    };

    for y in 0..h {
        for x in 0..w {
            if x == 0 || x == w - 1 || y == 0 || y == h - 1 {
                level.walls.set(x, y, 1);
            } else if x >= CATHEDRAL {
                level.walls.set(x, y, 10);
            }
            if (x == 10 || x == 20) && (5..=25).contains(&y) {
                level.walls.set(x, y, 2);
            }
            if x % 6 == 0 && y % 6 == 0 && x > 0 && x < CATHEDRAL && y > 0 && y < h - 1 {
                level.walls.set(x, y, 3);
                level.elevation.set(x, y, 2);
            }
        }
    }

    // Data crypt (start)
    for y in 2..=6 {
        for x in 2..=6 {
            level.walls.set(x, y, 0);
            level.floors.set(x, y, 2);
        }
    }

    // Sacred core chamber
    for y in 22..=28 {
        for x in 22..=28 {
            let edge = x == 22 || x == 28 || y == 22 || y == 28;
            level.walls.set(x, y, if edge { 4 } else { 0 });
            level.elevation.set(x, y, 3);
        }
    }
    level.walls.set(22, 25, BOSS_DOOR_TILE);

    room(&mut level, (2, 22), (6, 26), 5, 6);
    level.walls.set(4, 22, 0);
    room(&mut level, (22, 2), (26, 6), 2, 7);
    level.walls.set(24, 6, 0);
    room(&mut level, (12, 27), (16, 29), 8, 9);
    level.walls.set(14, 27, 0);

    room(&mut level, (29, 23), (34, 29), 10, 11);
    level.walls.set(28, 26, SECRET_DOOR_TILE);
    room(&mut level, (35, 25), (37, 27), 10, 11);
    level.walls.set(34, 26, 0);

    level.textures = textures(&[
        "motherboard_wall",
        "led_stained_glass",
        "server_rack_pillar",
        "sacred_core_wall",
        "biomechanical_wall",
        "organic_floor",
        "holographic_floor",
        "rusted_metal",
        "boss_door",
        "secret_wall",
        "secret_floor",
        "secret_door",
    ]);

    level.lights = vec![
        light(15.0, 15.0, 3.0, 0x00ffff, 0.8, false, LightKind::LedStainedGlass),
        light(6.0, 6.0, 1.0, 0xff6b35, 0.6, true, LightKind::ServerGlow),
        light(12.0, 8.0, 2.0, 0x9932cc, 0.7, false, LightKind::Neon),
        light(18.0, 22.0, 2.0, 0x00ff00, 0.5, true, LightKind::ServerGlow),
        light(26.0, 26.0, 4.0, 0xffffff, 1.0, false, LightKind::SacredCore),
    ];

    level.interactables = vec![
        Interactable::new("data_reliquary_1", 8, 12, InteractableKind::DataReliquary),
        Interactable::new("data_reliquary_2", 22, 8, InteractableKind::DataReliquary),
        Interactable::new("data_reliquary_3", 12, 22, InteractableKind::DataReliquary),
        Interactable::new("sacred_core", 26, 26, InteractableKind::SacredCore)
            .requiring("memory_fragments"),
        Interactable::new("boss_door", 22, 25, InteractableKind::BossDoor)
            .requiring("memory_fragments"),
        Interactable::new("secret_door", 28, 26, InteractableKind::SecretDoor),
    ];

    level.spawn_points = [(4, 4), (8, 8), (15, 10), (20, 15), (12, 20), (25, 25)]
        .into_iter()
        .map(|(x, y)| IVec2::new(x, y))
        .collect();

    level.secrets = vec![
        secret(5, 15, 3, 3, SecretReward::MemoryFragment),
        secret(18, 5, 2, 2, SecretReward::WeaponUpgrade),
    ];

    level.ambient = vec![
        AmbientTrack::BinaryChants,
        AmbientTrack::ServerHum,
        AmbientTrack::DigitalWhispers,
    ];
    level.music = Some(AmbientTrack::Level1Background);

    level.triggers = vec![
        DoorTrigger {
            door: "boss_door".to_string(),
            cell: IVec2::new(22, 25),
            stage: TriggerStage::Opening,
            condition: TriggerCondition::FragmentsAtLeast(3),
        },
        DoorTrigger {
            door: "secret_door".to_string(),
            cell: IVec2::new(28, 26),
            stage: TriggerStage::Secondary,
            condition: TriggerCondition::AllObjectivesExcept("deactivate_core".to_string()),
        },
    ];
    level.boss_reward = Some(ScriptedSpawn {
        id: "archbishop_reward".to_string(),
        kind: InteractableKind::BossReward,
        pos: IVec2::new(25, 25),
    });
    level.reward_panel = Some(ScriptedSpawn {
        id: "secret_panel".to_string(),
        kind: InteractableKind::SecretPanel,
        pos: IVec2::new(36, 26),
    });

    let objectives = vec![
        Objective::new(
            "recover_memory",
            "Recover the memory fragments",
            ObjectiveGoal::CollectFragments,
            3.0,
        ),
        Objective::new(
            "deactivate_core",
            "Deactivate the sacred core",
            ObjectiveGoal::ActivateCore,
            1.0,
        ),
        Objective::new(
            "steal_gospel",
            "Steal the Code Gospel",
            ObjectiveGoal::ClaimReward {
                artifact: "code_gospel".to_string(),
            },
            1.0,
        ),
        Objective::new(
            "defeat_archbishop",
            "Defeat Archbishop Null",
            ObjectiveGoal::Defeat(EnemyKind::ArchbishopNull),
            1.0,
        ),
    ];

    let artifacts = vec![
        Artifact::new(
            "code_gospel",
            "Code Gospel",
            "Sacred text holding the secrets of digital resurrection",
            26,
            26,
            "Unlocks advanced hacking",
        ),
        Artifact::new(
            "ionic_redeemer",
            "Ionic Redeemer",
            "Biomechanical shotgun that purifies corrupted data",
            8,
            12,
            "Primary weapon with unlimited ammo",
        ),
    ];

    let enemies = vec![
        enemy(
            "cyber_monk_1",
            EnemyKind::CyberMonk,
            (8, 8),
            0.5,
            FRAC_PI_4,
            60.0,
            EnemyState::Patrolling,
            square_patrol(6.0, 6.0, 12.0, 12.0),
            "plasma_lance",
            Some("tech_clergy"),
        ),
        enemy(
            "floating_guardian_1",
            EnemyKind::FloatingGuardian,
            (15, 10),
            2.0,
            0.0,
            80.0,
            EnemyState::Levitating,
            square_patrol(13.0, 8.0, 17.0, 12.0),
            "energy_shield",
            Some("tech_clergy"),
        ),
        enemy(
            "eucharistic_drone_1",
            EnemyKind::EucharisticDrone,
            (20, 15),
            1.5,
            PI,
            40.0,
            EnemyState::Patrolling,
            square_patrol(18.0, 14.0, 22.0, 16.0),
            "binary_chant",
            Some("tech_clergy"),
        ),
        enemy(
            "incense_turret_1",
            EnemyKind::IncenseTurret,
            (12, 20),
            0.5,
            0.0,
            100.0,
            EnemyState::Idle,
            Vec::new(),
            "explosive_incense",
            Some("tech_clergy"),
        ),
        enemy(
            "archbishop_null",
            EnemyKind::ArchbishopNull,
            (26, 26),
            1.0,
            FRAC_PI_2,
            300.0,
            EnemyState::Idle,
            square_patrol(24.0, 24.0, 28.0, 28.0),
            "neural_network_fusion",
            Some("tech_clergy"),
        ),
    ];

    LevelData {
        number: 1,
        level,
        objectives,
        artifacts,
        enemies,
    }
}

/// Underground tunnels under the neon city
pub fn neon_underworld() -> LevelData {
    let (width, height) = (35usize, 35usize);
    let (w, h) = (width as i32, height as i32);

    let mut level = Level {
        id: "neon_underworld".to_string(),
        name: "Submundo de Neón".to_string(),
        ..Level::empty(width, height)
    };

    for y in 0..h {
        for x in 0..w {
            if x == 0 || x == w - 1 || y == 0 || y == h - 1 {
                level.walls.set(x, y, 1);
            }
            let tunnel = ((5..=30).contains(&x) && (y == 10 || y == 25))
                || ((x == 10 || x == 25) && (5..=30).contains(&y));
            if tunnel {
                level.walls.set(x, y, 0);
                level.floors.set(x, y, 2);
            }
            if (x - 15) * (x - 15) + (y - 15) * (y - 15) == 25 {
                level.walls.set(x, y, 2);
                level.elevation.set(x, y, 3);
            }
            if (y == 8 || y == 27) && (8..=27).contains(&x) {
                // Suspended train tracks
                level.elevation.set(x, y, 4);
            }
            if (28..=32).contains(&x) && (28..=32).contains(&y) {
                level.walls.set(x, y, 3);
                level.floors.set(x, y, 3);
            }
            if (2..=8).contains(&x) && (2..=8).contains(&y) {
                level.walls.set(x, y, 4);
                level.floors.set(x, y, 4);
            }
            if (x - 17) * (x - 17) + (y - 17) * (y - 17) <= 16 {
                level.walls.set(x, y, 0);
                level.floors.set(x, y, 5);
                level.elevation.set(x, y, 1);
            }
        }
    }

    level.textures = textures(&[
        "rusted_metal",
        "gothic_spiral_column",
        "biomechanical_wall",
        "neon_graffiti_wall",
        "bone_steel_door",
    ]);

    level.lights = vec![
        light(5.0, 5.0, 2.0, 0xff0080, 0.7, true, LightKind::BrokenNeon),
        light(15.0, 8.0, 4.0, 0x00ffff, 0.6, false, LightKind::Neon),
        light(25.0, 15.0, 2.0, 0xffff00, 0.8, true, LightKind::BrokenNeon),
        light(30.0, 30.0, 1.0, 0xff6b35, 0.5, false, LightKind::BiomechGlow),
        light(17.0, 17.0, 2.0, 0x9932cc, 0.9, false, LightKind::ArenaLight),
    ];

    level.interactables = vec![
        Interactable::new("gravity_rail_1", 10, 8, InteractableKind::GravityRail),
        Interactable::new("gravity_rail_2", 25, 27, InteractableKind::GravityRail),
        Interactable::new("biometric_door_1", 15, 15, InteractableKind::BiometricDoor)
            .requiring("eye_of_oblivion"),
        Interactable::new("memory_terminal", 30, 30, InteractableKind::MemoryTerminal),
    ];

    level.spawn_points = [(5, 5), (12, 12), (20, 8), (8, 25), (30, 30), (17, 17)]
        .into_iter()
        .map(|(x, y)| IVec2::new(x, y))
        .collect();

    level.secrets = vec![
        secret(3, 15, 2, 2, SecretReward::Artifact),
        secret(32, 3, 2, 2, SecretReward::WeaponUpgrade),
    ];

    level.ambient = vec![
        AmbientTrack::BrokenNeonBuzz,
        AmbientTrack::DistantScreams,
        AmbientTrack::TrainRumble,
    ];
    level.music = Some(AmbientTrack::IndustrialMetal);

    let objectives = vec![
        Objective::new(
            "extract_eye",
            "Extract the Eye of Oblivion",
            ObjectiveGoal::Extract {
                artifact: "eye_of_oblivion".to_string(),
            },
            1.0,
        ),
        Objective::new(
            "survive_ambush",
            "Survive the three-faction ambush",
            ObjectiveGoal::Survive,
            180_000.0,
        ),
        Objective::new(
            "wall_run_mastery",
            "Master the wall-run on the suspended trains",
            ObjectiveGoal::WallRuns,
            5.0,
        ),
    ];

    let artifacts = vec![
        Artifact::new(
            "eye_of_oblivion",
            "Eye of Oblivion",
            "Lets its bearer see through digital illusions",
            17,
            17,
            "Reveals hidden enemies and secret passages",
        ),
        Artifact::new(
            "gravity_hook",
            "Gravity Hook",
            "Device that bends local gravity",
            10,
            8,
            "Allows advanced vertical movement",
        ),
    ];

    let enemies = vec![
        enemy(
            "neural_assassin_1",
            EnemyKind::NeuralAssassin,
            (12, 12),
            0.5,
            0.0,
            70.0,
            EnemyState::Patrolling,
            square_patrol(10.0, 10.0, 14.0, 14.0),
            "stealth_cloak",
            Some("cyber_mafia"),
        ),
        enemy(
            "biomech_dog_1",
            EnemyKind::BiomechDog,
            (20, 8),
            0.3,
            FRAC_PI_3,
            50.0,
            EnemyState::Patrolling,
            square_patrol(18.0, 6.0, 22.0, 10.0),
            "pack_hunt",
            Some("clone_factory"),
        ),
        enemy(
            "cerebral_kamikaze_1",
            EnemyKind::CerebralKamikaze,
            (8, 25),
            0.5,
            PI,
            30.0,
            EnemyState::Idle,
            vec![Vec2::new(8.0, 25.0)],
            "brain_explosion",
            Some("oblivion_cult"),
        ),
    ];

    LevelData {
        number: 2,
        level,
        objectives,
        artifacts,
        enemies,
    }
}
