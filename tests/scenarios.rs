//! End-to-end play scenarios driven through the public simulation API

use glam::{IVec2, Vec2, Vec3};

use silicon_requiem::audio::{AmbientTrack, AudioSink, NullAudio, SoundCue};
use silicon_requiem::consts::*;
use silicon_requiem::error::LevelError;
use silicon_requiem::input::InputSnapshot;
use silicon_requiem::sim::levels::BOSS_DOOR_TILE;
use silicon_requiem::sim::state::SpecialEffect;
use silicon_requiem::sim::{
    Campaign, Enemy, EnemyKind, EnemyState, GameMode, GameState, InteractableKind, Level,
    LevelData, LevelProvider, Objective, ObjectiveGoal, Owner, Projectile, ProjectileKind,
    TickInput, tick,
};
use silicon_requiem::{Game, Settings};

/// Records every cue and loop change for later assertions
#[derive(Debug, Default)]
struct Recorder {
    cues: Vec<SoundCue>,
    loops: Vec<AmbientTrack>,
}

impl Recorder {
    fn count(&self, cue: SoundCue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioSink for Recorder {
    fn play(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }
    fn play_loop(&mut self, track: AmbientTrack) {
        if !self.loops.contains(&track) {
            self.loops.push(track);
        }
    }
    fn stop_loop(&mut self, track: AmbientTrack) {
        self.loops.retain(|&t| t != track);
    }
    fn stop_all_loops(&mut self) {
        self.loops.clear();
    }
    fn set_music_volume(&mut self, _volume: f32) {}
    fn set_sfx_volume(&mut self, _volume: f32) {}
}

fn arena(seed: u64) -> GameState {
    let mut state = GameState::new(seed);
    let mut level = Level::empty(16, 16);
    level.spawn_points = vec![IVec2::new(3, 3)];
    state.load_level(LevelData {
        number: 1,
        level,
        objectives: vec![Objective::new("stay", "Stay alive", ObjectiveGoal::Survive, 1e9)],
        artifacts: Vec::new(),
        enemies: Vec::new(),
    });
    state
}

fn bolt(at: Vec3, damage: f32) -> Projectile {
    Projectile {
        pos: at,
        velocity: Vec3::ZERO,
        damage,
        kind: ProjectileKind::Plasma,
        lifetime: 1000.0,
        owner: Owner::Player,
        effect: None::<SpecialEffect>,
    }
}

#[test]
fn test_collecting_all_reliquaries_opens_boss_door() {
    let mut state = GameState::new(7);
    state.load_level(Campaign.load(1).unwrap());
    state.enemies.clear();
    let mut audio = Recorder::default();

    let reliquaries: Vec<Vec2> = state
        .level
        .interactables
        .iter()
        .filter(|i| i.kind == InteractableKind::DataReliquary)
        .map(|i| i.world_pos())
        .collect();
    assert_eq!(reliquaries.len(), 3);
    assert_eq!(state.level.walls.get(22, 25), Some(BOSS_DOOR_TILE));

    let interact = TickInput {
        interact: true,
        ..Default::default()
    };
    for target in &reliquaries {
        // One unit west of the pickup, facing east
        state.player.pos = Vec3::new(target.x - 1.0, target.y, GROUND_HEIGHT);
        state.player.dir = 0.0;
        tick(&mut state, &interact, 16.0, &mut audio);
    }

    assert_eq!(state.player.memory_fragments, 3);
    let recover = state.objective("recover_memory").unwrap();
    assert_eq!(recover.progress, 3.0);
    assert!(recover.completed);
    assert_eq!(audio.count(SoundCue::MemoryRecovered), 3);

    // A spent reliquary cannot be collected twice
    tick(&mut state, &interact, 16.0, &mut audio);
    assert_eq!(state.player.memory_fragments, 3);

    assert_eq!(state.level.walls.get(22, 25), Some(0));
    assert!(state.level.interactable("boss_door").unwrap().activated);
    assert_eq!(audio.count(SoundCue::CoreDeactivated), 1);

    tick(&mut state, &TickInput::default(), 16.0, &mut audio);
    assert_eq!(audio.count(SoundCue::CoreDeactivated), 1);
}

#[test]
fn test_enemy_dies_exactly_once() {
    let mut state = arena(3);
    let at = Vec3::new(12.5, 3.5, GROUND_HEIGHT);
    state
        .enemies
        .push(Enemy::new("monk", EnemyKind::CyberMonk, at, 60.0));
    let mut audio = Recorder::default();

    let mut seen = Vec::new();
    for _ in 0..3 {
        state.projectiles.push(bolt(at, 25.0));
        tick(&mut state, &TickInput::default(), 16.0, &mut audio);
        seen.push(state.enemies.first().map(|e| e.health));
    }

    assert_eq!(seen, vec![Some(35.0), Some(10.0), None]);
    assert_eq!(audio.count(SoundCue::EnemyDeath), 1);
    assert_eq!(state.score, EnemyKind::CyberMonk.score());
    assert!(!state.particles.is_empty());

    // A stray hit on the same spot finds nothing to kill
    state.projectiles.push(bolt(at, 25.0));
    tick(&mut state, &TickInput::default(), 16.0, &mut audio);
    assert_eq!(audio.count(SoundCue::EnemyDeath), 1);
    assert_eq!(state.score, EnemyKind::CyberMonk.score());
}

#[test]
fn test_melee_kills_player_and_freezes_state() {
    let mut state = arena(5);
    let player = state.player.pos;
    let mut monk = Enemy::new(
        "monk",
        EnemyKind::CyberMonk,
        player + Vec3::new(0.5, 0.0, 0.0),
        60.0,
    );
    monk.state = EnemyState::Attacking;
    state.enemies.push(monk);

    let mut ticks = 0;
    while state.mode == GameMode::Playing && ticks < 100 {
        tick(&mut state, &TickInput::default(), 16.0, &mut NullAudio);
        ticks += 1;
    }
    assert_eq!(state.mode, GameMode::Dead);
    assert!(state.player.health <= 0.0);
    // 15 damage per tick from full health
    assert_eq!(ticks, 7);

    let frozen = (state.game_time, state.player.clone(), state.score);
    for _ in 0..10 {
        tick(
            &mut state,
            &TickInput {
                forward: true,
                fire: true,
                ..Default::default()
            },
            16.0,
            &mut NullAudio,
        );
    }
    assert_eq!((state.game_time, state.player.clone(), state.score), frozen);
}

#[test]
fn test_fragment_secret_counts_toward_objective() {
    let mut state = GameState::new(9);
    state.load_level(Campaign.load(1).unwrap());
    state.enemies.clear();

    // Secret alcove spans cells (5..8, 15..18)
    state.player.pos = Vec3::new(6.5, 16.5, GROUND_HEIGHT);
    tick(&mut state, &TickInput::default(), 16.0, &mut NullAudio);
    assert_eq!(state.player.memory_fragments, 1);
    assert_eq!(state.objective("recover_memory").unwrap().progress, 1.0);

    tick(&mut state, &TickInput::default(), 16.0, &mut NullAudio);
    assert_eq!(state.player.memory_fragments, 1);
}

/// One short survival level per number, up to `last`
struct Gauntlet {
    last: u32,
}

impl LevelProvider for Gauntlet {
    fn load(&self, number: u32) -> Result<LevelData, LevelError> {
        if number == 0 || number > self.last {
            return Err(LevelError::NotFound(number));
        }
        let mut level = Level::empty(12, 12);
        level.spawn_points = vec![IVec2::new(5, 5)];
        level.music = Some(AmbientTrack::Level1Background);
        Ok(LevelData {
            number,
            level,
            objectives: vec![Objective::new("hold", "Hold out", ObjectiveGoal::Survive, 50.0)],
            artifacts: Vec::new(),
            enemies: Vec::new(),
        })
    }
}

fn run_frames(game: &mut Game, frames: usize, dt: f32) {
    for _ in 0..frames {
        game.frame(dt, &InputSnapshot::default());
    }
}

#[test]
fn test_level_complete_advances_after_delay() {
    let mut game = Game::new(Box::new(Gauntlet { last: 2 }), Box::new(NullAudio), 1);
    game.apply_settings(Settings::default());
    game.start();
    assert_eq!(game.state().current_level, 1);

    run_frames(&mut game, 4, 16.0);
    assert_eq!(game.mode(), GameMode::LevelComplete);
    let score = game.state().score;
    assert_eq!(score, OBJECTIVE_SCORE);

    // Still waiting just short of the delay
    run_frames(&mut game, 29, 100.0);
    assert_eq!(game.mode(), GameMode::LevelComplete);
    assert_eq!(game.state().current_level, 1);

    run_frames(&mut game, 1, 100.0);
    assert_eq!(game.mode(), GameMode::Playing);
    assert_eq!(game.state().current_level, 2);
    assert_eq!(game.state().score, score);
    assert!(!game.is_campaign_complete());

    run_frames(&mut game, 4, 16.0);
    run_frames(&mut game, 31, 100.0);
    assert!(game.is_campaign_complete());
    assert_eq!(game.mode(), GameMode::LevelComplete);
}

#[test]
fn test_pause_stops_the_clock() {
    let mut game = Game::new(Box::new(Campaign), Box::new(NullAudio), 2);
    game.start();
    run_frames(&mut game, 3, 16.0);
    let time = game.state().game_time;

    game.pause();
    assert_eq!(game.mode(), GameMode::Paused);
    run_frames(&mut game, 10, 16.0);
    assert_eq!(game.state().game_time, time);

    game.resume();
    run_frames(&mut game, 1, 16.0);
    assert_eq!(game.mode(), GameMode::Playing);
    assert!(game.state().game_time > time);
}
