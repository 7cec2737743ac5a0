//! Simulation step
//!
//! Advances the game by one frame. Stage order is fixed: later stages read
//! what earlier stages wrote (combat sees this tick's positions, completion
//! sees this tick's kills).

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3Swizzles};
use rand::Rng;

use super::ai;
use super::collision::{line_of_sight, move_point, wall_beside};
use super::level::{InteractableKind, ObjectiveGoal, SecretReward, TriggerCondition, TriggerStage};
use super::particles;
use super::state::{EnemyState, GameMode, GameState, Owner, Player, SpecialEffect};
use super::weapons::WeaponKind;
use crate::audio::{AudioSink, SoundCue};
use crate::consts::*;
use crate::normalize_angle;

/// Line-of-sight samples per unit when aiming at a pickup
const PICKUP_SIGHT_SAMPLES: f32 = 8.0;
/// Soul energy granted by a soul energy secret
const SECRET_SOUL_ENERGY: f32 = 25.0;

/// Commands for a single tick, derived from the polled input snapshot
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    /// Held; gated by the dash cooldown
    pub dash: bool,
    /// Held; only acts on the ground or on a wall
    pub jump: bool,
    /// Held; gated by the weapon's fire rate
    pub fire: bool,
    /// Edge
    pub interact: bool,
    /// Edge
    pub time_slow: bool,
    /// Edge: weapon slot index
    pub select_weapon: Option<usize>,
    /// Horizontal pointer movement in pixels, sensitivity already applied
    pub yaw_delta: f32,
}

/// Advance the game state by `dt` milliseconds. Does nothing unless playing.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32, audio: &mut dyn AudioSink) {
    if state.mode != GameMode::Playing {
        return;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    state.game_time += dt as f64;
    run_triggers(state, TriggerStage::Opening, audio);
    update_player(state, input, dt, audio);
    update_enemies(state, dt);
    update_projectiles(state, dt, audio);
    particles::update(&mut state.particles, dt);
    resolve_combat(state, audio);

    if state.player.is_dead() {
        state.mode = GameMode::Dead;
        log::info!("Player died at {:.0} ms, score {}", state.game_time, state.score);
        cleanup(state);
        return;
    }

    update_resources(state, dt);

    if state.all_objectives_complete() {
        state.mode = GameMode::LevelComplete;
        audio.play(SoundCue::LevelComplete);
        log::info!("Level {} complete, score {}", state.current_level, state.score);
    }

    run_triggers(state, TriggerStage::Secondary, audio);
    cleanup(state);
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32, audio: &mut dyn AudioSink) {
    let player = &mut state.player;
    player.dir = normalize_angle(player.dir + input.yaw_delta * MOUSE_YAW_PER_PIXEL);

    let speed = if player.wall_running {
        WALL_RUN_SPEED
    } else {
        MOVE_SPEED
    };
    let mut heading = Vec2::ZERO;
    if input.forward {
        heading += Vec2::from_angle(player.dir);
    }
    if input.back {
        heading -= Vec2::from_angle(player.dir);
    }
    if input.strafe_left {
        heading += Vec2::from_angle(player.dir - FRAC_PI_2);
    }
    if input.strafe_right {
        heading += Vec2::from_angle(player.dir + FRAC_PI_2);
    }
    let mut pos = player.pos.xy() + heading * speed * dt;

    if input.dash && player.dash_cooldown <= 0.0 {
        let (distance, cooldown) = if player.has_gravity_hook {
            (DASH_DISTANCE_HOOKED, DASH_COOLDOWN_HOOKED_MS)
        } else {
            (DASH_DISTANCE, DASH_COOLDOWN_MS)
        };
        pos += player.facing() * distance;
        player.dash_cooldown = cooldown;
        particles::emit(
            &particles::DASH,
            player.pos,
            player.dir,
            &mut state.particles,
            &mut state.rng,
        );
        audio.play(SoundCue::Dash);
    }

    // Wall-run: lateral key held against a wall while budget remains
    let side = match (input.strafe_left, input.strafe_right) {
        (true, false) => Some(-1.0),
        (false, true) => Some(1.0),
        _ => None,
    };
    let mut wall_run_started = false;
    match side {
        None => {
            player.wall_running = false;
            player.wall_run_time = 0.0;
            player.wall_run_armed = true;
        }
        Some(side) => {
            let wall = wall_beside(&state.level.walls, pos, player.dir, side, WALL_RUN_PROBE);
            if player.wall_running {
                player.wall_run_time += dt;
                if !wall || player.wall_run_time > player.max_wall_run_time {
                    player.wall_running = false;
                }
            } else {
                // Off the wall mid-run (after a wall jump) the budget keeps draining
                if !player.wall_run_armed {
                    player.wall_run_time += dt;
                }
                if wall && player.wall_run_time < player.max_wall_run_time {
                    player.wall_running = true;
                    wall_run_started = player.wall_run_armed;
                    player.wall_run_armed = false;
                    audio.play(SoundCue::WallRunStart);
                }
            }
        }
    }

    if input.jump && (player.on_ground || player.wall_running) {
        if player.wall_running {
            player.velocity.z = WALL_JUMP_VELOCITY;
            player.wall_running = false;
            audio.play(SoundCue::WallJump);
        } else {
            player.velocity.z = JUMP_VELOCITY;
        }
        player.on_ground = false;
    }

    if player.wall_running {
        player.velocity.z = 0.0;
    } else if !player.on_ground {
        player.velocity.z -= GRAVITY * dt;
    }
    player.pos.z += player.velocity.z * dt;
    if player.pos.z <= GROUND_HEIGHT {
        if !player.on_ground && !player.wall_running {
            player.wall_run_time = 0.0;
            player.wall_run_armed = true;
        }
        player.pos.z = GROUND_HEIGHT;
        player.velocity.z = 0.0;
        player.on_ground = true;
    }

    let pos = move_point(&state.level.walls, player.pos.xy(), pos);
    player.pos.x = pos.x;
    player.pos.y = pos.y;

    if let Some(weapon) = input.select_weapon.and_then(WeaponKind::from_index)
        && (weapon != WeaponKind::GravityHook || player.has_gravity_hook)
    {
        player.active_weapon = weapon;
    }

    if wall_run_started {
        state.advance_objectives(|g| *g == ObjectiveGoal::WallRuns, 1.0);
    }

    if input.fire {
        let fired = state.arsenal.fire(
            &mut state.player,
            state.game_time,
            &mut state.projectiles,
            &mut state.particles,
            &mut state.rng,
            audio,
        );
        if !fired {
            log::trace!("{:?} held back by its gates", state.player.active_weapon);
        }
        if state.player.weapon_anim_frame == 0 {
            state.player.weapon_anim_frame = 1;
            state.player.weapon_anim_time = 0.0;
        }
    }
    advance_weapon_animation(&mut state.player, dt);

    let player = &mut state.player;
    if input.time_slow && player.time_slow_cooldown <= 0.0 && player.soul_energy >= TIME_SLOW_COST {
        player.soul_energy -= TIME_SLOW_COST;
        player.time_slow_cooldown = TIME_SLOW_COOLDOWN_MS;
        player.time_slow_remaining = TIME_SLOW_DURATION_MS;
        audio.play(SoundCue::TimeSlowActivated);
    }

    if input.interact {
        interact(state, audio);
    }
    discover_secrets(state);
}

fn advance_weapon_animation(player: &mut Player, dt: f32) {
    if player.weapon_anim_frame == 0 {
        return;
    }
    player.weapon_anim_time += dt;
    while player.weapon_anim_frame > 0 && player.weapon_anim_time >= WEAPON_FRAME_MS {
        player.weapon_anim_time -= WEAPON_FRAME_MS;
        player.weapon_anim_frame += 1;
        if player.weapon_anim_frame >= WEAPON_ANIM_FRAMES {
            player.weapon_anim_frame = 0;
            player.weapon_anim_time = 0.0;
        }
    }
}

/// Index of the interactable the player would use right now
pub fn interaction_target(state: &GameState) -> Option<usize> {
    let pos = state.player_pos();
    let dir = state.player.dir;
    let level = &state.level;
    let usable = level
        .interactables
        .iter()
        .enumerate()
        .filter(|(_, i)| !i.activated && !i.kind.is_door());

    let closest = |candidates: &mut dyn Iterator<Item = (usize, f32)>| {
        candidates
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    };

    let proximity = closest(
        &mut usable
            .clone()
            .filter(|(_, i)| i.kind.is_proximity())
            .map(|(index, i)| (index, i.world_pos().distance(pos)))
            .filter(|&(_, d)| d < PROXIMITY_RANGE),
    );
    proximity.or_else(|| {
        closest(
            &mut usable
                .filter(|(_, i)| i.kind == InteractableKind::DataReliquary)
                .filter_map(|(index, i)| {
                    let target = i.world_pos();
                    let offset = target - pos;
                    let distance = offset.length();
                    let bearing = offset.y.atan2(offset.x);
                    let aimed = normalize_angle(bearing - dir).abs() < PICKUP_AIM_CONE;
                    (distance < PICKUP_RANGE
                        && aimed
                        && line_of_sight(&level.walls, pos, target, PICKUP_SIGHT_SAMPLES))
                    .then_some((index, distance))
                }),
        )
    })
}

fn interact(state: &mut GameState, audio: &mut dyn AudioSink) {
    match interaction_target(state) {
        Some(index) => activate(state, index, audio),
        None => extract_artifact(state, audio),
    }
}

fn activate(state: &mut GameState, index: usize, audio: &mut dyn AudioSink) {
    let (kind, origin) = {
        let target = &state.level.interactables[index];
        (target.kind, target.world_pos().extend(GROUND_HEIGHT))
    };

    match kind {
        InteractableKind::DataReliquary => {
            let player = &mut state.player;
            player.memory_fragments = (player.memory_fragments + 1).min(player.max_memory_fragments);
            state.advance_objectives(|g| *g == ObjectiveGoal::CollectFragments, 1.0);
            particles::emit(
                &particles::MEMORY_FRAGMENT,
                origin,
                0.0,
                &mut state.particles,
                &mut state.rng,
            );
            audio.play(SoundCue::MemoryRecovered);
        }
        InteractableKind::SacredCore => {
            if state.player.memory_fragments < state.player.max_memory_fragments {
                return;
            }
            state.advance_objectives(|g| *g == ObjectiveGoal::ActivateCore, 1.0);
            audio.play(SoundCue::CoreDeactivated);
        }
        InteractableKind::GravityRail => {
            state.player.has_gravity_hook = true;
            audio.play(SoundCue::GravityHookAcquired);
        }
        InteractableKind::MemoryTerminal => {
            state.player.soul_energy = state.player.max_soul_energy;
            audio.play(SoundCue::MemoryRecovered);
        }
        InteractableKind::BossReward => {
            let claimed = claim_targets(state);
            for artifact in state.artifacts.iter_mut().filter(|a| claimed.contains(&a.id)) {
                artifact.collected = true;
            }
            state.advance_objectives(|g| matches!(g, ObjectiveGoal::ClaimReward { .. }), 1.0);
            if let Some(panel) = state.level.reward_panel.clone()
                && state.level.spawn_once(&panel)
            {
                log::info!("Reward panel '{}' revealed", panel.id);
            }
            audio.play(SoundCue::MemoryRecovered);
        }
        InteractableKind::SecretPanel => {
            state.advance_objectives(|g| *g == ObjectiveGoal::ActivateCore, 1.0);
            audio.play(SoundCue::CoreDeactivated);
        }
        InteractableKind::BossDoor | InteractableKind::SecretDoor | InteractableKind::BiometricDoor => {
            return;
        }
    }

    let target = &mut state.level.interactables[index];
    target.activated = true;
    log::debug!("Activated '{}'", target.id);
}

/// Artifacts handed out by the boss reward rather than picked up directly
fn claim_targets(state: &GameState) -> Vec<String> {
    state
        .objectives
        .iter()
        .filter_map(|o| match &o.goal {
            ObjectiveGoal::ClaimReward { artifact } => Some(artifact.clone()),
            _ => None,
        })
        .collect()
}

fn extract_artifact(state: &mut GameState, audio: &mut dyn AudioSink) {
    let pos = state.player_pos();
    let reserved = claim_targets(state);
    let nearest = state
        .artifacts
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.collected && !reserved.contains(&a.id))
        .map(|(index, a)| (index, a.world_pos().distance(pos)))
        .filter(|&(_, d)| d < PROXIMITY_RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let Some((index, _)) = nearest else {
        return;
    };

    let artifact = &mut state.artifacts[index];
    artifact.collected = true;
    let id = artifact.id.clone();
    log::info!("Artifact '{}' extracted", id);
    state.advance_objectives(
        |g| matches!(g, ObjectiveGoal::Extract { artifact } if *artifact == id),
        1.0,
    );
    audio.play(SoundCue::MemoryRecovered);
}

fn discover_secrets(state: &mut GameState) {
    let pos = state.player_pos();
    let mut rewards = Vec::new();
    for secret in state
        .level
        .secrets
        .iter_mut()
        .filter(|s| !s.discovered && s.bounds.contains(pos))
    {
        secret.discovered = true;
        rewards.push(secret.reward);
    }

    for reward in rewards {
        log::info!("Secret discovered: {:?}", reward);
        let player = &mut state.player;
        match reward {
            SecretReward::MemoryFragment => {
                player.memory_fragments = (player.memory_fragments + 1).min(player.max_memory_fragments);
                state.advance_objectives(|g| *g == ObjectiveGoal::CollectFragments, 1.0);
            }
            SecretReward::WeaponUpgrade => player.weapon_upgrades += 1,
            SecretReward::Artifact => state.score += ARTIFACT_SECRET_SCORE,
            SecretReward::SoulEnergy => {
                player.soul_energy = (player.soul_energy + SECRET_SOUL_ENERGY).min(player.max_soul_energy);
            }
        }
    }
}

/// Enemy timescale this tick
fn enemy_time_factor(state: &GameState) -> f32 {
    if state.player.time_slow_remaining > 0.0 {
        TIME_SLOW_FACTOR
    } else {
        1.0
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let enemy_dt = dt * enemy_time_factor(state);
    let player = state.player_pos();
    let now = state.game_time;

    for enemy in state.enemies.iter_mut() {
        ai::update_enemy(enemy, player, &state.level.walls, now, enemy_dt, &mut state.rng);
        if enemy.kind.chants()
            && !enemy.is_dead()
            && state.rng.random::<f32>() < CHANT_CHANCE_PER_MS * enemy_dt
        {
            particles::emit(
                &particles::BINARY_CHANT,
                enemy.pos,
                enemy.dir,
                &mut state.particles,
                &mut state.rng,
            );
        }
    }
}

fn update_projectiles(state: &mut GameState, dt: f32, audio: &mut dyn AudioSink) {
    for projectile in state.projectiles.iter_mut().filter(|p| p.is_live()) {
        projectile.pos += projectile.velocity * dt;
        projectile.lifetime -= dt;
        if state.level.walls.is_blocked(projectile.pos.xy()) {
            projectile.lifetime = 0.0;
            particles::emit(
                &particles::IMPACT,
                projectile.pos,
                0.0,
                &mut state.particles,
                &mut state.rng,
            );
            audio.play(SoundCue::LaserImpactEcho);
        }
    }
}

fn resolve_combat(state: &mut GameState, audio: &mut dyn AudioSink) {
    let player_pos = state.player_pos();
    let mut kills = Vec::new();

    for projectile in state
        .projectiles
        .iter_mut()
        .filter(|p| p.is_live() && p.owner == Owner::Player)
    {
        let hit = projectile.pos.xy();
        let Some(enemy) = state
            .enemies
            .iter_mut()
            .find(|e| !e.is_dead() && e.pos.xy().distance(hit) < HIT_RADIUS)
        else {
            continue;
        };

        enemy.health -= projectile.damage;
        projectile.lifetime = 0.0;

        if enemy.health <= 0.0 {
            enemy.state = EnemyState::Dead;
            particles::emit(
                &particles::DEATH,
                enemy.pos,
                enemy.dir,
                &mut state.particles,
                &mut state.rng,
            );
            audio.play(SoundCue::EnemyDeath);
            kills.push(enemy.kind);
            continue;
        }

        if projectile.effect == Some(SpecialEffect::GravityPull) {
            let from = enemy.pos.xy();
            let offset = player_pos - from;
            let distance = offset.length();
            if distance > f32::EPSILON {
                let to = from + offset / distance * distance.min(GRAVITY_PULL_DISTANCE);
                let pos = move_point(&state.level.walls, from, to);
                enemy.pos.x = pos.x;
                enemy.pos.y = pos.y;
            }
        }
        particles::emit(
            &particles::NEON_GLITCH,
            projectile.pos,
            0.0,
            &mut state.particles,
            &mut state.rng,
        );
    }

    for projectile in state
        .projectiles
        .iter_mut()
        .filter(|p| p.is_live() && p.owner == Owner::Enemy)
    {
        if projectile.pos.xy().distance(player_pos) < HIT_RADIUS {
            state.player.health -= projectile.damage;
            projectile.lifetime = 0.0;
        }
    }

    let factor = enemy_time_factor(state);
    for enemy in state
        .enemies
        .iter()
        .filter(|e| e.state == EnemyState::Attacking)
    {
        if enemy.pos.xy().distance(player_pos) < MELEE_RANGE {
            state.player.health -= enemy.kind.melee_damage() * factor;
        }
    }

    for kind in kills {
        state.score += kind.score();
        state.advance_objectives(|g| *g == ObjectiveGoal::Defeat(kind), 1.0);
        if kind.is_boss() {
            log::info!("Boss {:?} defeated", kind);
            if let Some(reward) = state.level.boss_reward.clone()
                && state.level.spawn_once(&reward)
            {
                log::info!("Boss reward '{}' spawned", reward.id);
            }
        }
    }
}

fn update_resources(state: &mut GameState, dt: f32) {
    let player = &mut state.player;
    player.dash_cooldown = (player.dash_cooldown - dt).max(0.0);
    player.time_slow_cooldown = (player.time_slow_cooldown - dt).max(0.0);
    player.time_slow_remaining = (player.time_slow_remaining - dt).max(0.0);
    if player.soul_energy < player.max_soul_energy {
        player.soul_energy = (player.soul_energy + SOUL_REGEN_PER_MS * dt).min(player.max_soul_energy);
    }
    state.advance_objectives(|g| *g == ObjectiveGoal::Survive, dt);
}

/// Open every door of `stage` whose condition holds. Idempotent.
fn run_triggers(state: &mut GameState, stage: TriggerStage, audio: &mut dyn AudioSink) {
    let ready: Vec<usize> = state
        .level
        .triggers
        .iter()
        .enumerate()
        .filter(|(_, t)| t.stage == stage)
        .filter(|(_, t)| {
            let opened = state.level.walls.get(t.cell.x, t.cell.y) == Some(0)
                || state.level.interactable(&t.door).is_some_and(|d| d.activated);
            !opened
        })
        .filter(|(_, t)| match &t.condition {
            TriggerCondition::FragmentsAtLeast(n) => state.player.memory_fragments >= *n,
            TriggerCondition::AllObjectivesExcept(id) => {
                let mut rest = state.objectives.iter().filter(|o| o.id != *id);
                let pending = state.objective(id).is_some_and(|o| !o.completed);
                pending && rest.all(|o| o.completed)
            }
        })
        .map(|(index, _)| index)
        .collect();

    for index in ready {
        let trigger = state.level.triggers[index].clone();
        state.level.walls.set(trigger.cell.x, trigger.cell.y, 0);
        if let Some(door) = state
            .level
            .interactables
            .iter_mut()
            .find(|d| d.id == trigger.door)
        {
            door.activated = true;
        }
        log::info!("Door '{}' opened", trigger.door);
        if stage == TriggerStage::Opening {
            audio.play(SoundCue::CoreDeactivated);
        }
    }
}

fn cleanup(state: &mut GameState) {
    state.projectiles.retain(|p| p.is_live());
    state.particles.retain(|p| p.lifetime > 0.0);
    state.enemies.retain(|e| !e.is_dead());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::sim::level::{Level, LevelData, Objective};
    use crate::sim::state::{Enemy, EnemyKind, Projectile, ProjectileKind};
    use glam::{IVec2, Vec3};

    fn arena() -> GameState {
        let mut state = GameState::new(11);
        let mut level = Level::empty(16, 16);
        level.spawn_points = vec![IVec2::new(3, 3)];
        state.load_level(LevelData {
            number: 1,
            level,
            objectives: vec![Objective::new("stay", "", ObjectiveGoal::Survive, 1e9)],
            artifacts: Vec::new(),
            enemies: Vec::new(),
        });
        state
    }

    fn run(state: &mut GameState, input: &TickInput, dt: f32) {
        tick(state, input, dt, &mut NullAudio);
    }

    #[test]
    fn test_tick_ignored_unless_playing() {
        let mut state = arena();
        state.mode = GameMode::Paused;
        run(&mut state, &TickInput::default(), 16.0);
        assert_eq!(state.game_time, 0.0);
    }

    #[test]
    fn test_forward_movement() {
        let mut state = arena();
        let input = TickInput {
            forward: true,
            ..Default::default()
        };
        let start = state.player.pos.x;
        run(&mut state, &input, 100.0);
        assert!((state.player.pos.x - (start + MOVE_SPEED * 100.0)).abs() < 1e-4);
        assert_eq!(state.game_time, 100.0);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut state = arena();
        run(&mut state, &TickInput::default(), f32::NAN);
        assert_eq!(state.game_time, 0.0);
        assert!(state.player.pos.is_finite());
    }

    #[test]
    fn test_dash_respects_cooldown() {
        let mut state = arena();
        let input = TickInput {
            dash: true,
            ..Default::default()
        };
        let start = state.player.pos.x;
        run(&mut state, &input, 0.0);
        assert!((state.player.pos.x - (start + DASH_DISTANCE)).abs() < 1e-4);
        assert_eq!(state.player.dash_cooldown, DASH_COOLDOWN_MS);
        run(&mut state, &input, 10.0);
        assert!((state.player.pos.x - (start + DASH_DISTANCE)).abs() < 1e-4);
    }

    #[test]
    fn test_jump_and_land() {
        let mut state = arena();
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        run(&mut state, &jump, 10.0);
        assert!(!state.player.on_ground);
        assert!(state.player.pos.z > GROUND_HEIGHT);
        for _ in 0..20 {
            run(&mut state, &TickInput::default(), 10.0);
        }
        assert!(state.player.on_ground);
        assert_eq!(state.player.pos.z, GROUND_HEIGHT);
    }

    #[test]
    fn test_wall_run_starts_against_wall_and_stops_on_release() {
        let mut state = arena();
        for x in 0..16 {
            state.level.walls.set(x, 2, 1);
        }
        // Facing +x, the left probe points at the wall row above
        state.player.pos = Vec3::new(5.5, 3.5, GROUND_HEIGHT);
        let left = TickInput {
            strafe_left: true,
            ..Default::default()
        };
        run(&mut state, &left, 1.0);
        assert!(state.player.wall_running);
        run(&mut state, &TickInput::default(), 1.0);
        assert!(!state.player.wall_running);
        assert_eq!(state.player.wall_run_time, 0.0);
    }

    /// Arena with a wall row at y = 2 and the player beside it, facing +x,
    /// with a wall-run objective to count runs
    fn wall_arena() -> GameState {
        let mut state = arena();
        for x in 0..16 {
            state.level.walls.set(x, 2, 1);
        }
        state.player.pos = Vec3::new(5.5, 3.5, GROUND_HEIGHT);
        state
            .objectives
            .push(Objective::new("runs", "", ObjectiveGoal::WallRuns, 1e9));
        state
    }

    fn wall_runs(state: &GameState) -> f32 {
        state.objective("runs").map_or(0.0, |o| o.progress)
    }

    #[test]
    fn test_wall_run_ends_when_budget_runs_out() {
        let mut state = wall_arena();
        let left = TickInput {
            strafe_left: true,
            ..Default::default()
        };
        // The starting tick does not drain; 30 more reach the budget exactly
        for _ in 0..31 {
            run(&mut state, &left, 100.0);
        }
        assert!(state.player.wall_running);
        assert_eq!(state.player.wall_run_time, MAX_WALL_RUN_MS);

        run(&mut state, &left, 100.0);
        assert!(!state.player.wall_running);
        // Still held against the wall, the spent budget keeps it off
        for _ in 0..10 {
            run(&mut state, &left, 100.0);
            assert!(!state.player.wall_running);
        }
        assert_eq!(wall_runs(&state), 1.0);
    }

    #[test]
    fn test_releasing_lateral_key_resets_budget() {
        let mut state = wall_arena();
        let left = TickInput {
            strafe_left: true,
            ..Default::default()
        };
        for _ in 0..40 {
            run(&mut state, &left, 100.0);
        }
        assert!(!state.player.wall_running);
        assert!(state.player.wall_run_time > MAX_WALL_RUN_MS);

        run(&mut state, &TickInput::default(), 100.0);
        assert_eq!(state.player.wall_run_time, 0.0);
        run(&mut state, &left, 100.0);
        assert!(state.player.wall_running);
        assert_eq!(wall_runs(&state), 2.0);
    }

    #[test]
    fn test_wall_jump_keeps_draining_budget() {
        let mut state = wall_arena();
        let left = TickInput {
            strafe_left: true,
            ..Default::default()
        };
        for _ in 0..10 {
            run(&mut state, &left, 100.0);
        }
        assert_eq!(state.player.wall_run_time, 900.0);

        let leap = TickInput {
            strafe_left: true,
            jump: true,
            ..Default::default()
        };
        // Short ticks so the jump does not land within the same step
        run(&mut state, &leap, 16.0);
        assert!(!state.player.wall_running);
        assert!(!state.player.on_ground);
        run(&mut state, &left, 16.0);
        assert!(state.player.wall_run_time > 900.0);
        assert!(state.player.wall_running);
        assert_eq!(wall_runs(&state), 1.0);
    }

    #[test]
    fn test_wall_jump_climb_is_bounded() {
        let mut state = wall_arena();
        let climb = TickInput {
            strafe_left: true,
            jump: true,
            ..Default::default()
        };
        let dt = 16.0;
        let ceiling = GROUND_HEIGHT
            + WALL_JUMP_VELOCITY * (MAX_WALL_RUN_MS + 2.0 * dt)
            + WALL_JUMP_VELOCITY * WALL_JUMP_VELOCITY / (2.0 * GRAVITY);

        let mut landings = 0;
        let mut counted = 0.0;
        let mut airborne = false;
        for _ in 0..2000 {
            run(&mut state, &climb, dt);
            assert!(state.player.pos.z <= ceiling, "climbed to {}", state.player.pos.z);
            if airborne && state.player.on_ground {
                landings += 1;
            }
            airborne = !state.player.on_ground;

            let runs = wall_runs(&state);
            if runs > counted {
                assert_eq!(runs - counted, 1.0);
                counted = runs;
            }
            assert!(counted <= (landings + 1) as f32);
        }
        // The first run alone covers the whole budget
        assert!(landings >= 1);
    }

    #[test]
    fn test_time_slow_costs_soul() {
        let mut state = arena();
        let input = TickInput {
            time_slow: true,
            ..Default::default()
        };
        run(&mut state, &input, 0.0);
        assert_eq!(state.player.soul_energy, PLAYER_START_SOUL - TIME_SLOW_COST);
        assert_eq!(state.player.time_slow_cooldown, TIME_SLOW_COOLDOWN_MS);
        // On cooldown: no second charge
        run(&mut state, &input, 0.0);
        assert_eq!(state.player.soul_energy, PLAYER_START_SOUL - TIME_SLOW_COST);
    }

    #[test]
    fn test_weapon_select_requires_hook() {
        let mut state = arena();
        let select = |i| TickInput {
            select_weapon: Some(i),
            ..Default::default()
        };
        run(&mut state, &select(3), 0.0);
        assert_eq!(state.player.active_weapon, WeaponKind::BiomechRifle);
        run(&mut state, &select(2), 0.0);
        assert_eq!(state.player.active_weapon, WeaponKind::SoulCannon);
        state.player.has_gravity_hook = true;
        run(&mut state, &select(3), 0.0);
        assert_eq!(state.player.active_weapon, WeaponKind::GravityHook);
    }

    #[test]
    fn test_fire_starts_weapon_animation() {
        let mut state = arena();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        run(&mut state, &fire, 0.0);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.player.weapon_anim_frame, 1);
        run(&mut state, &TickInput::default(), 60.0);
        assert_eq!(state.player.weapon_anim_frame, 2);
        run(&mut state, &TickInput::default(), 120.0);
        assert_eq!(state.player.weapon_anim_frame, 0);
    }

    #[test]
    fn test_dry_fire_still_animates() {
        let mut state = arena();
        state.player.active_weapon = WeaponKind::SoulCannon;
        state.player.soul_energy = 0.0;
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        run(&mut state, &fire, 0.0);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.weapon_anim_frame, 1);
    }

    #[test]
    fn test_projectile_expires_on_wall() {
        let mut state = arena();
        state.projectiles.push(Projectile {
            pos: Vec3::new(14.5, 3.5, 0.5),
            velocity: Vec3::new(0.02, 0.0, 0.0),
            damage: 10.0,
            kind: ProjectileKind::Plasma,
            lifetime: 3000.0,
            owner: Owner::Player,
            effect: None,
        });
        state.level.walls.set(15, 3, 1);
        run(&mut state, &TickInput::default(), 50.0);
        assert!(state.projectiles.is_empty());
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_gravity_pull_drags_enemy() {
        let mut state = arena();
        // Same row as the player so the pull is purely along -x
        let enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(9.0, 3.0, 0.5), 60.0);
        state.enemies.push(enemy);
        state.projectiles.push(Projectile {
            pos: Vec3::new(9.0, 3.0, 0.5),
            velocity: Vec3::ZERO,
            damage: 15.0,
            kind: ProjectileKind::GravityHook,
            lifetime: 100.0,
            owner: Owner::Player,
            effect: Some(SpecialEffect::GravityPull),
        });
        let start = state.enemies[0].pos.x;
        resolve_combat(&mut state, &mut NullAudio);
        assert_eq!(state.enemies[0].health, 45.0);
        assert!((state.enemies[0].pos.x - (start - GRAVITY_PULL_DISTANCE)).abs() < 1e-4);
    }

    #[test]
    fn test_secret_discovery_is_one_way() {
        let mut state = arena();
        state.level.secrets.push(crate::sim::level::Secret {
            bounds: crate::sim::level::CellBounds {
                x: 3,
                y: 3,
                width: 1,
                height: 1,
            },
            discovered: false,
            reward: SecretReward::WeaponUpgrade,
        });
        run(&mut state, &TickInput::default(), 1.0);
        run(&mut state, &TickInput::default(), 1.0);
        assert!(state.level.secrets[0].discovered);
        assert_eq!(state.player.weapon_upgrades, 1);
    }
}
