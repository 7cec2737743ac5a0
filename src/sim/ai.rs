//! Enemy state machine
//!
//! The transition table is a pure function of what the enemy perceives, so
//! it can be tested without a level. [`update_enemy`] gathers the perception,
//! applies the transition and then the movement of the resulting state.

use glam::{Vec2, Vec3Swizzles};
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{line_of_sight, move_point};
use super::level::TileGrid;
use super::state::{Enemy, EnemyState};
use crate::consts::*;

/// Line-of-sight samples per unit of distance for enemies
const ENEMY_SIGHT_SAMPLES: f32 = 2.0;

/// What an enemy knows about the player this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub distance: f32,
    /// Within view distance and not occluded
    pub can_see: bool,
    /// ms since `last_seen_player`
    pub since_last_seen: f64,
}

/// Next state for one tick.
///
/// `patrol_roll` is a uniform sample in [0, 1) used only by idle enemies.
pub fn next_state(state: EnemyState, p: &Perception, patrol_roll: f32) -> EnemyState {
    match state {
        EnemyState::Idle => {
            if p.can_see {
                EnemyState::Chasing
            } else if patrol_roll < PATROL_START_CHANCE {
                EnemyState::Patrolling
            } else {
                EnemyState::Idle
            }
        }
        EnemyState::Patrolling => {
            if p.can_see {
                EnemyState::Chasing
            } else {
                EnemyState::Patrolling
            }
        }
        EnemyState::Chasing => {
            if p.distance < ATTACK_DISTANCE {
                EnemyState::Attacking
            } else if !p.can_see && p.since_last_seen > LOST_SIGHT_MS {
                EnemyState::Patrolling
            } else {
                EnemyState::Chasing
            }
        }
        EnemyState::Attacking => {
            if p.distance > ATTACK_DISTANCE * ATTACK_EXIT_FACTOR {
                EnemyState::Chasing
            } else {
                EnemyState::Attacking
            }
        }
        EnemyState::Dead | EnemyState::Levitating | EnemyState::Charging => state,
    }
}

/// Look for the player from the enemy's position
pub fn perceive(enemy: &Enemy, player: Vec2, walls: &TileGrid, now: f64) -> Perception {
    let distance = enemy.pos.xy().distance(player);
    let can_see = distance < VIEW_DISTANCE
        && line_of_sight(walls, enemy.pos.xy(), player, ENEMY_SIGHT_SAMPLES);
    Perception {
        distance,
        can_see,
        since_last_seen: now - enemy.last_seen_player,
    }
}

/// Step toward `target` by at most `step`, then resolve against walls
fn step_toward(enemy: &mut Enemy, target: Vec2, step: f32, walls: &TileGrid) {
    let from = enemy.pos.xy();
    let offset = target - from;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return;
    }
    let pos = move_point(walls, from, from + offset / distance * step.min(distance));
    enemy.pos.x = pos.x;
    enemy.pos.y = pos.y;
}

/// Run one AI tick for a single enemy
pub fn update_enemy(
    enemy: &mut Enemy,
    player: Vec2,
    walls: &TileGrid,
    now: f64,
    dt: f32,
    rng: &mut Pcg32,
) {
    if enemy.is_dead() {
        return;
    }
    enemy.attack_cooldown = (enemy.attack_cooldown - dt).max(0.0);

    let perception = perceive(enemy, player, walls, now);
    let roll = if enemy.state == EnemyState::Idle {
        rng.random::<f32>()
    } else {
        1.0
    };
    let previous = enemy.state;
    let next = next_state(previous, &perception, roll);

    if next == EnemyState::Chasing
        && matches!(previous, EnemyState::Idle | EnemyState::Patrolling)
    {
        enemy.last_seen_player = now;
    }
    enemy.state = next;

    // Movement belongs to the state only when no transition fired this tick
    if next == previous {
        match next {
            EnemyState::Patrolling => patrol(enemy, walls, dt),
            EnemyState::Chasing => {
                step_toward(enemy, player, CHASE_SPEED * dt, walls);
                if perception.can_see {
                    enemy.last_seen_player = now;
                }
            }
            EnemyState::Attacking => {
                if enemy.attack_cooldown <= 0.0 {
                    enemy.attack_cooldown = ATTACK_COOLDOWN_MS;
                }
            }
            _ => {}
        }
    }

    if matches!(enemy.state, EnemyState::Chasing | EnemyState::Attacking) {
        let to_player = player - enemy.pos.xy();
        if to_player != Vec2::ZERO {
            enemy.dir = to_player.y.atan2(to_player.x);
        }
    }
}

fn patrol(enemy: &mut Enemy, walls: &TileGrid, dt: f32) {
    let count = enemy.patrol_points.len();
    if count == 0 {
        return;
    }
    let index = enemy.current_patrol_index % count;
    let target = enemy.patrol_points[index];
    if enemy.pos.xy().distance(target) < PATROL_ARRIVE_RADIUS {
        enemy.current_patrol_index = (index + 1) % count;
    } else {
        step_toward(enemy, target, PATROL_SPEED * dt, walls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EnemyKind;
    use glam::Vec3;
    use rand::SeedableRng;

    fn seen(distance: f32) -> Perception {
        Perception {
            distance,
            can_see: true,
            since_last_seen: 0.0,
        }
    }

    fn unseen(distance: f32, since: f64) -> Perception {
        Perception {
            distance,
            can_see: false,
            since_last_seen: since,
        }
    }

    #[test]
    fn test_idle_transitions() {
        assert_eq!(next_state(EnemyState::Idle, &seen(5.0), 0.9), EnemyState::Chasing);
        assert_eq!(next_state(EnemyState::Idle, &unseen(5.0, 0.0), 0.0), EnemyState::Patrolling);
        assert_eq!(next_state(EnemyState::Idle, &unseen(5.0, 0.0), 0.5), EnemyState::Idle);
    }

    #[test]
    fn test_chase_lost_sight_timeout() {
        let chasing = EnemyState::Chasing;
        assert_eq!(next_state(chasing, &unseen(5.0, 2999.0), 1.0), EnemyState::Chasing);
        assert_eq!(next_state(chasing, &unseen(5.0, 3000.0), 1.0), EnemyState::Chasing);
        assert_eq!(next_state(chasing, &unseen(5.0, 3001.0), 1.0), EnemyState::Patrolling);
        assert_eq!(next_state(chasing, &seen(5.0), 1.0), EnemyState::Chasing);
    }

    #[test]
    fn test_attack_hysteresis() {
        assert_eq!(next_state(EnemyState::Chasing, &seen(1.9), 1.0), EnemyState::Attacking);
        assert_eq!(next_state(EnemyState::Attacking, &seen(2.5), 1.0), EnemyState::Attacking);
        assert_eq!(next_state(EnemyState::Attacking, &seen(3.0), 1.0), EnemyState::Attacking);
        assert_eq!(next_state(EnemyState::Attacking, &seen(3.01), 1.0), EnemyState::Chasing);
    }

    #[test]
    fn test_terminal_and_reserved_states_hold() {
        for state in [EnemyState::Dead, EnemyState::Levitating, EnemyState::Charging] {
            assert_eq!(next_state(state, &seen(0.5), 0.0), state);
        }
    }

    #[test]
    fn test_walls_block_sight() {
        let mut walls = TileGrid::filled(12, 12, 0);
        for y in 0..12 {
            walls.set(5, y, 1);
        }
        let enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(2.5, 5.5, 0.5), 60.0);
        assert!(!perceive(&enemy, Vec2::new(8.5, 5.5), &walls, 0.0).can_see);
        assert!(perceive(&enemy, Vec2::new(2.5, 9.5), &walls, 0.0).can_see);
        // Out of view distance
        let open = TileGrid::filled(30, 30, 0);
        assert!(!perceive(&enemy, Vec2::new(20.5, 5.5), &open, 0.0).can_see);
    }

    #[test]
    fn test_sight_stops_short_of_view_distance() {
        let open = TileGrid::filled(30, 30, 0);
        let enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(2.5, 5.5, 0.5), 60.0);
        let edge = Vec2::new(2.5 + VIEW_DISTANCE, 5.5);
        assert_eq!(perceive(&enemy, edge, &open, 0.0).distance, VIEW_DISTANCE);
        assert!(!perceive(&enemy, edge, &open, 0.0).can_see);
        assert!(perceive(&enemy, edge - Vec2::new(0.1, 0.0), &open, 0.0).can_see);
    }

    #[test]
    fn test_patrol_advances_cyclically() {
        let walls = TileGrid::filled(10, 10, 0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(1.5, 1.5, 0.5), 60.0);
        enemy.state = EnemyState::Patrolling;
        enemy.patrol_points = vec![Vec2::new(1.5, 1.5), Vec2::new(2.5, 1.5)];
        // Player far away and out of sight range
        let player = Vec2::new(100.0, 100.0);

        update_enemy(&mut enemy, player, &walls, 0.0, 16.0, &mut rng);
        assert_eq!(enemy.current_patrol_index, 1);
        update_enemy(&mut enemy, player, &walls, 16.0, 100.0, &mut rng);
        assert!((enemy.pos.x - 1.6).abs() < 1e-4);
        assert_eq!(enemy.state, EnemyState::Patrolling);
    }

    #[test]
    fn test_chase_moves_and_faces_player() {
        let walls = TileGrid::filled(20, 20, 0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(2.5, 2.5, 0.5), 60.0);
        enemy.state = EnemyState::Chasing;
        let player = Vec2::new(8.5, 2.5);
        update_enemy(&mut enemy, player, &walls, 500.0, 100.0, &mut rng);
        assert_eq!(enemy.state, EnemyState::Chasing);
        assert!((enemy.pos.x - 2.8).abs() < 1e-4);
        assert!(enemy.dir.abs() < 1e-6);
        assert_eq!(enemy.last_seen_player, 500.0);
    }

    #[test]
    fn test_attack_resets_cooldown() {
        let walls = TileGrid::filled(10, 10, 0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut enemy = Enemy::new("e", EnemyKind::CyberMonk, Vec3::new(2.5, 2.5, 0.5), 60.0);
        enemy.state = EnemyState::Attacking;
        update_enemy(&mut enemy, Vec2::new(3.0, 2.5), &walls, 0.0, 16.0, &mut rng);
        assert_eq!(enemy.attack_cooldown, ATTACK_COOLDOWN_MS);
        update_enemy(&mut enemy, Vec2::new(3.0, 2.5), &walls, 16.0, 16.0, &mut rng);
        assert_eq!(enemy.attack_cooldown, ATTACK_COOLDOWN_MS - 16.0);
    }
}
