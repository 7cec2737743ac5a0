//! Collision detection and response against the tile grid
//!
//! Entities are points. A point inside a blocked cell is pushed out along the
//! axis where it is furthest from the cell centre, to just past the nearest
//! cell boundary. No swept tests: a fast enough step can tunnel through a
//! one-cell wall.

use glam::Vec2;

use super::level::TileGrid;

/// How far past the boundary a pushed point lands, so it is not inside the
/// blocked cell after flooring
const PUSH_EPSILON: f32 = 1e-4;

/// Result of a wall collision check
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    /// Whether the point was inside a blocked cell
    pub hit: bool,
    /// Push direction (unit axis vector, zero on miss)
    pub normal: Vec2,
    /// Distance moved
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Push `pos` out of a blocked cell, if it is in one
pub fn resolve_wall_collision(walls: &TileGrid, pos: &mut Vec2) -> CollisionResult {
    if !walls.is_blocked(*pos) {
        return CollisionResult::miss();
    }
    let Some(cell) = TileGrid::cell_of(*pos) else {
        return CollisionResult::miss();
    };
    let centre = cell.as_vec2() + Vec2::splat(0.5);
    let diff = *pos - centre;
    let before = *pos;

    let normal = if diff.x.abs() > diff.y.abs() {
        let sign = if diff.x > 0.0 { 1.0 } else { -1.0 };
        pos.x = centre.x + sign * (0.5 + PUSH_EPSILON);
        Vec2::new(sign, 0.0)
    } else {
        let sign = if diff.y > 0.0 { 1.0 } else { -1.0 };
        pos.y = centre.y + sign * (0.5 + PUSH_EPSILON);
        Vec2::new(0.0, sign)
    };

    CollisionResult {
        hit: true,
        normal,
        penetration: before.distance(*pos),
    }
}

/// Move a point from `from` to `to`, resolving against walls. A target that
/// is still blocked after the push (a corner between two walls) keeps the
/// point at `from`.
pub fn move_point(walls: &TileGrid, from: Vec2, to: Vec2) -> Vec2 {
    let mut pos = to;
    resolve_wall_collision(walls, &mut pos);
    if walls.is_blocked(pos) { from } else { pos }
}

/// Probe for a wall beside the entity: `side` is -1 for left, +1 for right
pub fn wall_beside(walls: &TileGrid, pos: Vec2, dir: f32, side: f32, distance: f32) -> bool {
    let angle = dir + side * std::f32::consts::FRAC_PI_2;
    walls.is_blocked(pos + Vec2::from_angle(angle) * distance)
}

/// Sampled line-of-sight test.
///
/// Takes `floor(distance * samples_per_unit)` steps and tests the interior
/// sample points (endpoints excluded); the first blocked sample ends the
/// test. Samples outside the grid count as open.
pub fn line_of_sight(walls: &TileGrid, from: Vec2, to: Vec2, samples_per_unit: f32) -> bool {
    let distance = from.distance(to);
    if !distance.is_finite() {
        return false;
    }
    let steps = (distance * samples_per_unit).floor() as u32;
    for i in 1..steps {
        let t = i as f32 / steps as f32;
        if walls.is_blocked(from.lerp(to, t)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_block(x: i32, y: i32) -> TileGrid {
        let mut grid = TileGrid::filled(8, 8, 0);
        grid.set(x, y, 1);
        grid
    }

    #[test]
    fn test_open_cell_is_untouched() {
        let grid = grid_with_block(3, 3);
        let mut pos = Vec2::new(1.5, 1.5);
        let result = resolve_wall_collision(&grid, &mut pos);
        assert!(!result.hit);
        assert_eq!(pos, Vec2::new(1.5, 1.5));
    }

    #[test]
    fn test_push_out_along_major_axis() {
        let grid = grid_with_block(3, 3);

        // Deeper along x: leave through the right face
        let mut pos = Vec2::new(3.9, 3.6);
        let result = resolve_wall_collision(&grid, &mut pos);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::new(1.0, 0.0));
        assert!(pos.x >= 4.0);
        assert!(!grid.is_blocked(pos));

        // Deeper along -y: leave through the top face
        let mut pos = Vec2::new(3.5, 3.05);
        let result = resolve_wall_collision(&grid, &mut pos);
        assert_eq!(result.normal, Vec2::new(0.0, -1.0));
        assert!(pos.y < 3.0);
        assert!(!grid.is_blocked(pos));
    }

    #[test]
    fn test_move_point_refuses_corner() {
        let mut grid = grid_with_block(0, 0);
        grid.set(1, 0, 1);
        grid.set(0, 1, 1);

        let from = Vec2::new(1.02, 1.02);
        assert_eq!(move_point(&grid, from, Vec2::new(0.96, 0.97)), from);

        let to = move_point(&grid, from, Vec2::new(1.5, 0.9));
        assert!(!grid.is_blocked(to));
        assert!(to.y > 1.0);
    }

    #[test]
    fn test_line_of_sight_blocked_by_wall() {
        let grid = grid_with_block(4, 1);
        assert!(!line_of_sight(&grid, Vec2::new(1.5, 1.5), Vec2::new(6.5, 1.5), 2.0));
        assert!(line_of_sight(&grid, Vec2::new(1.5, 3.5), Vec2::new(6.5, 3.5), 2.0));
    }

    #[test]
    fn test_line_of_sight_outside_grid_is_open() {
        let grid = TileGrid::filled(4, 4, 0);
        assert!(line_of_sight(&grid, Vec2::new(-10.0, -10.0), Vec2::new(20.0, -3.0), 8.0));
    }

    #[test]
    fn test_wall_beside() {
        let grid = grid_with_block(2, 3);
        // Facing +x, the left side (-π/2) points toward -y
        let pos = Vec2::new(2.5, 4.3);
        assert!(wall_beside(&grid, pos, 0.0, -1.0, 0.6));
        assert!(!wall_beside(&grid, pos, 0.0, 1.0, 0.6));
    }
}
