//! Particle effects
//!
//! Every effect is a [`ParticleProfile`]: count, direction distribution,
//! palette and lifetime range. [`emit`] is the only spawner.

use std::f32::consts::{FRAC_PI_4, PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Particle, ParticleKind};
use crate::Rgb;

/// Downward acceleration on heavy particles (units/ms²)
pub const PARTICLE_GRAVITY: f32 = 0.00001;
/// Per-tick velocity damping
pub const PARTICLE_DAMPING: f32 = 0.99;
/// Fraction of life over which particles shrink away
pub const FADE_FRACTION: f32 = 0.3;

/// Horizontal direction distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spread {
    /// Evenly spaced around the full circle
    Radial,
    /// Uniform random angle
    Random,
    /// Random angle within `width` radians around the facing (or behind it)
    Cone { width: f32, behind: bool },
}

/// Vertical velocity distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lift {
    None,
    /// Uniform in [-a, a]
    Symmetric(f32),
    /// Uniform in [lo, hi]
    Between(f32, f32),
    /// `sin(angle * 3) * a`, a rippling crown for radial bursts
    Wave(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleProfile {
    pub kind: ParticleKind,
    pub count: usize,
    pub palette: &'static [Rgb],
    pub speed: (f32, f32),
    pub lifetime: (f32, f32),
    pub size: (f32, f32),
    pub spread: Spread,
    pub lift: Lift,
    /// Spawn this far along the facing direction
    pub forward_offset: f32,
}

const CYAN: Rgb = Rgb::hex(0x00ffff);
const AMBER: Rgb = Rgb::hex(0xffaa00);
const YELLOW: Rgb = Rgb::hex(0xffff00);
const PURPLE: Rgb = Rgb::hex(0x9932cc);
const ORANGE: Rgb = Rgb::hex(0xff6b35);

pub const DASH: ParticleProfile = ParticleProfile {
    kind: ParticleKind::DigitalDecay,
    count: 15,
    palette: &[CYAN],
    speed: (0.005, 0.015),
    lifetime: (300.0, 500.0),
    size: (2.0, 4.0),
    spread: Spread::Cone { width: FRAC_PI_4, behind: true },
    lift: Lift::Symmetric(0.002),
    forward_offset: 0.0,
};

pub const IMPACT: ParticleProfile = ParticleProfile {
    kind: ParticleKind::Spark,
    count: 8,
    palette: &[AMBER],
    speed: (0.003, 0.008),
    lifetime: (200.0, 300.0),
    size: (1.0, 3.0),
    spread: Spread::Radial,
    lift: Lift::Between(0.0, 0.005),
    forward_offset: 0.0,
};

pub const DEATH: ParticleProfile = ParticleProfile {
    kind: ParticleKind::SoulFragment,
    count: 20,
    palette: &[Rgb::hex(0xff0000), PURPLE, CYAN],
    speed: (0.002, 0.01),
    lifetime: (800.0, 1200.0),
    size: (2.0, 5.0),
    spread: Spread::Random,
    lift: Lift::Between(0.002, 0.008),
    forward_offset: 0.0,
};

pub const SOUL_ENERGY: ParticleProfile = ParticleProfile {
    kind: ParticleKind::SoulFragment,
    count: 5,
    palette: &[PURPLE],
    speed: (0.0005, 0.002),
    lifetime: (2000.0, 3000.0),
    size: (2.0, 4.0),
    spread: Spread::Random,
    lift: Lift::Between(0.0005, 0.0015),
    forward_offset: 0.0,
};

pub const MEMORY_FRAGMENT: ParticleProfile = ParticleProfile {
    kind: ParticleKind::MemoryFragment,
    count: 12,
    palette: &[Rgb::hex(0x00ff00)],
    speed: (0.002, 0.004),
    lifetime: (1000.0, 1500.0),
    size: (3.0, 5.0),
    spread: Spread::Radial,
    lift: Lift::Wave(0.003),
    forward_offset: 0.0,
};

pub const BINARY_CHANT: ParticleProfile = ParticleProfile {
    kind: ParticleKind::BinaryChant,
    count: 8,
    palette: &[Rgb::WHITE],
    speed: (0.0005, 0.001),
    lifetime: (3000.0, 5000.0),
    size: (1.0, 2.0),
    spread: Spread::Random,
    lift: Lift::Between(0.0003, 0.001),
    forward_offset: 0.0,
};

pub const NEON_GLITCH: ParticleProfile = ParticleProfile {
    kind: ParticleKind::NeonGlitch,
    count: 6,
    palette: &[Rgb::hex(0xff0080), CYAN, YELLOW],
    speed: (0.004, 0.01),
    lifetime: (150.0, 250.0),
    size: (2.0, 4.0),
    spread: Spread::Random,
    lift: Lift::Symmetric(0.004),
    forward_offset: 0.0,
};

/// Standard muzzle flash; the palette carries the weapon colour
pub const fn muzzle_standard(palette: &'static [Rgb]) -> ParticleProfile {
    ParticleProfile {
        kind: ParticleKind::Spark,
        count: 8,
        palette,
        speed: (0.01, 0.015),
        lifetime: (150.0, 250.0),
        size: (3.0, 5.0),
        spread: Spread::Cone { width: 0.3, behind: false },
        lift: Lift::Symmetric(0.002),
        forward_offset: 0.5,
    }
}

pub const MUZZLE_IONIC: ParticleProfile = ParticleProfile {
    kind: ParticleKind::DigitalDecay,
    count: 12,
    palette: &[CYAN],
    speed: (0.015, 0.025),
    lifetime: (200.0, 350.0),
    size: (2.0, 4.0),
    spread: Spread::Cone { width: 0.5, behind: false },
    lift: Lift::Symmetric(0.003),
    forward_offset: 0.7,
};

pub const MUZZLE_GRAVITY: ParticleProfile = ParticleProfile {
    kind: ParticleKind::SoulFragment,
    count: 10,
    palette: &[ORANGE],
    speed: (0.008, 0.014),
    lifetime: (300.0, 500.0),
    size: (2.0, 4.0),
    spread: Spread::Radial,
    lift: Lift::Wave(0.002),
    forward_offset: 0.6,
};

fn between(rng: &mut Pcg32, (lo, hi): (f32, f32)) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Append `profile.count` particles at `origin`, oriented by `facing`
pub fn emit(
    profile: &ParticleProfile,
    origin: Vec3,
    facing: f32,
    out: &mut Vec<Particle>,
    rng: &mut Pcg32,
) {
    let origin = origin + Vec2::from_angle(facing).extend(0.0) * profile.forward_offset;
    out.reserve(profile.count);

    for i in 0..profile.count {
        let angle = match profile.spread {
            Spread::Radial => i as f32 / profile.count as f32 * TAU,
            Spread::Random => rng.random::<f32>() * TAU,
            Spread::Cone { width, behind } => {
                let centre = if behind { facing + PI } else { facing };
                centre + (rng.random::<f32>() - 0.5) * width
            }
        };
        let speed = between(rng, profile.speed);
        let vz = match profile.lift {
            Lift::None => 0.0,
            Lift::Symmetric(a) => (rng.random::<f32>() * 2.0 - 1.0) * a,
            Lift::Between(lo, hi) => between(rng, (lo, hi)),
            Lift::Wave(a) => (angle * 3.0).sin() * a,
        };
        let color = if profile.palette.is_empty() {
            Rgb::WHITE
        } else {
            profile.palette[rng.random_range(0..profile.palette.len())]
        };
        let lifetime = between(rng, profile.lifetime);
        let size = between(rng, profile.size);

        out.push(Particle {
            pos: origin,
            velocity: (Vec2::from_angle(angle) * speed).extend(vz),
            color,
            size,
            base_size: size,
            lifetime,
            max_lifetime: lifetime,
            kind: profile.kind,
        });
    }
}

/// Integrate, damp and age particles. Expired ones are left for cleanup.
pub fn update(particles: &mut [Particle], dt: f32) {
    for p in particles.iter_mut() {
        p.pos += p.velocity * dt;
        if p.kind.is_heavy() {
            p.velocity.z -= PARTICLE_GRAVITY * dt;
        }
        p.velocity *= PARTICLE_DAMPING;
        p.lifetime -= dt;

        let fade_start = FADE_FRACTION * p.max_lifetime;
        p.size = if p.lifetime < fade_start && fade_start > 0.0 {
            p.base_size * (p.lifetime / fade_start).max(0.0)
        } else {
            p.base_size
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_emit_respects_profile_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut out = Vec::new();
        emit(&DEATH, Vec3::new(1.0, 2.0, 0.5), 0.0, &mut out, &mut rng);
        assert_eq!(out.len(), DEATH.count);
        for p in &out {
            let speed = p.velocity.truncate().length();
            assert!(speed >= DEATH.speed.0 - 1e-6 && speed <= DEATH.speed.1 + 1e-6);
            assert!(p.lifetime >= DEATH.lifetime.0 && p.lifetime <= DEATH.lifetime.1);
            assert!(DEATH.palette.contains(&p.color));
            assert_eq!(p.kind, ParticleKind::SoulFragment);
        }
    }

    #[test]
    fn test_dash_cone_points_behind() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut out = Vec::new();
        emit(&DASH, Vec3::ZERO, 0.0, &mut out, &mut rng);
        // Facing +x, everything should drift toward -x
        assert!(out.iter().all(|p| p.velocity.x < 0.0));
    }

    #[test]
    fn test_heavy_particles_fall() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut sparks = Vec::new();
        emit(&IMPACT, Vec3::ZERO, 0.0, &mut sparks, &mut rng);
        let mut glitches = Vec::new();
        emit(&NEON_GLITCH, Vec3::ZERO, 0.0, &mut glitches, &mut rng);
        let spark_vz = sparks[0].velocity.z;
        let glitch_vz = glitches[0].velocity.z;
        update(&mut sparks, 10.0);
        update(&mut glitches, 10.0);
        assert!(sparks[0].velocity.z < spark_vz * PARTICLE_DAMPING + 1e-9);
        assert!((glitches[0].velocity.z - glitch_vz * PARTICLE_DAMPING).abs() < 1e-9);
    }

    #[test]
    fn test_size_shrinks_in_final_stretch() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut out = Vec::new();
        emit(&SOUL_ENERGY, Vec3::ZERO, 0.0, &mut out, &mut rng);
        let p = &mut out[0];
        p.lifetime = 1000.0;
        p.max_lifetime = 1000.0;
        p.base_size = 4.0;
        let mut one = vec![p.clone()];
        update(&mut one, 500.0);
        assert_eq!(one[0].size, 4.0);
        update(&mut one, 350.0);
        // 150 ms left of a 300 ms fade window
        assert!((one[0].size - 2.0).abs() < 1e-3);
    }
}
