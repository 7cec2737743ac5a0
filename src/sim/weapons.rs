//! Weapons
//!
//! Weapon stats are static. The per-run mutable part (last shot time, ammo)
//! lives in [`Arsenal`]. Every weapon fires projectiles; enemy damage is
//! resolved later in the tick's collision pass.

use std::f32::consts::PI;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particles::{self, ParticleProfile};
use super::state::{Owner, Particle, Player, Projectile, ProjectileKind, SpecialEffect};
use crate::Rgb;
use crate::audio::{AudioSink, SoundCue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    BiomechRifle,
    IonicRedeemer,
    SoulCannon,
    GravityHook,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::BiomechRifle,
        WeaponKind::IonicRedeemer,
        WeaponKind::SoulCannon,
        WeaponKind::GravityHook,
    ];

    pub fn index(self) -> usize {
        match self {
            WeaponKind::BiomechRifle => 0,
            WeaponKind::IonicRedeemer => 1,
            WeaponKind::SoulCannon => 2,
            WeaponKind::GravityHook => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn spec(self) -> &'static WeaponSpec {
        &WEAPONS[self.index()]
    }
}

/// How a shot turns into projectiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirePattern {
    /// One projectile along the facing
    Standard { projectile: ProjectileKind, speed: f32, lifetime: f32 },
    /// `pellets` projectiles fanned over `spread` radians, damage split evenly
    Spread {
        pellets: u32,
        spread: f32,
        speed: f32,
        lifetime: f32,
        effect: SpecialEffect,
    },
    /// One slow, long-lived projectile with a special effect
    Special { speed: f32, lifetime: f32, effect: SpecialEffect },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub name: &'static str,
    pub damage: f32,
    /// Informational; every weapon is projectile based
    pub range: f32,
    /// Minimum ms between shots
    pub fire_rate: f64,
    /// Soul energy per shot
    pub cost: f32,
    /// `None` is unlimited
    pub ammo: Option<u32>,
    pub pattern: FirePattern,
    pub muzzle: ParticleProfile,
}

const RIFLE_FLASH: [Rgb; 1] = [Rgb::hex(0xffff00)];
const CANNON_FLASH: [Rgb; 1] = [Rgb::hex(0x9932cc)];

static WEAPONS: [WeaponSpec; 4] = [
    WeaponSpec {
        name: "Biomech Rifle",
        damage: 25.0,
        range: 15.0,
        fire_rate: 200.0,
        cost: 0.0,
        ammo: None,
        pattern: FirePattern::Standard {
            projectile: ProjectileKind::Plasma,
            speed: 0.02,
            lifetime: 3000.0,
        },
        muzzle: particles::muzzle_standard(&RIFLE_FLASH),
    },
    WeaponSpec {
        name: "Ionic Redeemer",
        damage: 45.0,
        range: 8.0,
        fire_rate: 600.0,
        cost: 10.0,
        ammo: None,
        pattern: FirePattern::Spread {
            pellets: 5,
            spread: PI / 8.0,
            speed: 0.025,
            lifetime: 2000.0,
            effect: SpecialEffect::DataPurification,
        },
        muzzle: particles::MUZZLE_IONIC,
    },
    WeaponSpec {
        name: "Soul Cannon",
        damage: 50.0,
        range: 20.0,
        fire_rate: 800.0,
        cost: 20.0,
        ammo: None,
        pattern: FirePattern::Standard {
            projectile: ProjectileKind::SoulBolt,
            speed: 0.02,
            lifetime: 3000.0,
        },
        muzzle: particles::muzzle_standard(&CANNON_FLASH),
    },
    WeaponSpec {
        name: "Gravity Hook",
        damage: 15.0,
        range: 25.0,
        fire_rate: 1000.0,
        cost: 15.0,
        ammo: None,
        pattern: FirePattern::Special {
            speed: 0.015,
            lifetime: 5000.0,
            effect: SpecialEffect::GravityPull,
        },
        muzzle: particles::MUZZLE_GRAVITY,
    },
];

/// Per-run weapon bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arsenal {
    /// `game_time` of each weapon's last accepted shot
    last_fired: [Option<f64>; 4],
    ammo: [Option<u32>; 4],
}

impl Default for Arsenal {
    fn default() -> Self {
        Self {
            last_fired: [None; 4],
            ammo: WeaponKind::ALL.map(|w| w.spec().ammo),
        }
    }
}

impl Arsenal {
    pub fn last_fired(&self, weapon: WeaponKind) -> Option<f64> {
        self.last_fired[weapon.index()]
    }

    pub fn ammo(&self, weapon: WeaponKind) -> Option<u32> {
        self.ammo[weapon.index()]
    }

    /// Both gates: fire rate and resource
    pub fn can_fire(&self, weapon: WeaponKind, player: &Player, now: f64) -> bool {
        let spec = weapon.spec();
        let rested = match self.last_fired(weapon) {
            Some(last) => now - last >= spec.fire_rate,
            None => true,
        };
        let affordable = spec.cost <= 0.0 || player.soul_energy >= spec.cost;
        let loaded = self.ammo(weapon) != Some(0);
        rested && affordable && loaded
    }

    /// Fire the player's active weapon.
    ///
    /// Returns false (and changes nothing) when a gate rejects the shot.
    pub fn fire(
        &mut self,
        player: &mut Player,
        now: f64,
        projectiles: &mut Vec<Projectile>,
        particles: &mut Vec<Particle>,
        rng: &mut Pcg32,
        audio: &mut dyn AudioSink,
    ) -> bool {
        let weapon = player.active_weapon;
        if !self.can_fire(weapon, player, now) {
            return false;
        }
        let spec = weapon.spec();
        let damage = spec.damage * player.damage_multiplier();

        if spec.cost > 0.0 {
            player.soul_energy -= spec.cost;
        }
        if let Some(ammo) = self.ammo[weapon.index()].as_mut() {
            *ammo -= 1;
        }

        let origin = player.pos;
        let shot = |angle: f32, speed: f32| (Vec2::from_angle(angle) * speed).extend(0.0);

        match spec.pattern {
            FirePattern::Standard {
                projectile,
                speed,
                lifetime,
            } => projectiles.push(Projectile {
                pos: origin,
                velocity: shot(player.dir, speed),
                damage,
                kind: projectile,
                lifetime,
                owner: Owner::Player,
                effect: None,
            }),
            FirePattern::Spread {
                pellets,
                spread,
                speed,
                lifetime,
                effect,
            } => {
                let n = pellets.max(1) as f32;
                for i in 0..pellets.max(1) {
                    let angle = player.dir + (i as f32 - n / 2.0) * (spread / n);
                    projectiles.push(Projectile {
                        pos: origin,
                        velocity: shot(angle, speed),
                        damage: damage / n,
                        kind: ProjectileKind::IonicBlast,
                        lifetime,
                        owner: Owner::Player,
                        effect: Some(effect),
                    });
                }
            }
            FirePattern::Special {
                speed,
                lifetime,
                effect,
            } => projectiles.push(Projectile {
                pos: origin,
                velocity: shot(player.dir, speed),
                damage,
                kind: ProjectileKind::GravityHook,
                lifetime,
                owner: Owner::Player,
                effect: Some(effect),
            }),
        }

        particles::emit(&spec.muzzle, origin, player.dir, particles, rng);
        audio.play(SoundCue::WeaponFire);
        self.last_fired[weapon.index()] = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use rand::SeedableRng;

    fn fire_once(arsenal: &mut Arsenal, player: &mut Player, now: f64) -> (bool, usize) {
        let mut projectiles = Vec::new();
        let mut particles = Vec::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let ok = arsenal.fire(
            player,
            now,
            &mut projectiles,
            &mut particles,
            &mut rng,
            &mut NullAudio,
        );
        (ok, projectiles.len())
    }

    #[test]
    fn test_fire_rate_gate() {
        let mut arsenal = Arsenal::default();
        let mut player = Player::new(Vec2::new(2.0, 2.0));
        assert_eq!(fire_once(&mut arsenal, &mut player, 0.0), (true, 1));
        assert_eq!(fire_once(&mut arsenal, &mut player, 199.0), (false, 0));
        assert_eq!(fire_once(&mut arsenal, &mut player, 200.0), (true, 1));
    }

    #[test]
    fn test_cost_gate_leaves_resource_untouched() {
        let mut arsenal = Arsenal::default();
        let mut player = Player::new(Vec2::new(2.0, 2.0));
        player.active_weapon = WeaponKind::SoulCannon;
        player.soul_energy = 19.0;
        assert_eq!(fire_once(&mut arsenal, &mut player, 0.0), (false, 0));
        assert_eq!(player.soul_energy, 19.0);
        assert_eq!(arsenal.last_fired(WeaponKind::SoulCannon), None);

        player.soul_energy = 20.0;
        assert_eq!(fire_once(&mut arsenal, &mut player, 0.0), (true, 1));
        assert_eq!(player.soul_energy, 0.0);
    }

    #[test]
    fn test_spread_splits_damage() {
        let mut arsenal = Arsenal::default();
        let mut player = Player::new(Vec2::new(2.0, 2.0));
        player.active_weapon = WeaponKind::IonicRedeemer;
        let mut projectiles = Vec::new();
        let mut particles = Vec::new();
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(arsenal.fire(
            &mut player,
            0.0,
            &mut projectiles,
            &mut particles,
            &mut rng,
            &mut NullAudio
        ));
        assert_eq!(projectiles.len(), 5);
        assert!(projectiles.iter().all(|p| (p.damage - 9.0).abs() < 1e-5));
        assert!(projectiles.iter().all(|p| p.effect == Some(SpecialEffect::DataPurification)));
        assert_eq!(particles.len(), particles::MUZZLE_IONIC.count);
        assert_eq!(player.soul_energy, 40.0);
    }

    #[test]
    fn test_weapon_index_round_trip() {
        for weapon in WeaponKind::ALL {
            assert_eq!(WeaponKind::from_index(weapon.index()), Some(weapon));
        }
        assert_eq!(WeaponKind::from_index(4), None);
    }
}
