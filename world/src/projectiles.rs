//! Homing projectiles in flight.

use std::{collections::BTreeMap, f32::consts::PI, time::Duration};

use creep_defence_core::{CreepId, ProjectileId, TowerAttributes, TowerId, Vec3};
use glam::Quat;

/// Projectile homing on a creep with a snapshot of its tower's attributes.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) target: CreepId,
    pub(crate) position: Vec3,
    heading: Vec3,
    pub(crate) attributes: TowerAttributes,
    flight: Duration,
}

/// Result of advancing a projectile by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    /// Still travelling toward the target.
    InFlight,
    /// Reached the target at the provided impact point.
    Arrived(Vec3),
    /// Target vanished or flight time ran out.
    Missed,
}

/// Limits governing projectile flight.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FlightLimits {
    pub(crate) hit_radius: f32,
    pub(crate) turn_rate: f32,
    pub(crate) max_flight: Duration,
}

impl Projectile {
    /// Advances the projectile toward the target's current position.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        target: Option<Vec3>,
        limits: FlightLimits,
    ) -> Flight {
        let Some(target) = target else {
            return Flight::Missed;
        };

        let seconds = dt.as_secs_f32();
        let travel = self.attributes.missile_speed.max(0.0) * seconds;
        let offset = target - self.position;
        let distance = offset.length();
        if distance <= travel + limits.hit_radius {
            return Flight::Arrived(target);
        }

        let desired = offset / distance;
        self.heading = rotate_towards(self.heading, desired, limits.turn_rate.max(0.0) * seconds);
        self.position += self.heading * travel;
        self.flight = self.flight.saturating_add(dt);
        if self.flight >= limits.max_flight {
            return Flight::Missed;
        }

        Flight::InFlight
    }
}

/// Rotates `current` toward `desired` by at most `max_angle` radians.
fn rotate_towards(current: Vec3, desired: Vec3, max_angle: f32) -> Vec3 {
    let angle = current.angle_between(desired);
    if !angle.is_finite() || angle <= max_angle {
        return desired;
    }

    let axis = current.cross(desired);
    let axis = if axis.length_squared() <= f32::EPSILON {
        current.any_orthonormal_vector()
    } else {
        axis.normalize()
    };
    (Quat::from_axis_angle(axis, max_angle.min(PI)) * current).normalize()
}

/// Registry that stores projectiles and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    /// Launches a projectile from `origin` aimed at the target's position.
    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        target: CreepId,
        origin: Vec3,
        aim: Vec3,
        attributes: TowerAttributes,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        let heading = (aim - origin).try_normalize().unwrap_or(Vec3::X);
        let _ = self.entries.insert(
            id,
            Projectile {
                id,
                tower,
                target,
                position: origin,
                heading,
                attributes,
                flight: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.entries.values()
    }

    pub(crate) fn ids(&self) -> Vec<ProjectileId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn get_mut(&mut self, projectile: ProjectileId) -> Option<&mut Projectile> {
        self.entries.get_mut(&projectile)
    }

    pub(crate) fn remove(&mut self, projectile: ProjectileId) -> Option<Projectile> {
        self.entries.remove(&projectile)
    }
}
