//! World-object handles and the captured working set's record type.

use glam::Vec3;

/// Opaque reference to a dynamic world object.
///
/// The crate never interprets the value; it only compares, hashes and
/// passes it back to the world collaborators. Handles may go stale at any
/// moment — every collaborator taking one must treat an unknown handle as
/// a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad role of a world object, as reported by the enumerator.
///
/// Only `Vehicle` changes the force algorithm (airborne multiplier); the
/// others exist so hosts can filter and log meaningfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    /// A character, player-controlled or not.
    Pedestrian,
    /// Anything drivable. Gets an extra force multiplier while airborne.
    Vehicle,
    /// Static-ish physics props, including pooled debris.
    Prop,
}

/// Point-in-time snapshot of one world object.
///
/// Returned by [`EntityEnumerator`](crate::world::EntityEnumerator) both
/// during discovery sweeps and per-step refreshes. Everything here is
/// stale the moment it is returned; the simulation treats it as the best
/// available estimate for one physics step.
#[derive(Clone, Copy, Debug)]
pub struct EntityProbe {
    /// The object's handle.
    pub handle: EntityHandle,
    /// World position.
    pub position: Vec3,
    /// Height above the terrain directly below, in meters.
    pub height_above_ground: f32,
    /// Broad object role.
    pub class: ObjectClass,
    /// Whether this is the primary actor (e.g. the player's character).
    pub is_primary_actor: bool,
}

/// One object currently under a vortex's influence.
///
/// Created at capture time, refreshed every physics step, dropped at
/// eviction. A simulation holds at most one of these per handle.
#[derive(Clone, Debug)]
pub struct CapturedEntity {
    /// Handle of the captured object.
    pub handle: EntityHandle,
    /// Planar distance from the vortex center when first captured.
    pub capture_distance: f32,
    /// Per-entity lateral offset on X added to the attraction target.
    ///
    /// Desynchronizes captured objects so they spiral instead of
    /// collapsing onto a single point.
    pub bias_x: f32,
    /// Per-entity lateral offset on Y added to the attraction target.
    pub bias_y: f32,
    /// Whether this entry is the primary actor.
    pub is_primary_actor: bool,
    /// Broad object role, fixed at capture time.
    pub class: ObjectClass,
    /// Position observed on the most recent physics step.
    pub last_position: Vec3,
    /// Whether the inward pull was applied on the last step (false while
    /// the primary actor's line of sight is obstructed).
    pub pulling_in: bool,
    /// True for debris bodies owned by the simulation's resource pool.
    ///
    /// Pooled entries are released back to the pool on eviction instead
    /// of just being forgotten.
    pub pooled: bool,
}

impl CapturedEntity {
    /// Build a capture record from a discovery probe.
    pub fn from_probe(probe: &EntityProbe, capture_distance: f32, bias_x: f32, bias_y: f32) -> Self {
        Self {
            handle: probe.handle,
            capture_distance,
            bias_x,
            bias_y,
            is_primary_actor: probe.is_primary_actor,
            class: probe.class,
            last_position: probe.position,
            pulling_in: true,
            pooled: false,
        }
    }

    /// Mark this record as a pool-owned debris body.
    pub fn pooled(mut self) -> Self {
        self.pooled = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_probe_copies_role_and_position() {
        let probe = EntityProbe {
            handle: EntityHandle(7),
            position: Vec3::new(1.0, 2.0, 3.0),
            height_above_ground: 0.5,
            class: ObjectClass::Vehicle,
            is_primary_actor: false,
        };

        let captured = CapturedEntity::from_probe(&probe, 12.5, -1.0, 2.0);
        assert_eq!(captured.handle, EntityHandle(7));
        assert_eq!(captured.capture_distance, 12.5);
        assert_eq!(captured.class, ObjectClass::Vehicle);
        assert_eq!(captured.last_position, Vec3::new(1.0, 2.0, 3.0));
        assert!(captured.pulling_in);
        assert!(!captured.pooled);
    }

    #[test]
    fn test_pooled_marker() {
        let probe = EntityProbe {
            handle: EntityHandle(1),
            position: Vec3::ZERO,
            height_above_ground: 0.0,
            class: ObjectClass::Prop,
            is_primary_actor: false,
        };
        assert!(CapturedEntity::from_probe(&probe, 0.0, 0.0, 0.0).pooled().pooled);
    }
}
