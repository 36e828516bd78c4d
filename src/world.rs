//! Collaborator traits at the world boundary.
//!
//! The simulation core owns no game-engine plumbing. Everything it needs
//! from the surrounding world — object enumeration, force application,
//! terrain and road queries, prop creation — is expressed as a trait here
//! and injected through a [`WorldContext`] at construction time. That
//! keeps the core testable against scripted fakes and keeps the native
//! layer swappable.
//!
//! All traits are `Send + Sync`: the driving thread and background
//! maintenance may call into them concurrently.

use crate::entity::{EntityHandle, EntityProbe};
use crate::error::PropError;
use crate::time::Clock;
use glam::Vec3;
use std::sync::Arc;

/// Produces snapshots of dynamic world objects.
pub trait EntityEnumerator: Send + Sync {
    /// All valid objects within `radius` of `center`.
    ///
    /// The result is a finite snapshot; calling again re-runs the query.
    /// Ordering is unspecified.
    fn query_near(&self, center: Vec3, radius: f32) -> Vec<EntityProbe>;

    /// Refresh a single object's state.
    ///
    /// Returns `None` once the handle is no longer valid, which the
    /// simulation treats as a silent eviction, never an error.
    fn probe(&self, handle: EntityHandle) -> Option<EntityProbe>;

    /// The primary actor, if the world has one.
    ///
    /// Used by destination selection to drift back toward the actor;
    /// `None` simply disables that bias.
    fn primary_actor(&self) -> Option<EntityProbe>;
}

/// Applies instantaneous physics impulses to world objects.
///
/// Both methods must be a no-op — not an error — when the handle has gone
/// stale between query and apply.
pub trait ForceApplier: Send + Sync {
    /// Apply a force and torque to the referenced object.
    fn apply(&self, handle: EntityHandle, force: Vec3, torque: Vec3);

    /// Clamp the object's speed to `max_speed`.
    ///
    /// Re-applied to every captured object every physics step; the world
    /// side may implement it as a hard velocity clamp or an engine-side
    /// max-speed setting.
    fn limit_speed(&self, handle: EntityHandle, max_speed: f32);
}

/// Terrain queries used by movement and the primary-actor sight check.
pub trait GroundQuery: Send + Sync {
    /// Terrain height at the given planar position.
    fn height_at(&self, position: Vec3) -> f32;

    /// Whether an unobstructed line exists between two points.
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool;
}

/// Road-network queries used to validate wander destinations.
pub trait RoadQuery: Send + Sync {
    /// The nearest point on the road network.
    fn nearest_point(&self, position: Vec3) -> Vec3;
}

/// Creates and recycles the native prop bodies behind the debris pool.
pub trait PropFactory: Send + Sync {
    /// Create a prop at `position`, returning its handle.
    fn create(&self, position: Vec3) -> Result<EntityHandle, PropError>;

    /// Teleport an existing prop, zeroing its velocity.
    fn place(&self, handle: EntityHandle, position: Vec3);

    /// Destroy a prop. Must tolerate stale handles.
    fn destroy(&self, handle: EntityHandle);
}

/// Bundle of world collaborators handed to every simulation.
///
/// An explicit context object instead of ambient globals: two factories
/// with different contexts can coexist in one process, and tests build
/// one from scripted fakes.
#[derive(Clone)]
pub struct WorldContext {
    /// Object discovery and per-step refresh.
    pub entities: Arc<dyn EntityEnumerator>,
    /// Impulse application and speed clamping.
    pub forces: Arc<dyn ForceApplier>,
    /// Simulation time source.
    pub clock: Arc<dyn Clock>,
    /// Terrain height and sight checks.
    pub ground: Arc<dyn GroundQuery>,
    /// Road snapping for destination selection.
    pub roads: Arc<dyn RoadQuery>,
    /// Debris prop lifecycle.
    pub props: Arc<dyn PropFactory>,
}

impl std::fmt::Debug for WorldContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WorldContext { .. }")
    }
}
