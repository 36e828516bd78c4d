//! # Twister - Attractor Force-Field Simulation Engine
//!
//! Real-time vortex simulations with a bounded, supervised lifecycle.
//!
//! A vortex is a moving attractor that discovers nearby world objects,
//! pulls a bounded subset of them into a captured working set, applies
//! inward, lift and tangential forces to each of them every fixed physics
//! step, and evicts them when they leave its influence or vanish. The
//! crate owns the simulation core only; the surrounding engine supplies
//! object enumeration, force application, terrain/road queries and time
//! through the traits in [`world`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use twister::prelude::*;
//! use std::sync::Arc;
//!
//! let world = WorldContext {
//!     entities: Arc::new(MyEnumerator::new()),
//!     forces: Arc::new(MyForceApplier::new()),
//!     clock: Arc::new(SystemClock::new()),
//!     ground: Arc::new(MyTerrain::new()),
//!     roads: Arc::new(MyRoads::new()),
//!     props: Arc::new(MyProps::new()),
//! };
//!
//! let factory = VortexFactory::new(
//!     VortexConfig::default()
//!         .with_force_scale(3.0)
//!         .with_lifespan_ms(60_000),
//!     world.clone(),
//! );
//!
//! factory.on_despawned(|id| println!("{} gone", id));
//! let id = factory.spawn(Vec3::new(250.0, -40.0, 0.0)).unwrap();
//!
//! // Once per host frame:
//! factory.update(world.clock.now_ms());
//! ```
//!
//! ## Core Concepts
//!
//! ### Fixed timestep
//!
//! Physics runs at a constant step size ([`time::FIXED_TIME_STEP`],
//! 1/60 s) regardless of host frame rate. Frame deltas feed a
//! [`time::FixedTimestep`] accumulator; leftover time carries over, so no
//! simulated time is lost or double-counted.
//!
//! ### Capture and eviction
//!
//! Discovery sweeps (throttled, ~600 ms of simulated time) pull objects
//! within the capture radius into a concurrent working set of at most
//! `max_entity_count` entries. Each physics step re-probes every entry and
//! queues the out-of-range and the vanished for removal; removals land in
//! one idempotent batch per step.
//!
//! ### Lateral bias
//!
//! Every capture gets a random per-object offset added to its attraction
//! target. Without it, everything converges on the centerline; with it,
//! the swarm spirals.
//!
//! ### Bounded supervision
//!
//! The [`VortexFactory`] caps concurrent simulations (default 30),
//! serializes spawning, force-disposes instances that fail mid-update
//! without touching their siblings, and tears everything down
//! idempotently.
//!
//! | Concern | Where |
//! |---------|-------|
//! | Reusable native objects | [`pool::ResourcePool`] |
//! | Captured working set | [`entity::CapturedEntity`] |
//! | Force algorithm, movement | [`vortex::VortexSimulation`] |
//! | Lifecycle supervision | [`factory::VortexFactory`] |
//! | World boundary | [`world::WorldContext`] |

pub mod config;
pub mod entity;
pub mod error;
pub mod factory;
pub mod pool;
pub mod time;
pub mod vortex;
pub mod world;

pub use config::VortexConfig;
pub use entity::{CapturedEntity, EntityHandle, EntityProbe, ObjectClass};
pub use error::{PoolError, PropError, SpawnError, UpdateError};
pub use factory::{VortexFactory, VortexId};
pub use glam::Vec3;
pub use pool::ResourcePool;
pub use time::{Clock, FixedTimestep, ManualClock, SystemClock, FIXED_TIME_STEP};
pub use vortex::{VortexSimulation, VortexState};
pub use world::{
    EntityEnumerator, ForceApplier, GroundQuery, PropFactory, RoadQuery, WorldContext,
};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use twister::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::VortexConfig;
    pub use crate::entity::{CapturedEntity, EntityHandle, EntityProbe, ObjectClass};
    pub use crate::error::{PoolError, PropError, SpawnError, UpdateError};
    pub use crate::factory::{VortexFactory, VortexId};
    pub use crate::pool::ResourcePool;
    pub use crate::time::{Clock, FixedTimestep, ManualClock, SystemClock, FIXED_TIME_STEP};
    pub use crate::vortex::{VortexSimulation, VortexState};
    pub use crate::world::{
        EntityEnumerator, ForceApplier, GroundQuery, PropFactory, RoadQuery, WorldContext,
    };
    pub use glam::Vec3;
}
