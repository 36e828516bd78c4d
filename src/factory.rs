//! The vortex factory: bounded registry of live simulations.
//!
//! The factory serializes spawning, caps how many simulations run at
//! once, drives every live instance from the host tick, and guarantees
//! idempotent teardown. One failing instance is logged, force-disposed
//! and removed; it never halts the others.
//!
//! # Example
//!
//! ```ignore
//! use twister::prelude::*;
//!
//! let factory = VortexFactory::new(VortexConfig::default(), world);
//! let id = factory.spawn(Vec3::new(250.0, -40.0, 0.0))?;
//!
//! // In your host loop:
//! factory.update(clock.now_ms());
//! ```

use crate::config::VortexConfig;
use crate::error::SpawnError;
use crate::vortex::VortexSimulation;
use crate::world::WorldContext;
use glam::Vec3;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Identifier of one live (or once-live) simulation instance.
///
/// Ids are monotonically increasing and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VortexId(pub u64);

impl std::fmt::Display for VortexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vortex-{}", self.0)
    }
}

type LifecycleHook = Box<dyn Fn(VortexId) + Send + Sync>;

struct Registry {
    active: HashMap<VortexId, VortexSimulation>,
    next_id: u64,
}

/// Bounded, serialized registry of [`VortexSimulation`] instances.
pub struct VortexFactory {
    config: VortexConfig,
    world: WorldContext,
    registry: Mutex<Registry>,
    disposed: AtomicBool,
    on_spawned: Mutex<Vec<LifecycleHook>>,
    on_despawned: Mutex<Vec<LifecycleHook>>,
}

impl VortexFactory {
    /// Create an empty factory.
    pub fn new(config: VortexConfig, world: WorldContext) -> Self {
        Self {
            config,
            world,
            registry: Mutex::new(Registry {
                active: HashMap::new(),
                next_id: 1,
            }),
            disposed: AtomicBool::new(false),
            on_spawned: Mutex::new(Vec::new()),
            on_despawned: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a new simulation at `position`.
    ///
    /// The position's height is snapped to the terrain (minus the
    /// configured submersion depth). Capacity check and id assignment
    /// happen atomically under the registry lock, so concurrent spawns
    /// serialize and the capacity bound holds exactly.
    pub fn spawn(&self, position: Vec3) -> Result<VortexId, SpawnError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(SpawnError::Disposed);
        }

        let mut base = position;
        base.z = self.world.ground.height_at(position) - self.config.submersion_depth;

        let id = {
            let mut registry = self.registry.lock().expect("registry poisoned");
            if registry.active.len() >= self.config.capacity {
                log::warn!(
                    "Cannot spawn vortex: limit of {} reached",
                    self.config.capacity
                );
                return Err(SpawnError::CapacityExceeded {
                    active: registry.active.len(),
                    capacity: self.config.capacity,
                });
            }

            let id = VortexId(registry.next_id);
            registry.next_id += 1;
            let simulation =
                VortexSimulation::new(base, self.config.clone(), self.world.clone());
            registry.active.insert(id, simulation);
            id
        };

        log::info!("Spawned {} at {:?}", id, base);
        self.fire(&self.on_spawned, id);
        Ok(id)
    }

    /// Advance every live simulation by one host tick.
    ///
    /// Instances whose update fails are force-disposed and dropped;
    /// instances that requested despawn are disposed and dropped. Either
    /// way the `on_despawned` hooks fire, after the registry lock is
    /// released.
    pub fn update(&self, now_ms: u64) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }

        let removed: Vec<VortexId> = {
            let mut registry = self.registry.lock().expect("registry poisoned");
            let mut dead = Vec::new();

            for (&id, simulation) in registry.active.iter_mut() {
                if let Err(e) = simulation.update(now_ms) {
                    log::error!("Error updating {}: {}", id, e);
                    simulation.dispose();
                    dead.push(id);
                } else if simulation.despawn_requested() {
                    simulation.dispose();
                    dead.push(id);
                }
            }

            for id in &dead {
                registry.active.remove(id);
            }
            dead
        };

        for id in removed {
            log::info!("Removed {}", id);
            self.fire(&self.on_despawned, id);
        }
    }

    /// Cooperatively request a despawn of one instance.
    ///
    /// Returns `false` if the id is not live. The instance is removed on
    /// the next [`VortexFactory::update`], not immediately.
    pub fn despawn(&self, id: VortexId) -> bool {
        let registry = self.registry.lock().expect("registry poisoned");
        match registry.active.get(&id) {
            Some(simulation) => {
                simulation.request_despawn();
                true
            }
            None => false,
        }
    }

    /// Dispose and drop every live instance. Safe to call when empty.
    pub fn remove_all(&self) {
        let removed: Vec<VortexId> = {
            let mut registry = self.registry.lock().expect("registry poisoned");
            let mut dead: Vec<(VortexId, VortexSimulation)> =
                registry.active.drain().collect();
            for (_, simulation) in dead.iter_mut() {
                simulation.dispose();
            }
            dead.into_iter().map(|(id, _)| id).collect()
        };

        for id in removed {
            self.fire(&self.on_despawned, id);
        }
    }

    /// Tear the factory down permanently.
    ///
    /// Equivalent to [`VortexFactory::remove_all`] followed by marking
    /// the factory inactive: later spawns fail with
    /// [`SpawnError::Disposed`] and updates become no-ops. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.remove_all();
        log::info!("Vortex factory disposed");
    }

    /// Whether [`VortexFactory::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of currently live instances.
    pub fn active_count(&self) -> usize {
        self.registry.lock().expect("registry poisoned").active.len()
    }

    /// The configured instance limit.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Whether the id refers to a live instance.
    pub fn contains(&self, id: VortexId) -> bool {
        self.registry
            .lock()
            .expect("registry poisoned")
            .active
            .contains_key(&id)
    }

    /// Current center position of a live instance.
    pub fn position_of(&self, id: VortexId) -> Option<Vec3> {
        self.registry
            .lock()
            .expect("registry poisoned")
            .active
            .get(&id)
            .map(|s| s.position())
    }

    /// Number of objects captured by a live instance.
    pub fn captured_count_of(&self, id: VortexId) -> Option<usize> {
        self.registry
            .lock()
            .expect("registry poisoned")
            .active
            .get(&id)
            .map(|s| s.captured_count())
    }

    /// Run `f` against a live instance, if present.
    ///
    /// Escape hatch for hosts that need more than the accessors above;
    /// the registry lock is held while `f` runs, so keep it short.
    pub fn with_vortex<R>(&self, id: VortexId, f: impl FnOnce(&VortexSimulation) -> R) -> Option<R> {
        self.registry
            .lock()
            .expect("registry poisoned")
            .active
            .get(&id)
            .map(f)
    }

    /// Run `f` against a live instance with mutable access.
    ///
    /// Same contract as [`VortexFactory::with_vortex`]; the registry lock
    /// is held while `f` runs.
    pub fn with_vortex_mut<R>(
        &self,
        id: VortexId,
        f: impl FnOnce(&mut VortexSimulation) -> R,
    ) -> Option<R> {
        self.registry
            .lock()
            .expect("registry poisoned")
            .active
            .get_mut(&id)
            .map(f)
    }

    /// Register a hook fired after each successful spawn.
    pub fn on_spawned<F>(&self, hook: F)
    where
        F: Fn(VortexId) + Send + Sync + 'static,
    {
        self.on_spawned
            .lock()
            .expect("hook list poisoned")
            .push(Box::new(hook));
    }

    /// Register a hook fired after each instance is removed.
    pub fn on_despawned<F>(&self, hook: F)
    where
        F: Fn(VortexId) + Send + Sync + 'static,
    {
        self.on_despawned
            .lock()
            .expect("hook list poisoned")
            .push(Box::new(hook));
    }

    fn fire(&self, hooks: &Mutex<Vec<LifecycleHook>>, id: VortexId) {
        for hook in hooks.lock().expect("hook list poisoned").iter() {
            hook(id);
        }
    }
}

impl Drop for VortexFactory {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for VortexFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VortexFactory")
            .field("active", &self.active_count())
            .field("capacity", &self.config.capacity)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
