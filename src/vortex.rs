//! The vortex simulation: capture, force application, eviction, movement.
//!
//! A [`VortexSimulation`] is one live attractor. Each host tick it feeds
//! the frame delta into a fixed-timestep accumulator and runs zero or more
//! constant-size physics steps; each step refreshes the captured working
//! set, applies inward/lift/tangential forces through the
//! [`ForceApplier`](crate::world::ForceApplier), and evicts entries that
//! left the influence radius or vanished. A variable-rate step afterwards
//! handles the debris layer and lifespan bookkeeping.
//!
//! Instances are owned and driven by the
//! [`VortexFactory`](crate::factory::VortexFactory); hosts rarely
//! construct one directly.

use crate::config::VortexConfig;
use crate::entity::{CapturedEntity, EntityHandle, EntityProbe, ObjectClass};
use crate::error::UpdateError;
use crate::pool::ResourcePool;
use crate::time::{FixedTimestep, FIXED_TIME_STEP};
use crate::world::WorldContext;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Lifecycle of one simulation instance.
///
/// Transitions only move forward; `Disposed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VortexState {
    /// Constructed, not yet ticked.
    Spawning,
    /// Ticking normally.
    Active,
    /// Despawn flag observed; waiting for the factory to remove it.
    DespawnRequested,
    /// Torn down. Terminal.
    Disposed,
}

/// One live attractor simulation.
pub struct VortexSimulation {
    config: VortexConfig,
    world: WorldContext,
    position: Vec3,
    destination: Vec3,
    created_at_ms: u64,
    state: VortexState,
    despawn_requested: AtomicBool,
    captured: Mutex<HashMap<EntityHandle, CapturedEntity>>,
    pending_removal: Mutex<Vec<EntityHandle>>,
    pool: ResourcePool<EntityHandle>,
    accumulator: FixedTimestep,
    rng: SmallRng,
    next_discovery_ms: u64,
    next_destination_ms: u64,
    next_debris_ms: u64,
    next_los_ms: u64,
    los_blocked: bool,
    debris_disabled: bool,
}

impl VortexSimulation {
    /// Create a simulation centered at `position`.
    ///
    /// The creation time, and with it the lifespan countdown, is read from
    /// the context clock immediately.
    pub fn new(position: Vec3, config: VortexConfig, world: WorldContext) -> Self {
        let now = world.clock.now_ms();
        let rng = match config.jitter_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let staging = position + Vec3::Z * config.staging_height;
        let props = world.props.clone();
        let create_props = props.clone();
        let reset_props = props.clone();
        let pool = ResourcePool::new(config.pool_size, move || {
            create_props.create(staging).map_err(Into::into)
        })
        .with_reset(move |handle: &mut EntityHandle| reset_props.place(*handle, staging))
        .with_teardown(move |handle| {
            props.destroy(handle);
            Ok(())
        });

        let debris_disabled = config.debris_interval_ms == u64::MAX;
        log::info!("Created vortex at {:?}, lifespan {}ms", position, config.lifespan_ms);

        Self {
            next_discovery_ms: now,
            next_destination_ms: now.saturating_add(config.destination_interval_ms),
            next_debris_ms: now.saturating_add(config.debris_interval_ms),
            next_los_ms: now,
            config,
            world,
            position,
            destination: position,
            created_at_ms: now,
            state: VortexState::Spawning,
            despawn_requested: AtomicBool::new(false),
            captured: Mutex::new(HashMap::new()),
            pending_removal: Mutex::new(Vec::new()),
            pool,
            accumulator: FixedTimestep::new(FIXED_TIME_STEP),
            rng,
            los_blocked: false,
            debris_disabled,
        }
    }

    /// Current center position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Point the center is currently moving toward.
    #[inline]
    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> VortexState {
        self.state
    }

    /// Simulated time at which the instance was created.
    #[inline]
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Whether a despawn has been requested (lifespan or external signal).
    pub fn despawn_requested(&self) -> bool {
        self.despawn_requested.load(Ordering::Acquire)
            || matches!(self.state, VortexState::DespawnRequested | VortexState::Disposed)
    }

    /// Cooperatively request a despawn; observed on the next tick.
    ///
    /// Callable from any thread.
    pub fn request_despawn(&self) {
        self.despawn_requested.store(true, Ordering::Release);
    }

    /// Number of objects currently captured.
    pub fn captured_count(&self) -> usize {
        self.captured.lock().expect("capture registry poisoned").len()
    }

    /// Snapshot of the captured entries.
    pub fn captured_entities(&self) -> Vec<CapturedEntity> {
        self.captured
            .lock()
            .expect("capture registry poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Whether a specific handle is currently captured.
    pub fn is_captured(&self, handle: EntityHandle) -> bool {
        self.captured
            .lock()
            .expect("capture registry poisoned")
            .contains_key(&handle)
    }

    /// Number of idle debris bodies in this instance's pool.
    pub fn pool_idle_count(&self) -> usize {
        self.pool.idle_count()
    }

    /// Queue a captured object for removal in the next eviction batch.
    ///
    /// Idempotent and tolerant of unknown handles. Callable from any
    /// thread.
    pub fn release_entity(&self, handle: EntityHandle) {
        self.pending_removal
            .lock()
            .expect("removal queue poisoned")
            .push(handle);
    }

    /// Advance the simulation by one host tick.
    ///
    /// Runs as many fixed physics steps as the accumulated frame time
    /// allows, then the variable-rate bookkeeping. Returns an error only
    /// for conditions the factory should treat as instance failure.
    pub fn update(&mut self, now_ms: u64) -> Result<(), UpdateError> {
        if self.state == VortexState::Disposed {
            return Err(UpdateError::Disposed);
        }
        if self.state == VortexState::Spawning {
            self.state = VortexState::Active;
        }

        let delta = self.world.clock.frame_delta_seconds();
        if !delta.is_finite() {
            return Err(UpdateError::InvalidDelta(delta));
        }

        let steps = self.accumulator.advance(delta);
        for _ in 0..steps {
            self.fixed_step(now_ms, FIXED_TIME_STEP);
        }

        self.check_lifespan(now_ms);
        self.update_debris(now_ms);

        if self.state == VortexState::Active && self.despawn_requested.load(Ordering::Acquire) {
            self.state = VortexState::DespawnRequested;
        }
        Ok(())
    }

    /// Tear the instance down: evict everything, drain the pool.
    ///
    /// Idempotent, never panics, never propagates cleanup errors.
    pub fn dispose(&mut self) {
        if self.state == VortexState::Disposed {
            return;
        }
        self.state = VortexState::Disposed;

        self.pending_removal
            .lock()
            .expect("removal queue poisoned")
            .clear();

        let evicted: Vec<CapturedEntity> = {
            let mut captured = self.captured.lock().expect("capture registry poisoned");
            captured.drain().map(|(_, e)| e).collect()
        };
        let count = evicted.len();
        for entry in evicted {
            if entry.pooled {
                self.recycle_debris(entry.handle);
            }
        }

        self.pool.clear(true);
        log::info!("Disposed vortex at {:?} ({} entities released)", self.position, count);
    }

    // ------------------------------------------------------------------
    // Fixed physics step
    // ------------------------------------------------------------------

    fn fixed_step(&mut self, now_ms: u64, dt: f32) {
        self.update_movement(now_ms, dt);

        if now_ms >= self.next_discovery_ms {
            self.collect_nearby_entities();
            self.next_discovery_ms = now_ms.saturating_add(self.config.discovery_interval_ms);
        }

        self.apply_forces(now_ms);
        self.process_pending_removals();
    }

    fn check_lifespan(&mut self, now_ms: u64) {
        if self.config.lifespan_ms >= 0
            && now_ms.saturating_sub(self.created_at_ms) > self.config.lifespan_ms as u64
        {
            self.despawn_requested.store(true, Ordering::Release);
        }
    }

    /// Sweep the surroundings for new captures.
    ///
    /// Skips anything already captured, anything above the height cutoff,
    /// and stops once the working set is full. Each new capture gets its
    /// own lateral bias so the swarm spirals instead of converging on one
    /// point.
    fn collect_nearby_entities(&mut self) {
        let radius = self.config.capture_radius + self.config.capture_margin;
        let probes = self.world.entities.query_near(self.position, radius);

        let bias = self.config.lateral_bias_max;
        let mut added = 0usize;
        let mut captured = self.captured.lock().expect("capture registry poisoned");
        for probe in probes {
            if captured.len() >= self.config.max_entity_count {
                break;
            }
            if captured.contains_key(&probe.handle) {
                continue;
            }
            if probe.height_above_ground > self.config.height_cutoff {
                continue;
            }

            let distance = planar_distance(probe.position, self.position);
            let entry = CapturedEntity::from_probe(
                &probe,
                distance,
                self.rng.gen_range(-bias..=bias),
                self.rng.gen_range(-bias..=bias),
            );
            captured.insert(probe.handle, entry);
            added += 1;
        }

        if added > 0 {
            log::debug!("Captured {} new entities ({} total)", added, captured.len());
        }
    }

    /// Apply forces to every captured entry, queueing evictions.
    ///
    /// Works on a snapshot so no lock is held across collaborator calls;
    /// position/pulling updates are written back afterwards, skipping
    /// entries that were evicted in the meantime.
    fn apply_forces(&mut self, now_ms: u64) {
        let snapshot = self.captured_entities();
        if snapshot.is_empty() {
            return;
        }

        let lift_target = self.position + Vec3::Z * self.config.lift_height;
        let evict_radius = self.config.capture_radius - self.config.eviction_margin;
        let mut updates: Vec<(EntityHandle, Vec3, bool)> = Vec::with_capacity(snapshot.len());

        for entry in &snapshot {
            let probe = match self.world.entities.probe(entry.handle) {
                Some(p) => p,
                None => {
                    // Vanished between query and apply: silent eviction.
                    self.release_entity(entry.handle);
                    continue;
                }
            };

            let distance = planar_distance(probe.position, self.position);
            if distance > evict_radius || probe.height_above_ground > self.config.height_cutoff {
                self.release_entity(entry.handle);
                continue;
            }

            if entry.is_primary_actor && now_ms >= self.next_los_ms {
                self.los_blocked = !self.world.ground.line_of_sight(probe.position, lift_target);
                self.next_los_ms = now_ms.saturating_add(self.config.los_interval_ms);
            }

            let (force, torque, pulling_in) = self.entity_forces(entry, &probe, distance, lift_target);
            self.world.forces.apply(entry.handle, force, torque);
            self.world.forces.limit_speed(entry.handle, self.config.top_speed);
            updates.push((entry.handle, probe.position, pulling_in));
        }

        let mut captured = self.captured.lock().expect("capture registry poisoned");
        for (handle, position, pulling_in) in updates {
            if let Some(entry) = captured.get_mut(&handle) {
                entry.last_position = position;
                entry.pulling_in = pulling_in;
            }
        }
    }

    /// Compute the force and torque for one captured entry this step.
    fn entity_forces(
        &mut self,
        entry: &CapturedEntity,
        probe: &EntityProbe,
        distance: f32,
        lift_target: Vec3,
    ) -> (Vec3, Vec3, bool) {
        let cfg = &self.config;
        let target = Vec3::new(
            self.position.x + entry.bias_x,
            self.position.y + entry.bias_y,
            probe.position.z,
        );
        let inward = planar_direction(probe.position, target);

        let jitter_a = self.rng.gen_range(cfg.jitter_min..=cfg.jitter_max);
        let jitter_b = self.rng.gen_range(cfg.jitter_min..=cfg.jitter_max);
        let mut horizontal =
            inward_magnitude(cfg.force_scale * cfg.horizontal_pull, jitter_a, jitter_b, distance);
        let mut vertical = cfg.force_scale * cfg.vertical_pull;

        if entry.is_primary_actor {
            horizontal *= cfg.primary_force_multiplier;
            vertical *= cfg.primary_force_multiplier;
        }

        let lift = (lift_target - probe.position).normalize_or_zero() * vertical;
        let tangent = inward.cross(Vec3::Z) * (cfg.force_scale * cfg.rotation_pull);
        let mut force = inward * horizontal + lift + tangent;

        // Sight-blocked primary actors keep a reduced pull instead of a
        // full suspension, so they cannot hang at the boundary between
        // check windows.
        let pulling_in = !(entry.is_primary_actor && self.los_blocked);
        if !pulling_in {
            force *= cfg.los_blocked_force_factor;
        }

        if probe.class == ObjectClass::Vehicle && probe.height_above_ground > cfg.airborne_height {
            force *= cfg.airborne_vehicle_multiplier;
        }

        let torque = if entry.pooled {
            Vec3::Z * (cfg.rotation_pull * jitter_a)
        } else {
            Vec3::ZERO
        };

        (force, torque, pulling_in)
    }

    /// Remove everything queued for eviction in one batch.
    fn process_pending_removals(&mut self) {
        let drained: Vec<EntityHandle> = {
            let mut pending = self.pending_removal.lock().expect("removal queue poisoned");
            std::mem::take(&mut *pending)
        };
        if drained.is_empty() {
            return;
        }

        let removed: Vec<CapturedEntity> = {
            let mut captured = self.captured.lock().expect("capture registry poisoned");
            drained
                .into_iter()
                .filter_map(|handle| captured.remove(&handle))
                .collect()
        };

        for entry in &removed {
            if entry.pooled {
                self.recycle_debris(entry.handle);
            }
        }
        if !removed.is_empty() {
            log::debug!("Evicted {} entities", removed.len());
        }
    }

    fn recycle_debris(&self, handle: EntityHandle) {
        if !self.pool.release(handle) {
            self.world.props.destroy(handle);
        }
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    fn update_movement(&mut self, now_ms: u64, dt: f32) {
        let to_destination = self.destination - self.position;
        let arrived = to_destination.length() < self.config.arrival_threshold;

        if now_ms >= self.next_destination_ms || arrived {
            self.select_destination();
            self.next_destination_ms = now_ms.saturating_add(self.config.destination_interval_ms);
        }

        if !arrived {
            let step = to_destination.normalize_or_zero() * self.config.move_speed * dt;
            // Never overshoot the destination.
            if step.length() >= to_destination.length() {
                self.position = self.destination;
            } else {
                self.position += step;
            }
        }
    }

    /// Pick a new destination, validated against ground and road queries.
    ///
    /// Biased back toward the primary actor when the funnel has drifted
    /// too far from it. Up to `destination_retries` candidates; if none
    /// validates, the last one wins anyway.
    fn select_destination(&mut self) {
        let cfg = &self.config;
        let track_primary = match self.world.entities.primary_actor() {
            Some(actor) => planar_distance(self.position, actor.position) > cfg.max_primary_drift,
            None => false,
        };

        let mut candidate = self.destination;
        for _ in 0..cfg.destination_retries {
            let base = if track_primary {
                match self.world.entities.primary_actor() {
                    Some(actor) => actor.position,
                    None => self.destination,
                }
            } else {
                self.destination
            };
            let radius = if track_primary {
                cfg.primary_bias_radius
            } else {
                cfg.wander_radius
            };

            let angle = self.rng.gen_range(0.0..TAU);
            let reach = radius * self.rng.gen_range(0.0f32..1.0).sqrt();
            candidate = base + Vec3::new(angle.cos() * reach, angle.sin() * reach, 0.0);
            candidate.z = self.world.ground.height_at(candidate) - cfg.submersion_depth;

            let road = self.world.roads.nearest_point(candidate);
            if planar_distance(candidate, road) < cfg.road_snap_distance
                && (road.z - candidate.z).abs() < cfg.road_height_tolerance
            {
                break;
            }
        }
        self.destination = candidate;
    }

    // ------------------------------------------------------------------
    // Debris layer
    // ------------------------------------------------------------------

    /// Spawn one pooled debris body near the center, throttled.
    ///
    /// The body joins the capture registry as a regular `Prop` entry so
    /// the force pass spins it like anything else. A failing prop factory
    /// disables the layer for this instance; debris is flavor, not load-
    /// bearing.
    fn update_debris(&mut self, now_ms: u64) {
        if self.debris_disabled || now_ms < self.next_debris_ms {
            return;
        }
        self.next_debris_ms = now_ms.saturating_add(self.config.debris_interval_ms);

        {
            let captured = self.captured.lock().expect("capture registry poisoned");
            if captured.len() >= self.config.max_entity_count {
                return;
            }
        }

        let handle = match self.pool.acquire() {
            Ok(h) => h,
            Err(e) => {
                log::warn!("Debris disabled for this vortex: {}", e);
                self.debris_disabled = true;
                return;
            }
        };

        let cfg = &self.config;
        let angle = self.rng.gen_range(0.0..TAU);
        let reach = self.rng.gen_range(0.0..cfg.debris_radius);
        let lift = cfg.submersion_depth + self.rng.gen_range(3.0..7.0);
        let spawn = self.position + Vec3::new(angle.cos() * reach, angle.sin() * reach, lift);
        self.world.props.place(handle, spawn);

        let bias = cfg.lateral_bias_max;
        let entry = CapturedEntity::from_probe(
            &EntityProbe {
                handle,
                position: spawn,
                height_above_ground: lift,
                class: ObjectClass::Prop,
                is_primary_actor: false,
            },
            reach,
            self.rng.gen_range(-bias..=bias),
            self.rng.gen_range(-bias..=bias),
        )
        .pooled();

        self.captured
            .lock()
            .expect("capture registry poisoned")
            .insert(handle, entry);
    }
}

impl std::fmt::Debug for VortexSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VortexSimulation")
            .field("position", &self.position)
            .field("state", &self.state)
            .field("captured", &self.captured_count())
            .finish()
    }
}

/// Planar (XY) distance between two points.
#[inline]
fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Unit planar direction from `from` toward `to` (zero if coincident).
#[inline]
fn planar_direction(from: Vec3, to: Vec3) -> Vec3 {
    Vec3::new(to.x - from.x, to.y - from.y, 0.0).normalize_or_zero()
}

/// Magnitude of the inward pull at a given planar distance.
///
/// Distance is floored at one meter so the pull stays bounded near the
/// center. Strictly non-increasing in `distance` for fixed jitter.
#[inline]
fn inward_magnitude(scale: f32, jitter_a: f32, jitter_b: f32, distance: f32) -> f32 {
    scale * (jitter_a + jitter_b / distance.max(1.0))
}
