//! Simulation configuration.
//!
//! One flat, typed struct instead of a stringly-typed runtime variable
//! table. Hosts construct it in code or deserialize it from whatever they
//! persist, then hand it to the factory; nothing in the core reads
//! configuration from anywhere else.
//!
//! Several defaults (notably [`VortexConfig::eviction_margin`]) are
//! empirical tuning values with no documented derivation. They live here
//! rather than as hard-coded constants so hosts can retune them.

use serde::{Deserialize, Serialize};

/// Tuning for a vortex simulation and its owning factory.
///
/// # Example
///
/// ```
/// use twister::config::VortexConfig;
///
/// let config = VortexConfig::default()
///     .with_force_scale(4.0)
///     .with_capture_radius(120.0)
///     .with_lifespan_ms(30_000);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VortexConfig {
    /// Global multiplier on every force the vortex applies. Clamped to
    /// `[0.1, 10.0]` by [`VortexConfig::with_force_scale`].
    pub force_scale: f32,
    /// Radius within which objects are held, in meters.
    pub capture_radius: f32,
    /// Extra margin added to the capture radius during discovery sweeps.
    pub capture_margin: f32,
    /// Distance inside the capture radius at which objects are evicted.
    ///
    /// Empirical tuning value, no derivation.
    pub eviction_margin: f32,
    /// Upper bound on the captured working set per simulation.
    pub max_entity_count: usize,
    /// Instance lifetime in simulated milliseconds; `-1` means never
    /// despawn on age.
    pub lifespan_ms: i64,
    /// Scale on the inward horizontal pull.
    pub horizontal_pull: f32,
    /// Scale on the upward lift toward the point above the center.
    pub vertical_pull: f32,
    /// Scale on the tangential force that spins objects around the center.
    pub rotation_pull: f32,
    /// Height above the center that lift pulls toward, in meters.
    pub lift_height: f32,
    /// Speed clamp re-applied to every captured object each step, m/s.
    pub top_speed: f32,
    /// Objects higher above ground than this are never captured and are
    /// evicted if they get there, in meters.
    pub height_cutoff: f32,
    /// Per-axis bound of the random lateral bias given to each capture.
    pub lateral_bias_max: f32,
    /// Lower bound of the per-step force jitter draw.
    pub jitter_min: f32,
    /// Upper bound of the per-step force jitter draw.
    pub jitter_max: f32,
    /// Extra force multiplier for the primary actor.
    pub primary_force_multiplier: f32,
    /// Fraction of force applied to the primary actor while its line of
    /// sight to the pull target is obstructed.
    pub los_blocked_force_factor: f32,
    /// Throttle for the primary-actor line-of-sight check, simulated ms.
    pub los_interval_ms: u64,
    /// Extra force multiplier for vehicles above [`VortexConfig::airborne_height`].
    pub airborne_vehicle_multiplier: f32,
    /// Height above ground at which a vehicle counts as airborne, meters.
    pub airborne_height: f32,
    /// Throttle between discovery sweeps, simulated ms.
    pub discovery_interval_ms: u64,
    /// Speed at which the vortex center moves toward its destination, m/s.
    pub move_speed: f32,
    /// Throttle between destination reselections, simulated ms.
    pub destination_interval_ms: u64,
    /// Radius around the current destination for random wander targets.
    pub wander_radius: f32,
    /// Radius around the primary actor for tracking destinations.
    pub primary_bias_radius: f32,
    /// Drift distance from the primary actor beyond which destination
    /// selection is biased back toward it.
    pub max_primary_drift: f32,
    /// Maximum planar distance from a candidate destination to the
    /// nearest road for the candidate to be accepted.
    pub road_snap_distance: f32,
    /// Maximum height difference between a candidate destination and the
    /// nearest road point.
    pub road_height_tolerance: f32,
    /// How many candidate destinations to try before giving up and
    /// keeping the last one.
    pub destination_retries: u32,
    /// Depth below terrain height at which the funnel base sits, meters.
    pub submersion_depth: f32,
    /// Distance to the destination below which movement stops.
    pub arrival_threshold: f32,
    /// Throttle between debris spawns, simulated ms.
    pub debris_interval_ms: u64,
    /// Planar radius around the center where debris appears.
    pub debris_radius: f32,
    /// Height above the center where idle pooled props are parked.
    pub staging_height: f32,
    /// Idle-set bound of the per-instance debris pool.
    pub pool_size: usize,
    /// Maximum number of concurrently live simulations per factory.
    pub capacity: usize,
    /// Seed for the per-instance jitter RNG; `None` seeds from entropy.
    ///
    /// Fixing this makes a single run reproducible, which the tests use.
    pub jitter_seed: Option<u64>,
}

impl Default for VortexConfig {
    fn default() -> Self {
        Self {
            force_scale: 3.0,
            capture_radius: 100.0,
            capture_margin: 4.0,
            eviction_margin: 13.0,
            max_entity_count: 300,
            lifespan_ms: 60_000,
            horizontal_pull: 1.0,
            vertical_pull: 1.0,
            rotation_pull: 0.6,
            lift_height: 30.0,
            top_speed: 50.0,
            height_cutoff: 300.0,
            lateral_bias_max: 3.0,
            jitter_min: 1.0,
            jitter_max: 1.5,
            primary_force_multiplier: 2.0,
            los_blocked_force_factor: 0.25,
            los_interval_ms: 1000,
            airborne_vehicle_multiplier: 1.5,
            airborne_height: 15.0,
            discovery_interval_ms: 600,
            move_speed: 0.287,
            destination_interval_ms: 5000,
            wander_radius: 100.0,
            primary_bias_radius: 130.0,
            max_primary_drift: 200.0,
            road_snap_distance: 40.0,
            road_height_tolerance: 10.0,
            destination_retries: 50,
            submersion_depth: 10.0,
            arrival_threshold: 0.1,
            debris_interval_ms: 500,
            debris_radius: 5.0,
            staging_height: 100.0,
            pool_size: 3,
            capacity: 30,
            jitter_seed: None,
        }
    }
}

impl VortexConfig {
    /// Set the global force multiplier, clamped to `[0.1, 10.0]`.
    pub fn with_force_scale(mut self, scale: f32) -> Self {
        self.force_scale = scale.clamp(0.1, 10.0);
        self
    }

    /// Set the capture radius.
    pub fn with_capture_radius(mut self, radius: f32) -> Self {
        self.capture_radius = radius;
        self
    }

    /// Set the instance lifetime in milliseconds; pass `-1` for infinite.
    pub fn with_lifespan_ms(mut self, lifespan_ms: i64) -> Self {
        self.lifespan_ms = lifespan_ms;
        self
    }

    /// Set the captured working-set bound.
    pub fn with_max_entity_count(mut self, count: usize) -> Self {
        self.max_entity_count = count;
        self
    }

    /// Set the factory's concurrent-instance limit.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fix the jitter RNG seed for reproducible runs.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Disable the debris layer entirely.
    pub fn without_debris(mut self) -> Self {
        self.debris_interval_ms = u64::MAX;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_values() {
        let c = VortexConfig::default();
        assert_eq!(c.force_scale, 3.0);
        assert_eq!(c.max_entity_count, 300);
        assert_eq!(c.capacity, 30);
        assert_eq!(c.eviction_margin, 13.0);
        assert_eq!(c.discovery_interval_ms, 600);
    }

    #[test]
    fn test_force_scale_clamped() {
        assert_eq!(VortexConfig::default().with_force_scale(99.0).force_scale, 10.0);
        assert_eq!(VortexConfig::default().with_force_scale(0.0).force_scale, 0.1);
    }

    #[test]
    fn test_roundtrips_through_serde() {
        let c = VortexConfig::default()
            .with_capture_radius(80.0)
            .with_jitter_seed(7);
        let json = serde_json::to_string(&c).unwrap();
        let back: VortexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.capture_radius, 80.0);
        assert_eq!(back.jitter_seed, Some(7));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let back: VortexConfig = serde_json::from_str(r#"{"force_scale": 5.0}"#).unwrap();
        assert_eq!(back.force_scale, 5.0);
        assert_eq!(back.capture_radius, 100.0);
    }
}
