//! Error types for twister.
//!
//! This module provides error types for pool acquisition, vortex spawning,
//! and per-instance update failures. Invalid entity handles are never an
//! error anywhere in the crate: a vanished object is silently evicted.

use std::fmt;

/// Errors that can occur while acquiring from a [`ResourcePool`](crate::pool::ResourcePool).
#[derive(Debug)]
pub enum PoolError {
    /// The pool was empty and the creation closure failed to produce a new item.
    CreationFailed(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::CreationFailed(msg) => {
                write!(f, "Failed to create pooled object: {}", msg)
            }
        }
    }
}

impl std::error::Error for PoolError {}

/// Errors that can occur while creating or placing a world prop.
#[derive(Debug)]
pub enum PropError {
    /// The world refused to create the prop (model missing, budget hit, ...).
    CreationRejected(String),
}

impl fmt::Display for PropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropError::CreationRejected(msg) => {
                write!(f, "World rejected prop creation: {}", msg)
            }
        }
    }
}

impl std::error::Error for PropError {}

impl From<PropError> for PoolError {
    fn from(e: PropError) -> Self {
        PoolError::CreationFailed(e.to_string())
    }
}

/// Errors that can occur when spawning a vortex through the factory.
///
/// Both variants are recoverable from the caller's point of view:
/// [`SpawnError::CapacityExceeded`] may succeed on retry once an instance
/// despawns, and [`SpawnError::Disposed`] tells the caller the factory is
/// permanently done.
#[derive(Debug, PartialEq, Eq)]
pub enum SpawnError {
    /// The factory is already running its maximum number of simulations.
    CapacityExceeded {
        /// Number of currently live instances.
        active: usize,
        /// The configured instance limit.
        capacity: usize,
    },
    /// The factory has been disposed and will never spawn again.
    Disposed,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::CapacityExceeded { active, capacity } => {
                write!(
                    f,
                    "Cannot spawn vortex: limit of {} reached ({} active)",
                    capacity, active
                )
            }
            SpawnError::Disposed => write!(f, "Factory has been disposed"),
        }
    }
}

impl std::error::Error for SpawnError {}

/// Errors surfaced by one simulation instance's tick.
///
/// The factory catches these: the failing instance is logged, force-disposed
/// and removed, and every other instance keeps running.
#[derive(Debug)]
pub enum UpdateError {
    /// The clock produced a NaN or infinite frame delta.
    InvalidDelta(f32),
    /// The instance was already disposed when ticked.
    Disposed,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::InvalidDelta(dt) => {
                write!(f, "Invalid frame delta: {}", dt)
            }
            UpdateError::Disposed => write!(f, "Update called on a disposed vortex"),
        }
    }
}

impl std::error::Error for UpdateError {}
