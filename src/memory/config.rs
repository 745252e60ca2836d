/*!
 * Arena and Pool Configuration
 *
 * Construction-time settings for arenas and pools. Values can come from code
 * (builder-style `with_*`), from any serde source, or from the environment:
 *
 * - `CATENA_ARENA_CAPACITY`: initial/template capacity in bytes
 * - `CATENA_ARENA_POLICY`: `fixed` or `growable`
 * - `CATENA_ARENA_MAX_CAPACITY`: upper bound for growable arenas
 * - `CATENA_POOL_MAX_IDLE`: idle arenas retained by a pool
 * - `CATENA_POOL_MAX_RETAINED`: arenas larger than this are dropped on release
 */

use super::types::ExhaustionPolicy;
use crate::core::errors::{ConfigError, ConfigResult};
use crate::core::limits::{
    DEFAULT_ARENA_CAPACITY, DEFAULT_MAX_IDLE_ARENAS, DEFAULT_MAX_RETAINED_CAPACITY,
    MAX_ARENA_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ENV_ARENA_CAPACITY: &str = "CATENA_ARENA_CAPACITY";
pub const ENV_ARENA_POLICY: &str = "CATENA_ARENA_POLICY";
pub const ENV_ARENA_MAX_CAPACITY: &str = "CATENA_ARENA_MAX_CAPACITY";
pub const ENV_POOL_MAX_IDLE: &str = "CATENA_POOL_MAX_IDLE";
pub const ENV_POOL_MAX_RETAINED: &str = "CATENA_POOL_MAX_RETAINED";

/// Arena construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Initial buffer size in bytes
    pub capacity: usize,
    pub policy: ExhaustionPolicy,
    /// Growable arenas never exceed this many bytes
    pub max_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_ARENA_CAPACITY,
            policy: ExhaustionPolicy::Fixed,
            max_capacity: MAX_ARENA_CAPACITY,
        }
    }
}

impl ArenaConfig {
    /// Fixed-policy config with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn growable(self) -> Self {
        self.with_policy(ExhaustionPolicy::Growable)
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Check bounds: capacity positive and within `max_capacity`
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid("capacity", "must be a positive number of bytes"));
        }
        if self.max_capacity > MAX_ARENA_CAPACITY {
            return Err(ConfigError::invalid(
                "max_capacity",
                format!("must not exceed {} bytes", MAX_ARENA_CAPACITY),
            ));
        }
        if self.capacity > self.max_capacity {
            return Err(ConfigError::invalid(
                "capacity",
                format!(
                    "{} bytes exceeds max_capacity of {} bytes",
                    self.capacity, self.max_capacity
                ),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by any `CATENA_ARENA_*` variables that are set
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(capacity) = env_value(ENV_ARENA_CAPACITY)? {
            config.capacity = capacity;
        }
        if let Some(policy) = env_value(ENV_ARENA_POLICY)? {
            config.policy = policy;
        }
        if let Some(max_capacity) = env_value(ENV_ARENA_MAX_CAPACITY)? {
            config.max_capacity = max_capacity;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Pool construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Template for arenas built on a pool miss
    pub arena: ArenaConfig,
    /// Idle queue bound; extra arenas are dropped on release
    pub max_idle: usize,
    /// Arenas whose capacity exceeds this are dropped on release
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            max_idle: DEFAULT_MAX_IDLE_ARENAS,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Fixed-policy template with the given capacity
    pub fn with_capacity(template_capacity: usize) -> Self {
        Self {
            arena: ArenaConfig::with_capacity(template_capacity),
            ..Self::default()
        }
    }

    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.arena.policy = policy;
        self
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_max_retained_capacity(mut self, max_retained_capacity: usize) -> Self {
        self.max_retained_capacity = max_retained_capacity;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.arena.validate()?;
        if self.max_idle == 0 {
            return Err(ConfigError::invalid("max_idle", "must be at least 1"));
        }
        if self.max_retained_capacity < self.arena.capacity {
            return Err(ConfigError::invalid(
                "max_retained_capacity",
                format!(
                    "{} bytes is below the template capacity of {} bytes",
                    self.max_retained_capacity, self.arena.capacity
                ),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by any `CATENA_*` variables that are set
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self {
            arena: ArenaConfig::from_env()?,
            ..Self::default()
        };
        if let Some(max_idle) = env_value(ENV_POOL_MAX_IDLE)? {
            config.max_idle = max_idle;
        }
        if let Some(max_retained) = env_value(ENV_POOL_MAX_RETAINED)? {
            config.max_retained_capacity = max_retained;
        }
        config.validate()?;
        Ok(config)
    }
}

fn env_value<T>(var: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::EnvParse {
                var: var.to_string(),
                value,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
