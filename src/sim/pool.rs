//! Object pool for streamed segments and projectiles
//!
//! Instances live in an arena addressed by stable [`Handle`]s. Every instance
//! is either on its kind's free list or active, never both.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use glam::Vec3;
use rand::Rng;
use thiserror::Error;

/// Stable index of a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("no variants registered for kind {0}")]
    UnknownKind(String),
    #[error("handle {0:?} was never issued by this pool")]
    InvalidHandle(Handle),
    #[error("handle {0:?} is not active (double release)")]
    DoubleRelease(Handle),
}

/// A pooled instance
#[derive(Debug, Clone)]
pub struct Instance<K> {
    pub kind: K,
    /// Which prefab variant of the kind this instance was built from
    pub variant: u16,
    pub position: Vec3,
    active: bool,
}

impl<K> Instance<K> {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Result of [`Pool::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub handle: Handle,
    /// True when the free list was empty and a new instance was built
    pub fallback: bool,
}

/// Reuse cache of deactivated instances keyed by kind
#[derive(Debug, Clone)]
pub struct Pool<K> {
    instances: Vec<Instance<K>>,
    free: HashMap<K, Vec<Handle>>,
    variants: HashMap<K, u16>,
    fallback_constructions: u32,
}

impl<K: Copy + Eq + Hash + Debug> Default for Pool<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> Pool<K> {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            free: HashMap::new(),
            variants: HashMap::new(),
            fallback_constructions: 0,
        }
    }

    /// Register `variants` prefabs for `kind` and pre-build `per_variant`
    /// inactive instances of each
    pub fn prewarm(&mut self, kind: K, variants: u16, per_variant: usize) {
        self.variants.insert(kind, variants);
        let free = self.free.entry(kind).or_default();
        for variant in 0..variants {
            for _ in 0..per_variant {
                let handle = Handle(self.instances.len() as u32);
                self.instances.push(Instance {
                    kind,
                    variant,
                    position: Vec3::ZERO,
                    active: false,
                });
                free.push(handle);
            }
        }
    }

    /// Take an inactive instance of `kind`, building a new one if none is free
    pub fn acquire<R: Rng>(&mut self, kind: K, rng: &mut R) -> Result<Acquired, PoolError> {
        let variants = self.variants.get(&kind).copied().unwrap_or(0);
        if variants == 0 {
            return Err(PoolError::UnknownKind(format!("{kind:?}")));
        }

        if let Some(handle) = self.free.get_mut(&kind).and_then(|free| free.pop()) {
            self.instances[handle.index()].active = true;
            return Ok(Acquired {
                handle,
                fallback: false,
            });
        }

        let variant = rng.random_range(0..variants);
        let handle = Handle(self.instances.len() as u32);
        self.instances.push(Instance {
            kind,
            variant,
            position: Vec3::ZERO,
            active: true,
        });
        self.fallback_constructions += 1;
        log::warn!(
            "Pool for {:?} exhausted, constructed instance {} (variant {})",
            kind,
            handle.0,
            variant
        );

        Ok(Acquired {
            handle,
            fallback: true,
        })
    }

    /// Deactivate an instance and return it to its kind's free list
    pub fn release(&mut self, handle: Handle) -> Result<(), PoolError> {
        let instance = self
            .instances
            .get_mut(handle.index())
            .ok_or(PoolError::InvalidHandle(handle))?;
        if !instance.active {
            return Err(PoolError::DoubleRelease(handle));
        }
        instance.active = false;
        instance.position = Vec3::ZERO;
        self.free.entry(instance.kind).or_default().push(handle);
        Ok(())
    }

    pub fn get(&self, handle: Handle) -> Option<&Instance<K>> {
        self.instances.get(handle.index())
    }

    pub fn set_position(&mut self, handle: Handle, position: Vec3) -> Result<(), PoolError> {
        let instance = self
            .instances
            .get_mut(handle.index())
            .ok_or(PoolError::InvalidHandle(handle))?;
        instance.position = position;
        Ok(())
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.get(handle).is_some_and(Instance::is_active)
    }

    /// Free instances of `kind`
    pub fn available(&self, kind: K) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.active).count()
    }

    /// Total instances ever built
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances built because the free list was empty
    pub fn fallback_constructions(&self) -> u32 {
        self.fallback_constructions
    }
}
