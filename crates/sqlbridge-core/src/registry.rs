//! Handle registry: the table that owns every foreign object the host can see.
//!
//! The host never receives a pointer. It receives a [`Handle`], stores it in
//! one of its own objects, and hands it back on every call. The registry maps
//! the handle to the object and holds the only long-lived strong reference to
//! it; when the host's collector finalizes the wrapper, [`SharedRegistry::release`]
//! drops that reference and ordinary Rust ownership reclaims the object.
//!
//! # Allocation
//!
//! Handles come from a wrapping `u32` cursor. Each allocation advances the
//! cursor and probes forward past values that still key a live entry, so a
//! handle is never granted twice while live, even after the cursor wraps.
//! Released values may be granted again later.
//!
//! # Concurrency
//!
//! Hosts may call in from several native threads at once (BEAM dirty
//! schedulers, UniFFI host threads), so [`SharedRegistry`] keeps the map and
//! cursor behind one mutex. The probe-and-insert loop runs entirely under
//! that lock.

use crate::config::RegistryConfig;
use crate::error::ContractViolation;
use crate::handle::{Handle, ObjectKind};
use crate::object::{ForeignObject, RegisteredObject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, trace, warn};

/// Read-only view of registry occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Number of live entries.
    pub live: usize,
    pub connections: usize,
    pub results: usize,
    /// Last value handed out by the allocator.
    pub cursor: u32,
}

/// Handle → foreign object table with a wraparound allocator.
///
/// This type is not synchronized; see [`SharedRegistry`] for the
/// process-wide, lock-protected form.
#[derive(Debug)]
pub struct HandleRegistry {
    entries: HashMap<Handle, ForeignObject>,
    cursor: u32,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::with_cursor(RegistryConfig::INITIAL_CURSOR)
    }

    /// Start the allocator at `cursor`; the first handle granted is `cursor + 1`
    /// (wrapping).
    pub fn with_cursor(cursor: u32) -> Self {
        Self {
            entries: HashMap::with_capacity(RegistryConfig::INITIAL_CAPACITY),
            cursor,
        }
    }

    /// Register `object` and return a handle not currently in use.
    pub fn allocate(&mut self, object: impl Into<ForeignObject>) -> Handle {
        let object = object.into();
        let kind = object.kind();

        // Terminates as long as fewer than 2^32 entries are live, which the
        // address space guarantees long before the handle space runs out.
        let mut probes = 0u32;
        let handle = loop {
            self.cursor = self.cursor.wrapping_add(1);
            let candidate = Handle::new(self.cursor);
            if !self.entries.contains_key(&candidate) {
                break candidate;
            }
            probes += 1;
        };

        if probes > 0 {
            warn!(
                "Handle allocator skipped {} live handle(s) before granting {}",
                probes, handle
            );
        }

        self.entries.insert(handle, object);
        debug!("Allocated {} handle {} ({} live)", kind, handle, self.entries.len());
        handle
    }

    /// Resolve `handle` to the object registered under it.
    ///
    /// Returns the same instance that was passed to [`HandleRegistry::allocate`].
    pub fn resolve<T: RegisteredObject>(
        &self,
        handle: Handle,
    ) -> Result<Arc<T>, ContractViolation> {
        let entry = self.entries.get(&handle);
        match entry.and_then(T::from_object) {
            Some(object) => {
                trace!("Resolved {} handle {}", T::KIND, handle);
                Ok(Arc::clone(object))
            }
            None => {
                let violation = ContractViolation {
                    handle,
                    expected: T::KIND,
                    found: entry.map(ForeignObject::kind),
                };
                error!("{}", violation);
                Err(violation)
            }
        }
    }

    /// Remove the entry for `handle`, returning it if it was live.
    ///
    /// Releasing an unknown or already released handle is a no-op.
    pub fn release(&mut self, handle: Handle) -> Option<ForeignObject> {
        let removed = self.entries.remove(&handle);
        match &removed {
            Some(object) => debug!(
                "Released {} handle {} ({} live)",
                object.kind(),
                handle,
                self.entries.len()
            ),
            None => trace!("Release of unregistered handle {} ignored", handle),
        }
        removed
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let connections = self
            .entries
            .values()
            .filter(|object| object.kind() == ObjectKind::Connection)
            .count();
        RegistrySnapshot {
            live: self.entries.len(),
            connections,
            results: self.entries.len() - connections,
            cursor: self.cursor,
        }
    }
}

/// Lock-protected [`HandleRegistry`] shared by every call into the bridge.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: Mutex<HandleRegistry>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: HandleRegistry) -> Self {
        Self {
            inner: Mutex::new(registry),
        }
    }

    pub fn allocate(&self, object: impl Into<ForeignObject>) -> Handle {
        self.lock().allocate(object)
    }

    pub fn resolve<T: RegisteredObject>(
        &self,
        handle: Handle,
    ) -> Result<Arc<T>, ContractViolation> {
        self.lock().resolve(handle)
    }

    /// Release entry point called from host finalizers.
    pub fn release(&self, handle: Handle) {
        let removed = self.lock().release(handle);
        // Closing a connection may touch disk; do it after the lock is gone.
        drop(removed);
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.lock().contains(handle)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.lock().snapshot()
    }

    // Every mutation is a single HashMap call plus a cursor store, so a panic
    // on another thread cannot leave the table half-updated.
    fn lock(&self) -> MutexGuard<'_, HandleRegistry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
