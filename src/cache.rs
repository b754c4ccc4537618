//! In-process cache of resolved cross-module resources
//!
//! Each `module:resource` key owns a slot guarded by its own mutex. The first
//! caller for a key computes the value while holding the slot; concurrent
//! callers for the same key wait on that slot and then share the stored
//! result. A failed computation leaves the slot empty, so nothing partial is
//! ever cached and a later call retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// A resource whose declared files were read and merged into one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    /// The merged document.
    pub data: JsonValue,
    /// `data` serialized as JSON.
    pub raw: String,
}

impl ResolvedResource {
    pub fn new(data: JsonValue) -> Result<Self> {
        let raw = serde_json::to_string(&data)?;
        Ok(Self { data, raw })
    }
}

type Slot = Arc<Mutex<Option<Arc<ResolvedResource>>>>;

/// Memoizes resolved resources by `module:resource` key.
///
/// Entries are never invalidated for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Result<Slot> {
        let mut slots = self.slots.lock().map_err(|_| Error::LockPoisoned {
            context: "resolution cache".to_string(),
        })?;
        Ok(Arc::clone(slots.entry(key.to_string()).or_default()))
    }

    /// Get a cached resource, or compute and cache it if not present.
    ///
    /// At most one `resolver` runs per key at a time; callers arriving while
    /// it runs receive its result.
    pub fn get_or_resolve<F>(&self, key: &str, resolver: F) -> Result<Arc<ResolvedResource>>
    where
        F: FnOnce() -> Result<ResolvedResource>,
    {
        let slot = self.slot(key)?;
        let mut entry = slot.lock().map_err(|_| Error::LockPoisoned {
            context: format!("resolution cache slot {}", key),
        })?;

        if let Some(cached) = entry.as_ref() {
            debug!("cache hit for {}", key);
            return Ok(Arc::clone(cached));
        }

        debug!("cache miss for {}", key);
        let resolved = Arc::new(resolver()?);
        *entry = Some(Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Get a value from cache without computing
    pub fn get(&self, key: &str) -> Result<Option<Arc<ResolvedResource>>> {
        let slot = {
            let slots = self.slots.lock().map_err(|_| Error::LockPoisoned {
                context: "resolution cache".to_string(),
            })?;
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return Ok(None),
            }
        };
        let entry = slot.lock().map_err(|_| Error::LockPoisoned {
            context: format!("resolution cache slot {}", key),
        })?;
        Ok(entry.clone())
    }

    /// Check if a key holds a resolved value
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of keys holding a resolved value
    pub fn len(&self) -> Result<usize> {
        let slots: Vec<Slot> = {
            let slots = self.slots.lock().map_err(|_| Error::LockPoisoned {
                context: "resolution cache".to_string(),
            })?;
            slots.values().cloned().collect()
        };
        let mut count = 0;
        for slot in slots {
            let entry = slot.lock().map_err(|_| Error::LockPoisoned {
                context: "resolution cache slot".to_string(),
            })?;
            if entry.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
