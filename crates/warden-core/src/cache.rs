//! Decision cache shared by the resource access controllers.
//!
//! Each key owns a slot holding a `OnceCell`. The first caller on a cold key
//! runs the resolution; concurrent callers for the same key await that one
//! resolution. The map itself is only touched synchronously, so a pending
//! resolution never blocks lookups of other keys.
//!
//! Invalidation removes slots whatever their state. A resolution that was in
//! flight when its slot got removed still completes for the callers already
//! waiting on it, but later lookups start from a fresh slot.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::action::Action;
use crate::decision::Decision;
use crate::error::AccessError;
use crate::resource::{ResourceId, ResourceKind, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    pub kind: ResourceKind,
    pub user_id: UserId,
    pub resource_id: ResourceId,
    pub action: Action,
}

impl DecisionKey {
    pub fn new(user_id: UserId, resource_id: ResourceId, action: Action) -> Self {
        Self {
            kind: action.kind(),
            user_id,
            resource_id,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDecision {
    pub decision: Decision,
    /// Workspace the resource resolved under; always `None` for workspaces.
    pub parent: Option<ResourceId>,
}

/// Selects cache entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionFilter {
    pub kind: Option<ResourceKind>,
    pub user_id: Option<UserId>,
    pub resource_id: Option<ResourceId>,
    pub parent_id: Option<ResourceId>,
}

impl DecisionFilter {
    /// Entries still being resolved have no known parent yet and always match
    /// a parent filter.
    pub fn matches(&self, key: &DecisionKey, value: Option<&CachedDecision>) -> bool {
        if let Some(kind) = self.kind
            && kind != key.kind
        {
            return false;
        }
        if let Some(ref user_id) = self.user_id
            && user_id != &key.user_id
        {
            return false;
        }
        if let Some(ref resource_id) = self.resource_id
            && resource_id != &key.resource_id
        {
            return false;
        }
        if let Some(ref parent_id) = self.parent_id
            && let Some(value) = value
            && value.parent.as_ref() != Some(parent_id)
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    resolutions: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Stamped {
    value: CachedDecision,
    expires_at: Instant,
}

impl Stamped {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Slot {
    cell: OnceCell<Stamped>,
}

#[derive(Debug)]
pub struct DecisionCache {
    entries: DashMap<DecisionKey, Arc<Slot>>,
    ttl: Duration,
    stats: CacheStats,
}

impl DecisionCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: config.ttl,
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Peeks at a settled entry. Counts as a hit or a miss.
    pub fn get(&self, key: &DecisionKey) -> Option<CachedDecision> {
        let value = self.settled(key);
        let counter = if value.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    fn settled(&self, key: &DecisionKey) -> Option<CachedDecision> {
        let slot = self.entries.get(key).map(|entry| Arc::clone(entry.value()))?;
        let stamped = slot.cell.get()?;
        if stamped.is_expired(Instant::now()) {
            self.evict(key, &slot);
            return None;
        }
        Some(stamped.value.clone())
    }

    pub fn put(&self, key: DecisionKey, value: CachedDecision, ttl: Duration) {
        let stamped = Stamped {
            value,
            expires_at: Instant::now() + ttl,
        };
        let slot = Slot {
            cell: OnceCell::new_with(Some(stamped)),
        };
        self.entries.insert(key, Arc::new(slot));
    }

    /// Returns the cached decision for `key`, running `resolve` on a miss.
    ///
    /// At most one resolution per key is in flight. A failed resolution is
    /// not cached; the next waiter runs its own, and with no waiter left the
    /// slot is dropped.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        key: DecisionKey,
        resolve: F,
    ) -> Result<CachedDecision, AccessError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedDecision, AccessError>>,
    {
        let slot = self.live_slot(&key);
        if let Some(stamped) = slot.cell.get() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(stamped.value.clone());
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let ttl = self.ttl;
        let stats = &self.stats;
        let resolved = slot
            .cell
            .get_or_try_init(|| async move {
                stats.resolutions.fetch_add(1, Ordering::Relaxed);
                let value = resolve().await?;
                Ok::<_, AccessError>(Stamped {
                    value,
                    expires_at: Instant::now() + ttl,
                })
            })
            .await;

        match resolved {
            Ok(stamped) => Ok(stamped.value.clone()),
            Err(err) => {
                // One reference is held by the map, one by us.
                if Arc::strong_count(&slot) <= 2 {
                    self.evict(&key, &slot);
                }
                Err(err)
            }
        }
    }

    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&DecisionKey, Option<&CachedDecision>) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|key, slot| {
            let value = slot.cell.get().map(|stamped| &stamped.value);
            if predicate(key, value) {
                removed += 1;
                false
            } else {
                true
            }
        });
        self.stats
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn invalidate_matching(&self, filter: &DecisionFilter) -> usize {
        self.invalidate(|key, value| filter.matches(key, value))
    }

    /// Drops expired entries and unset slots nobody is waiting on. Slots with
    /// a resolution in flight are kept.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot.cell.get() {
            Some(stamped) => !stamped.is_expired(now),
            None => Arc::strong_count(slot) > 1,
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn live_slot(&self, key: &DecisionKey) -> Arc<Slot> {
        loop {
            let slot = Arc::clone(self.entries.entry(key.clone()).or_default().value());
            match slot.cell.get() {
                Some(stamped) if stamped.is_expired(Instant::now()) => self.evict(key, &slot),
                _ => return slot,
            }
        }
    }

    fn evict(&self, key: &DecisionKey, slot: &Arc<Slot>) {
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, slot));
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
