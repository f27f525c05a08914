use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// TTL cache keyed strictly by owner id. Only ever used to skip redundant
/// refetching; a miss or an expired entry just falls through to the
/// database.
#[derive(Debug, Clone)]
pub struct OwnerCache<V: Clone> {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<Uuid, (Instant, V)>>>,
}

impl<V: Clone> OwnerCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, owner: Uuid) -> Option<V> {
        let guard = self.entries.read().expect("owner cache lock poisoned");
        match guard.get(&owner) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, owner: Uuid, value: V) {
        let mut guard = self.entries.write().expect("owner cache lock poisoned");
        guard.insert(owner, (Instant::now(), value));
    }

    /// Drop a single owner's entry, e.g. after their profile changes.
    pub fn purge(&self, owner: Uuid) {
        let mut guard = self.entries.write().expect("owner cache lock poisoned");
        guard.remove(&owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_then_purge() {
        let cache = OwnerCache::new(Duration::from_secs(60));
        let owner = Uuid::new_v4();
        assert!(cache.get(owner).is_none());
        cache.insert(owner, 42u32);
        assert_eq!(cache.get(owner), Some(42));
        cache.purge(owner);
        assert!(cache.get(owner).is_none());
    }

    #[test]
    fn expires_after_ttl() {
        let cache = OwnerCache::new(Duration::from_millis(10));
        let owner = Uuid::new_v4();
        cache.insert(owner, "profile".to_string());
        assert!(cache.get(owner).is_some());
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(owner).is_none());
    }

    #[test]
    fn owners_do_not_share_entries() {
        let cache = OwnerCache::new(Duration::from_secs(60));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.insert(a, 1u8);
        assert!(cache.get(b).is_none());
        cache.purge(b);
        assert_eq!(cache.get(a), Some(1));
    }
}
