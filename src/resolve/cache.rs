//! TTL-and-size-bounded caching resolver. The only shared mutable state in
//! the whole system: a reader/writer lock guards the map, and the
//! inner resolver is always called outside the lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use parking_lot::RwLock;

use super::resolver::Resolver;

#[derive(Clone)]
struct Entry {
    service: String,
    found: bool,
    expires_at: Instant,
}

pub struct CachingResolver {
    inner: Box<dyn Resolver>,
    ttl: Duration,
    max_size: usize,
    cache: RwLock<HashMap<String, Entry>>,
}

impl CachingResolver {
    pub fn new(inner: Box<dyn Resolver>, ttl: Duration, max_size: usize) -> Self {
        Self {
            inner,
            ttl,
            max_size,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Removes one entry immediately; the next `resolve` call for `host`
    /// always consults the inner resolver.
    pub fn invalidate(&self, host: &str) {
        self.cache.write().remove(host);
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts the entry with the smallest `expires_at` (oldest-to-expire
    /// first). Called before insert, never after, so the bound on `|cache|`
    /// holds at every observable point.
    fn evict_one(cache: &mut HashMap<String, Entry>) {
        if let Some(victim) = cache
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(host, _)| host.clone())
        {
            cache.remove(&victim);
        }
    }
}

impl Resolver for CachingResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, (String, bool)> {
        Box::pin(async move {
            let now = Instant::now();
            if let Some(entry) = self.cache.read().get(host) {
                if now < entry.expires_at {
                    // Negative cache entries are returned too: this is what
                    // prevents repeated misses from hammering the inner
                    // resolver.
                    return (entry.service.clone(), entry.found);
                }
            }

            // Inner resolver call happens without holding the lock.
            let (service, found) = self.inner.resolve(host).await;

            let mut cache = self.cache.write();
            if self.max_size > 0 && cache.len() >= self.max_size && !cache.contains_key(host) {
                Self::evict_one(&mut cache);
            }
            cache.insert(
                host.to_string(),
                Entry {
                    service: service.clone(),
                    found,
                    expires_at: now + self.ttl,
                },
            );

            (service, found)
        })
    }
}
