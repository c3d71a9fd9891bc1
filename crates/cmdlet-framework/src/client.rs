//! # Client Cache
//!
//! Service clients are expensive to build and safe to share, so the
//! dispatcher keeps one per `(credentials, region)` pair and hands out
//! `Arc`s to it. The cache is read-mostly: lookups take a read lock, and the
//! write lock is only taken the first time a key is seen.

use crate::context::{CredentialRef, Region};
use crate::error::ServiceError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Identity of a cached client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub credentials: CredentialRef,
    pub region: Region,
}

/// Builds a service client for a key.
///
/// `C` is usually a trait object such as `dyn SqsApi`.
pub trait ClientFactory<C: ?Sized>: Send + Sync {
    fn create(&self, key: &ClientKey) -> Result<Arc<C>, ServiceError>;
}

impl<C, F> ClientFactory<C> for F
where
    C: ?Sized,
    F: Fn(&ClientKey) -> Result<Arc<C>, ServiceError> + Send + Sync,
{
    fn create(&self, key: &ClientKey) -> Result<Arc<C>, ServiceError> {
        self(key)
    }
}

/// Shared, lazily populated map of service clients.
pub struct ClientCache<C: ?Sized> {
    factory: Box<dyn ClientFactory<C>>,
    clients: RwLock<HashMap<ClientKey, Arc<C>>>,
}

impl<C: ?Sized> ClientCache<C> {
    pub fn new(factory: impl ClientFactory<C> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached client for `key`, creating it on first use.
    pub fn get_or_create(&self, key: &ClientKey) -> Result<Arc<C>, ServiceError> {
        if let Some(client) = self.read().get(key) {
            debug!(region = %key.region, credentials = %key.credentials, "Client cache hit");
            return Ok(client.clone());
        }

        let mut clients = self
            .clients
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have created it between the two locks.
        if let Some(client) = clients.get(key) {
            return Ok(client.clone());
        }
        let client = self.factory.create(key)?;
        clients.insert(key.clone(), client.clone());
        info!(region = %key.region, credentials = %key.credentials, size = clients.len(), "Client created");
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ClientKey, Arc<C>>> {
        self.clients
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Named: Send + Sync {
        fn name(&self) -> String;
    }

    struct Fixed(String);

    impl Named for Fixed {
        fn name(&self) -> String {
            self.0.clone()
        }
    }

    fn key(profile: &str, region: &str) -> ClientKey {
        ClientKey {
            credentials: CredentialRef::profile(profile),
            region: Region::new(region),
        }
    }

    #[test]
    fn test_cache_reuses_client_per_key() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let cache: ClientCache<dyn Named> = ClientCache::new(
            move |k: &ClientKey| -> Result<Arc<dyn Named>, ServiceError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Fixed(k.region.to_string())))
            },
        );

        let a = cache.get_or_create(&key("default", "us-east-1")).unwrap();
        let b = cache.get_or_create(&key("default", "us-east-1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let c = cache.get_or_create(&key("default", "eu-west-1")).unwrap();
        assert_eq!(c.name(), "eu-west-1");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_factory_failure_is_not_cached() {
        let cache: ClientCache<dyn Named> = ClientCache::new(
            |_: &ClientKey| -> Result<Arc<dyn Named>, ServiceError> {
                Err(ServiceError::api("InvalidClientTokenId", "unknown profile"))
            },
        );
        assert!(cache.get_or_create(&key("nobody", "us-east-1")).is_err());
        assert!(cache.is_empty());
    }
}
