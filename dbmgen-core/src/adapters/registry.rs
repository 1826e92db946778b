//! Identity-keyed catalog connection cache.
//!
//! The first [`ConnectionRegistry::acquire`] for an identity opens the
//! connection; every later request for the same identity, including ones
//! racing the first, shares that exact handle. [`ConnectionRegistry::shutdown`]
//! must be awaited before the process exits so that every connection is
//! closed.

use super::{CatalogSource, Connector};
use crate::Result;
use crate::security::CredentialIdentity;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<dyn CatalogSource>>>;

/// Connection cache owned by the process entry point and passed by reference
/// into each generation run.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    entries: Mutex<HashMap<CredentialIdentity, Slot>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, identity: &CredentialIdentity) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(identity.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Returns the connection for an identity, opening it on first use.
    ///
    /// # Errors
    /// Returns the connector's error if opening fails. Nothing is retried.
    pub async fn acquire(&self, identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>> {
        let slot = self.slot(identity);
        let source = slot
            .get_or_try_init(|| async {
                tracing::info!("Connecting to {}", identity.target_label());
                self.connector.connect(identity).await
            })
            .await?;
        Ok(Arc::clone(source))
    }

    /// Number of identities with an open or pending connection
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every open connection and waits for all closes to finish.
    ///
    /// A connection still being opened is awaited and then closed; one whose
    /// opening fails has nothing to close. Idempotent: entries are drained,
    /// so a second call closes nothing.
    pub async fn shutdown(&self) {
        let drained: Vec<(CredentialIdentity, Slot)> = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.drain().collect()
        };

        let closes = drained.into_iter().map(|(identity, slot)| async move {
            // Waits on an in-flight open; only runs when no open succeeded
            let source = slot
                .get_or_try_init(|| async { Err::<Arc<dyn CatalogSource>, ()>(()) })
                .await
                .ok()?;
            source.close().await;
            tracing::debug!("Closed connection to {}", identity.target_label());
            Some(())
        });

        let closed = join_all(closes).await.into_iter().flatten().count();
        if closed > 0 {
            tracing::debug!("Connection registry shut down ({} closed)", closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogTable;
    use crate::security::Credentials;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingSource {
        closes: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn describe_table(&self, _database: &str, table: &str) -> Result<CatalogTable> {
            Ok(CatalogTable::new(table, Vec::new()))
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingConnector {
        opened: Mutex<Vec<Arc<CountingSource>>>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>> {
            tokio::task::yield_now().await;
            let source = Arc::new(CountingSource::default());
            self.opened.lock().unwrap().push(Arc::clone(&source));
            Ok(source)
        }
    }

    fn identity(user: &str, database: &str) -> CredentialIdentity {
        let creds = Credentials::new(user.to_string(), Some("pw".to_string()));
        CredentialIdentity::new(&creds, "db.local", 3306, database)
    }

    #[tokio::test]
    async fn test_registry_shares_connection_for_same_identity() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let first = registry.acquire(&identity("app", "shop")).await.unwrap();
        let second = registry.acquire(&identity("app", "shop")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_registry_concurrent_requests_share_pending_connection() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());
        let id = identity("app", "shop");

        let (a, b) = tokio::join!(registry.acquire(&id), registry.acquire(&id));

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(connector.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_registry_distinct_identities_get_distinct_connections() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let shop = registry.acquire(&identity("app", "shop")).await.unwrap();
        let blog = registry.acquire(&identity("app", "blog")).await.unwrap();
        let other = registry.acquire(&identity("admin", "shop")).await.unwrap();

        assert!(!Arc::ptr_eq(&shop, &blog));
        assert!(!Arc::ptr_eq(&shop, &other));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_registry_shutdown_closes_each_connection_once() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());
        registry.acquire(&identity("app", "shop")).await.unwrap();
        registry.acquire(&identity("app", "shop")).await.unwrap();
        registry.acquire(&identity("app", "blog")).await.unwrap();

        registry.shutdown().await;
        registry.shutdown().await;

        assert!(registry.is_empty());
        let opened = connector.opened.lock().unwrap();
        assert_eq!(opened.len(), 2);
        for source in opened.iter() {
            assert_eq!(source.closes.load(Ordering::SeqCst), 1);
        }
    }

    #[derive(Default)]
    struct GatedConnector {
        started: Notify,
        release: Notify,
        opened: Mutex<Vec<Arc<CountingSource>>>,
    }

    #[async_trait]
    impl Connector for GatedConnector {
        async fn connect(&self, _identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>> {
            self.started.notify_one();
            self.release.notified().await;
            let source = Arc::new(CountingSource::default());
            self.opened.lock().unwrap().push(Arc::clone(&source));
            Ok(source)
        }
    }

    #[tokio::test]
    async fn test_registry_shutdown_closes_pending_connection() {
        let connector = Arc::new(GatedConnector::default());
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));

        let pending = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.acquire(&identity("app", "shop")).await.map(|_| ()) }
        });
        connector.started.notified().await;

        let shutdown = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.shutdown().await }
        });
        tokio::task::yield_now().await;
        connector.release.notify_one();

        shutdown.await.unwrap();
        pending.await.unwrap().unwrap();

        assert!(registry.is_empty());
        let opened = connector.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_shutdown_when_empty() {
        let registry = ConnectionRegistry::new(Arc::new(CountingConnector::default()));
        registry.shutdown().await;
        assert!(registry.is_empty());
    }
}
