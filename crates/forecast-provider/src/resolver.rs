//! Async client for the weather provider.
//!
//! `WeatherResolver` is cheap to clone. It owns the provider behind a mutex
//! and runs every store call on the blocking pool, so async callers never
//! hold the runtime while SQLite works.
//!
//! Observers run on the blocking thread while the provider is locked and must
//! not call back into the resolver.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::WeatherContract;
use crate::cursor::Cursor;
use crate::error::{ProviderError, ProviderResult};
use crate::notify::{ChangeBus, ObserverId};
use crate::provider::WeatherProvider;
use crate::store::WeatherStore;
use crate::uri::{ResourceUri, UriRouter};
use crate::values::{ContentValues, Value};
use forecast_core::{Config, ProviderConfig};

#[derive(Clone)]
pub struct WeatherResolver {
    provider: Arc<Mutex<WeatherProvider>>,
    bus: Arc<ChangeBus>,
    router: UriRouter,
    contract: WeatherContract,
}

impl WeatherResolver {
    /// Build a resolver over `store`, wiring the provider to a fresh change bus.
    pub fn new(store: WeatherStore, config: &ProviderConfig) -> Self {
        let bus = Arc::new(ChangeBus::new());
        let provider = WeatherProvider::new(store, config, bus.clone());
        Self {
            provider: Arc::new(Mutex::new(provider)),
            bus,
            router: UriRouter::new(config.authority.clone()),
            contract: WeatherContract::new(config.authority.clone()),
        }
    }

    /// Open the configured database.
    pub fn open(config: &Config) -> ProviderResult<Self> {
        let store = WeatherStore::open(config.database_path())?;
        Ok(Self::new(store, &config.provider))
    }

    /// Watch `uri` for changes. See [`ChangeBus::register`].
    pub fn register_observer<F>(
        &self,
        uri: &str,
        notify_for_descendants: bool,
        callback: F,
    ) -> ProviderResult<ObserverId>
    where
        F: Fn(&ResourceUri) + Send + Sync + 'static,
    {
        let uri = ResourceUri::parse(uri)?;
        Ok(self.bus.register(uri, notify_for_descendants, callback))
    }

    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        self.bus.unregister(id)
    }

    /// Answered from the router alone, without waiting on the store.
    pub fn get_type(&self, uri: &str) -> ProviderResult<String> {
        let (_, resource) = self.router.route(uri)?;
        Ok(self.contract.type_for(&resource))
    }

    pub async fn query(
        &self,
        uri: &str,
        projection: Option<Vec<String>>,
        selection: Option<String>,
        selection_args: Vec<Value>,
        sort_order: Option<String>,
    ) -> ProviderResult<Cursor> {
        let uri = uri.to_string();
        self.run(move |p| {
            let projection: Option<Vec<&str>> = projection
                .as_ref()
                .map(|cols| cols.iter().map(String::as_str).collect());
            p.query(
                &uri,
                projection.as_deref(),
                selection.as_deref(),
                &selection_args,
                sort_order.as_deref(),
            )
        })
        .await
    }

    pub async fn insert(&self, uri: &str, values: ContentValues) -> ProviderResult<String> {
        let uri = uri.to_string();
        self.run(move |p| p.insert(&uri, values)).await
    }

    pub async fn bulk_insert(&self, uri: &str, rows: Vec<ContentValues>) -> ProviderResult<usize> {
        let uri = uri.to_string();
        self.run(move |p| p.bulk_insert(&uri, rows)).await
    }

    pub async fn update(
        &self,
        uri: &str,
        values: ContentValues,
        selection: Option<String>,
        selection_args: Vec<Value>,
    ) -> ProviderResult<usize> {
        let uri = uri.to_string();
        self.run(move |p| p.update(&uri, values, selection.as_deref(), &selection_args))
            .await
    }

    pub async fn delete(
        &self,
        uri: &str,
        selection: Option<String>,
        selection_args: Vec<Value>,
    ) -> ProviderResult<usize> {
        let uri = uri.to_string();
        self.run(move |p| p.delete(&uri, selection.as_deref(), &selection_args))
            .await
    }

    async fn run<T, F>(&self, op: F) -> ProviderResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&WeatherProvider) -> ProviderResult<T> + Send + 'static,
    {
        let provider = self.provider.clone();
        tokio::task::spawn_blocking(move || op(&*provider.lock()))
            .await
            .map_err(|e| ProviderError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::contract::columns;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver() -> WeatherResolver {
        WeatherResolver::new(WeatherStore::in_memory().unwrap(), &ProviderConfig::default())
    }

    #[tokio::test]
    async fn test_insert_query_round_trip() {
        let resolver = resolver();
        let contract = WeatherContract::default();

        let locator = resolver
            .insert(
                &contract.content_uri(),
                ContentValues::new()
                    .with(columns::DATE, "2024-03-01T15:00:00Z")
                    .with(columns::LOCATION, "Oslo"),
            )
            .await
            .unwrap();

        let cursor = resolver
            .query(&locator, Some(vec![columns::DATE.to_string()]), None, vec![], None)
            .await
            .unwrap();
        assert_eq!(cursor.len(), 1);
        assert_eq!(
            cursor.row(0).unwrap().get(columns::DATE),
            Some(&Value::from("2024-03-01"))
        );
        assert_eq!(resolver.get_type(&locator).unwrap(), contract.content_item_type());
    }

    #[tokio::test]
    async fn test_observer_sees_item_update() {
        let resolver = resolver();
        let contract = WeatherContract::default();
        let locator = resolver
            .insert(
                &contract.content_uri(),
                ContentValues::new().with(columns::DATE, "2024-03-01"),
            )
            .await
            .unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let id = resolver
            .register_observer(&locator, false, move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        resolver
            .update(
                &locator,
                ContentValues::new().with(columns::CONDITION, "Fog"),
                None,
                vec![],
            )
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(resolver.unregister_observer(id));
        resolver.delete(&locator, None, vec![]).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_from_clones() {
        let resolver = resolver();
        let uri = WeatherContract::default().content_uri();

        let mut handles = Vec::new();
        for day in 1..=8 {
            let resolver = resolver.clone();
            let uri = uri.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .insert(
                        &uri,
                        ContentValues::new().with(columns::DATE, format!("2024-03-{:02}", day)),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let cursor = resolver.query(&uri, None, None, vec![], None).await.unwrap();
        assert_eq!(cursor.len(), 8);
    }

    #[test]
    fn test_register_observer_rejects_bad_uri() {
        let resolver = resolver();
        assert!(matches!(
            resolver.register_observer("nope", false, |_| {}),
            Err(ProviderError::UnsupportedResource(_))
        ));
    }

    #[test]
    fn test_get_type_does_not_wait_for_provider_lock() {
        let resolver = resolver();
        let contract = WeatherContract::default();
        let _busy = resolver.provider.lock();

        assert_eq!(
            resolver.get_type(&contract.content_uri()).unwrap(),
            contract.content_type()
        );
        assert_eq!(
            resolver.get_type(&contract.item_uri(4)).unwrap(),
            contract.content_item_type()
        );
        assert!(matches!(
            resolver.get_type("content://elsewhere/weather"),
            Err(ProviderError::UnsupportedResource(_))
        ));
    }
}
