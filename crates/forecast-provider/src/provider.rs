//! URI-routed CRUD over the weather table.

use std::sync::Arc;

use forecast_core::{Config, ProviderConfig, ScopingMode};

use crate::contract::{columns, normalize_date_values, WeatherContract};
use crate::cursor::Cursor;
use crate::error::{ProviderError, ProviderResult};
use crate::notify::ChangeNotifier;
use crate::store::WeatherStore;
use crate::uri::{ResourceUri, UriRouter, WeatherResource};
use crate::values::{ContentValues, Value};

/// Routes provider calls to the store and publishes changes.
///
/// The provider owns its store; every call is a single synchronous store
/// operation with no state kept between calls.
pub struct WeatherProvider {
    store: WeatherStore,
    router: UriRouter,
    contract: WeatherContract,
    scoping: ScopingMode,
    notifier: Arc<dyn ChangeNotifier>,
}

impl WeatherProvider {
    pub fn new(
        store: WeatherStore,
        config: &ProviderConfig,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        if config.scoping == ScopingMode::Legacy {
            tracing::warn!("Weather provider running with legacy item scoping");
        }
        Self {
            store,
            router: UriRouter::new(config.authority.clone()),
            contract: WeatherContract::new(config.authority.clone()),
            scoping: config.scoping,
            notifier,
        }
    }

    /// Open the database named by `config` and build a provider over it.
    pub fn open(config: &Config, notifier: Arc<dyn ChangeNotifier>) -> ProviderResult<Self> {
        let store = WeatherStore::open(config.database_path())?;
        Ok(Self::new(store, &config.provider, notifier))
    }

    pub fn contract(&self) -> &WeatherContract {
        &self.contract
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    /// Close the underlying store.
    pub fn close(self) -> ProviderResult<()> {
        self.store.close()
    }

    pub fn query(
        &self,
        uri: &str,
        projection: Option<&[&str]>,
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> ProviderResult<Cursor> {
        let (uri, resource) = self.router.route(uri)?;
        let (selection, args) = self.scope(&resource, selection, selection_args);

        let mut cursor = self
            .store
            .query(projection, selection.as_deref(), &args, sort_order)?;
        cursor.set_notification_uri(uri);
        Ok(cursor)
    }

    /// MIME-like type for `uri`: directory type for collections, item type
    /// for single rows.
    pub fn get_type(&self, uri: &str) -> ProviderResult<String> {
        let (_, resource) = self.router.route(uri)?;
        Ok(self.contract.type_for(&resource))
    }

    /// Insert a row through the collection URI, returning its item locator.
    pub fn insert(&self, uri: &str, mut values: ContentValues) -> ProviderResult<String> {
        let (uri, resource) = self.router.route(uri)?;
        if resource != WeatherResource::Collection {
            return Err(ProviderError::unsupported(&uri));
        }

        reject_row_id(&values)?;
        normalize_date_values(&mut values)?;
        let id = self.store.insert(&values)?;
        let locator = self.contract.item_uri(id);
        tracing::debug!("Inserted {}", locator);

        self.notifier.notify_change(&uri);
        Ok(locator)
    }

    /// Insert many rows atomically through the collection URI.
    pub fn bulk_insert(&self, uri: &str, rows: Vec<ContentValues>) -> ProviderResult<usize> {
        let (uri, resource) = self.router.route(uri)?;
        if resource != WeatherResource::Collection {
            return Err(ProviderError::unsupported(&uri));
        }

        let mut rows = rows;
        for values in &mut rows {
            reject_row_id(values)?;
            normalize_date_values(values)?;
        }
        let count = self.store.insert_all(&rows)?;

        if count > 0 {
            self.notifier.notify_change(&uri);
        }
        Ok(count)
    }

    pub fn update(
        &self,
        uri: &str,
        mut values: ContentValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> ProviderResult<usize> {
        let (uri, resource) = self.router.route(uri)?;
        let (selection, args) = self.scope(&resource, selection, selection_args);

        reject_row_id(&values)?;
        normalize_date_values(&mut values)?;
        let count = self.store.update(&values, selection.as_deref(), &args)?;
        tracing::debug!("Updated {} rows via {}", count, uri);

        if count > 0 {
            self.notifier.notify_change(&uri);
        }
        Ok(count)
    }

    pub fn delete(
        &self,
        uri: &str,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> ProviderResult<usize> {
        let (uri, resource) = self.router.route(uri)?;
        let (selection, args) = match &resource {
            WeatherResource::Collection => (selection.map(str::to_string), selection_args.to_vec()),
            WeatherResource::Directory { .. } => return Err(ProviderError::unsupported(&uri)),
            WeatherResource::Item { .. } => {
                let scoped = self.scope(&resource, selection, selection_args);
                if self.scoping == ScopingMode::Legacy {
                    tracing::warn!("Legacy scoping rejects item delete on {}", uri);
                    return Err(ProviderError::unsupported(&uri));
                }
                scoped
            }
        };

        let count = self.store.delete(selection.as_deref(), &args)?;
        tracing::debug!("Deleted {} rows via {}", count, uri);

        if count > 0 {
            self.notifier.notify_change(&uri);
        }
        Ok(count)
    }

    /// Apply the row-identifier filter for item resources.
    fn scope(
        &self,
        resource: &WeatherResource,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> (Option<String>, Vec<Value>) {
        let mut args = selection_args.to_vec();
        let Some(id) = resource.item_id() else {
            return (selection.map(str::to_string), args);
        };

        let selection = match self.scoping {
            ScopingMode::Strict => {
                args.push(Value::Integer(id));
                match selection.filter(|s| !s.trim().is_empty()) {
                    Some(s) => Some(format!("({}) AND {} = ?", s, columns::ID)),
                    None => Some(format!("{} = ?", columns::ID)),
                }
            }
            ScopingMode::Legacy => {
                selection.map(|s| format!("{} AND {} = {}", s, columns::ID, id))
            }
        };
        (selection, args)
    }
}

/// Row identifiers are assigned by the store and never written by callers.
fn reject_row_id(values: &ContentValues) -> ProviderResult<()> {
    if values.contains_key(columns::ID) {
        return Err(ProviderError::invalid(format!(
            "{} is assigned by the store and cannot be written",
            columns::ID
        )));
    }
    Ok(())
}

/// Row identifier at the end of an item locator.
pub fn locator_id(locator: &str) -> Option<i64> {
    ResourceUri::parse(locator)
        .ok()?
        .segments()
        .last()?
        .parse()
        .ok()
}
