//! Weather content provider.
//!
//! Exposes the weather table through `content://` URIs: the router
//! classifies each URI, the provider turns it into one SQLite call, and
//! mutations are published to observers.

pub mod contract;
pub mod cursor;
pub mod error;
pub mod notify;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod uri;
pub mod values;

pub use contract::{columns, normalize_date, WeatherContract};
pub use cursor::{Cursor, Row};
pub use error::{ProviderError, ProviderResult};
pub use notify::{ChangeBus, ChangeNotifier, NoopNotifier, ObserverId};
pub use provider::{locator_id, WeatherProvider};
pub use resolver::WeatherResolver;
pub use store::WeatherStore;
pub use uri::{ResourceUri, UriRouter, WeatherResource};
pub use values::{ContentValues, Value};
