//! Names, MIME types and date handling shared by the provider and its callers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{ProviderError, ProviderResult};
use crate::uri::WeatherResource;
use crate::values::{ContentValues, Value};

pub const CONTENT_SCHEME: &str = "content";
pub const PATH_WEATHER: &str = "weather";

/// Directory segment used by locators returned from insert.
pub const ITEM_DIRECTORY: &str = "id";

/// Canonical date format stored in the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Weather table columns.
pub mod columns {
    pub const TABLE_NAME: &str = "weather";
    pub const ID: &str = "_id";
    pub const DATE: &str = "date";
    pub const LOCATION: &str = "location";
    pub const CONDITION: &str = "condition";
    pub const MIN_TEMP: &str = "min_temp";
    pub const MAX_TEMP: &str = "max_temp";
    pub const HUMIDITY: &str = "humidity";
    pub const PRESSURE: &str = "pressure";
    pub const WIND_SPEED: &str = "wind_speed";
    pub const DEGREES: &str = "degrees";

    /// Every column in table order.
    pub const ALL: [&str; 10] = [
        ID, DATE, LOCATION, CONDITION, MIN_TEMP, MAX_TEMP, HUMIDITY, PRESSURE, WIND_SPEED,
        DEGREES,
    ];
}

/// URI builders and MIME types for one content authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherContract {
    authority: String,
}

impl WeatherContract {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    /// `content://<authority>/weather`
    pub fn content_uri(&self) -> String {
        format!("{}://{}/{}", CONTENT_SCHEME, self.authority, PATH_WEATHER)
    }

    /// `content://<authority>/weather/<segment>`
    pub fn directory_uri(&self, segment: &str) -> String {
        format!("{}/{}", self.content_uri(), segment)
    }

    /// Locator for a single row, as returned by insert.
    pub fn item_uri(&self, id: i64) -> String {
        format!("{}/{}/{}", self.content_uri(), ITEM_DIRECTORY, id)
    }

    pub fn content_type(&self) -> String {
        format!("vnd.android.cursor.dir/{}/{}", self.authority, PATH_WEATHER)
    }

    pub fn content_item_type(&self) -> String {
        format!("vnd.android.cursor.item/{}/{}", self.authority, PATH_WEATHER)
    }

    /// Directory type for collections, item type for single rows.
    pub fn type_for(&self, resource: &WeatherResource) -> String {
        match resource {
            WeatherResource::Collection | WeatherResource::Directory { .. } => self.content_type(),
            WeatherResource::Item { .. } => self.content_item_type(),
        }
    }
}

impl Default for WeatherContract {
    fn default() -> Self {
        Self::new(forecast_core::config::DEFAULT_AUTHORITY)
    }
}

/// Truncate a date value to its canonical UTC day.
///
/// Integers are epoch milliseconds. Text may be RFC 3339, a naive
/// `YYYY-MM-DD[ T]HH:MM:SS` timestamp taken as UTC, or a bare date.
pub fn normalize_date(value: &Value) -> ProviderResult<Value> {
    let day = match value {
        Value::Integer(millis) => Utc
            .timestamp_millis_opt(*millis)
            .single()
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::invalid(format!("Date out of range: {}", millis)))?,
        Value::Text(text) => parse_day(text.trim())
            .ok_or_else(|| ProviderError::invalid(format!("Unrecognized date: {}", text)))?,
        other => {
            return Err(ProviderError::invalid(format!(
                "Date must be text or epoch millis, got {:?}",
                other
            )))
        }
    };

    Ok(Value::Text(day.format(DATE_FORMAT).to_string()))
}

fn parse_day(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Rewrite the `date` column in place when present.
pub fn normalize_date_values(values: &mut ContentValues) -> ProviderResult<()> {
    if let Some(raw) = values.get(columns::DATE) {
        let normalized = normalize_date(raw)?;
        values.put(columns::DATE, normalized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn canonical(value: impl Into<Value>) -> String {
        normalize_date(&value.into())
            .unwrap()
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_same_day_representations_agree() {
        let inputs: Vec<Value> = vec![
            "2024-03-01".into(),
            "2024-03-01T00:00:00Z".into(),
            "2024-03-01T15:00:00Z".into(),
            "2024-03-01T23:59:59.999Z".into(),
            "2024-03-01 08:30:00".into(),
            "2024-03-01T08:30:00".into(),
            "2024-03-02T01:00:00+02:00".into(),
            " 2024-03-01 ".into(),
            Value::Integer(1_709_251_200_000),
            Value::Integer(1_709_305_200_000),
        ];
        for input in inputs {
            assert_eq!(canonical(input.clone()), "2024-03-01", "input {:?}", input);
        }
    }

    #[test]
    fn test_offset_converts_before_truncating() {
        assert_eq!(canonical("2024-03-01T23:00:00-05:00"), "2024-03-02");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            normalize_date(&Value::from("yesterday")),
            Err(ProviderError::InvalidValue(_))
        ));
        assert!(normalize_date(&Value::Null).is_err());
        assert!(normalize_date(&Value::Real(1.5)).is_err());
    }

    #[test]
    fn test_normalize_values_leaves_other_columns() {
        let mut values = ContentValues::new()
            .with(columns::DATE, "2024-03-01T15:00:00Z")
            .with(columns::CONDITION, "Rain");
        normalize_date_values(&mut values).unwrap();
        assert_eq!(values.get(columns::DATE), Some(&Value::from("2024-03-01")));
        assert_eq!(values.get(columns::CONDITION), Some(&Value::from("Rain")));

        let mut no_date = ContentValues::new().with(columns::CONDITION, "Fog");
        normalize_date_values(&mut no_date).unwrap();
        assert_eq!(no_date.len(), 1);
    }

    #[test]
    fn test_uris_and_types() {
        let contract = WeatherContract::new("org.test.weather");
        assert_eq!(contract.content_uri(), "content://org.test.weather/weather");
        assert_eq!(contract.item_uri(7), "content://org.test.weather/weather/id/7");
        assert_eq!(
            contract.directory_uri("oslo"),
            "content://org.test.weather/weather/oslo"
        );
        assert_eq!(contract.content_type(), "vnd.android.cursor.dir/org.test.weather/weather");
        assert_eq!(
            contract.content_item_type(),
            "vnd.android.cursor.item/org.test.weather/weather"
        );
    }
}
